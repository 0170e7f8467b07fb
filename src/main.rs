use vicsek::{ScenarioConfig, Scenario, Ensemble, Sweep};
use vicsek::{noise_sweep, bench_step};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Run,   // integrate `parameters.steps` steps
    Sweep, // noise sweep into `sweep.output`
    Bench, // timing table
}

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "square.yaml")]
    file_name: String,

    #[arg(short, long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    // bare names are looked up in the bundled scenarios
    let given = PathBuf::from(file_name);
    let config_path = if given.exists() {
        given
    } else {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file_name)
    };
    let file = File::open(&config_path)
        .with_context(|| format!("opening scenario {}", config_path.display()))?;
    let reader = BufReader::new(file);
    let scenario_cfg: ScenarioConfig = serde_yaml::from_reader(reader)
        .with_context(|| format!("parsing scenario {}", config_path.display()))?;
    Ok(scenario_cfg)
}

fn run(cfg: &ScenarioConfig) -> Result<()> {
    let mut scenario = Scenario::build_scenario(cfg)?;
    let steps = scenario.parameters.steps;
    let every = (steps / 10).max(1);

    for i in 1..=steps {
        scenario.step()?;
        if i % every == 0 {
            info!("step {i:6}: order {:.5}", scenario.order_parameter());
        }
    }
    println!("{}", scenario.describe());
    println!("t = {}, order = {:.5}", scenario.system.t, scenario.order_parameter());
    Ok(())
}

fn sweep(cfg: &ScenarioConfig) -> Result<()> {
    let sweep_cfg = cfg.sweep.as_ref().context("scenario has no `sweep` section")?;
    let sweep = Sweep::from_config(sweep_cfg)?;
    let mut ensemble = Ensemble::build(cfg)?;

    let file = File::create(&sweep_cfg.output)
        .with_context(|| format!("creating {}", sweep_cfg.output))?;
    let mut out = BufWriter::new(file);
    let points = noise_sweep(&mut ensemble, &sweep, &mut out)?;
    info!("wrote {} noise levels to {}", points.len(), sweep_cfg.output);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.mode {
        Mode::Bench => bench_step()?,
        Mode::Run => run(&load_scenario_from_yaml(&args.file_name)?)?,
        Mode::Sweep => sweep(&load_scenario_from_yaml(&args.file_name)?)?,
    }
    Ok(())
}
