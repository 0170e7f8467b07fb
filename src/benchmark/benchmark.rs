use std::time::Instant;

use crate::error::Result;
use crate::simulation::border::{Border, BorderBounce, BorderWrap};
use crate::simulation::engine::Engine;
use crate::configuration::config::BorderKindConfig;
use crate::simulation::params::Parameters;
use crate::simulation::scenario::Scenario;
use crate::simulation::states::NVec2;

/// Helper to build parameters for `n` particles at constant density
fn make_params(n: usize) -> Parameters {
    // density 4 particles per unit area, like the dense runs of the model
    let side = (n as f64 / 4.0).sqrt();
    Parameters {
        particles: n,
        domain: NVec2::new(side, side),
        radius: 1.0,
        speed: 0.03,
        dt: 1.0,
        noise: 60.0,
        damping: 0.9995,
        seed: 42,
        steps: 0,
    }
}

fn make_scenario(n: usize, kind: BorderKindConfig) -> Result<Scenario> {
    let params = make_params(n);
    let border: Box<dyn Border + Send + Sync> = match kind {
        BorderKindConfig::Bounce => Box::new(BorderBounce::new(vec![
            NVec2::new(0.0, 0.0),
            NVec2::new(params.domain.x, 0.0),
            NVec2::new(params.domain.x, params.domain.y),
            NVec2::new(0.0, params.domain.y),
        ])?),
        BorderKindConfig::Wrap => Box::new(BorderWrap::new(params.domain)?),
    };
    let engine = Engine { border: kind, ensemble: 1 };
    Scenario::new(engine, params, border, None)
}

/// Time one Vicsek step for a range of n, bounce vs wrap
/// Paste output directly into a spreadsheet to graph
pub fn bench_step() -> Result<()> {
    println!("N,bounce_ms,wrap_ms");

    for n in (200..=3200).step_by(200) {
        // Small n: average over a few steps to smooth noise
        let steps = if n <= 800 { 10 } else { 2 };

        let mut bounce = make_scenario(n, BorderKindConfig::Bounce)?;
        let mut wrap = make_scenario(n, BorderKindConfig::Wrap)?;

        // Warm-up one step
        bounce.step()?;
        wrap.step()?;

        let t0 = Instant::now();
        bounce.integrate_for(steps, bounce.parameters.noise)?;
        let ms_bounce = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        let t1 = Instant::now();
        wrap.integrate_for(steps, wrap.parameters.noise)?;
        let ms_wrap = t1.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("{},{:.6},{:.6}", n, ms_bounce, ms_wrap);
    }
    Ok(())
}
