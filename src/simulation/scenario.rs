//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a runtime bundle
//! containing:
//! - engine settings (`Engine`)
//! - numerical parameters (`Parameters`)
//! - system state (`System` with particles at t = 0)
//! - active heading terms (`InteractionSet`)
//! - the border policy and the scenario's own random generator
//!
//! Every configured value is validated here, so the integrator can assume
//! a consistent scenario.

use std::f64::consts::TAU;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::config::{BorderKindConfig, ParticleConfig, ScenarioConfig};
use crate::error::{Error, Result};
use crate::simulation::border::{Border, BorderBounce, BorderWrap};
use crate::simulation::engine::Engine;
use crate::simulation::integrator::vicsek_integrator;
use crate::simulation::interaction::{InteractionSet, VicsekAlignment};
use crate::simulation::observables::{
    average_velocity, density_distribution_y, order_parameter, velocity_distribution_y,
    SliceAverages,
};
use crate::simulation::params::Parameters;
use crate::simulation::states::{NVec2, Particle, System};

/// Rejection-sampling attempts per particle before placement gives up.
const PLACEMENT_TRIES: usize = 10_000;

/// Fully-initialized Vicsek scenario
///
/// This is the main "runtime bundle" constructed from a [`ScenarioConfig`]:
/// it contains the engine settings, parameters, current system state, the
/// heading terms and the border policy particles interact with
pub struct Scenario {
    pub engine: Engine,
    pub parameters: Parameters,
    pub system: System,
    pub interactions: InteractionSet,
    pub border: Box<dyn Border + Send + Sync>,
    pub rng: StdRng,
}

impl Scenario {
    pub fn build_scenario(cfg: &ScenarioConfig) -> Result<Self> {
        Self::build_with_seed(cfg, cfg.parameters.seed)
    }

    /// Same as [`Scenario::build_scenario`] with the seed replaced.
    pub fn build_with_seed(cfg: &ScenarioConfig, seed: u64) -> Result<Self> {
        // Parameters (runtime) from ParametersConfig
        let p_cfg = &cfg.parameters;
        let domain = vec2(&p_cfg.domain, "domain")?;
        let mut parameters = Parameters {
            particles: p_cfg.particles,
            domain,
            radius: p_cfg.radius,
            speed: p_cfg.speed.unwrap_or(1.0),
            dt: p_cfg.dt.unwrap_or(1.0),
            noise: p_cfg.noise,
            damping: p_cfg.damping.unwrap_or(1.0),
            seed,
            steps: p_cfg.steps.unwrap_or(1000),
        };
        if let Some(listed) = &cfg.particles {
            parameters.particles = listed.len();
        }

        // Engine (runtime) from EngineConfig
        let engine = Engine {
            border: cfg.engine.border,
            ensemble: cfg.engine.ensemble.unwrap_or(1),
        };

        let border = build_border(engine.border, &cfg.corners, domain)?;

        let particles = match &cfg.particles {
            Some(listed) => Some(
                listed
                    .iter()
                    .map(particle_from_config)
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };

        Self::new(engine, parameters, border, particles)
    }

    /// Assemble a scenario from runtime parts. Without explicit particles,
    /// `parameters.particles` are placed uniformly inside the border with
    /// uniformly random headings.
    pub fn new(
        engine: Engine,
        parameters: Parameters,
        border: Box<dyn Border + Send + Sync>,
        particles: Option<Vec<Particle>>,
    ) -> Result<Self> {
        validate(&engine, &parameters)?;
        let mut rng = StdRng::seed_from_u64(parameters.seed);

        let particles = match particles {
            Some(particles) => {
                for (i, p) in particles.iter().enumerate() {
                    if !border.contains(p.x) {
                        return Err(Error::InvalidParam(format!(
                            "particle {i} starts outside the border"
                        )));
                    }
                    if !(p.v.norm() > 0.0) {
                        return Err(Error::InvalidParam(format!(
                            "particle {i} needs a non-zero velocity"
                        )));
                    }
                }
                particles
            }
            None => populate(&*border, &parameters, &mut rng)?,
        };

        // Forces: alignment is the only heading term of the model
        let interactions = InteractionSet::new().with(VicsekAlignment {
            radius2: parameters.radius2(),
        });

        info!(
            "scenario: {} particles, {} border, noise {} deg, seed {}",
            particles.len(),
            border.name(),
            parameters.noise,
            parameters.seed
        );

        Ok(Self {
            engine,
            parameters,
            system: System::new(particles),
            interactions,
            border,
            rng,
        })
    }

    /// One step at the configured noise.
    pub fn step(&mut self) -> Result<()> {
        let noise = self.parameters.noise;
        self.integrate(noise)
    }

    /// One step at noise amplitude `noise` (degrees).
    pub fn integrate(&mut self, noise: f64) -> Result<()> {
        // Split &mut Scenario into &mut fields in one destructuring step
        let Scenario {
            system,
            parameters,
            interactions,
            border,
            rng,
            ..
        } = self;
        vicsek_integrator(system, interactions, &**border, parameters, noise, rng)
    }

    pub fn integrate_for(&mut self, steps: usize, noise: f64) -> Result<()> {
        for _ in 0..steps {
            self.integrate(noise)?;
        }
        Ok(())
    }

    /// Integrate `steps` steps, averaging |slice velocity| and slice density
    /// over them.
    pub fn integrate_with_averaging_for(
        &mut self,
        steps: usize,
        noise: f64,
        slices: usize,
    ) -> Result<SliceAverages> {
        let bounds = self.border.bounds();
        let mut averages = SliceAverages {
            velocity: vec![0.0; slices],
            density: vec![0.0; slices],
        };
        if steps == 0 {
            return Ok(averages);
        }

        for _ in 0..steps {
            self.integrate(noise)?;
            let veloc = velocity_distribution_y(&self.system, bounds, slices)?;
            let dens = density_distribution_y(&self.system, bounds, slices)?;
            for (acc, v) in averages.velocity.iter_mut().zip(veloc.iter()) {
                *acc += v.norm();
            }
            for (acc, d) in averages.density.iter_mut().zip(dens.iter()) {
                *acc += d;
            }
        }

        let steps = steps as f64;
        averages.velocity.iter_mut().for_each(|v| *v /= steps);
        averages.density.iter_mut().for_each(|d| *d /= steps);
        Ok(averages)
    }

    pub fn average_velocity(&self) -> NVec2 {
        average_velocity(&self.system)
    }

    pub fn order_parameter(&self) -> f64 {
        order_parameter(&self.system, self.parameters.speed)
    }

    /// One-line summary used as header for experiment output.
    pub fn describe(&self) -> String {
        let (lo, hi) = self.border.bounds();
        format!(
            "particles = {}; domain = {} x {}; border = {}",
            self.system.len(),
            hi.x - lo.x,
            hi.y - lo.y,
            self.border.name()
        )
    }
}

fn validate(engine: &Engine, p: &Parameters) -> Result<()> {
    let positive = [("speed", p.speed), ("dt", p.dt), ("damping", p.damping)];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(Error::InvalidParam(format!("{name} must be finite and > 0")));
        }
    }
    if !(p.radius.is_finite() && p.radius >= 0.0) {
        return Err(Error::InvalidParam("radius must be finite and >= 0".into()));
    }
    if !(p.noise.is_finite() && p.noise >= 0.0) {
        return Err(Error::InvalidParam("noise must be finite and >= 0".into()));
    }
    if engine.ensemble == 0 {
        return Err(Error::InvalidParam("ensemble must have at least one member".into()));
    }
    Ok(())
}

fn vec2(values: &[f64], what: &str) -> Result<NVec2> {
    match values {
        [x, y] if x.is_finite() && y.is_finite() => Ok(NVec2::new(*x, *y)),
        _ => Err(Error::InvalidParam(format!(
            "{what} must be two finite numbers, got {values:?}"
        ))),
    }
}

fn particle_from_config(pc: &ParticleConfig) -> Result<Particle> {
    Ok(Particle {
        x: vec2(&pc.x, "particle position")?,
        v: vec2(&pc.v, "particle velocity")?,
    })
}

fn build_border(
    kind: BorderKindConfig,
    corners: &Option<Vec<Vec<f64>>>,
    domain: NVec2,
) -> Result<Box<dyn Border + Send + Sync>> {
    match kind {
        BorderKindConfig::Bounce => {
            let corners = match corners {
                Some(corners) => corners
                    .iter()
                    .map(|c| vec2(c, "corner"))
                    .collect::<Result<Vec<_>>>()?,
                None => vec![
                    NVec2::new(0.0, 0.0),
                    NVec2::new(domain.x, 0.0),
                    NVec2::new(domain.x, domain.y),
                    NVec2::new(0.0, domain.y),
                ],
            };
            Ok(Box::new(BorderBounce::new(corners)?))
        }
        BorderKindConfig::Wrap => {
            if corners.is_some() {
                return Err(Error::InvalidParam(
                    "wrap border is the domain box, corners are not allowed".into(),
                ));
            }
            Ok(Box::new(BorderWrap::new(domain)?))
        }
    }
}

/// Uniform positions inside the border, uniform headings at `speed`.
fn populate(border: &dyn Border, params: &Parameters, rng: &mut StdRng) -> Result<Vec<Particle>> {
    let (lo, hi) = border.bounds();
    let span = hi - lo;
    let mut particles = Vec::with_capacity(params.particles);

    for i in 0..params.particles {
        let x = (0..PLACEMENT_TRIES)
            .map(|_| lo + NVec2::new(rng.gen::<f64>() * span.x, rng.gen::<f64>() * span.y))
            .find(|x| border.contains(*x))
            .ok_or(Error::Placement(i))?;
        let angle = rng.gen::<f64>() * TAU;
        particles.push(Particle {
            x,
            v: NVec2::new(angle.cos(), angle.sin()) * params.speed,
        });
    }
    debug!("placed {} particles", particles.len());
    Ok(particles)
}
