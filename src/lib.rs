pub mod simulation;
pub mod configuration;
pub mod experiment;
pub mod benchmark;
pub mod error;

pub use simulation::states::{Particle, System, Kinematics, NVec2};
pub use simulation::geometry::Segment;
pub use simulation::border::{Border, BorderBounce, BorderWrap, Polygon, Reflection};
pub use simulation::interaction::{Interaction, InteractionSet, VicsekAlignment};
pub use simulation::integrator::vicsek_integrator;
pub use simulation::scenario::Scenario;
pub use simulation::ensemble::Ensemble;

pub use configuration::config::{BorderKindConfig, EngineConfig, ParametersConfig, ParticleConfig, SweepConfig, ScenarioConfig};

pub use experiment::sweep::{noise_sweep, steps_to_equilibrium, Sweep, SweepPoint};

pub use benchmark::benchmark::bench_step;

pub use error::{Error, Result};
