//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – border policy and ensemble size
//! - [`ParametersConfig`] – particle count, domain, model constants
//! - `corners`            – optional polygon for the bounce border
//! - [`ParticleConfig`]   – optional explicit initial state for each particle
//! - [`SweepConfig`]      – optional noise sweep experiment
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   border: "bounce"        # or "wrap"
//!   ensemble: 4             # independent systems used by the sweep
//!
//! parameters:
//!   particles: 400
//!   domain: [ 20.0, 20.0 ]  # width, height
//!   radius: 1.0             # interaction radius
//!   speed: 0.03             # particle speed
//!   dt: 1.0                 # step size
//!   noise: 60.0             # noise amplitude in degrees
//!   damping: 0.9995
//!   seed: 42
//!   steps: 2000
//!
//! corners:                  # optional, defaults to the domain rectangle
//!   - [ 0.0, 0.0 ]
//!   - [ 20.0, 0.0 ]
//!   - [ 10.0, 20.0 ]
//!
//! sweep:
//!   start: 360.0
//!   end: 0.0
//!   step: 5.0
//!   equilibrate_high: 300   # steps per level while noise > start / 2
//!   equilibrate_low: 600
//!   samples: 20
//!   output: "velocities.csv"
//! ```
//!
//! The engine then maps this configuration into its runtime scenario
//! representation, validating every value on the way.

use serde::Deserialize;

/// Which border policy the engine uses
/// `border: "bounce"` or `border: "wrap"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKindConfig {
    #[serde(rename = "bounce")] // Reflect off the polygon edges, speed preserved
    Bounce,

    #[serde(rename = "wrap")] // Periodic box, particles re-enter on the opposite side
    Wrap,
}

/// High-level engine configuration
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub border: BorderKindConfig, // border policy applied to every step
    pub ensemble: Option<usize>, // independent systems for experiments, default 1
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub particles: usize, // particle count, ignored when `particles` are listed explicitly
    pub domain: Vec<f64>, // width, height
    pub radius: f64, // interaction radius
    pub speed: Option<f64>, // particle speed, default 1
    pub dt: Option<f64>, // step size, default 1
    pub noise: f64, // noise amplitude in degrees
    pub damping: Option<f64>, // default 1
    pub seed: u64, // deterministic seed to make runs reproducible
    pub steps: Option<usize>, // steps for a plain run, default 1000
}

/// Configuration for a single particle's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub x: Vec<f64>, // initial position
    pub v: Vec<f64>, // initial velocity, must be non-zero
}

/// Noise sweep from `start` down to `end`
#[derive(Deserialize, Debug, Clone)]
pub struct SweepConfig {
    pub start: f64, // first noise level, degrees
    pub end: f64, // last noise level, degrees
    pub step: f64, // decrement between levels
    pub equilibrate_high: usize, // relaxation steps while noise > start / 2
    pub equilibrate_low: usize, // relaxation steps below that
    pub samples: usize, // averaged steps per level
    pub output: String, // output file
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub parameters: ParametersConfig,
    pub corners: Option<Vec<Vec<f64>>>,
    pub particles: Option<Vec<ParticleConfig>>,
    pub sweep: Option<SweepConfig>,
}
