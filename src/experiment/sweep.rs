//! Noise sweep and relaxation experiments
//!
//! The sweep lowers the noise level by a fixed decrement. At each level the
//! ensemble is relaxed and then sampled, and the sampled mean of the
//! ensemble-averaged |velocity| is written as one CSV row.

use std::io::Write;

use log::{debug, info};

use crate::configuration::config::SweepConfig;
use crate::error::{Error, Result};
use crate::simulation::ensemble::Ensemble;
use crate::simulation::scenario::Scenario;

/// Most noise levels a single sweep may visit.
pub const MAX_LEVELS: usize = 100_000;

#[derive(Debug, Clone)]
pub struct Sweep {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub equilibrate_high: usize,
    pub equilibrate_low: usize,
    pub samples: usize,
}

impl Sweep {
    pub fn from_config(cfg: &SweepConfig) -> Result<Self> {
        let sweep = Self {
            start: cfg.start,
            end: cfg.end,
            step: cfg.step,
            equilibrate_high: cfg.equilibrate_high,
            equilibrate_low: cfg.equilibrate_low,
            samples: cfg.samples,
        };
        sweep.validate()?;
        Ok(sweep)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::InvalidParam("sweep step must be finite and > 0".into()));
        }
        if !(self.end.is_finite() && self.end >= 0.0 && self.start.is_finite() && self.start >= self.end) {
            return Err(Error::InvalidParam("sweep needs finite start >= end >= 0".into()));
        }
        let span = self.spacings();
        if span >= MAX_LEVELS as f64 {
            return Err(Error::InvalidParam(format!(
                "sweep visits more than {MAX_LEVELS} noise levels"
            )));
        }
        if self.samples == 0 {
            return Err(Error::InvalidParam("sweep needs at least one sample per level".into()));
        }
        Ok(())
    }

    /// Noise levels from `start` down to `end`, both included when reachable.
    ///
    /// Expects a validated sweep; the count is capped at [`MAX_LEVELS`].
    pub fn levels(&self) -> Vec<f64> {
        let count = (self.spacings() as usize).saturating_add(1).min(MAX_LEVELS);
        (0..count).map(|k| self.start - k as f64 * self.step).collect()
    }

    // whole steps between start and end
    fn spacings(&self) -> f64 {
        ((self.start - self.end) / self.step + 1e-9).floor()
    }

    fn equilibration(&self, noise: f64) -> usize {
        if noise > 0.5 * self.start {
            self.equilibrate_high
        } else {
            self.equilibrate_low
        }
    }
}

/// One row of sweep output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    pub noise: f64,
    pub velocity: f64,
}

/// Run the sweep on `ensemble`, writing a header and one `noise,velocity`
/// row per level to `out`.
pub fn noise_sweep<W: Write>(
    ensemble: &mut Ensemble,
    sweep: &Sweep,
    out: &mut W,
) -> Result<Vec<SweepPoint>> {
    sweep.validate()?;
    writeln!(out, "# {}", ensemble.describe())?;
    writeln!(out, "noise,velocity")?;

    let mut points = Vec::new();
    for noise in sweep.levels() {
        for _ in 0..sweep.equilibration(noise) {
            ensemble.integrate(noise)?;
        }

        let mut total = 0.0;
        for _ in 0..sweep.samples {
            ensemble.integrate(noise)?;
            total += ensemble.averaged_abs_velocity();
        }
        let velocity = total / sweep.samples as f64;

        writeln!(out, "{noise},{velocity}")?;
        info!("noise {noise:8.3} -> velocity {velocity:.5}");
        points.push(SweepPoint { noise, velocity });
    }
    out.flush()?;
    Ok(points)
}

/// Steps until the order parameter settles at noise `noise`.
///
/// The order parameter is averaged over consecutive windows of `window`
/// steps. Returns the step count at which two consecutive window means
/// differ by less than `tolerance`, or `None` if that does not happen within
/// `max_steps`.
pub fn steps_to_equilibrium(
    scenario: &mut Scenario,
    noise: f64,
    window: usize,
    tolerance: f64,
    max_steps: usize,
) -> Result<Option<usize>> {
    if window == 0 {
        return Err(Error::InvalidParam("window must be > 0".into()));
    }

    let mut previous: Option<f64> = None;
    let mut acc = 0.0;
    for step in 1..=max_steps {
        scenario.integrate(noise)?;
        acc += scenario.order_parameter();

        if step % window == 0 {
            let mean = acc / window as f64;
            acc = 0.0;
            debug!("step {step:6}: window mean {mean:.5}");
            if let Some(prev) = previous {
                if (mean - prev).abs() < tolerance {
                    return Ok(Some(step));
                }
            }
            previous = Some(mean);
        }
    }
    Ok(None)
}
