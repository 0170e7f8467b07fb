//! Independent copies of one scenario, stepped together
//!
//! Member `k` is built with seed `seed + k`, so members share parameters and
//! border but start from different random states.

use crate::configuration::config::ScenarioConfig;
use crate::error::{Error, Result};
use crate::simulation::scenario::Scenario;

pub struct Ensemble {
    members: Vec<Scenario>,
}

impl Ensemble {
    /// Build `engine.ensemble` members from one configuration.
    pub fn build(cfg: &ScenarioConfig) -> Result<Self> {
        let count = cfg.engine.ensemble.unwrap_or(1);
        let seed = cfg.parameters.seed;
        let members = (0..count as u64)
            .map(|k| Scenario::build_with_seed(cfg, seed.wrapping_add(k)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_members(members)
    }

    pub fn from_members(members: Vec<Scenario>) -> Result<Self> {
        if members.is_empty() {
            return Err(Error::InvalidParam("ensemble must have at least one member".into()));
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[Scenario] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Step every member once at noise amplitude `noise`.
    pub fn integrate(&mut self, noise: f64) -> Result<()> {
        for member in &mut self.members {
            member.integrate(noise)?;
        }
        Ok(())
    }

    /// Mean over members of |average velocity|.
    pub fn averaged_abs_velocity(&self) -> f64 {
        let sum: f64 = self.members.iter().map(|m| m.average_velocity().norm()).sum();
        sum / self.members.len() as f64
    }

    /// Header line describing the members.
    pub fn describe(&self) -> String {
        format!("{}; ensemble = {}", self.members[0].describe(), self.members.len())
    }
}
