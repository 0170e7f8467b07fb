//! High-level runtime engine settings
//!
//! Selects the border policy and the ensemble size
//! used when building and running a `Scenario`

use crate::configuration::config::BorderKindConfig;

#[derive(Debug, Clone)]
pub struct Engine {
    pub border: BorderKindConfig, // bounce or wrap
    pub ensemble: usize, // number of independent systems for experiments
}
