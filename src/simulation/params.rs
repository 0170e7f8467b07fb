//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - particle count and domain size,
//! - interaction radius, particle speed and step size,
//! - noise amplitude (degrees), damping and random seed

use super::states::NVec2;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub particles: usize, // particle count
    pub domain: NVec2, // domain width and height
    pub radius: f64, // interaction radius
    pub speed: f64, // particle speed
    pub dt: f64, // step size
    pub noise: f64, // noise amplitude in degrees
    pub damping: f64, // applied before normalization
    pub seed: u64, // deterministic seed
    pub steps: usize, // steps for a plain run
}

impl Parameters {
    /// Squared interaction radius, compared against squared separations.
    #[inline]
    pub fn radius2(&self) -> f64 {
        self.radius * self.radius
    }
}
