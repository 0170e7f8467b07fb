//! Core state types for the Vicsek simulation.
//!
//! - `Particle` / `System` using `NVec2`
//! - `Kinematics`, the (position, velocity) pair handed to border policies
//!
//! The system holds the list of particles, the current simulation time `t`
//! and the number of steps taken.

use nalgebra::Vector2;
pub type NVec2 = Vector2<f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: NVec2, // position
    pub v: NVec2, // velocity
}

/// Position and per-step displacement of a particle.
///
/// The next unobstructed position is `position + velocity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: NVec2,
    pub velocity: NVec2,
}

impl Kinematics {
    pub fn new(position: NVec2, velocity: NVec2) -> Self {
        Self { position, velocity }
    }

    /// Where the particle would land with no border in the way.
    #[inline]
    pub fn next_position(&self) -> NVec2 {
        self.position + self.velocity
    }
}

#[derive(Debug, Clone)]
pub struct System {
    pub particles: Vec<Particle>, // 2d collection of particles
    pub t: f64, // time
    pub steps: u64, // completed steps
}

impl System {
    pub fn new(particles: Vec<Particle>) -> Self {
        Self {
            particles,
            t: 0.0,
            steps: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
