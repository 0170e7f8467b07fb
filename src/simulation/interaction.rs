//! Heading contributors for the Vicsek update
//!
//! Each term adds a direction into `out[i]` for every particle. The summed
//! heading is later perturbed by noise and rescaled to the particle speed,
//! so only its direction matters.

use crate::simulation::border::Border;
use crate::simulation::states::{NVec2, System};

/// Collection of heading terms (alignment, etc.)
/// Their contributions are summed into a single heading per particle
pub struct InteractionSet {
    terms: Vec<Box<dyn Interaction + Send + Sync>>,
}

impl InteractionSet {
    /// Create an empty interaction set
    pub fn new() -> Self {
        Self {
            terms: Vec::new()
        }
    }

    /// Add a heading term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: Interaction + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// Compute total headings for all particles in `sys`
    /// - `out[i]` is reset and then receives every term's contribution
    pub fn accumulate_headings(&self, sys: &System, border: &dyn Border, out: &mut [NVec2]) {
        for h in out.iter_mut() {
            *h = NVec2::zeros();
        }
        for term in &self.terms {
            term.heading(sys, border, out);
        }
    }
}

impl Default for InteractionSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for heading sources operating on [`System`]
/// Implementations add their contribution into `out[i]` for each particle
pub trait Interaction {
    fn heading(&self, sys: &System, border: &dyn Border, out: &mut [NVec2]);
}

/// Vicsek alignment: every particle steers towards the summed velocity of
/// all particles within the interaction radius, itself included.
pub struct VicsekAlignment {
    pub radius2: f64, // squared interaction radius
}

impl Interaction for VicsekAlignment {
    fn heading(&self, sys: &System, border: &dyn Border, out: &mut [NVec2]) {
        let n = sys.particles.len();
        if n == 0 {
            return;
        }

        for i in 0..n {
            let pi = &sys.particles[i];
            out[i] += pi.v;

            // each unordered pair once, contributions go both ways
            for j in (i + 1)..n {
                let pj = &sys.particles[j];
                let r = border.displacement(pi.x, pj.x);
                if r.norm_squared() < self.radius2 {
                    out[i] += pj.v;
                    out[j] += pi.v;
                }
            }
        }
    }
}
