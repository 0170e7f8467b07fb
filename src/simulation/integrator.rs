//! Fixed-step Vicsek integrator
//!
//! One synchronous update: headings are computed from the old state for
//! every particle, perturbed by angular noise, rescaled to the particle speed,
//! and the resulting step is handed to the border policy.

use rand::Rng;

use super::border::Border;
use super::geometry::rotate;
use super::interaction::InteractionSet;
use super::params::Parameters;
use super::states::{Kinematics, NVec2, System};
use crate::error::{Error, Result};

/// Advance the system by one Vicsek step with noise amplitude `noise` (degrees).
/// Positions, velocities, `sys.t` and `sys.steps` are updated in place.
/// On error the system is left at the previous step.
pub fn vicsek_integrator<R: Rng>(
    sys: &mut System,
    interactions: &InteractionSet,
    border: &dyn Border,
    params: &Parameters,
    noise: f64,
    rng: &mut R,
) -> Result<()> {
    let n = sys.particles.len();
    if n == 0 { // no particles, return
        return Ok(());
    }
    let dt = params.dt;

    // h[i] holds the heading of particle i read from the old state
    let mut headings = vec![NVec2::zeros(); n];
    interactions.accumulate_headings(sys, border, &mut headings);

    // new states are committed only once every particle has resolved
    let mut moved = Vec::with_capacity(n);
    for (i, (p, h)) in sys.particles.iter().zip(headings.iter()).enumerate() {
        // uniform turn in [-noise/2, noise/2)
        let turn = noise * (0.5 - rng.gen::<f64>());

        // a vanishing heading keeps the previous direction
        let base = if h.norm_squared() > 0.0 { *h } else { p.v };
        let v = rotate(base, turn) * params.damping;
        let norm = v.norm();
        if !(norm > 0.0 && norm.is_finite()) {
            return Err(Error::Degenerate(format!("particle {i} has no direction")));
        }
        let v = v * (params.speed / norm);

        moved.push(border.resolve(&Kinematics::new(p.x, v * dt))?);
    }

    for (p, m) in sys.particles.iter_mut().zip(moved) {
        p.x = m.position;
        p.v = m.velocity / dt;
    }

    sys.t += dt;
    sys.steps += 1;
    Ok(())
}
