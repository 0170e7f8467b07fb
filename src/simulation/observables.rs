//! Collective observables of a Vicsek system
//!
//! Slice distributions split the domain bounds into `slices` horizontal bands
//! of equal height, parallel to the X axis.

use super::states::{NVec2, System};
use crate::error::{Error, Result};

/// Time-averaged slice distributions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceAverages {
    pub velocity: Vec<f64>, // mean |slice velocity|
    pub density: Vec<f64>, // mean particles per unit area
}

/// Mean velocity vector, zero for an empty system.
pub fn average_velocity(sys: &System) -> NVec2 {
    if sys.particles.is_empty() {
        return NVec2::zeros();
    }
    let sum: NVec2 = sys.particles.iter().map(|p| p.v).sum();
    sum / sys.particles.len() as f64
}

/// Vicsek order parameter |<v>| / speed, 1 for perfect alignment.
pub fn order_parameter(sys: &System, speed: f64) -> f64 {
    if speed <= 0.0 {
        return 0.0;
    }
    average_velocity(sys).norm() / speed
}

fn slice_index(y: f64, lo: f64, height: f64, slices: usize) -> usize {
    // negative offsets saturate to 0 in the cast
    (((y - lo) / height) as usize).min(slices - 1)
}

fn slice_height(bounds: (NVec2, NVec2), slices: usize) -> Result<f64> {
    if slices == 0 {
        return Err(Error::InvalidParam("slice count must be > 0".into()));
    }
    let height = (bounds.1.y - bounds.0.y) / slices as f64;
    if !(height > 0.0) {
        return Err(Error::InvalidParam("domain bounds have no height".into()));
    }
    Ok(height)
}

/// Mean velocity per slice. Empty slices report zero.
pub fn velocity_distribution_y(
    sys: &System,
    bounds: (NVec2, NVec2),
    slices: usize,
) -> Result<Vec<NVec2>> {
    let height = slice_height(bounds, slices)?;
    let mut veloc = vec![NVec2::zeros(); slices];
    let mut counts = vec![0usize; slices];

    for p in &sys.particles {
        let k = slice_index(p.x.y, bounds.0.y, height, slices);
        veloc[k] += p.v;
        counts[k] += 1;
    }
    for (v, c) in veloc.iter_mut().zip(counts.iter()) {
        *v /= (*c).max(1) as f64;
    }
    Ok(veloc)
}

/// Particles per unit area in each slice.
pub fn density_distribution_y(
    sys: &System,
    bounds: (NVec2, NVec2),
    slices: usize,
) -> Result<Vec<f64>> {
    let height = slice_height(bounds, slices)?;
    let area = height * (bounds.1.x - bounds.0.x);
    if !(area > 0.0) {
        return Err(Error::InvalidParam("domain bounds have no width".into()));
    }

    let mut counts = vec![0usize; slices];
    for p in &sys.particles {
        counts[slice_index(p.x.y, bounds.0.y, height, slices)] += 1;
    }
    Ok(counts.into_iter().map(|c| c as f64 / area).collect())
}
