//! Planar geometry primitives used by the border policies
//!
//! Angles cross this module's boundary in degrees. `rotate` and `rotate_about`
//! are counter-clockwise for positive angles.

use nalgebra::{Point2, Rotation2};

use super::states::NVec2;
use crate::error::{Error, Result};

/// Relative tolerance for parallel lines and segment-end slack.
pub const EPS: f64 = 1e-12;

/// Ordered pair of endpoints describing one border edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub first: NVec2,
    pub second: NVec2,
}

impl Segment {
    pub fn new(first: NVec2, second: NVec2) -> Self {
        Self { first, second }
    }

    #[inline]
    pub fn direction(&self) -> NVec2 {
        self.second - self.first
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }
}

/// Scalar 2D cross product `a.x * b.y - a.y * b.x`.
#[inline]
pub fn cross(a: &NVec2, b: &NVec2) -> f64 {
    a.perp(b)
}

/// Unsigned angle in degrees, in [0, 180], between the ray `p -> p_next`
/// and the segment `a -> b`.
pub fn angle_between(p: NVec2, p_next: NVec2, a: NVec2, b: NVec2) -> Result<f64> {
    let u = p_next - p;
    let w = b - a;
    let nu = u.norm();
    let nw = w.norm();
    if nu == 0.0 || !nu.is_finite() {
        return Err(Error::Degenerate("zero-length travel vector".into()));
    }
    if nw == 0.0 || !nw.is_finite() {
        return Err(Error::Degenerate("zero-length border segment".into()));
    }
    // acos is undefined a hair outside [-1, 1]
    let cos = (u.dot(&w) / (nu * nw)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Intersection of segment `p -> q` with segment `a -> b`.
///
/// Returns `Ok(Some((point, t)))` where `t` in [0, 1] is the position of the
/// point along `p -> q`, `Ok(None)` when the lines meet outside either segment,
/// and `Error::Degenerate` when the lines are parallel or a segment has zero length.
pub fn segment_intersection(
    p: NVec2,
    q: NVec2,
    a: NVec2,
    b: NVec2,
) -> Result<Option<(NVec2, f64)>> {
    let u = q - p;
    let w = b - a;
    let nu = u.norm();
    let nw = w.norm();
    if nu == 0.0 || nw == 0.0 {
        return Err(Error::Degenerate("zero-length segment in intersection".into()));
    }

    let denom = cross(&u, &w);
    if denom.abs() <= EPS * nu * nw {
        return Err(Error::Degenerate("travel is parallel to the border".into()));
    }

    // p + t u = a + s w
    let ap = a - p;
    let t = cross(&ap, &w) / denom;
    let s = cross(&ap, &u) / denom;

    let slack = 1e-9;
    if t < -slack || t > 1.0 + slack || s < -slack || s > 1.0 + slack {
        return Ok(None);
    }
    let t = t.clamp(0.0, 1.0);
    Ok(Some((p + t * u, t)))
}

/// Rotate `v` about the origin by `degrees`.
#[inline]
pub fn rotate(v: NVec2, degrees: f64) -> NVec2 {
    Rotation2::new(degrees.to_radians()) * v
}

/// Rotate `point` about `pivot` by `degrees`.
#[inline]
pub fn rotate_about(pivot: NVec2, point: NVec2, degrees: f64) -> NVec2 {
    pivot + rotate(point - pivot, degrees)
}

/// Even-odd ray casting test. Points on an edge may land on either side.
pub fn point_in_polygon(p: NVec2, corners: &[NVec2]) -> bool {
    let n = corners.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (ci, cj) = (corners[i], corners[j]);
        if (ci.y > p.y) != (cj.y > p.y) {
            let x_at = ci.x + (p.y - ci.y) * (cj.x - ci.x) / (cj.y - ci.y);
            if p.x < x_at {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounding box `(min, max)` of a point set.
pub fn bounding_box(points: &[NVec2]) -> Option<(NVec2, NVec2)> {
    let first = points.first()?;
    let (mut lo, mut hi) = (Point2::from(*first), Point2::from(*first));
    for p in points.iter().skip(1) {
        lo = lo.inf(&Point2::from(*p));
        hi = hi.sup(&Point2::from(*p));
    }
    Some((lo.coords, hi.coords))
}
