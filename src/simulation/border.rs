//! Border interaction policies
//!
//! A border is a closed polygon that particles are not allowed to leave.
//! Each policy decides what happens to a particle whose step crosses one of
//! the polygon's edges:
//!
//! - [`BorderBounce`] reflects the trajectory off the crossed edge
//! - [`BorderWrap`] re-enters the particle on the opposite side of a periodic box
//!
//! Policies return the new [`Kinematics`] instead of mutating the particle.

use log::{debug, warn};

use super::geometry::{
    angle_between, bounding_box, cross, point_in_polygon, rotate, rotate_about,
    segment_intersection, Segment,
};
use super::states::{Kinematics, NVec2};
use crate::error::{Error, Result};

/// Longest chain of reflections followed within a single step.
pub const MAX_BOUNCES: usize = 4;

/// Rotations this close to +180 degrees are reported as -180.
const HALF_TURN_EPS: f64 = 1e-9;

/// Strategy interface for border policies.
pub trait Border {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    /// The polygon the policy acts on.
    fn polygon(&self) -> &Polygon;

    /// Respond to a step that crosses edge `index`.
    fn interact(&self, state: &Kinematics, index: usize) -> Result<Kinematics>;

    /// Full move for one step, following every crossing the step produces.
    fn resolve(&self, state: &Kinematics) -> Result<Kinematics>;

    /// Separation vector from `from` to `to` as seen by the alignment rule.
    fn displacement(&self, from: NVec2, to: NVec2) -> NVec2 {
        to - from
    }

    /// First edge crossed outward by `state`, ignoring `skip`.
    fn crossed_edge(&self, state: &Kinematics, skip: Option<usize>) -> Option<usize> {
        self.polygon().first_crossing(state, skip).map(|(index, _)| index)
    }

    fn contains(&self, p: NVec2) -> bool {
        self.polygon().contains(p)
    }

    fn bounds(&self) -> (NVec2, NVec2) {
        self.polygon().bounds()
    }
}

/// Closed polygon with a known winding.
#[derive(Debug, Clone)]
pub struct Polygon {
    corners: Vec<NVec2>,
    // +1 counter-clockwise, -1 clockwise
    winding: f64,
    bounds: (NVec2, NVec2),
}

impl Polygon {
    /// Build a polygon from its corners, closing it implicitly.
    ///
    /// Errors:
    /// - `Error::InvalidParam` for fewer than 3 corners or non-finite coordinates
    /// - `Error::Degenerate` for zero-length edges or zero enclosed area
    pub fn new(corners: Vec<NVec2>) -> Result<Self> {
        if corners.len() < 3 {
            return Err(Error::InvalidParam(format!(
                "border needs at least 3 corners, got {}",
                corners.len()
            )));
        }
        if !corners.iter().all(|c| c.x.is_finite() && c.y.is_finite()) {
            return Err(Error::InvalidParam("border corners must be finite".into()));
        }

        let n = corners.len();
        let mut twice_area = 0.0;
        for i in 0..n {
            let (a, b) = (corners[i], corners[(i + 1) % n]);
            if (b - a).norm() == 0.0 {
                return Err(Error::Degenerate(format!("border edge {i} has zero length")));
            }
            twice_area += cross(&a, &b);
        }
        if twice_area.abs() < 1e-12 {
            return Err(Error::Degenerate("border encloses no area".into()));
        }

        let bounds = bounding_box(&corners)
            .ok_or_else(|| Error::InvalidParam("border has no corners".into()))?;
        Ok(Self {
            corners,
            winding: twice_area.signum(),
            bounds,
        })
    }

    /// Axis-aligned rectangle `[0, size.x] x [0, size.y]`, counter-clockwise.
    pub fn rectangle(size: NVec2) -> Result<Self> {
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(Error::InvalidParam("domain size must be positive".into()));
        }
        Self::new(vec![
            NVec2::new(0.0, 0.0),
            NVec2::new(size.x, 0.0),
            NVec2::new(size.x, size.y),
            NVec2::new(0.0, size.y),
        ])
    }

    pub fn corners(&self) -> &[NVec2] {
        &self.corners
    }

    pub fn edge_count(&self) -> usize {
        self.corners.len()
    }

    /// Edge `index`, running from corner `index` to the next corner.
    pub fn edge(&self, index: usize) -> Result<Segment> {
        let len = self.corners.len();
        if index >= len {
            return Err(Error::EdgeIndex { index, len });
        }
        Ok(Segment::new(self.corners[index], self.corners[(index + 1) % len]))
    }

    pub fn contains(&self, p: NVec2) -> bool {
        point_in_polygon(p, &self.corners)
    }

    pub fn bounds(&self) -> (NVec2, NVec2) {
        self.bounds
    }

    /// Outward normal (not normalized) of edge `segment`.
    #[inline]
    fn outward(&self, segment: &Segment) -> NVec2 {
        let d = segment.direction();
        NVec2::new(d.y, -d.x) * self.winding
    }

    /// Closest edge that `state` leaves the polygon through, with the
    /// travel fraction at which it does. Steps running along an edge or
    /// heading inward do not count.
    pub fn first_crossing(&self, state: &Kinematics, skip: Option<usize>) -> Option<(usize, f64)> {
        let p = state.position;
        let q = state.next_position();
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.corners.len() {
            if skip == Some(index) {
                continue;
            }
            let Ok(segment) = self.edge(index) else { continue };
            if state.velocity.dot(&self.outward(&segment)) <= 0.0 {
                continue;
            }
            let t = match segment_intersection(p, q, segment.first, segment.second) {
                Ok(Some((_, t))) => t,
                Ok(None) => continue,
                // nearly parallel, but still leaving
                Err(_) => match self.grazing_exit(state, &segment) {
                    Some(t) => t,
                    None => continue,
                },
            };
            if best.map_or(true, |(_, bt)| t < bt) {
                best = Some((index, t));
            }
        }
        best
    }

    /// Travel fraction at which an outward step nearly parallel to `segment`
    /// passes its line, measured along the outward normal. `None` when the
    /// step ends on the inner side or passes the line beyond the edge ends.
    fn grazing_exit(&self, state: &Kinematics, segment: &Segment) -> Option<f64> {
        let n = self.outward(segment);
        let rate = n.dot(&state.velocity);
        if rate <= 0.0 || n.dot(&(state.next_position() - segment.first)) <= 0.0 {
            return None;
        }
        let t = (n.dot(&(segment.first - state.position)) / rate).clamp(0.0, 1.0);
        let w = segment.direction();
        let s = (state.position + t * state.velocity - segment.first).dot(&w) / w.norm_squared();
        (-1e-9..=1.0 + 1e-9).contains(&s).then_some(t)
    }
}

/// Full detail of a single reflection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reflection {
    pub incidence: f64, // unsigned angle between travel and edge, degrees
    pub intersection: NVec2, // where the travel meets the edge
    pub rotation: f64, // applied rotation, degrees, counter-clockwise positive
    pub state: Kinematics, // post-bounce position and velocity
}

/// Rotation prescribed by an incidence angle `theta` in [0, 180].
///
/// Obtuse angles use the supplementary angle, so both branches agree at 90.
#[inline]
pub fn incidence_rotation(theta: f64) -> f64 {
    if theta > 90.0 {
        -2.0 * (180.0 - theta)
    } else {
        -2.0 * theta
    }
}

/// Signed rotation that mirrors `travel` across the line of `border`.
///
/// The magnitude comes from [`incidence_rotation`]. The sign flips when the
/// travel lies clockwise of the border direction oriented along the travel.
/// The result lies in [-180, 180), with a half turn always reported as -180.
pub fn reflection_rotation(theta: f64, travel: &NVec2, border: &NVec2) -> f64 {
    let mut rotation = incidence_rotation(theta);
    let along = if travel.dot(border) >= 0.0 { *border } else { -*border };
    if cross(&along, travel) < 0.0 {
        rotation = -rotation;
    }
    if rotation >= 180.0 - HALF_TURN_EPS {
        rotation -= 360.0;
    }
    rotation
}

/// Reflecting border on an arbitrary simple polygon.
#[derive(Debug, Clone)]
pub struct BorderBounce {
    polygon: Polygon,
}

impl BorderBounce {
    pub fn new(corners: Vec<NVec2>) -> Result<Self> {
        let polygon = Polygon::new(corners)?;
        debug!("bounce border with {} edges", polygon.edge_count());
        Ok(Self { polygon })
    }

    /// Reflect `state` off edge `index`.
    ///
    /// The caller is expected to have detected the crossing already. Inputs
    /// that cannot produce an intersection point fail with
    /// `Error::Degenerate` or `Error::NoCrossing`.
    pub fn reflect(&self, state: &Kinematics, index: usize) -> Result<Reflection> {
        let edge = self.polygon.edge(index)?;
        let p = state.position;
        let p_next = state.next_position();

        let incidence = angle_between(p, p_next, edge.first, edge.second)?;
        let (intersection, _) = segment_intersection(p, p_next, edge.first, edge.second)?
            .ok_or(Error::NoCrossing { edge: index })?;
        let rotation = reflection_rotation(incidence, &state.velocity, &edge.direction());

        Ok(Reflection {
            incidence,
            intersection,
            rotation,
            state: Kinematics::new(
                rotate_about(intersection, p_next, rotation),
                rotate(state.velocity, rotation),
            ),
        })
    }

    /// Mirror a step that leaves through edge `index` too close to parallel
    /// for [`reflect`](Self::reflect) to place the intersection.
    fn graze(&self, state: &Kinematics, index: usize) -> Result<Reflection> {
        let edge = self.polygon.edge(index)?;
        let t = self
            .polygon
            .grazing_exit(state, &edge)
            .ok_or(Error::NoCrossing { edge: index })?;
        let n = self.polygon.outward(&edge).normalize();
        let mirror = |d: NVec2| d - 2.0 * d.dot(&n) * n;

        let incidence = angle_between(state.position, state.next_position(), edge.first, edge.second)?;
        let velocity = mirror(state.velocity);
        let rotation = cross(&state.velocity, &velocity)
            .atan2(state.velocity.dot(&velocity))
            .to_degrees();
        debug!("grazing exit through edge {index}, incidence {incidence:.3e}");

        Ok(Reflection {
            incidence,
            intersection: state.position + t * state.velocity,
            rotation,
            state: Kinematics::new(edge.first + mirror(state.next_position() - edge.first), velocity),
        })
    }
}

impl Border for BorderBounce {
    fn name(&self) -> &'static str {
        "bounce"
    }

    fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    fn interact(&self, state: &Kinematics, index: usize) -> Result<Kinematics> {
        Ok(self.reflect(state, index)?.state)
    }

    fn resolve(&self, state: &Kinematics) -> Result<Kinematics> {
        let mut origin = state.position;
        let mut travel = state.velocity; // what is left of this step
        let mut velocity = state.velocity;
        let mut skip = None;

        for _ in 0..MAX_BOUNCES {
            let current = Kinematics::new(origin, travel);
            let Some(index) = self.crossed_edge(&current, skip) else {
                return Ok(Kinematics::new(origin + travel, velocity));
            };
            let r = match self.reflect(&current, index) {
                Ok(r) => r,
                Err(Error::Degenerate(_)) => self.graze(&current, index)?,
                Err(e) => return Err(e),
            };
            velocity = rotate(velocity, r.rotation);
            travel = r.state.position - r.intersection;
            origin = r.intersection;
            skip = Some(index);
        }

        if self.crossed_edge(&Kinematics::new(origin, travel), skip).is_none() {
            return Ok(Kinematics::new(origin + travel, velocity));
        }
        warn!(
            "bounce chain longer than {MAX_BOUNCES} at ({:.4}, {:.4}), stopping at the border",
            origin.x, origin.y
        );
        Ok(Kinematics::new(origin, velocity))
    }
}

/// Periodic border on the box `[0, w) x [0, h)`.
#[derive(Debug, Clone)]
pub struct BorderWrap {
    polygon: Polygon,
    size: NVec2,
}

impl BorderWrap {
    pub fn new(size: NVec2) -> Result<Self> {
        let polygon = Polygon::rectangle(size)?;
        debug!("wrap border {} x {}", size.x, size.y);
        Ok(Self { polygon, size })
    }

    pub fn size(&self) -> NVec2 {
        self.size
    }

    /// Map a point back into the box.
    #[inline]
    pub fn wrap(&self, p: NVec2) -> NVec2 {
        NVec2::new(wrap_axis(p.x, self.size.x), wrap_axis(p.y, self.size.y))
    }
}

// rem_euclid of a tiny negative value rounds up to `size`
#[inline]
fn wrap_axis(x: f64, size: f64) -> f64 {
    let w = x.rem_euclid(size);
    if w >= size { 0.0 } else { w }
}

impl Border for BorderWrap {
    fn name(&self) -> &'static str {
        "wrap"
    }

    fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    fn interact(&self, state: &Kinematics, index: usize) -> Result<Kinematics> {
        self.polygon.edge(index)?;
        Ok(Kinematics::new(self.wrap(state.next_position()), state.velocity))
    }

    fn resolve(&self, state: &Kinematics) -> Result<Kinematics> {
        Ok(Kinematics::new(self.wrap(state.next_position()), state.velocity))
    }

    fn displacement(&self, from: NVec2, to: NVec2) -> NVec2 {
        let mut d = to - from;
        d.x -= self.size.x * (d.x / self.size.x).round();
        d.y -= self.size.y * (d.y / self.size.y).round();
        d
    }

    fn contains(&self, p: NVec2) -> bool {
        p.x >= 0.0 && p.x < self.size.x && p.y >= 0.0 && p.y < self.size.y
    }
}
