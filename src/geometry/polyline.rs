//! Multi-points, polylines and great circle arc operations

use serde::{Deserialize, Serialize};

use super::point::{distance, PointOnSphere};
use super::rotation::FiniteRotation;
use crate::constants::EPSILON;

/// An unordered collection of points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiPointOnSphere {
    pub points: Vec<PointOnSphere>,
}

impl MultiPointOnSphere {
    /// A set of unconnected points
    pub fn new(points: Vec<PointOnSphere>) -> Self {
        Self { points }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rotate every point
    pub fn rotated(&self, rotation: &FiniteRotation) -> Self {
        Self::new(self.points.iter().map(|p| rotation.rotate_point(p)).collect())
    }
}

/// A sequence of vertices joined by great circle arcs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolylineOnSphere {
    /// Vertices ordered along the line
    pub vertices: Vec<PointOnSphere>,
}

impl PolylineOnSphere {
    /// A polyline through `vertices` in order
    pub fn new(vertices: Vec<PointOnSphere>) -> Self {
        Self { vertices }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if there are no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The first vertex
    pub fn first(&self) -> Option<&PointOnSphere> {
        self.vertices.first()
    }

    /// The last vertex
    pub fn last(&self) -> Option<&PointOnSphere> {
        self.vertices.last()
    }

    /// Iterate over the arcs as (start, end) vertex pairs
    pub fn arcs(&self) -> impl Iterator<Item = (PointOnSphere, PointOnSphere)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }

    /// Get the length of the line in radians
    pub fn length(&self) -> f64 {
        self.arcs().map(|(a, b)| distance(a, b)).sum()
    }

    /// The same vertices in reverse order
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self::new(vertices)
    }

    /// Rotate every vertex; the vertex count is unchanged
    pub fn rotated(&self, rotation: &FiniteRotation) -> Self {
        Self::new(self.vertices.iter().map(|p| rotation.rotate_point(p)).collect())
    }

    /// Minimum angular distance from `point` to any arc (or the lone vertex)
    pub fn distance_to(&self, point: &PointOnSphere) -> f64 {
        match self.vertices.len() {
            0 => f64::INFINITY,
            1 => distance(self.vertices[0], *point),
            _ => self
                .arcs()
                .map(|(a, b)| distance_to_arc(point, &a, &b))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// Split at a point lying on arc `arc_index`, returning the head
    /// (`vertices[..=arc_index]` + point) and the tail (point + the rest).
    pub fn split_at(
        &self,
        arc_index: usize,
        point: PointOnSphere,
    ) -> (PolylineOnSphere, PolylineOnSphere) {
        assert!(arc_index + 1 < self.vertices.len(), "arc index {arc_index} out of range");

        let mut head: Vec<PointOnSphere> = self.vertices[..=arc_index].to_vec();
        push_distinct(&mut head, point);

        let mut tail = vec![point];
        for v in &self.vertices[arc_index + 1..] {
            push_distinct(&mut tail, *v);
        }

        (PolylineOnSphere::new(head), PolylineOnSphere::new(tail))
    }
}

/// Append `point` unless it duplicates the current last vertex
pub(crate) fn push_distinct(vertices: &mut Vec<PointOnSphere>, point: PointOnSphere) {
    match vertices.last() {
        Some(last) if distance(*last, point) < crate::constants::DEDUPLICATION_EPSILON => {}
        _ => vertices.push(point),
    }
}

/// Angular distance from `point` to the minor great circle arc `a`→`b`
pub fn distance_to_arc(point: &PointOnSphere, a: &PointOnSphere, b: &PointOnSphere) -> f64 {
    let p = point.position();
    let Some(normal) = a.position().cross(b.position()).try_normalize() else {
        // Degenerate arc: both endpoints coincide
        return distance(*point, *a);
    };

    // Project onto the arc's great circle and check the projection lies between a and b
    let projected = p - normal * p.dot(normal);
    if let Some(projected) = PointOnSphere::new(projected) {
        if is_on_arc(&projected, a, b) {
            return p.dot(normal).clamp(-1.0, 1.0).asin().abs();
        }
    }
    distance(*point, *a).min(distance(*point, *b))
}

/// True if `point` (assumed on the arc's great circle) lies within the arc `a`→`b`
fn is_on_arc(point: &PointOnSphere, a: &PointOnSphere, b: &PointOnSphere) -> bool {
    let arc = distance(*a, *b);
    (distance(*a, *point) + distance(*point, *b) - arc).abs() < 1e-9
}

/// Intersection of the minor arcs `a0`→`a1` and `b0`→`b1`, if any.
///
/// Arcs lying on the same great circle have no unique intersection and yield `None`.
pub fn arc_intersection(
    a0: &PointOnSphere,
    a1: &PointOnSphere,
    b0: &PointOnSphere,
    b1: &PointOnSphere,
) -> Option<PointOnSphere> {
    let na = a0.position().cross(a1.position()).try_normalize()?;
    let nb = b0.position().cross(b1.position()).try_normalize()?;
    let direction = na.cross(nb);
    if direction.length() < EPSILON {
        return None;
    }

    let candidate = PointOnSphere::new(direction)?;
    [candidate, candidate.antipode()]
        .into_iter()
        .find(|c| is_on_arc(c, a0, a1) && is_on_arc(c, b0, b1))
}

/// An intersection between two polylines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineIntersection {
    /// Index of the arc in the first polyline
    pub first_arc: usize,
    /// Index of the arc in the second polyline
    pub second_arc: usize,
    pub point: PointOnSphere,
}

/// All intersections between `first` and `second`, ordered along `first`.
///
/// An intersection at a shared vertex is reported once even though it touches
/// two adjacent arcs.
pub fn polyline_intersections(
    first: &PolylineOnSphere,
    second: &PolylineOnSphere,
) -> Vec<PolylineIntersection> {
    let mut found: Vec<PolylineIntersection> = Vec::new();
    for (i, (a0, a1)) in first.arcs().enumerate() {
        let mut on_this_arc: Vec<PolylineIntersection> = Vec::new();
        for (j, (b0, b1)) in second.arcs().enumerate() {
            if let Some(point) = arc_intersection(&a0, &a1, &b0, &b1) {
                let duplicate = found
                    .iter()
                    .chain(on_this_arc.iter())
                    .any(|x| distance(x.point, point) < crate::constants::DEDUPLICATION_EPSILON);
                if !duplicate {
                    on_this_arc.push(PolylineIntersection { first_arc: i, second_arc: j, point });
                }
            }
        }
        on_this_arc.sort_by(|x, y| distance(a0, x.point).total_cmp(&distance(a0, y.point)));
        found.extend(on_this_arc);
    }
    found
}
