//! Intersection and overlap handling between neighbouring boundary sections
//!
//! Sections are oriented in ring order. Where a section crosses its previous
//! neighbour only the part after the crossing is kept; where it crosses its
//! next neighbour only the part before the crossing is kept.

use crate::constants::DEDUPLICATION_EPSILON;
use crate::geometry::{
    distance, polyline_intersections, PointOnSphere, PolylineIntersection, PolylineOnSphere,
};

/// How a section meets one of its ring neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRelation {
    /// No contact; the section is used whole on that side
    None,
    /// Crosses the previous section; the head before the crossing is dropped
    IntersectPrev,
    /// Crosses the next section; the tail after the crossing is dropped
    IntersectNext,
    /// Starts where the previous section ends
    OverlapPrev,
    /// Ends where the next section starts
    OverlapNext,
    /// Several crossings with a neighbour; left untrimmed on that side
    Other,
}

/// A section after trimming against both neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedSection {
    pub geometry: PolylineOnSphere,
    pub prev_relation: SectionRelation,
    pub next_relation: SectionRelation,
    /// Crossings found with each neighbour
    pub prev_intersections: usize,
    pub next_intersections: usize,
}

impl TrimmedSection {
    /// True if either neighbour crossed the section more than once
    pub fn is_ambiguous(&self) -> bool {
        self.prev_relation == SectionRelation::Other || self.next_relation == SectionRelation::Other
    }
}

fn touches(a: Option<&PointOnSphere>, b: Option<&PointOnSphere>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if distance(*a, *b) < DEDUPLICATION_EPSILON)
}

/// Trim `section` against its ring neighbours.
///
/// `shared_neighbour` is set when the previous and next section are the same
/// feature (a two-section ring); its first crossing then bounds the head and
/// its last crossing bounds the tail.
pub fn trim_section(
    section: &PolylineOnSphere,
    prev: &PolylineOnSphere,
    next: &PolylineOnSphere,
    shared_neighbour: bool,
) -> TrimmedSection {
    let mut geometry = section.clone();

    let (prev_relation, prev_intersections) = if touches(section.first(), prev.last()) {
        (SectionRelation::OverlapPrev, 0)
    } else {
        let found = polyline_intersections(&geometry, prev);
        match pick(&found, shared_neighbour, Side::Prev) {
            Pick::None => (SectionRelation::None, 0),
            Pick::One(ix) => {
                geometry = geometry.split_at(ix.first_arc, ix.point).1;
                (SectionRelation::IntersectPrev, found.len())
            }
            Pick::Ambiguous => (SectionRelation::Other, found.len()),
        }
    };

    let (next_relation, next_intersections) = if touches(section.last(), next.first()) {
        (SectionRelation::OverlapNext, 0)
    } else {
        let found = polyline_intersections(&geometry, next);
        match pick(&found, shared_neighbour, Side::Next) {
            Pick::None => (SectionRelation::None, 0),
            Pick::One(ix) => {
                geometry = geometry.split_at(ix.first_arc, ix.point).0;
                (SectionRelation::IntersectNext, found.len())
            }
            Pick::Ambiguous => (SectionRelation::Other, found.len()),
        }
    };

    TrimmedSection {
        geometry,
        prev_relation,
        next_relation,
        prev_intersections,
        next_intersections,
    }
}

#[derive(Clone, Copy)]
enum Side {
    Prev,
    Next,
}

enum Pick {
    None,
    One(PolylineIntersection),
    Ambiguous,
}

fn pick(found: &[PolylineIntersection], shared_neighbour: bool, side: Side) -> Pick {
    match (found, side) {
        ([], _) => Pick::None,
        ([only], _) => Pick::One(*only),
        ([first, ..], Side::Prev) if shared_neighbour => Pick::One(*first),
        ([.., last], Side::Next) if shared_neighbour => Pick::One(*last),
        _ => Pick::Ambiguous,
    }
}
