//! Geological time instants and periods
//!
//! Geological time is measured in millions of years before present (Ma), so a
//! *larger* value is *earlier* in time. Two sentinel states extend the real
//! line: the distant past (earlier than any real time) and the distant future
//! (later than any real time).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::GEO_TIME_EPSILON;

/// A point in geological time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GeoTimeInstant {
    /// A real time in Ma (larger is older)
    Real(f64),
    /// Earlier than every real time
    DistantPast,
    /// Later than every real time
    DistantFuture,
}

impl GeoTimeInstant {
    /// Create a real time instant
    pub fn new(time: f64) -> Self {
        GeoTimeInstant::Real(time)
    }

    /// Present day (0 Ma)
    pub fn present_day() -> Self {
        GeoTimeInstant::Real(0.0)
    }

    /// The real value, if this is not a sentinel
    pub fn value(&self) -> Option<f64> {
        match self {
            GeoTimeInstant::Real(t) => Some(*t),
            _ => None,
        }
    }

    /// True for a finite time
    pub fn is_real(&self) -> bool {
        matches!(self, GeoTimeInstant::Real(_))
    }

    /// True for the distant-past sentinel
    pub fn is_distant_past(&self) -> bool {
        matches!(self, GeoTimeInstant::DistantPast)
    }

    /// True for the distant-future sentinel
    pub fn is_distant_future(&self) -> bool {
        matches!(self, GeoTimeInstant::DistantFuture)
    }

    /// Rank used to order the three states: past < real < future.
    fn rank(&self) -> i8 {
        match self {
            GeoTimeInstant::DistantPast => -1,
            GeoTimeInstant::Real(_) => 0,
            GeoTimeInstant::DistantFuture => 1,
        }
    }

    /// True if `self` and `other` denote the same instant.
    pub fn is_coincident_with(&self, other: &GeoTimeInstant) -> bool {
        match (self, other) {
            (GeoTimeInstant::Real(a), GeoTimeInstant::Real(b)) => (a - b).abs() <= GEO_TIME_EPSILON,
            _ => self.rank() == other.rank(),
        }
    }

    /// True if `self` is earlier (older) than `other` and not coincident with it.
    pub fn is_strictly_earlier_than(&self, other: &GeoTimeInstant) -> bool {
        match (self, other) {
            (GeoTimeInstant::Real(a), GeoTimeInstant::Real(b)) => a - b > GEO_TIME_EPSILON,
            _ => self.rank() < other.rank(),
        }
    }

    /// True if `self` is later (younger) than `other` and not coincident with it.
    pub fn is_strictly_later_than(&self, other: &GeoTimeInstant) -> bool {
        other.is_strictly_earlier_than(self)
    }

    /// Older than, or coincident with, `other`
    pub fn is_earlier_than_or_coincident_with(&self, other: &GeoTimeInstant) -> bool {
        !self.is_strictly_later_than(other)
    }

    /// Younger than, or coincident with, `other`
    pub fn is_later_than_or_coincident_with(&self, other: &GeoTimeInstant) -> bool {
        !self.is_strictly_earlier_than(other)
    }
}

impl From<f64> for GeoTimeInstant {
    fn from(time: f64) -> Self {
        GeoTimeInstant::Real(time)
    }
}

impl fmt::Display for GeoTimeInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoTimeInstant::Real(t) => write!(f, "{t} Ma"),
            GeoTimeInstant::DistantPast => write!(f, "distant past"),
            GeoTimeInstant::DistantFuture => write!(f, "distant future"),
        }
    }
}

/// The period during which a feature exists.
///
/// `begin` is the time of appearance (the older bound) and `end` the time of
/// disappearance (the younger bound). Sentinels leave a side unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub begin: GeoTimeInstant,
    pub end: GeoTimeInstant,
}

impl TimePeriod {
    /// A period from `begin` (older) to `end` (younger)
    pub fn new(begin: GeoTimeInstant, end: GeoTimeInstant) -> Self {
        Self { begin, end }
    }

    /// A period that contains every instant
    pub fn unbounded() -> Self {
        Self::new(GeoTimeInstant::DistantPast, GeoTimeInstant::DistantFuture)
    }

    /// True if `time` lies within `[begin, end]` (inclusive on both sides).
    pub fn contains(&self, time: &GeoTimeInstant) -> bool {
        !time.is_strictly_earlier_than(&self.begin) && !time.is_strictly_later_than(&self.end)
    }
}

impl Default for TimePeriod {
    fn default() -> Self {
        Self::unbounded()
    }
}
