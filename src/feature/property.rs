//! Typed property values and the time-dependent wrappers around them
//!
//! Property values form a closed sum type. Consumers `match` on the variants
//! they care about and call [`PropertyValue::resolve_at`] to see through
//! `ConstantValue`, `PiecewiseAggregation` and `IrregularSampling` wrappers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::FeatureId;
use crate::geometry::{FiniteRotation, GeometryOnSphere, PlateId, PointOnSphere};
use crate::time::{GeoTimeInstant, TimePeriod};

/// Well-known property names
pub mod names {
    pub const RECONSTRUCTION_PLATE_ID: &str = "gpml:reconstructionPlateId";
    pub const VALID_TIME: &str = "gml:validTime";
    pub const FIXED_REFERENCE_FRAME: &str = "gpml:fixedReferenceFrame";
    pub const MOVING_REFERENCE_FRAME: &str = "gpml:movingReferenceFrame";
    pub const TOTAL_RECONSTRUCTION_POLE: &str = "gpml:totalReconstructionPole";
    pub const BOUNDARY: &str = "gpml:boundary";
    pub const POLE_POSITION: &str = "gpml:polePosition";
    pub const AVERAGE_SAMPLE_SITE_POSITION: &str = "gpml:averageSampleSitePosition";
    pub const POLE_A95: &str = "gpml:poleA95";
    pub const POLE_DM: &str = "gpml:poleDm";
    pub const POLE_DP: &str = "gpml:poleDp";
    pub const AVERAGE_AGE: &str = "gpml:averageAge";
    pub const CENTER_LINE_OF: &str = "gpml:centerLineOf";
    pub const OUTLINE_OF: &str = "gpml:outlineOf";
    pub const POSITION: &str = "gpml:position";
    pub const MESH_POINTS: &str = "gpml:meshPoints";
}

/// The qualified name of a top-level property, e.g. `gpml:reconstructionPlateId`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyName(String);

impl PropertyName {
    /// A qualified property name such as `gpml:reconstructionPlateId`
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The qualified name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for PropertyName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PropertyName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for PropertyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One sample of an irregular sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSample {
    pub value: PropertyValue,
    pub time: GeoTimeInstant,
    /// Disabled samples are logically absent
    pub disabled: bool,
    pub description: Option<String>,
}

impl TimeSample {
    /// An enabled sample of `value` at `time`
    pub fn new(value: PropertyValue, time: impl Into<GeoTimeInstant>) -> Self {
        Self { value, time: time.into(), disabled: false, description: None }
    }

    /// Mark the sample as disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// A value sampled at irregular times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrregularSampling {
    pub samples: Vec<TimeSample>,
}

impl IrregularSampling {
    /// A sampling over `samples` in any order
    pub fn new(samples: Vec<TimeSample>) -> Self {
        Self { samples }
    }

    /// Samples that are not disabled, in stored order
    pub fn enabled_samples(&self) -> impl Iterator<Item = &TimeSample> {
        self.samples.iter().filter(|s| !s.disabled)
    }
}

/// A value that holds for one time period of a piecewise aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub value: PropertyValue,
    pub period: TimePeriod,
}

/// A named series of scalar values, one per domain point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarSeries {
    pub scalar_type: String,
    pub values: Vec<f64>,
}

/// The range of a scalar coverage: parallel scalar series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataBlock {
    pub series: Vec<ScalarSeries>,
}

/// Reference to the feature (and optionally the property) whose reconstructed
/// geometry forms one section of a topological boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologicalSection {
    pub source: FeatureId,
    /// Geometry property to use; `None` takes the first geometry found
    pub property: Option<PropertyName>,
    /// Traverse the section's vertices in reverse order
    pub reverse: bool,
}

impl TopologicalSection {
    /// A section taking the first geometry of `source`
    pub fn new(source: impl Into<FeatureId>) -> Self {
        Self { source: source.into(), property: None, reverse: false }
    }

    /// Traverse the section backwards
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

/// Ordered ring of sections describing a topological closed polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologicalPolygon {
    pub sections: Vec<TopologicalSection>,
}

/// The structure of time-dependent wrapping around a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperShape {
    Bare,
    ConstantValue,
    IrregularSampling(usize),
    PiecewiseAggregation(usize),
}

/// A typed property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    PlateId(PlateId),
    Double(f64),
    String(String),
    Boolean(bool),
    TimeInstant(GeoTimeInstant),
    TimePeriod(TimePeriod),
    FiniteRotation(FiniteRotation),
    Geometry(GeometryOnSphere),
    /// A curve with an orientation; `reversed` traverses `base` backwards
    OrientableCurve { base: Box<PropertyValue>, reversed: bool },
    ConstantValue { value: Box<PropertyValue>, description: Option<String> },
    IrregularSampling(IrregularSampling),
    PiecewiseAggregation(Vec<TimeWindow>),
    DataBlock(DataBlock),
    TopologicalPolygon(TopologicalPolygon),
}

impl PropertyValue {
    /// Wrap `value` in a `ConstantValue`
    pub fn constant(value: PropertyValue) -> Self {
        PropertyValue::ConstantValue { value: Box::new(value), description: None }
    }

    /// See through time-dependent wrappers.
    ///
    /// `ConstantValue` always unwraps. `PiecewiseAggregation` picks the window
    /// containing `time` (the first window when `time` is `None`).
    /// `IrregularSampling` yields the enabled sample coincident with `time`.
    pub fn resolve_at(&self, time: Option<&GeoTimeInstant>) -> Option<&PropertyValue> {
        match self {
            PropertyValue::ConstantValue { value, .. } => value.resolve_at(time),
            PropertyValue::PiecewiseAggregation(windows) => {
                let window = match time {
                    Some(t) => windows.iter().find(|w| w.period.contains(t)),
                    None => windows.first(),
                };
                window.and_then(|w| w.value.resolve_at(time))
            }
            PropertyValue::IrregularSampling(sampling) => {
                let t = time?;
                sampling
                    .enabled_samples()
                    .find(|s| s.time.is_coincident_with(t))
                    .and_then(|s| s.value.resolve_at(time))
            }
            other => Some(other),
        }
    }

    /// The outermost wrapper structure
    pub fn wrapper_shape(&self) -> WrapperShape {
        match self {
            PropertyValue::ConstantValue { .. } => WrapperShape::ConstantValue,
            PropertyValue::IrregularSampling(s) => WrapperShape::IrregularSampling(s.samples.len()),
            PropertyValue::PiecewiseAggregation(w) => WrapperShape::PiecewiseAggregation(w.len()),
            _ => WrapperShape::Bare,
        }
    }

    /// The plate id, if this is one
    pub fn as_plate_id(&self) -> Option<PlateId> {
        match self {
            PropertyValue::PlateId(id) => Some(*id),
            _ => None,
        }
    }

    /// The double, if this is one
    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The time period, if this is one
    pub fn as_time_period(&self) -> Option<TimePeriod> {
        match self {
            PropertyValue::TimePeriod(p) => Some(*p),
            _ => None,
        }
    }

    /// The finite rotation, if this is one
    pub fn as_finite_rotation(&self) -> Option<&FiniteRotation> {
        match self {
            PropertyValue::FiniteRotation(r) => Some(r),
            _ => None,
        }
    }

    /// The geometry carried by this (already unwrapped) value; orientable
    /// curves unwrap to their base, reversed when the orientation requires it.
    pub fn as_geometry(&self) -> Option<GeometryOnSphere> {
        match self {
            PropertyValue::Geometry(g) => Some(g.clone()),
            PropertyValue::OrientableCurve { base, reversed } => match base.as_geometry()? {
                GeometryOnSphere::Polyline(l) if *reversed => {
                    Some(GeometryOnSphere::Polyline(l.reversed()))
                }
                g => Some(g),
            },
            _ => None,
        }
    }

    /// The point, if this is a point geometry
    pub fn as_point(&self) -> Option<PointOnSphere> {
        match self.as_geometry()? {
            GeometryOnSphere::Point(p) => Some(p),
            _ => None,
        }
    }

    /// The data block, if this is one
    pub fn as_data_block(&self) -> Option<&DataBlock> {
        match self {
            PropertyValue::DataBlock(d) => Some(d),
            _ => None,
        }
    }

    /// The topological polygon, if this is one
    pub fn as_topological_polygon(&self) -> Option<&TopologicalPolygon> {
        match self {
            PropertyValue::TopologicalPolygon(t) => Some(t),
            _ => None,
        }
    }
}
