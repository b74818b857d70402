//! Feature property model
//!
//! A [`Feature`] is an identified, typed bag of named top-level properties.
//! Features live in a [`FeatureStore`] arena and are referred to by
//! generation-checked [`FeatureHandle`]s, so reconstructed outputs never hold
//! live pointers back into the feature data.

pub mod property;
pub mod finder;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use property::{
    names,
    DataBlock,
    IrregularSampling,
    PropertyName,
    PropertyValue,
    ScalarSeries,
    TimeSample,
    TimeWindow,
    TopologicalPolygon,
    TopologicalSection,
    WrapperShape,
};
pub use store::{FeatureHandle, FeatureStore};

/// Stable, caller-assigned identifier of a feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(String);

impl FeatureId {
    /// Wrap a caller-assigned id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The qualified type of a feature, e.g. `gpml:TotalReconstructionSequence`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureType(String);

impl FeatureType {
    pub const TOTAL_RECONSTRUCTION_SEQUENCE: &'static str = "gpml:TotalReconstructionSequence";
    pub const VIRTUAL_GEOMAGNETIC_POLE: &'static str = "gpml:VirtualGeomagneticPole";
    pub const TOPOLOGICAL_CLOSED_PLATE_BOUNDARY: &'static str =
        "gpml:TopologicalClosedPlateBoundary";
    pub const MESH_NODE: &'static str = "gpml:MeshNode";

    /// A qualified feature type name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The qualified type name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this is the type `name`
    pub fn is(&self, name: &str) -> bool {
        self.0 == name
    }
}

impl From<&str> for FeatureType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A named property directly under a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopLevelProperty {
    pub name: PropertyName,
    pub value: PropertyValue,
}

/// A geological feature: an id, a type and an ordered list of properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: FeatureId,
    feature_type: FeatureType,
    pub properties: Vec<TopLevelProperty>,
}

impl Feature {
    /// A feature with no properties
    pub fn new(id: impl Into<FeatureId>, feature_type: impl Into<FeatureType>) -> Self {
        Self { id: id.into(), feature_type: feature_type.into(), properties: Vec::new() }
    }

    /// Builder-style property append
    pub fn with_property(mut self, name: impl Into<PropertyName>, value: PropertyValue) -> Self {
        self.add_property(name, value);
        self
    }

    /// Append a property, keeping any others with the same name
    pub fn add_property(&mut self, name: impl Into<PropertyName>, value: PropertyValue) {
        self.properties.push(TopLevelProperty { name: name.into(), value });
    }

    /// The feature's id
    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    /// The feature's qualified type
    pub fn feature_type(&self) -> &FeatureType {
        &self.feature_type
    }

    /// First property with the given name
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// All properties with the given name, in order
    pub fn properties_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a PropertyValue> + 'a {
        self.properties.iter().filter(move |p| p.name == name).map(|p| &p.value)
    }
}
