//! Reconstruction settings

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ANCHOR_PLATE_ID, DEFAULT_VELOCITY_DELTA_TIME};
use crate::error::{ReconstructionError, Result};
use crate::geometry::PlateId;
use crate::processors::VgpRenderSettings;
use crate::tree::EdgeTieBreak;

/// Configuration for a [`Reconstructor`](crate::Reconstructor)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Plate whose absolute rotation is the identity
    pub anchor_plate_id: PlateId,
    /// Choice among several parent edges of one moving plate
    pub edge_tie_break: EdgeTieBreak,
    pub vgp: VgpRenderSettings,
    /// Time increment (Ma) for velocity differencing
    pub velocity_delta_time: f64,
    /// Resolve topological plate boundaries after reconstructing features
    pub resolve_topologies: bool,
    /// Compute velocity fields for mesh node features
    pub calculate_velocities: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            anchor_plate_id: DEFAULT_ANCHOR_PLATE_ID,
            edge_tie_break: EdgeTieBreak::default(),
            vgp: VgpRenderSettings::default(),
            velocity_delta_time: DEFAULT_VELOCITY_DELTA_TIME,
            resolve_topologies: true,
            calculate_velocities: false,
        }
    }
}

impl ReconstructionConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style anchor plate setter
    pub fn with_anchor_plate_id(mut self, anchor_plate_id: PlateId) -> Self {
        self.anchor_plate_id = anchor_plate_id;
        self
    }

    /// Builder-style tie-break policy setter
    pub fn with_edge_tie_break(mut self, edge_tie_break: EdgeTieBreak) -> Self {
        self.edge_tie_break = edge_tie_break;
        self
    }

    /// Builder-style VGP settings setter
    pub fn with_vgp_settings(mut self, vgp: VgpRenderSettings) -> Self {
        self.vgp = vgp;
        self
    }

    /// Set the velocity time increment explicitly
    pub fn with_velocity_delta_time(mut self, delta_time: f64) -> Self {
        assert!(delta_time.is_finite() && delta_time > 0.0, "Velocity delta time must be positive");
        self.velocity_delta_time = delta_time;
        self
    }

    /// Whether to resolve topological boundaries
    pub fn with_topologies(mut self, resolve_topologies: bool) -> Self {
        self.resolve_topologies = resolve_topologies;
        self
    }

    /// Whether to calculate velocity fields for mesh nodes
    pub fn with_velocities(mut self, calculate_velocities: bool) -> Self {
        self.calculate_velocities = calculate_velocities;
        self
    }

    /// Check values that may have bypassed the builder (e.g. when deserialized)
    pub fn validate(&self) -> Result<()> {
        if !(self.velocity_delta_time.is_finite() && self.velocity_delta_time > 0.0) {
            return Err(ReconstructionError::InvalidDeltaTime(self.velocity_delta_time));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::VgpVisibility;

    #[test]
    fn builder_sets_fields() {
        let config = ReconstructionConfig::new()
            .with_anchor_plate_id(701)
            .with_edge_tie_break(EdgeTieBreak::LowestFixedPlateId)
            .with_velocity_delta_time(2.0)
            .with_velocities(true)
            .with_topologies(false);

        assert_eq!(config.anchor_plate_id, 701);
        assert_eq!(config.edge_tie_break, EdgeTieBreak::LowestFixedPlateId);
        assert_eq!(config.velocity_delta_time, 2.0);
        assert!(config.calculate_velocities);
        assert!(!config.resolve_topologies);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "Velocity delta time must be positive")]
    fn zero_delta_time_panics() {
        let _ = ReconstructionConfig::new().with_velocity_delta_time(0.0);
    }

    #[test]
    fn json_round_trip_and_partial_documents() {
        let config = ReconstructionConfig::new()
            .with_anchor_plate_id(801)
            .with_vgp_settings(
                VgpRenderSettings::default().with_visibility(VgpVisibility::AlwaysVisible),
            );
        let json = serde_json::to_string(&config).unwrap();
        let back: ReconstructionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let partial: ReconstructionConfig =
            serde_json::from_str(r#"{ "anchor_plate_id": 5 }"#).unwrap();
        assert_eq!(partial.anchor_plate_id, 5);
        assert_eq!(partial.velocity_delta_time, DEFAULT_VELOCITY_DELTA_TIME);
    }

    #[test]
    fn deserialized_bad_delta_time_fails_validation() {
        let config: ReconstructionConfig =
            serde_json::from_str(r#"{ "velocity_delta_time": -1.0 }"#).unwrap();
        assert_eq!(config.validate(), Err(ReconstructionError::InvalidDeltaTime(-1.0)));
    }
}
