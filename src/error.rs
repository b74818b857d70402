//! Error type for the public reconstruction API
//!
//! Malformed feature data is never reported through this type: such features
//! are skipped and counted in the reconstruction diagnostics instead. Errors
//! here mean the caller broke an API contract.

use thiserror::Error;

use crate::feature::FeatureId;

/// Errors produced by the reconstruction API.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconstructionError {
    /// Reconstructions can only be made at a real (finite) geological time.
    #[error("reconstruction time must be a real geological time, got {0}")]
    NonRealReconstructionTime(String),
    /// Velocity differencing needs a strictly positive time increment.
    #[error("velocity delta time must be positive and finite, got {0}")]
    InvalidDeltaTime(f64),
    /// A feature with the same id is already in the store.
    #[error("feature id `{0}` is already present in the feature store")]
    DuplicateFeatureId(FeatureId),
    /// The handle refers to a feature that has since been removed.
    #[error("feature handle (slot {index}, generation {generation}) is stale")]
    StaleFeatureHandle { index: u32, generation: u32 },
    /// Every slot index a handle can address is taken.
    #[error("feature store is full")]
    FeatureStoreFull,
}

/// Result alias for reconstruction operations.
pub type Result<T> = std::result::Result<T, ReconstructionError>;
