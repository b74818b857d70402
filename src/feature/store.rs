//! Arena of features with generation-checked handles

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{Feature, FeatureId};
use crate::error::{ReconstructionError, Result};

/// Reference to a feature in a [`FeatureStore`].
///
/// A handle goes stale when its feature is removed; a later feature reusing
/// the same slot gets a new generation, so stale handles never alias it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureHandle {
    index: u32,
    generation: u32,
}

impl FeatureHandle {
    /// Slot index in the store
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation the handle was issued for
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    feature: Option<Feature>,
}

/// Owns all loaded features and indexes them by [`FeatureId`]
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    ids: HashMap<FeatureId, FeatureHandle>,
}

impl FeatureStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature; its id must not already be present
    pub fn insert(&mut self, feature: Feature) -> Result<FeatureHandle> {
        let id = feature.id().clone();
        if self.ids.contains_key(&id) {
            return Err(ReconstructionError::DuplicateFeatureId(id));
        }

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.feature = Some(feature);
                FeatureHandle { index, generation: slot.generation }
            }
            None => {
                let index = u32::try_from(self.slots.len())
                    .map_err(|_| ReconstructionError::FeatureStoreFull)?;
                self.slots.push(Slot { generation: 0, feature: Some(feature) });
                FeatureHandle { index, generation: 0 }
            }
        };

        self.ids.insert(id, handle);
        Ok(handle)
    }

    /// Remove a feature, invalidating `handle`
    pub fn remove(&mut self, handle: FeatureHandle) -> Result<Feature> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation && s.feature.is_some())
            .ok_or(ReconstructionError::StaleFeatureHandle {
                index: handle.index,
                generation: handle.generation,
            })?;

        let feature = slot.feature.take().ok_or(ReconstructionError::StaleFeatureHandle {
            index: handle.index,
            generation: handle.generation,
        })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.ids.remove(feature.id());
        Ok(feature)
    }

    /// The feature behind `handle`, unless it was removed
    pub fn get(&self, handle: FeatureHandle) -> Option<&Feature> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.feature.as_ref())
    }

    /// Mutable access to a feature's properties (its id and type are fixed)
    pub fn get_mut(&mut self, handle: FeatureHandle) -> Option<&mut Feature> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.feature.as_mut())
    }

    /// True if `handle` still refers to a feature
    pub fn contains(&self, handle: FeatureHandle) -> bool {
        self.get(handle).is_some()
    }

    /// The handle of the feature with id `id`
    pub fn handle_for(&self, id: &FeatureId) -> Option<FeatureHandle> {
        self.ids.get(id).copied()
    }

    /// The feature with id `id`
    pub fn get_by_id(&self, id: &FeatureId) -> Option<&Feature> {
        self.handle_for(id).and_then(|h| self.get(h))
    }

    /// Number of features held
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if the store holds no features
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Live features in slot order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureHandle, &Feature)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let feature = slot.feature.as_ref()?;
            Some((FeatureHandle { index: i as u32, generation: slot.generation }, feature))
        })
    }
}

impl FromIterator<Feature> for FeatureStore {
    /// Collect features, silently keeping the first of any duplicated ids
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        let mut store = FeatureStore::new();
        for feature in iter {
            if let Err(e) = store.insert(feature) {
                log::warn!("skipping feature while collecting store: {e}");
            }
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_lookup_by_id() {
        let mut store = FeatureStore::new();
        let handle = store.insert(Feature::new("a", "gpml:Coastline")).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.handle_for(&"a".into()), Some(handle));
        assert_eq!(store.get(handle).unwrap().id().as_str(), "a");
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = FeatureStore::new();
        store.insert(Feature::new("a", "gpml:Coastline")).unwrap();
        let err = store.insert(Feature::new("a", "gpml:Isochron")).unwrap_err();

        assert_eq!(err, ReconstructionError::DuplicateFeatureId("a".into()));
    }

    #[test]
    fn removed_handles_go_stale_and_slots_are_reused() {
        let mut store = FeatureStore::new();
        let first = store.insert(Feature::new("a", "gpml:Coastline")).unwrap();
        store.remove(first).unwrap();

        assert!(store.get(first).is_none());
        assert!(store.handle_for(&"a".into()).is_none());
        assert!(matches!(store.remove(first), Err(ReconstructionError::StaleFeatureHandle { .. })));

        let second = store.insert(Feature::new("b", "gpml:Coastline")).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second.generation(), first.generation());
        assert!(store.get(first).is_none());
        assert_eq!(store.get(second).unwrap().id().as_str(), "b");
    }

    #[test]
    fn iteration_skips_removed_features() {
        let mut store: FeatureStore = ["a", "b", "c"]
            .into_iter()
            .map(|id| Feature::new(id, "gpml:Coastline"))
            .collect();
        let b = store.handle_for(&"b".into()).unwrap();
        store.remove(b).unwrap();

        let ids: Vec<&str> = store.iter().map(|(_, f)| f.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
