//! Per-subscription cellular indicator state.
//!
//! The registry is an ordered list keyed by subscription id. The order is the
//! order in which ids were last supplied and decides left-to-right placement.
//! Replacing the subscription list rebuilds the whole registry in one step;
//! entries are never patched in or out individually, except for the lazy
//! insert used when a signal update arrives ahead of the subscription list.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::signal::{IconId, require_description};

/// Externally assigned, stable subscription identifier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SubscriptionId(pub i32);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Indicator values for one subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobileIndicators {
    pub sub_id: SubscriptionId,
    pub visible: bool,
    pub strength_icon: IconId,
    pub type_icon: IconId,
    pub activity_icon: IconId,
    pub description: String,
    pub type_description: String,
    pub roaming: bool,
    pub wide_type_icon: bool,
}

impl MobileIndicators {
    /// Default (hidden) state for a freshly registered subscription.
    pub fn new(sub_id: SubscriptionId) -> Self {
        Self {
            sub_id,
            visible: false,
            strength_icon: IconId::NONE,
            type_icon: IconId::NONE,
            activity_icon: IconId::NONE,
            description: String::new(),
            type_description: String::new(),
            roaming: false,
            wide_type_icon: false,
        }
    }

    /// Combined description: type description, one space, description.
    pub fn content_description(&self) -> String {
        format!("{} {}", self.type_description, self.description)
    }

    /// Overwrite every field from `update`.
    ///
    /// Both descriptions are checked before anything is written, so a
    /// rejected update leaves the entry untouched.
    pub fn apply(&mut self, update: MobileUpdate) -> Result<()> {
        let description = require_description("mobile.description", update.description)?;
        let type_description =
            require_description("mobile.type_description", update.type_description)?;

        self.visible = update.visible;
        self.strength_icon = update.strength_icon;
        self.type_icon = update.type_icon;
        self.activity_icon = update.activity_icon;
        self.description = description;
        self.type_description = type_description;
        self.roaming = update.roaming;
        self.wide_type_icon = update.wide_type_icon;
        Ok(())
    }
}

/// Field set written into a [`MobileIndicators`] entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MobileUpdate {
    pub visible: bool,
    pub strength_icon: IconId,
    pub type_icon: IconId,
    pub activity_icon: IconId,
    pub description: Option<String>,
    pub type_description: Option<String>,
    pub roaming: bool,
    pub wide_type_icon: bool,
}

/// Ordered collection of per-subscription indicator state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionRegistry {
    entries: Vec<MobileIndicators>,
    /// Bumped on every wholesale replacement.
    generation: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registry with one default entry per id, in the given order.
    ///
    /// The new list is built aside and swapped in, so a reader holding the
    /// registry sees either the old list or the new one. Repeated ids keep
    /// their first position.
    pub fn replace_subscriptions(&mut self, ids: &[SubscriptionId]) {
        let mut entries: Vec<MobileIndicators> = Vec::with_capacity(ids.len());
        for &id in ids {
            if entries.iter().any(|e| e.sub_id == id) {
                warn!("Duplicate subscription id {} in subscription list, ignoring", id);
                continue;
            }
            entries.push(MobileIndicators::new(id));
        }

        self.entries = entries;
        self.generation += 1;
        debug!(
            "Subscriptions replaced (generation {}): {:?}",
            self.generation,
            self.ids()
        );
    }

    /// Return the entry for `id`, appending a default one if it is missing.
    pub fn get_or_create(&mut self, id: SubscriptionId) -> &mut MobileIndicators {
        match self.entries.iter().position(|e| e.sub_id == id) {
            Some(index) => &mut self.entries[index],
            None => {
                debug!("Lazily registering subscription {}", id);
                self.entries.push(MobileIndicators::new(id));
                let last = self.entries.len() - 1;
                &mut self.entries[last]
            }
        }
    }

    /// Update an existing entry in place.
    ///
    /// Unknown ids are a logged no-op reported as
    /// [`Error::UnknownSubscription`]; use [`get_or_create`](Self::get_or_create)
    /// when the entry should be created.
    pub fn update_subscription(&mut self, id: SubscriptionId, update: MobileUpdate) -> Result<()> {
        let Some(entry) = self.entries.iter_mut().find(|e| e.sub_id == id) else {
            warn!("Ignoring update for unknown subscription {}", id);
            return Err(Error::UnknownSubscription(id));
        };
        entry.apply(update)
    }

    pub fn get(&self, id: SubscriptionId) -> Option<&MobileIndicators> {
        self.entries.iter().find(|e| e.sub_id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MobileIndicators> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.entries.iter().map(|e| e.sub_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Verify that no subscription id appears twice.
    ///
    /// A duplicate would mean entries from two different subscription lists
    /// were mixed together.
    pub fn check_consistency(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|e| e.sub_id == entry.sub_id) {
                return Err(Error::InconsistentState(format!(
                    "subscription {} registered twice (generation {})",
                    entry.sub_id, self.generation
                )));
            }
        }
        Ok(())
    }

    /// Registry holding one default entry per id, repeats included.
    #[cfg(test)]
    pub(crate) fn with_entries_unchecked(ids: &[SubscriptionId]) -> Self {
        Self {
            entries: ids.iter().copied().map(MobileIndicators::new).collect(),
            generation: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i32]) -> Vec<SubscriptionId> {
        raw.iter().copied().map(SubscriptionId).collect()
    }

    fn update(visible: bool, type_icon: u32) -> MobileUpdate {
        MobileUpdate {
            visible,
            strength_icon: IconId(20),
            type_icon: IconId(type_icon),
            activity_icon: IconId(21),
            description: Some("4 bars".to_string()),
            type_description: Some("LTE".to_string()),
            roaming: false,
            wide_type_icon: false,
        }
    }

    #[test]
    fn test_replace_preserves_order() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[5, 2, 9]));
        assert_eq!(registry.ids(), ids(&[5, 2, 9]));
        assert!(registry.iter().all(|e| !e.visible));
    }

    #[test]
    fn test_replace_discards_old_entries() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[1, 2]));
        registry
            .update_subscription(SubscriptionId(1), update(true, 7))
            .unwrap();

        registry.replace_subscriptions(&ids(&[1, 3]));
        assert_eq!(registry.ids(), ids(&[1, 3]));
        // Rebuilt, not patched: the surviving id starts over from defaults
        assert!(!registry.get(SubscriptionId(1)).unwrap().visible);
        assert_eq!(registry.generation(), 2);
    }

    #[test]
    fn test_replace_drops_duplicate_ids() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[4, 4, 1]));
        assert_eq!(registry.ids(), ids(&[4, 1]));
        assert!(registry.check_consistency().is_ok());
    }

    #[test]
    fn test_get_or_create_finds_by_id_not_position() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[8, 3]));

        registry.get_or_create(SubscriptionId(3)).visible = true;
        assert_eq!(registry.len(), 2);
        assert!(registry.get(SubscriptionId(3)).unwrap().visible);
        assert!(!registry.get(SubscriptionId(8)).unwrap().visible);
    }

    #[test]
    fn test_get_or_create_appends_unknown() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[1]));
        registry.get_or_create(SubscriptionId(6));
        assert_eq!(registry.ids(), ids(&[1, 6]));
        // Lazy inserts do not count as a replacement
        assert_eq!(registry.generation(), 1);
    }

    #[test]
    fn test_update_unknown_subscription_is_noop() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[1]));
        let before = registry.clone();

        let err = registry
            .update_subscription(SubscriptionId(2), update(true, 1))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownSubscription(SubscriptionId(2))));
        assert_eq!(registry, before);
    }

    #[test]
    fn test_update_rejects_missing_type_description() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[1]));

        let mut bad = update(true, 1);
        bad.type_description = None;
        assert!(registry.update_subscription(SubscriptionId(1), bad).is_err());
        assert!(!registry.get(SubscriptionId(1)).unwrap().visible);
    }

    #[test]
    fn test_consistency_check_finds_repeated_id() {
        let mut registry = SubscriptionRegistry::new();
        registry.replace_subscriptions(&ids(&[1, 2, 1]));
        assert!(registry.check_consistency().is_ok());

        let mixed = SubscriptionRegistry::with_entries_unchecked(&ids(&[1, 2, 1]));
        let err = mixed.check_consistency().unwrap_err();
        assert!(matches!(err, Error::InconsistentState(_)));
        assert!(err.to_string().contains("subscription 1"));
    }

    #[test]
    fn test_content_description_joins_with_single_space() {
        let mut entry = MobileIndicators::new(SubscriptionId(1));
        entry.apply(update(true, 1)).unwrap();
        assert_eq!(entry.content_description(), "LTE 4 bars");

        entry.type_description.clear();
        entry.description.clear();
        assert_eq!(entry.content_description(), " ");
    }
}
