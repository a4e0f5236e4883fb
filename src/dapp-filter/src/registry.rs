//! Dapp registry: `(list, target) -> filter` with a per-list kill-switch.
//!
//! State lives in an immutable [`RegistrySnapshot`] behind a single writer lock.
//! Mutations copy the snapshot, edit the copy and swap it in, so a reader holding
//! a snapshot sees either the state before or after a mutation, never a mix.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use alloy_primitives::Address;
use dapp_filter_types::ListId;
use tracing::info;

use crate::filters::Filter;

#[derive(Clone, Debug)]
struct FilterList {
    enabled: bool,
    entries: BTreeMap<Address, Arc<dyn Filter>>,
}

impl FilterList {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: BTreeMap::new(),
        }
    }
}

/// Point-in-time view of the registry.
#[derive(Clone, Debug, Default)]
pub struct RegistrySnapshot {
    lists: BTreeMap<ListId, FilterList>,
}

impl RegistrySnapshot {
    /// `None` when no entry exists or the list is disabled.
    pub fn lookup(&self, list: ListId, target: Address) -> Option<Arc<dyn Filter>> {
        let filters = self.lists.get(&list)?;
        if !filters.enabled {
            return None;
        }
        filters.entries.get(&target).cloned()
    }

    /// Known lists with their enabled flag.
    pub fn lists(&self) -> impl Iterator<Item = (ListId, bool)> + '_ {
        self.lists.iter().map(|(id, l)| (*id, l.enabled))
    }

    /// Entries of `list` as `(target, filter name)`.
    pub fn entries(&self, list: ListId) -> Vec<(Address, &'static str)> {
        self.lists
            .get(&list)
            .map(|l| l.entries.iter().map(|(a, f)| (*a, f.name())).collect())
            .unwrap_or_default()
    }
}

/// Process-wide registry shared by every executor.
#[derive(Debug, Default)]
pub struct DappRegistry {
    state: RwLock<Arc<RegistrySnapshot>>,
}

impl DappRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state; cheap to take and safe to hold across a whole batch.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn lookup(&self, list: ListId, target: Address) -> Option<Arc<dyn Filter>> {
        self.snapshot().lookup(list, target)
    }

    /// Insert or replace the filter for `(list, target)`. Unknown lists are created enabled.
    pub fn add_entry(&self, list: ListId, target: Address, filter: Arc<dyn Filter>) {
        let name = filter.name();
        let replaced = self.update(|state| {
            state
                .lists
                .entry(list)
                .or_insert_with(|| FilterList::new(true))
                .entries
                .insert(target, filter)
                .is_some()
        });
        info!(%list, %target, filter = name, replaced, "dapp filter registered");
    }

    /// Returns whether an entry was removed.
    pub fn remove_entry(&self, list: ListId, target: Address) -> bool {
        let removed = self.update(|state| {
            state
                .lists
                .get_mut(&list)
                .and_then(|l| l.entries.remove(&target))
                .is_some()
        });
        if removed {
            info!(%list, %target, "dapp filter removed");
        }
        removed
    }

    /// Toggle a whole list without touching its entries.
    pub fn set_list_enabled(&self, list: ListId, enabled: bool) {
        self.update(|state| {
            state
                .lists
                .entry(list)
                .or_insert_with(|| FilterList::new(enabled))
                .enabled = enabled;
        });
        info!(%list, enabled, "filter list toggled");
    }

    fn update<R>(&self, edit: impl FnOnce(&mut RegistrySnapshot) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = RegistrySnapshot::clone(&guard);
        let out = edit(&mut next);
        *guard = Arc::new(next);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{CurveFilter, LidoFilter};
    use alloy_primitives::address;
    use dapp_filter_types::DEFAULT_LIST;

    const LIDO: Address = address!("ae7ab96520de3a18e5e111b5eaab095312d7fe84");
    const CURVE: Address = address!("dc24316b9ae028f1497c275eb9192a3ea0f67022");

    #[test]
    fn lookup_of_unknown_entry_is_none() {
        let registry = DappRegistry::new();
        assert!(registry.lookup(DEFAULT_LIST, LIDO).is_none());
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        assert!(registry.lookup(DEFAULT_LIST, CURVE).is_none());
        assert!(registry.lookup(ListId(1), LIDO).is_none());
    }

    #[test]
    fn add_replaces_existing_entry() {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(CurveFilter));
        let filter = registry.lookup(DEFAULT_LIST, LIDO).unwrap();
        assert_eq!(filter.name(), "curve");
        assert_eq!(registry.snapshot().entries(DEFAULT_LIST).len(), 1);
    }

    #[test]
    fn remove_entry_clears_lookup() {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        assert!(registry.remove_entry(DEFAULT_LIST, LIDO));
        assert!(!registry.remove_entry(DEFAULT_LIST, LIDO));
        assert!(registry.lookup(DEFAULT_LIST, LIDO).is_none());
    }

    #[test]
    fn disabling_a_list_hides_entries_until_reenabled() {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        registry.set_list_enabled(DEFAULT_LIST, false);
        assert!(registry.lookup(DEFAULT_LIST, LIDO).is_none());
        assert_eq!(registry.snapshot().entries(DEFAULT_LIST), vec![(LIDO, "lido")]);
        registry.set_list_enabled(DEFAULT_LIST, true);
        assert_eq!(registry.lookup(DEFAULT_LIST, LIDO).unwrap().name(), "lido");
    }

    #[test]
    fn held_snapshot_is_unaffected_by_later_mutation() {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        let before = registry.snapshot();
        registry.remove_entry(DEFAULT_LIST, LIDO);
        registry.set_list_enabled(DEFAULT_LIST, false);
        assert!(before.lookup(DEFAULT_LIST, LIDO).is_some());
        assert!(registry.snapshot().lookup(DEFAULT_LIST, LIDO).is_none());
    }

    #[test]
    fn new_list_via_toggle_keeps_requested_flag() {
        let registry = DappRegistry::new();
        registry.set_list_enabled(ListId(3), false);
        let lists: Vec<_> = registry.snapshot().lists().collect();
        assert_eq!(lists, vec![(ListId(3), false)]);
        registry.add_entry(ListId(3), LIDO, Arc::new(LidoFilter));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.lists().collect::<Vec<_>>(), vec![(ListId(3), false)]);
        assert!(snapshot.lookup(ListId(3), LIDO).is_none());
    }

    #[test]
    fn concurrent_readers_see_whole_states() {
        let registry = DappRegistry::new();
        registry.add_entry(DEFAULT_LIST, LIDO, Arc::new(LidoFilter));
        registry.add_entry(DEFAULT_LIST, CURVE, Arc::new(CurveFilter));

        std::thread::scope(|s| {
            s.spawn(|| {
                for i in 0..500 {
                    registry.set_list_enabled(DEFAULT_LIST, i % 2 == 0);
                }
            });
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..500 {
                        let snap = registry.snapshot();
                        let lido = snap.lookup(DEFAULT_LIST, LIDO).is_some();
                        let curve = snap.lookup(DEFAULT_LIST, CURVE).is_some();
                        assert_eq!(lido, curve);
                    }
                });
            }
        });
    }
}
