//! Internal registry state: entry slots, identity tag sets, and the alias table.

use std::collections::{HashMap, HashSet};

use crate::definition::{DefId, Entry};

/// Per-id state: the current entry plus the resolved flag.
pub(crate) struct Slot {
    pub(crate) entry: Entry,
    pub(crate) resolved: bool,
}

/// Canonical id -> slot mapping with an insertion-order index for `keys()`.
#[derive(Default)]
pub(crate) struct EntryStore {
    slots: HashMap<String, Slot>,
    order: Vec<String>,
}

impl EntryStore {
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub(crate) fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.get(id)
    }

    pub(crate) fn slot_mut(&mut self, id: &str) -> Option<&mut Slot> {
        self.slots.get_mut(id)
    }

    /// Stores or overwrites an entry. Overwriting keeps the id's position in
    /// the key order; a new id is appended. The slot always starts
    /// unresolved; callers gate on the resolved flag before getting here.
    pub(crate) fn insert(&mut self, id: &str, entry: Entry) {
        if !self.slots.contains_key(id) {
            self.order.push(id.to_string());
        }
        self.slots.insert(
            id.to_string(),
            Slot {
                entry,
                resolved: false,
            },
        );
    }

    /// Removes the slot and its key-order membership, returning the evicted
    /// slot so the caller can detach tag identities. No-op on unknown ids.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Slot> {
        let slot = self.slots.remove(id)?;
        self.order.retain(|k| k != id);
        Some(slot)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Identity-keyed membership for the `factory` and `protected` tags.
///
/// Keyed by [`DefId`] rather than carried on the slot: the same definition
/// handle may be installed under several ids, and tagging happens before the
/// definition is associated with any id at all.
#[derive(Default)]
pub(crate) struct TagSets {
    factories: HashSet<DefId>,
    protected: HashSet<DefId>,
}

impl TagSets {
    pub(crate) fn tag_factory(&mut self, id: DefId) {
        self.factories.insert(id);
    }

    pub(crate) fn untag_factory(&mut self, id: DefId) -> bool {
        self.factories.remove(&id)
    }

    pub(crate) fn tag_protected(&mut self, id: DefId) {
        self.protected.insert(id);
    }

    pub(crate) fn is_factory(&self, id: DefId) -> bool {
        self.factories.contains(&id)
    }

    pub(crate) fn is_protected(&self, id: DefId) -> bool {
        self.protected.contains(&id)
    }

    /// Detaches an identity from both sets. Run on `remove` so a reused
    /// allocation address cannot inherit stale tags.
    pub(crate) fn detach(&mut self, id: DefId) {
        self.factories.remove(&id);
        self.protected.remove(&id);
    }
}

/// External id -> canonical id, resolved once per lookup. No chains.
#[derive(Default)]
pub(crate) struct AliasTable {
    map: HashMap<String, String>,
}

impl AliasTable {
    pub(crate) fn insert(&mut self, from: &str, to: &str) {
        self.map.insert(from.to_string(), to.to_string());
    }

    /// Single-hop resolution: an alias pointing at another alias is not
    /// followed further.
    pub(crate) fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.map.get(id).map(String::as_str).unwrap_or(id)
    }
}
