//! crates/memo_share_core/src/merge.rs
//!
//! The pure reducer that folds the two live note queries into one visible list,
//! and the versioned sharing-resolution cache that sits on top of it.
//!
//! Nothing in here performs I/O, so the merge rules can be exercised directly.

use crate::domain::{Note, NoteId, UserProfile};
use std::collections::{HashMap, HashSet};

/// A snapshot delivered by one of the two live queries, tagged by its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEvent {
    /// Latest result of the "owner equals me" query.
    Owned(Vec<Note>),
    /// Latest result of the "grantees contain me" query.
    Shared(Vec<Note>),
}

/// The visible note set for one signed-in user.
///
/// Each source keeps only its latest snapshot; the visible list is rebuilt from
/// both on every change. Applying the same snapshot twice, or the two sources
/// in either order, yields the same list.
#[derive(Debug, Clone, Default)]
pub struct NoteSet {
    owned: Vec<Note>,
    shared: Vec<Note>,
    visible: Vec<Note>,
    version: u64,
}

impl NoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one snapshot into the set.
    ///
    /// Returns `true` when the visible list changed, in which case the version
    /// has been bumped.
    pub fn apply(&mut self, event: SnapshotEvent) -> bool {
        let (slot, incoming) = match event {
            SnapshotEvent::Owned(notes) => (&mut self.owned, notes),
            SnapshotEvent::Shared(notes) => (&mut self.shared, notes),
        };
        let incoming = normalize(incoming);
        if *slot == incoming {
            return false;
        }
        *slot = incoming;

        let merged = union(&self.owned, &self.shared);
        if merged == self.visible {
            return false;
        }
        self.visible = merged;
        self.version += 1;
        true
    }

    /// Drops both snapshots, e.g. after sign-out. The version keeps increasing
    /// so results computed for an earlier session can never match a later one.
    pub fn reset(&mut self) {
        self.owned.clear();
        self.shared.clear();
        self.visible.clear();
        self.version += 1;
    }

    pub fn visible(&self) -> &[Note] {
        &self.visible
    }

    pub fn get(&self, note_id: &NoteId) -> Option<&Note> {
        self.visible.iter().find(|note| &note.id == note_id)
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Orders a snapshot by creation time then id, dropping repeated ids.
fn normalize(mut notes: Vec<Note>) -> Vec<Note> {
    notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let mut seen = HashSet::new();
    notes.retain(|note| seen.insert(note.id.clone()));
    notes
}

/// Union keyed by note id. On a collision the owned copy wins.
fn union(owned: &[Note], shared: &[Note]) -> Vec<Note> {
    let owned_ids: HashSet<&NoteId> = owned.iter().map(|note| &note.id).collect();
    let merged = owned
        .iter()
        .chain(shared.iter().filter(|note| !owned_ids.contains(&note.id)))
        .cloned()
        .collect();
    normalize(merged)
}

//=========================================================================================
// Sharing Resolution
//=========================================================================================

/// Grantee profiles per note, computed for one version of the note set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharingResolution {
    pub version: u64,
    pub by_note: HashMap<NoteId, Vec<UserProfile>>,
}

impl SharingResolution {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            by_note: HashMap::new(),
        }
    }

    pub fn grantees_of(&self, note_id: &NoteId) -> &[UserProfile] {
        self.by_note.get(note_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Holds the most recent accepted resolution.
#[derive(Debug, Clone, Default)]
pub struct SharingCache {
    current: SharingResolution,
}

impl SharingCache {
    /// Accepts `candidate` only if it was computed for `note_set_version`, the
    /// version currently on screen. Anything older is discarded.
    pub fn offer(&mut self, candidate: SharingResolution, note_set_version: u64) -> bool {
        if candidate.version != note_set_version || candidate.version < self.current.version {
            return false;
        }
        self.current = candidate;
        true
    }

    pub fn clear(&mut self) {
        self.current.by_note.clear();
    }

    pub fn current(&self) -> &SharingResolution {
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use chrono::{TimeZone, Utc};

    fn note(id: &str, owner: &str, grantees: &[&str], minute: u32) -> Note {
        Note {
            id: NoteId::new(id),
            content: format!("note {id}"),
            owner_id: UserId::new(owner),
            grantees: grantees.iter().map(|g| UserId::new(*g)).collect(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap(),
        }
    }

    fn ids(set: &NoteSet) -> Vec<&str> {
        set.visible().iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn union_of_owned_and_shared_in_creation_order() {
        let mut set = NoteSet::new();
        assert!(set.apply(SnapshotEvent::Shared(vec![note("s1", "bob", &["alice"], 1)])));
        assert!(set.apply(SnapshotEvent::Owned(vec![
            note("o2", "alice", &[], 3),
            note("o1", "alice", &[], 0),
        ])));
        assert_eq!(ids(&set), vec!["o1", "s1", "o2"]);
    }

    #[test]
    fn redelivered_snapshot_is_a_no_op() {
        let mut set = NoteSet::new();
        let snapshot = vec![note("o1", "alice", &[], 0)];
        assert!(set.apply(SnapshotEvent::Owned(snapshot.clone())));
        let version = set.version();
        assert!(!set.apply(SnapshotEvent::Owned(snapshot)));
        assert_eq!(set.version(), version);
        assert_eq!(ids(&set), vec!["o1"]);
    }

    #[test]
    fn merge_is_commutative() {
        let owned = SnapshotEvent::Owned(vec![note("o1", "alice", &["bob"], 0)]);
        let shared = SnapshotEvent::Shared(vec![note("s1", "carol", &["alice"], 1)]);

        let mut a = NoteSet::new();
        a.apply(owned.clone());
        a.apply(shared.clone());
        let mut b = NoteSet::new();
        b.apply(shared);
        b.apply(owned);

        assert_eq!(a.visible(), b.visible());
    }

    #[test]
    fn note_in_both_snapshots_appears_once() {
        // Malformed data: the owner also listed as grantee.
        let both = note("x", "alice", &["alice"], 0);
        let mut set = NoteSet::new();
        set.apply(SnapshotEvent::Owned(vec![both.clone()]));
        set.apply(SnapshotEvent::Shared(vec![both]));
        assert_eq!(ids(&set), vec!["x"]);
    }

    #[test]
    fn duplicate_ids_inside_one_snapshot_collapse() {
        let mut set = NoteSet::new();
        set.apply(SnapshotEvent::Owned(vec![
            note("o1", "alice", &[], 0),
            note("o1", "alice", &[], 0),
        ]));
        assert_eq!(set.visible().len(), 1);
    }

    #[test]
    fn removed_note_disappears_on_next_snapshot() {
        let mut set = NoteSet::new();
        set.apply(SnapshotEvent::Owned(vec![note("o1", "alice", &[], 0)]));
        assert!(set.apply(SnapshotEvent::Owned(Vec::new())));
        assert!(set.visible().is_empty());
    }

    #[test]
    fn reset_clears_and_advances_version() {
        let mut set = NoteSet::new();
        set.apply(SnapshotEvent::Owned(vec![note("o1", "alice", &[], 0)]));
        let before = set.version();
        set.reset();
        assert!(set.visible().is_empty());
        assert!(set.version() > before);
    }

    #[test]
    fn cache_accepts_only_current_version() {
        let mut cache = SharingCache::default();
        let mut fresh = SharingResolution::new(3);
        fresh.by_note.insert(NoteId::new("o1"), Vec::new());

        assert!(!cache.offer(SharingResolution::new(2), 3));
        assert!(cache.offer(fresh.clone(), 3));
        assert_eq!(cache.current(), &fresh);
        // A late result for an older list must not overwrite the newer one.
        assert!(!cache.offer(SharingResolution::new(2), 2));
        assert_eq!(cache.current().version, 3);
    }

    #[test]
    fn grantees_of_unknown_note_is_empty() {
        let resolution = SharingResolution::new(1);
        assert!(resolution.grantees_of(&NoteId::new("missing")).is_empty());
    }
}
