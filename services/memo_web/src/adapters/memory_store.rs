//! services/memo_web/src/adapters/memory_store.rs
//!
//! An in-process stand-in for the hosted document store. It implements the
//! `DocumentStore` port from the core crate with the same observable contract:
//! merge-upserts, set-union grants, idempotent deletes and live queries that push
//! a fresh snapshot whenever the matching documents change.

use async_stream::stream;
use async_trait::async_trait;
use chrono::Utc;
use memo_share_core::domain::{GrantOutcome, NewNote, Note, NoteId, UserId, UserProfile};
use memo_share_core::ports::{
    DocumentStore, NoteFilter, PortError, PortResult, SnapshotStream,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Default)]
struct Collections {
    users: HashMap<UserId, UserProfile>,
    notes: HashMap<NoteId, Note>,
}

impl Collections {
    fn query(&self, filter: &NoteFilter) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .values()
            .filter(|note| filter.matches(note))
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        notes
    }
}

/// A document store adapter that keeps both collections in memory.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    /// Fires once per committed write to the note collection.
    changes: broadcast::Sender<()>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store. `capacity` bounds how many change notifications a
    /// slow subscriber may fall behind before it is forced to re-query.
    pub fn new(capacity: usize) -> Self {
        let (changes, _) = broadcast::channel(capacity.max(1));
        Self {
            collections: Arc::new(RwLock::new(Collections::default())),
            changes,
        }
    }

    /// Point lookup used by diagnostics and tests.
    pub async fn note(&self, note_id: &NoteId) -> Option<Note> {
        self.collections.read().await.notes.get(note_id).cloned()
    }

    pub async fn note_count(&self) -> usize {
        self.collections.read().await.notes.len()
    }

    fn notify(&self) {
        // No live subscriptions is not an error.
        let _ = self.changes.send(());
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(256)
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn upsert_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .users
            .entry(profile.uid.clone())
            .and_modify(|stored| stored.merge(profile))
            .or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn get_user_profile(&self, uid: &UserId) -> PortResult<Option<UserProfile>> {
        Ok(self.collections.read().await.users.get(uid).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        let collections = self.collections.read().await;
        Ok(collections
            .users
            .values()
            .filter(|user| user.email == email)
            .min_by(|a, b| a.uid.cmp(&b.uid))
            .cloned())
    }

    async fn get_note(&self, note_id: &NoteId) -> PortResult<Option<Note>> {
        Ok(self.note(note_id).await)
    }

    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        let stored = Note {
            id: NoteId::new(Uuid::new_v4().to_string()),
            content: note.content,
            owner_id: note.owner_id,
            grantees: Vec::new(),
            created_at: Utc::now(),
        };
        self.collections
            .write()
            .await
            .notes
            .insert(stored.id.clone(), stored.clone());
        debug!("Inserted note {}", stored.id);
        self.notify();
        Ok(stored)
    }

    async fn update_note_content(&self, note_id: &NoteId, content: &str) -> PortResult<()> {
        {
            let mut collections = self.collections.write().await;
            let note = collections
                .notes
                .get_mut(note_id)
                .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;
            note.content = content.to_string();
        }
        self.notify();
        Ok(())
    }

    async fn delete_note(&self, note_id: &NoteId) -> PortResult<()> {
        let removed = self.collections.write().await.notes.remove(note_id);
        if removed.is_some() {
            debug!("Deleted note {}", note_id);
            self.notify();
        }
        Ok(())
    }

    async fn add_grantee(&self, note_id: &NoteId, grantee: &UserId) -> PortResult<GrantOutcome> {
        let outcome = {
            let mut collections = self.collections.write().await;
            let note = collections
                .notes
                .get_mut(note_id)
                .ok_or_else(|| PortError::NotFound(format!("Note {} not found", note_id)))?;
            note.grant(grantee.clone())
        };
        if outcome == GrantOutcome::Granted {
            self.notify();
        }
        Ok(outcome)
    }

    async fn watch_notes(&self, filter: NoteFilter) -> PortResult<SnapshotStream> {
        // Subscribe before the first read so no write can slip in between.
        let mut changes = self.changes.subscribe();
        let collections = self.collections.clone();

        let snapshots = stream! {
            let mut last: Option<Vec<Note>> = None;
            loop {
                let snapshot = collections.read().await.query(&filter);
                if last.as_ref() != Some(&snapshot) {
                    last = Some(snapshot.clone());
                    yield Ok::<_, PortError>(snapshot);
                }
                match changes.recv().await {
                    // A lagged receiver only missed wake-ups; re-querying catches it up.
                    Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };
        Ok(Box::pin(snapshots))
    }
}
