//! services/memo_web/src/client/notes.rs
//!
//! The note store client: live queries and CRUD against the `DocumentStore`
//! port. Nothing here mutates local state; callers see the effect of a write
//! when the next snapshot arrives.

use futures::stream::{self, BoxStream, StreamExt};
use memo_share_core::domain::{is_blank, GrantOutcome, NewNote, Note, NoteId, UserId, UserProfile};
use memo_share_core::merge::SnapshotEvent;
use memo_share_core::ports::{DocumentStore, NoteFilter, PortError, PortResult, SnapshotStream};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum NoteError {
    #[error("No registered user with email '{0}'")]
    RecipientNotFound(String),
    #[error("A note cannot be shared with its owner")]
    SelfShare,
    #[error("Only the owner of note {0} can do that")]
    NotOwner(NoteId),
    #[error("Note {0} is not in the current list")]
    UnknownNote(NoteId),
    #[error("Not signed in")]
    SignedOut,
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

/// A completed share: who it went to and whether the grantee set grew.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReceipt {
    pub recipient: UserProfile,
    pub outcome: GrantOutcome,
}

#[derive(Clone)]
pub struct NoteStoreClient {
    store: Arc<dyn DocumentStore>,
}

impl NoteStoreClient {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Live query for notes owned by `user_id`.
    pub async fn subscribe_owned(&self, user_id: &UserId) -> PortResult<SnapshotStream> {
        self.store
            .watch_notes(NoteFilter::OwnedBy(user_id.clone()))
            .await
    }

    /// Live query for notes shared with `user_id`.
    pub async fn subscribe_shared(&self, user_id: &UserId) -> PortResult<SnapshotStream> {
        self.store
            .watch_notes(NoteFilter::SharedWith(user_id.clone()))
            .await
    }

    /// Both live queries interleaved as tagged events, in delivery order.
    pub async fn subscribe_visible(
        &self,
        user_id: &UserId,
    ) -> PortResult<BoxStream<'static, PortResult<SnapshotEvent>>> {
        let owned = self
            .subscribe_owned(user_id)
            .await?
            .map(|snapshot| snapshot.map(SnapshotEvent::Owned));
        let shared = self
            .subscribe_shared(user_id)
            .await?
            .map(|snapshot| snapshot.map(SnapshotEvent::Shared));
        Ok(stream::select(owned, shared).boxed())
    }

    /// Inserts a note with no grantees. Blank content is a no-op and returns `None`.
    pub async fn create(&self, content: &str, owner_id: &UserId) -> Result<Option<Note>, NoteError> {
        if is_blank(content) {
            debug!("Ignoring blank note from {}", owner_id);
            return Ok(None);
        }
        let note = self
            .store
            .insert_note(NewNote {
                content: content.to_string(),
                owner_id: owner_id.clone(),
            })
            .await?;
        info!("Created note {} for {}", note.id, owner_id);
        Ok(Some(note))
    }

    /// Overwrites a note's content. Ownership is not checked here.
    pub async fn update(&self, note_id: &NoteId, content: &str) -> Result<(), NoteError> {
        self.store.update_note_content(note_id, content).await?;
        info!("Updated note {}", note_id);
        Ok(())
    }

    /// Reads a note straight from the store, bypassing the live queries.
    pub async fn get(&self, note_id: &NoteId) -> Result<Option<Note>, NoteError> {
        Ok(self.store.get_note(note_id).await?)
    }

    /// Removes a note. A missing note counts as deleted.
    pub async fn delete(&self, note_id: &NoteId) -> Result<(), NoteError> {
        self.store.delete_note(note_id).await?;
        info!("Deleted note {}", note_id);
        Ok(())
    }

    /// Grants the user registered under `email` access to the note.
    pub async fn share(&self, note_id: &NoteId, email: &str) -> Result<ShareReceipt, NoteError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(NoteError::RecipientNotFound(String::new()));
        }
        let recipient = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| NoteError::RecipientNotFound(email.to_string()))?;

        let outcome = self.store.add_grantee(note_id, &recipient.uid).await?;
        match outcome {
            GrantOutcome::Granted => info!("Shared note {} with {}", note_id, recipient.uid),
            GrantOutcome::AlreadyGranted => {
                debug!("Note {} already shared with {}", note_id, recipient.uid)
            }
            GrantOutcome::Owner => return Err(NoteError::SelfShare),
        }
        Ok(ShareReceipt { recipient, outcome })
    }
}
