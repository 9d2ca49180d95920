//! crates/memo_share_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The hosted document store and the federated identity provider are external
//! collaborators; these traits are the only way the client reaches them.

use crate::domain::{GrantOutcome, NewNote, Note, NoteId, UserId, UserProfile};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the hosted backend client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A live query result: one complete snapshot per change to the matching documents.
/// Dropping the stream unsubscribes.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = PortResult<Vec<Note>>> + Send>>;

/// The live queries the note collection supports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NoteFilter {
    /// Equality filter on the owner field.
    OwnedBy(UserId),
    /// "Set contains" filter on the grantee field.
    SharedWith(UserId),
}

impl NoteFilter {
    pub fn matches(&self, note: &Note) -> bool {
        match self {
            NoteFilter::OwnedBy(uid) => note.is_owned_by(uid),
            NoteFilter::SharedWith(uid) => note.is_shared_with(uid),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    // --- User Profiles ---
    /// Merge-upsert a profile keyed by its uid.
    async fn upsert_user_profile(&self, profile: &UserProfile) -> PortResult<()>;

    /// Point lookup by document key. `Ok(None)` when the profile does not exist.
    async fn get_user_profile(&self, uid: &UserId) -> PortResult<Option<UserProfile>>;

    /// Equality filter on the email field; returns the first match.
    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserProfile>>;

    // --- Notes ---
    /// Point lookup by document key. `Ok(None)` when the note does not exist.
    async fn get_note(&self, note_id: &NoteId) -> PortResult<Option<Note>>;

    /// Inserts a note with an empty grantee set and returns it as persisted.
    async fn insert_note(&self, note: NewNote) -> PortResult<Note>;

    /// Overwrites the content of an existing note.
    async fn update_note_content(&self, note_id: &NoteId, content: &str) -> PortResult<()>;

    /// Removes a note. Deleting a missing note succeeds.
    async fn delete_note(&self, note_id: &NoteId) -> PortResult<()>;

    /// Adds `grantee` to the note's grantee set with set-union semantics.
    async fn add_grantee(&self, note_id: &NoteId, grantee: &UserId) -> PortResult<GrantOutcome>;

    /// Subscribes to a live query over the note collection.
    async fn watch_notes(&self, filter: NoteFilter) -> PortResult<SnapshotStream>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Completes federated sign-in for the credential produced by the provider's popup.
    async fn authenticate(&self, credential: &str) -> PortResult<UserProfile>;

    /// Ends the provider-side session for `uid`.
    async fn sign_out(&self, uid: &UserId) -> PortResult<()>;
}
