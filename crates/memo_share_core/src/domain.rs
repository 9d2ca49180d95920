//! crates/memo_share_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any particular backend; the adapters
//! translate their own document shapes into these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned note identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user as stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

impl UserProfile {
    /// Name used wherever the user is shown to someone else.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    /// Merge-upsert: fields present on `incoming` replace ours, absent ones are kept.
    pub fn merge(&mut self, incoming: &UserProfile) {
        if !incoming.email.is_empty() {
            self.email = incoming.email.clone();
        }
        if incoming.display_name.is_some() {
            self.display_name = incoming.display_name.clone();
        }
    }
}

/// A short text note owned by one user and optionally shared with others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub owner_id: UserId,
    /// Users granted access, in grant order. Never contains duplicates or the owner.
    pub grantees: Vec<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    pub fn is_shared_with(&self, user_id: &UserId) -> bool {
        self.grantees.contains(user_id)
    }

    /// A note is visible to its owner and to every grantee.
    pub fn is_visible_to(&self, user_id: &UserId) -> bool {
        self.is_owned_by(user_id) || self.is_shared_with(user_id)
    }

    /// Adds a grantee with set-union semantics. The owner is never added.
    pub fn grant(&mut self, user_id: UserId) -> GrantOutcome {
        if self.is_owned_by(&user_id) {
            return GrantOutcome::Owner;
        }
        if self.is_shared_with(&user_id) {
            return GrantOutcome::AlreadyGranted;
        }
        self.grantees.push(user_id);
        GrantOutcome::Granted
    }
}

/// Result of adding a grantee to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted,
    AlreadyGranted,
    /// The target is the note's owner; the grantee set is unchanged.
    Owner,
}

/// The fields a client supplies when inserting a note. The store assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub content: String,
    pub owner_id: UserId,
}

/// Returns `true` when `content` would produce an empty note.
pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}
