//! crates/memo_share_core/src/view.rs
//!
//! Maps session, notes, sharing resolution and transient edit state into the
//! render tree pushed to the browser. Purely derived; holds no state of its own.

use crate::domain::{Note, NoteId, UserId, UserProfile};
use crate::merge::SharingResolution;
use serde::Serialize;
use std::collections::HashMap;

//=========================================================================================
// Transient Edit State
//=========================================================================================

/// The inline edit in progress, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub note_id: NoteId,
    pub content: String,
}

/// Input owned by the UI rather than the store: composer text, the inline edit
/// draft and the per-note share email boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditState {
    pub new_note: String,
    pub editing: Option<EditDraft>,
    pub share_emails: HashMap<NoteId, String>,
}

impl EditState {
    /// Enters edit mode for `note`, seeding the draft with its current content.
    /// Only one note is edited at a time.
    pub fn begin_edit(&mut self, note: &Note) {
        self.editing = Some(EditDraft {
            note_id: note.id.clone(),
            content: note.content.clone(),
        });
    }

    /// Replaces the draft text. Ignored when no edit is in progress.
    pub fn set_edit_draft(&mut self, content: impl Into<String>) {
        if let Some(draft) = self.editing.as_mut() {
            draft.content = content.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn set_share_email(&mut self, note_id: NoteId, email: impl Into<String>) {
        self.share_emails.insert(note_id, email.into());
    }

    pub fn share_email(&self, note_id: &NoteId) -> &str {
        self.share_emails.get(note_id).map(String::as_str).unwrap_or("")
    }

    /// Drops drafts that belong to notes no longer visible.
    pub fn retain_notes(&mut self, notes: &[Note]) {
        self.share_emails
            .retain(|id, _| notes.iter().any(|note| &note.id == id));
        if let Some(draft) = &self.editing {
            if !notes.iter().any(|note| note.id == draft.note_id) {
                self.editing = None;
            }
        }
    }
}

//=========================================================================================
// Render Tree
//=========================================================================================

/// A transient outcome message shown above the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    Info { message: String },
    Error { message: String },
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum View {
    SignedOut {
        sign_in_label: String,
        notice: Option<Notice>,
    },
    SignedIn(SignedInView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedInView {
    pub user_id: UserId,
    pub greeting: String,
    pub new_note_draft: String,
    pub notes: Vec<NoteView>,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    pub id: NoteId,
    pub content: String,
    pub owner_id: UserId,
    pub is_owner: bool,
    /// Draft text while this note is in inline edit mode.
    pub editing: Option<String>,
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_share: bool,
    /// Share-by-email input; only present for the owner.
    pub share_email: Option<String>,
    /// Grantee labels (display name, else email) in grantee order.
    pub shared_with: Vec<String>,
}

impl View {
    pub fn signed_out() -> Self {
        View::SignedOut {
            sign_in_label: SIGN_IN_LABEL.to_string(),
            notice: None,
        }
    }

    pub fn notes(&self) -> &[NoteView] {
        match self {
            View::SignedOut { .. } => &[],
            View::SignedIn(view) => &view.notes,
        }
    }

    pub fn note(&self, note_id: &NoteId) -> Option<&NoteView> {
        self.notes().iter().find(|note| &note.id == note_id)
    }

    pub fn notice(&self) -> Option<&Notice> {
        match self {
            View::SignedOut { notice, .. } => notice.as_ref(),
            View::SignedIn(view) => view.notice.as_ref(),
        }
    }
}

const SIGN_IN_LABEL: &str = "Sign in with Google";

/// Builds the render tree for the current client state.
pub fn compose_view(
    session: Option<&UserProfile>,
    notes: &[Note],
    sharing: &SharingResolution,
    edit: &EditState,
    notice: Option<&Notice>,
) -> View {
    let Some(user) = session else {
        return View::SignedOut {
            sign_in_label: SIGN_IN_LABEL.to_string(),
            notice: notice.cloned(),
        };
    };

    let notes = notes
        .iter()
        .map(|note| compose_note(&user.uid, note, sharing, edit))
        .collect();

    View::SignedIn(SignedInView {
        user_id: user.uid.clone(),
        greeting: format!("Logged in as {}", user.label()),
        new_note_draft: edit.new_note.clone(),
        notes,
        notice: notice.cloned(),
    })
}

fn compose_note(
    viewer: &UserId,
    note: &Note,
    sharing: &SharingResolution,
    edit: &EditState,
) -> NoteView {
    let is_owner = note.is_owned_by(viewer);
    let editing = edit
        .editing
        .as_ref()
        .filter(|draft| draft.note_id == note.id)
        .map(|draft| draft.content.clone());

    NoteView {
        id: note.id.clone(),
        content: note.content.clone(),
        owner_id: note.owner_id.clone(),
        is_owner,
        editing,
        // Any viewer may edit; only the owner deletes or shares.
        can_edit: true,
        can_delete: is_owner,
        can_share: is_owner,
        share_email: is_owner.then(|| edit.share_email(&note.id).to_string()),
        shared_with: sharing
            .grantees_of(&note.id)
            .iter()
            .map(|profile| profile.label().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn alice() -> UserProfile {
        UserProfile {
            uid: UserId::new("alice"),
            email: "alice@example.com".to_string(),
            display_name: Some("Alice".to_string()),
        }
    }

    fn bob() -> UserProfile {
        UserProfile {
            uid: UserId::new("bob"),
            email: "bob@example.com".to_string(),
            display_name: None,
        }
    }

    fn shared_note() -> Note {
        Note {
            id: NoteId::new("n1"),
            content: "buy milk".to_string(),
            owner_id: UserId::new("alice"),
            grantees: vec![UserId::new("bob")],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn signed_out_shows_sign_in_only() {
        let view = compose_view(
            None,
            &[shared_note()],
            &SharingResolution::default(),
            &EditState::default(),
            None,
        );
        assert!(matches!(view, View::SignedOut { .. }));
        assert!(view.notes().is_empty());
    }

    #[test]
    fn owner_gets_delete_and_share_controls() {
        let mut sharing = SharingResolution::new(1);
        sharing.by_note.insert(NoteId::new("n1"), vec![bob()]);
        let view = compose_view(
            Some(&alice()),
            &[shared_note()],
            &sharing,
            &EditState::default(),
            None,
        );

        let note = view.note(&NoteId::new("n1")).unwrap();
        assert!(note.is_owner && note.can_delete && note.can_share && note.can_edit);
        assert_eq!(note.share_email.as_deref(), Some(""));
        assert_eq!(note.shared_with, vec!["bob@example.com".to_string()]);
    }

    #[test]
    fn grantee_can_edit_but_not_delete_or_share() {
        let view = compose_view(
            Some(&bob()),
            &[shared_note()],
            &SharingResolution::default(),
            &EditState::default(),
            None,
        );

        let note = view.note(&NoteId::new("n1")).unwrap();
        assert!(!note.is_owner);
        assert!(note.can_edit);
        assert!(!note.can_delete);
        assert!(!note.can_share);
        assert_eq!(note.share_email, None);
    }

    #[test]
    fn inline_edit_shows_draft_for_that_note_only() {
        let note = shared_note();
        let mut edit = EditState::default();
        edit.begin_edit(&note);
        edit.set_edit_draft("buy oat milk");

        let view = compose_view(
            Some(&alice()),
            &[note],
            &SharingResolution::default(),
            &edit,
            None,
        );
        assert_eq!(
            view.note(&NoteId::new("n1")).unwrap().editing.as_deref(),
            Some("buy oat milk")
        );
    }

    #[test]
    fn greeting_uses_display_name() {
        let view = compose_view(
            Some(&alice()),
            &[],
            &SharingResolution::default(),
            &EditState::default(),
            Some(&Notice::info("saved")),
        );
        let View::SignedIn(signed_in) = &view else {
            panic!("expected signed-in view");
        };
        assert_eq!(signed_in.greeting, "Logged in as Alice");
        assert_eq!(view.notice(), Some(&Notice::info("saved")));
    }

    #[test]
    fn retain_notes_drops_drafts_of_vanished_notes() {
        let note = shared_note();
        let mut edit = EditState::default();
        edit.begin_edit(&note);
        edit.set_share_email(note.id.clone(), "bob@example.com");
        edit.retain_notes(&[]);
        assert!(edit.editing.is_none());
        assert!(edit.share_emails.is_empty());
    }

    #[test]
    fn view_serializes_with_state_tag() {
        let json = serde_json::to_value(View::signed_out()).unwrap();
        assert_eq!(json["state"], "signed_out");
        assert_eq!(json["sign_in_label"], "Sign in with Google");
    }
}
