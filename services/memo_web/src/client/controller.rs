//! services/memo_web/src/client/controller.rs
//!
//! The client controller: one per connected browser. It owns the session,
//! starts the background sync, and turns UI actions into store operations.
//!
//! Every action catches its own failures: they are logged, surfaced as a
//! notice, and returned to the caller. Local note state is never patched
//! optimistically; it advances when the store pushes the next snapshot.

use crate::client::{
    notes::{NoteError, NoteStoreClient, ShareReceipt},
    resolver::SharingResolver,
    session::{IdentitySession, SessionError},
    state::{ClientContext, ClientState},
    sync_task::session_process,
};
use memo_share_core::domain::{Note, NoteId, UserProfile};
use memo_share_core::ports::{DocumentStore, IdentityProvider};
use memo_share_core::view::{Notice, View};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct MemoClient {
    session: IdentitySession,
    ctx: Arc<ClientContext>,
    shutdown: CancellationToken,
}

impl MemoClient {
    /// Creates a client and starts following its session. Must be called from
    /// within a Tokio runtime.
    pub fn new(store: Arc<dyn DocumentStore>, provider: Arc<dyn IdentityProvider>) -> Self {
        let session = IdentitySession::new(provider, store.clone());
        let ctx = Arc::new(ClientContext::new(
            NoteStoreClient::new(store.clone()),
            SharingResolver::new(store),
        ));
        let shutdown = CancellationToken::new();

        tokio::spawn(session_process(
            ctx.clone(),
            session.subscribe(),
            shutdown.clone(),
        ));

        Self {
            session,
            ctx,
            shutdown,
        }
    }

    /// The most recently composed view.
    pub fn view(&self) -> View {
        self.ctx.view_tx.borrow().clone()
    }

    /// Receives a new view after every state change.
    pub fn subscribe_view(&self) -> watch::Receiver<View> {
        self.ctx.view_tx.subscribe()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session.current()
    }

    //=====================================================================================
    // Session Actions
    //=====================================================================================

    pub async fn sign_in(&self, credential: &str) -> Result<UserProfile, SessionError> {
        let result = self.session.sign_in(credential).await;
        if let Err(e) = &result {
            warn!("Sign-in failed: {}", e);
            self.set_notice(Notice::error("Sign-in failed. Please try again."))
                .await;
        }
        result
    }

    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let result = self.session.sign_out().await;
        if let Err(e) = &result {
            warn!("Sign-out failed: {}", e);
            self.set_notice(Notice::error("Sign-out failed. Please try again."))
                .await;
        }
        result
    }

    //=====================================================================================
    // Note Actions
    //=====================================================================================

    pub async fn set_new_note_draft(&self, text: impl Into<String>) {
        self.update_state(|state| state.edit.new_note = text.into())
            .await;
    }

    /// Creates a note from the composer draft. Blank drafts are ignored.
    pub async fn add_note(&self) -> Result<Option<Note>, NoteError> {
        let owner = self.session.current().ok_or(NoteError::SignedOut)?;
        let draft = self.ctx.state.lock().await.edit.new_note.clone();

        let result = self.ctx.notes.create(&draft, &owner.uid).await;
        match &result {
            Ok(Some(_)) => {
                self.update_state(|state| {
                    if state.edit.new_note == draft {
                        state.edit.new_note.clear();
                    }
                    state.notice = None;
                })
                .await
            }
            Ok(None) => {}
            Err(e) => self.report("Error adding note", e).await,
        }
        result
    }

    /// Enters inline edit mode for a visible note.
    pub async fn begin_edit(&self, note_id: &NoteId) -> Result<(), NoteError> {
        let mut state = self.ctx.state.lock().await;
        let note = state
            .notes
            .get(note_id)
            .cloned()
            .ok_or_else(|| NoteError::UnknownNote(note_id.clone()))?;
        state.edit.begin_edit(&note);
        self.ctx.publish(&state);
        Ok(())
    }

    pub async fn set_edit_draft(&self, text: impl Into<String>) {
        self.update_state(|state| state.edit.set_edit_draft(text))
            .await;
    }

    pub async fn cancel_edit(&self) {
        self.update_state(|state| state.edit.cancel_edit()).await;
    }

    /// Writes the inline edit draft. Any viewer may edit, owner or grantee.
    /// Edit mode ends only once the write succeeds.
    pub async fn save_edit(&self) -> Result<(), NoteError> {
        let Some(draft) = self.ctx.state.lock().await.edit.editing.clone() else {
            return Ok(());
        };

        let result = self.ctx.notes.update(&draft.note_id, &draft.content).await;
        match &result {
            Ok(()) => {
                self.update_state(|state| {
                    if state.edit.editing.as_ref() == Some(&draft) {
                        state.edit.cancel_edit();
                    }
                    state.notice = None;
                })
                .await
            }
            Err(e) => self.report("Error updating note", e).await,
        }
        result
    }

    /// Deletes a note. Refused for notes the viewer can see but does not own.
    pub async fn delete_note(&self, note_id: &NoteId) -> Result<(), NoteError> {
        let result = match self.check_owner(note_id, false).await {
            Ok(()) => self.ctx.notes.delete(note_id).await,
            Err(e) => Err(e),
        };
        match &result {
            Ok(()) => self.update_state(|state| state.notice = None).await,
            Err(e) => self.report("Error deleting note", e).await,
        }
        result
    }

    pub async fn set_share_email(&self, note_id: NoteId, email: impl Into<String>) {
        self.update_state(|state| state.edit.set_share_email(note_id, email))
            .await;
    }

    /// Shares a note with the email typed into its share box. Owner only.
    pub async fn share_note(&self, note_id: &NoteId) -> Result<ShareReceipt, NoteError> {
        let result = match self.check_owner(note_id, true).await {
            Ok(()) => {
                let email = self
                    .ctx
                    .state
                    .lock()
                    .await
                    .edit
                    .share_email(note_id)
                    .to_string();
                self.ctx.notes.share(note_id, &email).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(receipt) => {
                info!("Note {} shared with {}", note_id, receipt.recipient.email);
                let message = format!("Shared with {}", receipt.recipient.email);
                self.update_state(|state| {
                    state.edit.share_emails.remove(note_id);
                    state.notice = Some(Notice::info(message));
                })
                .await
            }
            Err(e) => self.report("Error sharing note", e).await,
        }
        result
    }

    /// Stops the background sync. Also happens on drop.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    //=====================================================================================
    // Helpers
    //=====================================================================================

    /// Only the owner may delete or share. A note missing from the local list
    /// is looked up in the store: deleting a note that no longer exists
    /// succeeds, but sharing requires the note to be visible.
    async fn check_owner(&self, note_id: &NoteId, require_visible: bool) -> Result<(), NoteError> {
        let viewer = self.session.current().ok_or(NoteError::SignedOut)?;
        let local = self.ctx.state.lock().await.notes.get(note_id).cloned();
        let note = match local {
            Some(note) => note,
            None if require_visible => return Err(NoteError::UnknownNote(note_id.clone())),
            None => match self.ctx.notes.get(note_id).await? {
                Some(note) => note,
                None => return Ok(()),
            },
        };
        if note.is_owned_by(&viewer.uid) {
            Ok(())
        } else {
            Err(NoteError::NotOwner(note_id.clone()))
        }
    }

    async fn update_state(&self, apply: impl FnOnce(&mut ClientState)) {
        let mut state = self.ctx.state.lock().await;
        apply(&mut state);
        self.ctx.publish(&state);
    }

    async fn set_notice(&self, notice: Notice) {
        self.update_state(|state| state.notice = Some(notice)).await;
    }

    async fn report(&self, context: &str, error: &NoteError) {
        match error {
            NoteError::RecipientNotFound(_) | NoteError::SelfShare | NoteError::NotOwner(_) => {
                info!("{}: {}", context, error)
            }
            _ => warn!("{}: {}", context, error),
        }
        self.set_notice(Notice::error(error.to_string())).await;
    }
}

impl Drop for MemoClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
