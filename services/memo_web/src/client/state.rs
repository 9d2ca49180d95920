//! services/memo_web/src/client/state.rs
//!
//! Defines the per-client state and the context shared between the client's
//! controller and its background tasks.

use crate::client::{notes::NoteStoreClient, resolver::SharingResolver};
use memo_share_core::domain::UserProfile;
use memo_share_core::merge::{NoteSet, SharingCache};
use memo_share_core::view::{compose_view, EditState, Notice, View};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

//=========================================================================================
// ClientState (Owned by One Client)
//=========================================================================================

/// Everything a client renders from. The note list is only ever replaced by
/// the snapshot reducer; writes to the store never touch it directly.
pub struct ClientState {
    pub user: Option<UserProfile>,
    pub notes: NoteSet,
    pub sharing: SharingCache,
    pub edit: EditState,
    pub notice: Option<Notice>,
    /// Cancels the sharing resolution running for the current note-list version.
    pub resolution_token: CancellationToken,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            user: None,
            notes: NoteSet::new(),
            sharing: SharingCache::default(),
            edit: EditState::default(),
            notice: None,
            resolution_token: CancellationToken::new(),
        }
    }

    pub fn render(&self) -> View {
        compose_view(
            self.user.as_ref(),
            self.notes.visible(),
            self.sharing.current(),
            &self.edit,
            self.notice.as_ref(),
        )
    }

    /// Resets everything scoped to the previous user.
    pub fn switch_user(&mut self, user: Option<UserProfile>) {
        self.resolution_token.cancel();
        self.user = user;
        self.notes.reset();
        self.sharing.clear();
        self.edit = EditState::default();
        self.notice = None;
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// ClientContext (Shared With Background Tasks)
//=========================================================================================

pub struct ClientContext {
    pub notes: NoteStoreClient,
    pub resolver: SharingResolver,
    pub state: Mutex<ClientState>,
    pub view_tx: watch::Sender<View>,
}

impl ClientContext {
    pub fn new(notes: NoteStoreClient, resolver: SharingResolver) -> Self {
        let state = ClientState::new();
        let (view_tx, _) = watch::channel(state.render());
        Self {
            notes,
            resolver,
            state: Mutex::new(state),
            view_tx,
        }
    }

    /// Pushes a freshly composed view to every subscriber.
    pub fn publish(&self, state: &ClientState) {
        self.view_tx.send_replace(state.render());
    }
}
