//! services/memo_web/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser and a hosted
//! memo client.

use memo_share_core::domain::NoteId;
use memo_share_core::view::View;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// The UI actions a browser can send.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Completes sign-in with the credential the provider's popup returned.
    SignIn { credential: String },
    SignOut,
    SetNewNoteDraft { text: String },
    AddNote,
    BeginEdit { note_id: NoteId },
    SetEditDraft { text: String },
    SaveEdit,
    CancelEdit,
    DeleteNote { note_id: NoteId },
    SetShareEmail { note_id: NoteId, email: String },
    ShareNote { note_id: NoteId },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The complete render state; sent on connect and after every change.
    View { view: View },

    /// The last message could not be understood.
    Error { message: String },
}
