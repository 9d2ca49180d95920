pub mod domain;
pub mod merge;
pub mod ports;
pub mod view;

pub use domain::{is_blank, GrantOutcome, NewNote, Note, NoteId, UserId, UserProfile};
pub use merge::{NoteSet, SharingCache, SharingResolution, SnapshotEvent};
pub use ports::{
    DocumentStore, IdentityProvider, NoteFilter, PortError, PortResult, SnapshotStream,
};
pub use view::{compose_view, EditDraft, EditState, NoteView, Notice, SignedInView, View};
