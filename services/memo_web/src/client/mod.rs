pub mod controller;
pub mod notes;
pub mod resolver;
pub mod session;
pub mod state;
pub mod sync_task;

// Re-export the controller so the web layer and tests can reach it directly.
pub use controller::MemoClient;
pub use notes::{NoteError, NoteStoreClient, ShareReceipt};
pub use resolver::SharingResolver;
pub use session::{IdentitySession, SessionError};
