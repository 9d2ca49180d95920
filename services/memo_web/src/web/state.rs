//! services/memo_web/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::client::MemoClient;
use memo_share_core::ports::{DocumentStore, IdentityProvider};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
/// Every connection gets its own `MemoClient` over the same store and provider.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Creates the client that backs one browser connection.
    pub fn new_client(&self) -> MemoClient {
        MemoClient::new(self.store.clone(), self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FixtureIdentityProvider, InMemoryDocumentStore};
    use memo_share_core::domain::{UserId, UserProfile};

    #[tokio::test]
    async fn clients_share_one_store() {
        let profile = UserProfile {
            uid: UserId::new("u-a"),
            email: "a@example.com".to_string(),
            display_name: None,
        };
        let store = Arc::new(InMemoryDocumentStore::default());
        let state = AppState {
            store: store.clone(),
            identity: Arc::new(FixtureIdentityProvider::new(vec![(
                "tok-a".to_string(),
                profile,
            )])),
        };

        let first = state.new_client();
        let second = state.new_client();
        first.sign_in("tok-a").await.unwrap();
        first.set_new_note_draft("hello").await;
        let note = first.add_note().await.unwrap().unwrap();

        assert!(store.note(&note.id).await.is_some());
        assert!(second.current_user().is_none());
    }
}
