//! Shared fixtures for the memo_web integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use memo_share_core::domain::{GrantOutcome, NewNote, Note, NoteId, UserId, UserProfile};
use memo_share_core::ports::{
    DocumentStore, IdentityProvider, NoteFilter, PortError, PortResult, SnapshotStream,
};
use memo_share_core::view::View;
use memo_web_lib::adapters::{FixtureIdentityProvider, InMemoryDocumentStore};
use memo_web_lib::client::MemoClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

pub const ALICE: &str = "tok-alice";
pub const BOB: &str = "tok-bob";
pub const CAROL: &str = "tok-carol";

pub fn profile(uid: &str, email: &str, name: Option<&str>) -> UserProfile {
    UserProfile {
        uid: UserId::new(uid),
        email: email.to_string(),
        display_name: name.map(str::to_string),
    }
}

pub fn accounts() -> FixtureIdentityProvider {
    FixtureIdentityProvider::new(vec![
        (
            ALICE.to_string(),
            profile("u-alice", "alice@example.com", Some("Alice")),
        ),
        (
            BOB.to_string(),
            profile("u-bob", "bob@example.com", Some("Bob")),
        ),
        (CAROL.to_string(), profile("u-carol", "carol@example.com", None)),
    ])
}

/// A store wrapper whose operations can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryDocumentStore,
    pub fail_note_writes: AtomicBool,
    pub fail_profile_writes: AtomicBool,
    pub fail_profile_reads: AtomicBool,
}

fn unavailable<T>() -> PortResult<T> {
    Err(PortError::Unavailable("injected failure".to_string()))
}

impl FlakyStore {
    fn failing(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn upsert_user_profile(&self, profile: &UserProfile) -> PortResult<()> {
        if Self::failing(&self.fail_profile_writes) {
            return unavailable();
        }
        self.inner.upsert_user_profile(profile).await
    }

    async fn get_user_profile(&self, uid: &UserId) -> PortResult<Option<UserProfile>> {
        if Self::failing(&self.fail_profile_reads) {
            return unavailable();
        }
        self.inner.get_user_profile(uid).await
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<UserProfile>> {
        self.inner.find_user_by_email(email).await
    }

    async fn get_note(&self, note_id: &NoteId) -> PortResult<Option<Note>> {
        self.inner.get_note(note_id).await
    }

    async fn insert_note(&self, note: NewNote) -> PortResult<Note> {
        if Self::failing(&self.fail_note_writes) {
            return unavailable();
        }
        self.inner.insert_note(note).await
    }

    async fn update_note_content(&self, note_id: &NoteId, content: &str) -> PortResult<()> {
        if Self::failing(&self.fail_note_writes) {
            return unavailable();
        }
        self.inner.update_note_content(note_id, content).await
    }

    async fn delete_note(&self, note_id: &NoteId) -> PortResult<()> {
        if Self::failing(&self.fail_note_writes) {
            return unavailable();
        }
        self.inner.delete_note(note_id).await
    }

    async fn add_grantee(&self, note_id: &NoteId, grantee: &UserId) -> PortResult<GrantOutcome> {
        if Self::failing(&self.fail_note_writes) {
            return unavailable();
        }
        self.inner.add_grantee(note_id, grantee).await
    }

    async fn watch_notes(&self, filter: NoteFilter) -> PortResult<SnapshotStream> {
        self.inner.watch_notes(filter).await
    }
}

/// One shared backend with any number of clients on top of it.
pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub identity: Arc<FixtureIdentityProvider>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(FlakyStore::default()),
            identity: Arc::new(accounts()),
        }
    }

    pub fn client(&self) -> MemoClient {
        MemoClient::new(self.store.clone(), self.identity.clone())
    }

    pub fn set(&self, flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    /// Signs in and waits until the signed-in view is on screen.
    pub async fn signed_in(&self, credential: &str) -> (MemoClient, watch::Receiver<View>) {
        let client = self.client();
        let mut views = client.subscribe_view();
        client.sign_in(credential).await.expect("sign-in should succeed");
        wait_for(&mut views, |view| matches!(view, View::SignedIn(_))).await;
        (client, views)
    }
}

/// Waits until the latest view satisfies `predicate`.
pub async fn wait_for(views: &mut watch::Receiver<View>, predicate: impl Fn(&View) -> bool) -> View {
    timeout(Duration::from_secs(3), async {
        loop {
            {
                let view = views.borrow_and_update();
                if predicate(&view) {
                    return view.clone();
                }
            }
            views.changed().await.expect("client should still be running");
        }
    })
    .await
    .expect("timed out waiting for view")
}
