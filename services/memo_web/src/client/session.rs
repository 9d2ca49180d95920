//! services/memo_web/src/client/session.rs
//!
//! Tracks who is signed in. The session value is pushed to every subscriber on
//! each transition; consumers react by tearing down or starting their live
//! note subscriptions.

use memo_share_core::domain::UserProfile;
use memo_share_core::ports::{DocumentStore, IdentityProvider, PortError};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Sign-in or sign-out did not complete; the session is unchanged.
    #[error("Authentication failed: {0}")]
    AuthFailure(#[source] PortError),
}

/// The owned session context handed to the components that need it.
pub struct IdentitySession {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn DocumentStore>,
    current: watch::Sender<Option<UserProfile>>,
}

impl IdentitySession {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn DocumentStore>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            provider,
            store,
            current,
        }
    }

    /// The signed-in user, or `None` when signed out.
    pub fn current(&self) -> Option<UserProfile> {
        self.current.borrow().clone()
    }

    /// Receives the session value on every transition.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current.subscribe()
    }

    /// Completes federated sign-in and records the user's profile.
    ///
    /// The profile upsert is best-effort: a failure is logged and sign-in still
    /// completes.
    pub async fn sign_in(&self, credential: &str) -> Result<UserProfile, SessionError> {
        let profile = self
            .provider
            .authenticate(credential)
            .await
            .map_err(SessionError::AuthFailure)?;

        if let Err(e) = self.store.upsert_user_profile(&profile).await {
            warn!("Failed to record profile for user {}: {}", profile.uid, e);
        }

        let signed_in = profile.clone();
        self.current.send_if_modified(|current| {
            if current.as_ref() == Some(&signed_in) {
                return false;
            }
            *current = Some(signed_in);
            true
        });
        info!("User {} signed in", profile.uid);
        Ok(profile)
    }

    /// Ends the session. Signing out while signed out is a no-op.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let Some(user) = self.current() else {
            return Ok(());
        };
        self.provider
            .sign_out(&user.uid)
            .await
            .map_err(SessionError::AuthFailure)?;
        self.current.send_replace(None);
        info!("User {} signed out", user.uid);
        Ok(())
    }
}
