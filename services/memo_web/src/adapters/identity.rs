//! services/memo_web/src/adapters/identity.rs
//!
//! A federated identity provider backed by a fixed table of accounts. The
//! browser hands over the credential its provider popup produced; this adapter
//! maps it to the account identity the provider would have returned.

use async_trait::async_trait;
use memo_share_core::domain::{UserId, UserProfile};
use memo_share_core::ports::{IdentityProvider, PortError, PortResult};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

/// One entry of the accounts file.
#[derive(Debug, Deserialize)]
struct AccountRecord {
    credential: String,
    uid: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl AccountRecord {
    fn into_domain(self) -> (String, UserProfile) {
        (
            self.credential,
            UserProfile {
                uid: UserId::new(self.uid),
                email: self.email,
                display_name: self.display_name,
            },
        )
    }
}

/// An identity adapter that implements the `IdentityProvider` port.
#[derive(Debug, Clone, Default)]
pub struct FixtureIdentityProvider {
    accounts: HashMap<String, UserProfile>,
}

impl FixtureIdentityProvider {
    pub fn new(accounts: impl IntoIterator<Item = (String, UserProfile)>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
        }
    }

    /// Parses a JSON array of `{credential, uid, email, display_name?}` objects.
    pub fn from_json(json: &str) -> PortResult<Self> {
        let records: Vec<AccountRecord> = serde_json::from_str(json)
            .map_err(|e| PortError::Unexpected(format!("Invalid accounts file: {}", e)))?;
        Ok(Self::new(records.into_iter().map(AccountRecord::into_domain)))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for FixtureIdentityProvider {
    async fn authenticate(&self, credential: &str) -> PortResult<UserProfile> {
        let profile = self
            .accounts
            .get(credential.trim())
            .cloned()
            .ok_or_else(|| PortError::Unauthorized("Unknown credential".to_string()))?;
        info!("Provider authenticated user {}", profile.uid);
        Ok(profile)
    }

    async fn sign_out(&self, uid: &UserId) -> PortResult<()> {
        info!("Provider signed out user {}", uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNTS: &str = r#"[
        {"credential": "tok-alice", "uid": "u-alice", "email": "alice@example.com", "display_name": "Alice"},
        {"credential": "tok-bob", "uid": "u-bob", "email": "bob@example.com"}
    ]"#;

    #[tokio::test]
    async fn known_credential_yields_identity() {
        let provider = FixtureIdentityProvider::from_json(ACCOUNTS).unwrap();
        assert_eq!(provider.len(), 2);

        let bob = provider.authenticate(" tok-bob ").await.unwrap();
        assert_eq!(bob.uid, UserId::new("u-bob"));
        assert_eq!(bob.display_name, None);
    }

    #[tokio::test]
    async fn unknown_credential_is_unauthorized() {
        let provider = FixtureIdentityProvider::from_json(ACCOUNTS).unwrap();
        let err = provider.authenticate("tok-mallory").await.unwrap_err();
        assert!(matches!(err, PortError::Unauthorized(_)));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(FixtureIdentityProvider::from_json("{not json").is_err());
    }
}
