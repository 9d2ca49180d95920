//! services/memo_web/src/client/resolver.rs
//!
//! Resolves grantee ids to profiles for display. Recomputed from scratch for
//! every note-list version.

use memo_share_core::domain::{Note, UserId, UserProfile};
use memo_share_core::merge::SharingResolution;
use memo_share_core::ports::DocumentStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct SharingResolver {
    store: Arc<dyn DocumentStore>,
}

impl SharingResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Looks up every grantee of every note.
    ///
    /// Grantees whose profile is gone, or whose lookup fails, are left out of
    /// that note's list; the rest of the resolution still completes. Each
    /// distinct grantee is fetched at most once per call.
    pub async fn resolve(&self, version: u64, notes: &[Note]) -> SharingResolution {
        let mut lookups: HashMap<UserId, Option<UserProfile>> = HashMap::new();
        let mut resolution = SharingResolution::new(version);

        for note in notes {
            let mut profiles = Vec::with_capacity(note.grantees.len());
            for grantee in &note.grantees {
                if !lookups.contains_key(grantee) {
                    let fetched = match self.store.get_user_profile(grantee).await {
                        Ok(profile) => profile,
                        Err(e) => {
                            warn!("Profile lookup for {} failed: {}", grantee, e);
                            None
                        }
                    };
                    lookups.insert(grantee.clone(), fetched);
                }
                match lookups.get(grantee).cloned().flatten() {
                    Some(profile) => profiles.push(profile),
                    None => debug!("Omitting unresolved grantee {} of note {}", grantee, note.id),
                }
            }
            resolution.by_note.insert(note.id.clone(), profiles);
        }
        resolution
    }
}
