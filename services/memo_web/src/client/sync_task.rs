//! services/memo_web/src/client/sync_task.rs
//!
//! The background "worker" functions that keep a client's note list in step
//! with the store: one follows the session, one drains the two live queries
//! for the signed-in user, and short-lived ones resolve grantee profiles.

use crate::client::state::ClientContext;
use futures::StreamExt;
use memo_share_core::domain::{Note, UserId, UserProfile};
use memo_share_core::merge::SnapshotEvent;
use memo_share_core::view::Notice;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Follows the session and (re)starts the note subscriptions on every transition.
///
/// The previous user's subscriptions are torn down and awaited before the
/// local state is reset, so no snapshot of theirs can land afterwards.
pub async fn session_process(
    ctx: Arc<ClientContext>,
    mut session_rx: watch::Receiver<Option<UserProfile>>,
    shutdown: CancellationToken,
) {
    let mut sync: Option<(CancellationToken, JoinHandle<()>)> = None;

    loop {
        let user = session_rx.borrow_and_update().clone();

        if let Some((token, handle)) = sync.take() {
            token.cancel();
            let _ = handle.await;
        }

        {
            let mut state = ctx.state.lock().await;
            if state.user != user {
                state.switch_user(user.clone());
                ctx.publish(&state);
            }
        }

        if let Some(user) = user {
            let token = shutdown.child_token();
            let handle = {
                let ctx = ctx.clone();
                let token = token.clone();
                tokio::spawn(sync_process(ctx, user.uid, token))
            };
            sync = Some((token, handle));
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    if let Some((token, handle)) = sync {
        token.cancel();
        let _ = handle.await;
    }
    debug!("Session process stopped.");
}

/// Drains the owned and shared live queries for one user until cancelled.
pub async fn sync_process(ctx: Arc<ClientContext>, user_id: UserId, token: CancellationToken) {
    let mut events = match ctx.notes.subscribe_visible(&user_id).await {
        Ok(events) => events,
        Err(e) => {
            warn!("Failed to subscribe to notes for {}: {}", user_id, e);
            let mut state = ctx.state.lock().await;
            state.notice = Some(Notice::error(format!("Could not load notes: {}", e)));
            ctx.publish(&state);
            return;
        }
    };
    info!("Note subscriptions started for {}", user_id);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                info!("Note subscriptions for {} torn down.", user_id);
                break;
            }
            next = events.next() => match next {
                Some(Ok(event)) => apply_snapshot(&ctx, event, &token).await,
                Some(Err(e)) => warn!("Snapshot delivery failed for {}: {}", user_id, e),
                None => {
                    info!("Note subscriptions for {} ended by the store.", user_id);
                    break;
                }
            }
        }
    }
}

/// Folds one snapshot into the note set and, if the list changed, restarts
/// the sharing resolution for the new version.
async fn apply_snapshot(ctx: &Arc<ClientContext>, event: SnapshotEvent, parent: &CancellationToken) {
    let mut guard = ctx.state.lock().await;
    let state = &mut *guard;
    if !state.notes.apply(event) {
        debug!("Snapshot left the note list unchanged.");
        return;
    }

    let version = state.notes.version();
    let notes = state.notes.visible().to_vec();
    state.edit.retain_notes(&notes);

    state.resolution_token.cancel();
    let token = parent.child_token();
    state.resolution_token = token.clone();
    ctx.publish(state);
    drop(guard);

    tokio::spawn(resolution_process(ctx.clone(), version, notes, token));
}

/// Resolves grantee profiles for one note-list version. The result is dropped
/// if the task is cancelled or the list has moved on by the time it finishes.
pub async fn resolution_process(
    ctx: Arc<ClientContext>,
    version: u64,
    notes: Vec<Note>,
    token: CancellationToken,
) {
    let resolution = tokio::select! {
        _ = token.cancelled() => {
            debug!("Sharing resolution for version {} cancelled.", version);
            return;
        }
        resolution = ctx.resolver.resolve(version, &notes) => resolution,
    };

    let mut guard = ctx.state.lock().await;
    let state = &mut *guard;
    let current = state.notes.version();
    if state.sharing.offer(resolution, current) {
        ctx.publish(state);
    } else {
        debug!(
            "Discarded sharing resolution for version {} (current {}).",
            version, current
        );
    }
}
