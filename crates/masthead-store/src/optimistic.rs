//! The optimistic mutation engine: apply a local state transition the
//! moment the user acts, issue the network call, reconcile or roll back.

use std::future::Future;

use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use masthead_gateway::GatewayError;
use masthead_session::Session;

use crate::error::StoreError;

/// Run one optimistic mutation against `state`.
///
/// `stage` receives the authenticated user id and the state under a write
/// lock; it captures the previous slice it is about to touch and applies
/// the new one in the same critical section, so the snapshot is always the
/// state immediately preceding this call's own application — never a shared
/// baseline. `revert` restores that slice if the remote call fails; it must
/// tolerate entities that vanished while the call was in flight.
///
/// Anonymous sessions are rejected before anything happens: no network
/// call, no state change.
pub async fn mutate<S, Snap, T, Fut>(
    session: &Session,
    state: &RwLock<S>,
    stage: impl FnOnce(Uuid, &mut S) -> Snap,
    revert: impl FnOnce(&mut S, Snap),
    call: impl FnOnce() -> Fut,
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let Some(user_id) = session.user_id() else {
        return Err(StoreError::AuthRequired);
    };

    let snapshot = {
        let mut guard = state.write().await;
        stage(user_id, &mut guard)
    };

    match call().await {
        Ok(value) => Ok(value),
        Err(e) => {
            let mut guard = state.write().await;
            revert(&mut guard, snapshot);
            drop(guard);
            warn!("optimistic mutation rolled back: {e}");
            Err(StoreError::Gateway(e))
        }
    }
}

/// Counter math for one like toggle. Saturating on the way down — the
/// counter can never display below zero.
pub(crate) fn adjust_likes(likes: u32, now_liked: bool) -> u32 {
    if now_liked {
        likes + 1
    } else {
        likes.saturating_sub(1)
    }
}
