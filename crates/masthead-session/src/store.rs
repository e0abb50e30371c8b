use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use masthead_gateway::{ContentGateway, Credentials};
use masthead_types::models::UserIdentity;

use crate::credential::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Ready,
}

/// Who the current user is and whether they can author content.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Option<UserIdentity>,
    pub is_author: bool,
    pub status: SessionStatus,
}

impl Session {
    fn anonymous(status: SessionStatus) -> Self {
        Self {
            identity: None,
            is_author: false,
            status,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.identity.as_ref().map(|identity| identity.user_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// Process-wide owner of the session. Everything else reads snapshots or
/// subscribes; only the operations below mutate it.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    gateway: ContentGateway,
    credentials: Credentials,
    storage: Arc<dyn CredentialStore>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    pub fn new(
        gateway: ContentGateway,
        credentials: Credentials,
        storage: Arc<dyn CredentialStore>,
    ) -> Self {
        let (state, _) = watch::channel(Session::anonymous(SessionStatus::Loading));
        Self {
            inner: Arc::new(SessionInner {
                gateway,
                credentials,
                storage,
                state,
            }),
        }
    }

    /// Current snapshot.
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Observe every session mutation.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Startup path: if a credential was persisted, resolve who it belongs
    /// to. Any failure — storage, network, rejection — settles to anonymous
    /// and discards the credential. Never errors: anonymous browsing is a
    /// valid state, not a failure.
    pub async fn initialize(&self) {
        match self.inner.storage.load() {
            Ok(Some(credential)) => self.inner.credentials.set(credential),
            Ok(None) => {
                self.publish(Session::anonymous(SessionStatus::Ready));
                return;
            }
            Err(e) => {
                warn!("credential load failed, continuing anonymous: {e:#}");
                self.publish(Session::anonymous(SessionStatus::Ready));
                return;
            }
        }
        self.resolve_identity().await;
    }

    /// Persist a fresh credential from the identity provider, then resolve
    /// it. Observers see `Loading` then `Ready`.
    pub async fn login(&self, credential: String) {
        self.publish(Session::anonymous(SessionStatus::Loading));

        if let Err(e) = self.inner.storage.save(&credential) {
            // Still usable for this run; it just will not survive restart.
            warn!("credential persist failed: {e:#}");
        }
        self.inner.credentials.set(credential);

        self.resolve_identity().await;
    }

    /// Drop the credential and identity immediately. Correct without any
    /// network round trip.
    pub fn logout(&self) {
        self.discard_credential();
        self.publish(Session::anonymous(SessionStatus::Ready));
        info!("signed out");
    }

    async fn resolve_identity(&self) {
        let identity = match self.inner.gateway.get_user_details().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("identity resolution failed, continuing anonymous: {e}");
                self.discard_credential();
                self.publish(Session::anonymous(SessionStatus::Ready));
                return;
            }
        };

        let is_author = match self.inner.gateway.is_author().await {
            Ok(flag) => flag,
            Err(e) => {
                warn!("author-flag resolution failed, continuing anonymous: {e}");
                self.discard_credential();
                self.publish(Session::anonymous(SessionStatus::Ready));
                return;
            }
        };

        info!(user = %identity.name, is_author, "session ready");
        self.publish(Session {
            identity: Some(identity),
            is_author,
            status: SessionStatus::Ready,
        });
    }

    fn discard_credential(&self) {
        self.inner.credentials.clear();
        if let Err(e) = self.inner.storage.clear() {
            warn!("credential clear failed: {e:#}");
        }
    }

    fn publish(&self, session: Session) {
        self.inner.state.send_replace(session);
    }
}
