//! Single-item view: one post in full, with absence as a renderable state.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use masthead_gateway::{ContentGateway, GatewayError};

use masthead_types::models::Post;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    Idle,
    Loading,
    Found,
    /// The backend has no such post. Rendered as a "not found" view —
    /// absence is a normal outcome here, not an error path.
    Missing,
}

#[derive(Clone)]
pub struct DetailState {
    pub post: Option<Post>,
    pub phase: DetailPhase,
}

#[derive(Clone)]
pub struct DetailStore {
    inner: Arc<DetailInner>,
}

struct DetailInner {
    gateway: ContentGateway,
    state: RwLock<DetailState>,
}

impl DetailStore {
    pub fn new(gateway: ContentGateway) -> Self {
        Self {
            inner: Arc::new(DetailInner {
                gateway,
                state: RwLock::new(DetailState {
                    post: None,
                    phase: DetailPhase::Idle,
                }),
            }),
        }
    }

    pub async fn state(&self) -> DetailState {
        self.inner.state.read().await.clone()
    }

    pub async fn load(&self, post_id: Uuid) -> Result<(), StoreError> {
        self.inner.state.write().await.phase = DetailPhase::Loading;

        let fetched = self.inner.gateway.get_post(post_id).await;

        let mut state = self.inner.state.write().await;
        match fetched {
            Ok(post) => {
                state.post = Some(post);
                state.phase = DetailPhase::Found;
                Ok(())
            }
            Err(GatewayError::NotFound) => {
                state.post = None;
                state.phase = DetailPhase::Missing;
                Ok(())
            }
            Err(e) => {
                state.phase = if state.post.is_some() {
                    DetailPhase::Found
                } else {
                    DetailPhase::Idle
                };
                Err(e.into())
            }
        }
    }
}
