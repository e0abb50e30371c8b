//! Comments attached to one content item: compose, edit (owner-only),
//! delete (owner-only, confirmed), like (any signed-in user).

use std::sync::Arc;
use std::sync::RwLock as SyncRwLock;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use masthead_gateway::ContentGateway;
use masthead_session::SessionStore;
use masthead_types::models::Comment;

use crate::error::{Field, StoreError};
use crate::optimistic::{self, adjust_likes};

/// Client-enforced ceiling on comment length, in characters.
pub const MAX_COMMENT_LEN: usize = 1000;

struct ThreadState {
    comments: Vec<Comment>,
}

/// Transient row state — which row's menu is open, which row is being
/// edited, which row is waiting on delete confirmation. Kept apart from
/// the domain list so a refetch never closes a menu or discards an edit
/// in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadUi {
    pub open_menu: Option<Uuid>,
    pub editing: Option<Uuid>,
    pub confirming_delete: Option<Uuid>,
}

#[derive(Clone)]
pub struct CommentStore {
    inner: Arc<CommentInner>,
}

struct CommentInner {
    gateway: ContentGateway,
    session: SessionStore,
    post_id: Uuid,
    state: RwLock<ThreadState>,
    ui: SyncRwLock<ThreadUi>,
}

impl CommentStore {
    pub fn new(gateway: ContentGateway, session: SessionStore, post_id: Uuid) -> Self {
        Self {
            inner: Arc::new(CommentInner {
                gateway,
                session,
                post_id,
                state: RwLock::new(ThreadState { comments: Vec::new() }),
                ui: SyncRwLock::new(ThreadUi::default()),
            }),
        }
    }

    /// Seed from a post fetch (comments arrive embedded in the post).
    pub async fn set_comments(&self, comments: Vec<Comment>) {
        self.inner.state.write().await.comments = comments;
    }

    /// Re-pull the parent post and mirror its comments. Row UI state is
    /// untouched.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let post = self.inner.gateway.get_post(self.inner.post_id).await?;
        self.set_comments(post.comments).await;
        Ok(())
    }

    pub async fn comments(&self) -> Vec<Comment> {
        self.inner.state.read().await.comments.clone()
    }

    // -- Affordance gating --

    /// Edit/delete controls are rendered only for the comment's owner.
    pub fn can_modify(&self, comment: &Comment) -> bool {
        self.inner
            .session
            .session()
            .user_id()
            .is_some_and(|user_id| comment.owned_by(user_id))
    }

    /// Initial liked/unliked display state, derived from the comment's
    /// own membership list.
    pub fn is_liked(&self, comment: &Comment) -> bool {
        self.inner
            .session
            .session()
            .user_id()
            .is_some_and(|user_id| comment.liked_by(user_id))
    }

    // -- Compose --

    pub async fn compose(&self, text: &str) -> Result<Comment, StoreError> {
        let session = self.inner.session.session();
        if session.user_id().is_none() {
            return Err(StoreError::AuthRequired);
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation(Field::Comment));
        }
        if trimmed.chars().count() > MAX_COMMENT_LEN {
            return Err(StoreError::CommentTooLong { max: MAX_COMMENT_LEN });
        }

        let created = self
            .inner
            .gateway
            .add_comment(self.inner.post_id, trimmed)
            .await?;
        self.inner.state.write().await.comments.push(created.clone());
        Ok(created)
    }

    // -- Edit --

    /// Owner-only inline edit. Empty or unchanged trimmed text is a no-op;
    /// otherwise the text and `updated_at` are patched locally first and
    /// restored if the backend rejects the edit. Comments are local-patch:
    /// nothing is refetched on success.
    pub async fn edit(&self, comment_id: Uuid, text: &str) -> Result<(), StoreError> {
        let trimmed = text.trim().to_string();
        if trimmed.chars().count() > MAX_COMMENT_LEN {
            return Err(StoreError::CommentTooLong { max: MAX_COMMENT_LEN });
        }

        {
            let state = self.inner.state.read().await;
            let Some(current) = state
                .comments
                .iter()
                .find(|comment| comment.comment_id == comment_id)
            else {
                return Ok(());
            };
            if trimmed.is_empty() || trimmed == current.comment {
                return Ok(());
            }
        }

        let session = self.inner.session.session();
        let applied = trimmed.clone();

        optimistic::mutate(
            &session,
            &self.inner.state,
            move |_, state| {
                state
                    .comments
                    .iter_mut()
                    .find(|comment| comment.comment_id == comment_id)
                    .map(|comment| {
                        let prev = (comment.comment.clone(), comment.updated_at);
                        comment.comment = applied;
                        comment.updated_at = Utc::now();
                        prev
                    })
            },
            move |state, snap| {
                if let (Some((text, updated_at)), Some(comment)) = (
                    snap,
                    state
                        .comments
                        .iter_mut()
                        .find(|comment| comment.comment_id == comment_id),
                ) {
                    comment.comment = text;
                    comment.updated_at = updated_at;
                }
            },
            || self.inner.gateway.edit_comment(comment_id, &trimmed),
        )
        .await?;

        self.end_edit();
        Ok(())
    }

    // -- Delete --

    /// Arm the confirmation step. Nothing is deleted until `confirm_delete`.
    pub fn request_delete(&self, comment_id: Uuid) {
        self.inner.ui.write().unwrap().confirming_delete = Some(comment_id);
    }

    pub fn cancel_delete(&self) {
        self.inner.ui.write().unwrap().confirming_delete = None;
    }

    /// Run the armed deletion: remove the row immediately, reinstate it at
    /// its old position if the backend refuses.
    pub async fn confirm_delete(&self) -> Result<(), StoreError> {
        let Some(comment_id) = self.inner.ui.write().unwrap().confirming_delete.take() else {
            return Ok(());
        };

        let session = self.inner.session.session();

        optimistic::mutate(
            &session,
            &self.inner.state,
            |_, state| {
                state
                    .comments
                    .iter()
                    .position(|comment| comment.comment_id == comment_id)
                    .map(|index| (index, state.comments.remove(index)))
            },
            |state, snap| {
                if let Some((index, comment)) = snap {
                    let index = index.min(state.comments.len());
                    state.comments.insert(index, comment);
                }
            },
            || self.inner.gateway.delete_comment(comment_id),
        )
        .await?;
        Ok(())
    }

    // -- Like --

    pub async fn toggle_like(&self, comment_id: Uuid) -> Result<(), StoreError> {
        let session = self.inner.session.session();

        optimistic::mutate(
            &session,
            &self.inner.state,
            |user_id, state| {
                state
                    .comments
                    .iter_mut()
                    .find(|comment| comment.comment_id == comment_id)
                    .map(|comment| {
                        let was_liked = comment.liked_by(user_id);
                        let prev_likes = comment.likes;
                        let now_liked = !was_liked;
                        comment.likes = adjust_likes(comment.likes, now_liked);
                        if now_liked {
                            comment.liked_user_ids.push(user_id);
                        } else {
                            comment.liked_user_ids.retain(|id| *id != user_id);
                        }
                        (user_id, prev_likes, was_liked)
                    })
            },
            |state, snap| {
                if let Some((user_id, prev_likes, was_liked)) = snap {
                    if let Some(comment) = state
                        .comments
                        .iter_mut()
                        .find(|comment| comment.comment_id == comment_id)
                    {
                        comment.likes = prev_likes;
                        if was_liked {
                            if !comment.liked_by(user_id) {
                                comment.liked_user_ids.push(user_id);
                            }
                        } else {
                            comment.liked_user_ids.retain(|id| *id != user_id);
                        }
                    }
                }
            },
            || self.inner.gateway.like_comment(comment_id),
        )
        .await?;
        Ok(())
    }

    // -- Row UI state --

    pub fn ui(&self) -> ThreadUi {
        self.inner.ui.read().unwrap().clone()
    }

    pub fn open_menu(&self, comment_id: Uuid) {
        self.inner.ui.write().unwrap().open_menu = Some(comment_id);
    }

    pub fn close_menu(&self) {
        self.inner.ui.write().unwrap().open_menu = None;
    }

    pub fn begin_edit(&self, comment_id: Uuid) {
        let mut ui = self.inner.ui.write().unwrap();
        ui.editing = Some(comment_id);
        ui.open_menu = None;
    }

    pub fn end_edit(&self) {
        self.inner.ui.write().unwrap().editing = None;
    }
}
