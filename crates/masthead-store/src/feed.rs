//! Collection views: one bounded page of content with a per-item like
//! affordance.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use masthead_gateway::ContentGateway;
use masthead_session::SessionStore;
use masthead_types::models::Post;

use crate::error::StoreError;
use crate::liked::LikedPosts;
use crate::optimistic::{self, adjust_likes};

/// Fixed backend page size. A fetch returning fewer items than this marks
/// the last page.
pub const PAGE_SIZE: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Loaded,
}

/// Which listing this view shows. Only category feeds paginate; the rest
/// are single bounded fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Home,
    Category(String),
    Trending,
    Articles,
    MyPosts,
    LikedPosts,
}

#[derive(Clone)]
pub struct FeedState {
    pub posts: Vec<Post>,
    pub page: u32,
    pub has_more: bool,
    pub phase: FeedPhase,
    epoch: u64,
}

impl FeedState {
    fn new() -> Self {
        Self {
            posts: Vec::new(),
            page: 1,
            has_more: false,
            phase: FeedPhase::Idle,
            epoch: 0,
        }
    }

    /// "Next" affordance.
    pub fn can_next(&self) -> bool {
        self.has_more
    }

    /// "Previous" affordance — disabled on the first page.
    pub fn can_prev(&self) -> bool {
        self.page > 1
    }
}

struct LikeSnapshot {
    user_id: Uuid,
    was_liked: bool,
    /// (likes, membership in the post's own liked list), if the post was
    /// present when the mutation applied.
    post: Option<(u32, bool)>,
}

#[derive(Clone)]
pub struct FeedStore {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    gateway: ContentGateway,
    session: SessionStore,
    liked: LikedPosts,
    source: FeedSource,
    state: RwLock<FeedState>,
}

impl FeedStore {
    pub fn new(
        gateway: ContentGateway,
        session: SessionStore,
        liked: LikedPosts,
        source: FeedSource,
    ) -> Self {
        Self {
            inner: Arc::new(FeedInner {
                gateway,
                session,
                liked,
                source,
                state: RwLock::new(FeedState::new()),
            }),
        }
    }

    pub async fn state(&self) -> FeedState {
        self.inner.state.read().await.clone()
    }

    /// Render state for a post's like toggle.
    pub fn is_liked(&self, post_id: Uuid) -> bool {
        self.inner.liked.contains(post_id)
    }

    pub async fn load(&self) -> Result<(), StoreError> {
        self.fetch_page(1).await
    }

    pub async fn next_page(&self) -> Result<(), StoreError> {
        let (page, has_more) = {
            let state = self.inner.state.read().await;
            (state.page, state.has_more)
        };
        if !has_more {
            return Ok(());
        }
        self.fetch_page(page + 1).await
    }

    pub async fn prev_page(&self) -> Result<(), StoreError> {
        let page = self.inner.state.read().await.page;
        if page <= 1 {
            return Ok(());
        }
        self.fetch_page(page - 1).await
    }

    /// Back to page 1 with a fresh epoch. Called when the signed-in
    /// identity changes or after a create/update; any page response still
    /// in flight from before the reset is dropped on arrival.
    pub async fn reset(&self) -> Result<(), StoreError> {
        {
            let mut state = self.inner.state.write().await;
            state.epoch += 1;
            state.page = 1;
        }
        self.fetch_page(1).await
    }

    async fn fetch_page(&self, page: u32) -> Result<(), StoreError> {
        let epoch = {
            let mut state = self.inner.state.write().await;
            state.phase = FeedPhase::Loading;
            state.epoch
        };

        let fetched = match &self.inner.source {
            FeedSource::Home => self.inner.gateway.get_home_posts().await,
            FeedSource::Category(category) => self.inner.gateway.get_category(category, page).await,
            FeedSource::Trending => self.inner.gateway.get_trending_posts().await,
            FeedSource::Articles => self.inner.gateway.get_articles().await,
            FeedSource::MyPosts => self.inner.gateway.my_posts().await,
            FeedSource::LikedPosts => self.inner.gateway.my_liked_posts().await,
        };

        let mut state = self.inner.state.write().await;
        if state.epoch != epoch {
            debug!(page, "dropping page response that arrived after a reset");
            return Ok(());
        }

        match fetched {
            Ok(posts) => {
                state.has_more = matches!(self.inner.source, FeedSource::Category(_))
                    && posts.len() >= PAGE_SIZE;
                state.page = page;
                state.posts = posts;
                state.phase = FeedPhase::Loaded;
                Ok(())
            }
            Err(e) => {
                state.phase = if state.posts.is_empty() {
                    FeedPhase::Idle
                } else {
                    FeedPhase::Loaded
                };
                Err(e.into())
            }
        }
    }

    /// Optimistic like toggle. Anonymous users never reach the network —
    /// the `AuthRequired` failure is the UI's cue to open the sign-in
    /// prompt, and no counter moves.
    pub async fn toggle_like(&self, post_id: Uuid) -> Result<(), StoreError> {
        let session = self.inner.session.session();
        let liked_apply = self.inner.liked.clone();
        let liked_revert = self.inner.liked.clone();

        optimistic::mutate(
            &session,
            &self.inner.state,
            |user_id, state| {
                let now_liked = liked_apply.toggle(post_id);
                let post = state
                    .posts
                    .iter_mut()
                    .find(|post| post.post_id == post_id)
                    .map(|post| {
                        let prev = (post.likes, post.liked_by(user_id));
                        post.likes = adjust_likes(post.likes, now_liked);
                        if now_liked {
                            if !post.liked_by(user_id) {
                                post.liked_user_ids.push(user_id);
                            }
                        } else {
                            post.liked_user_ids.retain(|id| *id != user_id);
                        }
                        prev
                    });
                LikeSnapshot {
                    user_id,
                    was_liked: !now_liked,
                    post,
                }
            },
            move |state, snap| {
                liked_revert.set_membership(post_id, snap.was_liked);
                let Some((likes, was_in_list)) = snap.post else {
                    return;
                };
                // The post may have left this view while the call was in
                // flight; resolving against absent state is a no-op.
                if let Some(post) = state.posts.iter_mut().find(|post| post.post_id == post_id) {
                    post.likes = likes;
                    if was_in_list {
                        if !post.liked_by(snap.user_id) {
                            post.liked_user_ids.push(snap.user_id);
                        }
                    } else {
                        post.liked_user_ids.retain(|id| *id != snap.user_id);
                    }
                }
            },
            || self.inner.gateway.like_post(post_id),
        )
        .await?;

        // Posts use refetch-on-settle: the server owns the derived like
        // total, so realign this one entity after every settled toggle.
        self.refresh_post(post_id).await;
        Ok(())
    }

    // -- Trending admin (author-managed) --

    pub async fn add_to_trending(&self, post_id: Uuid) -> Result<(), StoreError> {
        self.set_trending(post_id, true).await
    }

    pub async fn remove_from_trending(&self, post_id: Uuid) -> Result<(), StoreError> {
        self.set_trending(post_id, false).await
    }

    async fn set_trending(&self, post_id: Uuid, trending: bool) -> Result<(), StoreError> {
        let session = self.inner.session.session();
        if !session.is_author {
            return Err(StoreError::AuthRequired);
        }

        let gateway = self.inner.gateway.clone();
        optimistic::mutate(
            &session,
            &self.inner.state,
            |_, state| {
                state
                    .posts
                    .iter_mut()
                    .find(|post| post.post_id == post_id)
                    .map(|post| {
                        let prev = post.trending;
                        post.trending = trending;
                        prev
                    })
            },
            move |state, snap| {
                if let (Some(prev), Some(post)) = (
                    snap,
                    state.posts.iter_mut().find(|post| post.post_id == post_id),
                ) {
                    post.trending = prev;
                }
            },
            || async move {
                if trending {
                    gateway.add_to_trending(post_id).await
                } else {
                    gateway.remove_from_trending(post_id).await
                }
            },
        )
        .await?;
        Ok(())
    }

    /// Watch the session and refetch from page 1 whenever the signed-in
    /// identity changes. Returns the watcher task handle; abort it when the
    /// view goes away.
    pub fn follow_session(&self) -> tokio::task::JoinHandle<()> {
        let feed = self.clone();
        let mut sessions = feed.inner.session.subscribe();
        tokio::spawn(async move {
            let mut last_user = sessions.borrow().user_id();
            while sessions.changed().await.is_ok() {
                let current = sessions.borrow().user_id();
                if current == last_user {
                    continue;
                }
                last_user = current;
                if let Err(e) = feed.reset().await {
                    debug!("refetch after identity change failed: {e}");
                }
            }
        })
    }

    /// Pull one post back from the server and splice it into the view.
    /// Best-effort: a failed refresh leaves the optimistic values standing.
    async fn refresh_post(&self, post_id: Uuid) {
        let epoch = self.inner.state.read().await.epoch;

        match self.inner.gateway.get_post(post_id).await {
            Ok(fresh) => {
                if let Some(user_id) = self.inner.session.session().user_id() {
                    self.inner.liked.set_membership(post_id, fresh.liked_by(user_id));
                }
                let mut state = self.inner.state.write().await;
                if state.epoch != epoch {
                    return;
                }
                if let Some(post) = state.posts.iter_mut().find(|post| post.post_id == post_id) {
                    *post = fresh;
                }
            }
            Err(e) => debug!("post refresh after mutation failed: {e}"),
        }
    }
}
