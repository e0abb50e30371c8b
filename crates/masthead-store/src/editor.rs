//! Author-only create/update flow for a post, including asset uploads for
//! the cover and inline body images.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use uuid::Uuid;

use masthead_gateway::{AssetClient, ContentGateway};
use masthead_session::SessionStore;
use masthead_types::api::{CreatePostRequest, UpdatePostRequest};
use masthead_types::models::Post;

use crate::error::{Field, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorPhase {
    Editing,
    Previewing,
    Saving,
    Closed,
}

/// The fields an author fills in. `content` is the serialized rich markup
/// produced by the body editor; this layer stores and ships it verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub headline: String,
    pub content: String,
    pub front_image_url: Option<String>,
    pub categories: BTreeSet<String>,
}

/// Pre-submit validation, checked in display order. The first failing
/// field is reported and the save never reaches the gateway.
pub fn validate(draft: &PostDraft) -> Result<(), StoreError> {
    if draft.title.trim().is_empty() {
        return Err(StoreError::Validation(Field::Title));
    }
    if draft.headline.trim().is_empty() {
        return Err(StoreError::Validation(Field::Headline));
    }
    if draft.categories.is_empty() {
        return Err(StoreError::Validation(Field::Category));
    }
    if draft.content.trim().is_empty() {
        return Err(StoreError::Validation(Field::Body));
    }
    Ok(())
}

#[derive(Clone)]
pub struct EditorState {
    pub draft: PostDraft,
    pub phase: EditorPhase,
    /// `Some` when updating an existing post, `None` when creating.
    pub target: Option<Uuid>,
    pending_uploads: HashSet<Uuid>,
}

impl EditorState {
    /// Save stays disabled while any referenced image is still uploading.
    pub fn uploads_in_flight(&self) -> bool {
        !self.pending_uploads.is_empty()
    }

    pub fn can_save(&self) -> bool {
        matches!(self.phase, EditorPhase::Editing | EditorPhase::Previewing)
            && !self.uploads_in_flight()
    }
}

#[derive(Clone)]
pub struct EditorStore {
    inner: Arc<EditorInner>,
}

struct EditorInner {
    gateway: ContentGateway,
    assets: AssetClient,
    session: SessionStore,
    state: RwLock<EditorState>,
}

impl EditorStore {
    /// Open a blank editor for a new post.
    pub fn new(gateway: ContentGateway, assets: AssetClient, session: SessionStore) -> Self {
        Self::with_state(gateway, assets, session, PostDraft::default(), None)
    }

    /// Open prefilled for an existing post. The body markup is carried
    /// over untouched so an unedited post round-trips unchanged.
    pub fn for_post(
        gateway: ContentGateway,
        assets: AssetClient,
        session: SessionStore,
        post: &Post,
    ) -> Self {
        let draft = PostDraft {
            title: post.title.clone(),
            headline: post.headline.clone(),
            content: post.content.clone(),
            front_image_url: post.front_image_url.clone(),
            categories: post.categories.clone(),
        };
        Self::with_state(gateway, assets, session, draft, Some(post.post_id))
    }

    fn with_state(
        gateway: ContentGateway,
        assets: AssetClient,
        session: SessionStore,
        draft: PostDraft,
        target: Option<Uuid>,
    ) -> Self {
        Self {
            inner: Arc::new(EditorInner {
                gateway,
                assets,
                session,
                state: RwLock::new(EditorState {
                    draft,
                    phase: EditorPhase::Editing,
                    target,
                    pending_uploads: HashSet::new(),
                }),
            }),
        }
    }

    pub fn state(&self) -> EditorState {
        self.inner.state.read().unwrap().clone()
    }

    // -- Draft edits --

    pub fn set_title(&self, title: &str) {
        self.inner.state.write().unwrap().draft.title = title.to_string();
    }

    pub fn set_headline(&self, headline: &str) {
        self.inner.state.write().unwrap().draft.headline = headline.to_string();
    }

    pub fn set_body(&self, content: &str) {
        self.inner.state.write().unwrap().draft.content = content.to_string();
    }

    pub fn toggle_category(&self, category: &str) {
        let mut state = self.inner.state.write().unwrap();
        if !state.draft.categories.remove(category) {
            state.draft.categories.insert(category.to_string());
        }
    }

    /// Editing ⇄ Previewing. The draft is shared state, so nothing is lost
    /// across the flip in either direction.
    pub fn toggle_preview(&self) {
        let mut state = self.inner.state.write().unwrap();
        state.phase = match state.phase {
            EditorPhase::Editing => EditorPhase::Previewing,
            EditorPhase::Previewing => EditorPhase::Editing,
            other => other,
        };
    }

    // -- Images --

    /// Upload the cover image and point the draft at the hosted URL.
    pub async fn attach_cover(&self, filename: &str, bytes: Bytes) -> Result<String, StoreError> {
        let url = self.upload(filename, bytes).await?;
        self.inner.state.write().unwrap().draft.front_image_url = Some(url.clone());
        Ok(url)
    }

    /// Upload an inline body image; the rich body editor embeds the
    /// returned URL into the markup itself.
    pub async fn attach_inline(&self, filename: &str, bytes: Bytes) -> Result<String, StoreError> {
        self.upload(filename, bytes).await
    }

    async fn upload(&self, filename: &str, bytes: Bytes) -> Result<String, StoreError> {
        let ticket = Uuid::new_v4();
        self.inner.state.write().unwrap().pending_uploads.insert(ticket);

        let result = self.inner.assets.upload(filename, bytes).await;

        self.inner.state.write().unwrap().pending_uploads.remove(&ticket);
        Ok(result?)
    }

    // -- Save --

    /// Validate, then create or update. A validation failure or a pending
    /// upload blocks the call entirely; a gateway failure reopens the
    /// editor with the draft intact — entered data is never discarded.
    pub async fn save(&self) -> Result<Post, StoreError> {
        let session = self.inner.session.session();
        if session.user_id().is_none() || !session.is_author {
            return Err(StoreError::AuthRequired);
        }

        let (draft, target) = {
            let mut state = self.inner.state.write().unwrap();
            validate(&state.draft)?;
            if !state.pending_uploads.is_empty() {
                return Err(StoreError::UploadsInFlight);
            }
            state.phase = EditorPhase::Saving;
            (state.draft.clone(), state.target)
        };

        let result = match target {
            Some(post_id) => {
                self.inner
                    .gateway
                    .update_post(&UpdatePostRequest {
                        post_id,
                        title: draft.title,
                        headline: draft.headline,
                        content: draft.content,
                        front_image_url: draft.front_image_url,
                        categories: draft.categories,
                    })
                    .await
            }
            None => {
                self.inner
                    .gateway
                    .create_post(&CreatePostRequest {
                        title: draft.title,
                        headline: draft.headline,
                        content: draft.content,
                        front_image_url: draft.front_image_url,
                        categories: draft.categories,
                    })
                    .await
            }
        };

        let mut state = self.inner.state.write().unwrap();
        match result {
            Ok(post) => {
                state.phase = EditorPhase::Closed;
                Ok(post)
            }
            Err(e) => {
                state.phase = EditorPhase::Editing;
                Err(e.into())
            }
        }
    }
}
