//! Image galleries: batch-upload creation, like toggles, and image
//! removal with the gallery-collapse invariant.

use std::collections::HashSet;
use std::sync::{Arc, RwLock as SyncRwLock};

use bytes::Bytes;
use futures_util::future::try_join_all;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use masthead_gateway::{AssetClient, ContentGateway};
use masthead_session::SessionStore;
use masthead_types::models::Gallery;

use crate::error::{Field, StoreError};
use crate::optimistic::{self, adjust_likes};

#[derive(Clone)]
pub struct GalleryStore {
    inner: Arc<GalleryInner>,
}

struct GalleryInner {
    gateway: ContentGateway,
    assets: AssetClient,
    session: SessionStore,
    state: RwLock<Vec<Gallery>>,
    /// Galleries carry no per-user membership list on the wire, so the
    /// toggle direction is remembered locally for the session.
    liked: SyncRwLock<HashSet<Uuid>>,
    confirming_delete: SyncRwLock<Option<Uuid>>,
}

impl GalleryStore {
    pub fn new(gateway: ContentGateway, assets: AssetClient, session: SessionStore) -> Self {
        Self {
            inner: Arc::new(GalleryInner {
                gateway,
                assets,
                session,
                state: RwLock::new(Vec::new()),
                liked: SyncRwLock::new(HashSet::new()),
                confirming_delete: SyncRwLock::new(None),
            }),
        }
    }

    pub async fn load(&self) -> Result<(), StoreError> {
        let galleries = self.inner.gateway.get_all_galleries().await?;
        *self.inner.state.write().await = galleries;
        Ok(())
    }

    pub async fn galleries(&self) -> Vec<Gallery> {
        self.inner.state.read().await.clone()
    }

    pub fn is_liked(&self, gallery_id: Uuid) -> bool {
        self.inner.liked.read().unwrap().contains(&gallery_id)
    }

    /// Upload every image to the asset host, then create the gallery from
    /// the returned URLs. A gallery cannot be created empty.
    pub async fn create(&self, images: Vec<(String, Bytes)>) -> Result<Gallery, StoreError> {
        let session = self.inner.session.session();
        if session.user_id().is_none() || !session.is_author {
            return Err(StoreError::AuthRequired);
        }
        if images.is_empty() {
            return Err(StoreError::Validation(Field::Images));
        }

        let uploads = images.into_iter().map(|(filename, bytes)| {
            let assets = self.inner.assets.clone();
            async move { assets.upload(&filename, bytes).await }
        });
        let urls = try_join_all(uploads).await.map_err(StoreError::from)?;

        let gallery = self.inner.gateway.create_gallery(urls).await?;
        self.inner.state.write().await.push(gallery.clone());
        Ok(gallery)
    }

    pub async fn toggle_like(&self, gallery_id: Uuid) -> Result<(), StoreError> {
        let session = self.inner.session.session();
        let inner_apply = self.inner.clone();
        let inner_revert = self.inner.clone();

        optimistic::mutate(
            &session,
            &self.inner.state,
            move |_, galleries| {
                let now_liked = {
                    let mut liked = inner_apply.liked.write().unwrap();
                    if liked.remove(&gallery_id) {
                        false
                    } else {
                        liked.insert(gallery_id);
                        true
                    }
                };
                let prev = galleries
                    .iter_mut()
                    .find(|gallery| gallery.gallery_id == gallery_id)
                    .map(|gallery| {
                        let prev = gallery.likes;
                        gallery.likes = adjust_likes(gallery.likes, now_liked);
                        prev
                    });
                (now_liked, prev)
            },
            move |galleries, (now_liked, prev)| {
                {
                    let mut liked = inner_revert.liked.write().unwrap();
                    if now_liked {
                        liked.remove(&gallery_id);
                    } else {
                        liked.insert(gallery_id);
                    }
                }
                if let (Some(prev), Some(gallery)) = (
                    prev,
                    galleries
                        .iter_mut()
                        .find(|gallery| gallery.gallery_id == gallery_id),
                ) {
                    gallery.likes = prev;
                }
            },
            || self.inner.gateway.like_gallery(gallery_id),
        )
        .await?;

        self.refetch_after_settle().await;
        Ok(())
    }

    // -- Deletion (confirmed) --

    pub fn request_delete(&self, gallery_id: Uuid) {
        *self.inner.confirming_delete.write().unwrap() = Some(gallery_id);
    }

    pub fn cancel_delete(&self) {
        *self.inner.confirming_delete.write().unwrap() = None;
    }

    pub fn pending_delete(&self) -> Option<Uuid> {
        *self.inner.confirming_delete.read().unwrap()
    }

    pub async fn confirm_delete(&self) -> Result<(), StoreError> {
        let Some(gallery_id) = self.inner.confirming_delete.write().unwrap().take() else {
            return Ok(());
        };

        let session = self.inner.session.session();

        optimistic::mutate(
            &session,
            &self.inner.state,
            |_, galleries| {
                galleries
                    .iter()
                    .position(|gallery| gallery.gallery_id == gallery_id)
                    .map(|index| (index, galleries.remove(index)))
            },
            |galleries, snap| {
                if let Some((index, gallery)) = snap {
                    let index = index.min(galleries.len());
                    galleries.insert(index, gallery);
                }
            },
            || self.inner.gateway.delete_gallery(gallery_id),
        )
        .await?;
        Ok(())
    }

    /// Remove one image. Removing the last image deletes the gallery
    /// itself — `images.is_empty()` never survives as visible state.
    pub async fn delete_image(&self, gallery_id: Uuid, image: &str) -> Result<(), StoreError> {
        let session = self.inner.session.session();
        if session.user_id().is_none() || !session.is_author {
            return Err(StoreError::AuthRequired);
        }

        let removed = image.to_string();

        optimistic::mutate(
            &session,
            &self.inner.state,
            move |_, galleries| {
                galleries
                    .iter()
                    .position(|gallery| gallery.gallery_id == gallery_id)
                    .map(|index| {
                        let snapshot = galleries[index].clone();
                        let gallery = &mut galleries[index];
                        gallery.images.retain(|url| url != &removed);
                        if gallery.images.is_empty() {
                            galleries.remove(index);
                        }
                        (index, snapshot)
                    })
            },
            |galleries, snap| {
                if let Some((index, snapshot)) = snap {
                    match galleries
                        .iter_mut()
                        .find(|gallery| gallery.gallery_id == gallery_id)
                    {
                        Some(gallery) => *gallery = snapshot,
                        None => {
                            let index = index.min(galleries.len());
                            galleries.insert(index, snapshot);
                        }
                    }
                }
            },
            || self.inner.gateway.delete_gallery_image(gallery_id, image),
        )
        .await?;

        self.refetch_after_settle().await;
        Ok(())
    }

    /// Galleries use refetch-on-settle; the reload itself is best-effort.
    async fn refetch_after_settle(&self) {
        if let Err(e) = self.load().await {
            debug!("gallery refetch after mutation failed: {e}");
        }
    }
}
