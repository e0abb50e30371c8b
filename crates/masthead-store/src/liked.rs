use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use tracing::debug;
use uuid::Uuid;

use masthead_gateway::{ContentGateway, GatewayError};

/// The signed-in user's liked post ids — the source for rendering every
/// like toggle in the post views.
///
/// Single owner of this slice of shared state: other stores hold cloned
/// handles and go through these operations, never the raw set. Membership
/// here is optimistic; server truth wins on the next full fetch.
#[derive(Clone, Default)]
pub struct LikedPosts {
    inner: Arc<RwLock<HashSet<Uuid>>>,
}

impl LikedPosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, post_id: Uuid) -> bool {
        self.inner.read().unwrap().contains(&post_id)
    }

    /// Flip membership; returns the state after the flip.
    pub fn toggle(&self, post_id: Uuid) -> bool {
        let mut ids = self.inner.write().unwrap();
        if ids.remove(&post_id) {
            false
        } else {
            ids.insert(post_id);
            true
        }
    }

    pub fn set_membership(&self, post_id: Uuid, liked: bool) {
        let mut ids = self.inner.write().unwrap();
        if liked {
            ids.insert(post_id);
        } else {
            ids.remove(&post_id);
        }
    }

    /// Replace the whole set, e.g. when the signed-in identity changes.
    pub fn replace(&self, ids: impl IntoIterator<Item = Uuid>) {
        *self.inner.write().unwrap() = ids.into_iter().collect();
    }

    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }

    /// Re-seed from the backend's record of the user's liked posts.
    pub async fn refresh(&self, gateway: &ContentGateway) -> Result<(), GatewayError> {
        let posts = gateway.my_liked_posts().await?;
        debug!(count = posts.len(), "liked set refreshed");
        self.replace(posts.into_iter().map(|post| post.post_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_membership_both_ways() {
        let liked = LikedPosts::new();
        let id = Uuid::new_v4();

        assert!(liked.toggle(id));
        assert!(liked.contains(id));

        assert!(!liked.toggle(id));
        assert!(!liked.contains(id));
    }

    #[test]
    fn replace_drops_previous_membership() {
        let liked = LikedPosts::new();
        let old = Uuid::new_v4();
        let new = Uuid::new_v4();
        liked.toggle(old);

        liked.replace([new]);

        assert!(!liked.contains(old));
        assert!(liked.contains(new));
        assert_eq!(liked.len(), 1);
    }

    #[test]
    fn handles_share_one_set() {
        let liked = LikedPosts::new();
        let view = liked.clone();
        let id = Uuid::new_v4();

        liked.set_membership(id, true);
        assert!(view.contains(id));
    }
}
