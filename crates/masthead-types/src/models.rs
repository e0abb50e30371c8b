use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub user_id: Uuid,
    pub name: String,
    pub photo_url: String,
    pub email: String,
}

/// A published piece of content — article, post, or photo story.
/// The backend owns the canonical copy; clients hold possibly-stale
/// snapshots per view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub post_id: Uuid,
    pub title: String,
    pub headline: String,
    /// Serialized rich markup. Opaque to this layer — it must round-trip
    /// through save and reload byte-for-byte when the author did not touch it.
    pub content: String,
    #[serde(default)]
    pub front_image_url: Option<String>,
    #[serde(rename = "category")]
    pub categories: BTreeSet<String>,
    pub likes: u32,
    #[serde(default)]
    pub liked_user_ids: Vec<Uuid>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub author: UserIdentity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub trending: bool,
}

impl Post {
    /// Whether `user_id` is in this post's liked set, as last reported by
    /// the backend.
    pub fn liked_by(&self, user_id: Uuid) -> bool {
        self.liked_user_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: Uuid,
    pub comment: String,
    pub user: UserIdentity,
    pub likes: u32,
    #[serde(default)]
    pub liked_user_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn liked_by(&self, user_id: Uuid) -> bool {
        self.liked_user_ids.contains(&user_id)
    }

    /// Edit and delete affordances are shown only to the comment's owner.
    pub fn owned_by(&self, user_id: Uuid) -> bool {
        self.user.user_id == user_id
    }
}

/// A batch-uploaded image gallery.
///
/// Invariant: a gallery never exists with zero images. Removing the last
/// image deletes the gallery itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub gallery_id: Uuid,
    pub images: Vec<String>,
    pub likes: u32,
}
