pub mod comments;
pub mod detail;
pub mod editor;
pub mod error;
pub mod feed;
pub mod gallery;
pub mod liked;
pub mod optimistic;
pub mod search;

pub use error::{Field, StoreError};
pub use liked::LikedPosts;
