use std::fmt;

use thiserror::Error;

use masthead_gateway::GatewayError;

/// The form field a validation failure points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Headline,
    Category,
    Body,
    Comment,
    Images,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Headline => "headline",
            Field::Category => "category",
            Field::Body => "body",
            Field::Comment => "comment",
            Field::Images => "images",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The action needs a signed-in user (or an author, for authoring
    /// actions). Surfaced as a sign-in prompt, never fatal.
    #[error("sign-in required")]
    AuthRequired,

    /// Pre-submit validation failure. Blocks the action and names the field.
    #[error("{0} is required")]
    Validation(Field),

    #[error("comment must be at most {max} characters")]
    CommentTooLong { max: usize },

    /// A referenced image is still uploading; saving now would persist a
    /// post pointing at an asset that does not exist yet.
    #[error("an image upload is still in flight")]
    UploadsInFlight,

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl StoreError {
    /// Whether this failure should be answered with the sign-in prompt.
    pub fn wants_sign_in(&self) -> bool {
        matches!(
            self,
            StoreError::AuthRequired | StoreError::Gateway(GatewayError::AuthRequired)
        )
    }
}
