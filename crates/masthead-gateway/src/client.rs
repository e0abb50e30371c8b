use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use masthead_types::api::{
    AddCommentRequest, CreateGalleryRequest, CreatePostRequest, DeleteCommentRequest,
    DeleteGalleryImageRequest, DeleteGalleryRequest, DeletePostRequest, EditCommentRequest,
    GalleryImageRemoved, LikeCommentRequest, LikeGalleryRequest, LikePostRequest,
    LikeToggleResponse, TrendingRequest, UpdatePostRequest,
};
use masthead_types::models::{Comment, Gallery, Post, UserIdentity};

use crate::config::GatewayConfig;
use crate::credentials::Credentials;
use crate::error::GatewayError;

/// Typed boundary to the content backend — the only place that knows the
/// wire format. Attaches the bearer credential when one is present, parses
/// the response, and converts non-2xx into `GatewayError`. It never retries
/// and never touches local state; callers own recovery.
#[derive(Clone)]
pub struct ContentGateway {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl ContentGateway {
    pub fn new(config: &GatewayConfig, credentials: Credentials) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.clone(),
            credentials,
        }
    }

    // -- Identity --

    pub async fn get_user_details(&self) -> Result<UserIdentity, GatewayError> {
        self.get("/user/userDetails").await
    }

    /// The backend answers with a bare JSON boolean.
    pub async fn is_author(&self) -> Result<bool, GatewayError> {
        self.get("/user/isAuthor").await
    }

    pub async fn my_liked_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.get("/user/myLikedPosts").await
    }

    pub async fn my_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.get("/user/myBlogs").await
    }

    // -- Content read --

    pub async fn get_home_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.get("/post/getHomePosts").await
    }

    /// One page of a category feed. Pages are 1-based and sized at 15 on
    /// the backend; the caller derives `has_more` from the returned count.
    pub async fn get_category(&self, category: &str, page: u32) -> Result<Vec<Post>, GatewayError> {
        let page = page.to_string();
        let request = self
            .request(Method::GET, "/post/getCategory")
            .query(&[("category", category), ("page", page.as_str())]);
        decode(request.send().await?).await
    }

    pub async fn get_post(&self, post_id: Uuid) -> Result<Post, GatewayError> {
        self.get(&format!("/post/getPost/{post_id}")).await
    }

    pub async fn get_trending_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.get("/post/getTrendingPosts").await
    }

    pub async fn get_articles(&self) -> Result<Vec<Post>, GatewayError> {
        self.get("/post/getArticles").await
    }

    // -- Content write --

    pub async fn create_post(&self, request: &CreatePostRequest) -> Result<Post, GatewayError> {
        self.post("/post/createPost", request).await
    }

    pub async fn update_post(&self, request: &UpdatePostRequest) -> Result<Post, GatewayError> {
        self.post("/post/updatePost", request).await
    }

    pub async fn delete_post(&self, post_id: Uuid) -> Result<(), GatewayError> {
        self.post_unit("/post/deletePost", &DeletePostRequest { post_id })
            .await
    }

    // -- Engagement --

    /// Toggle: the backend flips membership and reports the new state.
    pub async fn like_post(&self, post_id: Uuid) -> Result<LikeToggleResponse, GatewayError> {
        self.post("/post/likePost", &LikePostRequest { post_id }).await
    }

    pub async fn add_comment(&self, post_id: Uuid, comment: &str) -> Result<Comment, GatewayError> {
        let request = AddCommentRequest {
            post_id,
            comment: comment.to_string(),
        };
        self.post("/post/comment", &request).await
    }

    pub async fn edit_comment(
        &self,
        comment_id: Uuid,
        comment: &str,
    ) -> Result<Comment, GatewayError> {
        let request = EditCommentRequest {
            comment_id,
            comment: comment.to_string(),
        };
        self.post("/post/editComment", &request).await
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> Result<(), GatewayError> {
        self.post_unit("/post/deleteComment", &DeleteCommentRequest { comment_id })
            .await
    }

    pub async fn like_comment(&self, comment_id: Uuid) -> Result<LikeToggleResponse, GatewayError> {
        self.post("/post/likeComment", &LikeCommentRequest { comment_id })
            .await
    }

    // -- Galleries --

    pub async fn get_all_galleries(&self) -> Result<Vec<Gallery>, GatewayError> {
        self.get("/gallery/getAllGalleries").await
    }

    pub async fn create_gallery(&self, images: Vec<String>) -> Result<Gallery, GatewayError> {
        self.post("/gallery/createGallery", &CreateGalleryRequest { images })
            .await
    }

    pub async fn like_gallery(&self, gallery_id: Uuid) -> Result<LikeToggleResponse, GatewayError> {
        self.post("/gallery/likeGallery", &LikeGalleryRequest { gallery_id })
            .await
    }

    pub async fn delete_gallery(&self, gallery_id: Uuid) -> Result<(), GatewayError> {
        self.post_unit("/gallery/deleteGallery", &DeleteGalleryRequest { gallery_id })
            .await
    }

    /// Remove one image. A `None` gallery in the response means the backend
    /// deleted the now-empty gallery.
    pub async fn delete_gallery_image(
        &self,
        gallery_id: Uuid,
        image: &str,
    ) -> Result<GalleryImageRemoved, GatewayError> {
        let request = DeleteGalleryImageRequest {
            gallery_id,
            image: image.to_string(),
        };
        self.post("/gallery/deleteImage", &request).await
    }

    // -- Trending admin --

    pub async fn add_to_trending(&self, post_id: Uuid) -> Result<(), GatewayError> {
        self.post_unit("/post/addToTrending", &TrendingRequest { post_id })
            .await
    }

    pub async fn remove_from_trending(&self, post_id: Uuid) -> Result<(), GatewayError> {
        self.post_unit("/post/removeFromTrending", &TrendingRequest { post_id })
            .await
    }

    // -- Plumbing --

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(credential) = self.credentials.get() {
            builder = builder.header("Authorization", format!("Bearer {}", credential));
        }
        builder
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        decode(self.request(Method::GET, path).send().await?).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        decode(self.request(Method::POST, path).json(body).send().await?).await
    }

    async fn post_unit<B: Serialize>(&self, path: &str, body: &B) -> Result<(), GatewayError> {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        check(resp).await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, GatewayError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "gateway request failed: {}", message);
    Err(GatewayError::from_status(status.as_u16(), message))
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    Ok(check(resp).await?.json::<T>().await?)
}
