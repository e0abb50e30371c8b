//! Shared scaffolding: an in-process axum backend on an ephemeral port
//! plus builders for signed-in and anonymous contexts.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;

use masthead_gateway::{AssetClient, ContentGateway, Credentials, GatewayConfig};
use masthead_session::{CredentialStore, MemoryCredentialStore, SessionStore};
use masthead_types::models::{Comment, Gallery, Post, UserIdentity};

pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn identity(name: &str) -> UserIdentity {
    UserIdentity {
        user_id: Uuid::new_v4(),
        name: name.into(),
        photo_url: format!("https://img.example/{name}.png"),
        email: format!("{name}@example.com"),
    }
}

pub fn post_with(author: &UserIdentity, title: &str, likes: u32) -> Post {
    Post {
        post_id: Uuid::new_v4(),
        title: title.into(),
        headline: format!("{title} — headline"),
        content: "<p>body</p>".into(),
        front_image_url: None,
        categories: BTreeSet::from(["world".to_string()]),
        likes,
        liked_user_ids: vec![],
        comments: vec![],
        author: author.clone(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
        trending: false,
    }
}

pub fn comment_by(user: &UserIdentity, text: &str) -> Comment {
    Comment {
        comment_id: Uuid::new_v4(),
        comment: text.into(),
        user: user.clone(),
        likes: 0,
        liked_user_ids: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn gallery_with(images: &[&str], likes: u32) -> Gallery {
    Gallery {
        gallery_id: Uuid::new_v4(),
        images: images.iter().map(|s| s.to_string()).collect(),
        likes,
    }
}

/// Routes the session store needs to resolve a credential.
pub fn identity_routes(who: UserIdentity, is_author: bool) -> Router {
    let details = who.clone();
    Router::new()
        .route(
            "/user/userDetails",
            get(move || {
                let details = details.clone();
                async move { Json(details) }
            }),
        )
        .route("/user/isAuthor", get(move || async move { Json(is_author) }))
}

pub struct Ctx {
    pub base: String,
    pub gateway: ContentGateway,
    pub assets: AssetClient,
    pub session: SessionStore,
    pub credentials: Credentials,
}

/// Stand up the backend and a session resolved against it. `signed_in`
/// carries the identity to resolve plus the author flag; `None` leaves the
/// session anonymous.
pub async fn bootstrap(routes: Router, signed_in: Option<(UserIdentity, bool)>) -> Ctx {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "masthead=debug".into()),
        )
        .with_test_writer()
        .try_init();

    let router = match &signed_in {
        Some((who, is_author)) => routes.merge(identity_routes(who.clone(), *is_author)),
        None => routes,
    };
    let base = spawn(router).await;

    let credentials = Credentials::new();
    let config = GatewayConfig::new(base.as_str(), base.as_str());
    let gateway = ContentGateway::new(&config, credentials.clone());
    let assets = AssetClient::new(&config);

    let storage: Arc<dyn CredentialStore> = if signed_in.is_some() {
        Arc::new(MemoryCredentialStore::with_credential("tok"))
    } else {
        Arc::new(MemoryCredentialStore::new())
    };
    let session = SessionStore::new(gateway.clone(), credentials.clone(), storage);
    session.initialize().await;

    Ctx {
        base,
        gateway,
        assets,
        session,
        credentials,
    }
}
