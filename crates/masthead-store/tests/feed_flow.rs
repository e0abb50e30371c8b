//! Collection-view behavior: the pagination state machine, the like
//! affordance, and optimistic like reconciliation.

mod support;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use masthead_store::LikedPosts;
use masthead_store::feed::{FeedSource, FeedStore, PAGE_SIZE};
use masthead_types::models::Post;

use support::*;

fn category_router(author_name: &str, first_page: usize, later_pages: usize) -> Router {
    let author = identity(author_name);
    Router::new().route(
        "/post/getCategory",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let author = author.clone();
            async move {
                let page: u32 = params.get("page").unwrap().parse().unwrap();
                let count = if page == 1 { first_page } else { later_pages };
                let posts: Vec<Post> = (0..count)
                    .map(|i| post_with(&author, &format!("p{page}-{i}"), 0))
                    .collect();
                Json(posts)
            }
        }),
    )
}

fn category_feed(ctx: &Ctx) -> FeedStore {
    FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        LikedPosts::new(),
        FeedSource::Category("world".into()),
    )
}

#[tokio::test]
async fn a_full_page_means_more_pages() {
    let ctx = bootstrap(category_router("asha", PAGE_SIZE, PAGE_SIZE - 1), None).await;
    let feed = category_feed(&ctx);

    feed.load().await.unwrap();

    let state = feed.state().await;
    assert_eq!(state.page, 1);
    assert!(state.has_more);
    assert!(state.can_next());
    assert!(!state.can_prev());
}

#[tokio::test]
async fn a_short_page_is_the_last_page() {
    let ctx = bootstrap(category_router("asha", PAGE_SIZE - 1, 0), None).await;
    let feed = category_feed(&ctx);

    feed.load().await.unwrap();

    let state = feed.state().await;
    assert!(!state.has_more);
    assert!(!state.can_next());
}

#[tokio::test]
async fn paging_forward_and_back() {
    let ctx = bootstrap(category_router("asha", PAGE_SIZE, PAGE_SIZE - 1), None).await;
    let feed = category_feed(&ctx);
    feed.load().await.unwrap();

    feed.next_page().await.unwrap();
    let state = feed.state().await;
    assert_eq!(state.page, 2);
    assert!(!state.has_more);
    assert!(state.can_prev());

    // Next is a no-op on the last page.
    feed.next_page().await.unwrap();
    assert_eq!(feed.state().await.page, 2);

    feed.prev_page().await.unwrap();
    let state = feed.state().await;
    assert_eq!(state.page, 1);
    assert!(state.has_more);
    assert!(!state.can_prev());

    // Previous is a no-op on page 1.
    feed.prev_page().await.unwrap();
    assert_eq!(feed.state().await.page, 1);
}

#[tokio::test]
async fn a_page_response_arriving_after_reset_is_dropped() {
    let author = identity("asha");
    let gate = Arc::new(Notify::new());
    let gate_in = gate.clone();
    let author_in = author.clone();

    let router = Router::new().route(
        "/post/getCategory",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let gate = gate_in.clone();
            let author = author_in.clone();
            async move {
                if params.get("page").map(String::as_str) == Some("2") {
                    gate.notified().await;
                    let posts: Vec<Post> = (0..PAGE_SIZE)
                        .map(|i| post_with(&author, &format!("stale-{i}"), 0))
                        .collect();
                    return Json(posts);
                }
                let posts: Vec<Post> = (0..PAGE_SIZE)
                    .map(|i| post_with(&author, &format!("fresh-{i}"), 0))
                    .collect();
                Json(posts)
            }
        }),
    );
    let ctx = bootstrap(router, None).await;
    let feed = category_feed(&ctx);
    feed.load().await.unwrap();

    let pending_feed = feed.clone();
    let pending = tokio::spawn(async move { pending_feed.next_page().await });

    // Let the page-2 request reach the backend, then invalidate it.
    tokio::time::sleep(Duration::from_millis(20)).await;
    feed.reset().await.unwrap();

    gate.notify_one();
    pending.await.unwrap().unwrap();

    let state = feed.state().await;
    assert_eq!(state.page, 1);
    assert!(state.posts.iter().all(|post| post.title.starts_with("fresh")));
}

#[tokio::test]
async fn identity_change_refetches_from_page_one() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let author = identity("asha");

    let router = Router::new()
        .route(
            "/post/getCategory",
            get(move |Query(_): Query<HashMap<String, String>>| {
                let author = author.clone();
                let hits = hits_in.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let posts: Vec<Post> =
                        (0..PAGE_SIZE).map(|i| post_with(&author, &format!("p{i}"), 0)).collect();
                    Json(posts)
                }
            }),
        )
        .merge(identity_routes(identity("uma"), false));
    // Starts anonymous: no stored credential.
    let ctx = bootstrap(router, None).await;
    let feed = category_feed(&ctx);
    feed.load().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let watcher = feed.follow_session();
    ctx.session.login("tok-fresh".into()).await;

    // Give the watcher a beat to observe the new identity and refetch.
    let mut refetched = false;
    for _ in 0..100 {
        if hits.load(Ordering::SeqCst) >= 2 {
            refetched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(refetched, "identity change should refetch page 1");
    assert_eq!(feed.state().await.page, 1);
    watcher.abort();
}

#[tokio::test]
async fn anonymous_like_prompts_sign_in_and_never_reaches_the_gateway() {
    let author = identity("asha");
    let p1 = post_with(&author, "p1", 5);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();
    let posts = vec![p1.clone()];

    let router = Router::new()
        .route(
            "/post/getHomePosts",
            get(move || {
                let posts = posts.clone();
                async move { Json(posts) }
            }),
        )
        .route(
            "/post/likePost",
            post(move || {
                let hits = hits_in.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({ "liked": true, "likes": 6 }))
                }
            }),
        );
    let ctx = bootstrap(router, None).await;
    let liked = LikedPosts::new();
    let feed = FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        liked.clone(),
        FeedSource::Home,
    );
    feed.load().await.unwrap();

    let err = feed.toggle_like(p1.post_id).await.unwrap_err();

    assert!(err.wants_sign_in());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(feed.state().await.posts[0].likes, 5);
    assert!(!liked.contains(p1.post_id));
}

#[tokio::test]
async fn failed_like_rolls_back_counter_and_membership() {
    let user = identity("uma");
    let author = identity("asha");
    let p1 = post_with(&author, "p1", 5);
    let posts = vec![p1.clone()];

    let router = Router::new()
        .route(
            "/post/getHomePosts",
            get(move || {
                let posts = posts.clone();
                async move { Json(posts) }
            }),
        )
        .route(
            "/post/likePost",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "like failed") }),
        );
    let ctx = bootstrap(router, Some((user, false))).await;
    let liked = LikedPosts::new();
    let feed = FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        liked.clone(),
        FeedSource::Home,
    );
    feed.load().await.unwrap();

    let err = feed.toggle_like(p1.post_id).await.unwrap_err();
    assert!(!err.wants_sign_in());

    let state = feed.state().await;
    assert_eq!(state.posts[0].likes, 5);
    assert!(state.posts[0].liked_user_ids.is_empty());
    assert!(!liked.contains(p1.post_id));
}

#[tokio::test]
async fn like_toggle_twice_returns_to_the_original_state() {
    let user = identity("uma");
    let author = identity("asha");
    let uid = user.user_id;
    let server_post = Arc::new(Mutex::new(post_with(&author, "p1", 5)));

    let sp_home = server_post.clone();
    let sp_like = server_post.clone();
    let sp_get = server_post.clone();
    let router = Router::new()
        .route(
            "/post/getHomePosts",
            get(move || {
                let sp = sp_home.clone();
                async move { Json(vec![sp.lock().await.clone()]) }
            }),
        )
        .route(
            "/post/likePost",
            post(move |Json(_body): Json<serde_json::Value>| {
                let sp = sp_like.clone();
                async move {
                    let mut post = sp.lock().await;
                    if let Some(i) = post.liked_user_ids.iter().position(|id| *id == uid) {
                        post.liked_user_ids.remove(i);
                        post.likes -= 1;
                        Json(serde_json::json!({ "liked": false, "likes": post.likes }))
                    } else {
                        post.liked_user_ids.push(uid);
                        post.likes += 1;
                        Json(serde_json::json!({ "liked": true, "likes": post.likes }))
                    }
                }
            }),
        )
        .route(
            "/post/getPost/{id}",
            get(move |Path(_id): Path<Uuid>| {
                let sp = sp_get.clone();
                async move { Json(sp.lock().await.clone()) }
            }),
        );
    let ctx = bootstrap(router, Some((user, false))).await;
    let liked = LikedPosts::new();
    let feed = FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        liked.clone(),
        FeedSource::Home,
    );
    feed.load().await.unwrap();
    let post_id = feed.state().await.posts[0].post_id;

    feed.toggle_like(post_id).await.unwrap();
    let state = feed.state().await;
    assert_eq!(state.posts[0].likes, 6);
    assert!(feed.is_liked(post_id));

    feed.toggle_like(post_id).await.unwrap();
    let state = feed.state().await;
    assert_eq!(state.posts[0].likes, 5);
    assert!(!feed.is_liked(post_id));
}

#[tokio::test]
async fn liked_set_seeds_from_the_backend() {
    let user = identity("uma");
    let author = identity("asha");
    let p1 = post_with(&author, "p1", 1);
    let liked_posts = vec![p1.clone()];

    let router = Router::new().route(
        "/user/myLikedPosts",
        get(move || {
            let posts = liked_posts.clone();
            async move { Json(posts) }
        }),
    );
    let ctx = bootstrap(router, Some((user, false))).await;

    let liked = LikedPosts::new();
    liked.refresh(&ctx.gateway).await.unwrap();

    assert!(liked.contains(p1.post_id));
    assert_eq!(liked.len(), 1);
}

#[tokio::test]
async fn trending_flip_is_author_gated_and_optimistic() {
    let writer = identity("asha");
    let p1 = post_with(&writer, "p1", 0);
    let posts = vec![p1.clone()];
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();

    let router = Router::new()
        .route(
            "/post/getHomePosts",
            get(move || {
                let posts = posts.clone();
                async move { Json(posts) }
            }),
        )
        .route(
            "/post/addToTrending",
            post(move || {
                let hits = hits_in.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );
    let ctx = bootstrap(router, Some((writer, true))).await;
    let feed = FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        LikedPosts::new(),
        FeedSource::Home,
    );
    feed.load().await.unwrap();

    feed.add_to_trending(p1.post_id).await.unwrap();
    assert!(feed.state().await.posts[0].trending);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn trending_flip_is_refused_for_non_authors() {
    let reader = identity("uma");
    let author = identity("asha");
    let p1 = post_with(&author, "p1", 0);
    let posts = vec![p1.clone()];
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = hits.clone();

    let router = Router::new()
        .route(
            "/post/getHomePosts",
            get(move || {
                let posts = posts.clone();
                async move { Json(posts) }
            }),
        )
        .route(
            "/post/addToTrending",
            post(move || {
                let hits = hits_in.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }
            }),
        );
    let ctx = bootstrap(router, Some((reader, false))).await;
    let feed = FeedStore::new(
        ctx.gateway.clone(),
        ctx.session.clone(),
        LikedPosts::new(),
        FeedSource::Home,
    );
    feed.load().await.unwrap();

    let err = feed.add_to_trending(p1.post_id).await.unwrap_err();
    assert!(err.wants_sign_in());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(!feed.state().await.posts[0].trending);
}
