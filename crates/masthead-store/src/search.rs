//! Debounced client-side search over the eagerly loaded post list.
//!
//! The debounce is trailing-edge with a fixed delay: every keystroke arms
//! the timer; only the call that is still newest when its timer fires
//! survives. The filter itself is pure and tested in isolation.

use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use masthead_types::models::Post;

/// Trailing-edge coalescer for rapid input events.
#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Wait out the window. Returns true iff no newer call arrived while
    /// this one was waiting — i.e. this call is the trailing edge.
    pub async fn settle(&self) -> bool {
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == my_generation
    }
}

/// Case-insensitive match on title or headline. An empty query matches
/// everything.
pub fn filter_posts<'a>(posts: &'a [Post], query: &str) -> Vec<&'a Post> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return posts.iter().collect();
    }
    posts
        .iter()
        .filter(|post| {
            post.title.to_lowercase().contains(&needle)
                || post.headline.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Search box state: the loaded corpus plus the last settled result set.
#[derive(Clone)]
pub struct SearchStore {
    inner: Arc<SearchInner>,
}

struct SearchInner {
    debouncer: Debouncer,
    posts: RwLock<Vec<Post>>,
    results: RwLock<Vec<Post>>,
}

impl SearchStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                debouncer: Debouncer::new(delay),
                posts: RwLock::new(Vec::new()),
                results: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Replace the searchable corpus (the eagerly loaded full post list).
    pub fn set_posts(&self, posts: Vec<Post>) {
        *self.inner.posts.write().unwrap() = posts;
    }

    /// Feed one input event through the debouncer. Superseded calls return
    /// `None` and leave the results untouched.
    pub async fn input(&self, query: &str) -> Option<Vec<Post>> {
        if !self.inner.debouncer.settle().await {
            return None;
        }
        let posts = self.inner.posts.read().unwrap();
        let matched: Vec<Post> = filter_posts(&posts, query).into_iter().cloned().collect();
        drop(posts);
        *self.inner.results.write().unwrap() = matched.clone();
        Some(matched)
    }

    pub fn results(&self) -> Vec<Post> {
        self.inner.results.read().unwrap().clone()
    }
}
