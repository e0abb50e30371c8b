use std::sync::{Arc, RwLock};

/// Shared bearer-credential cell.
///
/// The session store is the only writer; the gateway reads it on every
/// request. Handed to both by the composition root — nothing reads
/// credentials from ambient globals.
#[derive(Clone, Default)]
pub struct Credentials {
    inner: Arc<RwLock<Option<String>>>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().unwrap().clone()
    }

    pub fn is_present(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }

    pub fn set(&self, credential: String) {
        *self.inner.write().unwrap() = Some(credential);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap() = None;
    }
}
