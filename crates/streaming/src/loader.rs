//! Resource loader seam.
//!
//! Fetching and decoding belong to the host (filesystem, HTTP, browser image
//! decode). The cache only needs something that turns a URL into an [`Image`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};

use crate::image::Image;

/// A network or decode failure for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLoadError {
    pub url: String,
    pub cause: String,
}

impl ResourceLoadError {
    pub fn new(url: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            url: url.into(),
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for ResourceLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to load {}: {}", self.url, self.cause)
    }
}

impl std::error::Error for ResourceLoadError {}

/// Turns a URL into a decoded image.
///
/// Futures are `'static` so the cache can share one in-flight request
/// between every caller of the same URL.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<Image, ResourceLoadError>>;
}

/// Loader over a fixed in-memory table; unknown URLs fail.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    images: BTreeMap<String, Result<Image, String>>,
    requests: AtomicUsize,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: impl Into<String>, image: Image) -> Self {
        self.images.insert(url.into(), Ok(image));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, cause: impl Into<String>) -> Self {
        self.images.insert(url.into(), Err(cause.into()));
        self
    }

    /// Number of `load` calls seen so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<Image, ResourceLoadError>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let result = match self.images.get(url) {
            Some(Ok(image)) => Ok(image.clone()),
            Some(Err(cause)) => Err(ResourceLoadError::new(url, cause)),
            None => Err(ResourceLoadError::new(url, "not found")),
        };
        future::ready(result).boxed()
    }
}
