use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::image::Image;
use crate::loader::{ResourceLoadError, ResourceLoader};

/// Shared, immutable handle to a loaded resource.
pub type ResourceHandle = Arc<Image>;

/// Future returned by [`ResourceCache::load`]; clones await the same request.
pub type LoadFuture = Shared<BoxFuture<'static, Result<ResourceHandle, ResourceLoadError>>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    Pending,
    Ready,
    Failed,
}

enum Slot {
    Pending(LoadFuture),
    Ready(ResourceHandle),
    Failed(ResourceLoadError),
}

struct CacheEntry {
    slot: Slot,
    attempts: u32,
}

struct Inner {
    loader: Arc<dyn ResourceLoader>,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl Inner {
    fn settle(&self, url: &str, result: &Result<ResourceHandle, ResourceLoadError>) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(url) else {
            return;
        };
        entry.slot = match result {
            Ok(handle) => {
                debug!(url, "resource ready");
                Slot::Ready(handle.clone())
            }
            Err(err) => {
                warn!(url, cause = %err.cause, "resource failed");
                Slot::Failed(err.clone())
            }
        };
    }
}

/// Outcome of [`ResourceCache::preload`]. Failures never fail the aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreloadReport {
    pub ready: Vec<String>,
    pub failed: Vec<ResourceLoadError>,
}

/// URL-keyed store of loaded resources.
///
/// Notes:
/// - Concurrent requests for the same URL share one in-flight load.
/// - `Ready` entries are kept for the whole session; there is no eviction.
/// - `Failed` entries are retried only when requested again.
/// - The entry table is locked only to look up or swap a slot, never across
///   an await, so loads of different URLs never wait on each other.
#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

impl ResourceCache {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                entries: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    pub fn status(&self, url: &str) -> Option<CacheStatus> {
        self.inner.entries.lock().get(url).map(|e| match e.slot {
            Slot::Pending(_) => CacheStatus::Pending,
            Slot::Ready(_) => CacheStatus::Ready,
            Slot::Failed(_) => CacheStatus::Failed,
        })
    }

    /// The resource if it is already `Ready`; never starts a load.
    pub fn get_ready(&self, url: &str) -> Option<ResourceHandle> {
        match &self.inner.entries.lock().get(url)?.slot {
            Slot::Ready(handle) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Number of loader requests issued for `url` so far.
    pub fn attempts(&self, url: &str) -> u32 {
        self.inner
            .entries
            .lock()
            .get(url)
            .map(|e| e.attempts)
            .unwrap_or(0)
    }

    /// Load `url`, reusing a ready or in-flight result when there is one.
    pub fn load(&self, url: &str) -> LoadFuture {
        let mut entries = self.inner.entries.lock();

        let attempts = match entries.get(url) {
            Some(CacheEntry {
                slot: Slot::Ready(handle),
                ..
            }) => return future::ready(Ok(handle.clone())).boxed().shared(),
            Some(CacheEntry {
                slot: Slot::Pending(fut),
                ..
            }) => return fut.clone(),
            Some(CacheEntry {
                slot: Slot::Failed(_),
                attempts,
            }) => *attempts,
            None => 0,
        };

        debug!(url, attempt = attempts + 1, "requesting resource");
        let fetch = self.inner.loader.load(url);
        let owner: Weak<Inner> = Arc::downgrade(&self.inner);
        let key = url.to_string();
        let fut = async move {
            let result = fetch.await.map(Arc::new);
            if let Some(inner) = owner.upgrade() {
                inner.settle(&key, &result);
            }
            result
        }
        .boxed()
        .shared();

        entries.insert(
            url.to_string(),
            CacheEntry {
                slot: Slot::Pending(fut.clone()),
                attempts: attempts + 1,
            },
        );
        fut
    }

    /// Request every URL and resolve once all of them have settled.
    pub fn preload<I, S>(&self, urls: I) -> BoxFuture<'static, PreloadReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: Vec<String> = Vec::new();
        for url in urls {
            let url = url.as_ref();
            if !seen.iter().any(|s| s == url) {
                seen.push(url.to_string());
            }
        }
        let loads: Vec<(String, LoadFuture)> =
            seen.into_iter().map(|u| (u.clone(), self.load(&u))).collect();

        async move {
            let (urls, futs): (Vec<String>, Vec<LoadFuture>) = loads.into_iter().unzip();
            let results = future::join_all(futs).await;

            let mut report = PreloadReport::default();
            for (url, result) in urls.into_iter().zip(results) {
                match result {
                    Ok(_) => report.ready.push(url),
                    Err(err) => report.failed.push(err),
                }
            }
            info!(
                ready = report.ready.len(),
                failed = report.failed.len(),
                "preload settled"
            );
            report
        }
        .boxed()
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
