use std::path::{Path, PathBuf};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use streaming::{Image, ResourceLoadError, ResourceLoader};
use tracing::debug;

/// Loads images relative to an asset directory, decoding on the blocking pool.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = Path::new(url);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ResourceLoader for FsImageLoader {
    fn load(&self, url: &str) -> BoxFuture<'static, Result<Image, ResourceLoadError>> {
        let path = self.resolve(url);
        let url = url.to_string();
        async move {
            debug!(path = %path.display(), "decoding");
            let decode_url = url.clone();
            tokio::task::spawn_blocking(move || decode(&path, &decode_url))
                .await
                .map_err(|e| ResourceLoadError::new(url, e))?
        }
        .boxed()
    }
}

fn decode(path: &Path, url: &str) -> Result<Image, ResourceLoadError> {
    let rgba = image::open(path)
        .map_err(|e| ResourceLoadError::new(url, e))?
        .into_rgba8();
    let (width, height) = rgba.dimensions();
    Image::from_rgba8(width, height, rgba.into_raw()).map_err(|e| ResourceLoadError::new(url, e))
}
