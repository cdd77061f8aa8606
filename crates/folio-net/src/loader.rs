//! Directory Loader
//!
//! Serves pages from a local site directory, mapping URL paths the way a
//! static file server would. Used for headless previews of a built site.

use std::fs;
use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::fetch::{LocalBoxFuture, PageFetcher};
use crate::NetError;

/// Load pages from a directory on disk
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a URL path to a file: `/` → `index.html`,
    /// `/work/` → `work/index.html`, `/work` → `work.html` or `work/index.html`
    pub fn resolve(&self, url: &Url) -> Result<PathBuf, NetError> {
        let mut relative = PathBuf::new();
        for component in Path::new(url.path().trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => return Err(NetError::InvalidUrl(url.to_string())),
            }
        }

        let base = self.root.join(&relative);
        let candidates = if url.path().ends_with('/') || relative.as_os_str().is_empty() {
            vec![base.join("index.html")]
        } else if base.extension().is_some() {
            vec![base.clone()]
        } else {
            vec![base.with_extension("html"), base.join("index.html")]
        };

        candidates
            .into_iter()
            .find(|p| p.is_file())
            .ok_or(NetError::HttpError { status: 404 })
    }

    fn load(&self, url: &Url) -> Result<String, NetError> {
        let path = self.resolve(url)?;
        tracing::debug!("Loading {} from {}", url, path.display());
        fs::read_to_string(&path).map_err(|e| NetError::Network(e.to_string()))
    }
}

impl PageFetcher for DirectoryLoader {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, NetError>> {
        Box::pin(async move { self.load(url) })
    }
}
