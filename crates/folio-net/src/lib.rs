//! Folio Networking
//!
//! Everything the runtime needs from the outside world besides the DOM:
//! fetching destination pages, web storage areas (session and local), and
//! the TTL-bounded page cache layered on top of local storage.

pub mod cache;
pub mod client;
pub mod clock;
pub mod fetch;
pub mod loader;
pub mod storage;

pub use cache::{CacheConfig, CacheWrite, PageCache};
pub use client::{ClientConfig, HttpFetcher};
pub use clock::{Clock, ManualClock, SystemClock};
pub use fetch::{LocalBoxFuture, PageFetcher, Response};
pub use loader::DirectoryLoader;
pub use storage::{MemoryStorage, StorageArea, StorageError};
pub use url::Url;

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
