//! Page fetching
//!
//! The runtime issues exactly one kind of request: a same-origin `GET`
//! for a full HTML document. [`PageFetcher`] is the seam between the
//! navigation controller and whatever actually performs that request.

use std::future::Future;
use std::pin::Pin;

use url::Url;

use crate::NetError;

/// A boxed, non-`Send` future; everything runs on one event loop
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Something that can turn a URL into an HTML body
pub trait PageFetcher {
    /// Fetch the document at `url`. Non-2xx responses are errors.
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, NetError>>;
}

/// HTTP response as seen by the runtime
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Check if response is OK (2xx)
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Consume into the HTML body, rejecting non-2xx statuses
    pub fn into_html(self) -> Result<String, NetError> {
        if !self.ok() {
            return Err(NetError::HttpError { status: self.status });
        }
        String::from_utf8(self.body).map_err(|e| NetError::Network(e.to_string()))
    }
}
