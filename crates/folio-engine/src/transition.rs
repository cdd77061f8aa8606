//! Page Transition Controller
//!
//! Internal navigations replace the page behind a full-screen wipe:
//!
//! ```text
//! Idle → Covering → Swapping → Revealing → Idle
//! ```
//!
//! While covering, the destination is loaded from the page cache or the
//! network; the swap waits for both the cover animation and the load. A
//! failed load abandons the client-side transition for a full page load.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use folio_dom::{DomError, Viewport};
use folio_html::HtmlParser;
use folio_net::{CacheWrite, NetError, PageCache, PageFetcher, StorageArea};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use smol::future;
use url::Url;

use crate::config::TransitionConfig;
use crate::page::Page;
use crate::platform::{Animator, Morph, NavigationHost};
use crate::wipe::{WipeDirection, wipe_duration};

/// Controller phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Idle,
    Covering,
    Swapping,
    Revealing,
}

/// What started a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Click on an eligible link; pushes history
    Link,
    /// Back/forward; history already moved
    History,
}

/// The one navigation in flight
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    pub url: Url,
    pub direction: WipeDirection,
    pub kind: TriggerKind,
}

/// How a navigation ended
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Landmarks replaced in place
    Swapped { url: Url, from_cache: bool },
    /// Handed to the browser as a full page load
    FullNavigation { url: Url, reason: String },
}

/// Transition errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("a transition is already running ({0:?})")]
    Busy(TransitionPhase),

    #[error("fetched page could not be parsed: {0}")]
    Parse(String),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

/// Session flag carried across a full page load
#[derive(Debug, Serialize, Deserialize)]
struct PendingReveal {
    direction: WipeDirection,
}

/// Platform services the controller drives
pub struct TransitionServices {
    pub fetcher: Box<dyn PageFetcher>,
    pub animator: Box<dyn Animator>,
    pub host: Box<dyn NavigationHost>,
    pub cache: PageCache,
    pub session: Box<dyn StorageArea>,
    pub rng: StdRng,
}

/// Animated navigation controller
pub struct PageTransitionController {
    config: TransitionConfig,
    fetcher: Box<dyn PageFetcher>,
    animator: Box<dyn Animator>,
    host: Box<dyn NavigationHost>,
    cache: RefCell<PageCache>,
    session: RefCell<Box<dyn StorageArea>>,
    rng: RefCell<StdRng>,
    motion: bool,
    phase: Cell<TransitionPhase>,
}

impl PageTransitionController {
    pub fn new(config: TransitionConfig, services: TransitionServices, motion: bool) -> Self {
        Self {
            config,
            fetcher: services.fetcher,
            animator: services.animator,
            host: services.host,
            cache: RefCell::new(services.cache),
            session: RefCell::new(services.session),
            rng: RefCell::new(services.rng),
            motion,
            phase: Cell::new(TransitionPhase::Idle),
        }
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase.get()
    }

    pub fn is_idle(&self) -> bool {
        self.phase.get() == TransitionPhase::Idle
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Duration of one half for `direction`
    pub fn duration(&self, direction: WipeDirection, viewport: &Viewport) -> Duration {
        if self.motion {
            wipe_duration(&self.config, direction, viewport)
        } else {
            Duration::ZERO
        }
    }

    /// Claim the controller for a navigation. Fails while another runs.
    pub fn begin(&self, url: Url, kind: TriggerKind) -> Result<NavigationRequest, TransitionError> {
        let phase = self.phase.get();
        if phase != TransitionPhase::Idle {
            tracing::debug!("Ignoring navigation to {} while {:?}", url, phase);
            return Err(TransitionError::Busy(phase));
        }

        let direction = WipeDirection::random(&mut *self.rng.borrow_mut());
        self.persist_pending(direction);
        self.phase.set(TransitionPhase::Covering);
        Ok(NavigationRequest { url, direction, kind })
    }

    /// Cover, load, swap, reveal. `after_swap` re-initializes whatever
    /// depends on the replaced landmarks.
    pub async fn run<F>(
        &self,
        request: NavigationRequest,
        page: &RefCell<Page>,
        after_swap: F,
    ) -> TransitionOutcome
    where
        F: FnOnce(&mut Page),
    {
        let viewport = page.borrow().viewport;
        let duration = self.duration(request.direction, &viewport);
        tracing::info!("Navigating to {} ({} wipe, {:?})", request.url, request.direction.as_str(), duration);

        let cover = self.animator.morph(Morph::cover(request.direction, duration));
        let load = self.load(&request.url);
        let ((), loaded) = future::zip(cover, load).await;

        let (html, from_cache) = match loaded {
            Ok(loaded) => loaded,
            Err(error) => return self.fall_back(&request, error.to_string()),
        };

        self.phase.set(TransitionPhase::Swapping);
        if !from_cache {
            let write = self.cache.borrow_mut().set(&cache_key(&request.url), &html);
            if write == CacheWrite::Skipped {
                tracing::debug!("Page not cached: {}", request.url);
            }
        }

        let swapped = {
            let mut page = page.borrow_mut();
            self.swap(&mut page, &request, &html).map(|()| after_swap(&mut *page))
        };
        if let Err(error) = swapped {
            return self.fall_back(&request, error.to_string());
        }

        self.phase.set(TransitionPhase::Revealing);
        self.animator.morph(Morph::reveal(request.direction, duration)).await;
        self.clear_pending();
        self.phase.set(TransitionPhase::Idle);

        TransitionOutcome::Swapped { url: request.url, from_cache }
    }

    /// On page load: if a transition left the pending flag, start fully
    /// covered and play only the reveal half.
    pub async fn resume(&self, viewport: &Viewport) -> Option<WipeDirection> {
        if !self.is_idle() {
            return None;
        }
        let direction = self.take_pending()?;

        tracing::debug!("Resuming {} reveal after page load", direction.as_str());
        self.animator.set_path(&direction.full_path());
        self.phase.set(TransitionPhase::Revealing);
        let duration = self.duration(direction, viewport);
        self.animator.morph(Morph::reveal(direction, duration)).await;
        self.phase.set(TransitionPhase::Idle);
        Some(direction)
    }

    /// Store a page body (the current page on load)
    pub fn remember(&self, url: &Url, html: &str) -> CacheWrite {
        self.cache.borrow_mut().set(&cache_key(url), html)
    }

    /// Fresh cache entry for `url`
    pub fn is_cached(&self, url: &Url) -> bool {
        self.cache.borrow().contains(&cache_key(url))
    }

    /// Drop expired cache entries
    pub fn prune_cache(&self) -> usize {
        self.cache.borrow_mut().prune()
    }

    async fn load(&self, url: &Url) -> Result<(String, bool), NetError> {
        let key = cache_key(url);
        let cached = self.cache.borrow_mut().get(&key);
        if let Some(html) = cached {
            tracing::debug!("Serving {} from the page cache", key);
            return Ok((html, true));
        }

        let resource = without_fragment(url);
        let html = self.fetcher.fetch(&resource).await?;
        Ok((html, false))
    }

    fn swap(&self, page: &mut Page, request: &NavigationRequest, html: &str) -> Result<(), TransitionError> {
        let fetched = HtmlParser::new()
            .parse_with_url(html, request.url.as_str())
            .map_err(|e| TransitionError::Parse(e.to_string()))?;

        for tag in &self.config.landmarks {
            let (Some(target), Some(source)) = (page.document.landmark(tag), fetched.landmark(tag)) else {
                tracing::debug!("Landmark <{}> missing; leaving it unchanged", tag);
                continue;
            };

            let tree = page.document.tree_mut();
            tree.remove_children(target)?;
            for child in fetched.tree().child_ids(source) {
                let copy = tree.import_subtree(fetched.tree(), child)?;
                tree.append_child(target, copy)?;
            }
        }

        let title = fetched.title();
        if !title.is_empty() {
            page.document.set_title(&title)?;
        }
        page.document.set_url(request.url.as_str());

        if request.kind == TriggerKind::Link {
            self.host.push_history(&request.url, &title);
        }
        self.host.scroll_to_top();
        page.viewport.scroll_y = 0.0;
        Ok(())
    }

    fn fall_back(&self, request: &NavigationRequest, reason: String) -> TransitionOutcome {
        tracing::warn!("Transition to {} abandoned ({}); loading the page directly", request.url, reason);
        self.clear_pending();
        self.phase.set(TransitionPhase::Idle);
        self.host.navigate(&request.url);
        TransitionOutcome::FullNavigation { url: request.url.clone(), reason }
    }

    fn persist_pending(&self, direction: WipeDirection) {
        let json = match serde_json::to_string(&PendingReveal { direction }) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Could not encode pending reveal: {}", e);
                return;
            }
        };
        if let Err(e) = self.session.borrow_mut().set_item(&self.config.session_key, &json) {
            tracing::warn!("Session storage unavailable for transition flag: {}", e);
        }
    }

    fn take_pending(&self) -> Option<WipeDirection> {
        let stored = self.session.borrow().get_item(&self.config.session_key);
        let raw = match stored {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!("Session storage unavailable: {}", e);
                return None;
            }
        };
        self.clear_pending();

        match serde_json::from_str::<PendingReveal>(&raw) {
            Ok(pending) => Some(pending.direction),
            Err(e) => {
                tracing::warn!("Ignoring corrupt transition flag: {}", e);
                None
            }
        }
    }

    fn clear_pending(&self) {
        if let Err(e) = self.session.borrow_mut().remove_item(&self.config.session_key) {
            tracing::debug!("Could not clear transition flag: {}", e);
        }
    }
}

/// Markup for `<head>`: shows the overlay fully covered before any other
/// script runs when a transition is pending.
pub fn boot_cover(config: &TransitionConfig) -> String {
    let full = WipeDirection::Bottom.full_path();
    format!(
        concat!(
            "<style>.transition-overlay{{position:fixed;inset:0;pointer-events:none;visibility:hidden}}",
            "html.is-transitioning .transition-overlay{{visibility:visible}}</style>",
            "<script>try{{if(sessionStorage.getItem(\"{key}\"))",
            "document.documentElement.classList.add(\"is-transitioning\")}}catch(e){{}}</script>",
            "<svg class=\"transition-overlay\" viewBox=\"0 0 100 100\" preserveAspectRatio=\"none\">",
            "<path class=\"path\" d=\"{path}\"></path></svg>",
        ),
        key = config.session_key,
        path = full,
    )
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

fn cache_key(url: &Url) -> String {
    without_fragment(url).into()
}
