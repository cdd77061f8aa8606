//! Site Runtime
//!
//! Owns every component for the lifetime of one page and routes platform
//! events to them. Handlers take the event time in milliseconds; nothing
//! here reads a clock.

use std::cell::RefCell;

use folio_dom::{DomError, SimpleSelector, Viewport};
use url::Url;

use crate::config::RuntimeConfig;
use crate::lifecycle::{Evaluation, Frame, LazyLifecycleManager};
use crate::links::{Ineligible, LinkBindings, LinkClick};
use crate::page::Page;
use crate::platform::{LayoutProvider, PlatformCaps};
use crate::previews::load_previews;
use crate::reveal::{RevealPass, ScrollRevealObserver};
use crate::slot::LifecycleError;
use crate::transition::{
    PageTransitionController, TransitionError, TransitionOutcome, TransitionServices, TriggerKind,
};
use crate::velocity::{ScrollDirection, VelocityTracker};
use crate::visibility::{DocumentVisibility, VisibilityState};
use crate::wipe::WipeDirection;

/// Added to `<html>` once the runtime is attached
pub const JS_ENABLED_CLASS: &str = "js-enabled";
const BACK_TO_TOP_CLASS: &str = "back-to-top";
const BACK_TO_TOP_SHOW_CLASS: &str = "show";
/// Scroll offset past which the back-to-top button shows
pub const BACK_TO_TOP_OFFSET_PX: f64 = 300.0;

/// Runtime errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("lazy content: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

/// What one scroll, resize or tick changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub lazy: Evaluation,
    pub reveal: RevealPass,
}

/// Result of a click or history event
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationResult {
    /// Left to the browser's default handling
    NotHandled(Ineligible),
    /// Dropped because a transition is already running
    Busy,
    Completed(TransitionOutcome),
}

/// Per-page owner of all components
pub struct SiteRuntime {
    config: RuntimeConfig,
    caps: PlatformCaps,
    layout: Box<dyn LayoutProvider>,
    page: RefCell<Page>,
    lifecycle: RefCell<LazyLifecycleManager>,
    reveal: RefCell<ScrollRevealObserver>,
    links: RefCell<LinkBindings>,
    velocity: RefCell<VelocityTracker>,
    visibility: RefCell<DocumentVisibility>,
    transitions: PageTransitionController,
}

impl SiteRuntime {
    /// Attach to a freshly loaded page: mark it scripted, cache it, load
    /// previews, discover slots and reveal targets, bind links, and run
    /// the first evaluation.
    pub fn new(
        mut page: Page,
        config: RuntimeConfig,
        caps: PlatformCaps,
        layout: Box<dyn LayoutProvider>,
        services: TransitionServices,
        now: f64,
    ) -> Result<Self, RuntimeError> {
        let root = page.document.document_element();
        page.document.tree_mut().add_class(root, JS_ENABLED_CLASS)?;

        let transitions = PageTransitionController::new(
            config.transition.clone(),
            services,
            caps.motion_enabled(),
        );
        let pruned = transitions.prune_cache();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired cache entries", pruned);
        }
        if let Some(url) = page.url() {
            transitions.remember(&url, &page.html());
        }

        load_previews(&mut page.document)?;
        let lifecycle = LazyLifecycleManager::discover(&mut page.document, &*layout, config.lazy.clone())?;
        let reveal = ScrollRevealObserver::attach(&mut page.document, config.reveal.clone(), caps.static_reveal())?;
        let links = LinkBindings::bind(&page.document);

        tracing::info!(
            "Runtime attached to {} ({} slots, {} reveal targets, {} links)",
            page.document.url(),
            lifecycle.len(),
            reveal.targets().len(),
            links.len()
        );

        let runtime = Self {
            velocity: RefCell::new(VelocityTracker::new(config.lazy.idle_reset_ms)),
            visibility: RefCell::new(DocumentVisibility::new()),
            config,
            caps,
            layout,
            page: RefCell::new(page),
            lifecycle: RefCell::new(lifecycle),
            reveal: RefCell::new(reveal),
            links: RefCell::new(links),
            transitions,
        };
        runtime.refresh(ScrollDirection::Still, now)?;
        Ok(runtime)
    }

    /// Construct, then play the pending reveal if a transition led here
    pub async fn load(
        page: Page,
        config: RuntimeConfig,
        caps: PlatformCaps,
        layout: Box<dyn LayoutProvider>,
        services: TransitionServices,
        now: f64,
    ) -> Result<Self, RuntimeError> {
        let runtime = Self::new(page, config, caps, layout, services, now)?;
        runtime.resume().await;
        Ok(runtime)
    }

    /// Play the reveal half left pending by a full page load
    pub async fn resume(&self) -> Option<WipeDirection> {
        let viewport = self.page.borrow().viewport;
        self.transitions.resume(&viewport).await
    }

    // === Events ===

    pub fn scroll(&self, scroll_y: f64, now: f64) -> Result<FrameReport, RuntimeError> {
        let direction = {
            let mut velocity = self.velocity.borrow_mut();
            velocity.sample(scroll_y, now);
            velocity.direction()
        };
        self.page.borrow_mut().viewport.scroll_y = scroll_y;
        self.refresh(direction, now)
    }

    pub fn resize(&self, width: f64, height: f64, now: f64) -> Result<FrameReport, RuntimeError> {
        {
            let mut page = self.page.borrow_mut();
            page.viewport.width = width;
            page.viewport.height = height;
        }
        self.refresh(ScrollDirection::Still, now)
    }

    /// Fire due continuations and the periodic fallback. Paused while the
    /// document is hidden.
    pub fn tick(&self, now: f64) -> Result<Evaluation, RuntimeError> {
        if self.visibility.borrow().is_hidden() {
            return Ok(Evaluation::default());
        }
        let mut page = self.page.borrow_mut();
        let mut frame = self.frame(&mut page, now);
        Ok(self.lifecycle.borrow_mut().tick(&mut frame)?)
    }

    pub fn visibility_changed(&self, visible: bool, now: f64) -> Result<FrameReport, RuntimeError> {
        let state = if visible { VisibilityState::Visible } else { VisibilityState::Hidden };
        let changed = self.visibility.borrow_mut().set_state(state, now);
        if !changed || !visible {
            return Ok(FrameReport::default());
        }

        // Scroll speed from before the page was hidden is meaningless now
        self.velocity.borrow_mut().reset();
        let mut report = self.refresh(ScrollDirection::Still, now)?;
        report.lazy.merge(self.tick(now)?);
        Ok(report)
    }

    /// Primary-button click on `click.target`
    pub async fn click(&self, click: LinkClick, now: f64) -> Result<NavigationResult, RuntimeError> {
        let destination = {
            let page = self.page.borrow();
            let Some(current) = page.url() else {
                return Ok(NavigationResult::NotHandled(Ineligible::BadHref(page.document.url().to_string())));
            };
            self.links.borrow().resolve(&page.document, &click, &current)
        };

        match destination {
            Ok(url) => self.navigate(url, TriggerKind::Link, now).await,
            Err(reason) => {
                tracing::trace!("Click left to the browser: {:?}", reason);
                Ok(NavigationResult::NotHandled(reason))
            }
        }
    }

    /// Back/forward to `url`; history has already moved
    pub async fn popstate(&self, url: Url, now: f64) -> Result<NavigationResult, RuntimeError> {
        let same_document = self
            .page
            .borrow()
            .url()
            .is_some_and(|current| same_resource(&current, &url));
        if same_document {
            return Ok(NavigationResult::NotHandled(Ineligible::SameDocumentHash));
        }
        self.navigate(url, TriggerKind::History, now).await
    }

    // === Accessors ===

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn caps(&self) -> PlatformCaps {
        self.caps
    }

    pub fn page(&self) -> std::cell::Ref<'_, Page> {
        self.page.borrow()
    }

    pub fn viewport(&self) -> Viewport {
        self.page.borrow().viewport
    }

    pub fn lifecycle(&self) -> std::cell::Ref<'_, LazyLifecycleManager> {
        self.lifecycle.borrow()
    }

    pub fn reveal(&self) -> std::cell::Ref<'_, ScrollRevealObserver> {
        self.reveal.borrow()
    }

    pub fn links(&self) -> std::cell::Ref<'_, LinkBindings> {
        self.links.borrow()
    }

    pub fn transitions(&self) -> &PageTransitionController {
        &self.transitions
    }

    /// Earliest pending continuation, for hosts that sleep between ticks
    pub fn next_due(&self) -> Option<f64> {
        self.lifecycle.borrow().next_due()
    }

    // === Internals ===

    async fn navigate(&self, url: Url, kind: TriggerKind, now: f64) -> Result<NavigationResult, RuntimeError> {
        let request = match self.transitions.begin(url, kind) {
            Ok(request) => request,
            Err(TransitionError::Busy(_)) => return Ok(NavigationResult::Busy),
            Err(e) => {
                tracing::warn!("Navigation not started: {}", e);
                return Ok(NavigationResult::Busy);
            }
        };

        let mut rebuilt = Ok(());
        let outcome = self
            .transitions
            .run(request, &self.page, |page| rebuilt = self.rebuild(page, now))
            .await;
        rebuilt?;
        Ok(NavigationResult::Completed(outcome))
    }

    /// Fresh components for swapped-in landmarks
    fn rebuild(&self, page: &mut Page, now: f64) -> Result<(), RuntimeError> {
        load_previews(&mut page.document)?;
        let lifecycle = LazyLifecycleManager::discover(&mut page.document, &*self.layout, self.config.lazy.clone())?;
        let reveal = ScrollRevealObserver::attach(
            &mut page.document,
            self.config.reveal.clone(),
            self.caps.static_reveal(),
        )?;
        let links = LinkBindings::bind(&page.document);

        *self.lifecycle.borrow_mut() = lifecycle;
        *self.reveal.borrow_mut() = reveal;
        *self.links.borrow_mut() = links;
        self.velocity.borrow_mut().reset();

        self.refresh_page(page, ScrollDirection::Still, now)?;
        Ok(())
    }

    fn refresh(&self, direction: ScrollDirection, now: f64) -> Result<FrameReport, RuntimeError> {
        let mut page = self.page.borrow_mut();
        self.refresh_page(&mut page, direction, now)
    }

    fn refresh_page(&self, page: &mut Page, direction: ScrollDirection, now: f64) -> Result<FrameReport, RuntimeError> {
        let lazy = {
            let mut frame = self.frame(page, now);
            self.lifecycle.borrow_mut().evaluate(&mut frame)?
        };
        let reveal = self.reveal.borrow_mut().observe(
            &mut page.document,
            &*self.layout,
            &page.viewport,
            direction,
            now,
        )?;
        update_back_to_top(page)?;
        Ok(FrameReport { lazy, reveal })
    }

    fn frame<'a>(&'a self, page: &'a mut Page, now: f64) -> Frame<'a> {
        let viewport = page.viewport;
        Frame {
            document: &mut page.document,
            layout: &*self.layout,
            viewport,
            speed: self.velocity.borrow().speed(now),
            motion: self.caps.motion_enabled(),
            now,
        }
    }
}

fn update_back_to_top(page: &mut Page) -> Result<(), DomError> {
    let root = page.document.tree().root();
    let Some(button) = page
        .document
        .query_first(root, &SimpleSelector::Class(BACK_TO_TOP_CLASS.to_string()))
    else {
        return Ok(());
    };

    let show = page.viewport.scroll_y > BACK_TO_TOP_OFFSET_PX;
    let tree = page.document.tree_mut();
    // Only touch the tree on change
    match (show, tree.has_class(button, BACK_TO_TOP_SHOW_CLASS)) {
        (true, false) => tree.add_class(button, BACK_TO_TOP_SHOW_CLASS),
        (false, true) => tree.remove_class(button, BACK_TO_TOP_SHOW_CLASS),
        _ => Ok(()),
    }
}

fn same_resource(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FlowLayout, InstantAnimator, SessionHistory};
    use folio_net::{CacheConfig, LocalBoxFuture, ManualClock, MemoryStorage, NetError, PageCache, PageFetcher};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::rc::Rc;

    struct NoNetwork;

    impl PageFetcher for NoNetwork {
        fn fetch<'a>(&'a self, _url: &'a Url) -> LocalBoxFuture<'a, Result<String, NetError>> {
            Box::pin(std::future::ready(Err(NetError::Network("offline".into()))))
        }
    }

    fn runtime(markup: &str, caps: PlatformCaps) -> SiteRuntime {
        let url = Url::parse("https://folio.test/").unwrap();
        let page = Page::parse(markup, &url, Viewport::new(0.0, 1280.0, 800.0)).unwrap();
        let services = TransitionServices {
            fetcher: Box::new(NoNetwork),
            animator: Box::new(InstantAnimator::new()),
            host: Box::new(Rc::new(SessionHistory::new(url))),
            cache: PageCache::new(
                Box::new(MemoryStorage::session()),
                Box::new(ManualClock::new(0)),
                CacheConfig::default(),
            ),
            session: Box::new(MemoryStorage::session()),
            rng: StdRng::seed_from_u64(3),
        };
        SiteRuntime::new(page, RuntimeConfig::default(), caps, Box::new(FlowLayout::default()), services, 0.0).unwrap()
    }

    #[test]
    fn test_marks_js_enabled_and_caches_page() {
        let runtime = runtime("<main><section>A</section></main>", PlatformCaps::default());
        let page = runtime.page();
        let root = page.document.document_element();
        assert!(page.document.tree().has_class(root, JS_ENABLED_CLASS));
        assert!(runtime.transitions().is_cached(&Url::parse("https://folio.test/").unwrap()));
    }

    #[test]
    fn test_back_to_top_toggles() {
        let runtime = runtime(
            r##"<main data-layout-height="5000"></main><a class="back-to-top" href="#top">Top</a>"##,
            PlatformCaps::default(),
        );
        let shown = |rt: &SiteRuntime| {
            let page = rt.page();
            let button = page.document.elements_by_class(BACK_TO_TOP_CLASS)[0];
            page.document.tree().has_class(button, BACK_TO_TOP_SHOW_CLASS)
        };

        assert!(!shown(&runtime));
        runtime.scroll(301.0, 16.0).unwrap();
        assert!(shown(&runtime));
        runtime.scroll(300.0, 32.0).unwrap();
        assert!(!shown(&runtime));
    }

    #[test]
    fn test_tick_paused_while_hidden() {
        let runtime = runtime(
            r#"<main><div class="lazy-slot" data-layout-height="300"><p>x</p></div></main>"#,
            PlatformCaps::default(),
        );
        // Mounted on attach; settle is pending
        assert_eq!(runtime.lifecycle().pending(), 1);

        runtime.visibility_changed(false, 10.0).unwrap();
        assert!(runtime.tick(5000.0).unwrap().is_empty());
        assert_eq!(runtime.lifecycle().pending(), 1);

        runtime.visibility_changed(true, 6000.0).unwrap();
        assert_eq!(runtime.lifecycle().pending(), 0);
    }

    #[test]
    fn test_static_reveal_without_observer() {
        let caps = PlatformCaps { intersection_observer: false, ..PlatformCaps::default() };
        let runtime = runtime("<main><section>A</section></main>", caps);
        assert!(runtime.reveal().is_static());
    }

    #[test]
    fn test_popstate_same_document_is_ignored() {
        let runtime = runtime("<main></main>", PlatformCaps::default());
        let result = smol::block_on(runtime.popstate(Url::parse("https://folio.test/#work").unwrap(), 0.0));
        assert_eq!(result, Ok(NavigationResult::NotHandled(Ineligible::SameDocumentHash)));
    }
}
