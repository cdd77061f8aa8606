//! Integration tests - full runtime over a small site
//!
//! Tests the complete workflow: HTML → DOM → slots/reveal → click → swap

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use folio_engine::lifecycle::{EMPTY_CLASS, VISIBLE_CLASS};
use folio_engine::net::{
    CacheConfig, DirectoryLoader, LocalBoxFuture, ManualClock, MemoryStorage, NetError, PageCache,
    PageFetcher, StorageArea, Url,
};
use folio_engine::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const ORIGIN: &str = "https://folio.test/";

const HOME: &str = r#"<!DOCTYPE html>
<html><head><title>Home</title></head><body>
<header data-layout-height="100"><nav><a id="to-work" href="/work">Work</a><a id="to-cv" href="/cv.pdf" download>CV</a></nav></header>
<main>
  <section id="intro" data-layout-height="2000">Intro</section>
  <div class="lazy-slot" data-layout-height="600"><p id="one">one</p></div>
  <div class="lazy-slot" data-layout-height="600"><p id="two">two</p></div>
</main>
<footer>Home footer</footer>
</body></html>"#;

const WORK: &str = r#"<!DOCTYPE html>
<html><head><title>Work</title></head><body>
<header><nav><a id="to-home" href="/">Home</a></nav></header>
<main>
  <div class="project-preview" data-preview-src="https://demo.test/"><span class="preview-label">Demo</span></div>
  <div class="lazy-slot" data-layout-height="400"><p>case study</p></div>
</main>
</body></html>"#;

const GROUPED: &str = r#"<main>
  <div class="lazy-slot" data-lazy-group="1" data-layout-height="300"><p>a</p></div>
  <div class="lazy-slot" data-lazy-group="2" data-layout-height="300"><p>b</p></div>
</main>"#;

/// Counts requests reaching the wrapped fetcher
struct Counting<F> {
    inner: F,
    requests: Rc<Cell<usize>>,
}

impl<F: PageFetcher> PageFetcher for Counting<F> {
    fn fetch<'a>(&'a self, url: &'a Url) -> LocalBoxFuture<'a, Result<String, NetError>> {
        self.requests.set(self.requests.get() + 1);
        self.inner.fetch(url)
    }
}

struct Site {
    _dir: tempfile::TempDir,
    runtime: SiteRuntime,
    history: Rc<SessionHistory>,
    animator: Rc<InstantAnimator>,
    requests: Rc<Cell<usize>>,
}

fn site_with(markup: &str, caps: PlatformCaps, session: MemoryStorage) -> Site {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("index.html"), HOME).unwrap();
    fs::write(dir.path().join("work.html"), WORK).unwrap();

    let url = Url::parse(ORIGIN).unwrap();
    let requests = Rc::new(Cell::new(0));
    let history = Rc::new(SessionHistory::new(url.clone()));
    let animator = Rc::new(InstantAnimator::new());
    let services = TransitionServices {
        fetcher: Box::new(Counting {
            inner: DirectoryLoader::new(dir.path()),
            requests: requests.clone(),
        }),
        animator: Box::new(animator.clone()),
        host: Box::new(history.clone()),
        cache: PageCache::new(
            Box::new(MemoryStorage::session()),
            Box::new(ManualClock::new(0)),
            CacheConfig::default(),
        ),
        session: Box::new(session),
        rng: StdRng::seed_from_u64(42),
    };

    let page = Page::parse(markup, &url, folio_engine::dom::Viewport::new(0.0, 1280.0, 800.0)).unwrap();
    let runtime = smol::block_on(SiteRuntime::load(
        page,
        RuntimeConfig::default(),
        caps,
        Box::new(FlowLayout::default()),
        services,
        0.0,
    ))
    .unwrap();

    Site { _dir: dir, runtime, history, animator, requests }
}

fn site(markup: &str) -> Site {
    site_with(markup, PlatformCaps::default(), MemoryStorage::session())
}

fn states(runtime: &SiteRuntime) -> Vec<SlotState> {
    runtime.lifecycle().slots().iter().map(LazySlot::state).collect()
}

fn click(runtime: &SiteRuntime, id: &str) -> LinkClick {
    LinkClick::primary(runtime.page().document.get_element_by_id(id).unwrap())
}

// ============================================================================
// LAZY SLOTS
// ============================================================================

#[test]
fn test_slots_unlock_in_order() {
    let site = site(HOME);
    let runtime = &site.runtime;
    assert_eq!(states(runtime), vec![SlotState::Empty, SlotState::Empty]);

    // Slot 0 starts at 2100; enter threshold is 800 + 200 below the top
    runtime.scroll(1200.0, 16.0).unwrap();
    assert_eq!(states(runtime), vec![SlotState::Mounting, SlotState::Empty]);
    assert_eq!(runtime.lifecycle().next_allow_index(), 1);

    runtime.scroll(1800.0, 32.0).unwrap();
    assert_eq!(states(runtime), vec![SlotState::Mounting, SlotState::Mounting]);

    runtime.tick(2000.0).unwrap();
    assert_eq!(states(runtime), vec![SlotState::Mounted, SlotState::Mounted]);
    let page = runtime.page();
    assert!(page.document.get_element_by_id("two").is_some());
}

#[test]
fn test_placeholders_until_mounted() {
    let site = site(HOME);
    let page = site.runtime.page();
    let slots = page.document.elements_by_class("lazy-slot");
    let tree = page.document.tree();
    for slot in slots {
        assert!(tree.has_class(slot, EMPTY_CLASS));
        assert_eq!(tree.dataset(slot, "placeholderHeight"), Some("600"));
    }
    assert!(page.document.get_element_by_id("one").is_none());
}

#[test]
fn test_second_group_waits_for_first() {
    let site = site(GROUPED);
    let runtime = &site.runtime;
    assert_eq!(states(runtime), vec![SlotState::Mounting, SlotState::Empty]);
    assert!(runtime.lifecycle().gate().is_animating(1));

    // Grouped fade at rest speed is 250 ms
    runtime.tick(249.0).unwrap();
    assert_eq!(states(runtime)[1], SlotState::Empty);

    runtime.tick(250.0).unwrap();
    assert!(runtime.lifecycle().gate().is_mount_completed(1));
    assert_eq!(states(runtime)[1], SlotState::Mounting);
}

#[test]
fn test_repeated_scroll_is_idempotent() {
    let site = site(HOME);
    let runtime = &site.runtime;
    runtime.scroll(1200.0, 16.0).unwrap();
    runtime.tick(1000.0).unwrap();

    let generation = runtime.page().document.tree().generation();
    let report = runtime.scroll(1200.0, 1500.0).unwrap();
    assert!(report.lazy.is_empty());
    runtime.tick(1800.0).unwrap();
    assert_eq!(runtime.page().document.tree().generation(), generation);
}

#[test]
fn test_reduced_motion_settles_immediately() {
    let caps = PlatformCaps { reduced_motion: true, ..PlatformCaps::default() };
    let site = site_with(GROUPED, caps, MemoryStorage::session());
    let runtime = &site.runtime;

    runtime.tick(0.0).unwrap();
    assert_eq!(states(runtime), vec![SlotState::Mounted, SlotState::Mounted]);
    assert!(runtime.reveal().is_static());

    let page = runtime.page();
    let slot = runtime.lifecycle().slots()[0].node();
    assert!(page.document.tree().has_class(slot, VISIBLE_CLASS));
}

// ============================================================================
// NAVIGATION
// ============================================================================

#[test]
fn test_click_swaps_page() {
    let site = site(HOME);
    let runtime = &site.runtime;
    let result = smol::block_on(runtime.click(click(runtime, "to-work"), 100.0)).unwrap();

    let work = Url::parse("https://folio.test/work").unwrap();
    assert_eq!(
        result,
        NavigationResult::Completed(TransitionOutcome::Swapped { url: work.clone(), from_cache: false })
    );
    assert_eq!(site.requests.get(), 1);
    assert_eq!(site.history.current().url, work);
    assert!(runtime.transitions().is_idle());

    let page = runtime.page();
    assert_eq!(page.title(), "Work");
    assert_eq!(page.document.url(), work.as_str());
    // Footer missing from the fetched page is left alone
    let footer = page.document.landmark("footer").unwrap();
    assert_eq!(page.document.tree().text_content(footer), "Home footer");
    drop(page);

    // Components were rebuilt for the new content
    assert_eq!(runtime.lifecycle().len(), 1);
    assert_eq!(runtime.links().len(), 1);
    let page = runtime.page();
    let preview = page.document.elements_by_class("project-preview")[0];
    assert_eq!(page.document.tree().dataset(preview, "loaded"), Some("true"));
}

#[test]
fn test_cached_page_skips_network() {
    let site = site(HOME);
    let runtime = &site.runtime;
    smol::block_on(runtime.click(click(runtime, "to-work"), 0.0)).unwrap();
    assert_eq!(site.requests.get(), 1);

    // Home was cached on attach
    let result = smol::block_on(runtime.click(click(runtime, "to-home"), 1000.0)).unwrap();
    assert_eq!(
        result,
        NavigationResult::Completed(TransitionOutcome::Swapped {
            url: Url::parse(ORIGIN).unwrap(),
            from_cache: true,
        })
    );
    assert_eq!(site.requests.get(), 1);
}

#[test]
fn test_failed_fetch_loads_page_directly() {
    let markup = r#"<main><a id="gone" href="/gone">Gone</a></main>"#;
    let site = site(markup);
    let runtime = &site.runtime;
    let generation = runtime.page().document.tree().generation();

    let result = smol::block_on(runtime.click(click(runtime, "gone"), 0.0)).unwrap();
    let gone = Url::parse("https://folio.test/gone").unwrap();
    assert!(matches!(
        result,
        NavigationResult::Completed(TransitionOutcome::FullNavigation { ref url, .. }) if *url == gone
    ));
    assert_eq!(site.history.full_loads(), vec![gone]);
    assert_eq!(site.history.len(), 1);
    assert_eq!(runtime.page().document.tree().generation(), generation);
}

#[test]
fn test_ineligible_clicks_left_to_browser() {
    let site = site(HOME);
    let runtime = &site.runtime;
    let result = smol::block_on(runtime.click(click(runtime, "to-cv"), 0.0)).unwrap();
    assert_eq!(result, NavigationResult::NotHandled(Ineligible::Download));
    assert_eq!(site.requests.get(), 0);
    assert!(site.animator.morphs().is_empty());
}

#[test]
fn test_busy_controller_drops_navigation() {
    let site = site(HOME);
    let runtime = &site.runtime;
    runtime
        .transitions()
        .begin(Url::parse("https://folio.test/work").unwrap(), TriggerKind::Link)
        .unwrap();

    let result = smol::block_on(runtime.click(click(runtime, "to-work"), 0.0)).unwrap();
    assert_eq!(result, NavigationResult::Busy);
    assert_eq!(site.requests.get(), 0);
}

#[test]
fn test_back_navigation_does_not_push_history() {
    let site = site(HOME);
    let runtime = &site.runtime;
    smol::block_on(runtime.click(click(runtime, "to-work"), 0.0)).unwrap();
    assert_eq!(site.history.len(), 2);

    let back = site.history.back().unwrap();
    let result = smol::block_on(runtime.popstate(back, 1000.0)).unwrap();
    assert!(matches!(result, NavigationResult::Completed(TransitionOutcome::Swapped { .. })));
    assert_eq!(site.history.len(), 2);
    assert_eq!(runtime.page().title(), "Home");
}

#[test]
fn test_pending_reveal_resumes_on_load() {
    let mut session = MemoryStorage::session();
    session.set_item("folio:transition", r#"{"direction":"top"}"#).unwrap();
    let site = site_with(HOME, PlatformCaps::default(), session);

    let morphs = site.animator.morphs();
    assert_eq!(morphs.len(), 1);
    assert_eq!(morphs[0].phase, MorphPhase::Reveal);
    assert_eq!(morphs[0].direction, WipeDirection::Top);
    assert_eq!(site.animator.current_path(), Some(WipeDirection::Top.flat_path()));
}

#[test]
fn test_reduced_motion_wipes_take_no_time() {
    let caps = PlatformCaps { reduced_motion: true, ..PlatformCaps::default() };
    let site = site_with(HOME, caps, MemoryStorage::session());
    let runtime = &site.runtime;
    smol::block_on(runtime.click(click(runtime, "to-work"), 0.0)).unwrap();

    let morphs = site.animator.morphs();
    assert_eq!(morphs.len(), 2);
    assert!(morphs.iter().all(|m| m.duration.is_zero()));
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_from_json_overrides() {
    let config = RuntimeConfig::from_json(
        r#"{"lazy": {"enter_lead_px": 400}, "transition": {"duration_ms": 500}}"#,
    )
    .unwrap();
    assert_eq!(config.lazy.enter_lead_px, 400.0);
    assert_eq!(config.transition.duration_ms, 500);
    assert_eq!(config.reveal, RevealConfig::default());
}
