//! Folio Preview - Main Entry Point
//!
//! Loads a site (a local directory or an http(s) origin), attaches the
//! runtime, sweeps the page top to bottom and back, then follows the first
//! internal link and returns with a history step.
//!
//! ```text
//! folio-preview <site-dir | url> [--config runtime.json] [--reduced-motion] [--no-observer]
//! ```

mod animator;

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use folio_engine::{
    FlowLayout, LayoutProvider, LinkClick, NavigationResult, Page, PlatformCaps, RuntimeConfig,
    SessionHistory, SiteRuntime, SlotState, TransitionServices,
};
use folio_engine::dom::{SimpleSelector, Viewport};
use folio_net::{DirectoryLoader, HttpFetcher, MemoryStorage, PageCache, PageFetcher, SystemClock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::animator::TimedAnimator;

const LOCAL_ORIGIN: &str = "http://folio.localhost/";
const FRAME_MS: f64 = 16.0;

struct Args {
    site: String,
    config: Option<PathBuf>,
    caps: PlatformCaps,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut site = None;
    let mut config = None;
    let mut caps = PlatformCaps::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next().context("--config needs a path")?)),
            "--reduced-motion" => caps.reduced_motion = true,
            "--no-observer" => caps.intersection_observer = false,
            other if other.starts_with("--") => bail!("unknown option {other}"),
            other => site = Some(other.to_string()),
        }
    }

    Ok(Args {
        site: site.unwrap_or_else(|| ".".to_string()),
        config,
        caps,
    })
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            RuntimeConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => RuntimeConfig::default(),
    };

    let (start, fetcher): (Url, Box<dyn PageFetcher>) = match Url::parse(&args.site) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => (url, Box::new(HttpFetcher::new()?)),
        _ => (
            Url::parse(LOCAL_ORIGIN)?,
            Box::new(DirectoryLoader::new(&args.site)),
        ),
    };

    tracing::info!("Starting Folio preview of {}", args.site);
    smol::block_on(preview(start, fetcher, config, args.caps))
}

async fn preview(start: Url, fetcher: Box<dyn PageFetcher>, config: RuntimeConfig, caps: PlatformCaps) -> Result<()> {
    let html = fetcher.fetch(&start).await.with_context(|| format!("loading {start}"))?;
    let page = Page::parse(&html, &start, Viewport::new(0.0, 1280.0, 800.0))?;

    let history = Rc::new(SessionHistory::new(start.clone()));
    let animator = Rc::new(TimedAnimator::new());
    let local = MemoryStorage::persistent(std::env::temp_dir().join("folio-preview-local.json"));
    let services = TransitionServices {
        fetcher,
        animator: Box::new(animator.clone()),
        host: Box::new(history.clone()),
        cache: PageCache::new(Box::new(local), Box::new(SystemClock), config.cache.clone()),
        session: Box::new(MemoryStorage::session()),
        rng: StdRng::from_entropy(),
    };

    let layout = FlowLayout::default();
    let epoch = Instant::now();
    let now = || epoch.elapsed().as_secs_f64() * 1000.0;
    let runtime = SiteRuntime::load(page, config, caps, Box::new(layout), services, now()).await?;

    // Virtual time from here on
    let mut clock = now();
    sweep(&runtime, &layout, &mut clock)?;
    report(&runtime);

    let first_link = {
        let page = runtime.page();
        let links = runtime.links();
        let anchors = page
            .document
            .query_all(page.document.tree().root(), &SimpleSelector::Tag("a".to_string()));
        page.url().and_then(|current| {
            anchors
                .into_iter()
                .find(|&a| links.resolve(&page.document, &LinkClick::primary(a), &current).is_ok())
        })
    };

    let Some(link) = first_link else {
        println!("No internal links to follow");
        return Ok(());
    };

    match runtime.click(LinkClick::primary(link), clock).await? {
        NavigationResult::Completed(outcome) => println!("Navigation: {outcome:?}"),
        other => println!("Navigation not performed: {other:?}"),
    }
    report(&runtime);

    if let Some(back) = history.back() {
        clock += 1000.0;
        let result = runtime.popstate(back, clock).await?;
        println!("Back: {result:?}");
    }
    println!("Overlay rests on: {}", animator.current_path());
    Ok(())
}

/// Scroll to the bottom and back a quarter viewport per frame
fn sweep(runtime: &SiteRuntime, layout: &FlowLayout, clock: &mut f64) -> Result<()> {
    let (height, step) = {
        let page = runtime.page();
        let body = page.document.body();
        let height = layout.rect(&page.document, body).map_or(0.0, |r| r.height);
        (height, page.viewport.height / 4.0)
    };
    let bottom = (height - runtime.viewport().height).max(0.0);
    if step <= 0.0 {
        bail!("viewport has no height");
    }

    let mut positions: Vec<f64> = Vec::new();
    let mut y = 0.0;
    while y < bottom {
        y = (y + step).min(bottom);
        positions.push(y);
    }
    positions.extend(positions.clone().into_iter().rev().skip(1));
    positions.push(0.0);

    for y in positions {
        *clock += FRAME_MS;
        let frame = runtime.scroll(y, *clock)?;
        if !frame.lazy.is_empty() {
            tracing::debug!("y={} mounted {:?} unmounted {:?}", y, frame.lazy.mounted, frame.lazy.unmounted);
        }
        runtime.tick(*clock)?;
    }

    // Let the last fades finish
    while let Some(due) = runtime.next_due() {
        *clock = clock.max(due);
        runtime.tick(*clock)?;
    }
    Ok(())
}

fn report(runtime: &SiteRuntime) {
    let page = runtime.page();
    let lifecycle = runtime.lifecycle();
    let mounted = lifecycle
        .slots()
        .iter()
        .filter(|s| s.state() == SlotState::Mounted)
        .count();

    println!("Page: {} ({})", page.title(), page.document.url());
    println!(
        "  lazy slots: {} ({} mounted, next unlock {})",
        lifecycle.len(),
        mounted,
        lifecycle.next_allow_index()
    );
    println!(
        "  reveal targets: {} ({})",
        runtime.reveal().targets().len(),
        if runtime.reveal().is_static() { "static" } else { "observed" }
    );
    println!("  links: {}", runtime.links().len());
}
