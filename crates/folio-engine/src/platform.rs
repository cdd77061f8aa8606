//! Platform seams
//!
//! The runtime does not own layout, the tween engine, or the browser's
//! history and location. Each is a trait here, with a headless
//! implementation used by the preview binary and the tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use folio_dom::{Document, DomTree, NodeId, Rect};
use folio_net::LocalBoxFuture;
use url::Url;

use crate::wipe::WipeDirection;

// === Capabilities ===

/// What the host platform offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCaps {
    /// User asked for reduced motion
    pub reduced_motion: bool,
    /// Geometry observation is available
    pub intersection_observer: bool,
    /// A tween engine is available
    pub animations: bool,
}

impl Default for PlatformCaps {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            intersection_observer: true,
            animations: true,
        }
    }
}

impl PlatformCaps {
    /// Animate fades and wipes
    pub fn motion_enabled(&self) -> bool {
        self.animations && !self.reduced_motion
    }

    /// Show every reveal target up front instead of observing
    pub fn static_reveal(&self) -> bool {
        self.reduced_motion || !self.intersection_observer
    }
}

// === Layout ===

/// Source of element geometry
pub trait LayoutProvider {
    /// Document-space box of `node`, or `None` if it is not laid out
    fn rect(&self, document: &Document, node: NodeId) -> Option<Rect>;
}

impl<L: LayoutProvider + ?Sized> LayoutProvider for Rc<L> {
    fn rect(&self, document: &Document, node: NodeId) -> Option<Rect> {
        (**self).rect(document, node)
    }
}

/// Explicit per-node rects, editable between evaluations
#[derive(Debug, Default)]
pub struct StaticLayout {
    rects: RefCell<HashMap<NodeId, Rect>>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, node: NodeId, rect: Rect) {
        self.rects.borrow_mut().insert(node, rect);
    }

    pub fn remove(&self, node: NodeId) {
        self.rects.borrow_mut().remove(&node);
    }

    pub fn clear(&self) {
        self.rects.borrow_mut().clear();
    }
}

impl LayoutProvider for StaticLayout {
    fn rect(&self, _document: &Document, node: NodeId) -> Option<Rect> {
        self.rects.borrow().get(&node).copied()
    }
}

/// Block flow: every element in `<body>` stacks vertically
///
/// An element's height is its `data-layout-height`, else the sum of its
/// element children, else its `data-placeholder-height` when empty, else
/// the default block height.
#[derive(Debug, Clone, Copy)]
pub struct FlowLayout {
    pub width: f64,
    pub default_height: f64,
}

impl Default for FlowLayout {
    fn default() -> Self {
        Self {
            width: 1280.0,
            default_height: 120.0,
        }
    }
}

const NOT_RENDERED: &[&str] = &["script", "style", "template", "noscript", "link", "meta"];

impl FlowLayout {
    fn height_of(&self, tree: &DomTree, id: NodeId) -> f64 {
        let Some(elem) = tree.element(id) else {
            return 0.0;
        };
        if NOT_RENDERED.contains(&elem.tag.as_str()) {
            return 0.0;
        }
        if let Some(h) = parse_px(elem.get_attr("data-layout-height")) {
            return h;
        }

        let children: Vec<NodeId> = tree
            .child_ids(id)
            .filter(|&c| tree.element(c).is_some())
            .collect();
        if !children.is_empty() {
            return children.iter().map(|&c| self.height_of(tree, c)).sum();
        }

        parse_px(elem.get_attr("data-placeholder-height")).unwrap_or(self.default_height)
    }
}

impl LayoutProvider for FlowLayout {
    fn rect(&self, document: &Document, node: NodeId) -> Option<Rect> {
        let tree = document.tree();
        tree.element(node)?;
        let body = document.body();
        if !body.is_valid() || !tree.is_inclusive_ancestor(body, node) {
            return None;
        }

        let mut y = 0.0;
        let mut current = node;
        while current != body {
            let parent = tree.parent(current)?;
            y += tree
                .child_ids(parent)
                .take_while(|&sibling| sibling != current)
                .map(|sibling| self.height_of(tree, sibling))
                .sum::<f64>();
            current = parent;
        }

        Some(Rect::from_xywh(0.0, y, self.width, self.height_of(tree, node)))
    }
}

fn parse_px(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .trim_end_matches("px")
        .parse::<f64>()
        .ok()
        .filter(|h| h.is_finite() && *h >= 0.0)
}

// === Animation ===

/// Which half of a transition a morph belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphPhase {
    Cover,
    Reveal,
}

/// One overlay path animation
#[derive(Debug, Clone, PartialEq)]
pub struct Morph {
    pub phase: MorphPhase,
    pub direction: WipeDirection,
    pub keyframes: [String; 3],
    pub duration: Duration,
}

impl Morph {
    pub fn cover(direction: WipeDirection, duration: Duration) -> Self {
        Self {
            phase: MorphPhase::Cover,
            direction,
            keyframes: direction.cover_keyframes(),
            duration,
        }
    }

    pub fn reveal(direction: WipeDirection, duration: Duration) -> Self {
        Self {
            phase: MorphPhase::Reveal,
            direction,
            keyframes: direction.reveal_keyframes(),
            duration,
        }
    }
}

/// Tween engine driving the overlay path
pub trait Animator {
    /// Jump to a path without animating
    fn set_path(&self, path: &str);

    /// Animate through the keyframes; resolves when done
    fn morph(&self, morph: Morph) -> LocalBoxFuture<'_, ()>;
}

impl<A: Animator + ?Sized> Animator for Rc<A> {
    fn set_path(&self, path: &str) {
        (**self).set_path(path)
    }

    fn morph(&self, morph: Morph) -> LocalBoxFuture<'_, ()> {
        (**self).morph(morph)
    }
}

/// Completes every morph immediately and records it
#[derive(Debug, Default)]
pub struct InstantAnimator {
    morphs: RefCell<Vec<Morph>>,
    path: RefCell<Option<String>>,
}

impl InstantAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Morphs played so far
    pub fn morphs(&self) -> Vec<Morph> {
        self.morphs.borrow().clone()
    }

    /// Path the overlay currently shows
    pub fn current_path(&self) -> Option<String> {
        self.path.borrow().clone()
    }
}

impl Animator for InstantAnimator {
    fn set_path(&self, path: &str) {
        *self.path.borrow_mut() = Some(path.to_string());
    }

    fn morph(&self, morph: Morph) -> LocalBoxFuture<'_, ()> {
        tracing::trace!("Overlay {:?} {:?} over {:?}", morph.phase, morph.direction, morph.duration);
        *self.path.borrow_mut() = Some(morph.keyframes[2].clone());
        self.morphs.borrow_mut().push(morph);
        Box::pin(std::future::ready(()))
    }
}

// === Navigation ===

/// The browser's history and location
pub trait NavigationHost {
    /// Push a same-document history entry
    fn push_history(&self, url: &Url, title: &str);

    /// Full page load, abandoning the current document
    fn navigate(&self, url: &Url);

    /// Jump to the top of the page
    fn scroll_to_top(&self);
}

impl<H: NavigationHost + ?Sized> NavigationHost for Rc<H> {
    fn push_history(&self, url: &Url, title: &str) {
        (**self).push_history(url, title)
    }

    fn navigate(&self, url: &Url) {
        (**self).navigate(url)
    }

    fn scroll_to_top(&self) {
        (**self).scroll_to_top()
    }
}

/// History entry
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub url: Url,
    pub title: String,
}

/// In-memory session history with back/forward
#[derive(Debug)]
pub struct SessionHistory {
    entries: RefCell<Vec<HistoryEntry>>,
    current: Cell<usize>,
    full_loads: RefCell<Vec<Url>>,
    scroll_resets: Cell<usize>,
}

impl SessionHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: RefCell::new(vec![HistoryEntry { url: initial, title: String::new() }]),
            current: Cell::new(0),
            full_loads: RefCell::new(Vec::new()),
            scroll_resets: Cell::new(0),
        }
    }

    /// Step back; returns the URL a popstate event would carry
    pub fn back(&self) -> Option<Url> {
        self.go(-1)
    }

    /// Step forward
    pub fn forward(&self) -> Option<Url> {
        self.go(1)
    }

    /// Move by `delta` entries
    pub fn go(&self, delta: isize) -> Option<Url> {
        let target = self.current.get().checked_add_signed(delta)?;
        let entries = self.entries.borrow();
        let entry = entries.get(target)?;
        self.current.set(target);
        Some(entry.url.clone())
    }

    pub fn current(&self) -> HistoryEntry {
        self.entries.borrow()[self.current.get()].clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Full page loads requested so far
    pub fn full_loads(&self) -> Vec<Url> {
        self.full_loads.borrow().clone()
    }

    pub fn scroll_resets(&self) -> usize {
        self.scroll_resets.get()
    }
}

impl NavigationHost for SessionHistory {
    fn push_history(&self, url: &Url, title: &str) {
        let mut entries = self.entries.borrow_mut();
        // Drop forward history
        entries.truncate(self.current.get() + 1);
        entries.push(HistoryEntry { url: url.clone(), title: title.to_string() });
        self.current.set(entries.len() - 1);
    }

    fn navigate(&self, url: &Url) {
        tracing::info!("Full page load: {}", url);
        self.full_loads.borrow_mut().push(url.clone());
    }

    fn scroll_to_top(&self) {
        self.scroll_resets.set(self.scroll_resets.get() + 1);
    }
}
