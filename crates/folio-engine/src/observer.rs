//! Intersection Observer
//!
//! Geometry-driven visibility for a set of targets against the viewport.
//! The root is the viewport shrunk from the bottom by a margin; an entry is
//! reported only when a target's state changes (and once on first check).

use std::collections::HashMap;

use folio_dom::{NodeId, Rect, Viewport};

/// Observer options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the viewport height cut off the bottom of the root
    pub bottom_margin: f64,
    /// Visible fraction at which a target counts as intersecting
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            bottom_margin: 0.0,
            threshold: 0.0,
        }
    }
}

/// Intersection entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    /// Client-space box of the target
    pub bounding_client_rect: Rect,
    /// Visible fraction, relative to the smaller of target and root height
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    /// Target lies entirely above the root (scrolled past)
    pub is_above: bool,
    /// Target's top edge is above the root's bottom edge
    pub top_crossed: bool,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    intersecting: bool,
    above: bool,
    top_crossed: bool,
}

/// Intersection observer
#[derive(Debug, Default)]
pub struct IntersectionObserver {
    options: ObserverOptions,
    observed: HashMap<NodeId, Option<Observed>>,
}

impl IntersectionObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            observed: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Observe an element
    pub fn observe(&mut self, target: NodeId) {
        self.observed.insert(target, None);
    }

    /// Stop observing
    pub fn unobserve(&mut self, target: NodeId) {
        self.observed.remove(&target);
    }

    /// Disconnect all
    pub fn disconnect(&mut self) {
        self.observed.clear();
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }

    /// Client-space root box
    pub fn root_rect(&self, viewport: &Viewport) -> Rect {
        let height = viewport.height * (1.0 - self.options.bottom_margin);
        Rect::from_xywh(0.0, 0.0, viewport.width, height.max(0.0))
    }

    /// Check every observed target. `rect_of` yields document-space boxes;
    /// targets without one are skipped.
    pub fn check_intersections(
        &mut self,
        viewport: &Viewport,
        mut rect_of: impl FnMut(NodeId) -> Option<Rect>,
        time: f64,
    ) -> Vec<IntersectionEntry> {
        let root = self.root_rect(viewport);
        let mut entries = Vec::new();

        for (&target, last) in self.observed.iter_mut() {
            let Some(rect) = rect_of(target) else {
                continue;
            };
            let client = viewport.to_client(rect);

            // Vertical extent only; horizontal layout never hides a section
            let visible = (client.bottom().min(root.bottom()) - client.top().max(root.top())).max(0.0);
            let basis = client.height.min(root.height);
            let ratio = if basis > 0.0 { (visible / basis).min(1.0) } else { 0.0 };
            let intersecting = visible > 0.0 && ratio >= self.options.threshold;
            let above = client.bottom() <= root.top();
            let top_crossed = client.top() < root.bottom();

            let state = Observed { intersecting, above, top_crossed };
            if *last == Some(state) {
                continue;
            }
            *last = Some(state);

            entries.push(IntersectionEntry {
                target,
                bounding_client_rect: client,
                intersection_ratio: ratio,
                is_intersecting: intersecting,
                is_above: above,
                top_crossed,
                time,
            });
        }

        // HashMap order is arbitrary; callers get document order
        entries.sort_by_key(|e| e.target);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observer() -> (IntersectionObserver, NodeId) {
        let mut observer = IntersectionObserver::new(ObserverOptions { bottom_margin: 0.1, threshold: 0.15 });
        let node = NodeId::from_index(1);
        observer.observe(node);
        (observer, node)
    }

    #[test]
    fn test_reports_on_change_only() {
        let (mut observer, node) = observer();
        let viewport = Viewport::new(0.0, 800.0, 600.0);
        let rect = Rect::from_xywh(0.0, 100.0, 800.0, 200.0);

        let entries = observer.check_intersections(&viewport, |_| Some(rect), 0.0);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].target, node);

        assert!(observer.check_intersections(&viewport, |_| Some(rect), 16.0).is_empty());
    }

    #[test]
    fn test_bottom_margin_and_threshold() {
        let (mut observer, _) = observer();
        let viewport = Viewport::new(0.0, 800.0, 1000.0);
        // Root ends at 900; 20px of a 200px target is 10%, below threshold
        let rect = Rect::from_xywh(0.0, 880.0, 800.0, 200.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 0.0);
        assert!(!entries[0].is_intersecting);

        let rect = Rect::from_xywh(0.0, 860.0, 800.0, 200.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 1.0);
        assert!(entries[0].is_intersecting);
        assert!((entries[0].intersection_ratio - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_tall_targets_measure_against_root() {
        let (mut observer, _) = observer();
        let viewport = Viewport::new(0.0, 800.0, 1000.0);
        let rect = Rect::from_xywh(0.0, 700.0, 800.0, 5000.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 0.0);
        assert!(entries[0].is_intersecting);
    }

    #[test]
    fn test_scrolled_past_is_above() {
        let (mut observer, _) = observer();
        let viewport = Viewport::new(2000.0, 800.0, 1000.0);
        let rect = Rect::from_xywh(0.0, 500.0, 800.0, 300.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 0.0);
        assert!(!entries[0].is_intersecting);
        assert!(entries[0].is_above);
        assert!(entries[0].top_crossed);
    }

    #[test]
    fn test_top_edge_against_root_bottom() {
        let (mut observer, _) = observer();
        let viewport = Viewport::new(0.0, 800.0, 1000.0);
        // Root ends at 900
        let rect = Rect::from_xywh(0.0, 900.0, 800.0, 200.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 0.0);
        assert!(!entries[0].top_crossed);

        let rect = Rect::from_xywh(0.0, 890.0, 800.0, 200.0);
        let entries = observer.check_intersections(&viewport, |_| Some(rect), 1.0);
        assert!(entries[0].top_crossed);
        assert!(!entries[0].is_intersecting);
    }

    #[test]
    fn test_unobserve_and_missing_rects() {
        let (mut observer, node) = observer();
        let viewport = Viewport::new(0.0, 800.0, 600.0);
        assert!(observer.check_intersections(&viewport, |_| None, 0.0).is_empty());

        observer.unobserve(node);
        assert!(!observer.is_observing(node));
        assert!(observer.is_empty());
    }
}
