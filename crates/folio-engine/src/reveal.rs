//! Scroll reveal
//!
//! Static sections fade in as they cross the reveal line near the bottom of
//! the viewport. Driven purely by geometry checks on scroll/resize; there
//! are no timers here.

use folio_dom::{Document, DomError, NodeId, SimpleSelector, Viewport};

use crate::config::RevealConfig;
use crate::observer::{IntersectionObserver, ObserverOptions};
use crate::platform::LayoutProvider;
use crate::velocity::ScrollDirection;

/// Marks an element as a reveal target
pub const MARKER_CLASS: &str = "scroll-reveal";
/// Applied once the element has crossed the reveal line
pub const VISIBLE_CLASS: &str = "is-visible";
/// Suppresses the fade for elements revealed while scrolling up
pub const INSTANT_CLASS: &str = "no-reveal";

/// Changes made by one observation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealPass {
    pub revealed: Vec<NodeId>,
    pub hidden: Vec<NodeId>,
}

/// Toggles the visible class on reveal targets
#[derive(Debug)]
pub struct ScrollRevealObserver {
    config: RevealConfig,
    targets: Vec<NodeId>,
    observer: Option<IntersectionObserver>,
    instant: Vec<NodeId>,
}

impl ScrollRevealObserver {
    /// Find targets and mark them. In static mode every target is shown
    /// immediately and nothing is observed.
    pub fn attach(document: &mut Document, config: RevealConfig, static_mode: bool) -> Result<Self, DomError> {
        let targets = find_targets(document, &config);
        let tree = document.tree_mut();
        for &target in &targets {
            tree.add_class(target, MARKER_CLASS)?;
            if static_mode {
                tree.add_class(target, VISIBLE_CLASS)?;
            }
        }

        let observer = (!static_mode).then(|| {
            let mut observer = IntersectionObserver::new(ObserverOptions {
                bottom_margin: config.bottom_margin,
                threshold: config.threshold,
            });
            for &target in &targets {
                observer.observe(target);
            }
            observer
        });

        tracing::debug!(
            "Scroll reveal on {} targets ({})",
            targets.len(),
            if static_mode { "static" } else { "observed" }
        );

        Ok(Self {
            config,
            targets,
            observer,
            instant: Vec::new(),
        })
    }

    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// No observer attached; everything is already visible
    pub fn is_static(&self) -> bool {
        self.observer.is_none()
    }

    /// Targets still being watched
    pub fn observed(&self) -> usize {
        self.observer.as_ref().map_or(0, IntersectionObserver::len)
    }

    /// Run one geometry check and apply class changes
    pub fn observe(
        &mut self,
        document: &mut Document,
        layout: &dyn LayoutProvider,
        viewport: &Viewport,
        direction: ScrollDirection,
        now: f64,
    ) -> Result<RevealPass, DomError> {
        let mut pass = RevealPass::default();

        // Instant reveals only last for one pass
        for target in std::mem::take(&mut self.instant) {
            document.tree_mut().remove_class(target, INSTANT_CLASS)?;
        }

        let Some(observer) = self.observer.as_mut() else {
            return Ok(pass);
        };

        let entries = {
            let doc: &Document = document;
            observer.check_intersections(viewport, |node| layout.rect(doc, node), now)
        };

        let tree = document.tree_mut();
        for entry in entries {
            let was_visible = tree.has_class(entry.target, VISIBLE_CLASS);
            // Shown once enough of it enters; kept until its top drops back below the line
            let revealed = if was_visible {
                entry.top_crossed
            } else {
                entry.is_intersecting || entry.is_above
            };

            if revealed {
                if !was_visible {
                    if direction == ScrollDirection::Up {
                        tree.add_class(entry.target, INSTANT_CLASS)?;
                        self.instant.push(entry.target);
                    }
                    tree.add_class(entry.target, VISIBLE_CLASS)?;
                    pass.revealed.push(entry.target);
                }
                if self.config.once {
                    observer.unobserve(entry.target);
                }
            } else if was_visible {
                tree.remove_class(entry.target, VISIBLE_CLASS)?;
                pass.hidden.push(entry.target);
            }
        }

        Ok(pass)
    }
}

fn find_targets(document: &Document, config: &RevealConfig) -> Vec<NodeId> {
    let selectors: Vec<SimpleSelector> = config
        .targets
        .iter()
        .filter_map(|s| SimpleSelector::parse(s))
        .collect();
    let root = document.landmark(&config.root).unwrap_or_else(|| document.body());
    if !root.is_valid() {
        return Vec::new();
    }

    document
        .tree()
        .descendants(root)
        .filter(|(_, node)| {
            node.as_element()
                .is_some_and(|e| selectors.iter().any(|s| s.matches(e)))
        })
        .map(|(id, _)| id)
        .collect()
}
