//! Lazy Lifecycle Manager
//!
//! Decides, per slot and per evaluation, whether below-the-fold content
//! should exist in the document. Rules, in the order they are checked:
//!
//! - slots unlock strictly left to right: slot `i` may mount only once
//!   slot `i - 1` has mounted at least once
//! - a slot mounts when it is neither fully below the enter threshold
//!   (viewport bottom plus a lead distance) nor fully above the viewport
//! - grouped slots additionally ask the [`RevealGroupGate`]
//!
//! Fades are CSS transitions; the manager only sets the duration and
//! schedules the matching continuation on its [`TimerQueue`].

use std::time::Duration;

use folio_dom::{Document, DomTree, NodeId, Viewport};

use crate::config::LazyConfig;
use crate::gate::RevealGroupGate;
use crate::platform::LayoutProvider;
use crate::slot::{LazySlot, LifecycleError, SlotState};
use crate::style::set_style_property;
use crate::timers::TimerQueue;

/// Marker class of a slot showing its placeholder
pub const EMPTY_CLASS: &str = "lazy-empty";
/// Class that fades slot content in
pub const VISIBLE_CLASS: &str = "lazy-visible";
/// Class that fades slot content out
pub const FADING_CLASS: &str = "is-fading";

/// Everything one evaluation needs from the outside
pub struct Frame<'a> {
    pub document: &'a mut Document,
    pub layout: &'a dyn LayoutProvider,
    pub viewport: Viewport,
    /// Current scroll speed in px/ms
    pub speed: f64,
    /// Fades run with zero duration when false
    pub motion: bool,
    /// Event time in ms
    pub now: f64,
}

/// What one evaluation changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub mounted: Vec<usize>,
    pub unmounted: Vec<usize>,
}

impl Evaluation {
    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty() && self.unmounted.is_empty()
    }

    pub(crate) fn merge(&mut self, other: Evaluation) {
        self.mounted.extend(other.mounted);
        self.unmounted.extend(other.unmounted);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    SettleMount { slot: usize, epoch: u64 },
    GroupMounted { group: u32, activation: u64 },
    ClearContent { slot: usize, epoch: u64 },
}

/// Owner of every lazy slot on the page
#[derive(Debug)]
pub struct LazyLifecycleManager {
    config: LazyConfig,
    slots: Vec<LazySlot>,
    gate: RevealGroupGate,
    next_allow_index: usize,
    timers: TimerQueue<Continuation>,
    last_evaluated: Option<f64>,
}

impl LazyLifecycleManager {
    /// Find slots, capture their markup and height, and strip them to placeholders
    pub fn discover(
        document: &mut Document,
        layout: &dyn LayoutProvider,
        config: LazyConfig,
    ) -> Result<Self, LifecycleError> {
        let mut slots: Vec<LazySlot> = Vec::new();
        let mut gate = RevealGroupGate::new();

        for node in document.elements_by_class(&config.slot_class) {
            let tree = document.tree();
            if slots.iter().any(|s| tree.is_inclusive_ancestor(s.node(), node)) {
                tracing::warn!("Ignoring lazy slot nested inside another slot");
                continue;
            }

            let content = folio_html::inner_html(tree, node);
            let height = layout.rect(document, node).map(|r| r.height).unwrap_or(0.0);
            let group = tree
                .dataset(node, &config.group_key)
                .and_then(|g| g.trim().parse::<u32>().ok())
                .filter(|&g| g > 0);
            if let Some(group) = group {
                gate.register(group);
            }

            slots.push(LazySlot::new(slots.len(), node, content, height, group));
        }

        for slot in &slots {
            show_placeholder(document.tree_mut(), slot)?;
        }

        tracing::debug!(
            "Discovered {} lazy slots in {} groups",
            slots.len(),
            gate.groups().count()
        );

        Ok(Self {
            config,
            slots,
            gate,
            next_allow_index: 0,
            timers: TimerQueue::new(),
            last_evaluated: None,
        })
    }

    pub fn slots(&self) -> &[LazySlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&LazySlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Highest slot index currently allowed to mount
    pub fn next_allow_index(&self) -> usize {
        self.next_allow_index
    }

    pub fn gate(&self) -> &RevealGroupGate {
        &self.gate
    }

    /// Continuations waiting for their due time
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Earliest continuation due time
    pub fn next_due(&self) -> Option<f64> {
        self.timers.next_due()
    }

    /// Inspect every slot in index order and mount, unmount or leave it.
    ///
    /// Idempotent: with unchanged geometry a second call touches nothing.
    pub fn evaluate(&mut self, frame: &mut Frame<'_>) -> Result<Evaluation, LifecycleError> {
        let mut report = Evaluation::default();

        for index in 0..self.slots.len() {
            let node = self.slots[index].node();
            let Some(rect) = frame.layout.rect(frame.document, node) else {
                continue;
            };
            let client = frame.viewport.to_client(rect);
            let below = client.top() > frame.viewport.height + self.config.enter_lead_px;
            let above = client.bottom() < 0.0;
            let in_range = !below && !above;

            match self.slots[index].state() {
                SlotState::Empty | SlotState::Unmounting if in_range && self.can_mount(index) => {
                    self.mount(index, frame)?;
                    report.mounted.push(index);
                }
                SlotState::Mounted if !in_range && self.can_unmount(index) => {
                    self.unmount(index, frame)?;
                    report.unmounted.push(index);
                }
                _ => {}
            }
        }

        self.last_evaluated = Some(frame.now);
        Ok(report)
    }

    /// Fire due continuations, then re-evaluate if any of them changed
    /// state or the fallback interval has passed.
    pub fn tick(&mut self, frame: &mut Frame<'_>) -> Result<Evaluation, LifecycleError> {
        let mut report = Evaluation::default();
        let fallback_due = self
            .last_evaluated
            .is_none_or(|t| frame.now - t >= self.config.fallback_interval_ms as f64);

        // Zero-length fades schedule continuations due immediately
        let max_rounds = self.slots.len() * 4 + 4;
        let mut changed = false;
        for _ in 0..max_rounds {
            let due = self.timers.drain_due(frame.now);
            if due.is_empty() {
                break;
            }
            let mut round_changed = false;
            for continuation in due {
                round_changed |= self.fire(continuation, frame)?;
            }
            if !round_changed {
                break;
            }
            changed = true;
            report.merge(self.evaluate(frame)?);
        }

        if !changed && fallback_due {
            report.merge(self.evaluate(frame)?);
        }
        Ok(report)
    }

    fn can_mount(&self, index: usize) -> bool {
        let slot = &self.slots[index];
        index <= self.next_allow_index
            && (index == 0 || self.slots[index - 1].ever_mounted())
            && slot.group().is_none_or(|g| self.gate.can_mount(g))
    }

    fn can_unmount(&self, index: usize) -> bool {
        self.slots[index].group().is_none_or(|g| self.gate.can_unmount(g))
    }

    fn fade_for(&self, index: usize, frame: &Frame<'_>) -> Duration {
        if !frame.motion {
            return Duration::ZERO;
        }
        let policy = match self.slots[index].group() {
            Some(_) => &self.config.grouped_fade,
            None => &self.config.fade,
        };
        policy.duration_for(frame.speed)
    }

    fn mount(&mut self, index: usize, frame: &mut Frame<'_>) -> Result<(), LifecycleError> {
        let fade = self.fade_for(index, frame);
        let first_mount = !self.slots[index].ever_mounted();
        let from = self.slots[index].begin_mount()?;
        let slot = &self.slots[index];
        let node = slot.node();
        let tree = frame.document.tree_mut();

        if from == SlotState::Empty {
            folio_html::append_fragment(tree, node, slot.original_content())
                .map_err(|e| LifecycleError::Markup { index, message: e.to_string() })?;
        }
        set_style_property(tree, node, "min-height", None)?;
        set_style_property(tree, node, "transition-duration", Some(&format!("{}ms", fade.as_millis())))?;
        tree.remove_class(node, EMPTY_CLASS)?;
        tree.remove_class(node, FADING_CLASS)?;
        tree.add_class(node, VISIBLE_CLASS)?;
        tree.set_dataset(node, "lazyState", SlotState::Mounting.as_str())?;

        let due = frame.now + fade.as_millis() as f64;
        self.timers.schedule(due, Continuation::SettleMount { slot: index, epoch: slot.epoch() });

        if let Some(group) = slot.group() {
            if let Some(activation) = self.gate.begin_mount(group) {
                self.timers.schedule(due, Continuation::GroupMounted { group, activation });
            }
        }

        if first_mount {
            self.next_allow_index = self.next_allow_index.max(index + 1);
        }

        tracing::debug!("Mounting slot {} ({:?} fade, from {:?})", index, fade, from);
        Ok(())
    }

    fn unmount(&mut self, index: usize, frame: &mut Frame<'_>) -> Result<(), LifecycleError> {
        let fade = self.fade_for(index, frame);
        self.slots[index].begin_unmount()?;
        let slot = &self.slots[index];
        let node = slot.node();
        let tree = frame.document.tree_mut();

        set_style_property(tree, node, "transition-duration", Some(&format!("{}ms", fade.as_millis())))?;
        tree.remove_class(node, VISIBLE_CLASS)?;
        tree.add_class(node, FADING_CLASS)?;
        tree.set_dataset(node, "lazyState", SlotState::Unmounting.as_str())?;

        let due = frame.now + (fade.as_millis() as u64 + self.config.unmount_margin_ms) as f64;
        self.timers.schedule(due, Continuation::ClearContent { slot: index, epoch: slot.epoch() });

        tracing::debug!("Unmounting slot {} ({:?} fade)", index, fade);
        Ok(())
    }

    /// Run one continuation; `true` if it changed anything
    fn fire(&mut self, continuation: Continuation, frame: &mut Frame<'_>) -> Result<bool, LifecycleError> {
        match continuation {
            Continuation::SettleMount { slot, epoch } => {
                let entry = self.slots.get_mut(slot).ok_or(LifecycleError::UnknownSlot(slot))?;
                match entry.settle_mount(epoch) {
                    Ok(()) => {
                        frame.document.tree_mut().set_dataset(entry.node(), "lazyState", SlotState::Mounted.as_str())?;
                        tracing::debug!("Slot {} mounted", slot);
                        Ok(true)
                    }
                    Err(e) => skip_stale(e),
                }
            }
            Continuation::GroupMounted { group, activation } => {
                if self.gate.activation(group) != Some(activation) {
                    tracing::debug!("Dropping stale mount completion for group {}", group);
                    return Ok(false);
                }
                self.gate.mark_mount_complete(group);
                tracing::debug!("Group {} finished mounting", group);
                Ok(true)
            }
            Continuation::ClearContent { slot, epoch } => {
                let entry = self.slots.get_mut(slot).ok_or(LifecycleError::UnknownSlot(slot))?;
                if let Err(e) = entry.finish_unmount(epoch) {
                    return skip_stale(e);
                }
                show_placeholder(frame.document.tree_mut(), &self.slots[slot])?;
                tracing::debug!("Slot {} cleared", slot);

                if let Some(group) = self.slots[slot].group() {
                    let still_shown = self.slots
                        .iter()
                        .any(|s| s.group() == Some(group) && s.state().is_shown());
                    if !still_shown {
                        self.gate.mark_unmount_complete(group);
                        tracing::debug!("Group {} torn down", group);
                    }
                }
                Ok(true)
            }
        }
    }
}

/// A stale continuation is expected whenever a slot re-entered mid-fade
fn skip_stale(error: LifecycleError) -> Result<bool, LifecycleError> {
    match error {
        LifecycleError::Stale { .. } | LifecycleError::InvalidTransition { .. } => {
            tracing::debug!("Skipping continuation: {}", error);
            Ok(false)
        }
        other => Err(other),
    }
}

/// Remove slot content and hold its height open
fn show_placeholder(tree: &mut DomTree, slot: &LazySlot) -> Result<(), LifecycleError> {
    let node: NodeId = slot.node();
    let height = slot.placeholder_height();

    tree.remove_children(node)?;
    tree.set_dataset(node, "placeholderHeight", &height.to_string())?;
    set_style_property(tree, node, "min-height", Some(&format!("{height}px")))?;
    tree.remove_class(node, VISIBLE_CLASS)?;
    tree.remove_class(node, FADING_CLASS)?;
    tree.add_class(node, EMPTY_CLASS)?;
    tree.set_dataset(node, "lazyState", SlotState::Empty.as_str())?;
    Ok(())
}
