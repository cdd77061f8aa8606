//! Lazy slots
//!
//! A slot is a placeholder element whose markup is captured once at
//! discovery and re-inserted on every mount. Its lifecycle is a small state
//! machine; every transition bumps an epoch so that deferred continuations
//! can tell whether they still apply.

use folio_dom::{DomError, NodeId};

/// Lifecycle of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Empty,
    Mounting,
    Mounted,
    Unmounting,
}

impl SlotState {
    /// Value mirrored into `data-lazy-state`
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Mounting => "mounting",
            Self::Mounted => "mounted",
            Self::Unmounting => "unmounting",
        }
    }

    /// Content is in the document
    pub fn is_shown(self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Lifecycle errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("slot {index}: cannot go from {from:?} to {to:?}")]
    InvalidTransition { index: usize, from: SlotState, to: SlotState },

    #[error("slot {index}: continuation for epoch {expected} arrived at epoch {actual}")]
    Stale { index: usize, expected: u64, actual: u64 },

    #[error("no slot with index {0}")]
    UnknownSlot(usize),

    #[error("slot {index}: captured markup could not be restored: {message}")]
    Markup { index: usize, message: String },

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

/// One lazily mounted region of the page
#[derive(Debug, Clone)]
pub struct LazySlot {
    index: usize,
    node: NodeId,
    original_content: String,
    placeholder_height: f64,
    group: Option<u32>,
    state: SlotState,
    ever_mounted: bool,
    epoch: u64,
}

impl LazySlot {
    pub fn new(
        index: usize,
        node: NodeId,
        original_content: String,
        placeholder_height: f64,
        group: Option<u32>,
    ) -> Self {
        Self {
            index,
            node,
            original_content,
            placeholder_height,
            group,
            state: SlotState::Empty,
            ever_mounted: false,
            epoch: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn original_content(&self) -> &str {
        &self.original_content
    }

    pub fn placeholder_height(&self) -> f64 {
        self.placeholder_height
    }

    pub fn group(&self) -> Option<u32> {
        self.group
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn ever_mounted(&self) -> bool {
        self.ever_mounted
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn invalid(&self, to: SlotState) -> LifecycleError {
        LifecycleError::InvalidTransition { index: self.index, from: self.state, to }
    }

    fn check_epoch(&self, epoch: u64) -> Result<(), LifecycleError> {
        if epoch == self.epoch {
            Ok(())
        } else {
            Err(LifecycleError::Stale { index: self.index, expected: epoch, actual: self.epoch })
        }
    }

    /// `Empty | Unmounting → Mounting`. Returns the state it left.
    pub fn begin_mount(&mut self) -> Result<SlotState, LifecycleError> {
        match self.state {
            SlotState::Empty | SlotState::Unmounting => {
                let from = self.state;
                self.state = SlotState::Mounting;
                self.ever_mounted = true;
                self.epoch += 1;
                Ok(from)
            }
            _ => Err(self.invalid(SlotState::Mounting)),
        }
    }

    /// `Mounting → Mounted`, only for the epoch that started the fade
    pub fn settle_mount(&mut self, epoch: u64) -> Result<(), LifecycleError> {
        self.check_epoch(epoch)?;
        if self.state != SlotState::Mounting {
            return Err(self.invalid(SlotState::Mounted));
        }
        self.state = SlotState::Mounted;
        Ok(())
    }

    /// `Mounted → Unmounting`
    pub fn begin_unmount(&mut self) -> Result<(), LifecycleError> {
        if self.state != SlotState::Mounted {
            return Err(self.invalid(SlotState::Unmounting));
        }
        self.state = SlotState::Unmounting;
        self.epoch += 1;
        Ok(())
    }

    /// `Unmounting → Empty`, only if nothing re-mounted the slot meanwhile
    pub fn finish_unmount(&mut self, epoch: u64) -> Result<(), LifecycleError> {
        self.check_epoch(epoch)?;
        if self.state != SlotState::Unmounting {
            return Err(self.invalid(SlotState::Empty));
        }
        self.state = SlotState::Empty;
        self.epoch += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> LazySlot {
        LazySlot::new(0, NodeId::from_index(5), "<p>hi</p>".into(), 320.0, None)
    }

    #[test]
    fn test_full_cycle() {
        let mut slot = slot();
        assert_eq!(slot.begin_mount(), Ok(SlotState::Empty));
        assert!(slot.ever_mounted());
        slot.settle_mount(slot.epoch()).unwrap();
        assert_eq!(slot.state(), SlotState::Mounted);

        slot.begin_unmount().unwrap();
        slot.finish_unmount(slot.epoch()).unwrap();
        assert_eq!(slot.state(), SlotState::Empty);
        assert!(slot.ever_mounted());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut slot = slot();
        assert!(matches!(slot.begin_unmount(), Err(LifecycleError::InvalidTransition { .. })));

        slot.begin_mount().unwrap();
        assert!(matches!(
            slot.begin_mount(),
            Err(LifecycleError::InvalidTransition { from: SlotState::Mounting, .. })
        ));
        assert!(slot.begin_unmount().is_err());
    }

    #[test]
    fn test_remount_during_fade_out_makes_clear_stale() {
        let mut slot = slot();
        slot.begin_mount().unwrap();
        slot.settle_mount(slot.epoch()).unwrap();
        slot.begin_unmount().unwrap();
        let clear_epoch = slot.epoch();

        assert_eq!(slot.begin_mount(), Ok(SlotState::Unmounting));
        assert!(matches!(slot.finish_unmount(clear_epoch), Err(LifecycleError::Stale { .. })));
        assert_eq!(slot.state(), SlotState::Mounting);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SlotState::Empty.as_str(), "empty");
        assert_eq!(SlotState::Unmounting.as_str(), "unmounting");
        assert!(SlotState::Unmounting.is_shown());
        assert!(!SlotState::Empty.is_shown());
    }
}
