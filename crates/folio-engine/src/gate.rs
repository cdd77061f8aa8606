//! Reveal group gate
//!
//! Grouped slots animate in ascending group order and tear down in
//! descending group order. The gate only tracks the bookkeeping; the
//! lifecycle manager asks it before every grouped mount or unmount.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GroupState {
    mount_completed: bool,
    unmount_completed: bool,
    /// Activation currently fading in, if any
    animating: Option<u64>,
}

impl Default for GroupState {
    fn default() -> Self {
        // Nothing of a group is shown before its first mount
        Self {
            mount_completed: false,
            unmount_completed: true,
            animating: None,
        }
    }
}

/// Mount/unmount ordering of numbered groups
#[derive(Debug, Default)]
pub struct RevealGroupGate {
    groups: BTreeMap<u32, GroupState>,
    next_activation: u64,
}

impl RevealGroupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a group known. Unregistered groups never block anything.
    pub fn register(&mut self, group: u32) {
        self.groups.entry(group).or_default();
    }

    /// Registered groups, ascending
    pub fn groups(&self) -> impl Iterator<Item = u32> + '_ {
        self.groups.keys().copied()
    }

    /// Every lower group has finished mounting
    pub fn can_mount(&self, group: u32) -> bool {
        self.groups.range(..group).all(|(_, s)| s.mount_completed)
    }

    /// Every higher group has finished tearing down
    pub fn can_unmount(&self, group: u32) -> bool {
        self.groups
            .range(group.saturating_add(1)..)
            .all(|(_, s)| s.unmount_completed)
    }

    pub fn is_mount_completed(&self, group: u32) -> bool {
        self.groups.get(&group).is_some_and(|s| s.mount_completed)
    }

    pub fn is_unmount_completed(&self, group: u32) -> bool {
        self.groups.get(&group).is_none_or(|s| s.unmount_completed)
    }

    pub fn is_animating(&self, group: u32) -> bool {
        self.groups.get(&group).is_some_and(|s| s.animating.is_some())
    }

    /// Activation token of the fade-in in progress
    pub fn activation(&self, group: u32) -> Option<u64> {
        self.groups.get(&group).and_then(|s| s.animating)
    }

    /// Register the group as animating in. Returns a fresh activation token
    /// the first time per activation, `None` while already animating or mounted.
    pub fn begin_mount(&mut self, group: u32) -> Option<u64> {
        let state = self.groups.entry(group).or_default();
        if state.animating.is_some() || state.mount_completed {
            return None;
        }
        self.next_activation += 1;
        state.animating = Some(self.next_activation);
        state.mount_completed = false;
        state.unmount_completed = false;
        Some(self.next_activation)
    }

    pub fn mark_mount_complete(&mut self, group: u32) {
        let state = self.groups.entry(group).or_default();
        state.animating = None;
        state.mount_completed = true;
        state.unmount_completed = false;
    }

    pub fn mark_unmount_complete(&mut self, group: u32) {
        let state = self.groups.entry(group).or_default();
        state.animating = None;
        state.mount_completed = false;
        state.unmount_completed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(groups: &[u32]) -> RevealGroupGate {
        let mut gate = RevealGroupGate::new();
        for &g in groups {
            gate.register(g);
        }
        gate
    }

    #[test]
    fn test_mount_order() {
        let mut gate = gate_with(&[1, 2, 3]);
        assert!(gate.can_mount(1));
        assert!(!gate.can_mount(2));

        let activation = gate.begin_mount(1);
        assert!(activation.is_some());
        assert_eq!(gate.begin_mount(1), None);
        assert!(!gate.can_mount(2));

        gate.mark_mount_complete(1);
        assert!(gate.can_mount(2));
        assert!(!gate.can_mount(3));
        assert_eq!(gate.begin_mount(1), None);
    }

    #[test]
    fn test_unmount_order() {
        let mut gate = gate_with(&[1, 2]);
        gate.mark_mount_complete(1);
        gate.mark_mount_complete(2);

        assert!(!gate.can_unmount(1));
        assert!(gate.can_unmount(2));

        gate.mark_unmount_complete(2);
        assert!(gate.can_unmount(1));
        assert!(!gate.is_mount_completed(2));
        assert!(gate.is_unmount_completed(2));
    }

    #[test]
    fn test_flags_exclusive_and_reset_on_remount() {
        let mut gate = gate_with(&[1]);
        assert!(gate.is_unmount_completed(1));

        let a = gate.begin_mount(1);
        assert!(!gate.is_mount_completed(1));
        assert!(!gate.is_unmount_completed(1));

        gate.mark_mount_complete(1);
        gate.mark_unmount_complete(1);
        let b = gate.begin_mount(1);
        assert_ne!(a, b);
        assert_eq!(gate.activation(1), b);
    }

    #[test]
    fn test_gaps_and_unknown_groups() {
        let mut gate = gate_with(&[1, 5]);
        gate.mark_mount_complete(1);
        // Groups 2..4 do not exist on the page
        assert!(gate.can_mount(5));
        // Unregistered group 9 still waits on group 5
        assert!(!gate.can_mount(9));
        gate.mark_mount_complete(5);
        assert!(gate.can_mount(9));
        assert!(gate.can_unmount(7));
        assert!(gate.is_unmount_completed(42));
    }

    #[test]
    fn test_properties_hold_for_every_state() {
        // Exhaustive over three groups with (mounted, torn down) flags
        for bits in 0u32..64 {
            let mut gate = gate_with(&[1, 2, 3]);
            for g in 1..=3u32 {
                match (bits >> ((g - 1) * 2)) & 0b11 {
                    0b01 => gate.mark_mount_complete(g),
                    0b10 => {
                        gate.begin_mount(g);
                    }
                    _ => gate.mark_unmount_complete(g),
                }
            }
            for g in 1..=3u32 {
                let lower = (1..g).all(|l| gate.is_mount_completed(l));
                let higher = (g + 1..=3).all(|h| gate.is_unmount_completed(h));
                assert_eq!(gate.can_mount(g), lower);
                assert_eq!(gate.can_unmount(g), higher);
            }
        }
    }
}
