//! Page Visibility
//!
//! Tracks the document visibility state. Becoming visible again is the
//! runtime's cue to re-evaluate slots the user may have scrolled past while
//! timers were throttled.

/// Visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityState {
    #[default]
    Visible,
    Hidden,
}

/// Document visibility
#[derive(Debug, Default)]
pub struct DocumentVisibility {
    state: VisibilityState,
    last_change: Option<f64>,
    hidden_ms: f64,
}

impl DocumentVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VisibilityState {
        self.state
    }

    pub fn is_hidden(&self) -> bool {
        self.state == VisibilityState::Hidden
    }

    /// Set visibility state at `now`; returns whether it changed
    pub fn set_state(&mut self, state: VisibilityState, now: f64) -> bool {
        if self.state == state {
            return false;
        }

        if self.state == VisibilityState::Hidden {
            if let Some(since) = self.last_change {
                self.hidden_ms += (now - since).max(0.0);
            }
        }

        self.state = state;
        self.last_change = Some(now);
        true
    }

    /// Total time spent hidden up to `now`
    pub fn hidden_duration(&self, now: f64) -> f64 {
        let mut total = self.hidden_ms;
        if let (VisibilityState::Hidden, Some(since)) = (self.state, self.last_change) {
            total += (now - since).max(0.0);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility() {
        let mut vis = DocumentVisibility::new();
        assert_eq!(vis.state(), VisibilityState::Visible);
        assert!(!vis.set_state(VisibilityState::Visible, 0.0));

        assert!(vis.set_state(VisibilityState::Hidden, 100.0));
        assert!(vis.is_hidden());
        assert_eq!(vis.hidden_duration(400.0), 300.0);

        assert!(vis.set_state(VisibilityState::Visible, 600.0));
        assert_eq!(vis.hidden_duration(1000.0), 500.0);
    }
}
