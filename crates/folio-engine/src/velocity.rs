//! Scroll velocity
//!
//! Instantaneous scroll speed from the two most recent samples. Fade
//! durations are recomputed from it on every event.

use std::time::Duration;

use crate::config::DurationPolicy;

/// Vertical scroll direction of the latest movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    #[default]
    Still,
    Down,
    Up,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    scroll_y: f64,
    at: f64,
}

/// Tracks scroll speed in px/ms
#[derive(Debug, Clone)]
pub struct VelocityTracker {
    last: Option<Sample>,
    speed: f64,
    direction: ScrollDirection,
    idle_reset_ms: f64,
}

impl VelocityTracker {
    pub fn new(idle_reset_ms: u64) -> Self {
        Self {
            last: None,
            speed: 0.0,
            direction: ScrollDirection::Still,
            idle_reset_ms: idle_reset_ms as f64,
        }
    }

    /// Record a scroll position at time `now` (ms)
    pub fn sample(&mut self, scroll_y: f64, now: f64) {
        let Some(last) = self.last else {
            self.last = Some(Sample { scroll_y, at: now });
            return;
        };

        let dt = now - last.at;
        if dt <= 0.0 {
            // Same-frame duplicates only move the position
            self.last = Some(Sample { scroll_y, at: last.at });
            return;
        }

        let dy = scroll_y - last.scroll_y;
        self.speed = dy.abs() / dt;
        self.direction = if dy > 0.0 {
            ScrollDirection::Down
        } else if dy < 0.0 {
            ScrollDirection::Up
        } else {
            ScrollDirection::Still
        };
        self.last = Some(Sample { scroll_y, at: now });
    }

    /// Current speed, decayed to zero after the idle window
    pub fn speed(&self, now: f64) -> f64 {
        match self.last {
            Some(last) if now - last.at <= self.idle_reset_ms => self.speed,
            _ => 0.0,
        }
    }

    /// Direction of the latest movement
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Fade duration for the current speed under `policy`
    pub fn fade_duration(&self, policy: &DurationPolicy, now: f64) -> Duration {
        policy.duration_for(self.speed(now))
    }

    /// Forget all samples (new page)
    pub fn reset(&mut self) {
        self.last = None;
        self.speed = 0.0;
        self.direction = ScrollDirection::Still;
    }
}
