//! Runtime configuration
//!
//! Every presentation parameter the scheduler and the transition controller
//! use comes from here. Defaults match the shipped site; a JSON document with
//! any subset of fields overrides them.

use std::time::Duration;

use folio_net::CacheConfig;
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(String),

    #[error("{field}: minimum {min} ms exceeds maximum {max} ms")]
    InvalidRange { field: &'static str, min: u64, max: u64 },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must lie within [0, 1], got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
}

/// How scroll speed maps onto an animation duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedMapping {
    /// Fast scrolling shortens the animation
    FasterIsShorter,
    /// Fast scrolling lengthens the animation
    FasterIsLonger,
}

/// Speed-to-duration policy: a clamped range plus a mapping direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationPolicy {
    pub min_ms: u64,
    pub max_ms: u64,
    pub mapping: SpeedMapping,
    /// Speed (px/ms) at which the mapping saturates
    pub reference_speed: f64,
}

impl DurationPolicy {
    /// Profile for ungrouped slots: [80, 800] ms
    pub const fn standard() -> Self {
        Self {
            min_ms: 80,
            max_ms: 800,
            mapping: SpeedMapping::FasterIsShorter,
            reference_speed: 3.0,
        }
    }

    /// Profile for grouped slots: [50, 250] ms
    pub const fn grouped() -> Self {
        Self {
            min_ms: 50,
            max_ms: 250,
            mapping: SpeedMapping::FasterIsShorter,
            reference_speed: 3.0,
        }
    }

    /// Duration for a speed in px/ms
    pub fn duration_for(&self, speed: f64) -> Duration {
        let t = if speed.is_finite() && speed > 0.0 {
            (speed / self.reference_speed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (min, max) = (self.min_ms as f64, self.max_ms as f64);
        let ms = match self.mapping {
            SpeedMapping::FasterIsShorter => max - (max - min) * t,
            SpeedMapping::FasterIsLonger => min + (max - min) * t,
        };
        Duration::from_millis(ms.round() as u64)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidRange { field, min: self.min_ms, max: self.max_ms });
        }
        if self.max_ms == 0 {
            return Err(ConfigError::Zero { field });
        }
        if !(self.reference_speed > 0.0) {
            return Err(ConfigError::Zero { field: "reference_speed" });
        }
        Ok(())
    }
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Lazy slot scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyConfig {
    /// Designator class of lazy slots
    pub slot_class: String,
    /// Dataset key holding the group number
    pub group_key: String,
    /// Distance below the viewport bottom at which slots start mounting
    pub enter_lead_px: f64,
    /// Fade profile for slots without a group
    pub fade: DurationPolicy,
    /// Fade profile for grouped slots
    pub grouped_fade: DurationPolicy,
    /// Extra wait after a fade-out before content is cleared
    pub unmount_margin_ms: u64,
    /// Periodic re-evaluation interval
    pub fallback_interval_ms: u64,
    /// Scroll speed decays to zero after this long without a sample
    pub idle_reset_ms: u64,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            slot_class: "lazy-slot".to_string(),
            group_key: "lazyGroup".to_string(),
            enter_lead_px: 200.0,
            fade: DurationPolicy::standard(),
            grouped_fade: DurationPolicy::grouped(),
            unmount_margin_ms: 50,
            fallback_interval_ms: 250,
            idle_reset_ms: 150,
        }
    }
}

/// Scroll reveal of static sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Landmark whose descendants are observed
    pub root: String,
    /// Simple selectors of reveal targets
    pub targets: Vec<String>,
    /// Reveal line, as a fraction of the viewport height above its bottom
    pub bottom_margin: f64,
    /// Visible fraction needed to count as intersecting
    pub threshold: f64,
    /// Stop observing an element once it has been revealed
    pub once: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            root: "main".to_string(),
            targets: vec![
                "section".to_string(),
                ".card".to_string(),
                ".project-preview".to_string(),
            ],
            bottom_margin: 0.10,
            threshold: 0.15,
            once: false,
        }
    }
}

/// Animated page transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Duration of each half (cover, reveal)
    pub duration_ms: u64,
    /// Scale left/right wipes by sqrt(width / height)
    pub scale_side_wipes: bool,
    /// Viewports at most this wide use `narrow_duration_ms`
    pub narrow_breakpoint_px: f64,
    pub narrow_duration_ms: u64,
    /// Session storage key carrying the pending reveal
    pub session_key: String,
    /// Landmarks replaced on swap, in order
    pub landmarks: Vec<String>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 800,
            scale_side_wipes: true,
            narrow_breakpoint_px: 768.0,
            narrow_duration_ms: 600,
            session_key: "folio:transition".to_string(),
            landmarks: vec![
                "header".to_string(),
                "main".to_string(),
                "footer".to_string(),
            ],
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lazy: LazyConfig,
    pub reveal: RevealConfig,
    pub transition: TransitionConfig,
    pub cache: CacheConfig,
}

impl RuntimeConfig {
    /// Parse and validate a JSON document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject ranges the scheduler cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lazy.fade.validate("lazy.fade")?;
        self.lazy.grouped_fade.validate("lazy.grouped_fade")?;
        if self.lazy.fallback_interval_ms == 0 {
            return Err(ConfigError::Zero { field: "lazy.fallback_interval_ms" });
        }
        for (field, value) in [
            ("reveal.threshold", self.reveal.threshold),
            ("reveal.bottom_margin", self.reveal.bottom_margin),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        if self.transition.duration_ms == 0 {
            return Err(ConfigError::Zero { field: "transition.duration_ms" });
        }
        if self.transition.narrow_duration_ms == 0 {
            return Err(ConfigError::Zero { field: "transition.narrow_duration_ms" });
        }
        if self.cache.ttl_ms == 0 {
            return Err(ConfigError::Zero { field: "cache.ttl_ms" });
        }
        Ok(())
    }
}
