//! Wipe geometry
//!
//! The transition overlay is a single SVG path in a 100×100 view box. A wipe
//! grows from one edge in three keyframes: flat against the edge, a curved
//! front halfway across, and full coverage.

use std::time::Duration;

use folio_dom::Viewport;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TransitionConfig;

/// Edge the cover grows from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WipeDirection {
    Top,
    Bottom,
    Left,
    Right,
}

/// (front, control) depth from the anchored edge, per keyframe
const FLAT: (u32, u32) = (0, 0);
const MIDPOINT: (u32, u32) = (50, 100);
const FULL: (u32, u32) = (100, 100);

impl WipeDirection {
    pub const ALL: [WipeDirection; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// Uniform pick
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Left and right wipes travel along the long side of landscape screens
    pub fn is_side(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    fn path(self, (front, control): (u32, u32)) -> String {
        match self {
            Self::Bottom => {
                let (f, c) = (100 - front, 100 - control);
                format!("M 0 100 V {f} Q 50 {c} 100 {f} V 100 z")
            }
            Self::Top => format!("M 0 0 V {front} Q 50 {control} 100 {front} V 0 z"),
            Self::Left => format!("M 0 0 H {front} Q {control} 50 {front} 100 H 0 z"),
            Self::Right => {
                let (f, c) = (100 - front, 100 - control);
                format!("M 100 0 H {f} Q {c} 50 {f} 100 H 100 z")
            }
        }
    }

    /// Path with nothing covered
    pub fn flat_path(self) -> String {
        self.path(FLAT)
    }

    /// Path covering the whole view box
    pub fn full_path(self) -> String {
        self.path(FULL)
    }

    /// flat → midpoint → full
    pub fn cover_keyframes(self) -> [String; 3] {
        [self.path(FLAT), self.path(MIDPOINT), self.path(FULL)]
    }

    /// full → midpoint → flat
    pub fn reveal_keyframes(self) -> [String; 3] {
        [self.path(FULL), self.path(MIDPOINT), self.path(FLAT)]
    }
}

/// Duration of one half of a transition for `direction` on `viewport`
pub fn wipe_duration(config: &TransitionConfig, direction: WipeDirection, viewport: &Viewport) -> Duration {
    if viewport.width <= config.narrow_breakpoint_px {
        return Duration::from_millis(config.narrow_duration_ms);
    }

    let base = config.duration_ms as f64;
    let ms = if config.scale_side_wipes && direction.is_side() {
        base * viewport.aspect_ratio().sqrt()
    } else {
        base
    };
    Duration::from_millis(ms.round() as u64)
}
