//! Folio Engine
//!
//! Client-side runtime for a portfolio site.
//!
//! # Components
//! - Lazy slots that mount below-the-fold content as it approaches the
//!   viewport and tear it down once it has scrolled far away
//! - Scroll reveal of static sections
//! - Animated same-origin page transitions with a page cache
//!
//! # Example
//! ```rust,ignore
//! use folio_engine::{SiteRuntime, RuntimeConfig, PlatformCaps, FlowLayout};
//!
//! let runtime = SiteRuntime::load(page, RuntimeConfig::default(), PlatformCaps::default(),
//!     Box::new(FlowLayout::default()), services, 0.0).await?;
//! runtime.scroll(640.0, 16.0)?;
//! runtime.tick(250.0)?;
//! ```

pub mod config;
pub mod gate;
pub mod lifecycle;
pub mod links;
pub mod observer;
mod page;
pub mod platform;
pub mod previews;
pub mod reveal;
pub mod runtime;
pub mod slot;
mod style;
pub mod timers;
pub mod transition;
pub mod velocity;
pub mod visibility;
pub mod wipe;

pub use config::{ConfigError, DurationPolicy, LazyConfig, RevealConfig, RuntimeConfig, SpeedMapping, TransitionConfig};
pub use gate::RevealGroupGate;
pub use lifecycle::{Evaluation, Frame, LazyLifecycleManager};
pub use links::{Ineligible, LinkBindings, LinkClick, Modifiers};
pub use page::Page;
pub use platform::{
    Animator, FlowLayout, HistoryEntry, InstantAnimator, LayoutProvider, Morph, MorphPhase,
    NavigationHost, PlatformCaps, SessionHistory, StaticLayout,
};
pub use reveal::{RevealPass, ScrollRevealObserver};
pub use runtime::{FrameReport, NavigationResult, RuntimeError, SiteRuntime};
pub use slot::{LazySlot, LifecycleError, SlotState};
pub use transition::{
    NavigationRequest, PageTransitionController, TransitionError, TransitionOutcome, TransitionPhase,
    TransitionServices, TriggerKind, boot_cover,
};
pub use velocity::{ScrollDirection, VelocityTracker};
pub use visibility::{DocumentVisibility, VisibilityState};
pub use wipe::WipeDirection;

// Re-export sub-crates for advanced usage
pub use folio_dom as dom;
pub use folio_html as html;
pub use folio_net as net;
