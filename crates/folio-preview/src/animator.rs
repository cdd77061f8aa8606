//! Overlay animator that takes real time
//!
//! Morphs sleep for their duration on the smol timer, so a navigation in
//! the preview overlaps the cover with the page load the way it would in
//! a browser.

use std::cell::RefCell;

use folio_engine::{Animator, Morph};
use folio_net::LocalBoxFuture;

#[derive(Debug, Default)]
pub struct TimedAnimator {
    path: RefCell<String>,
}

impl TimedAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path the overlay rests on
    pub fn current_path(&self) -> String {
        self.path.borrow().clone()
    }
}

impl Animator for TimedAnimator {
    fn set_path(&self, path: &str) {
        *self.path.borrow_mut() = path.to_string();
    }

    fn morph(&self, morph: Morph) -> LocalBoxFuture<'_, ()> {
        Box::pin(async move {
            tracing::info!(
                "Overlay {:?} from {} over {:?}",
                morph.phase,
                morph.direction.as_str(),
                morph.duration
            );
            let [_, _, last] = morph.keyframes;
            if !morph.duration.is_zero() {
                smol::Timer::after(morph.duration).await;
            }
            *self.path.borrow_mut() = last;
        })
    }
}
