//! Progress indicator shown while the weather request is pending.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

pub trait ProgressIndicator: Send + Sync + Debug {
    fn show(&self);
    fn hide(&self);
}

/// Owns the one indicator of a screen. Showing and hiding go through
/// [`ProgressGuard`], so the indicator is never shown twice or left behind.
#[derive(Debug, Clone)]
pub struct ProgressSlot {
    indicator: Arc<dyn ProgressIndicator>,
    visible: Arc<AtomicBool>,
}

impl ProgressSlot {
    pub fn new(indicator: Arc<dyn ProgressIndicator>) -> Self {
        Self { indicator, visible: Arc::new(AtomicBool::new(false)) }
    }

    /// Show the indicator unless it is already up.
    ///
    /// Only the guard that actually showed it will hide it.
    pub fn acquire(&self) -> ProgressGuard {
        let owns = self
            .visible
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if owns {
            self.indicator.show();
        }

        ProgressGuard { slot: self.clone(), owns }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    fn hide(&self) {
        if self.visible.swap(false, Ordering::AcqRel) {
            self.indicator.hide();
        }
    }
}

/// Scoped ownership of the visible indicator.
#[must_use = "dropping the guard hides the indicator immediately"]
#[derive(Debug)]
pub struct ProgressGuard {
    slot: ProgressSlot,
    owns: bool,
}

impl ProgressGuard {
    /// Hide now instead of at scope exit.
    pub fn release(mut self) {
        self.hide_once();
    }

    fn hide_once(&mut self) {
        if std::mem::take(&mut self.owns) {
            self.slot.hide();
        }
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        self.hide_once();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug, Default)]
    struct Counting {
        shows: AtomicUsize,
        hides: AtomicUsize,
    }

    impl ProgressIndicator for Counting {
        fn show(&self) {
            self.shows.fetch_add(1, Ordering::SeqCst);
        }
        fn hide(&self) {
            self.hides.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn slot() -> (Arc<Counting>, ProgressSlot) {
        let counting = Arc::new(Counting::default());
        let slot = ProgressSlot::new(counting.clone());
        (counting, slot)
    }

    #[test]
    fn release_hides_exactly_once() {
        let (counting, slot) = slot();

        let guard = slot.acquire();
        assert!(slot.is_visible());
        guard.release();

        assert!(!slot.is_visible());
        assert_eq!(counting.shows.load(Ordering::SeqCst), 1);
        assert_eq!(counting.hides.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_hides_on_early_exit() {
        let (counting, slot) = slot();

        fn failing(slot: &ProgressSlot) -> Result<(), &'static str> {
            let _guard = slot.acquire();
            Err("transport failure")
        }

        assert!(failing(&slot).is_err());
        assert!(!slot.is_visible());
        assert_eq!(counting.hides.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_acquire_does_not_show_twice() {
        let (counting, slot) = slot();

        let outer = slot.acquire();
        let inner = slot.acquire();
        assert_eq!(counting.shows.load(Ordering::SeqCst), 1);

        drop(inner);
        assert!(slot.is_visible());
        assert_eq!(counting.hides.load(Ordering::SeqCst), 0);

        drop(outer);
        assert!(!slot.is_visible());
        assert_eq!(counting.hides.load(Ordering::SeqCst), 1);
    }
}
