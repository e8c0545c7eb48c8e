//! Infinite-scroll pagination controller.
//!
//! Consumes a visibility signal for a sentinel element and turns it into
//! load-more invocations: at most one per transition into view, only
//! while enabled (more pages exist and no fetch is in flight for the
//! key), and never after teardown. The signal source is abstract: an
//! intersection observer, a scroll position poll, or a test driver.

pub struct ScrollSentinel {
    enabled: bool,
    in_view: bool,
    detached: bool,
    on_load_more: Box<dyn FnMut() + Send>,
}

impl ScrollSentinel {
    /// Starts disabled and out of view; the caller enables it once the
    /// first page has resolved and a next offset exists.
    pub fn new(on_load_more: impl FnMut() + Send + 'static) -> Self {
        Self {
            enabled: false,
            in_view: false,
            detached: false,
            on_load_more: Box::new(on_load_more),
        }
    }

    /// Report the sentinel's visibility. Overlapping reports of the same
    /// visibility are collapsed; only the edge into view can fire.
    pub fn observe(&mut self, visible: bool) {
        let entered = visible && !self.in_view;
        self.in_view = visible;
        if self.detached || !self.enabled {
            return;
        }
        if entered {
            (self.on_load_more)();
        }
    }

    /// Gate the controller: enabled means more pages exist and no fetch
    /// for this key is currently pending. Re-enabling while the sentinel
    /// sits in view fires immediately, the way a re-attached observer
    /// reports an already-intersecting element.
    pub fn set_enabled(&mut self, enabled: bool) {
        let arming = enabled && !self.enabled;
        self.enabled = enabled;
        if arming && self.in_view && !self.detached {
            (self.on_load_more)();
        }
    }

    /// The triggering element unmounted: stop observing, never call back
    /// again.
    pub fn detach(&mut self) {
        self.detached = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled && !self.detached
    }
}
