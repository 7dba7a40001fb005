//! Ownership of everything the viewer attaches to the page.
//!
//! The frame loop and each DOM listener are held as `Subscription`s. Tearing
//! the lifecycle down cancels the frame first, then detaches listeners in
//! attach order. Nothing is left registered after `teardown`.

pub trait Subscription {
    /// Stops the subscription. Called exactly once.
    fn cancel(self: Box<Self>);
}

#[cfg(target_arch = "wasm32")]
impl Subscription for gloo_events::EventListener {
    fn cancel(self: Box<Self>) {
        // dropping removes the listener from its target
        drop(self);
    }
}

#[derive(Default)]
pub struct Lifecycle {
    frame: Option<Box<dyn Subscription>>,
    listeners: Vec<(&'static str, Box<dyn Subscription>)>,
    torn_down: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the frame loop; a previous one is cancelled.
    pub fn set_frame(&mut self, frame: Box<dyn Subscription>) {
        if self.torn_down {
            frame.cancel();
            return;
        }
        if let Some(old) = self.frame.replace(frame) {
            old.cancel();
        }
    }

    pub fn listen(&mut self, event: &'static str, listener: Box<dyn Subscription>) {
        if self.torn_down {
            listener.cancel();
            return;
        }
        self.listeners.push((event, listener));
    }

    pub fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.listeners.iter().map(|(event, _)| *event)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancels the frame loop and detaches every listener. Safe to call twice.
    pub fn teardown(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.cancel();
        }
        for (event, listener) in self.listeners.drain(..) {
            log::trace!("detaching {event} listener");
            listener.cancel();
        }
        self.torn_down = true;
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Logs the name of every subscription that got cancelled.
    pub(crate) struct Probe(pub &'static str, pub Rc<RefCell<Vec<&'static str>>>);

    impl Subscription for Probe {
        fn cancel(self: Box<Self>) {
            self.1.borrow_mut().push(self.0);
        }
    }

    #[test]
    fn teardown_cancels_frame_then_listeners() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut lc = Lifecycle::new();
        lc.set_frame(Box::new(Probe("frame", log.clone())));
        lc.listen("resize", Box::new(Probe("resize", log.clone())));
        lc.listen("keydown", Box::new(Probe("keydown", log.clone())));
        assert_eq!(lc.events().collect::<Vec<_>>(), ["resize", "keydown"]);

        lc.teardown();
        assert_eq!(*log.borrow(), ["frame", "resize", "keydown"]);
        assert!(!lc.has_frame());
        assert_eq!(lc.listener_count(), 0);

        lc.teardown();
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn late_subscriptions_are_cancelled_immediately() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut lc = Lifecycle::new();
        lc.teardown();
        lc.listen("change", Box::new(Probe("change", log.clone())));
        lc.set_frame(Box::new(Probe("frame", log.clone())));
        assert_eq!(*log.borrow(), ["change", "frame"]);
        assert_eq!(lc.listener_count(), 0);
    }

    #[test]
    fn replacing_frame_cancels_old_one() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut lc = Lifecycle::new();
        lc.set_frame(Box::new(Probe("a", log.clone())));
        lc.set_frame(Box::new(Probe("b", log.clone())));
        assert_eq!(*log.borrow(), ["a"]);
        drop(lc);
        assert_eq!(*log.borrow(), ["a", "b"]);
    }
}
