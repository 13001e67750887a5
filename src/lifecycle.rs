//! Host Lifecycle Hooks
//!
//! The host environment reports foreground/background transitions by calling
//! [`LifecycleObserver::notify`]. The observer runs whatever hook was
//! registered for that event; nothing here depends on a platform event bus.

use std::fmt;

use tokio::sync::broadcast;
use tracing::trace;

/// Application lifecycle transitions a host can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    WillEnterForeground,
    DidBecomeActive,
    /// The host is about to be suspended; pending cache state should be flushed
    DidEnterBackground,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 3] = [
        LifecycleEvent::WillEnterForeground,
        LifecycleEvent::DidBecomeActive,
        LifecycleEvent::DidEnterBackground,
    ];
}

/// Callback run when its event is reported.
pub type LifecycleHook = Box<dyn FnMut() + Send>;

// == Lifecycle Observer ==
/// One optional hook per [`LifecycleEvent`].
#[derive(Default)]
pub struct LifecycleObserver {
    will_enter_foreground: Option<LifecycleHook>,
    did_become_active: Option<LifecycleHook>,
    did_enter_background: Option<LifecycleHook>,
}

impl LifecycleObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer that publishes every event into `sender`.
    ///
    /// Pair with [`crate::tasks::spawn_sync_task`] on a receiver of the same
    /// channel to flush a shared cache when the host goes to the background.
    pub fn forwarding(sender: broadcast::Sender<LifecycleEvent>) -> Self {
        let mut observer = Self::new();
        for event in LifecycleEvent::ALL {
            let sender = sender.clone();
            observer.register(
                event,
                Some(Box::new(move || {
                    if sender.send(event).is_err() {
                        trace!(?event, "No subscriber for lifecycle event");
                    }
                })),
            );
        }
        observer
    }

    pub fn on_will_enter_foreground(&mut self, hook: Option<LifecycleHook>) -> &mut Self {
        self.register(LifecycleEvent::WillEnterForeground, hook)
    }

    pub fn on_did_become_active(&mut self, hook: Option<LifecycleHook>) -> &mut Self {
        self.register(LifecycleEvent::DidBecomeActive, hook)
    }

    pub fn on_did_enter_background(&mut self, hook: Option<LifecycleHook>) -> &mut Self {
        self.register(LifecycleEvent::DidEnterBackground, hook)
    }

    /// Replaces the hook for `event`; `None` unregisters it.
    pub fn register(&mut self, event: LifecycleEvent, hook: Option<LifecycleHook>) -> &mut Self {
        *self.slot(event) = hook;
        self
    }

    /// Whether a hook is registered for `event`.
    pub fn is_registered(&self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::WillEnterForeground => self.will_enter_foreground.is_some(),
            LifecycleEvent::DidBecomeActive => self.did_become_active.is_some(),
            LifecycleEvent::DidEnterBackground => self.did_enter_background.is_some(),
        }
    }

    /// Runs the hook registered for `event`. Returns whether one ran.
    pub fn notify(&mut self, event: LifecycleEvent) -> bool {
        match self.slot(event) {
            Some(hook) => {
                trace!(?event, "Running lifecycle hook");
                hook();
                true
            }
            None => false,
        }
    }

    fn slot(&mut self, event: LifecycleEvent) -> &mut Option<LifecycleHook> {
        match event {
            LifecycleEvent::WillEnterForeground => &mut self.will_enter_foreground,
            LifecycleEvent::DidBecomeActive => &mut self.did_become_active,
            LifecycleEvent::DidEnterBackground => &mut self.did_enter_background,
        }
    }
}

impl fmt::Debug for LifecycleObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registered: Vec<LifecycleEvent> = LifecycleEvent::ALL
            .into_iter()
            .filter(|event| self.is_registered(*event))
            .collect();
        f.debug_struct("LifecycleObserver")
            .field("registered", &registered)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> Option<LifecycleHook> {
        let counter = counter.clone();
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_notify_runs_matching_hook() {
        let background = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let mut observer = LifecycleObserver::new();
        observer.on_did_enter_background(counting(&background));

        assert!(observer.notify(LifecycleEvent::DidEnterBackground));
        assert!(observer.notify(LifecycleEvent::DidEnterBackground));
        assert!(!observer.notify(LifecycleEvent::DidBecomeActive));

        observer.on_did_become_active(counting(&active));
        assert!(observer.notify(LifecycleEvent::DidBecomeActive));

        assert_eq!(background.load(Ordering::SeqCst), 2);
        assert_eq!(active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_replaces_and_unregisters() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut observer = LifecycleObserver::new();

        observer
            .on_will_enter_foreground(counting(&first))
            .on_will_enter_foreground(counting(&second));
        observer.notify(LifecycleEvent::WillEnterForeground);
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        observer.on_will_enter_foreground(None);
        assert!(!observer.is_registered(LifecycleEvent::WillEnterForeground));
        assert!(!observer.notify(LifecycleEvent::WillEnterForeground));
    }

    #[test]
    fn test_forwarding_publishes_every_event() {
        let (tx, mut rx) = broadcast::channel(8);
        let mut observer = LifecycleObserver::forwarding(tx);

        for event in LifecycleEvent::ALL {
            assert!(observer.notify(event));
        }

        assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::WillEnterForeground);
        assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::DidBecomeActive);
        assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::DidEnterBackground);
    }

    #[test]
    fn test_forwarding_without_subscribers() {
        let (tx, rx) = broadcast::channel(1);
        drop(rx);
        let mut observer = LifecycleObserver::forwarding(tx);

        assert!(observer.notify(LifecycleEvent::DidEnterBackground));
    }
}
