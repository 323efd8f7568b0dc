//! In-memory event source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lapse_core::SourceEvent;

use crate::{EventSource, Listener};

/// An [`EventSource`] driven by explicit [`emit`](Self::emit) calls.
///
/// Used by tests and by hosts that receive page events through some other
/// channel (a bridge, stdin) and replay them here.
#[derive(Default)]
pub struct ManualEventSource {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl ManualEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every listener registered for its name.
    ///
    /// Returns the number of listeners invoked. The registry is not
    /// locked while listeners run, so a listener may detach itself.
    pub fn emit(&self, event: &SourceEvent) -> usize {
        let targets: Vec<Listener> = self
            .lock()
            .get(&event.name)
            .map(|list| list.iter().map(Arc::clone).collect())
            .unwrap_or_default();

        for listener in &targets {
            listener(event);
        }
        targets.len()
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.lock().get(name).map_or(0, Vec::len)
    }

    /// Number of listeners registered across all names.
    pub fn total_listeners(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Listener>>> {
        // Listeners never run under the lock, so a poisoned map is still
        // structurally sound.
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSource for ManualEventSource {
    fn add_listener(&self, name: &str, listener: Listener) {
        let mut map = self.lock();
        let list = map.entry(name.to_string()).or_default();
        if !list.iter().any(|existing| Arc::ptr_eq(existing, &listener)) {
            list.push(listener);
        }
    }

    fn remove_listener(&self, name: &str, listener: &Listener) -> bool {
        let mut map = self.lock();
        let Some(list) = map.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|existing| !Arc::ptr_eq(existing, listener));
        let removed = list.len() != before;
        if list.is_empty() {
            map.remove(name);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_listener(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = Arc::clone(counter);
        Arc::new(move |_event: &SourceEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_only_matching_name() {
        let source = ManualEventSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        source.add_listener("keydown", counting_listener(&hits));

        assert_eq!(source.emit(&SourceEvent::named("keydown")), 1);
        assert_eq!(source.emit(&SourceEvent::named("scroll")), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_same_listener_twice_registers_once() {
        let source = ManualEventSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(&hits);

        source.add_listener("click", Arc::clone(&listener));
        source.add_listener("click", Arc::clone(&listener));

        assert_eq!(source.listener_count("click"), 1);
    }

    #[test]
    fn test_remove_requires_same_handle() {
        // Two closures with identical behaviour are still different
        // listeners; only the registered handle removes the registration.
        let source = ManualEventSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let registered = counting_listener(&hits);
        let lookalike = counting_listener(&hits);
        source.add_listener("click", Arc::clone(&registered));

        assert!(!source.remove_listener("click", &lookalike));
        assert_eq!(source.listener_count("click"), 1);

        assert!(source.remove_listener("click", &registered));
        assert_eq!(source.total_listeners(), 0);
    }

    #[test]
    fn test_remove_unknown_name_returns_false() {
        let source = ManualEventSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        assert!(!source.remove_listener("nope", &counting_listener(&hits)));
    }
}
