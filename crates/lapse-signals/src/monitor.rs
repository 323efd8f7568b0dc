//! Activity and visibility monitors.
//!
//! Each monitor owns exactly one [`Listener`], created in `new` and reused
//! for every `add_listener` / `remove_listener` call. Re-creating the
//! closure at attach time would hand `remove_listener` a different handle
//! than the one registered, and the listener would never detach.

use std::sync::Arc;

use lapse_core::{SourceEvent, Visibility};

use crate::{EventSource, Listener};

/// Map an event to the tab state it reports.
///
/// `blur`/`pagehide` always mean hidden and `focus`/`pageshow` always mean
/// visible. Any other name (notably `visibilitychange`) reports whatever
/// document state the event carries; events without one are ignored.
pub fn classify_visibility(event: &SourceEvent) -> Option<Visibility> {
    match event.name.as_str() {
        "blur" | "pagehide" => Some(Visibility::Hidden),
        "focus" | "pageshow" => Some(Visibility::Visible),
        _ => event.visibility,
    }
}

// ---------------------------------------------------------------------------
// Subscription: one listener, many names
// ---------------------------------------------------------------------------

struct Subscription {
    source: Arc<dyn EventSource>,
    names: Vec<String>,
    listener: Listener,
    attached: bool,
}

impl Subscription {
    fn new(source: Arc<dyn EventSource>, names: Vec<String>, listener: Listener) -> Self {
        Self {
            source,
            names,
            listener,
            attached: false,
        }
    }

    fn attach(&mut self, what: &'static str) -> bool {
        if self.attached {
            return false;
        }
        for name in &self.names {
            self.source.add_listener(name, Arc::clone(&self.listener));
        }
        self.attached = true;
        tracing::debug!(monitor = what, events = self.names.len(), "listeners attached");
        true
    }

    fn detach(&mut self, what: &'static str) -> bool {
        if !self.attached {
            return false;
        }
        let removed = self
            .names
            .iter()
            .filter(|name| self.source.remove_listener(name, &self.listener))
            .count();
        if removed != self.names.len() {
            tracing::warn!(
                monitor = what,
                expected = self.names.len(),
                removed,
                "some listeners were already gone at detach"
            );
        }
        self.attached = false;
        tracing::debug!(monitor = what, removed, "listeners detached");
        true
    }
}

// ---------------------------------------------------------------------------
// ActivityMonitor
// ---------------------------------------------------------------------------

/// Reports every configured interaction event as activity.
///
/// No debouncing happens here; every event reaches `on_activity`.
/// Dropping the monitor detaches it.
pub struct ActivityMonitor {
    inner: Subscription,
}

impl ActivityMonitor {
    pub fn new<F>(
        source: Arc<dyn EventSource>,
        names: impl IntoIterator<Item = String>,
        on_activity: F,
    ) -> Self
    where
        F: Fn(&SourceEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(on_activity);
        Self {
            inner: Subscription::new(source, names.into_iter().collect(), listener),
        }
    }

    /// Register the listener for every configured name.
    /// Returns `false` if already attached.
    pub fn attach(&mut self) -> bool {
        self.inner.attach("activity")
    }

    /// Remove the listener from every configured name.
    /// Returns `false` if not attached.
    pub fn detach(&mut self) -> bool {
        self.inner.detach("activity")
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}

// ---------------------------------------------------------------------------
// VisibilityMonitor
// ---------------------------------------------------------------------------

/// Reports tab hidden/visible transitions.
///
/// Events are classified with [`classify_visibility`]; unclassifiable
/// events are dropped. Dropping the monitor detaches it.
pub struct VisibilityMonitor {
    inner: Subscription,
}

impl VisibilityMonitor {
    pub fn new<F>(
        source: Arc<dyn EventSource>,
        names: impl IntoIterator<Item = String>,
        on_change: F,
    ) -> Self
    where
        F: Fn(Visibility) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(move |event: &SourceEvent| {
            match classify_visibility(event) {
                Some(state) => on_change(state),
                None => tracing::trace!(event = %event.name, "unclassified visibility event"),
            }
        });
        Self {
            inner: Subscription::new(source, names.into_iter().collect(), listener),
        }
    }

    pub fn attach(&mut self) -> bool {
        self.inner.attach("visibility")
    }

    pub fn detach(&mut self) -> bool {
        self.inner.detach("visibility")
    }

    pub fn is_attached(&self) -> bool {
        self.inner.attached
    }
}

impl Drop for VisibilityMonitor {
    fn drop(&mut self) {
        self.detach();
    }
}
