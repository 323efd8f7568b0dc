//! Event-source abstraction layer for Lapse.
//!
//! Provides the [`EventSource`] trait that abstracts over wherever user
//! input and tab-visibility signals come from (a browser bridge, a
//! terminal, a test), plus the two monitors that turn raw events into
//! session signals:
//!
//! - [`ActivityMonitor`]: "the user did something just now"
//! - [`VisibilityMonitor`]: "the tab became hidden / visible"
//!
//! Listeners are registered and removed by identity: the same
//! [`Listener`] handle passed to `add_listener` must be passed to
//! `remove_listener`. Monitors create their listener once and keep it, so
//! detaching always removes exactly what was attached.

mod monitor;
mod source;

pub use monitor::{ActivityMonitor, VisibilityMonitor, classify_visibility};
pub use source::ManualEventSource;

use std::sync::Arc;

use lapse_core::SourceEvent;

/// A callback registered with an [`EventSource`].
///
/// Compared by pointer identity (`Arc::ptr_eq`), never by behaviour.
pub type Listener = Arc<dyn Fn(&SourceEvent) + Send + Sync>;

/// Something that emits named events to registered listeners.
///
/// Mirrors the DOM `addEventListener` / `removeEventListener` pair.
/// Listeners are invoked synchronously on the emitting thread and must
/// not block.
pub trait EventSource: Send + Sync + 'static {
    /// Register `listener` for events called `name`.
    ///
    /// Registering the same listener twice for one name has no effect.
    fn add_listener(&self, name: &str, listener: Listener);

    /// Remove a previously registered listener.
    ///
    /// Returns `true` if `listener` (by identity) was registered for `name`.
    fn remove_listener(&self, name: &str, listener: &Listener) -> bool;
}
