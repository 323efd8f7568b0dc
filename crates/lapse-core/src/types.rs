//! Core types shared by every Lapse layer.
//!
//! These describe the session lifecycle without implementing it: which
//! phase a session is in, which signals can arrive from the page, and why
//! a session ended.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifies one epoch: a single `initialize()`-to-`destroy()`/expiry
/// lifespan of a session manager.
///
/// Epoch numbers only grow, so log lines from an old epoch can never be
/// mistaken for the current one after a re-login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EpochId(pub u64);

impl EpochId {
    /// Returns the epoch that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
///   Active ──(idle for timeout − lead)──→ WarningShown ──(idle for lead)──→ Expired
///     ↑                                        │
///     └──────────(activity or Extend)──────────┘
///
///   Active | WarningShown ──(tab hidden too long / check fails / logout)──→ Expired
/// ```
///
/// `Expired` is terminal for the epoch. Only a fresh `initialize()`
/// starts a new epoch back in `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// The user is considered present; timers are counting down.
    Active,
    /// The expiry prompt is on screen.
    WarningShown,
    /// The session has ended for this epoch.
    Expired,
}

impl SessionPhase {
    /// Returns `true` once nothing but a new epoch can revive the session.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired)
    }

    /// Returns `true` if moving from `self` to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (Self::Expired, _) => false,
            (Self::Active, Self::WarningShown) => true,
            (Self::WarningShown, Self::Active) => true,
            (_, Self::Expired) => true,
            // A reset while already active re-enters Active.
            (Self::Active, Self::Active) => true,
            (Self::WarningShown, Self::WarningShown) => false,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::WarningShown => write!(f, "WarningShown"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

// ---------------------------------------------------------------------------
// Signals from the page
// ---------------------------------------------------------------------------

/// Whether the tab is the one the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Hidden,
    Visible,
}

/// A single event delivered by an event source.
///
/// `name` is the DOM-style event name (`"keydown"`, `"blur"`, ...).
/// `visibility` is the document state observed when the event fired; it is
/// only needed for names like `visibilitychange` whose meaning depends on
/// that state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEvent {
    pub name: String,
    pub visibility: Option<Visibility>,
}

impl SourceEvent {
    /// An event whose name alone carries its meaning.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: None,
        }
    }

    /// A `visibilitychange` event reporting the new document state.
    pub fn visibility_change(state: Visibility) -> Self {
        Self {
            name: "visibilitychange".to_string(),
            visibility: Some(state),
        }
    }
}

// ---------------------------------------------------------------------------
// ExpiryReason
// ---------------------------------------------------------------------------

/// Why an epoch ended.
///
/// Handed to the `on_expired` callback and recorded in logs. Each variant
/// maps to exactly one path into the expiry handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryReason {
    /// The inactivity timer ran out.
    Inactivity,
    /// The tab stayed hidden until the tab-hidden timer fired.
    TabHidden,
    /// The tab came back after the tab-hidden grace window had elapsed.
    TabHiddenOnReturn,
    /// The auth backend reported no current session.
    NoSession,
    /// The backend-declared expiry time has passed.
    DeclaredExpiry,
    /// The periodic check found the inactivity window already exceeded.
    IdleBackstop,
    /// The periodic check found the tab hidden past its grace window.
    TabHiddenBackstop,
    /// The periodic check could not reach the auth backend.
    CheckFailed,
    /// The application called `logout()`.
    Logout,
    /// The user chose "log out now" on the warning prompt.
    PromptLogout,
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Inactivity => "inactivity timeout",
            Self::TabHidden => "tab hidden too long",
            Self::TabHiddenOnReturn => "tab returned after grace window",
            Self::NoSession => "no backend session",
            Self::DeclaredExpiry => "backend session expired",
            Self::IdleBackstop => "inactivity backstop",
            Self::TabHiddenBackstop => "tab-hidden backstop",
            Self::CheckFailed => "session check failed",
            Self::Logout => "logout requested",
            Self::PromptLogout => "logout chosen on prompt",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_id_next_increments() {
        assert_eq!(EpochId(1).next(), EpochId(2));
    }

    #[test]
    fn test_epoch_id_display() {
        assert_eq!(EpochId(7).to_string(), "E-7");
    }

    #[test]
    fn test_session_phase_expired_is_terminal() {
        assert!(SessionPhase::Expired.is_terminal());
        assert!(!SessionPhase::Active.is_terminal());
        assert!(!SessionPhase::WarningShown.is_terminal());
    }

    #[test]
    fn test_session_phase_transitions() {
        use SessionPhase::*;
        assert!(Active.can_transition_to(WarningShown));
        assert!(WarningShown.can_transition_to(Active));
        assert!(Active.can_transition_to(Expired));
        assert!(WarningShown.can_transition_to(Expired));
        assert!(!Expired.can_transition_to(Active));
        assert!(!Expired.can_transition_to(Expired));
        assert!(!WarningShown.can_transition_to(WarningShown));
    }

    #[test]
    fn test_source_event_constructors() {
        let key = SourceEvent::named("keydown");
        assert_eq!(key.name, "keydown");
        assert_eq!(key.visibility, None);

        let change = SourceEvent::visibility_change(Visibility::Hidden);
        assert_eq!(change.name, "visibilitychange");
        assert_eq!(change.visibility, Some(Visibility::Hidden));
    }

    #[test]
    fn test_expiry_reason_display() {
        assert_eq!(ExpiryReason::Inactivity.to_string(), "inactivity timeout");
        assert_eq!(ExpiryReason::PromptLogout.to_string(), "logout chosen on prompt");
    }
}
