//! The auth backend seam.
//!
//! Lapse doesn't verify credentials or issue sessions; the hosted auth
//! service does. It only needs two things from it: "is there a
//! session, and when does it expire?" and "sign this session out".
//! [`AuthBackend`] captures exactly that, so production code can talk to
//! the real service while tests plug in a counting fake.

use std::time::SystemTime;

use crate::AuthError;

/// What the backend knows about the current session.
///
/// A backend with no session answers `Ok(None)` rather than building one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    /// Backend-declared end of the session (wall clock).
    pub expires_at: SystemTime,
}

/// Access to the hosted auth service.
///
/// # Trait bounds
///
/// - `Send + Sync` → calls run on spawned Tokio tasks, possibly on
///   different worker threads.
/// - `'static` → the backend lives as long as the session manager.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, SystemTime};
/// use lapse_session::{AuthBackend, AuthError, SessionInfo};
///
/// /// Always reports a session valid for another hour.
/// struct AlwaysSignedIn;
///
/// impl AuthBackend for AlwaysSignedIn {
///     async fn current_session(&self) -> Result<Option<SessionInfo>, AuthError> {
///         Ok(Some(SessionInfo {
///             expires_at: SystemTime::now() + Duration::from_secs(3600),
///         }))
///     }
///
///     async fn sign_out(&self) -> Result<(), AuthError> {
///         Ok(())
///     }
/// }
/// ```
pub trait AuthBackend: Send + Sync + 'static {
    /// Fetch the current session and its declared expiry.
    ///
    /// # Returns
    /// - `Ok(Some(info))`: a session exists
    /// - `Ok(None)`: nobody is signed in
    /// - `Err(_)`: the backend couldn't say; callers treat this as invalid
    fn current_session(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<SessionInfo>, AuthError>> + Send;

    /// End the session on the backend.
    ///
    /// Must tolerate being called when already signed out.
    fn sign_out(&self) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;
}
