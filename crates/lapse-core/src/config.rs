//! Session manager configuration.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timeouts and event names for one session manager.
///
/// Supplied once and immutable for the lifetime of the manager. The
/// serialized form uses camelCase keys and integer milliseconds, so a
/// config written for the web client loads unchanged:
///
/// ```json
/// {
///   "sessionTimeoutMs": 300000,
///   "warningLeadMs": 60000,
///   "checkIntervalMs": 60000,
///   "tabHiddenTimeoutMs": 120000,
///   "activityEventNames": ["keydown", "mousedown"],
///   "visibilityEventNames": ["visibilitychange", "blur", "focus"]
/// }
/// ```
///
/// The first six keys are required. The rest fall back to the values
/// documented on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Inactivity window after which the session expires.
    #[serde(rename = "sessionTimeoutMs", with = "duration_ms")]
    pub session_timeout: Duration,

    /// How long before expiry the warning prompt appears.
    /// Must be strictly less than `session_timeout`.
    #[serde(rename = "warningLeadMs", with = "duration_ms")]
    pub warning_lead: Duration,

    /// Cadence of the periodic backend validity check.
    #[serde(rename = "checkIntervalMs", with = "duration_ms")]
    pub check_interval: Duration,

    /// How long the tab may stay hidden before the session is ended.
    #[serde(rename = "tabHiddenTimeoutMs", with = "duration_ms")]
    pub tab_hidden_timeout: Duration,

    /// Event names that count as user activity.
    #[serde(rename = "activityEventNames")]
    pub activity_events: BTreeSet<String>,

    /// Event names that report the tab becoming hidden or visible.
    #[serde(rename = "visibilityEventNames")]
    pub visibility_events: BTreeSet<String>,

    /// Minimum spacing between timer resets caused by activity.
    ///
    /// Zero (the default) resets the timers on every activity event.
    #[serde(rename = "activityThrottleMs", with = "duration_ms", default)]
    pub activity_throttle: Duration,

    /// Upper bound on each call to the auth backend. Default: 10 s.
    #[serde(
        rename = "authTimeoutMs",
        with = "duration_ms",
        default = "default_auth_timeout"
    )]
    pub auth_timeout: Duration,

    /// Random delay (0..jitter) added to the first periodic check so that
    /// many clients started together don't hit the backend in lockstep.
    /// Default: zero.
    #[serde(rename = "checkJitterMs", with = "duration_ms", default)]
    pub check_jitter: Duration,

    /// Where the default expiry handling navigates. Default: `/login`.
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// Persisted artifact removed when a session expires.
    /// Default: `auth-session`.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_auth_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_storage_key() -> String {
    "auth-session".to_string()
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|n| (*n).to_string()).collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(30 * 60),
            warning_lead: Duration::from_secs(5 * 60),
            check_interval: Duration::from_secs(60),
            tab_hidden_timeout: Duration::from_secs(10 * 60),
            activity_events: names(&[
                "click",
                "keydown",
                "keypress",
                "mousedown",
                "mousemove",
                "scroll",
                "touchstart",
                "wheel",
            ]),
            visibility_events: names(&[
                "blur",
                "focus",
                "pagehide",
                "pageshow",
                "visibilitychange",
            ]),
            activity_throttle: Duration::ZERO,
            auth_timeout: default_auth_timeout(),
            check_jitter: Duration::ZERO,
            login_route: default_login_route(),
            storage_key: default_storage_key(),
        }
    }
}

impl SessionConfig {
    /// Create a config with the given timeout and warning lead, keeping
    /// every other value at its default.
    pub fn with_timeouts(session_timeout: Duration, warning_lead: Duration) -> Self {
        Self {
            session_timeout,
            warning_lead,
            ..Default::default()
        }
    }

    /// Delay from a reset until the warning prompt opens.
    pub fn warning_delay(&self) -> Duration {
        self.session_timeout.saturating_sub(self.warning_lead)
    }

    /// Check that the config describes a usable state machine.
    ///
    /// # Errors
    /// - [`ConfigError::NonPositive`] if any timeout or interval is zero
    /// - [`ConfigError::WarningLeadTooLong`] if the warning would not
    ///   precede expiry
    /// - [`ConfigError::NoEvents`] if either event-name set is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("sessionTimeoutMs", self.session_timeout),
            ("warningLeadMs", self.warning_lead),
            ("checkIntervalMs", self.check_interval),
            ("tabHiddenTimeoutMs", self.tab_hidden_timeout),
            ("authTimeoutMs", self.auth_timeout),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::NonPositive { field });
            }
        }
        if self.warning_lead >= self.session_timeout {
            return Err(ConfigError::WarningLeadTooLong {
                lead: self.warning_lead,
                timeout: self.session_timeout,
            });
        }
        if self.activity_events.is_empty() {
            return Err(ConfigError::NoEvents {
                field: "activityEventNames",
            });
        }
        if self.visibility_events.is_empty() {
            return Err(ConfigError::NoEvents {
                field: "visibilityEventNames",
            });
        }
        if self.activity_throttle >= self.warning_delay() {
            tracing::warn!(
                throttle_ms = self.activity_throttle.as_millis() as u64,
                "activityThrottleMs is not shorter than the warning delay; \
                 activity may not dismiss the prompt promptly"
            );
        }
        Ok(())
    }

    /// Parse and validate a config from a JSON document.
    #[cfg(feature = "json")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    #[cfg(feature = "json")]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Serde adapter: `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
