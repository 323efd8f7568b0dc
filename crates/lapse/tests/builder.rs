//! Builder wiring tests.

use std::sync::Mutex;
use std::time::Duration;

use lapse::prelude::*;
use lapse::{ConfigError, MemoryStore, SessionError};

struct NoBackend;

impl AuthBackend for NoBackend {
    async fn current_session(&self) -> Result<Option<SessionInfo>, AuthError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

#[derive(Default)]
struct Routes(Mutex<Vec<String>>);

impl Navigator for Routes {
    fn navigate(&self, route: &str) {
        self.0.lock().unwrap().push(route.to_string());
    }
}

fn source() -> Arc<dyn EventSource> {
    Arc::new(ManualEventSource::new())
}

#[tokio::test]
async fn test_build_defaults_uses_default_config() {
    let manager = LapseBuilder::new().build(NoBackend, source()).unwrap();

    assert_eq!(manager.config(), &SessionConfig::default());
    assert_eq!(manager.phase(), None);
}

#[tokio::test]
async fn test_build_invalid_config_is_session_error() {
    let bad = SessionConfig::with_timeouts(Duration::from_secs(10), Duration::from_secs(20));

    let result = LapseBuilder::new().config(bad).build(NoBackend, source());

    assert!(matches!(
        result,
        Err(LapseError::Session(SessionError::Config(
            ConfigError::WarningLeadTooLong { .. }
        )))
    ));
}

#[tokio::test]
async fn test_build_config_file_overrides_explicit_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(
        &path,
        r#"{
            "sessionTimeoutMs": 120000,
            "warningLeadMs": 30000,
            "checkIntervalMs": 15000,
            "tabHiddenTimeoutMs": 60000,
            "activityEventNames": ["keydown", "mousedown"],
            "visibilityEventNames": ["visibilitychange"],
            "loginRoute": "/signin"
        }"#,
    )
    .unwrap();

    let manager = LapseBuilder::new()
        .config(SessionConfig::default())
        .config_file(&path)
        .build(NoBackend, source())
        .unwrap();

    assert_eq!(manager.config().session_timeout, Duration::from_secs(120));
    assert_eq!(manager.config().login_route, "/signin");
}

#[tokio::test]
async fn test_build_missing_config_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = LapseBuilder::new()
        .config_file(dir.path().join("absent.json"))
        .build(NoBackend, source());

    assert!(matches!(result, Err(LapseError::Config(ConfigError::Io(_)))));
}

#[tokio::test(start_paused = true)]
async fn test_built_manager_uses_injected_pieces() {
    let routes = Arc::new(Routes::default());
    let store = Arc::new(MemoryStore::new());
    store.insert("auth-session", "token");

    let mut manager = LapseBuilder::new()
        .navigator(routes.clone())
        .store(store.clone())
        .build(NoBackend, source())
        .unwrap();
    manager.initialize(SessionCallbacks::new()).unwrap();
    manager.logout().await.unwrap();

    assert_eq!(*routes.0.lock().unwrap(), vec!["/login".to_string()]);
    assert_eq!(store.get("auth-session"), None);
}

#[test]
fn test_init_tracing_rejects_bad_directive() {
    // Only the parse path is exercised; installing a global subscriber
    // would leak into other tests.
    if std::env::var_os("RUST_LOG").is_none() {
        let result = lapse::init_tracing("lapse=notalevel");
        assert!(matches!(result, Err(LapseError::Telemetry(_))));
    }
}
