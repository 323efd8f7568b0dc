//! Drive a Lapse session from the terminal.
//!
//! Every line you type counts as activity. Stop typing for 45 seconds and
//! the warning appears; answer `y` to stay signed in or `n` to log out.
//!
//! ```text
//! hide / show   tab goes to the background / comes back (20s grace)
//! extend        same as answering `y`
//! status        print the session snapshot
//! logout        end the session now
//! login         start a new session after one ended
//! quit          exit
//! ```
//!
//! Run with `RUST_LOG=lapse_session=debug` to watch the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use lapse::prelude::*;
use lapse::PromptActions;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Auth backend that keeps a one-hour session until signed out.
struct DemoAuth {
    signed_in: Arc<AtomicBool>,
}

impl AuthBackend for DemoAuth {
    async fn current_session(&self) -> Result<Option<SessionInfo>, AuthError> {
        if !self.signed_in.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(SessionInfo {
            expires_at: SystemTime::now() + Duration::from_secs(3600),
        }))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Prints the prompt and keeps its actions for the next `y`/`n`.
#[derive(Default)]
struct TerminalPrompt {
    pending: Mutex<Option<PromptActions>>,
}

impl TerminalPrompt {
    fn take(&self) -> Option<PromptActions> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Presenter for TerminalPrompt {
    fn show(&self, prompt: WarningPrompt) {
        println!(
            "\n*** Your session expires in {}s. Stay signed in? [y/n]",
            prompt.expires_in.as_secs()
        );
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(prompt.actions);
    }

    fn hide(&self) {
        if self.take().is_some() {
            println!("(warning dismissed)");
        }
    }
}

fn config() -> SessionConfig {
    let mut config = SessionConfig::with_timeouts(Duration::from_secs(60), Duration::from_secs(15));
    config.check_interval = Duration::from_secs(10);
    config.tab_hidden_timeout = Duration::from_secs(20);
    config
}

fn callbacks(expired: mpsc::UnboundedSender<ExpiryReason>) -> SessionCallbacks {
    SessionCallbacks::new()
        .on_expired(move |reason| {
            let _ = expired.send(reason);
        })
        .on_warning(|| tracing::debug!("warning hook called"))
}

#[tokio::main]
async fn main() -> Result<(), LapseError> {
    lapse::init_tracing("lapse=info,lapse_session=info,idle_terminal=info")?;

    let source = Arc::new(ManualEventSource::new());
    let prompt = Arc::new(TerminalPrompt::default());
    let (expired_tx, mut expired_rx) = mpsc::unbounded_channel();
    let signed_in = Arc::new(AtomicBool::new(true));

    let mut manager = LapseBuilder::new()
        .config(config())
        .presenter(prompt.clone())
        .build(
            DemoAuth {
                signed_in: signed_in.clone(),
            },
            source.clone(),
        )?;
    let epoch = manager.initialize(callbacks(expired_tx.clone()))?;
    println!("Signed in ({epoch}). Type anything to stay active; `quit` to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(reason) = expired_rx.recv() => {
                println!("\nSession ended: {reason}. Type `login` to sign in again.");
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match line.trim() {
                    "quit" => break,
                    "hide" => {
                        source.emit(&SourceEvent::visibility_change(Visibility::Hidden));
                    }
                    "show" => {
                        source.emit(&SourceEvent::visibility_change(Visibility::Visible));
                    }
                    "extend" => manager.extend_session()?,
                    "logout" => manager.logout().await?,
                    "status" => {
                        let snapshot = manager.snapshot().await?;
                        println!(
                            "{} {} | expires in {}s | tab {} | {} timers live",
                            snapshot.epoch,
                            snapshot.phase,
                            snapshot.time_until_expiry.as_secs(),
                            if snapshot.tab_visible { "visible" } else { "hidden" },
                            snapshot.live_timers,
                        );
                    }
                    "login" => {
                        signed_in.store(true, Ordering::SeqCst);
                        match manager.initialize(callbacks(expired_tx.clone())) {
                            Ok(epoch) => println!("Signed in ({epoch})."),
                            Err(e) => println!("{e}"),
                        }
                    }
                    "y" | "n" => match prompt.take() {
                        Some(actions) if line.trim() == "y" => {
                            actions.extend();
                        }
                        Some(actions) => {
                            actions.logout_now();
                        }
                        None => {
                            source.emit(&SourceEvent::named("keydown"));
                        }
                    },
                    _ => {
                        source.emit(&SourceEvent::named("keydown"));
                    }
                }
            }
        }
    }

    manager.destroy().await;
    Ok(())
}
