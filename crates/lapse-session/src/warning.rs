//! The pre-expiry warning.
//!
//! Wraps the host's [`Presenter`] with the "at most one prompt" guard and
//! the optional `on_warning` hook.

use std::sync::Arc;

use crate::presenter::{Presenter, WarningPrompt};
use crate::state::WarningCallback;

pub(crate) struct WarningController {
    presenter: Arc<dyn Presenter>,
    on_warning: Option<WarningCallback>,
    shown: bool,
}

impl WarningController {
    pub(crate) fn new(presenter: Arc<dyn Presenter>, on_warning: Option<WarningCallback>) -> Self {
        Self {
            presenter,
            on_warning,
            shown: false,
        }
    }

    /// Show the prompt. No-op returning `false` if one is already up.
    pub(crate) fn show(&mut self, prompt: WarningPrompt) -> bool {
        if self.shown {
            return false;
        }
        self.shown = true;
        self.presenter.show(prompt);
        if let Some(on_warning) = &self.on_warning {
            on_warning();
        }
        true
    }

    /// Hide the prompt. No-op returning `false` if none is up.
    pub(crate) fn hide(&mut self) -> bool {
        if !self.shown {
            return false;
        }
        self.shown = false;
        self.presenter.hide();
        true
    }

    pub(crate) fn is_shown(&self) -> bool {
        self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::PromptActions;
    use lapse_core::EpochId;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct Recording {
        log: Mutex<Vec<&'static str>>,
    }

    impl Presenter for Recording {
        fn show(&self, _prompt: WarningPrompt) {
            self.log.lock().unwrap().push("show");
        }

        fn hide(&self) {
            self.log.lock().unwrap().push("hide");
        }
    }

    fn prompt() -> WarningPrompt {
        let (tx, _rx) = mpsc::unbounded_channel();
        WarningPrompt {
            epoch: EpochId(1),
            expires_in: Duration::from_secs(60),
            actions: PromptActions::new(EpochId(1), tx.downgrade()),
        }
    }

    #[test]
    fn test_show_twice_presents_once() {
        let presenter = Arc::new(Recording::default());
        let warned = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&warned);
        let mut warning = WarningController::new(
            presenter.clone(),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        assert!(warning.show(prompt()));
        assert!(!warning.show(prompt()));

        assert!(warning.is_shown());
        assert_eq!(*presenter.log.lock().unwrap(), vec!["show"]);
        assert_eq!(warned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hide_without_prompt_is_noop() {
        let presenter = Arc::new(Recording::default());
        let mut warning = WarningController::new(presenter.clone(), None);

        assert!(!warning.hide());
        assert!(presenter.log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_show_after_hide_presents_again() {
        let presenter = Arc::new(Recording::default());
        let mut warning = WarningController::new(presenter.clone(), None);

        warning.show(prompt());
        assert!(warning.hide());
        assert!(warning.show(prompt()));

        assert_eq!(*presenter.log.lock().unwrap(), vec!["show", "hide", "show"]);
    }

    #[test]
    fn test_prompt_actions_after_epoch_gone_return_false() {
        let (tx, rx) = mpsc::unbounded_channel();
        let actions = PromptActions::new(EpochId(3), tx.downgrade());
        drop(tx);
        drop(rx);

        assert!(!actions.extend());
        assert!(!actions.logout_now());
    }
}
