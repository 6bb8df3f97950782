// src/observer.rs

//! Notification boundary and the tracing-backed signal renderer
//!
//! Orchestration correctness never depends on presentation: workflows only
//! emit [`StateSignal`]s, and rendering is one specific observer over the
//! channel. [`Notifier`] is the toast-style abstraction (progress token,
//! auto-dismissing success, persistent failure); [`LogNotifier`] renders it
//! through `tracing` for CLI and non-interactive use.

use crate::manager::PackageManager;
use crate::signal::{Phase, StateSignal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Opaque handle for one in-progress notification
pub type NotificationToken = u64;

/// Toast-style notification sink
///
/// Implementations must be thread-safe; the renderer task calls in from
/// outside the emitting workflow's call site.
pub trait Notifier: Send + Sync {
    /// Announce an operation in progress; the token keys later updates
    fn in_progress(&self, message: &str) -> NotificationToken;

    /// Resolve a token successfully (auto-dismisses after a short interval)
    fn succeed(&self, token: NotificationToken, message: &str);

    /// Resolve a token as failed (persistent, never auto-dismissed)
    fn fail(&self, token: NotificationToken, message: &str);

    /// Drop a token without a verdict (used on cancellation)
    fn dismiss(&self, token: NotificationToken);
}

/// Notifier rendering through `tracing`
///
/// Success auto-dismissal has no meaning in a log, so success is one info
/// line; failures log at error level, which persistent notification UIs
/// map to a sticky toast.
#[derive(Debug, Default)]
pub struct LogNotifier {
    next_token: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Notifier for LogNotifier {
    fn in_progress(&self, message: &str) -> NotificationToken {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        info!("[{}] {}", token, message);
        token
    }

    fn succeed(&self, token: NotificationToken, message: &str) {
        info!("[{}] {}", token, message);
    }

    fn fail(&self, token: NotificationToken, message: &str) {
        error!("[{}] {}", token, message);
    }

    fn dismiss(&self, _token: NotificationToken) {}
}

/// Drive a notifier from an environment's signal channel
///
/// Spawns a task that holds a subscription on the handle's channel and maps
/// phase transitions to notifier calls: `starting` opens a progress token,
/// `success`/`error` resolve it. The task ends when the channel closes
/// (handle dropped) and is detachable; abort the handle for early teardown.
pub fn spawn_signal_renderer(
    pm: &PackageManager,
    notifier: Arc<dyn Notifier>,
) -> JoinHandle<()> {
    let mut rx = pm.subscribe();
    tokio::spawn(async move {
        let mut open: Option<NotificationToken> = None;
        loop {
            let signal = match rx.recv().await {
                Ok(signal) => signal,
                Err(RecvError::Lagged(missed)) => {
                    warn!("signal renderer lagged, {} signal(s) dropped", missed);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            render(&*notifier, &mut open, &signal);
        }
    })
}

fn render(notifier: &dyn Notifier, open: &mut Option<NotificationToken>, signal: &StateSignal) {
    match signal.phase {
        Phase::Starting => {
            let what = match signal.mode {
                Some(mode) => format!("{} packages", mode),
                None => "packages".to_string(),
            };
            *open = Some(notifier.in_progress(&format!(
                "Working on {} in {}",
                what, signal.environment
            )));
        }
        Phase::Success => {
            if let Some(token) = open.take() {
                notifier.succeed(token, &format!("Done in {}", signal.environment));
            }
        }
        Phase::Error => {
            let message = signal.message.as_deref().unwrap_or("unknown error");
            let text = format!("Failed in {}: {}", signal.environment, message);
            match open.take() {
                Some(token) => notifier.fail(token, &text),
                None => {
                    notifier.fail(notifier.in_progress(&text), &text);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::UpdateMode;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<String>>,
        next: AtomicU64,
    }

    impl Notifier for RecordingNotifier {
        fn in_progress(&self, message: &str) -> NotificationToken {
            self.calls
                .lock()
                .unwrap()
                .push(format!("progress:{}", message));
            self.next.fetch_add(1, Ordering::Relaxed)
        }
        fn succeed(&self, _token: NotificationToken, message: &str) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("succeed:{}", message));
        }
        fn fail(&self, _token: NotificationToken, message: &str) {
            self.calls.lock().unwrap().push(format!("fail:{}", message));
        }
        fn dismiss(&self, _token: NotificationToken) {
            self.calls.lock().unwrap().push("dismiss".to_string());
        }
    }

    #[test]
    fn test_render_starting_then_success() {
        let notifier = RecordingNotifier::default();
        let mut open = None;

        render(
            &notifier,
            &mut open,
            &StateSignal::starting("base").with_mode(UpdateMode::All),
        );
        assert!(open.is_some());

        render(&notifier, &mut open, &StateSignal::success("base"));
        assert!(open.is_none());

        let calls = notifier.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("progress:"));
        assert!(calls[0].contains("all packages"));
        assert!(calls[1].starts_with("succeed:"));
    }

    #[test]
    fn test_render_error_is_persistent_failure() {
        let notifier = RecordingNotifier::default();
        let mut open = None;

        render(&notifier, &mut open, &StateSignal::starting("base"));
        render(
            &notifier,
            &mut open,
            &StateSignal::error("base", "solver failed"),
        );

        let calls = notifier.calls.lock().unwrap();
        assert!(calls[1].starts_with("fail:"));
        assert!(calls[1].contains("solver failed"));
    }

    #[test]
    fn test_render_orphan_error_still_fails() {
        let notifier = RecordingNotifier::default();
        let mut open = None;

        render(&notifier, &mut open, &StateSignal::error("base", "boom"));

        let calls = notifier.calls.lock().unwrap();
        assert!(calls.iter().any(|c| c.starts_with("fail:")));
    }
}
