//! Keystroke debouncing for the search parameter.

use std::sync::Mutex;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "application::search";

/// Default quiet period before raw input becomes the effective search.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Collapses rapid successive raw inputs into one effective transition.
///
/// Two states: *idle* (no timer armed) and *pending* (a timer armed for
/// the latest raw input). Each call to [`Self::set_input`] cancels any
/// pending timer and arms a new one; only an uninterrupted firing
/// publishes the value. Dropping the debouncer cancels a pending timer so
/// no update dangles past teardown.
pub struct SearchDebouncer {
    delay: Duration,
    effective: watch::Sender<String>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        let (effective, _) = watch::channel(String::new());
        Self {
            delay,
            effective,
            pending: Mutex::new(None),
        }
    }

    /// Feed one raw input change. Must be called from within a tokio
    /// runtime: the armed timer is a spawned task.
    pub fn set_input(&self, text: impl Into<String>) {
        let text = text.into();
        let tx = self.effective.clone();
        let delay = self.delay;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let changed = tx.send_if_modified(|current| {
                if *current == text {
                    false
                } else {
                    *current = text.clone();
                    true
                }
            });
            if changed {
                counter!("saldo_search_debounce_fired_total").increment(1);
                debug!(search = %text, "Effective search updated");
            }
        });

        let mut pending = mutex_lock(&self.pending, SOURCE, "set_input");
        if let Some(superseded) = pending.replace(timer) {
            superseded.abort();
        }
    }

    /// The current effective (debounced) search text.
    pub fn effective(&self) -> String {
        self.effective.borrow().clone()
    }

    /// Subscribe to effective-search transitions.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.effective.subscribe()
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        if let Some(timer) = mutex_lock(&self.pending, SOURCE, "drop").take() {
            timer.abort();
        }
    }
}
