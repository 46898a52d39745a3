//! Debounced advice requests.
//!
//! Each label change bumps a generation counter and aborts whatever request
//! was still waiting. A request fires only after the quiet period, and its
//! result is delivered tagged with the generation it was issued under;
//! [`AdviceDebouncer::accept`] drops anything that is no longer current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Advice, AdviceProvider};

/// A finished request. `advice` is `None` when the provider failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceUpdate {
    pub generation: u64,
    pub label: String,
    pub advice: Option<Advice>,
}

pub struct AdviceDebouncer {
    provider: Arc<dyn AdviceProvider>,
    quiet: Duration,
    min_chars: usize,
    generation: Arc<AtomicU64>,
    last_label: Option<String>,
    pending: Option<JoinHandle<()>>,
    tx: mpsc::UnboundedSender<AdviceUpdate>,
}

impl AdviceDebouncer {
    pub fn new(
        provider: Arc<dyn AdviceProvider>,
        quiet: Duration,
        min_chars: usize,
    ) -> (Self, mpsc::UnboundedReceiver<AdviceUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            provider,
            quiet,
            min_chars,
            generation: Arc::new(AtomicU64::new(0)),
            last_label: None,
            pending: None,
            tx,
        };
        (debouncer, rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The label changed. Schedules a request unless it is too short or the
    /// same as the last one. Must be called inside a tokio runtime.
    ///
    /// Returns true if a request was scheduled.
    pub fn request(&mut self, label: Option<&str>) -> bool {
        let label = label.map(str::trim).filter(|l| !l.is_empty());
        if label == self.last_label.as_deref() {
            return false;
        }
        self.invalidate();
        self.last_label = label.map(str::to_string);

        let Some(label) = label else {
            return false;
        };
        if label.chars().count() < self.min_chars {
            debug!(label, "label too short for advice");
            return false;
        }

        let generation = self.generation();
        let current = Arc::clone(&self.generation);
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let quiet = self.quiet;
        let label = label.to_string();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let advice = match provider.advise(&label).await {
                Ok(advice) => Some(advice),
                Err(e) => {
                    warn!(error = %e, "advice request failed");
                    None
                }
            };
            // The receiver may be gone at shutdown.
            let _ = tx.send(AdviceUpdate {
                generation,
                label,
                advice,
            });
        }));
        true
    }

    /// The advice in `update`, if it is still the latest request's.
    pub fn accept(&self, update: AdviceUpdate) -> Option<Advice> {
        if update.generation != self.generation() {
            debug!(
                stale = update.generation,
                current = self.generation(),
                "dropping stale advice"
            );
            return None;
        }
        update.advice
    }

    /// Abort any waiting request and forget the last label.
    pub fn cancel(&mut self) {
        self.invalidate();
        self.last_label = None;
    }

    fn invalidate(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for AdviceDebouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdviceError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl AdviceProvider for Recording {
        async fn advise(&self, task: &str) -> Result<Advice, AdviceError> {
            self.calls.lock().unwrap().push(task.to_string());
            if self.fail {
                return Err(AdviceError::Malformed("boom".into()));
            }
            Ok(Advice {
                tip: format!("tip for {task}"),
                strategy: "s".into(),
                focus_mantra: "m".into(),
            })
        }
    }

    fn debouncer(
        provider: Arc<Recording>,
    ) -> (AdviceDebouncer, mpsc::UnboundedReceiver<AdviceUpdate>) {
        AdviceDebouncer::new(provider, Duration::from_millis(1500), 5)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_fire_once_for_the_last_label() {
        let provider = Arc::new(Recording::default());
        let (mut d, mut rx) = debouncer(provider.clone());
        assert!(d.request(Some("write report")));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(d.request(Some("write report v2")));

        let update = rx.recv().await.unwrap();
        assert_eq!(update.label, "write report v2");
        assert!(d.accept(update).is_some());
        assert_eq!(*provider.calls.lock().unwrap(), vec!["write report v2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn short_and_repeated_labels_are_ignored() {
        let provider = Arc::new(Recording::default());
        let (mut d, mut rx) = debouncer(provider.clone());
        assert!(!d.request(Some("abc")));
        assert!(d.request(Some("plan sprint")));
        assert!(!d.request(Some("plan sprint")));
        rx.recv().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_results_are_discarded() {
        let provider = Arc::new(Recording::default());
        let (mut d, mut rx) = debouncer(provider);
        d.request(Some("first task"));
        let first = rx.recv().await.unwrap();
        d.request(Some("second task"));
        assert!(d.accept(first).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_leaves_nothing_behind() {
        let provider = Arc::new(Recording::default());
        let (mut d, mut rx) = debouncer(provider.clone());
        d.request(Some("deep work block"));
        d.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        assert!(provider.calls.lock().unwrap().is_empty());
        // The same label may be requested again after a cancel.
        assert!(d.request(Some("deep work block")));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_yield_no_advice() {
        let provider = Arc::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let (mut d, mut rx) = debouncer(provider);
        d.request(Some("write tests"));
        let update = rx.recv().await.unwrap();
        assert!(update.advice.is_none());
        assert!(d.accept(update).is_none());
    }
}
