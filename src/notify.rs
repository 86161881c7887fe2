//! Delayed notifications.
//!
//! Lifecycle: call [`init`] exactly once at startup to fix how delivered
//! notifications are presented, then build one [`NotificationScheduler`]
//! around a delivery sink. Nothing reconfigures presentation afterwards.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification presentation already initialised")]
    AlreadyInitialized,
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// How an incoming notification is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presentation {
    /// `false` records the notification in the log without delivering it
    pub show_alert: bool,
    pub play_sound: bool,
}

impl Default for Presentation {
    fn default() -> Self {
        Self { show_alert: true, play_sound: true }
    }
}

static PRESENTATION: OnceLock<Presentation> = OnceLock::new();

pub fn init(presentation: Presentation) -> Result<(), NotifyError> {
    PRESENTATION
        .set(presentation)
        .map_err(|_| NotifyError::AlreadyInitialized)
}

pub fn presentation() -> Presentation {
    match PRESENTATION.get() {
        Some(p) => *p,
        None => {
            log::warn!("Notification presentation used before init, falling back to defaults");
            Presentation::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: i64,
    pub title: String,
    pub body: String,
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification, presentation: Presentation) -> Result<(), NotifyError>;
}

pub struct NotificationScheduler {
    sink: Arc<dyn NotificationSink>,
    pending: Mutex<HashMap<i64, Vec<JoinHandle<()>>>>,
}

impl NotificationScheduler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Arc<Self> {
        Arc::new(Self { sink, pending: Mutex::new(HashMap::new()) })
    }

    /// Delivers `title`/`body` to `recipient` once `delay` has elapsed.
    pub fn schedule(&self, recipient: i64, title: &str, body: &str, delay: Duration) {
        let notification = Notification {
            recipient,
            title: title.to_string(),
            body: body.to_string(),
        };
        let sink = Arc::clone(&self.sink);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let presentation = presentation();
            if !presentation.show_alert {
                log::info!("Suppressed notification for {}: {}", notification.recipient, notification.title);
                return;
            }
            if let Err(e) = sink.deliver(&notification, presentation).await {
                log::error!("Failed to notify {}: {}", notification.recipient, e);
            }
        });

        log::info!("Scheduled \"{}\" for {} in {:?}", title, recipient, delay);
        let mut pending = self.pending();
        let handles = pending.entry(recipient).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Drops every notification still waiting for `recipient`.
    pub fn cancel_all(&self, recipient: i64) -> usize {
        let handles = self.pending().remove(&recipient).unwrap_or_default();
        let mut cancelled = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                cancelled += 1;
            }
        }
        log::debug!("Cancelled {} pending notifications for {}", cancelled, recipient);
        cancelled
    }

    pub fn pending_count(&self, recipient: i64) -> usize {
        self.pending()
            .get(&recipient)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<i64, Vec<JoinHandle<()>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) delivered: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        pub(crate) fn delivered(&self) -> Vec<Notification> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, notification: &Notification, _presentation: Presentation) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    pub(crate) async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn init_is_once_only() {
        let _ = init(Presentation::default());
        assert!(matches!(init(Presentation::default()), Err(NotifyError::AlreadyInitialized)));
        assert_eq!(presentation(), Presentation::default());
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_after_delay() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = NotificationScheduler::new(sink.clone());

        scheduler.schedule(7, "title", "body", Duration::from_secs(3600));
        tokio::time::sleep(Duration::from_secs(3599)).await;
        settle().await;
        assert!(sink.delivered().is_empty());
        assert_eq!(scheduler.pending_count(7), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(sink.delivered(), vec![Notification { recipient: 7, title: "title".into(), body: "body".into() }]);
        assert_eq!(scheduler.pending_count(7), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_only_touches_one_recipient() {
        let sink = Arc::new(RecordingSink::default());
        let scheduler = NotificationScheduler::new(sink.clone());

        scheduler.schedule(1, "a", "a", Duration::from_secs(10));
        scheduler.schedule(1, "b", "b", Duration::from_secs(20));
        scheduler.schedule(2, "c", "c", Duration::from_secs(10));

        assert_eq!(scheduler.cancel_all(1), 2);
        tokio::time::sleep(Duration::from_secs(30)).await;
        settle().await;

        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].recipient, 2);
    }
}
