//! Task list with urgency tags and the smoking timer.
//!
//! Both live in one stored record, the same shape the mobile app wrote:
//! `{ "tasks": [...], "smoke": <unix ms> }`.

use crate::consts::{keys, limits, messages};
use crate::notify::NotificationScheduler;
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Text is empty")] EmptyText,
    #[error("No entry with id {0}")] UnknownId(String),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "طارئة")]
    Urgent,
    #[serde(rename = "عادية")]
    Normal,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Urgent => write!(f, "طارئة"),
            Urgency::Normal => write!(f, "عادية"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PlannerRecord {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    smoke: Option<i64>,
}

/// Millisecond timestamp id, bumped until it is unused.
pub(crate) fn next_id<'a>(now: DateTime<Utc>, taken: impl Iterator<Item = &'a str> + Clone) -> String {
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !taken.clone().any(|t| t == id) {
            return id;
        }
        candidate += 1;
    }
}

pub struct Planner {
    store: Arc<Store>,
    notifier: Arc<NotificationScheduler>,
    // Serialises load-modify-save cycles on the shared record.
    edit: Mutex<()>,
}

impl Planner {
    pub fn new(store: Arc<Store>, notifier: Arc<NotificationScheduler>) -> Self {
        Self { store, notifier, edit: Mutex::new(()) }
    }

    async fn load(&self) -> Result<PlannerRecord, PlannerError> {
        Ok(self.store.get::<PlannerRecord>(keys::PLANNER).await?.unwrap_or_default())
    }

    async fn save(&self, record: &PlannerRecord) -> Result<(), PlannerError> {
        Ok(self.store.set(keys::PLANNER, record).await?)
    }

    pub async fn tasks(&self) -> Result<Vec<Task>, PlannerError> {
        Ok(self.load().await?.tasks)
    }

    /// Adds a task at the top of the list.
    pub async fn add_task(&self, text: &str, urgent: bool, now: DateTime<Utc>) -> Result<Task, PlannerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::EmptyText);
        }

        let _edit = self.edit.lock().await;
        let mut record = self.load().await?;
        let task = Task {
            id: next_id(now, record.tasks.iter().map(|t| t.id.as_str())),
            text: text.to_string(),
            urgency: if urgent { Urgency::Urgent } else { Urgency::Normal },
        };
        record.tasks.insert(0, task.clone());
        self.save(&record).await?;
        Ok(task)
    }

    pub async fn remove_task(&self, id: &str) -> Result<Task, PlannerError> {
        let id = id.trim();
        let _edit = self.edit.lock().await;
        let mut record = self.load().await?;
        let pos = record.tasks.iter()
            .position(|t| t.id == id)
            .ok_or_else(|| PlannerError::UnknownId(id.to_string()))?;
        let task = record.tasks.remove(pos);
        self.save(&record).await?;
        Ok(task)
    }

    pub async fn last_smoke(&self) -> Result<Option<DateTime<Utc>>, PlannerError> {
        Ok(self.load().await?.smoke.and_then(DateTime::<Utc>::from_timestamp_millis))
    }

    /// Records a cigarette and arms the one-hour "hold on" reminder.
    ///
    /// Every reminder still pending for `recipient` is cancelled first,
    /// lecture reminders included.
    pub async fn record_smoke(&self, recipient: i64, now: DateTime<Utc>) -> Result<(), PlannerError> {
        let _edit = self.edit.lock().await;
        let mut record = self.load().await?;
        record.smoke = Some(now.timestamp_millis());
        self.save(&record).await?;

        self.notifier.cancel_all(recipient);
        self.notifier.schedule(
            recipient,
            messages::SMOKE_TITLE,
            messages::SMOKE_BODY,
            Duration::from_secs(limits::SMOKE_DELAY_SECS),
        );
        Ok(())
    }
}
