use crate::consts::keys;
use crate::planner::next_id;
use crate::store::{Store, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum IdeaError {
    #[error("Idea is empty")] EmptyText,
    #[error("No idea with id {0}")] UnknownId(String),
    #[error(transparent)] Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub text: String,
}

/// Free-text notebook, newest entry first.
pub struct Ideas {
    store: Arc<Store>,
    edit: Mutex<()>,
}

impl Ideas {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store, edit: Mutex::new(()) }
    }

    pub async fn list(&self) -> Result<Vec<Idea>, IdeaError> {
        Ok(self.store.get::<Vec<Idea>>(keys::IDEAS).await?.unwrap_or_default())
    }

    pub async fn add(&self, text: &str, now: DateTime<Utc>) -> Result<Idea, IdeaError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(IdeaError::EmptyText);
        }

        let _edit = self.edit.lock().await;
        let mut ideas = self.list().await?;
        let idea = Idea {
            id: next_id(now, ideas.iter().map(|i| i.id.as_str())),
            text: text.to_string(),
        };
        ideas.insert(0, idea.clone());
        self.store.set(keys::IDEAS, &ideas).await?;
        Ok(idea)
    }

    pub async fn delete(&self, id: &str) -> Result<Idea, IdeaError> {
        let id = id.trim();
        let _edit = self.edit.lock().await;
        let mut ideas = self.list().await?;
        let pos = ideas.iter()
            .position(|i| i.id == id)
            .ok_or_else(|| IdeaError::UnknownId(id.to_string()))?;
        let idea = ideas.remove(pos);
        self.store.set(keys::IDEAS, &ideas).await?;
        Ok(idea)
    }
}
