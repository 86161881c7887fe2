//! JSON-file key-value store.
//!
//! The whole file is one JSON object of `key -> value`. It is loaded once
//! and rewritten on every `set`, via a temp file and rename so a crash
//! never leaves half a document behind.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO: {0}")] Io(#[from] std::io::Error),
    #[error("JSON: {0}")] Json(#[from] serde_json::Error),
    #[error("{0} is not a JSON object")] NotAnObject(PathBuf),
}

pub struct Store {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl Store {
    /// Opens the store at `path`; a missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => map,
                _ => return Err(StoreError::NotAnObject(path)),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };
        log::info!("Store {} opened with {} keys", path.display(), entries.len());
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let entries = self.entries.lock().await;
        match entries.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);

        if let Err(e) = self.persist(&entries).await {
            // Keep memory and disk in agreement.
            match previous {
                Some(previous) => entries.insert(key.to_string(), previous),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("Store {} written ({} bytes)", self.path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A fresh path under the system temp dir, unique per call.
    pub(crate) fn scratch_path(name: &str) -> PathBuf {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("musaid-{}-{}-{}.json", name, std::process::id(), n));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Blob {
        count: u32,
        label: String,
    }

    #[tokio::test]
    async fn missing_file_is_empty() {
        let store = Store::open(scratch_path("missing")).await.unwrap();
        let value: Option<Blob> = store.get("nothing").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let path = scratch_path("reopen");
        let blob = Blob { count: 3, label: "ثلاثة".into() };

        let store = Store::open(&path).await.unwrap();
        store.set("@blob", &blob).await.unwrap();
        store.set("@list", &vec!["a", "b"]).await.unwrap();
        drop(store);

        let store = Store::open(&path).await.unwrap();
        assert_eq!(store.get::<Blob>("@blob").await.unwrap(), Some(blob));
        assert_eq!(store.get::<Vec<String>>("@list").await.unwrap(), Some(vec!["a".into(), "b".into()]));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn rejects_non_object_file() {
        let path = scratch_path("array");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = Store::open(&path).await.err().unwrap();
        assert!(matches!(err, StoreError::NotAnObject(_)));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn type_mismatch_is_an_error() {
        let store = Store::open(scratch_path("mismatch")).await.unwrap();
        store.set("@n", &42).await.unwrap();
        assert!(store.get::<Blob>("@n").await.is_err());
        let _ = std::fs::remove_file(store.path());
    }
}
