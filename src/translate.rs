use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("Translation failed: {0}")] Status(reqwest::StatusCode),
    #[error("Unexpected response shape")] Shape,
    #[error("Timed out after {0:?}")] Timeout(Duration),
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, TranslateError>;
}

/// The keyless `translate_a/single` endpoint used by Google's web widget.
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String, TranslateError> {
        // URL encoding is handled by reqwest query params
        let url = format!("{}/translate_a/single", self.base_url);

        let params = [
            ("client", "gtx"),
            ("sl", source_lang),
            ("tl", target_lang),
            ("dt", "t"),         // Return translation
            ("q", text),
        ];

        let response = self.client.get(&url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TranslateError::Status(response.status()));
        }

        let raw_json: serde_json::Value = response.json().await?;
        first_segment(&raw_json)
            .map(str::to_string)
            .ok_or(TranslateError::Shape)
    }
}

/// The response is a messy JSON array: [[["translated_text", "original", ...], ...], ...].
/// Only the first segment is used; an empty one counts as a miss.
fn first_segment(raw: &serde_json::Value) -> Option<&str> {
    raw.get(0)
        .and_then(|sentences| sentences.get(0))
        .and_then(|segment| segment.get(0))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
