//! Feed gateways: rss2json passthrough and direct RSS/Atom parsing.

use crate::consts::headers;
use crate::utils::clean_text;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP: {0}")] Http(#[from] reqwest::Error),
    #[error("Status {0}")] Status(reqwest::StatusCode),
    #[error("Feed: {0}")] Parse(String),
    #[error("Timed out after {0:?}")] Timeout(Duration),
}

/// One raw entry as the gateway returns it, before it is tied to a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub pub_date: String,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>, pub_date: impl Into<String>) -> Self {
        Self { title: title.into(), link: link.into(), pub_date: pub_date.into() }
    }
}

/// Turns a feed URL into structured items.
#[async_trait]
pub trait FeedGateway: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedItem>, FetchError>;
}

pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(headers::USER_AGENT)
        .timeout(timeout)
        .build()
}

#[derive(Deserialize, Debug)]
struct Rss2JsonResponse {
    #[serde(default)]
    items: Vec<Rss2JsonItem>,
}

#[derive(Deserialize, Debug)]
struct Rss2JsonItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// The public rss2json.com converter. Titles are passed on as served.
pub struct Rss2JsonGateway {
    client: Client,
    base_url: String,
}

impl Rss2JsonGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl FeedGateway for Rss2JsonGateway {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedItem>, FetchError> {
        let url = format!("{}/v1/api.json", self.base_url);
        let res = self.client.get(&url).query(&[("rss_url", feed_url)]).send().await?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }

        let data: Rss2JsonResponse = res.json().await?;
        let items = data.items.into_iter()
            .map(|i| FeedItem::new(
                i.title.unwrap_or_default(),
                i.link.unwrap_or_default(),
                i.pub_date.unwrap_or_default(),
            ))
            .collect();
        Ok(items)
    }
}

/// Fetches the feed itself and parses it locally with feed-rs.
/// Titles are flattened with `clean_text`.
pub struct DirectFeedGateway {
    client: Client,
}

impl DirectFeedGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedGateway for DirectFeedGateway {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<FeedItem>, FetchError> {
        let res = self.client.get(feed_url)
            .header(reqwest::header::ACCEPT, headers::ACCEPT_RSS)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }

        let bytes = res.bytes().await?;
        let feed = feed_rs::parser::parse(&bytes[..]).map_err(|e| FetchError::Parse(e.to_string()))?;

        let items = feed.entries.into_iter()
            .map(|e| {
                let title = e.title.map(|t| clean_text(&t.content)).unwrap_or_default();
                let link = e.links.first().map(|l| l.href.clone()).unwrap_or_default();
                let pub_date = e.published.or(e.updated)
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default();
                FeedItem::new(title, link, pub_date)
            })
            .collect();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use serde_json::json;

    fn client() -> Client {
        build_client(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn rss2json_maps_items() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/api.json")
                .query_param("rss_url", "https://dev.to/feed");
            then.status(200).json_body(json!({
                "status": "ok",
                "items": [
                    { "title": "Borrowing &amp; you", "link": "https://dev.to/a", "pubDate": "2024-03-05 10:00:00" },
                    { "title": null, "link": "https://dev.to/b" },
                    { "title": "  ثغرة   في «المتصفح»&nbsp;", "link": "https://aitnews.com/c" }
                ]
            }));
        });

        let gateway = Rss2JsonGateway::new(client(), server.base_url());
        let items = gateway.fetch("https://dev.to/feed").await.unwrap();

        mock.assert();
        assert_eq!(items, vec![
            FeedItem::new("Borrowing &amp; you", "https://dev.to/a", "2024-03-05 10:00:00"),
            FeedItem::new("", "https://dev.to/b", ""),
            FeedItem::new("  ثغرة   في «المتصفح»&nbsp;", "https://aitnews.com/c", ""),
        ]);
    }

    #[tokio::test]
    async fn rss2json_without_items_is_empty() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/api.json");
            then.status(200).json_body(json!({ "status": "ok" }));
        });

        let gateway = Rss2JsonGateway::new(client(), format!("{}/", server.base_url()));
        let items = gateway.fetch("https://dev.to/feed").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn rss2json_error_status_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/api.json");
            then.status(422).json_body(json!({ "status": "error", "message": "bad feed" }));
        });

        let gateway = Rss2JsonGateway::new(client(), server.base_url());
        let err = gateway.fetch("https://example.com/nope").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s.as_u16() == 422));
    }

    #[tokio::test]
    async fn rss2json_malformed_body_is_an_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/v1/api.json");
            then.status(200).body("<html>not json</html>");
        });

        let gateway = Rss2JsonGateway::new(client(), server.base_url());
        assert!(gateway.fetch("https://dev.to/feed").await.is_err());
    }

    #[tokio::test]
    async fn direct_gateway_parses_rss() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Security</title>
    <link>https://aitnews.com</link>
    <description>feed</description>
    <item>
      <title>ثغرة جديدة</title>
      <link>https://aitnews.com/2024/03/05/x</link>
      <pubDate>Tue, 05 Mar 2024 14:00:00 +0000</pubDate>
    </item>
  </channel>
</rss>"#;

        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/feed");
            then.status(200).header("content-type", "application/rss+xml").body(rss);
        });

        let gateway = DirectFeedGateway::new(client());
        let items = gateway.fetch(&server.url("/feed")).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "ثغرة جديدة");
        assert_eq!(items[0].link, "https://aitnews.com/2024/03/05/x");
        assert_eq!(
            crate::utils::parse_timestamp(&items[0].pub_date),
            crate::utils::parse_timestamp("2024-03-05 14:00:00")
        );
    }
}
