//! News aggregation: parallel feed fetch, recency merge, headline translation.
//!
//! Every failure is absorbed where it happens. A dead feed contributes no
//! articles, a failed translation leaves the original title, and a cycle
//! that blows up publishes an empty list. Callers never see an error.

use crate::consts::{lang, limits, FeedSource, ARABIC_DOMAIN, ARABIC_SOURCE, SOURCES};
use crate::network::{FeedGateway, FeedItem, FetchError};
use crate::translate::{TranslateError, Translator};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// Date string exactly as the source provided it
    pub pub_date: String,
    /// `None` when `pub_date` could not be parsed; such articles sort last
    pub published: Option<DateTime<Utc>>,
    pub source_name: &'static str,
    pub source_icon: &'static str,
}

impl Article {
    fn from_item(item: FeedItem, source: &FeedSource) -> Self {
        Self {
            published: parse_timestamp(&item.pub_date),
            title: item.title,
            link: item.link,
            pub_date: item.pub_date,
            source_name: source.name,
            source_icon: source.icon,
        }
    }

    /// Arabic-language articles are shown as published.
    pub fn is_arabic(&self) -> bool {
        self.source_name == ARABIC_SOURCE || self.link.contains(ARABIC_DOMAIN)
    }
}

/// What the news view renders.
#[derive(Debug, Clone, Default)]
pub struct NewsState {
    pub loading: bool,
    pub articles: Arc<Vec<Article>>,
    /// Number of the last cycle whose result is in `articles`; 0 before the first one
    pub settled: u64,
}

#[derive(Debug, Default)]
struct Cycles {
    in_flight: bool,
    follow_up: bool,
    started: u64,
}

pub struct NewsAggregator {
    feeds: Arc<dyn FeedGateway>,
    translator: Arc<dyn Translator>,
    request_timeout: Duration,
    state: watch::Sender<NewsState>,
    cycles: Mutex<Cycles>,
}

impl NewsAggregator {
    pub fn new(
        feeds: Arc<dyn FeedGateway>,
        translator: Arc<dyn Translator>,
        request_timeout: Duration,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(NewsState::default());
        Arc::new(Self {
            feeds,
            translator,
            request_timeout,
            state,
            cycles: Mutex::new(Cycles::default()),
        })
    }

    pub fn snapshot(&self) -> NewsState {
        self.state.borrow().clone()
    }

    /// Runs a fetch cycle, or joins the pending one if a cycle is already running.
    ///
    /// Requests arriving while a cycle is in flight all share a single
    /// follow-up cycle, so there are never more than two cycles queued.
    /// Resolves once the cycle covering this request has been published.
    pub async fn refresh(self: &Arc<Self>) -> NewsState {
        let mut rx = self.state.subscribe();

        let target = {
            let mut cycles = self.cycles();
            if cycles.in_flight {
                cycles.follow_up = true;
                cycles.started + 1
            } else {
                cycles.in_flight = true;
                cycles.started += 1;
                self.state.send_modify(|s| s.loading = true);
                tokio::spawn(Arc::clone(self).drive());
                cycles.started
            }
        };

        let settled = rx.wait_for(|s| s.settled >= target).await.map(|s| s.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.snapshot(),
        }
    }

    async fn drive(self: Arc<Self>) {
        loop {
            let cycle = self.cycles().started;
            let this = Arc::clone(&self);
            let articles = match tokio::spawn(async move { this.fetch_and_merge().await }).await {
                Ok(articles) => articles,
                Err(e) => {
                    log::error!("News cycle {} aborted: {}", cycle, e);
                    Vec::new()
                }
            };
            log::info!("News cycle {} settled with {} articles", cycle, articles.len());

            let again = {
                let mut cycles = self.cycles();
                let again = std::mem::take(&mut cycles.follow_up);
                if again {
                    cycles.started += 1;
                } else {
                    cycles.in_flight = false;
                }
                self.state.send_modify(|s| {
                    s.articles = Arc::new(articles);
                    s.settled = cycle;
                    s.loading = again;
                });
                again
            };
            if !again { break; }
        }
    }

    /// Fetches every source, merges by recency and translates the freshest headlines.
    pub async fn fetch_and_merge(&self) -> Vec<Article> {
        let fetches = SOURCES.iter().map(|source| self.fetch_source(source));
        let mut merged: Vec<Article> = join_all(fetches).await.into_iter().flatten().collect();

        // Stable, newest first; `None` compares below every date so it lands at the end.
        merged.sort_by(|a, b| b.published.cmp(&a.published));

        let rest = merged.split_off(merged.len().min(limits::TRANSLATE_PREFIX));
        let mut articles = join_all(merged.into_iter().map(|a| self.localize(a))).await;
        articles.extend(rest);
        articles
    }

    async fn fetch_source(&self, source: &'static FeedSource) -> Vec<Article> {
        let result = match tokio::time::timeout(self.request_timeout, self.feeds.fetch(source.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(items) => {
                log::debug!("{}: {} items", source.name, items.len());
                items.into_iter().map(|item| Article::from_item(item, source)).collect()
            }
            Err(e) => {
                log::warn!("Failed to fetch {}: {}", source.name, e);
                Vec::new()
            }
        }
    }

    async fn localize(&self, mut article: Article) -> Article {
        if article.is_arabic() {
            return article;
        }

        let request = self.translator.translate(&article.title, lang::SOURCE, lang::TARGET);
        let result = match tokio::time::timeout(self.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TranslateError::Timeout(self.request_timeout)),
        };

        match result {
            Ok(title) => article.title = title,
            Err(e) => log::warn!("Keeping original title for {}: {}", article.link, e),
        }
        article
    }

    fn cycles(&self) -> MutexGuard<'_, Cycles> {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
