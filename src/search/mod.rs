//! Rate-limited client for the external job-search API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngExt;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::domain::job::RawPosting;
use crate::models::config::SearchConfig;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The API answered with zero results for the given parameters. Raised,
    /// not swallowed, so callers can tell "no jobs exist" from "request
    /// failed".
    #[error("no results for search term `{term}`")]
    NoResults { term: String },
    /// HTTP 429. Transient; the client retries it with backoff.
    #[error("search API throttled the request")]
    Throttled,
    /// The retry budget ran out on 429 responses. Terminal.
    #[error("search API rate limit persisted after {retries} retries")]
    RateLimited { retries: u32 },
    /// Any other non-2xx status. Not transient, never retried.
    #[error("search API returned status {0}")]
    Status(StatusCode),
    #[error("search API request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// A malformed body will not fix itself; never retried.
    #[error("malformed search API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters of one page fetch.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub term: String,
    pub page: u32,
    pub pages_per_call: u32,
    pub country: String,
    pub date_posted: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    data: Vec<RawPosting>,
}

/// Transport seam over the search API, so the retry state machine is
/// testable without a network.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn fetch_page(&self, request: &SearchRequest) -> Result<Vec<RawPosting>, SearchError>;
}

/// reqwest-backed transport for a RapidAPI-style search endpoint.
pub struct HttpSearchApi {
    client: reqwest::Client,
    api_url: String,
    api_host: String,
    api_key: String,
}

impl HttpSearchApi {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_host: config.api_host.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl SearchApi for HttpSearchApi {
    async fn fetch_page(&self, request: &SearchRequest) -> Result<Vec<RawPosting>, SearchError> {
        let query = [
            ("query", request.term.clone()),
            ("page", request.page.to_string()),
            ("num_pages", request.pages_per_call.to_string()),
            ("country", request.country.clone()),
            ("date_posted", request.date_posted.clone()),
        ];

        let response = self
            .client
            .get(&self.api_url)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", &self.api_host)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::Throttled);
        }
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        let text = response.text().await?;
        let body: SearchResponseBody = serde_json::from_str(&text)?;
        if body.data.is_empty() {
            return Err(SearchError::NoResults {
                term: request.term.clone(),
            });
        }

        Ok(body.data)
    }
}

/// Search client wrapping a transport with throttling and bounded
/// exponential-backoff retry.
pub struct SearchClient<A: SearchApi> {
    api: A,
    config: SearchConfig,
}

impl<A: SearchApi> SearchClient<A> {
    pub fn new(api: A, config: SearchConfig) -> Self {
        Self { api, config }
    }

    /// Fetches one page of postings, retrying 429 responses until the retry
    /// budget is exhausted. All other failures surface immediately.
    pub async fn search(
        &self,
        term: &str,
        page: u32,
        pages_per_call: u32,
        country: &str,
        date_posted: &str,
    ) -> Result<Vec<RawPosting>, SearchError> {
        let request = SearchRequest {
            term: term.to_string(),
            page,
            pages_per_call,
            country: country.to_string(),
            date_posted: date_posted.to_string(),
        };

        // Steady-state throttle, applied regardless of retry state.
        tokio::time::sleep(Duration::from_millis(self.config.pre_request_delay_ms)).await;

        for attempt in 0..=self.config.max_retries {
            match self.api.fetch_page(&request).await {
                Err(SearchError::Throttled) => {
                    if attempt == self.config.max_retries {
                        break;
                    }
                    let backoff = self.backoff_delay(attempt);
                    log::warn!(
                        "Search API throttled `{}` page {} (attempt {}), backing off for {backoff:?}",
                        request.term,
                        request.page,
                        attempt + 1,
                    );
                    tokio::time::sleep(backoff).await;
                }
                other => return other,
            }
        }

        Err(SearchError::RateLimited {
            retries: self.config.max_retries,
        })
    }

    /// `backoff * 2^attempt` plus up to 10% jitter, capped at `max_backoff`.
    /// Jitter desynchronizes concurrent callers.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let base = self
            .config
            .backoff_ms
            .saturating_mul(1_u64 << attempt.min(20));
        let jitter = (rand::rng().random_range(0.0..0.1) * base as f64) as u64;
        Duration::from_millis(base.saturating_add(jitter).min(self.config.max_backoff_ms))
    }

    /// Fetches `pages` pages for one term concurrently, bounded by the
    /// configured page concurrency. Each worker retries independently; there
    /// is no cross-worker rate-limit coordination. Empty pages are logged and
    /// skipped; any other failure aborts the term.
    pub async fn fetch_all_pages(
        &self,
        term: &str,
        pages: u32,
        country: &str,
        date_posted: &str,
    ) -> Result<Vec<RawPosting>, SearchError> {
        let semaphore = Arc::new(Semaphore::new(self.config.page_concurrency.max(1)));

        let mut tasks = Vec::with_capacity(pages as usize);
        for page in 1..=pages {
            let semaphore = Arc::clone(&semaphore);
            tasks.push(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    log::error!("Page-fetch semaphore closed unexpectedly");
                    return Ok(Vec::new());
                };
                self.search(term, page, self.config.pages_per_call, country, date_posted)
                    .await
            });
        }
        let results = futures::future::join_all(tasks).await;

        let mut postings = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(mut page_postings) => postings.append(&mut page_postings),
                Err(SearchError::NoResults { .. }) => {
                    log::warn!("No jobs found for `{term}` page {}", index + 1);
                }
                Err(error) => return Err(error),
            }
        }

        Ok(postings)
    }
}
