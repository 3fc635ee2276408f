use crate::model::{RawEventRecord, TimeRange};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

pub const DEFAULT_INDEX: &str = "meetups";
pub const DEFAULT_HITS_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("request to the search service failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("search service returned no result for the query")]
    MissingResult,
}

// --- Wire format of the multi-query endpoint ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub index_name: String,
    pub query: String,
    pub filters: String,
    pub hits_per_page: u32,
}

#[derive(Debug, Serialize)]
struct MultiQueryRequest<'a> {
    requests: [&'a SearchQuery; 1],
}

#[derive(Debug, Deserialize)]
struct MultiQueryResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    hits: Vec<RawEventRecord>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Anything that can list the meetups starting inside a time range.
pub trait MeetupSource: Send + Sync + 'static {
    fn fetch_meetups(
        &self,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<RawEventRecord>, SearchError>> + Send;
}

/// Read-only client for the hosted meetups index.
#[derive(Debug, Clone)]
pub struct AlgoliaClient {
    http: reqwest::Client,
    base_url: String,
    app_id: String,
    api_key: String,
    index_name: String,
    hits_per_page: u32,
}

impl AlgoliaClient {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let app_id = app_id.into();
        Self {
            http: reqwest::Client::new(),
            base_url: format!("https://{}-dsn.algolia.net", app_id.to_lowercase()),
            app_id,
            api_key: api_key.into(),
            index_name: DEFAULT_INDEX.to_string(),
            hits_per_page: DEFAULT_HITS_PER_PAGE,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_hits_per_page(mut self, hits_per_page: u32) -> Self {
        self.hits_per_page = hits_per_page;
        self
    }

    /// Filtered listing: empty text query, numeric range on `startDate`.
    pub fn query_for(&self, range: TimeRange) -> SearchQuery {
        SearchQuery {
            index_name: self.index_name.clone(),
            query: String::new(),
            filters: range.filter(),
            hits_per_page: self.hits_per_page,
        }
    }

    /// Fetches the meetups whose start falls inside `range`, capped at one page.
    pub async fn get_meetups(&self, range: TimeRange) -> Result<Vec<RawEventRecord>, SearchError> {
        let query = self.query_for(range);
        debug!("Querying {} with filters: {}", query.index_name, query.filters);

        let response = self
            .http
            .post(format!("{}/1/indexes/*/queries", self.base_url))
            .header("x-algolia-application-id", &self.app_id)
            .header("x-algolia-api-key", &self.api_key)
            .json(&MultiQueryRequest { requests: [&query] })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or(text);
            error!("Search service error {}: {}", status, message);
            return Err(SearchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<MultiQueryResponse>().await?;
        let result = body
            .results
            .into_iter()
            .next()
            .ok_or(SearchError::MissingResult)?;

        debug!("Search service returned {} hits.", result.hits.len());
        Ok(result.hits)
    }
}

impl MeetupSource for AlgoliaClient {
    fn fetch_meetups(
        &self,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<RawEventRecord>, SearchError>> + Send {
        self.get_meetups(range)
    }
}
