//! Report fetching: cursor pagination, retry, cache
//!
//! `ReportFetcher` is the one entry point the HTTP façade and CLI call
//! into. A fetch checks the response cache, then runs a retry-wrapped
//! pagination loop against the upstream reporting API, normalizes the
//! accumulated rows once, caches the result and returns it.

use crate::auth::TokenProvider;
use crate::cache::{CacheKey, ReportCache};
use crate::client::{HttpClientConfig, create_client, with_retry};
use crate::extract::extract_records;
use crate::registry::{self, ReportEndpoint};
use callscope_core::{Error, FetchParams, Record, ReportKind, ReportPage, Result, Tenant};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Fetcher configuration
#[derive(Debug, Clone)]
pub struct ReportsConfig {
    /// Upstream portal base URL (no trailing slash)
    pub base_url: String,

    /// Response cache entry lifetime
    pub cache_ttl: Duration,

    /// HTTP client configuration
    pub client_config: HttpClientConfig,
}

impl ReportsConfig {
    /// Create a configuration for the given upstream base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cache_ttl: crate::cache::DEFAULT_TTL,
            client_config: HttpClientConfig::default(),
        }
    }

    /// Set the response cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the HTTP client configuration
    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }
}

/// Tenant-scoped report fetcher.
///
/// Holds the pooled HTTP client, the token provider and the response
/// cache; cheap to share behind an `Arc`. Concurrent fetches interleave
/// freely; there is no mutual exclusion around the cache and no cap on
/// concurrent upstream calls from this layer.
pub struct ReportFetcher {
    config: ReportsConfig,
    client: reqwest::Client,
    tokens: Arc<dyn TokenProvider>,
    cache: ReportCache,
}

impl ReportFetcher {
    /// Create a fetcher with a cache built from the config's TTL
    pub fn new(config: ReportsConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self> {
        let cache = ReportCache::with_ttl(config.cache_ttl);
        Self::with_cache(config, tokens, cache)
    }

    /// Create a fetcher with an externally constructed cache (e.g. one with
    /// an injected clock)
    pub fn with_cache(
        config: ReportsConfig,
        tokens: Arc<dyn TokenProvider>,
        cache: ReportCache,
    ) -> Result<Self> {
        let client = create_client(&config.client_config)?;
        Ok(Self {
            config,
            client,
            tokens,
            cache,
        })
    }

    /// Fetch a report by its wire name.
    ///
    /// Fails fast with [`Error::UnknownReport`] before any upstream call
    /// when the name is not in the registry.
    pub async fn fetch(
        &self,
        report: &str,
        tenant: &Tenant,
        params: &FetchParams,
    ) -> Result<ReportPage> {
        let kind: ReportKind = report.parse()?;
        self.fetch_kind(kind, tenant, params).await
    }

    /// Fetch a report by kind.
    ///
    /// Returns the accumulated rows and, when pagination stopped early with
    /// more pages pending, the cursor to resume from. Results are memoized
    /// per (kind, tenant, params) for the cache TTL.
    #[instrument(skip(self, params), fields(report = %kind, tenant = %tenant))]
    pub async fn fetch_kind(
        &self,
        kind: ReportKind,
        tenant: &Tenant,
        params: &FetchParams,
    ) -> Result<ReportPage> {
        let endpoint = registry::endpoint(kind);
        let key = CacheKey {
            kind,
            tenant: tenant.clone(),
            params: params.clone(),
        };

        if let Some(page) = self.cache.get(&key) {
            debug!(rows = page.rows.len(), "Serving report from cache");
            return Ok(page);
        }

        let page = with_retry(
            self.config.client_config.max_attempts,
            Duration::from_millis(self.config.client_config.retry_base_delay_ms),
            || self.fetch_all_pages(endpoint, tenant, params),
        )
        .await?;

        let page = ReportPage {
            rows: (endpoint.normalize)(page.rows),
            next: page.next,
        };

        // Cache before returning so a concurrent identical fetch can reuse it
        self.cache.set(key, page.clone());

        debug!(rows = page.rows.len(), next = page.next.is_some(), "Report fetched");
        Ok(page)
    }

    /// One pagination attempt: accumulate rows across pages until the
    /// early-exit rule fires or the cursor runs out.
    ///
    /// The accumulator is owned by the attempt; any error discards it
    /// wholesale and the retry layer starts the next attempt fresh.
    async fn fetch_all_pages(
        &self,
        endpoint: &'static ReportEndpoint,
        tenant: &Tenant,
        params: &FetchParams,
    ) -> Result<ReportPage> {
        let url = format!("{}/api/v2/reports/{}", self.config.base_url, endpoint.path);
        let mut rows: Vec<Record> = Vec::new();
        let mut cursor = params.start_key.clone();

        loop {
            let query = build_query(endpoint, params, cursor.as_deref());

            // Fresh token per page; the provider caches internally
            let token = self.tokens.portal_token(tenant).await?;

            let response = self
                .client
                .get(&url)
                .query(&query)
                .bearer_auth(&token)
                .header("X-User-Agent", &self.config.client_config.user_agent)
                .header("X-Account-ID", tenant.as_str())
                .send()
                .await
                .map_err(|e| Error::UpstreamFetch {
                    status: e.status().map(|s| s.as_u16()),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error body".to_string());
                return Err(Error::UpstreamFetch {
                    status: Some(status.as_u16()),
                    message: body,
                });
            }

            let body: Value = response.json().await.map_err(|e| Error::UpstreamFetch {
                status: None,
                message: format!("Failed to parse report response: {e}"),
            })?;

            let mut page_rows = extract_records(&body);
            let next = body
                .get("next_start_key")
                .and_then(Value::as_str)
                .map(str::to_owned);

            if let Some(max_rows) = params.max_rows {
                page_rows.truncate(max_rows.saturating_sub(rows.len()));
            }
            rows.extend(page_rows);

            // Early exit: one non-empty page is enough for an interactive
            // response; the pending cursor lets the caller resume.
            if !rows.is_empty() {
                return Ok(ReportPage { rows, next });
            }

            match next {
                Some(next) => cursor = Some(next),
                None => return Ok(ReportPage { rows, next: None }),
            }
        }
    }
}

/// Assemble one page request's query: passthrough params, the report's
/// column projection and the live cursor.
fn build_query(
    endpoint: &ReportEndpoint,
    params: &FetchParams,
    cursor: Option<&str>,
) -> Vec<(String, String)> {
    let mut query: Vec<(String, String)> = params
        .filters
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    if let Some(start_date) = params.start_date {
        query.push(("start_date".to_string(), start_date.to_string()));
    }
    if let Some(end_date) = params.end_date {
        query.push(("end_date".to_string(), end_date.to_string()));
    }
    if let Some(max_rows) = params.max_rows {
        query.push(("max_rows".to_string(), max_rows.to_string()));
    }
    if let Some(fields) = endpoint.fields_param() {
        query.push(("fields".to_string(), fields));
    }
    if let Some(cursor) = cursor {
        query.push(("start_key".to_string(), cursor.to_string()));
    }

    query
}
