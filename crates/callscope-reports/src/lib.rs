//! Callscope Report Fetching
//!
//! This crate implements the tenant-scoped fetch layer for the vendor's
//! reporting API:
//! - Endpoint registry with per-report column projections
//! - Cursor pagination with exponential-backoff retry
//! - Response-shape extraction and row normalization
//! - Short-TTL response cache
//! - Portal token provider seam

pub mod auth;
pub mod cache;
pub mod client;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod registry;

pub use auth::{FileTokenProvider, StaticTokenProvider, TokenProvider};
pub use cache::{CacheKey, Clock, ReportCache, SystemClock};
pub use client::{HttpClientConfig, create_client, with_retry};
pub use fetch::{ReportFetcher, ReportsConfig};
pub use registry::ReportEndpoint;
