//! Portal token acquisition
//!
//! The reporting API authenticates with a per-tenant bearer token issued by
//! the vendor portal. Token issuance itself belongs to the external login
//! subsystem; this module defines the provider seam the fetcher consumes,
//! plus two stock implementations: a fixed map for tests and wiring, and a
//! reader for the token file the login job maintains on disk.

use async_trait::async_trait;
use callscope_core::{Error, Result, Tenant};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Supplies bearer tokens for upstream portal requests.
///
/// The fetcher acquires a fresh token before every page request, so
/// implementations are expected to cache internally and be cheap to call
/// repeatedly.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn portal_token(&self, tenant: &Tenant) -> Result<String>;
}

/// Fixed per-tenant tokens, for tests and static wiring.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, String>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token for a tenant
    pub fn with_token(mut self, tenant: impl Into<String>, token: impl Into<String>) -> Self {
        self.tokens.insert(tenant.into(), token.into());
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn portal_token(&self, tenant: &Tenant) -> Result<String> {
        self.tokens.get(tenant.as_str()).cloned().ok_or_else(|| {
            Error::Config(format!("No portal token configured for tenant: {tenant}"))
        })
    }
}

/// Reads per-tenant tokens from the JSON file maintained by the external
/// portal login job.
///
/// File shape:
/// ```json
/// {"tenants": {"acme": {"token": "...", "expires_at": 1700000000}}}
/// ```
///
/// `expires_at` (epoch seconds) is optional; when present and in the past
/// the token is rejected so a stale file surfaces as a configuration error
/// instead of a string of upstream 401s. Tokens are cached per tenant for a
/// short refresh interval to avoid re-reading the file on every page
/// request.
pub struct FileTokenProvider {
    path: PathBuf,
    refresh: Duration,
    cache: DashMap<String, (String, Instant)>,
}

impl FileTokenProvider {
    /// Create a provider reading from `path` (supports `~` for the home
    /// directory), with the default 60s refresh interval.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            refresh: Duration::from_secs(60),
            cache: DashMap::new(),
        }
    }

    /// Set how long a token read from the file is reused before re-reading
    pub fn with_refresh(mut self, refresh: Duration) -> Self {
        self.refresh = refresh;
        self
    }
}

#[async_trait]
impl TokenProvider for FileTokenProvider {
    async fn portal_token(&self, tenant: &Tenant) -> Result<String> {
        if let Some(entry) = self.cache.get(tenant.as_str())
            && entry.value().1.elapsed() < self.refresh
        {
            return Ok(entry.value().0.clone());
        }

        let token = read_tenant_token(&self.path, tenant)?;
        self.cache
            .insert(tenant.as_str().to_string(), (token.clone(), Instant::now()));
        Ok(token)
    }
}

/// Read a tenant's portal token from a JSON token file
///
/// # Arguments
/// * `token_file` - Path to the token JSON file (supports ~ for home directory)
/// * `tenant` - The tenant whose token to read
///
/// # Returns
/// * `Ok(String)` - Live token for the tenant
/// * `Err(...)` - Missing file/tenant/token, expired stamp, or unreadable JSON
pub fn read_tenant_token(token_file: &Path, tenant: &Tenant) -> Result<String> {
    let expanded_path = expand_tilde(token_file)?;

    debug!(
        "Reading portal token from: {} (tenant: {})",
        expanded_path.display(),
        tenant
    );

    if !expanded_path.exists() {
        return Err(Error::Config(format!(
            "Portal token file does not exist: {}",
            expanded_path.display()
        )));
    }

    let contents = std::fs::read_to_string(&expanded_path)?;
    let json: Value = serde_json::from_str(&contents)?;

    let entry = json
        .get("tenants")
        .and_then(|tenants| tenants.get(tenant.as_str()))
        .ok_or_else(|| {
            Error::Config(format!(
                "No portal token for tenant '{}' in {}",
                tenant,
                expanded_path.display()
            ))
        })?;

    let token = match entry.get("token") {
        Some(Value::String(token)) if !token.is_empty() => token.clone(),
        Some(_) => {
            return Err(Error::Config(format!(
                "Portal token for tenant '{tenant}' is not a non-empty string"
            )));
        }
        None => {
            return Err(Error::Config(format!(
                "Portal token entry for tenant '{tenant}' has no 'token' field"
            )));
        }
    };

    if let Some(expires_at) = entry.get("expires_at").and_then(Value::as_i64) {
        let now = chrono::Utc::now().timestamp();
        if expires_at <= now {
            warn!(
                tenant = %tenant,
                expires_at,
                "Portal token is expired, the portal login job needs to run"
            );
            return Err(Error::Config(format!(
                "Portal token for tenant '{tenant}' expired at {expires_at}"
            )));
        }
    }

    Ok(token)
}

/// Expand tilde (~) in path to home directory
fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
