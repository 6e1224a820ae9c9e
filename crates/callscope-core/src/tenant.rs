//! Tenant identifier for scoping upstream requests

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A call-center account/domain identifier scoping all upstream requests.
///
/// Tenants are vendor account domains (e.g. `acme.pbx-vendor.net`) or bare
/// account slugs. Every upstream call is issued on behalf of exactly one
/// tenant: the portal token is acquired per tenant and the tenant is sent
/// as the `X-Account-ID` request header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tenant(String);

impl Tenant {
    /// Validate and construct a tenant identifier.
    ///
    /// Accepts non-empty ASCII lowercase alphanumerics plus `.`, `-` and
    /// `_`. Anything else fails with [`Error::InvalidTenant`].
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(Error::InvalidTenant("tenant must not be empty".to_string()));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'_'))
        {
            return Err(Error::InvalidTenant(format!(
                "tenant contains invalid characters: {s}"
            )));
        }
        Ok(Self(s))
    }

    /// Get the tenant as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Tenant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
