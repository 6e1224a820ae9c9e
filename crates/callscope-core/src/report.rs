//! Report kinds, fetch parameters and result pages

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::record::Record;
use crate::{Error, Result};

/// The report types served by the upstream reporting API.
///
/// The wire names (`cdrs`, `queueCalls`, `queueOutboundCalls`,
/// `campaignsActivity`) are fixed upstream contracts: they double as the
/// path segment under `/api/v2/reports/` and as the report name accepted
/// from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportKind {
    Cdrs,
    QueueCalls,
    QueueOutboundCalls,
    CampaignsActivity,
}

impl ReportKind {
    /// All report kinds, in registry order.
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Cdrs,
        ReportKind::QueueCalls,
        ReportKind::QueueOutboundCalls,
        ReportKind::CampaignsActivity,
    ];

    /// The upstream wire name for this report kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Cdrs => "cdrs",
            ReportKind::QueueCalls => "queueCalls",
            ReportKind::QueueOutboundCalls => "queueOutboundCalls",
            ReportKind::CampaignsActivity => "campaignsActivity",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cdrs" => Ok(ReportKind::Cdrs),
            "queueCalls" => Ok(ReportKind::QueueCalls),
            "queueOutboundCalls" => Ok(ReportKind::QueueOutboundCalls),
            "campaignsActivity" => Ok(ReportKind::CampaignsActivity),
            other => Err(Error::UnknownReport(other.to_string())),
        }
    }
}

/// Parameters for a single report fetch. Immutable per call.
///
/// `start_date`/`end_date` are epoch seconds bounding the report window.
/// `max_rows` caps the total rows accumulated across pages. `start_key`
/// resumes pagination from a cursor returned by a previous fetch. Any
/// additional filters are passed through to the upstream query verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchParams {
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub max_rows: Option<usize>,
    pub start_key: Option<String>,
    #[serde(default)]
    pub filters: BTreeMap<String, String>,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the window start (epoch seconds)
    pub fn with_start_date(mut self, epoch_secs: i64) -> Self {
        self.start_date = Some(epoch_secs);
        self
    }

    /// Set the window end (epoch seconds)
    pub fn with_end_date(mut self, epoch_secs: i64) -> Self {
        self.end_date = Some(epoch_secs);
        self
    }

    /// Cap the total number of rows accumulated across pages
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Resume pagination from an opaque cursor
    pub fn with_start_key(mut self, start_key: impl Into<String>) -> Self {
        self.start_key = Some(start_key.into());
        self
    }

    /// Add a passthrough filter sent to the upstream query verbatim
    pub fn with_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(name.into(), value.into());
        self
    }
}

/// One fetch result: the accumulated rows and, when pagination stopped with
/// more pages pending, the cursor a subsequent call can resume from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPage {
    pub rows: Vec<Record>,
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_wire_names() {
        assert_eq!(ReportKind::Cdrs.as_str(), "cdrs");
        assert_eq!(ReportKind::QueueCalls.as_str(), "queueCalls");
        assert_eq!(ReportKind::QueueOutboundCalls.as_str(), "queueOutboundCalls");
        assert_eq!(ReportKind::CampaignsActivity.as_str(), "campaignsActivity");
    }

    #[test]
    fn test_report_kind_roundtrip() {
        for kind in ReportKind::ALL {
            assert_eq!(kind.as_str().parse::<ReportKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_report_kind_unknown() {
        let result = "queue_calls".parse::<ReportKind>();
        match result {
            Err(Error::UnknownReport(name)) => assert_eq!(name, "queue_calls"),
            other => panic!("expected UnknownReport, got {other:?}"),
        }
    }

    #[test]
    fn test_report_kind_serde_uses_wire_names() {
        let json = serde_json::to_string(&ReportKind::QueueOutboundCalls).unwrap();
        assert_eq!(json, "\"queueOutboundCalls\"");
    }

    #[test]
    fn test_fetch_params_builders() {
        let params = FetchParams::new()
            .with_start_date(1_700_000_000)
            .with_end_date(1_700_086_400)
            .with_max_rows(500)
            .with_filter("queue", "support");

        assert_eq!(params.start_date, Some(1_700_000_000));
        assert_eq!(params.end_date, Some(1_700_086_400));
        assert_eq!(params.max_rows, Some(500));
        assert_eq!(params.start_key, None);
        assert_eq!(params.filters.get("queue").map(String::as_str), Some("support"));
    }
}
