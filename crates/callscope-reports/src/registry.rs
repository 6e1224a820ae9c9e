//! Report endpoint registry
//!
//! Static dispatch table from report kind to its upstream contract: the
//! path segment under `/api/v2/reports/`, the optional column projection,
//! and the post-fetch normalization pass. Path strings and field spellings
//! are fixed upstream contracts; renaming any of them breaks the API.

use crate::normalize;
use callscope_core::{Record, ReportKind};

/// One report kind's upstream contract.
pub struct ReportEndpoint {
    /// Path segment under `<base>/api/v2/reports/`
    pub path: &'static str,

    /// Column projection sent as the `fields` query parameter. The upstream
    /// omits duration/history/disposition columns unless asked for them
    /// explicitly; `None` means the endpoint's default columns suffice.
    pub fields: Option<&'static [&'static str]>,

    /// Post-fetch normalization, applied once after pagination completes
    pub normalize: fn(Vec<Record>) -> Vec<Record>,
}

impl ReportEndpoint {
    /// The comma-joined `fields` query parameter value, if any
    pub fn fields_param(&self) -> Option<String> {
        self.fields.map(|fields| fields.join(","))
    }
}

// Hand-maintained projections. The upstream drops these columns from the
// default result set; the dashboard needs every one of them.
const QUEUE_CALLS_FIELDS: &[&str] = &[
    "call_id",
    "caller_id",
    "queue_name",
    "called_time",
    "answered_time",
    "hangup_time",
    "wait_duration",
    "talked_duration",
    "agent_history",
    "disposition",
];

const QUEUE_OUTBOUND_CALLS_FIELDS: &[&str] = &[
    "call_id",
    "agent_id",
    "queue_name",
    "called_time",
    "answered_time",
    "hangup_time",
    "wait_duration",
    "talked_duration",
    "queue_history",
    "agent_history",
    "disposition",
];

const CAMPAIGNS_ACTIVITY_FIELDS: &[&str] = &[
    "campaign_id",
    "campaign_name",
    "total_calls",
    "answered_calls",
    "abandoned_calls",
    "agents_logged_in",
    "last_activity_time",
    "disposition_counts",
];

static CDRS: ReportEndpoint = ReportEndpoint {
    path: "cdrs",
    fields: None,
    normalize: normalize::passthrough,
};

static QUEUE_CALLS: ReportEndpoint = ReportEndpoint {
    path: "queueCalls",
    fields: Some(QUEUE_CALLS_FIELDS),
    normalize: normalize::queue_calls,
};

static QUEUE_OUTBOUND_CALLS: ReportEndpoint = ReportEndpoint {
    path: "queueOutboundCalls",
    fields: Some(QUEUE_OUTBOUND_CALLS_FIELDS),
    normalize: normalize::queue_outbound_calls,
};

static CAMPAIGNS_ACTIVITY: ReportEndpoint = ReportEndpoint {
    path: "campaignsActivity",
    fields: Some(CAMPAIGNS_ACTIVITY_FIELDS),
    normalize: normalize::passthrough,
};

/// Resolve a report kind's upstream contract.
pub fn endpoint(kind: ReportKind) -> &'static ReportEndpoint {
    match kind {
        ReportKind::Cdrs => &CDRS,
        ReportKind::QueueCalls => &QUEUE_CALLS,
        ReportKind::QueueOutboundCalls => &QUEUE_OUTBOUND_CALLS,
        ReportKind::CampaignsActivity => &CAMPAIGNS_ACTIVITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_match_wire_names() {
        for kind in ReportKind::ALL {
            assert_eq!(endpoint(kind).path, kind.as_str());
        }
    }

    #[test]
    fn test_cdrs_has_no_projection() {
        assert!(endpoint(ReportKind::Cdrs).fields.is_none());
        assert!(endpoint(ReportKind::Cdrs).fields_param().is_none());
    }

    #[test]
    fn test_queue_calls_projection_spelling() {
        let fields = endpoint(ReportKind::QueueCalls).fields.unwrap();
        assert!(fields.contains(&"talked_duration"));
        assert!(fields.contains(&"wait_duration"));
        assert!(fields.contains(&"agent_history"));
        assert!(fields.contains(&"disposition"));
        assert!(!fields.contains(&"queue_history"));
    }

    #[test]
    fn test_queue_outbound_projection_includes_queue_history() {
        let fields = endpoint(ReportKind::QueueOutboundCalls).fields.unwrap();
        assert!(fields.contains(&"queue_history"));
        assert!(fields.contains(&"agent_history"));
    }

    #[test]
    fn test_fields_param_is_comma_joined() {
        let param = endpoint(ReportKind::CampaignsActivity).fields_param().unwrap();
        assert!(param.starts_with("campaign_id,campaign_name,"));
        assert!(!param.contains(' '));
    }
}
