//! Report-kind-specific row normalization
//!
//! Applied once to the accumulated row set after pagination completes, not
//! per page. The upstream omits duration columns for some tenants and
//! returns one row per agent leg for queue calls; normalization papers over
//! both so the dashboard's table and CSV export see uniform rows.

use callscope_core::Record;
use callscope_core::record::{field_i64, field_str};
use serde_json::Value;
use std::collections::HashSet;

/// No row-level transformation (`cdrs`, `campaignsActivity`).
pub fn passthrough(rows: Vec<Record>) -> Vec<Record> {
    rows
}

/// Normalize `queueCalls` rows: derive missing durations, collapse agent
/// legs to the first-seen row per `call_id`, and trim `agent_history` to
/// its first element.
pub fn queue_calls(mut rows: Vec<Record>) -> Vec<Record> {
    for row in &mut rows {
        derive_durations(row);
    }

    // One row per agent leg comes back for the same call; keep the
    // first-seen row per call_id, in arrival order. Rows without a call_id
    // cannot be grouped and are kept unconditionally.
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(call_id) = field_str(&row, "call_id").map(str::to_owned)
            && !seen.insert(call_id)
        {
            continue;
        }
        truncate_history(&mut row, "agent_history");
        out.push(row);
    }
    out
}

/// Normalize `queueOutboundCalls` rows: derive missing durations and trim
/// `queue_history` to its first (oldest) element. `agent_history` is left
/// untouched.
pub fn queue_outbound_calls(mut rows: Vec<Record>) -> Vec<Record> {
    for row in &mut rows {
        derive_durations(row);
        truncate_history(row, "queue_history");
    }
    rows
}

/// Derive `talked_duration` and `wait_duration` from call timestamps when
/// the upstream omitted them.
///
/// `talked_duration = hangup_time - answered_time` requires both inputs.
/// `wait_duration` prefers `answered_time - called_time` and falls back to
/// `hangup_time - called_time` (abandoned calls never got answered); only
/// one of the two is computed, in that priority order.
fn derive_durations(row: &mut Record) {
    let called = field_i64(row, "called_time");
    let answered = field_i64(row, "answered_time");
    let hangup = field_i64(row, "hangup_time");

    if is_absent(row, "talked_duration")
        && let (Some(answered), Some(hangup)) = (answered, hangup)
    {
        row.insert("talked_duration".to_string(), Value::from(hangup - answered));
    }

    if is_absent(row, "wait_duration")
        && let Some(called) = called
    {
        if let Some(answered) = answered {
            row.insert("wait_duration".to_string(), Value::from(answered - called));
        } else if let Some(hangup) = hangup {
            row.insert("wait_duration".to_string(), Value::from(hangup - called));
        }
    }
}

// Missing and null both count as absent; the upstream emits explicit nulls
// for columns it knows about but did not compute.
fn is_absent(row: &Record, field: &str) -> bool {
    !row.get(field).is_some_and(|v| !v.is_null())
}

fn truncate_history(row: &mut Record, field: &str) {
    if let Some(Value::Array(items)) = row.get_mut(field)
        && items.len() > 1
    {
        items.truncate(1);
    }
}
