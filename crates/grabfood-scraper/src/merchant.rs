//! Projects the captured search payload into [`MerchantRecord`]s.
//!
//! ## Payload shape
//!
//! ```text
//! recommendedMerchantGroups: [
//!   { recommendedMerchants: [
//!       { id, address: { name }, latlng: { latitude, longitude },
//!         merchantData: { estimated_delivery_time } }, ... ] },
//!   ...
//! ]
//! ```
//!
//! Only the first group is read. Every step down the tree is optional; a
//! missing step yields an empty list, a missing leaf yields `None` for that
//! field. No defaults are substituted.

use serde_json::Value;

use crate::events::EventSink;
use crate::types::MerchantRecord;

const COMPONENT: &str = "MerchantExtractor";

/// Extract merchants from the captured search response.
///
/// Returns `None` when no response was captured and `Some(vec![])` when the
/// payload does not contain a merchant list. Both conditions are reported to
/// `sink` as errors; neither aborts the run.
pub fn extract_merchants(
    captured: Option<&Value>,
    sink: &dyn EventSink,
) -> Option<Vec<MerchantRecord>> {
    let Some(payload) = captured else {
        sink.error(COMPONENT, "extract", Value::Null, "No search response captured.");
        return None;
    };

    let merchants = match merchant_list(payload) {
        Ok(entries) => entries.iter().map(project_merchant).collect::<Vec<_>>(),
        Err(missing) => {
            sink.error(
                COMPONENT,
                "extract",
                serde_json::json!({ "missing": missing }),
                "Search response has no merchant list",
            );
            return Some(Vec::new());
        }
    };

    sink.info(
        COMPONENT,
        "extract",
        serde_json::to_value(&merchants).unwrap_or(Value::Null),
        "Merchant Data for specified location Received",
    );
    Some(merchants)
}

/// Walk `recommendedMerchantGroups[0].recommendedMerchants`, naming the first
/// step that is missing or has the wrong type.
fn merchant_list(payload: &Value) -> Result<&Vec<Value>, &'static str> {
    let groups = payload
        .get("recommendedMerchantGroups")
        .and_then(Value::as_array)
        .ok_or("recommendedMerchantGroups")?;
    let first = groups.first().ok_or("recommendedMerchantGroups[0]")?;
    first
        .get("recommendedMerchants")
        .and_then(Value::as_array)
        .ok_or("recommendedMerchantGroups[0].recommendedMerchants")
}

fn project_merchant(entry: &Value) -> MerchantRecord {
    let latlng = entry.get("latlng");
    MerchantRecord {
        id: entry.get("id").and_then(id_text),
        name: entry
            .get("address")
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        latitude: latlng.and_then(|l| number_or_string(l, "latitude")),
        longitude: latlng.and_then(|l| number_or_string(l, "longitude")),
        estimated_delivery_time: entry
            .get("merchantData")
            .and_then(|m| m.get("estimated_delivery_time"))
            .and_then(delivery_estimate),
    }
}

/// Merchant IDs are strings in observed payloads; numbers are kept as their
/// JSON text.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coordinates may arrive as numbers or numeric strings. Non-finite values
/// (`"NaN"`, `"inf"`) cannot be archived and are treated as absent.
fn number_or_string(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        })
        .filter(|v| v.is_finite())
}

fn delivery_estimate(value: &Value) -> Option<serde_json::Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<serde_json::Number>().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "merchant_test.rs"]
mod tests;
