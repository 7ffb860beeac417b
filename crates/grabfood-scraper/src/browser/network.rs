//! CDP network plumbing for a scrape session.
//!
//! Responses: `Network.responseReceived` carries the URL and headers but the
//! body is only retrievable once `Network.loadingFinished` fires for the same
//! request, so the two are paired by request id before forwarding.
//!
//! Requests: when extra headers are configured, `Fetch` pauses only requests
//! whose URL contains the target and continues them with the merged headers.

use std::collections::{BTreeMap, HashMap};

use base64::Engine as _;
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId, Response,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, EventRequestPaused, HeaderEntry, RequestPattern, RequestStage,
};
use chromiumoxide::Page;
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::capture::ObservedResponse;
use crate::error::ScraperError;

struct PendingResponse {
    request_id: RequestId,
    url: String,
    content_type: Option<String>,
}

/// Aborts the listening task when dropped.
pub(super) struct ListenerTask(JoinHandle<()>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Subscribe to the page's network events and forward each completed
/// response into `tx`. Must be called before navigation.
pub(super) async fn forward_responses(
    page: &Page,
    tx: mpsc::Sender<ObservedResponse>,
) -> Result<ListenerTask, ScraperError> {
    page.execute(EnableParams::default()).await?;
    let mut received = page.event_listener::<EventResponseReceived>().await?;
    let mut finished = page.event_listener::<EventLoadingFinished>().await?;
    let mut failed = page.event_listener::<EventLoadingFailed>().await?;
    let page = page.clone();

    let task = tokio::spawn(async move {
        let mut pending: HashMap<String, PendingResponse> = HashMap::new();
        loop {
            tokio::select! {
                Some(event) = received.next() => {
                    pending.insert(
                        event.request_id.inner().clone(),
                        PendingResponse {
                            request_id: event.request_id.clone(),
                            url: event.response.url.clone(),
                            content_type: content_type(&event.response),
                        },
                    );
                }
                Some(event) = finished.next() => {
                    let Some(done) = pending.remove(event.request_id.inner()) else {
                        continue;
                    };
                    let body = fetch_body(page.clone(), done.request_id, done.url.clone()).boxed();
                    let response = ObservedResponse::new(done.url, done.content_type, body);
                    if tx.send(response).await.is_err() {
                        // Capture has finished; nothing left to forward to.
                        break;
                    }
                }
                Some(event) = failed.next() => {
                    pending.remove(event.request_id.inner());
                }
                else => break,
            }
        }
    });

    Ok(ListenerTask(task))
}

/// Pause requests whose URL contains `target` and continue them with
/// `headers` merged over their own. Returns `None` when there is nothing to
/// inject. Must be called before navigation.
pub(super) async fn inject_request_headers(
    page: &Page,
    target: &str,
    headers: &BTreeMap<String, String>,
) -> Result<Option<ListenerTask>, ScraperError> {
    if headers.is_empty() {
        return Ok(None);
    }

    let enable = fetch::EnableParams {
        patterns: Some(vec![RequestPattern {
            url_pattern: Some(url_pattern(target)),
            request_stage: Some(RequestStage::Request),
            ..RequestPattern::default()
        }]),
        ..fetch::EnableParams::default()
    };
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    page.execute(enable).await?;
    let page = page.clone();
    let target = target.to_string();
    let headers = headers.clone();

    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let mut params = ContinueRequestParams::new(event.request_id.clone());
            // The pattern already filters, but a paused request must always
            // be continued, so anything else passes through untouched.
            if event.request.url.contains(&target) {
                let merged = merge_headers(event.request.headers.inner(), &headers);
                params.headers = Some(
                    merged
                        .into_iter()
                        .map(|(name, value)| HeaderEntry::new(name, value))
                        .collect(),
                );
            }
            if let Err(e) = page.execute(params).await {
                tracing::warn!(url = %event.request.url, error = %e, "failed to continue paused request");
            }
        }
    });

    Ok(Some(ListenerTask(task)))
}

/// `Fetch` URL pattern matching any URL that contains `target`. `*` and `?`
/// are wildcards there, so literal ones are escaped.
fn url_pattern(target: &str) -> String {
    let mut pattern = String::with_capacity(target.len() + 2);
    pattern.push('*');
    for ch in target.chars() {
        if matches!(ch, '*' | '?' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('*');
    pattern
}

/// Overlay `extra` on a request's own headers. Names compare
/// case-insensitively; an extra header replaces every original header with
/// the same name. Non-string original values are dropped.
fn merge_headers(
    original: &serde_json::Value,
    extra: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = original
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(name, _)| !extra.keys().any(|e| e.eq_ignore_ascii_case(name)))
        .filter_map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_string())))
        .collect();
    merged.extend(extra.iter().map(|(name, value)| (name.clone(), value.clone())));
    merged
}

/// `Content-Type` from the raw headers (any casing), falling back to the
/// MIME type Chromium derived for the response.
fn content_type(response: &Response) -> Option<String> {
    response
        .headers
        .inner()
        .as_object()
        .and_then(|headers| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        })
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
        .or_else(|| (!response.mime_type.is_empty()).then(|| response.mime_type.clone()))
}

async fn fetch_body(
    page: Page,
    request_id: RequestId,
    url: String,
) -> Result<Vec<u8>, ScraperError> {
    let response = page
        .execute(GetResponseBodyParams::new(request_id))
        .await
        .map_err(|e| ScraperError::ResponseBody {
            url: url.clone(),
            reason: e.to_string(),
        })?;
    let body = response.result;

    if body.base64_encoded {
        base64::engine::general_purpose::STANDARD
            .decode(body.body.as_bytes())
            .map_err(|e| ScraperError::ResponseBody {
                url,
                reason: format!("invalid base64 body: {e}"),
            })
    } else {
        Ok(body.body.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn extra(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn extra_headers_are_added_to_original_ones() {
        let original = json!({ "Accept": "application/json", "User-Agent": "Chrome" });
        let merged = merge_headers(&original, &extra(&[("x-country-code", "SG")]));
        assert_eq!(merged.len(), 3);
        assert!(merged.contains(&("Accept".to_string(), "application/json".to_string())));
        assert!(merged.contains(&("User-Agent".to_string(), "Chrome".to_string())));
        assert!(merged.contains(&("x-country-code".to_string(), "SG".to_string())));
    }

    #[test]
    fn extra_header_replaces_original_regardless_of_case() {
        let original = json!({ "accept-language": "fr", "Accept": "*/*" });
        let merged = merge_headers(&original, &extra(&[("Accept-Language", "en-SG")]));
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&("Accept-Language".to_string(), "en-SG".to_string())));
        assert!(!merged.iter().any(|(name, _)| name == "accept-language"));
    }

    #[test]
    fn non_object_original_headers_yield_only_extras() {
        let merged = merge_headers(&serde_json::Value::Null, &extra(&[("a", "1")]));
        assert_eq!(merged, vec![("a".to_string(), "1".to_string())]);
    }

    #[test]
    fn non_string_original_values_are_dropped() {
        let original = json!({ "X-Count": 3, "Accept": "*/*" });
        let merged = merge_headers(&original, &BTreeMap::new());
        assert_eq!(merged, vec![("Accept".to_string(), "*/*".to_string())]);
    }

    #[test]
    fn url_pattern_wraps_and_escapes_target() {
        assert_eq!(url_pattern("foodweb/v2/search"), "*foodweb/v2/search*");
        assert_eq!(url_pattern("search?q=*"), "*search\\?q=\\**");
    }
}
