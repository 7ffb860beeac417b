//! Selects the search endpoint's JSON response out of a page's network traffic.
//!
//! The browser session forwards every completed response into a channel; a
//! capture task drains it in the background while the page is being driven
//! and resolves to the last successfully parsed matching payload once it is
//! told to finish (or the channel closes).

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::ScraperError;
use crate::events::EventSink;

const COMPONENT: &str = "ResponseCapture";
const JSON_CONTENT_TYPE: &str = "application/json";

/// A network response observed during the page session.
///
/// The body is only awaited when the response matches the capture target.
pub struct ObservedResponse {
    pub url: String,
    pub content_type: Option<String>,
    body: BoxFuture<'static, Result<Vec<u8>, ScraperError>>,
}

impl ObservedResponse {
    pub fn new(
        url: impl Into<String>,
        content_type: Option<String>,
        body: BoxFuture<'static, Result<Vec<u8>, ScraperError>>,
    ) -> Self {
        Self {
            url: url.into(),
            content_type,
            body,
        }
    }

    /// A response whose body is already in memory.
    pub fn ready(url: impl Into<String>, content_type: Option<&str>, body: Vec<u8>) -> Self {
        Self::new(
            url,
            content_type.map(str::to_string),
            futures::future::ready(Ok(body)).boxed(),
        )
    }

    /// `true` if the URL contains `target` and the content type is JSON.
    #[must_use]
    pub fn matches(&self, target: &str) -> bool {
        self.url.contains(target)
            && self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains(JSON_CONTENT_TYPE))
    }

    async fn into_json(self) -> Result<serde_json::Value, ScraperError> {
        let url = self.url;
        let bytes = self.body.await?;
        serde_json::from_slice(&bytes).map_err(|source| ScraperError::Deserialize {
            context: url,
            source,
        })
    }
}

impl std::fmt::Debug for ObservedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservedResponse")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

pub struct ResponseCapture;

impl ResponseCapture {
    /// Start draining `responses` in a background task.
    ///
    /// Must be called before navigation begins so no response is missed.
    #[must_use]
    pub fn spawn(
        target: impl Into<String>,
        responses: mpsc::Receiver<ObservedResponse>,
        sink: Arc<dyn EventSink>,
    ) -> CaptureHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(run_capture(target.into(), responses, stop_rx, sink));
        CaptureHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Completion handle for a running capture.
#[derive(Debug)]
pub struct CaptureHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Option<serde_json::Value>>,
}

impl CaptureHandle {
    /// Stop listening and return the captured payload, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Task`] if the capture task panicked.
    pub async fn finish(mut self) -> Result<Option<serde_json::Value>, ScraperError> {
        if let Some(stop) = self.stop.take() {
            // The task may already have ended because the channel closed.
            let _ = stop.send(());
        }
        Ok((&mut self.task).await?)
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.task.abort();
        }
    }
}

async fn run_capture(
    target: String,
    mut responses: mpsc::Receiver<ObservedResponse>,
    mut stop: oneshot::Receiver<()>,
    sink: Arc<dyn EventSink>,
) -> Option<serde_json::Value> {
    let mut captured: Option<serde_json::Value> = None;
    let mut stopping = false;

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut stop, if !stopping => {
                // Refuse new responses but still process what is already queued.
                stopping = true;
                responses.close();
                continue;
            }
            next = responses.recv() => next,
        };
        let Some(response) = next else {
            break;
        };

        if !response.matches(&target) {
            continue;
        }

        let url = response.url.clone();
        match response.into_json().await {
            Ok(payload) => {
                if captured.is_some() {
                    sink.info(
                        COMPONENT,
                        "capture",
                        serde_json::json!({ "url": url }),
                        "Replacing previously captured response",
                    );
                }
                sink.info(
                    COMPONENT,
                    "capture",
                    serde_json::json!({ "url": url }),
                    "Response received",
                );
                captured = Some(payload);
            }
            Err(e) => {
                sink.error(
                    COMPONENT,
                    "capture",
                    serde_json::json!({ "url": url, "error": e.to_string() }),
                    "Error parsing JSON response",
                );
            }
        }
    }

    if captured.is_none() {
        sink.info(
            COMPONENT,
            "capture",
            serde_json::json!({ "target": target }),
            "No matching response observed",
        );
    }
    captured
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod tests;
