//! Time-bounded page interactions.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use chromiumoxide::Page;

use crate::error::ScraperError;

const VISIBILITY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Await `fut`, failing with [`ScraperError::Timeout`] after `timeout_ms`.
pub(super) async fn with_timeout<T, F>(
    step: &str,
    timeout_ms: u64,
    fut: F,
) -> Result<T, ScraperError>
where
    F: Future<Output = Result<T, CdpError>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(ScraperError::Timeout {
            step: step.to_string(),
            timeout_ms,
        }),
    }
}

/// Poll until the first element matching `selector` is rendered with a
/// non-zero box and is not hidden.
pub(super) async fn wait_visible(
    page: &Page,
    selector: &str,
    step: &str,
    timeout_ms: u64,
) -> Result<(), ScraperError> {
    let poll = async {
        loop {
            if is_visible(page, selector).await? {
                return Ok::<(), ScraperError>(());
            }
            tokio::time::sleep(VISIBILITY_POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(Duration::from_millis(timeout_ms), poll)
        .await
        .map_err(|_| ScraperError::Timeout {
            step: step.to_string(),
            timeout_ms,
        })?
}

async fn is_visible(page: &Page, selector: &str) -> Result<bool, ScraperError> {
    let literal = serde_json::to_string(selector).map_err(ScraperError::Serialize)?;
    let script = format!(
        "(() => {{ \
            const el = document.querySelector({literal}); \
            if (!el) return false; \
            const style = window.getComputedStyle(el); \
            const rect = el.getBoundingClientRect(); \
            return style.visibility !== 'hidden' && style.display !== 'none' \
                && rect.width > 0 && rect.height > 0; \
        }})()"
    );

    page.evaluate(script.as_str())
        .await?
        .into_value::<bool>()
        .map_err(|source| ScraperError::Deserialize {
            context: format!("visibility check for {selector}"),
            source,
        })
}

/// Focus the element matching `selector` and type `text` one character at a
/// time, pausing `delay` between keystrokes.
pub(super) async fn type_slowly(
    page: &Page,
    selector: &str,
    text: &str,
    delay: Duration,
) -> Result<(), ScraperError> {
    let input = page.find_element(selector).await?;
    input.click().await?;
    for ch in text.chars() {
        input.type_str(ch.to_string()).await?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}

pub(super) async fn click(page: &Page, selector: &str) -> Result<(), ScraperError> {
    page.find_element(selector).await?.click().await?;
    Ok(())
}
