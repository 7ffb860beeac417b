//! One browser-driven scrape of a single delivery location.
//!
//! Launches Chromium, captures the search response while driving the
//! storefront's location search, snapshots the rendered listing, and hands
//! both to [`run_pipeline`]. The page and browser are closed on every exit
//! path.

mod actions;
mod network;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use grabfood_core::{AppConfig, PageSelectors};
use tokio::sync::mpsc;

use crate::capture::ResponseCapture;
use crate::dom::validate_selectors;
use crate::error::ScraperError;
use crate::events::EventSink;
use crate::pipeline::{run_pipeline, ScrapeOutcome};

const COMPONENT: &str = "ScrapeSession";

/// Responses buffered between the CDP event forwarder and the capture task.
const RESPONSE_BUFFER: usize = 256;

/// Inputs for [`scrape_location`].
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions<'a> {
    pub config: &'a AppConfig,
    pub selectors: &'a PageSelectors,
    /// Free-text delivery address typed into the storefront's search box.
    pub location: &'a str,
    /// Route traffic through `config.proxy_server`.
    pub use_proxy: bool,
    pub output: &'a Path,
}

/// Scrape the listing for one location and archive the unified records.
///
/// # Errors
///
/// Returns [`ScraperError`] if the browser cannot be launched, a page step
/// times out, or the archive cannot be written. Missing or malformed data
/// is not an error; it only shrinks the output.
pub async fn scrape_location(
    options: SessionOptions<'_>,
    sink: Arc<dyn EventSink>,
) -> Result<ScrapeOutcome, ScraperError> {
    validate_selectors(options.selectors)?;
    let browser_config = build_browser_config(options.config, options.use_proxy)?;

    let (mut browser, mut handler) = Browser::launch(browser_config).await?;
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                tracing::debug!(error = %e, "CDP handler error");
            }
        }
    });

    let result = match browser.new_page("about:blank").await {
        Ok(page) => {
            let result = drive_page(&page, options, Arc::clone(&sink)).await;
            if let Err(e) = page.close().await {
                tracing::warn!(error = %e, "failed to close page");
            }
            result
        }
        Err(e) => Err(e.into()),
    };

    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "failed to close browser");
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!(error = %e, "failed to wait for browser exit");
    }
    handler_task.abort();

    if let Err(e) = &result {
        sink.error(
            COMPONENT,
            "scrape",
            serde_json::json!({ "error": e.to_string() }),
            "Error occurred during scraping",
        );
    }
    sink.flush();
    result
}

fn build_browser_config(
    config: &AppConfig,
    use_proxy: bool,
) -> Result<BrowserConfig, ScraperError> {
    let mut builder = BrowserConfig::builder()
        .request_timeout(Duration::from_millis(config.timeouts.navigation_ms));

    if !config.headless {
        builder = builder.with_head();
    }
    if let Some(path) = &config.chrome_path {
        builder = builder.chrome_executable(path);
    }
    if use_proxy {
        let Some(server) = &config.proxy_server else {
            return Err(ScraperError::BrowserConfig(
                "proxy requested but GRABFOOD_PROXY_SERVER is not set".to_string(),
            ));
        };
        builder = builder.arg(format!("--proxy-server={server}"));
    }

    builder.build().map_err(ScraperError::BrowserConfig)
}

async fn drive_page(
    page: &Page,
    options: SessionOptions<'_>,
    sink: Arc<dyn EventSink>,
) -> Result<ScrapeOutcome, ScraperError> {
    let config = options.config;
    let selectors = options.selectors;
    let timeouts = config.timeouts;

    sink.info(
        COMPONENT,
        "scrape",
        serde_json::json!({ "location": options.location }),
        "Scraping process initiated",
    );

    let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
    let forwarder = network::forward_responses(page, tx).await?;
    let capture = ResponseCapture::spawn(config.request_url.clone(), rx, Arc::clone(&sink));
    let _header_injector =
        network::inject_request_headers(page, &config.request_url, &config.request_headers)
            .await?;
    sink.info(
        COMPONENT,
        "scrape",
        serde_json::json!({
            "target": config.request_url,
            "injected_headers": config.request_headers.keys().collect::<Vec<_>>(),
        }),
        "Response interception started",
    );

    actions::with_timeout(
        "storefront navigation",
        timeouts.navigation_ms,
        page.goto(config.grab_food_url.as_str()),
    )
    .await?;
    sink.info(
        COMPONENT,
        "scrape",
        serde_json::json!({ "url": config.grab_food_url }),
        "Storefront loaded",
    );

    actions::wait_visible(page, &selectors.location_input, "location input", timeouts.input_ms)
        .await?;
    actions::type_slowly(
        page,
        &selectors.location_input,
        options.location,
        Duration::from_millis(config.typing_delay_ms),
    )
    .await?;
    sink.info(COMPONENT, "scrape", serde_json::Value::Null, "Location added");

    actions::wait_visible(page, &selectors.submit_button, "search button", timeouts.submit_ms)
        .await?;
    actions::click(page, &selectors.submit_button).await?;
    sink.info(COMPONENT, "scrape", serde_json::Value::Null, "Search submitted");

    actions::with_timeout(
        "search navigation",
        timeouts.navigation_ms,
        page.wait_for_navigation(),
    )
    .await?;
    actions::wait_visible(page, &selectors.listing_card, "listing cards", timeouts.listing_ms)
        .await?;

    let captured = capture.finish().await?;
    drop(forwarder);
    let html = page.content().await?;
    let page_url = page
        .url()
        .await?
        .unwrap_or_else(|| config.grab_food_url.clone());

    run_pipeline(
        captured,
        &html,
        Some(&page_url),
        selectors,
        options.output,
        sink.as_ref(),
    )
    .await
}
