//! Sequential core of one scrape: merchants → cards → join → archive.

use std::path::{Path, PathBuf};

use grabfood_core::PageSelectors;

use crate::archive::write_archive;
use crate::dom::{extract_restaurants, HtmlPage, PageQuery};
use crate::error::ScraperError;
use crate::events::EventSink;
use crate::merchant::extract_merchants;
use crate::reconcile::{reconcile, ReconcileStats};
use crate::types::UnifiedRecord;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub records: Vec<UnifiedRecord>,
    pub output: PathBuf,
    pub stats: ReconcileStats,
    /// `false` when no search response was captured.
    pub response_captured: bool,
}

/// Join the captured payload with the cards on `page`.
///
/// Absent inputs degrade to an empty result; nothing here fails.
pub fn assemble(
    captured: Option<&serde_json::Value>,
    page: &dyn PageQuery,
    selectors: &PageSelectors,
    sink: &dyn EventSink,
) -> (Vec<UnifiedRecord>, ReconcileStats) {
    let merchants = extract_merchants(captured, sink).unwrap_or_default();
    let restaurants = extract_restaurants(page, selectors, sink);
    reconcile(&merchants, &restaurants, sink)
}

/// Run the core pipeline over a captured payload and a page snapshot, then
/// archive the unified records at `output`. `page_url` is the address the
/// snapshot was taken from; relative image links are resolved against it.
///
/// # Errors
///
/// Only archive failures propagate; see [`write_archive`].
pub async fn run_pipeline(
    captured: Option<serde_json::Value>,
    html: &str,
    page_url: Option<&str>,
    selectors: &PageSelectors,
    output: &Path,
    sink: &dyn EventSink,
) -> Result<ScrapeOutcome, ScraperError> {
    let response_captured = captured.is_some();

    // The parsed document is not `Send`; keep it out of the await below.
    let (records, stats) = {
        let mut page = HtmlPage::parse(html);
        if let Some(url) = page_url {
            page = page.with_base_url(url);
        }
        assemble(captured.as_ref(), &page, selectors, sink)
    };

    sink.info(
        "Pipeline",
        "run",
        serde_json::to_value(&records).unwrap_or(serde_json::Value::Null),
        "Result",
    );

    let output = write_archive(&records, output, sink).await?;

    Ok(ScrapeOutcome {
        records,
        output,
        stats,
        response_captured,
    })
}
