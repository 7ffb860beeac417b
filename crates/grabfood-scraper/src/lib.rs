//! Capture-and-reconciliation pipeline for food-delivery storefront listings.
//!
//! A scrape joins two partial views of the same restaurants: the search
//! endpoint's JSON response (identity, coordinates, delivery estimate) and
//! the rendered listing cards (display name, cuisine, rating, promotions).
//! The join is keyed on display name and the result is archived as
//! gzip-compressed NDJSON.

pub mod archive;
pub mod browser;
pub mod capture;
pub mod dom;
pub mod error;
pub mod events;
pub mod merchant;
pub mod pipeline;
pub mod reconcile;
pub mod types;

pub use archive::{encode_ndjson_gz, read_archive, write_archive};
pub use browser::{scrape_location, SessionOptions};
pub use capture::{CaptureHandle, ObservedResponse, ResponseCapture};
pub use dom::{extract_restaurants, validate_selectors, CardQuery, HtmlPage, PageQuery};
pub use error::ScraperError;
pub use events::{EventLevel, EventSink, MemorySink, StageEvent, TracingSink};
pub use merchant::extract_merchants;
pub use pipeline::{assemble, run_pipeline, ScrapeOutcome};
pub use reconcile::{reconcile, ReconcileStats};
pub use types::{DisplayRecord, MerchantRecord, UnifiedRecord};
