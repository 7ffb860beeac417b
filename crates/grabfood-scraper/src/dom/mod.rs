//! Listing-card extraction from a rendered page.
//!
//! Extraction is written against two small capability traits so the
//! trimming, splitting and filtering rules can be exercised without a
//! browser. [`HtmlPage`] implements them over an HTML snapshot.

mod html;

pub use html::{validate_selectors, HtmlPage};

use grabfood_core::PageSelectors;

use crate::events::EventSink;
use crate::types::DisplayRecord;

const COMPONENT: &str = "DomExtractor";

/// Read access to a single listing card.
///
/// Both methods return the raw, untrimmed value of the first element under
/// the card matching `selector`, or `None` when there is no such element.
pub trait CardQuery {
    fn query_text(&self, selector: &str) -> Option<String>;
    fn query_attr(&self, selector: &str, attr: &str) -> Option<String>;

    /// Like [`Self::query_attr`], for attributes holding a URL. Pages that
    /// know their own address resolve relative values against it.
    fn query_url(&self, selector: &str, attr: &str) -> Option<String> {
        self.query_attr(selector, attr)
    }
}

/// Read access to a rendered page.
pub trait PageQuery {
    /// Every element matching `selector`, in document order.
    fn cards<'a>(&'a self, selector: &str) -> Vec<Box<dyn CardQuery + 'a>>;
}

/// Extract one [`DisplayRecord`] per listing card, in document order.
///
/// Cards on which no field could be read are skipped.
pub fn extract_restaurants(
    page: &dyn PageQuery,
    selectors: &PageSelectors,
    sink: &dyn EventSink,
) -> Vec<DisplayRecord> {
    let cards = page.cards(&selectors.listing_card);
    let total = cards.len();

    let restaurants: Vec<DisplayRecord> = cards
        .iter()
        .map(|card| read_card(card.as_ref(), selectors))
        .filter(|record| !record.is_empty())
        .collect();

    let skipped = total - restaurants.len();
    if skipped > 0 {
        tracing::debug!(total, skipped, "skipped listing cards with no readable fields");
    }

    sink.info(
        COMPONENT,
        "extract",
        serde_json::to_value(&restaurants).unwrap_or(serde_json::Value::Null),
        "Restaurant Data Received",
    );
    restaurants
}

fn read_card(card: &dyn CardQuery, selectors: &PageSelectors) -> DisplayRecord {
    let text = |selector: &str| non_empty(card.query_text(selector));

    let delivery_info = text(&selectors.delivery_info);
    let (delivery_time, distance) =
        split_delivery_info(delivery_info.as_deref(), &selectors.delivery_separator);

    DisplayRecord {
        name: text(&selectors.name),
        cuisine: text(&selectors.cuisine),
        rating: text(&selectors.rating),
        delivery_time,
        distance,
        promotional_offer: text(&selectors.promotional_offer),
        promo: text(&selectors.promo),
        image_link: non_empty(card.query_url(&selectors.image, &selectors.image_attr)),
    }
}

/// Split `"30 min • 2 km"` into delivery time and distance.
///
/// Both parts are absent unless the text splits into exactly two pieces on
/// `separator`. Each piece is trimmed; an empty piece is absent.
#[must_use]
pub fn split_delivery_info(
    text: Option<&str>,
    separator: &str,
) -> (Option<String>, Option<String>) {
    let Some(text) = text else {
        return (None, None);
    };
    if separator.is_empty() {
        return (None, None);
    }

    let parts: Vec<&str> = text.split(separator).collect();
    let [time, distance] = parts.as_slice() else {
        return (None, None);
    };
    (non_empty_str(time), non_empty_str(distance))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.as_deref().and_then(non_empty_str)
}

fn non_empty_str(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
#[path = "../dom_test.rs"]
mod tests;
