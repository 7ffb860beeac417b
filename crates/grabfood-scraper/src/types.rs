//! Records flowing through one scrape.
//!
//! All three are transient: produced and consumed within a single run. Only
//! [`UnifiedRecord`] is persisted, one per NDJSON line, with camelCase keys
//! and `null` for absent values.

use serde::{Deserialize, Serialize};

/// A merchant projected from the captured search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantRecord {
    pub id: Option<String>,
    /// `address.name` in the payload; matched against card display names.
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `merchantData.estimated_delivery_time`, in minutes, kept as the
    /// payload's own number so integers and fractions survive unchanged.
    pub estimated_delivery_time: Option<serde_json::Number>,
}

/// A listing card scraped from the rendered page.
///
/// Never constructed with every field absent; such cards are discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRecord {
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub rating: Option<String>,
    pub delivery_time: Option<String>,
    pub distance: Option<String>,
    pub promotional_offer: Option<String>,
    pub promo: Option<String>,
    pub image_link: Option<String>,
}

impl DisplayRecord {
    /// `true` when no field carries a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cuisine.is_none()
            && self.rating.is_none()
            && self.delivery_time.is_none()
            && self.distance.is_none()
            && self.promotional_offer.is_none()
            && self.promo.is_none()
            && self.image_link.is_none()
    }
}

/// One merchant joined with its listing card. This is the archived shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub cuisine: Option<String>,
    pub rating: Option<String>,
    pub delivery_time: Option<String>,
    pub distance: Option<String>,
    pub promotional_offer: Option<String>,
    pub promo: Option<String>,
    pub image_link: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub estimated_delivery_time: Option<serde_json::Number>,
}

impl UnifiedRecord {
    /// Merge a merchant with its matching card. Display fields come from the
    /// card, identity and geodata from the merchant.
    #[must_use]
    pub fn merge(merchant: &MerchantRecord, card: &DisplayRecord) -> Self {
        Self {
            id: merchant.id.clone(),
            name: card.name.clone(),
            cuisine: card.cuisine.clone(),
            rating: card.rating.clone(),
            delivery_time: card.delivery_time.clone(),
            distance: card.distance.clone(),
            promotional_offer: card.promotional_offer.clone(),
            promo: card.promo.clone(),
            image_link: card.image_link.clone(),
            latitude: merchant.latitude,
            longitude: merchant.longitude,
            estimated_delivery_time: merchant.estimated_delivery_time.clone(),
        }
    }
}
