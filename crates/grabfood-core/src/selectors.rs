//! CSS selectors used to drive the storefront and read its listing cards.
//!
//! The storefront ships CSS-module class names (`name___2epcT`) whose hash
//! suffix changes between deployments, so every selector can be overridden
//! from a YAML file without a rebuild. Keys missing from the file keep their
//! built-in default.
//!
//! ```yaml
//! listing_card: ".swiper-slide"
//! name: ".name___3Kx9a"
//! delivery_separator: "•"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSelectors {
    pub location_input: String,
    pub submit_button: String,
    /// Repeated container of one restaurant in the listing carousel.
    pub listing_card: String,
    pub name: String,
    pub cuisine: String,
    pub rating: String,
    /// Element whose text holds `"<delivery time><separator><distance>"`.
    pub delivery_info: String,
    pub promotional_offer: String,
    pub promo: String,
    pub image: String,
    /// Attribute of [`Self::image`] that holds the image URL.
    pub image_attr: String,
    pub delivery_separator: String,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            location_input: "#location-input".to_string(),
            submit_button: ".submitBtn___2roqB".to_string(),
            listing_card: ".swiper-slide".to_string(),
            name: ".name___2epcT".to_string(),
            cuisine: ".cuisine___T2tCh".to_string(),
            rating: ".numbersChild___2qKMV:first-child".to_string(),
            delivery_info: ".numbersChild___2qKMV:nth-child(2)".to_string(),
            promotional_offer: ".discountText___GQCkj".to_string(),
            promo: ".promoTagHead___1bjRG".to_string(),
            image: ".realImage___2TyNE".to_string(),
            image_attr: "src".to_string(),
            delivery_separator: "•".to_string(),
        }
    }
}

impl PageSelectors {
    /// Every CSS selector paired with its field name, in declaration order.
    ///
    /// `image_attr` and `delivery_separator` are not selectors and are not
    /// included.
    #[must_use]
    pub fn css_selectors(&self) -> [(&'static str, &str); 10] {
        [
            ("location_input", self.location_input.as_str()),
            ("submit_button", self.submit_button.as_str()),
            ("listing_card", self.listing_card.as_str()),
            ("name", self.name.as_str()),
            ("cuisine", self.cuisine.as_str()),
            ("rating", self.rating.as_str()),
            ("delivery_info", self.delivery_info.as_str()),
            ("promotional_offer", self.promotional_offer.as_str()),
            ("promo", self.promo.as_str()),
            ("image", self.image.as_str()),
        ]
    }
}

/// Load selector overrides from a YAML file, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selectors(path: Option<&Path>) -> Result<PageSelectors, ConfigError> {
    let Some(path) = path else {
        return Ok(PageSelectors::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let selectors: PageSelectors =
        serde_yaml::from_str(&content).map_err(ConfigError::SelectorsFileParse)?;

    validate_selectors(&selectors)?;

    Ok(selectors)
}

fn validate_selectors(selectors: &PageSelectors) -> Result<(), ConfigError> {
    for (field, value) in selectors.css_selectors() {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{field}' must be non-empty"
            )));
        }
    }

    if selectors.image_attr.trim().is_empty() {
        return Err(ConfigError::Validation(
            "image_attr must be non-empty".to_string(),
        ));
    }

    if selectors.delivery_separator.is_empty() {
        return Err(ConfigError::Validation(
            "delivery_separator must be non-empty".to_string(),
        ));
    }

    Ok(())
}
