//! [`PageQuery`] over a static HTML snapshot, backed by the `scraper` crate.

use grabfood_core::PageSelectors;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{CardQuery, PageQuery};
use crate::error::ScraperError;

/// A parsed snapshot of the rendered page (`document.documentElement.outerHTML`).
pub struct HtmlPage {
    document: Html,
    base: Option<Url>,
}

impl HtmlPage {
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
            base: None,
        }
    }

    /// Resolve relative URL attributes against `page_url`, the address the
    /// snapshot was taken from. An unparsable address leaves values as-is.
    #[must_use]
    pub fn with_base_url(mut self, page_url: &str) -> Self {
        match Url::parse(page_url) {
            Ok(base) => self.base = Some(base),
            Err(e) => tracing::warn!(page_url, error = %e, "ignoring unparsable page URL"),
        }
        self
    }
}

impl PageQuery for HtmlPage {
    fn cards<'a>(&'a self, selector: &str) -> Vec<Box<dyn CardQuery + 'a>> {
        let Ok(selector) = Selector::parse(selector) else {
            tracing::warn!(selector, "unparsable listing card selector");
            return Vec::new();
        };
        self.document
            .select(&selector)
            .map(|element| {
                Box::new(HtmlCard {
                    element,
                    base: self.base.as_ref(),
                }) as Box<dyn CardQuery + 'a>
            })
            .collect()
    }
}

struct HtmlCard<'a> {
    element: ElementRef<'a>,
    base: Option<&'a Url>,
}

impl HtmlCard<'_> {
    fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let selector = Selector::parse(selector).ok()?;
        self.element.select(&selector).next()
    }
}

impl CardQuery for HtmlCard<'_> {
    fn query_text(&self, selector: &str) -> Option<String> {
        self.first(selector).map(|el| el.text().collect())
    }

    fn query_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr(attr).map(str::to_string))
    }

    fn query_url(&self, selector: &str, attr: &str) -> Option<String> {
        let raw = self.query_attr(selector, attr)?;
        let Some(base) = self.base else {
            return Some(raw);
        };
        match base.join(raw.trim()) {
            Ok(resolved) => Some(resolved.to_string()),
            Err(_) => Some(raw),
        }
    }
}

/// Check that every configured selector is valid CSS.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] naming the first selector that
/// does not parse.
pub fn validate_selectors(selectors: &PageSelectors) -> Result<(), ScraperError> {
    for (field, selector) in selectors.css_selectors() {
        if Selector::parse(selector).is_err() {
            return Err(ScraperError::InvalidSelector {
                field: field.to_string(),
                selector: selector.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARDS: &str = r#"
        <html><body>
          <div class="swiper-slide"><p class="title"> First </p><img class="pic" src="/a.png"></div>
          <div class="swiper-slide"><p class="title">Second</p></div>
          <div class="other"><p class="title">Not a card</p></div>
        </body></html>
    "#;

    #[test]
    fn cards_follow_document_order() {
        let page = HtmlPage::parse(CARDS);
        let cards = page.cards(".swiper-slide");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].query_text(".title").as_deref(), Some(" First "));
        assert_eq!(cards[1].query_text(".title").as_deref(), Some("Second"));
    }

    #[test]
    fn attr_lookup_and_missing_elements() {
        let page = HtmlPage::parse(CARDS);
        let cards = page.cards(".swiper-slide");
        assert_eq!(cards[0].query_attr(".pic", "src").as_deref(), Some("/a.png"));
        assert!(cards[0].query_attr(".pic", "alt").is_none());
        assert!(cards[1].query_attr(".pic", "src").is_none());
        assert!(cards[1].query_text(".missing").is_none());
    }

    #[test]
    fn relative_urls_resolve_against_page_url() {
        let html = r#"
            <div class="swiper-slide"><img class="pic" src="/img/a.png"></div>
            <div class="swiper-slide"><img class="pic" src="b.png"></div>
            <div class="swiper-slide"><img class="pic" src="https://cdn.example.net/c.png"></div>
            <div class="swiper-slide"><img class="pic" src="//cdn.example.net/d.png"></div>
        "#;
        let page = HtmlPage::parse(html).with_base_url("https://food.grab.com/sg/en/restaurants");
        let urls: Vec<_> = page
            .cards(".swiper-slide")
            .iter()
            .map(|card| card.query_url(".pic", "src"))
            .collect();
        assert_eq!(
            urls,
            vec![
                Some("https://food.grab.com/img/a.png".to_string()),
                Some("https://food.grab.com/sg/en/b.png".to_string()),
                Some("https://cdn.example.net/c.png".to_string()),
                Some("https://cdn.example.net/d.png".to_string()),
            ]
        );
    }

    #[test]
    fn urls_stay_raw_without_a_base() {
        let page = HtmlPage::parse(CARDS);
        let cards = page.cards(".swiper-slide");
        assert_eq!(cards[0].query_url(".pic", "src").as_deref(), Some("/a.png"));

        let page = HtmlPage::parse(CARDS).with_base_url("not a url");
        let cards = page.cards(".swiper-slide");
        assert_eq!(cards[0].query_url(".pic", "src").as_deref(), Some("/a.png"));
    }

    #[test]
    fn plain_attributes_are_not_resolved() {
        let page = HtmlPage::parse(CARDS).with_base_url("https://food.grab.com/sg/en/");
        let cards = page.cards(".swiper-slide");
        assert_eq!(cards[0].query_attr(".pic", "src").as_deref(), Some("/a.png"));
    }

    #[test]
    fn invalid_card_selector_yields_no_cards() {
        let page = HtmlPage::parse(CARDS);
        assert!(page.cards("div[").is_empty());
    }

    #[test]
    fn default_selectors_are_valid() {
        assert!(validate_selectors(&PageSelectors::default()).is_ok());
    }

    #[test]
    fn invalid_selector_is_reported_by_field() {
        let selectors = PageSelectors {
            promo: ".promo[".to_string(),
            ..PageSelectors::default()
        };
        let err = validate_selectors(&selectors).unwrap_err();
        assert!(
            matches!(err, ScraperError::InvalidSelector { ref field, .. } if field == "promo"),
            "unexpected error: {err:?}"
        );
    }
}
