//! Page context model
//!
//! The page context is the semantic snapshot of the host page that the
//! extractor produces and everything downstream (intent parsing, element
//! finding, action execution, prompt building) consumes. It is immutable
//! per snapshot; the content cache discards the whole snapshot when the
//! host document mutates significantly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle to a node in the retained page document.
///
/// Valid only for the document generation it was extracted from; the cache
/// guarantees a snapshot holding stale ids is discarded before reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Billing period attached to a parsed price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePeriod {
    Monthly,
    Yearly,
    OneTime,
}

/// A single pricing card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPlan {
    /// Plan name from the card heading
    pub plan: String,
    /// Raw price text as it appears on the page
    pub price: String,
    /// Parsed numeric price; `None` for "Custom" pricing
    pub price_value: Option<f64>,
    /// Currency symbol or code; `None` for "Custom" pricing
    pub currency: Option<String>,
    /// Billing period; `None` for "Custom" pricing
    pub period: Option<PricePeriod>,
    /// Feature bullets listed on the card (capped at 15)
    pub features: Vec<String>,
    /// Whether the card carries a popular/recommended marker
    pub popular: bool,
    /// Card element in the page document
    pub element: NodeId,
}

impl PricingPlan {
    /// Custom-priced plans have no numeric price
    pub fn is_custom(&self) -> bool {
        self.price_value.is_none()
    }
}

/// An extracted feature entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name (capped at 100 chars)
    pub name: String,
    /// Short description (capped at 200 chars)
    pub description: String,
    /// Source element in the page document
    pub element: NodeId,
}

/// A question/answer pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    /// Answer text (capped at 300 chars)
    pub answer: String,
}

/// A product card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub price: Option<String>,
    pub image: Option<String>,
    pub element: NodeId,
}

/// A call-to-action element
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToAction {
    /// Visible text
    pub text: String,
    /// Link target when the CTA is an anchor
    pub href: Option<String>,
    /// Tag name of the element
    pub tag: String,
    pub element: NodeId,
}

/// Page metadata from meta tags and JSON-LD
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    pub site_name: Option<String>,
    pub description: Option<String>,
    /// Open Graph properties keyed without the `og:` prefix
    pub og_tags: std::collections::HashMap<String, String>,
    /// Parsed JSON-LD blocks; invalid JSON is skipped silently
    pub schema: Vec<serde_json::Value>,
}

/// A heading in document order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingInfo {
    /// Heading level 1..=6
    pub level: u8,
    pub text: String,
    pub id: Option<String>,
}

/// A structural section of the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInfo {
    pub id: Option<String>,
    pub tag: String,
    pub heading: Option<String>,
    pub text_preview: String,
    pub element: NodeId,
}

/// An outbound or internal link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkInfo {
    pub text: String,
    pub href: String,
}

/// Classified page content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageContent {
    pub pricing: Vec<PricingPlan>,
    pub features: Vec<Feature>,
    pub faqs: Vec<Faq>,
    pub products: Vec<Product>,
    pub ctas: Vec<CallToAction>,
    pub metadata: PageMetadata,
}

/// Where in the page the viewport currently sits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentSection {
    /// A named section straddles the viewport mid-line
    Named(String),
    /// Percentage-scroll fallback bucket
    Top,
    Middle,
    Bottom,
}

impl CurrentSection {
    pub fn label(&self) -> &str {
        match self {
            CurrentSection::Named(name) => name,
            CurrentSection::Top => "top",
            CurrentSection::Middle => "middle",
            CurrentSection::Bottom => "bottom",
        }
    }
}

/// The semantic snapshot of the host page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    pub title: String,
    pub current_section: CurrentSection,
    pub scroll_position: f64,
    pub headings: Vec<HeadingInfo>,
    pub sections: Vec<SectionInfo>,
    pub content: PageContent,
    /// Site keywords (capped at 15)
    pub keywords: Vec<String>,
    /// One-line summary (capped at 200 chars)
    pub summary: String,
    pub links: Vec<LinkInfo>,
    pub extracted_at: DateTime<Utc>,
    /// Wall-clock extraction duration in milliseconds
    pub extraction_time_ms: u64,
}

impl PageContext {
    /// Empty context for a page nothing could be extracted from
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            current_section: CurrentSection::Top,
            scroll_position: 0.0,
            headings: Vec::new(),
            sections: Vec::new(),
            content: PageContent::default(),
            keywords: Vec::new(),
            summary: String::new(),
            links: Vec::new(),
            extracted_at: Utc::now(),
            extraction_time_ms: 0,
        }
    }

    /// Names of all known plans, features, products and CTAs, used for
    /// entity recognition and the "available categories" fallback reply
    pub fn known_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        names.extend(self.content.pricing.iter().map(|p| p.plan.as_str()));
        names.extend(self.content.features.iter().map(|f| f.name.as_str()));
        names.extend(self.content.products.iter().map(|p| p.name.as_str()));
        names.extend(self.content.ctas.iter().map(|c| c.text.as_str()));
        names
    }

    /// Content categories present on this page, e.g. `["pricing", "features"]`
    pub fn available_categories(&self) -> Vec<&'static str> {
        let mut cats = Vec::new();
        if !self.content.pricing.is_empty() {
            cats.push("pricing");
        }
        if !self.content.features.is_empty() {
            cats.push("features");
        }
        if !self.content.faqs.is_empty() {
            cats.push("faq");
        }
        if !self.content.products.is_empty() {
            cats.push("products");
        }
        if !self.content.ctas.is_empty() {
            cats.push("signup options");
        }
        cats
    }

    /// The plan carrying a popular marker, if any
    pub fn popular_plan(&self) -> Option<&PricingPlan> {
        self.content.pricing.iter().find(|p| p.popular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(name: &str, popular: bool) -> PricingPlan {
        PricingPlan {
            plan: name.to_string(),
            price: "$49".to_string(),
            price_value: Some(49.0),
            currency: Some("$".to_string()),
            period: Some(PricePeriod::Monthly),
            features: vec![],
            popular,
            element: NodeId(1),
        }
    }

    #[test]
    fn test_available_categories() {
        let mut ctx = PageContext::empty("https://example.com");
        assert!(ctx.available_categories().is_empty());

        ctx.content.pricing.push(plan("Pro", false));
        assert_eq!(ctx.available_categories(), vec!["pricing"]);
    }

    #[test]
    fn test_popular_plan() {
        let mut ctx = PageContext::empty("https://example.com");
        ctx.content.pricing.push(plan("Starter", false));
        ctx.content.pricing.push(plan("Pro", true));
        assert_eq!(ctx.popular_plan().unwrap().plan, "Pro");
    }

    #[test]
    fn test_custom_plan_has_no_value() {
        let custom = PricingPlan {
            plan: "Enterprise".to_string(),
            price: "Custom".to_string(),
            price_value: None,
            currency: None,
            period: None,
            features: vec![],
            popular: false,
            element: NodeId(2),
        };
        assert!(custom.is_custom());
    }
}
