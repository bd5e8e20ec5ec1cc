//! Semantic page context extraction
//!
//! Walks the visible document and classifies regions into pricing cards,
//! feature lists, FAQs, product cards and CTAs. Deterministic for a given
//! document snapshot. Classifier failures are local: a region that cannot
//! be classified is skipped, never fatal. Extraction honors a soft time
//! budget and returns whatever was built when the budget runs out.

use crate::document::{PageDocument, Rect, Viewport};
use blitsum_config::constants::extract as limits;
use blitsum_config::keywords;
use blitsum_core::text::{clean_whitespace, contains_word, truncate_graphemes};
use blitsum_core::{
    CallToAction, CurrentSection, Faq, Feature, HeadingInfo, LinkInfo, NodeId, PageContext,
    PageMetadata, PricePeriod, PricingPlan, Product, SectionInfo,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([$€£₹]|USD|EUR|GBP|INR)\s*([0-9][0-9.,]*)").unwrap()
});

static MONTHLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(/\s*mo(nth)?\b|per\s+month|monthly)").unwrap());

static YEARLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(/\s*y(ea)?r\b|per\s+year|annual(ly)?)").unwrap());

/// Billing-period token written directly after a matched amount, anchored
/// so only the adjacent suffix extends the literal price text
static PERIOD_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(/\s*mo(nth)?\b|/\s*y(ea)?r\b|per\s+(month|year)\b|monthly\b|annual(ly)?\b)")
        .unwrap()
});

/// Tags that count as semantic containers for ranking
const SEMANTIC_TAGS: &[&str] = &["main", "article", "section", "h1", "h2", "h3"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Extracts a [`PageContext`] from a [`PageDocument`]
pub struct PageExtractor;

impl PageExtractor {
    /// Extract the semantic snapshot. Never fails; missing sections yield
    /// empty lists.
    pub fn extract(doc: &PageDocument) -> PageContext {
        let started = Instant::now();
        let mut ctx = PageContext::empty(doc.url());
        ctx.title = doc.title();
        ctx.scroll_position = doc.scroll_y();

        let visible = doc.visible_nodes();

        ctx.headings = extract_headings(doc, &visible);
        ctx.sections = extract_sections(doc, &visible);
        ctx.current_section = current_section(doc, &ctx.sections);

        let over_budget = || started.elapsed() > limits::SOFT_BUDGET;

        if !over_budget() {
            ctx.content.pricing = extract_pricing(doc, &visible);
        }
        if !over_budget() {
            ctx.content.features = extract_features(doc, &visible);
        }
        if !over_budget() {
            ctx.content.faqs = extract_faqs(doc, &visible);
        }
        if !over_budget() {
            ctx.content.products = extract_products(doc, &visible, &ctx.content.pricing);
        }
        if !over_budget() {
            ctx.content.ctas = extract_ctas(doc, &visible);
        }
        ctx.content.metadata = extract_metadata(doc);

        ctx.keywords = extract_keywords(&ctx);
        ctx.summary = build_summary(&ctx);
        ctx.links = extract_links(doc, &visible);

        ctx.extraction_time_ms = started.elapsed().as_millis().max(1) as u64;
        if over_budget() {
            tracing::warn!(
                elapsed_ms = ctx.extraction_time_ms,
                "page extraction exceeded soft budget, returning partial context"
            );
        }
        ctx
    }
}

/// Relevance ranking used when multiple candidate containers compete.
///
/// Base 50; +30 fully in viewport; up to +20 inversely to distance from the
/// viewport midline; +20 proportional to the viewport-area fraction capped
/// at 0.5; +10 for semantic tags; -20 inside footer/aside.
pub fn relevance_score(doc: &PageDocument, id: NodeId) -> f64 {
    let Some(rect) = doc.rect(id) else {
        return 0.0;
    };
    let vp = doc.viewport();
    let mut score = 50.0;

    if vp.fully_contains(&rect) {
        score += 30.0;
    } else {
        let distance = (rect.mid() - vp.mid()).abs();
        score += 20.0 / (1.0 + distance / 500.0);
    }

    score += 20.0 * visible_area_fraction(&rect, &vp).min(0.5);

    if let Some(tag) = doc.tag(id) {
        if SEMANTIC_TAGS.contains(&tag.as_str()) {
            score += 10.0;
        }
    }

    let mut current = doc.parent(id);
    while let Some(parent) = current {
        if let Some(tag) = doc.tag(parent) {
            if tag == "footer" || tag == "aside" {
                score -= 20.0;
                break;
            }
        }
        current = doc.parent(parent);
    }
    score
}

fn visible_area_fraction(rect: &Rect, vp: &Viewport) -> f64 {
    let overlap_top = rect.top.max(vp.top());
    let overlap_bottom = rect.bottom().min(vp.bottom());
    let overlap = (overlap_bottom - overlap_top).max(0.0);
    (overlap * rect.width) / (vp.height * vp.width).max(1.0)
}

/// Drop candidates that contain another candidate, keeping the innermost
/// qualifying containers
fn retain_innermost(doc: &PageDocument, candidates: &mut Vec<NodeId>) {
    let set: std::collections::HashSet<NodeId> = candidates.iter().copied().collect();
    candidates.retain(|id| !doc.descendants(*id).iter().any(|d| set.contains(d)));
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn extract_headings(doc: &PageDocument, visible: &[NodeId]) -> Vec<HeadingInfo> {
    visible
        .iter()
        .filter_map(|id| {
            let tag = doc.tag(*id)?;
            let level = heading_level(&tag)?;
            let text = doc.text_content(*id);
            if text.is_empty() {
                return None;
            }
            Some(HeadingInfo {
                level,
                text,
                id: doc.dom_id(*id),
            })
        })
        .collect()
}

fn extract_sections(doc: &PageDocument, visible: &[NodeId]) -> Vec<SectionInfo> {
    visible
        .iter()
        .filter_map(|id| {
            let tag = doc.tag(*id)?;
            let is_section =
                matches!(tag.as_str(), "section" | "main" | "article" | "header" | "footer")
                    || (tag == "div" && doc.dom_id(*id).is_some());
            if !is_section {
                return None;
            }
            let heading = first_heading_text(doc, *id);
            let preview = truncate_graphemes(&doc.text_content(*id), 120);
            Some(SectionInfo {
                id: doc.dom_id(*id),
                tag,
                heading,
                text_preview: preview,
                element: *id,
            })
        })
        .collect()
}

fn first_heading_text(doc: &PageDocument, id: NodeId) -> Option<String> {
    doc.descendants(id).into_iter().find_map(|d| {
        let tag = doc.tag(d)?;
        if HEADING_TAGS.contains(&tag.as_str()) {
            let text = doc.text_content(d);
            (!text.is_empty()).then_some(text)
        } else {
            None
        }
    })
}

fn current_section(doc: &PageDocument, sections: &[SectionInfo]) -> CurrentSection {
    let vp = doc.viewport();
    let mid = vp.mid();
    for section in sections {
        if let Some(rect) = doc.rect(section.element) {
            if rect.top <= mid && mid <= rect.bottom() {
                let name = section
                    .id
                    .clone()
                    .or_else(|| section.heading.clone())
                    .unwrap_or_else(|| section.tag.clone());
                return CurrentSection::Named(name);
            }
        }
    }
    let fraction = doc.scroll_fraction();
    if fraction < 0.33 {
        CurrentSection::Top
    } else if fraction < 0.66 {
        CurrentSection::Middle
    } else {
        CurrentSection::Bottom
    }
}

// --- pricing ---------------------------------------------------------------

fn has_price_pattern(text: &str) -> bool {
    PRICE_RE.is_match(text)
}

fn is_pricing_container(doc: &PageDocument, id: NodeId) -> bool {
    let text = doc.text_content(id).to_lowercase();
    if text.is_empty() {
        return false;
    }
    let has_keyword = keywords::PRICING_KEYWORDS
        .iter()
        .any(|k| contains_word(&text, k));
    if has_keyword && has_price_pattern(&text) {
        return true;
    }
    // tables/sections with >= 2 children carrying distinct price patterns
    let tag = doc.tag(id).unwrap_or_default();
    if tag == "table" || tag == "section" {
        let priced_children = doc
            .children(id)
            .into_iter()
            .filter(|c| has_price_pattern(&doc.text_content(*c)))
            .count();
        return priced_children >= 2;
    }
    false
}

fn extract_pricing(doc: &PageDocument, visible: &[NodeId]) -> Vec<PricingPlan> {
    let mut candidates: Vec<NodeId> = visible
        .iter()
        .copied()
        .filter(|id| is_pricing_container(doc, *id))
        .collect();
    retain_innermost(doc, &mut candidates);
    candidates.sort_by(|a, b| {
        relevance_score(doc, *b)
            .partial_cmp(&relevance_score(doc, *a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for container in candidates {
        let cards = extract_cards(doc, container);
        if !cards.is_empty() {
            return cards;
        }
    }
    Vec::new()
}

fn extract_cards(doc: &PageDocument, container: NodeId) -> Vec<PricingPlan> {
    let mut cards = Vec::new();
    let children = doc.children(container);
    let card_nodes: Vec<NodeId> = children
        .into_iter()
        .filter(|c| {
            let text = doc.text_content(*c);
            let has_heading = first_heading_text(doc, *c).is_some();
            has_heading && (has_price_pattern(&text) || contains_word(&text, "custom"))
        })
        .collect();

    let card_nodes = if card_nodes.is_empty() {
        // the container itself may be a lone card
        let text = doc.text_content(container);
        if first_heading_text(doc, container).is_some()
            && (has_price_pattern(&text) || contains_word(&text, "custom"))
        {
            vec![container]
        } else {
            Vec::new()
        }
    } else {
        card_nodes
    };

    for card in card_nodes {
        match extract_card(doc, card) {
            Some(plan) => cards.push(plan),
            None => tracing::debug!(node = %card, "skipped unparseable pricing card"),
        }
    }
    cards
}

fn extract_card(doc: &PageDocument, card: NodeId) -> Option<PricingPlan> {
    let text = doc.text_content(card);

    // plan name: prefer the card's h4, then any heading
    let plan = plan_name(doc, card)?;

    let (price, price_value, currency, period) = parse_price(&text)?;

    let mut features = Vec::new();
    for d in doc.descendants(card) {
        if doc.tag(d).as_deref() != Some("li") {
            continue;
        }
        let bullet = doc.text_content(d);
        let len = bullet.len();
        if !(3..=200).contains(&len) {
            continue;
        }
        let lower = bullet.to_lowercase();
        if keywords::FEATURE_BULLET_EXCLUDES
            .iter()
            .any(|x| lower.contains(x))
        {
            continue;
        }
        features.push(bullet);
        if features.len() >= limits::MAX_PRICING_FEATURES {
            break;
        }
    }

    let lower = text.to_lowercase();
    let popular = keywords::POPULAR_MARKERS
        .iter()
        .any(|m| lower.contains(m))
        || doc
            .classes(card)
            .iter()
            .any(|c| c.to_lowercase().contains("popular"));

    Some(PricingPlan {
        plan,
        price,
        price_value,
        currency,
        period,
        features,
        popular,
        element: card,
    })
}

fn plan_name(doc: &PageDocument, card: NodeId) -> Option<String> {
    let descendants = doc.descendants(card);
    let by_tag = |wanted: &str| {
        descendants.iter().find_map(|d| {
            if doc.tag(*d).as_deref() == Some(wanted) {
                let text = doc.text_content(*d);
                (!text.is_empty()).then_some(text)
            } else {
                None
            }
        })
    };
    by_tag("h4")
        .or_else(|| HEADING_TAGS.iter().find_map(|t| by_tag(*t)))
        .or_else(|| {
            let own = doc.own_text(card);
            (!own.is_empty()).then(|| truncate_graphemes(&own, 30))
        })
}

/// Parse the price of a card. Returns the literal price text as it appears
/// on the page plus normalized value, currency and period, or the Custom
/// sentinel when the card says so.
fn parse_price(text: &str) -> Option<(String, Option<f64>, Option<String>, Option<PricePeriod>)> {
    if let Some(caps) = PRICE_RE.captures(text) {
        let full = caps.get(0)?;
        let currency = caps.get(1).map(|m| m.as_str().to_string());
        let value = caps
            .get(2)
            .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok());

        // slice the source text, extended over an adjacent period token,
        // so "$49/mo" survives as written rather than being rebuilt
        let mut end = full.end();
        if let Some(suffix) = PERIOD_SUFFIX_RE.find(&text[end..]) {
            end += suffix.end();
        }
        let raw = text[full.start()..end].to_string();

        let period = if MONTHLY_RE.is_match(text) {
            Some(PricePeriod::Monthly)
        } else if YEARLY_RE.is_match(text) {
            Some(PricePeriod::Yearly)
        } else {
            Some(PricePeriod::OneTime)
        };
        return Some((raw, value, currency, period));
    }
    if contains_word(text, "custom") {
        return Some(("Custom".to_string(), None, None, None));
    }
    None
}

// --- features --------------------------------------------------------------

fn is_feature_container(doc: &PageDocument, id: NodeId) -> bool {
    let text = doc.text_content(id).to_lowercase();
    if text.is_empty() {
        return false;
    }
    let has_keyword = keywords::FEATURE_KEYWORDS
        .iter()
        .any(|k| contains_word(&text, k));
    let tag = doc.tag(id).unwrap_or_default();
    let classes = doc.classes(id).join(" ").to_lowercase();
    let is_list_or_grid =
        tag == "ul" || tag == "ol" || classes.contains("grid") || classes.contains("list");
    if has_keyword && is_list_or_grid {
        return true;
    }
    structured_children(doc, id).len() >= 3
}

/// Children shaped like `{heading, >=20-char body}`
fn structured_children(doc: &PageDocument, id: NodeId) -> Vec<(NodeId, String, String)> {
    doc.children(id)
        .into_iter()
        .filter_map(|c| {
            let heading = first_heading_text(doc, c)?;
            let body = doc.text_content(c);
            let body = body.strip_prefix(heading.as_str()).unwrap_or(&body).trim().to_string();
            (body.len() >= 20).then_some((c, heading, body))
        })
        .collect()
}

fn extract_features(doc: &PageDocument, visible: &[NodeId]) -> Vec<Feature> {
    let mut candidates: Vec<NodeId> = visible
        .iter()
        .copied()
        .filter(|id| is_feature_container(doc, *id) && !is_pricing_container(doc, *id))
        .collect();
    retain_innermost(doc, &mut candidates);
    candidates.sort_by(|a, b| {
        relevance_score(doc, *b)
            .partial_cmp(&relevance_score(doc, *a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut features: Vec<Feature> = Vec::new();
    for container in candidates {
        let structured = structured_children(doc, container);
        if structured.len() >= 3 {
            for (node, name, body) in structured {
                push_feature(&mut features, name, body, node);
            }
            continue;
        }
        // list container: items are its li children
        for li in doc.descendants(container) {
            if doc.tag(li).as_deref() != Some("li") {
                continue;
            }
            let text = doc.text_content(li);
            if text.len() < 3 {
                continue;
            }
            let (name, desc) = match text.split_once([':', '—', '-']) {
                Some((n, d)) if n.len() >= 3 => (n.trim().to_string(), d.trim().to_string()),
                _ => (text.clone(), String::new()),
            };
            push_feature(&mut features, name, desc, li);
        }
    }
    features
}

fn push_feature(features: &mut Vec<Feature>, name: String, description: String, element: NodeId) {
    let name = truncate_graphemes(&clean_whitespace(&name), limits::MAX_FEATURE_NAME_CHARS);
    if name.is_empty() {
        return;
    }
    // dedup by name, case-insensitive
    if features
        .iter()
        .any(|f| f.name.eq_ignore_ascii_case(&name))
    {
        return;
    }
    features.push(Feature {
        name,
        description: truncate_graphemes(
            &clean_whitespace(&description),
            limits::MAX_FEATURE_DESC_CHARS,
        ),
        element,
    });
}

// --- FAQs ------------------------------------------------------------------

fn extract_faqs(doc: &PageDocument, visible: &[NodeId]) -> Vec<Faq> {
    let mut faqs = Vec::new();

    // definition lists with >= 2 dt entries
    for dl in visible.iter().filter(|id| doc.tag(**id).as_deref() == Some("dl")) {
        let children = doc.children(*dl);
        let dts: Vec<NodeId> = children
            .iter()
            .copied()
            .filter(|c| doc.tag(*c).as_deref() == Some("dt"))
            .collect();
        if dts.len() < 2 {
            continue;
        }
        for dt in dts {
            let question = doc.text_content(dt);
            // answer is the following dd sibling
            let answer = children
                .iter()
                .skip_while(|c| **c != dt)
                .skip(1)
                .find(|c| doc.tag(**c).as_deref() == Some("dd"))
                .map(|dd| doc.text_content(*dd))
                .unwrap_or_default();
            push_faq(&mut faqs, question, answer);
        }
    }

    // keyword or accordion containers with >= 2 question-shaped children
    for id in visible {
        let text = doc.text_content(*id).to_lowercase();
        let classes = doc.classes(*id).join(" ").to_lowercase();
        let keyworded = keywords::FAQ_KEYWORDS.iter().any(|k| text.contains(k));
        let accordion = classes.contains("accordion") || classes.contains("collapse");
        if !keyworded && !accordion {
            continue;
        }
        let pairs = question_pairs(doc, *id);
        if pairs.len() < 2 {
            continue;
        }
        for (question, answer) in pairs {
            push_faq(&mut faqs, question, answer);
        }
        if faqs.len() >= limits::MAX_FAQS {
            break;
        }
    }

    faqs.truncate(limits::MAX_FAQS);
    faqs
}

fn question_pairs(doc: &PageDocument, container: NodeId) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let descendants = doc.descendants(container);
    for (i, d) in descendants.iter().enumerate() {
        let own = doc.own_text(*d);
        if !own.trim_end().ends_with('?') {
            continue;
        }
        // answer: next descendant with non-question text
        let answer = descendants[i + 1..]
            .iter()
            .map(|n| doc.own_text(*n))
            .find(|t| !t.trim().is_empty() && !t.trim_end().ends_with('?'))
            .unwrap_or_default();
        pairs.push((clean_whitespace(&own), answer));
    }
    pairs
}

fn push_faq(faqs: &mut Vec<Faq>, question: String, answer: String) {
    let question = clean_whitespace(&question);
    if question.is_empty() || faqs.iter().any(|f| f.question == question) {
        return;
    }
    faqs.push(Faq {
        question,
        answer: truncate_graphemes(&clean_whitespace(&answer), limits::MAX_FAQ_ANSWER_CHARS),
    });
}

// --- products --------------------------------------------------------------

fn extract_products(
    doc: &PageDocument,
    visible: &[NodeId],
    pricing: &[PricingPlan],
) -> Vec<Product> {
    let pricing_nodes: Vec<NodeId> = pricing.iter().map(|p| p.element).collect();
    let mut products = Vec::new();

    for id in visible {
        if products.len() >= limits::MAX_PRODUCTS {
            break;
        }
        if pricing_nodes.contains(id) {
            continue;
        }
        let classes = doc.classes(*id).join(" ").to_lowercase();
        let heading = first_heading_text(doc, *id);
        let Some(name) = heading else { continue };

        let descendants = doc.descendants(*id);
        let has_image = descendants
            .iter()
            .any(|d| doc.tag(*d).as_deref() == Some("img"));
        let has_button = descendants.iter().any(|d| {
            matches!(doc.tag(*d).as_deref(), Some("button"))
                || doc.attr(*d, "role").as_deref() == Some("button")
        });
        let text = doc.text_content(*id);
        let has_price = has_price_pattern(&text);

        let card_keyword = keywords::PRODUCT_CARD_KEYWORDS
            .iter()
            .any(|k| classes.contains(k));
        let area_ok = doc
            .rect(*id)
            .map(|r| (10_000.0..=500_000.0).contains(&r.area()))
            .unwrap_or(false);
        let body_len_ok = (50..=500).contains(&text.len());

        let qualifies = (card_keyword && (has_image || has_button))
            || (has_price && has_button)
            || (area_ok && has_image && body_len_ok);
        if !qualifies {
            continue;
        }

        let image = descendants.iter().find_map(|d| {
            (doc.tag(*d).as_deref() == Some("img")).then(|| doc.attr(*d, "src")).flatten()
        });
        let price = PRICE_RE
            .captures(&text)
            .map(|c| c.get(0).map(|m| m.as_str().to_string()).unwrap_or_default());
        let description = truncate_graphemes(
            &clean_whitespace(text.strip_prefix(name.as_str()).unwrap_or(&text)),
            limits::MAX_FEATURE_DESC_CHARS,
        );

        products.push(Product {
            name,
            description,
            price,
            image,
            element: *id,
        });
    }
    products
}

// --- CTAs ------------------------------------------------------------------

fn extract_ctas(doc: &PageDocument, visible: &[NodeId]) -> Vec<CallToAction> {
    let mut ctas = Vec::new();
    for id in visible {
        if ctas.len() >= limits::MAX_CTAS {
            break;
        }
        let Some(tag) = doc.tag(*id) else { continue };
        let classes_joined = doc.classes(*id).join(" ").to_lowercase();
        let button_like = tag == "button"
            || doc.attr(*id, "role").as_deref() == Some("button")
            || doc.attr(*id, "onclick").is_some()
            || (tag == "a"
                && (classes_joined.contains("btn") || classes_joined.contains("button")));
        if !button_like {
            continue;
        }

        let text = doc.text_content(*id);
        if text.is_empty() {
            continue;
        }
        let lower = text.to_lowercase();

        let verb_match = keywords::CTA_VERBS.iter().any(|v| lower.contains(v));
        let class_match = keywords::CTA_CLASSES
            .iter()
            .any(|c| classes_joined.contains(c));
        let prominent = doc
            .inline_style(*id, "font-size")
            .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
            .map(|size| size >= 18.0)
            .unwrap_or(false)
            || classes_joined.contains("btn-lg")
            || classes_joined.contains("large");

        if !(verb_match || class_match || prominent) {
            continue;
        }

        ctas.push(CallToAction {
            text: clean_whitespace(&text),
            href: doc.attr(*id, "href"),
            tag,
            element: *id,
        });
    }
    ctas
}

// --- metadata, keywords, summary, links ------------------------------------

fn extract_metadata(doc: &PageDocument) -> PageMetadata {
    let mut metadata = PageMetadata::default();

    for meta in doc.nodes_with_tag("meta") {
        let content = doc.attr(meta, "content").unwrap_or_default();
        if content.is_empty() {
            continue;
        }
        if let Some(property) = doc.attr(meta, "property") {
            if let Some(key) = property.strip_prefix("og:") {
                metadata.og_tags.insert(key.to_string(), content.clone());
            }
        }
        if let Some(name) = doc.attr(meta, "name") {
            match name.as_str() {
                "application-name" if metadata.site_name.is_none() => {
                    metadata.site_name = Some(content.clone());
                }
                "description" if metadata.description.is_none() => {
                    metadata.description = Some(content.clone());
                }
                _ => {}
            }
        }
    }

    if let Some(og_site) = metadata.og_tags.get("site_name") {
        metadata.site_name = Some(og_site.clone());
    }
    if let Some(og_desc) = metadata.og_tags.get("description") {
        metadata.description = Some(og_desc.clone());
    }
    if metadata.site_name.is_none() {
        // title prefix before a separator
        let title = doc.title();
        let prefix = title
            .split(['|', '—', '–'])
            .next()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        metadata.site_name = prefix;
    }

    for script in doc.nodes_with_tag("script") {
        if doc.attr(script, "type").as_deref() != Some("application/ld+json") {
            continue;
        }
        let raw = doc.own_text(script);
        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => metadata.schema.push(value),
            Err(_) => {
                // invalid JSON-LD is silently skipped
            }
        }
    }

    metadata
}

fn extract_keywords(ctx: &PageContext) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    let mut push = |word: &str| {
        let word = word.to_lowercase();
        if word.len() > 3 && !keywords.contains(&word) && keywords.len() < limits::MAX_KEYWORDS {
            keywords.push(word);
        }
    };
    for word in ctx.title.split_whitespace() {
        push(word.trim_matches(|c: char| !c.is_alphanumeric()));
    }
    for heading in ctx.headings.iter().filter(|h| h.level <= 2) {
        for word in heading.text.split_whitespace() {
            push(word.trim_matches(|c: char| !c.is_alphanumeric()));
        }
    }
    keywords
}

fn build_summary(ctx: &PageContext) -> String {
    let base = ctx
        .content
        .metadata
        .description
        .clone()
        .or_else(|| ctx.headings.first().map(|h| h.text.clone()))
        .unwrap_or_default();
    truncate_graphemes(&base, limits::MAX_SUMMARY_CHARS)
}

fn extract_links(doc: &PageDocument, visible: &[NodeId]) -> Vec<LinkInfo> {
    visible
        .iter()
        .filter_map(|id| {
            if doc.tag(*id).as_deref() != Some("a") {
                return None;
            }
            let href = doc.attr(*id, "href")?;
            let text = doc.text_content(*id);
            (!text.is_empty()).then_some(LinkInfo { text, href })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRICING_PAGE: &str = r#"
    <html><head>
      <title>Acme — Ship faster</title>
      <meta property="og:site_name" content="Acme">
      <meta name="description" content="Acme helps teams ship faster.">
      <script type="application/ld+json">{"@type":"Organization","name":"Acme"}</script>
      <script type="application/ld+json">{not json</script>
    </head><body>
      <section id="hero"><h1>Acme Platform</h1><p>Ship faster with Acme.</p></section>
      <section id="pricing"><h2>Pricing plans</h2>
        <div class="card"><h4>Starter</h4><div>$49/mo</div>
          <ul><li>5 projects included</li><li>Email support</li></ul></div>
        <div class="card popular"><h4>Pro</h4><div>$199/mo</div><span>Most Popular</span>
          <ul><li>Unlimited projects</li><li>Priority support</li><li>Popular</li></ul></div>
        <div class="card"><h4>Enterprise</h4><div>Custom</div>
          <ul><li>Dedicated manager</li></ul></div>
      </section>
      <section id="features"><h2>Features you get</h2>
        <div class="grid">
          <div><h3>Fast deploys</h3><p>Deploy in seconds with our global build farm.</p></div>
          <div><h3>Insights</h3><p>Understand usage with built-in analytics dashboards.</p></div>
          <div><h3>Collaboration</h3><p>Review and comment with your whole team inline.</p></div>
        </div>
      </section>
      <section id="faq"><h2>Frequently asked questions</h2>
        <div class="accordion">
          <div><h3>Can I cancel anytime?</h3><p>Yes, plans are month to month.</p></div>
          <div><h3>Do you offer refunds?</h3><p>Within 30 days, no questions asked.</p></div>
        </div>
      </section>
      <a class="btn btn-primary" href="/signup">Get Started</a>
    </body></html>
    "#;

    fn extract() -> PageContext {
        let doc = PageDocument::from_html("https://acme.dev", PRICING_PAGE);
        PageExtractor::extract(&doc)
    }

    #[test]
    fn test_pricing_cards_extracted_in_order() {
        let ctx = extract();
        let plans: Vec<&str> = ctx.content.pricing.iter().map(|p| p.plan.as_str()).collect();
        assert_eq!(plans, vec!["Starter", "Pro", "Enterprise"]);
    }

    #[test]
    fn test_price_normalization() {
        let ctx = extract();
        let starter = &ctx.content.pricing[0];
        // the raw field is the literal page text, period suffix included
        assert_eq!(starter.price, "$49/mo");
        assert_eq!(starter.price_value, Some(49.0));
        assert_eq!(starter.currency.as_deref(), Some("$"));
        assert_eq!(starter.period, Some(PricePeriod::Monthly));
    }

    #[test]
    fn test_custom_plan_sentinel() {
        let ctx = extract();
        let enterprise = &ctx.content.pricing[2];
        assert_eq!(enterprise.price, "Custom");
        assert!(enterprise.price_value.is_none());
        assert!(enterprise.currency.is_none());
        assert!(enterprise.period.is_none());
    }

    #[test]
    fn test_popular_marker() {
        let ctx = extract();
        assert!(!ctx.content.pricing[0].popular);
        assert!(ctx.content.pricing[1].popular);
    }

    #[test]
    fn test_badge_bullets_excluded() {
        let ctx = extract();
        let pro = &ctx.content.pricing[1];
        assert!(pro.features.iter().all(|f| f.to_lowercase() != "popular"));
        assert!(pro.features.iter().any(|f| f.contains("Unlimited")));
    }

    #[test]
    fn test_features_extracted_and_deduped() {
        let ctx = extract();
        let names: Vec<&str> = ctx.content.features.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"Fast deploys"));
        assert!(names.contains(&"Insights"));
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len());
    }

    #[test]
    fn test_small_feature_groups_not_classified() {
        let doc = PageDocument::from_html(
            "https://acme.dev",
            r#"<html><body><div>
              <div><h3>One</h3><p>A body long enough to count as structured.</p></div>
              <div><h3>Two</h3><p>Another body long enough to count here.</p></div>
            </div></body></html>"#,
        );
        let ctx = PageExtractor::extract(&doc);
        assert!(ctx.content.features.is_empty());
    }

    #[test]
    fn test_faqs_extracted() {
        let ctx = extract();
        assert!(ctx.content.faqs.len() >= 2);
        assert!(ctx
            .content
            .faqs
            .iter()
            .any(|f| f.question.contains("cancel")));
    }

    #[test]
    fn test_cta_extracted() {
        let ctx = extract();
        assert!(ctx
            .content
            .ctas
            .iter()
            .any(|c| c.text == "Get Started" && c.href.as_deref() == Some("/signup")));
    }

    #[test]
    fn test_metadata() {
        let ctx = extract();
        assert_eq!(ctx.content.metadata.site_name.as_deref(), Some("Acme"));
        assert_eq!(
            ctx.content.metadata.description.as_deref(),
            Some("Acme helps teams ship faster.")
        );
        // one valid JSON-LD block kept, the invalid one skipped
        assert_eq!(ctx.content.metadata.schema.len(), 1);
    }

    #[test]
    fn test_extraction_never_fails_on_garbage() {
        let doc = PageDocument::from_html("https://x.dev", "<div><<<<not really html");
        let ctx = PageExtractor::extract(&doc);
        assert!(ctx.content.pricing.is_empty());
    }

    #[test]
    fn test_extraction_time_recorded() {
        let ctx = extract();
        assert!(ctx.extraction_time_ms > 0);
    }

    #[test]
    fn test_element_refs_satisfy_their_classifier() {
        let doc = PageDocument::from_html("https://acme.dev", PRICING_PAGE);
        let ctx = PageExtractor::extract(&doc);
        for plan in &ctx.content.pricing {
            let text = doc.text_content(plan.element);
            assert!(
                has_price_pattern(&text) || contains_word(&text, "custom"),
                "pricing ref lost its price pattern"
            );
        }
    }
}
