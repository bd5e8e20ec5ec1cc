//! Element finder
//!
//! Resolves a natural-language description to a document node, in strict
//! strategy order: context search over extracted names, semantic container
//! scan, then raw DOM lookups. The first strategy that yields a node wins.

use crate::document::PageDocument;
use blitsum_core::text::tokens;
use blitsum_core::{IntentTarget, NodeId, PageContext};

/// Token-fraction threshold for the semantic container scan
const SEMANTIC_THRESHOLD: f64 = 0.3;

pub struct ElementFinder;

impl ElementFinder {
    /// Resolve `description` against the page, context first
    pub fn find(doc: &PageDocument, description: &str, ctx: &PageContext) -> Option<NodeId> {
        let description = description.trim();
        if description.is_empty() {
            return None;
        }
        Self::context_search(description, ctx)
            .or_else(|| Self::semantic_search(doc, description))
            .or_else(|| Self::dom_fallback(doc, description))
    }

    /// Exact, substring and word-level matches over names in the page context
    fn context_search(description: &str, ctx: &PageContext) -> Option<NodeId> {
        let query = description.to_lowercase();
        let query_tokens: Vec<String> =
            tokens(&query).into_iter().filter(|t| t.len() > 2).collect();

        let named: Vec<(&str, NodeId)> = ctx
            .content
            .pricing
            .iter()
            .map(|p| (p.plan.as_str(), p.element))
            .chain(ctx.content.features.iter().map(|f| (f.name.as_str(), f.element)))
            .chain(ctx.content.products.iter().map(|p| (p.name.as_str(), p.element)))
            .chain(ctx.content.ctas.iter().map(|c| (c.text.as_str(), c.element)))
            .collect();

        // exact match first
        for (name, element) in &named {
            if name.eq_ignore_ascii_case(&query) {
                return Some(*element);
            }
        }
        // substring either direction
        for (name, element) in &named {
            let name_lower = name.to_lowercase();
            if name_lower.contains(&query) || query.contains(&name_lower) {
                return Some(*element);
            }
        }
        // word-level: a query token equals a token of the name
        for (name, element) in &named {
            let name_tokens = tokens(name);
            if query_tokens
                .iter()
                .any(|qt| name_tokens.iter().any(|nt| nt == qt))
            {
                return Some(*element);
            }
        }
        None
    }

    /// Scan section-like containers, scoring by the fraction of query
    /// tokens present in the container text
    fn semantic_search(doc: &PageDocument, description: &str) -> Option<NodeId> {
        let query_tokens: Vec<String> = tokens(description)
            .into_iter()
            .filter(|t| t.len() > 2)
            .collect();
        if query_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(NodeId, f64)> = None;
        for id in doc.visible_nodes() {
            let tag = doc.tag(id).unwrap_or_default();
            let section_like = matches!(tag.as_str(), "section" | "main" | "article")
                || (tag == "div" && doc.dom_id(id).is_some());
            if !section_like {
                continue;
            }
            let text = doc.text_content(id).to_lowercase();
            if text.is_empty() {
                continue;
            }
            let hits = query_tokens.iter().filter(|t| text.contains(t.as_str())).count();
            let score = hits as f64 / query_tokens.len() as f64;
            if score >= SEMANTIC_THRESHOLD
                && best.map(|(_, s)| score > s).unwrap_or(true)
            {
                best = Some((id, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Raw lookups per token: `#token`, `[id*=token]`, `[class*=token]`,
    /// `[aria-label*=description]`, `[data-section*=description]`
    fn dom_fallback(doc: &PageDocument, description: &str) -> Option<NodeId> {
        let description_lower = description.to_lowercase();
        let query_tokens = tokens(&description_lower);
        let nodes = doc.visible_nodes();

        for token in &query_tokens {
            if let Some(id) = nodes.iter().find(|id| {
                doc.dom_id(**id)
                    .map(|d| d.eq_ignore_ascii_case(token))
                    .unwrap_or(false)
            }) {
                return Some(*id);
            }
        }
        for token in &query_tokens {
            if let Some(id) = nodes.iter().find(|id| {
                doc.dom_id(**id)
                    .map(|d| d.to_lowercase().contains(token.as_str()))
                    .unwrap_or(false)
            }) {
                return Some(*id);
            }
        }
        for token in &query_tokens {
            if let Some(id) = nodes.iter().find(|id| {
                doc.classes(**id)
                    .iter()
                    .any(|c| c.to_lowercase().contains(token.as_str()))
            }) {
                return Some(*id);
            }
        }
        nodes
            .iter()
            .find(|id| {
                doc.attr(**id, "aria-label")
                    .map(|v| v.to_lowercase().contains(&description_lower))
                    .unwrap_or(false)
                    || doc
                        .attr(**id, "data-section")
                        .map(|v| v.to_lowercase().contains(&description_lower))
                        .unwrap_or(false)
            })
            .copied()
    }

    /// Resolve a whole section by target kind using a small keyword list
    pub fn find_section_by_type(
        doc: &PageDocument,
        ctx: &PageContext,
        target: IntentTarget,
    ) -> Option<NodeId> {
        let keywords: &[&str] = match target {
            IntentTarget::Pricing => &["pricing", "plans", "price"],
            IntentTarget::Features => &["features", "benefits", "capabilities"],
            IntentTarget::Signup => &["signup", "sign-up", "register", "get-started", "trial"],
            IntentTarget::Contact => &["contact", "support", "sales"],
            IntentTarget::About => &["about", "team", "company"],
            IntentTarget::Faq => &["faq", "questions", "help"],
            IntentTarget::Product => &["products", "product", "shop"],
            IntentTarget::Cta | IntentTarget::Unknown => return None,
        };

        for section in &ctx.sections {
            let id_match = section
                .id
                .as_deref()
                .map(|id| {
                    let id = id.to_lowercase();
                    keywords.iter().any(|k| id.contains(k))
                })
                .unwrap_or(false);
            let heading_match = section
                .heading
                .as_deref()
                .map(|h| {
                    let h = h.to_lowercase();
                    keywords.iter().any(|k| h.contains(k))
                })
                .unwrap_or(false);
            if id_match || heading_match {
                return Some(section.element);
            }
        }
        // fall back to a raw scan
        keywords
            .iter()
            .find_map(|k| Self::dom_fallback(doc, k))
    }

    /// The element's own scroll container: itself when it scrolls, else the
    /// closest section-like ancestor
    pub fn scrollable_parent(doc: &PageDocument, id: NodeId) -> NodeId {
        let overflow = doc.inline_style(id, "overflow");
        if matches!(overflow.as_deref(), Some("auto") | Some("scroll")) {
            return id;
        }
        let mut current = doc.parent(id);
        while let Some(parent) = current {
            if let Some(tag) = doc.tag(parent) {
                if matches!(tag.as_str(), "section" | "main" | "article" | "body") {
                    return parent;
                }
            }
            current = doc.parent(parent);
        }
        id
    }
}
