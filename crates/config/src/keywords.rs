//! Keyword vocabularies used by the extractor, the intent parser and the
//! conversation flow
//!
//! These are data, not code: the matching semantics (whole word for single
//! tokens, substring for phrases) live in `blitsum_core::text` and every
//! consumer goes through it.

use blitsum_core::{IntentKind, IntentTarget};

/// Intent verb groups, scored by whole-word matches
pub const INTENT_VERBS: &[(IntentKind, &[&str])] = &[
    (
        IntentKind::Navigate,
        &["show", "go", "take", "navigate", "open", "see", "view", "find", "where"],
    ),
    (
        IntentKind::Compare,
        &["compare", "difference", "versus", "vs", "against", "between"],
    ),
    (
        IntentKind::Highlight,
        &["highlight", "point", "focus", "emphasize", "mark"],
    ),
    (
        IntentKind::Read,
        &["read", "tell", "explain", "describe", "what does", "what is", "summarize"],
    ),
    (
        IntentKind::Click,
        &["click", "press", "select", "choose", "tap", "sign me up", "start trial"],
    ),
];

/// Target noun groups, scored by whole-word matches
pub const TARGET_NOUNS: &[(IntentTarget, &[&str])] = &[
    (
        IntentTarget::Pricing,
        &["pricing", "price", "prices", "plan", "plans", "cost", "costs", "tier", "tiers"],
    ),
    (
        IntentTarget::Features,
        &["feature", "features", "capability", "capabilities", "functionality"],
    ),
    (
        IntentTarget::Signup,
        &["signup", "sign up", "register", "trial", "get started", "subscribe", "join"],
    ),
    (
        IntentTarget::Contact,
        &["contact", "support", "sales team", "talk to", "email", "demo"],
    ),
    (IntentTarget::About, &["about", "company", "team", "story", "mission"]),
    (
        IntentTarget::Faq,
        &["faq", "faqs", "question", "questions", "help", "how do"],
    ),
    (IntentTarget::Product, &["product", "products", "item", "items"]),
    (IntentTarget::Cta, &["button", "link", "cta"]),
];

/// Fallback plan names recognized as entities even when the page context
/// lists none
pub const COMMON_PLAN_NAMES: &[&str] = &[
    "starter",
    "basic",
    "pro",
    "professional",
    "premium",
    "business",
    "enterprise",
    "free",
];

/// CTA verb list for button-like element classification
pub const CTA_VERBS: &[&str] = &[
    "get started",
    "sign up",
    "start free",
    "try free",
    "try now",
    "buy now",
    "subscribe",
    "join",
    "book a demo",
    "request demo",
    "contact sales",
    "start trial",
    "upgrade",
    "download",
];

/// Class tokens that mark an element as a CTA
pub const CTA_CLASSES: &[&str] = &["cta", "btn-primary", "button-primary", "signup"];

/// Popular/recommended markers on pricing cards
pub const POPULAR_MARKERS: &[&str] = &[
    "popular",
    "most popular",
    "recommended",
    "best value",
    "featured",
];

/// Badge-like tokens excluded from pricing feature bullets
pub const FEATURE_BULLET_EXCLUDES: &[&str] = &["popular", "most advanced", "best value"];

/// Section classifier keywords
pub const PRICING_KEYWORDS: &[&str] = &["pricing", "price", "plan", "plans", "tier", "billing"];
pub const FEATURE_KEYWORDS: &[&str] = &["feature", "features", "benefits", "capabilities", "why"];
pub const FAQ_KEYWORDS: &[&str] = &["faq", "faqs", "frequently asked", "questions"];
pub const PRODUCT_CARD_KEYWORDS: &[&str] = &["card", "product", "item", "offer"];

/// Stage transition cue tables, checked in priority order
pub mod stage_cues {
    /// Cues that move the conversation to closing
    pub const CLOSING: &[&str] = &[
        "sign up",
        "get started",
        "buy",
        "purchase",
        "trial",
        "subscribe",
        "join",
    ];

    /// Objection cues
    pub const OBJECTION: &[&str] = &[
        "but",
        "however",
        "expensive",
        "not sure",
        "concern",
        "worried",
        "doubt",
        "hesitant",
    ];

    /// Qualification cues
    pub const QUALIFICATION: &[&str] = &[
        "price",
        "cost",
        "how much",
        "budget",
        "when",
        "timeline",
        "team size",
    ];

    /// Presentation cues
    pub const PRESENTATION: &[&str] = &[
        "features",
        "how does",
        "show me",
        "demo",
        "capabilities",
        "what can",
    ];

    /// Discovery cues
    pub const DISCOVERY: &[&str] = &["what", "tell me", "explain", "help", "looking for", "need"];
}
