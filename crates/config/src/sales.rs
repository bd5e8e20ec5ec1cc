//! Sales cue tables: BANT scoring cues, profile inference tables, SPIN
//! question banks and closing templates
//!
//! The analyzer in `blitsum-agent` consumes these as data. Templates use a
//! `{plan}` placeholder substituted with the recommended plan name.

use blitsum_core::{BudgetSignal, CompanySize, ConversationStage, Urgency, UserType};

/// Keyword cues for the four BANT dimensions
pub struct BantCues;

impl BantCues {
    pub const BUDGET: &'static [&'static str] = &[
        "budget",
        "afford",
        "cost",
        "price",
        "pricing",
        "expensive",
        "cheap",
        "investment",
        "roi",
    ];

    pub const AUTHORITY: &'static [&'static str] = &[
        "i decide",
        "my decision",
        "my team",
        "my company",
        "we need",
        "i'm the",
        "founder",
        "manager",
        "director",
        "cto",
        "ceo",
    ];

    pub const NEED: &'static [&'static str] = &[
        "need",
        "problem",
        "struggling",
        "looking for",
        "solution",
        "pain",
        "issue",
        "challenge",
        "require",
    ];

    pub const TIMELINE: &'static [&'static str] = &[
        "now",
        "today",
        "asap",
        "soon",
        "this week",
        "this month",
        "this quarter",
        "urgent",
        "immediately",
        "deadline",
    ];
}

/// Keyword tables driving user profile inference
pub struct ProfileCues;

impl ProfileCues {
    pub const USER_TYPES: &'static [(UserType, &'static [&'static str])] = &[
        (
            UserType::Buyer,
            &["buy", "purchase", "sign up", "trial", "get started", "ready", "pricing"],
        ),
        (
            UserType::Researcher,
            &["compare", "versus", "alternatives", "documentation", "how does", "integrate"],
        ),
        (
            UserType::Skeptic,
            &["really", "proof", "guarantee", "refund", "actually work", "doubt", "skeptical"],
        ),
        (
            UserType::Explorer,
            &["just looking", "browsing", "curious", "interesting", "what is this"],
        ),
    ];

    pub const COMPANY_SIZES: &'static [(CompanySize, &'static [&'static str])] = &[
        (
            CompanySize::Startup,
            &["startup", "founder", "small team", "just me", "solo", "bootstrapped"],
        ),
        (
            CompanySize::Smb,
            &["small business", "smb", "our team", "growing", "agency"],
        ),
        (
            CompanySize::Enterprise,
            &["enterprise", "corporation", "compliance", "sso", "procurement", "thousands"],
        ),
    ];

    pub const INDUSTRIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("saas", &["saas", "software", "app", "platform"]),
        ("ecommerce", &["ecommerce", "shop", "store", "retail"]),
        ("finance", &["finance", "fintech", "bank", "payments"]),
        ("healthcare", &["health", "medical", "clinic", "patients"]),
        ("education", &["education", "school", "students", "course"]),
    ];

    pub const URGENCY: &'static [(Urgency, &'static [&'static str])] = &[
        (Urgency::High, &["now", "today", "asap", "urgent", "immediately"]),
        (Urgency::Medium, &["soon", "this month", "next week", "quarter"]),
        (Urgency::Low, &["someday", "eventually", "just looking", "future"]),
    ];

    pub const BUDGET: &'static [(BudgetSignal, &'static [&'static str])] = &[
        (BudgetSignal::Low, &["cheap", "free", "tight budget", "affordable", "discount"]),
        (BudgetSignal::Mid, &["reasonable", "fair price", "worth it"]),
        (BudgetSignal::High, &["enterprise", "whatever it takes", "budget approved", "invest"]),
    ];

    pub const PAIN_POINTS: &'static [&'static str] = &[
        "problem",
        "struggling",
        "frustrated",
        "pain",
        "difficult",
        "slow",
        "manual",
        "wasting",
    ];

    pub const INTERESTS: &'static [&'static str] = &[
        "interested",
        "like",
        "love",
        "need",
        "looking for",
        "want",
        "curious about",
    ];

    pub const OBJECTIONS: &'static [&'static str] = &[
        "expensive",
        "too much",
        "not sure",
        "concern",
        "worried",
        "but",
        "however",
        "competitor",
    ];
}

/// SPIN question banks keyed by framework dimension
pub struct SpinBank;

impl SpinBank {
    pub const SITUATION: &'static [&'static str] = &[
        "What tools are you using for this today?",
        "How does your team handle this right now?",
        "How big is the team that would use this?",
    ];

    pub const PROBLEM: &'static [&'static str] = &[
        "What's the biggest friction in your current setup?",
        "Where does your current approach fall short?",
        "How often does that problem come up?",
    ];

    pub const IMPLICATION: &'static [&'static str] = &[
        "How much time does that cost your team each week?",
        "What happens if that stays unsolved this quarter?",
        "How does that affect your customers?",
    ];

    pub const NEED_PAYOFF: &'static [&'static str] = &[
        "If that were automated, what would you do with the time?",
        "How valuable would it be to have this solved by next week?",
        "Would removing that blocker change your roadmap?",
    ];

    /// Pick the bank that fits the current stage
    pub fn for_stage(stage: ConversationStage) -> &'static [&'static str] {
        match stage {
            ConversationStage::Greeting | ConversationStage::Discovery => Self::SITUATION,
            ConversationStage::Qualification => Self::PROBLEM,
            ConversationStage::Presentation => Self::IMPLICATION,
            ConversationStage::Objection
            | ConversationStage::Closing
            | ConversationStage::Completed => Self::NEED_PAYOFF,
        }
    }
}

/// Closing technique identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClosingTechnique {
    Assumptive,
    Alternative,
    Urgency,
    Trial,
    Direct,
    Summary,
    Takeaway,
    PuppyDog,
}

impl ClosingTechnique {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClosingTechnique::Assumptive => "assumptive",
            ClosingTechnique::Alternative => "alternative",
            ClosingTechnique::Urgency => "urgency",
            ClosingTechnique::Trial => "trial",
            ClosingTechnique::Direct => "direct",
            ClosingTechnique::Summary => "summary",
            ClosingTechnique::Takeaway => "takeaway",
            ClosingTechnique::PuppyDog => "puppy-dog",
        }
    }
}

/// Statement and follow-up template for one closing technique
#[derive(Debug, Clone)]
pub struct ClosingTemplate {
    pub technique: ClosingTechnique,
    /// Uses `{plan}` for the recommended plan name
    pub statement: &'static str,
    pub follow_up: &'static str,
}

/// Template table keyed by technique
pub const CLOSING_TEMPLATES: &[ClosingTemplate] = &[
    ClosingTemplate {
        technique: ClosingTechnique::Direct,
        statement: "You've seen everything {plan} offers — shall we get your account set up right now?",
        follow_up: "I can walk you through signup, it takes under a minute.",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Assumptive,
        statement: "Great — {plan} fits what you've described. Let's start you on it and you can adjust anytime.",
        follow_up: "Want me to take you to the signup button?",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Alternative,
        statement: "Would you rather start on {plan} or try the tier below it first?",
        follow_up: "Both take effect immediately, so you can switch later.",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Urgency,
        statement: "Since timing matters for you, starting {plan} today means you're up and running this week.",
        follow_up: "Shall I take you to signup?",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Trial,
        statement: "The easiest way to be sure is the free trial of {plan} — no card needed.",
        follow_up: "Want me to open the trial signup?",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Summary,
        statement: "To recap: {plan} covers everything you raised — the pricing, the features and the concerns we walked through.",
        follow_up: "Does that address everything, or is there one more thing I can clear up?",
    },
    ClosingTemplate {
        technique: ClosingTechnique::Takeaway,
        statement: "If {plan} feels like more than you need, the entry tier may honestly serve you better.",
        follow_up: "Which one should we look at?",
    },
    ClosingTemplate {
        technique: ClosingTechnique::PuppyDog,
        statement: "Try {plan} free for a couple of weeks — keep it only if it earns its place.",
        follow_up: "Fair enough?",
    },
];

/// Look up the template for a technique; every technique has one
pub fn closing_template(technique: ClosingTechnique) -> &'static ClosingTemplate {
    CLOSING_TEMPLATES
        .iter()
        .find(|t| t.technique == technique)
        .unwrap_or(&CLOSING_TEMPLATES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_technique_has_template() {
        for technique in [
            ClosingTechnique::Assumptive,
            ClosingTechnique::Alternative,
            ClosingTechnique::Urgency,
            ClosingTechnique::Trial,
            ClosingTechnique::Direct,
            ClosingTechnique::Summary,
            ClosingTechnique::Takeaway,
            ClosingTechnique::PuppyDog,
        ] {
            let template = closing_template(technique);
            assert_eq!(template.technique, technique);
            assert!(template.statement.contains("{plan}"));
        }
    }

    #[test]
    fn test_spin_bank_for_stage() {
        assert_eq!(
            SpinBank::for_stage(ConversationStage::Discovery),
            SpinBank::SITUATION
        );
        assert_eq!(
            SpinBank::for_stage(ConversationStage::Closing),
            SpinBank::NEED_PAYOFF
        );
    }
}
