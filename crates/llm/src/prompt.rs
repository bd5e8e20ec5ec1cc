//! System prompt assembly
//!
//! Builds the single system prompt string from the fixed identity preamble,
//! the current stage block, the visitor profile (when confident), ground
//! truth from the page context, the section map, the directive grammar and
//! the response rules. Voice mode switches to the stricter length preset.

use crate::backend::Message;
use blitsum_core::{ConversationStage, PageContext, UserProfile};

/// Builder for the sales agent system prompt
pub struct PromptBuilder<'a> {
    context: &'a PageContext,
    stage: ConversationStage,
    stage_guidance: Option<String>,
    profile: Option<&'a UserProfile>,
    closing_guidance: Option<String>,
    voice_mode: bool,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(context: &'a PageContext) -> Self {
        Self {
            context,
            stage: ConversationStage::Greeting,
            stage_guidance: None,
            profile: None,
            closing_guidance: None,
            voice_mode: false,
        }
    }

    pub fn with_stage(mut self, stage: ConversationStage, guidance: impl Into<String>) -> Self {
        self.stage = stage;
        self.stage_guidance = Some(guidance.into());
        self
    }

    /// Include the visitor profile block; skipped unless confident
    pub fn with_profile(mut self, profile: &'a UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Closing technique guidance appended during the closing stage
    pub fn with_closing_guidance(mut self, guidance: impl Into<String>) -> Self {
        self.closing_guidance = Some(guidance.into());
        self
    }

    pub fn voice_mode(mut self, enabled: bool) -> Self {
        self.voice_mode = enabled;
        self
    }

    /// Assemble the system prompt string
    pub fn build(self) -> String {
        let mut prompt = String::with_capacity(2048);

        prompt.push_str(
            "You are the on-page sales assistant for this website. You are warm, \
             concise and genuinely helpful; you guide visitors to the right plan \
             without being pushy. Speak naturally, never use markdown headers or \
             bullet lists in replies.\n",
        );

        prompt.push_str(&format!(
            "\n## Current stage: {}\n{}\n",
            self.stage.display_name(),
            self.stage_guidance.as_deref().unwrap_or("")
        ));

        if let Some(profile) = self.profile.filter(|p| p.is_confident()) {
            prompt.push_str("\n## Visitor profile\n");
            prompt.push_str(&format!(
                "Type: {:?}. Company size: {:?}. Urgency: {:?}. Budget: {:?}.\n",
                profile.user_type, profile.company_size, profile.urgency, profile.budget
            ));
            if let Some(industry) = &profile.industry {
                prompt.push_str(&format!("Industry: {industry}.\n"));
            }
            if !profile.pain_points.is_empty() {
                prompt.push_str(&format!("Pain points: {}.\n", profile.pain_points.join("; ")));
            }
            if !profile.objections.is_empty() {
                prompt.push_str(&format!(
                    "Raised objections: {}.\n",
                    profile.objections.join("; ")
                ));
            }
        }

        self.push_ground_truth(&mut prompt);
        self.push_section_map(&mut prompt);

        if let Some(closing) = &self.closing_guidance {
            prompt.push_str(&format!("\n## Closing guidance\n{closing}\n"));
        }

        prompt.push_str(
            "\n## Page actions\n\
             To drive the page, emit a line that is exactly one JSON object:\n\
             {\"action\": \"scroll\", \"section\": \"<section id>\"}\n\
             {\"action\": \"highlight\", \"element\": \"<description>\"}\n\
             {\"action\": \"pulse_cta\", \"element\": \"<description>\"}\n\
             Everything that is not such a line is shown to the visitor as text.\n",
        );

        let word_limit = if self.voice_mode { 50 } else { 80 };
        prompt.push_str(&format!(
            "\n## Response rules\n\
             - At most {word_limit} words of visitor-facing text.\n\
             - Always end with a question or a clear call to action.\n\
             - Only state facts present in the ground truth above; never invent \
             pricing, features or policies.\n",
        ));
        if self.voice_mode {
            prompt.push_str(
                "- You are speaking out loud: no formatting, short sentences, and \
                 invite a simple \"yes\" to move forward.\n",
            );
        }

        prompt
    }

    fn push_ground_truth(&self, prompt: &mut String) {
        let content = &self.context.content;
        prompt.push_str("\n## Ground truth from this page\n");

        if let Some(site) = &content.metadata.site_name {
            prompt.push_str(&format!("Site: {site}.\n"));
        }
        if !self.context.summary.is_empty() {
            prompt.push_str(&format!("Summary: {}\n", self.context.summary));
        }

        if !content.pricing.is_empty() {
            prompt.push_str("Pricing:\n");
            for plan in &content.pricing {
                let marker = if plan.popular { " (most popular)" } else { "" };
                prompt.push_str(&format!("- {} at {}{}", plan.plan, plan.price, marker));
                if !plan.features.is_empty() {
                    prompt.push_str(&format!(": {}", plan.features.join(", ")));
                }
                prompt.push('\n');
            }
        }
        if !content.features.is_empty() {
            prompt.push_str("Features:\n");
            for feature in &content.features {
                if feature.description.is_empty() {
                    prompt.push_str(&format!("- {}\n", feature.name));
                } else {
                    prompt.push_str(&format!("- {}: {}\n", feature.name, feature.description));
                }
            }
        }
        if !content.faqs.is_empty() {
            prompt.push_str("FAQs:\n");
            for faq in &content.faqs {
                prompt.push_str(&format!("- Q: {} A: {}\n", faq.question, faq.answer));
            }
        }
        if !content.products.is_empty() {
            prompt.push_str("Products:\n");
            for product in &content.products {
                prompt.push_str(&format!("- {}", product.name));
                if let Some(price) = &product.price {
                    prompt.push_str(&format!(" ({price})"));
                }
                prompt.push('\n');
            }
        }
        if !content.ctas.is_empty() {
            prompt.push_str("Calls to action on the page:\n");
            for cta in &content.ctas {
                prompt.push_str(&format!("- \"{}\"\n", cta.text));
            }
        }
    }

    fn push_section_map(&self, prompt: &mut String) {
        if self.context.sections.is_empty() {
            return;
        }
        prompt.push_str("\n## Section map\n");
        for section in &self.context.sections {
            let name = section
                .id
                .clone()
                .or_else(|| section.heading.clone())
                .unwrap_or_else(|| section.tag.clone());
            prompt.push_str(&format!("- {name}\n"));
        }
        prompt.push_str(&format!(
            "Visitor is currently near: {}.\n",
            self.context.current_section.label()
        ));
    }
}

/// Assemble the full message list: system prompt, capped history, then the
/// current user message
pub fn build_messages(system_prompt: String, history: &[Message], user: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(user));
    messages
}
