//! Sales analyzer
//!
//! BANT scoring over the conversation, SPIN question selection, visitor
//! profile inference from keyword tables, and closing technique selection
//! with plan recommendation. All cue tables live in `blitsum-config`.

use blitsum_config::sales::{closing_template, ClosingTechnique, SpinBank};
use blitsum_config::{BantCues, ProfileCues};
use blitsum_core::text::contains_word;
use blitsum_core::{
    ActionKind, BehaviorSnapshot, BudgetSignal, CompanySize, ConversationStage, IntentTarget,
    PageContext, PlannedAction, Urgency, UserProfile, UserType,
};
use serde::{Deserialize, Serialize};

/// Band recommendation from the BANT total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BantRecommendation {
    Close,
    Present,
    Nurture,
    Disqualify,
}

/// BANT qualification score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BantScore {
    pub budget: f32,
    pub authority: f32,
    pub need: f32,
    pub timeline: f32,
    /// Mean of the four sub-scores
    pub total: f32,
    pub is_qualified: bool,
    pub recommendation: BantRecommendation,
}

/// A selected closing play
#[derive(Debug, Clone)]
pub struct ClosingPlan {
    pub technique: ClosingTechnique,
    pub statement: String,
    pub follow_up: String,
    /// Plan the technique is parameterized with
    pub recommended_plan: Option<String>,
    /// Page actions that accompany the close
    pub actions: Vec<PlannedAction>,
}

pub struct SalesAnalyzer;

impl SalesAnalyzer {
    /// Score one BANT dimension: keyword hits saturate at three cues
    fn dimension_score(text: &str, cues: &[&str]) -> f32 {
        let hits = cues.iter().filter(|cue| contains_word(text, cue)).count();
        (hits as f32 * 0.34).min(1.0)
    }

    /// BANT over the concatenated user messages
    pub fn bant(user_messages: &[&str]) -> BantScore {
        let text = user_messages.join(" ").to_lowercase();
        let budget = Self::dimension_score(&text, BantCues::BUDGET);
        let authority = Self::dimension_score(&text, BantCues::AUTHORITY);
        let need = Self::dimension_score(&text, BantCues::NEED);
        let timeline = Self::dimension_score(&text, BantCues::TIMELINE);
        let total = (budget + authority + need + timeline) / 4.0;

        let recommendation = if total >= 0.8 {
            BantRecommendation::Close
        } else if total >= 0.6 {
            BantRecommendation::Present
        } else if total >= 0.4 {
            BantRecommendation::Nurture
        } else {
            BantRecommendation::Disqualify
        };

        BantScore {
            budget,
            authority,
            need,
            timeline,
            total,
            is_qualified: total >= 0.6,
            recommendation,
        }
    }

    /// SPIN questions appropriate to the current stage
    pub fn spin_questions(stage: ConversationStage) -> &'static [&'static str] {
        SpinBank::for_stage(stage)
    }

    /// Build the visitor profile from the full history plus behavior
    pub fn build_profile(user_messages: &[&str], behavior: BehaviorSnapshot) -> UserProfile {
        if user_messages.is_empty() {
            return UserProfile::unknown(behavior);
        }
        let text = user_messages.join(" ").to_lowercase();

        let user_type = argmax_table(&text, ProfileCues::USER_TYPES).unwrap_or(UserType::Explorer);
        let company_size =
            argmax_table(&text, ProfileCues::COMPANY_SIZES).unwrap_or(CompanySize::Unknown);
        let industry = argmax_table(&text, ProfileCues::INDUSTRIES).map(|s| s.to_string());
        let urgency = argmax_table(&text, ProfileCues::URGENCY).unwrap_or(Urgency::Unknown);
        let budget = argmax_table(&text, ProfileCues::BUDGET).unwrap_or(BudgetSignal::Unknown);

        let pain_points = sample_sentences(user_messages, ProfileCues::PAIN_POINTS);
        let interests = sample_sentences(user_messages, ProfileCues::INTERESTS);
        let objections = sample_sentences(user_messages, ProfileCues::OBJECTIONS);

        // weighted sum of which attributes are known
        let mut confidence = 0.0;
        if user_type != UserType::Unknown && user_type != UserType::Explorer {
            confidence += 0.3;
        }
        if company_size != CompanySize::Unknown {
            confidence += 0.2;
        }
        if urgency != Urgency::Unknown {
            confidence += 0.2;
        }
        if budget != BudgetSignal::Unknown {
            confidence += 0.15;
        }
        if industry.is_some() {
            confidence += 0.15;
        }

        UserProfile {
            user_type,
            company_size,
            industry,
            urgency,
            budget,
            pain_points,
            interests,
            objections,
            behavior,
            confidence,
        }
    }

    /// Choose the closing technique and parameterize its template with the
    /// recommended plan
    pub fn select_closing(
        profile: &UserProfile,
        bant: &BantScore,
        ctx: &PageContext,
    ) -> ClosingPlan {
        let technique = if bant.total >= 0.8 && profile.objections.is_empty() {
            ClosingTechnique::Direct
        } else if profile.user_type == UserType::Buyer && profile.urgency == Urgency::High {
            ClosingTechnique::Urgency
        } else if profile.user_type == UserType::Skeptic {
            ClosingTechnique::PuppyDog
        } else if profile.objections.len() > 2 {
            ClosingTechnique::Summary
        } else {
            ClosingTechnique::Assumptive
        };

        let recommended_plan = Self::recommend_plan(profile, ctx);
        let plan_name = recommended_plan.clone().unwrap_or_else(|| "our plan".to_string());

        let template = closing_template(technique);
        let statement = template.statement.replace("{plan}", &plan_name);
        let follow_up = template.follow_up.to_string();

        let mut actions = vec![
            PlannedAction::navigate(IntentTarget::Pricing),
            PlannedAction {
                kind: ActionKind::PulseCta,
                target: Some(IntentTarget::Signup),
                entities: Self::signup_cta_name(ctx).into_iter().collect(),
            },
        ];
        if let Some(plan) = &recommended_plan {
            actions.push(PlannedAction {
                kind: ActionKind::Focus,
                target: Some(IntentTarget::Pricing),
                entities: vec![plan.clone()],
            });
        }

        ClosingPlan {
            technique,
            statement,
            follow_up,
            recommended_plan,
            actions,
        }
    }

    /// Enterprise-size visitors get the last plan, startups and low budgets
    /// the first, everyone else the popular (or middle) one
    fn recommend_plan(profile: &UserProfile, ctx: &PageContext) -> Option<String> {
        let plans = &ctx.content.pricing;
        if plans.is_empty() {
            return None;
        }
        let plan = if profile.company_size == CompanySize::Enterprise {
            plans.last()
        } else if profile.company_size == CompanySize::Startup
            || profile.budget == BudgetSignal::Low
        {
            plans.first()
        } else {
            ctx.popular_plan().or_else(|| plans.get(plans.len() / 2))
        };
        plan.map(|p| p.plan.clone())
    }

    fn signup_cta_name(ctx: &PageContext) -> Option<String> {
        ctx.content.ctas.first().map(|c| c.text.clone())
    }
}

fn argmax_table<T: Copy + PartialEq>(text: &str, table: &[(T, &[&str])]) -> Option<T> {
    let mut best: Option<(T, usize)> = None;
    for (value, cues) in table {
        let hits = cues.iter().filter(|cue| contains_word(text, cue)).count();
        if hits > 0 && best.map(|(_, b)| hits > b).unwrap_or(true) {
            best = Some((*value, hits));
        }
    }
    best.map(|(value, _)| value)
}

/// Raw sentences from the messages containing any of the cue words, deduped
fn sample_sentences(messages: &[&str], cues: &[&str]) -> Vec<String> {
    let mut samples: Vec<String> = Vec::new();
    for message in messages {
        for sentence in message.split(['.', '!', '?']) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            if cues.iter().any(|cue| contains_word(sentence, cue))
                && !samples.iter().any(|s| s == sentence)
            {
                samples.push(sentence.to_string());
            }
        }
    }
    samples
}
