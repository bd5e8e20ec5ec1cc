//! Conversation stage flow
//!
//! Finite-state machine over the sales stages. Each user utterance is
//! checked against the cue tables in priority order; with no cue, the stage
//! follows the default message-count progression — except that objection
//! and closing are sticky and are only left on an explicit cue.

use blitsum_config::keywords::stage_cues;
use blitsum_core::text::contains_word;
use blitsum_core::{ConversationStage, StageTransition};
use chrono::Utc;
use parking_lot::Mutex;

/// Stage FSM with an audit trail
pub struct ConversationFlow {
    current: Mutex<ConversationStage>,
    history: Mutex<Vec<StageTransition>>,
    user_messages: Mutex<usize>,
}

impl ConversationFlow {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(ConversationStage::Greeting),
            history: Mutex::new(Vec::new()),
            user_messages: Mutex::new(0),
        }
    }

    pub fn current(&self) -> ConversationStage {
        *self.current.lock()
    }

    pub fn stage_history(&self) -> Vec<StageTransition> {
        self.history.lock().clone()
    }

    /// Advance the FSM for one user utterance and return the new stage
    pub fn advance(&self, message: &str) -> ConversationStage {
        let count = {
            let mut count = self.user_messages.lock();
            *count += 1;
            *count
        };
        let from = self.current();

        let (to, reason) = if let Some(cue) = match_cues(message, stage_cues::CLOSING) {
            (ConversationStage::Closing, format!("cue: {cue}"))
        } else if let Some(cue) = match_cues(message, stage_cues::OBJECTION) {
            (ConversationStage::Objection, format!("cue: {cue}"))
        } else if let Some(cue) = match_cues(message, stage_cues::QUALIFICATION) {
            (ConversationStage::Qualification, format!("cue: {cue}"))
        } else if let Some(cue) = match_cues(message, stage_cues::PRESENTATION) {
            (ConversationStage::Presentation, format!("cue: {cue}"))
        } else if let Some(cue) = match_cues(message, stage_cues::DISCOVERY) {
            (ConversationStage::Discovery, format!("cue: {cue}"))
        } else if from.is_sticky() {
            // objection and closing are never left without an explicit cue
            (from, "sticky".to_string())
        } else {
            let default = ConversationStage::default_for_message_count(count.saturating_sub(1));
            // the default progression only moves forward
            if stage_ordinal(default) > stage_ordinal(from) {
                (default, format!("message count {count}"))
            } else {
                (from, "hold".to_string())
            }
        };

        if to != from {
            tracing::debug!(from = %from, to = %to, reason, "conversation stage transition");
            self.history.lock().push(StageTransition {
                from,
                to,
                reason,
                at: Utc::now(),
            });
            *self.current.lock() = to;
        }
        to
    }

    /// Mark the conversation finished
    pub fn complete(&self) {
        let from = self.current();
        if from != ConversationStage::Completed {
            self.history.lock().push(StageTransition {
                from,
                to: ConversationStage::Completed,
                reason: "completed".to_string(),
                at: Utc::now(),
            });
            *self.current.lock() = ConversationStage::Completed;
        }
    }

    pub fn reset(&self) {
        *self.current.lock() = ConversationStage::Greeting;
        self.history.lock().clear();
        *self.user_messages.lock() = 0;
    }

    /// Stage-specific prompt fragment: objectives, tactics and an example
    pub fn prompt_fragment(stage: ConversationStage) -> &'static str {
        match stage {
            ConversationStage::Greeting => {
                "Objective: make the visitor feel welcome and invite their goal. \
                 Tactics: one short friendly opener, then an open question. \
                 Example: \"Hi! Looking for anything in particular today?\""
            }
            ConversationStage::Discovery => {
                "Objective: understand what the visitor is trying to solve. \
                 Tactics: open questions about their situation; reflect what you hear. \
                 Example: \"What does your team use for this today?\""
            }
            ConversationStage::Qualification => {
                "Objective: learn budget, authority, need and timeline without \
                 interrogating. Tactics: tie questions to what they already said. \
                 Example: \"Is this something you'd want in place this month?\""
            }
            ConversationStage::Presentation => {
                "Objective: connect page features and plans to their stated needs. \
                 Tactics: reference ground truth only; show, don't list. \
                 Example: \"Given your team size, Pro covers that — want me to show you?\""
            }
            ConversationStage::Objection => {
                "Objective: address the concern honestly and keep trust. \
                 Tactics: acknowledge, reframe, offer evidence from the page. \
                 Example: \"Fair concern — the Starter tier covers that without the cost.\""
            }
            ConversationStage::Closing => {
                "Objective: make the next step easy and concrete. \
                 Tactics: one clear call to action; no new information. \
                 Example: \"Ready? I can take you straight to signup.\""
            }
            ConversationStage::Completed => {
                "Objective: wrap up warmly. Tactics: thank them, stay available. \
                 Example: \"Great talking with you — I'm here if anything comes up.\""
            }
        }
    }
}

impl Default for ConversationFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn match_cues<'a>(message: &str, cues: &[&'a str]) -> Option<&'a str> {
    cues.iter().find(|cue| contains_word(message, cue)).copied()
}

fn stage_ordinal(stage: ConversationStage) -> u8 {
    match stage {
        ConversationStage::Greeting => 0,
        ConversationStage::Discovery => 1,
        ConversationStage::Qualification => 2,
        ConversationStage::Presentation => 3,
        ConversationStage::Objection => 4,
        ConversationStage::Closing => 5,
        ConversationStage::Completed => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_cue_wins() {
        let flow = ConversationFlow::new();
        assert_eq!(flow.advance("I'm ready to buy"), ConversationStage::Closing);
    }

    #[test]
    fn test_objection_cue() {
        let flow = ConversationFlow::new();
        assert_eq!(
            flow.advance("looks nice but it's expensive"),
            ConversationStage::Objection
        );
    }

    #[test]
    fn test_qualification_cue() {
        let flow = ConversationFlow::new();
        assert_eq!(
            flow.advance("how much does it cost"),
            ConversationStage::Qualification
        );
    }

    #[test]
    fn test_default_progression() {
        let flow = ConversationFlow::new();
        assert_eq!(flow.advance("hi there"), ConversationStage::Greeting);
        assert_eq!(flow.advance("hello again"), ConversationStage::Discovery);
        assert_eq!(flow.advance("ok sure"), ConversationStage::Qualification);
        assert_eq!(flow.advance("alright"), ConversationStage::Presentation);
    }

    #[test]
    fn test_objection_is_sticky() {
        let flow = ConversationFlow::new();
        flow.advance("that seems expensive");
        assert_eq!(flow.current(), ConversationStage::Objection);
        // a cue-free message does not leave objection
        flow.advance("hmm okay");
        assert_eq!(flow.current(), ConversationStage::Objection);
        // an explicit closing cue does
        flow.advance("alright, sign up time");
        assert_eq!(flow.current(), ConversationStage::Closing);
    }

    #[test]
    fn test_closing_is_sticky() {
        let flow = ConversationFlow::new();
        flow.advance("let me buy this");
        flow.advance("ok");
        assert_eq!(flow.current(), ConversationStage::Closing);
    }

    #[test]
    fn test_history_audit_trail() {
        let flow = ConversationFlow::new();
        flow.advance("hello");
        flow.advance("what can it do");
        let history = flow.stage_history();
        assert!(!history.is_empty());
        assert!(history.iter().all(|t| t.from != t.to));
    }

    #[test]
    fn test_reset() {
        let flow = ConversationFlow::new();
        flow.advance("buy now");
        flow.reset();
        assert_eq!(flow.current(), ConversationStage::Greeting);
        assert!(flow.stage_history().is_empty());
    }
}
