//! Assistant reply parsing
//!
//! Splits assistant output line by line: any line that is a lone JSON
//! object with a recognized `action` tag is a directive; JSON objects with
//! unknown tags are logged and dropped; malformed JSON falls through as
//! prose. The remaining lines join into the visitor-facing text.

use blitsum_core::Directive;

/// Assistant output split into prose and directives
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub text: String,
    pub directives: Vec<Directive>,
}

/// Parse raw assistant output
pub fn parse_reply(raw: &str) -> ParsedReply {
    let mut prose: Vec<&str> = Vec::new();
    let mut directives = Vec::new();

    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(value) if value.get("action").is_some() => {
                    match serde_json::from_value::<Directive>(value.clone()) {
                        Ok(directive) => {
                            directives.push(directive);
                            continue;
                        }
                        Err(_) => {
                            tracing::warn!(
                                action = %value["action"],
                                "unknown action directive ignored"
                            );
                            continue;
                        }
                    }
                }
                // valid JSON without an action tag, or malformed JSON:
                // treat as prose
                _ => {}
            }
        }
        if !trimmed.is_empty() {
            prose.push(trimmed);
        }
    }

    ParsedReply {
        text: prose.join(" "),
        directives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prose_only() {
        let reply = parse_reply("Our Pro plan covers that.\nWant a look?");
        assert_eq!(reply.text, "Our Pro plan covers that. Want a look?");
        assert!(reply.directives.is_empty());
    }

    #[test]
    fn test_mixed_prose_and_directives() {
        let raw = "Let me show you.\n{\"action\":\"scroll\",\"section\":\"pricing\"}\n{\"action\":\"pulse_cta\",\"element\":\"signup\"}";
        let reply = parse_reply(raw);
        assert_eq!(reply.text, "Let me show you.");
        assert_eq!(reply.directives.len(), 2);
        assert_eq!(
            reply.directives[0],
            Directive::Scroll {
                section: "pricing".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_action_dropped() {
        let raw = "Sure.\n{\"action\":\"teleport\",\"section\":\"mars\"}";
        let reply = parse_reply(raw);
        assert_eq!(reply.text, "Sure.");
        assert!(reply.directives.is_empty());
    }

    #[test]
    fn test_malformed_json_falls_through_as_text() {
        let raw = "{\"action\": \"scroll\", broken";
        let reply = parse_reply(raw);
        assert!(reply.text.contains("broken"));
        assert!(reply.directives.is_empty());
    }

    #[test]
    fn test_json_without_action_is_prose() {
        let raw = "{\"note\":\"hello\"}";
        let reply = parse_reply(raw);
        assert_eq!(reply.text, "{\"note\":\"hello\"}");
        assert!(reply.directives.is_empty());
    }
}
