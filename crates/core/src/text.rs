//! Small text utilities shared by the extractor and the agent

use unicode_segmentation::UnicodeSegmentation;

/// Collapse runs of whitespace into single spaces and trim
pub fn clean_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` grapheme clusters, appending an ellipsis when cut
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    let mut out: String = graphemes[..max.saturating_sub(1)].concat();
    out.push('…');
    out
}

/// Lowercased words of a string, split on non-alphanumeric boundaries
pub fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// Whole-word containment check: `needle` appears in `haystack` bounded by
/// non-alphanumeric characters. Multi-word needles match by substring, which
/// is the documented behavior for phrase cues.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.to_lowercase();
    let needle = needle.to_lowercase();
    if needle.contains(' ') {
        return haystack.contains(&needle);
    }
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(&needle) {
        let abs = start + pos;
        let before_ok = abs == 0 || !(bytes[abs - 1] as char).is_alphanumeric();
        let end = abs + needle.len();
        let after_ok = end >= bytes.len() || !(bytes[end] as char).is_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        start = abs + 1;
    }
    false
}

/// Count how many entries of `words` appear as whole words in `text`
pub fn count_word_matches(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| contains_word(text, w)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(clean_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_truncate_graphemes() {
        assert_eq!(truncate_graphemes("short", 10), "short");
        let cut = truncate_graphemes("a".repeat(30).as_str(), 10);
        assert!(cut.ends_with('…'));
        assert_eq!(cut.graphemes(true).count(), 10);
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("show me the pro plan", "pro"));
        assert!(!contains_word("improve the product", "pro"));
        // phrases match by substring
        assert!(contains_word("how much does it cost", "how much"));
    }

    #[test]
    fn test_tokens() {
        assert_eq!(tokens("Compare Starter and Pro!"), vec!["compare", "starter", "and", "pro"]);
    }
}
