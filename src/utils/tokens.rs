//! Token estimation

/// Estimate the token cost of a prompt with a fixed chars-to-tokens factor.
///
/// This is a budget heuristic, not tokenization. Counts Unicode code points
/// rather than bytes so multi-byte content is not over-charged.
pub fn estimate_tokens(text: &str, chars_to_tokens: f64) -> f64 {
    text.chars().count() as f64 * chars_to_tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens("abcd", 0.5), 2.0);
        assert_eq!(estimate_tokens("", 0.5), 0.0);
        // 3 code points, 9 bytes
        assert_eq!(estimate_tokens("日本語", 1.0), 3.0);
    }
}
