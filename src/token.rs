use std::sync::Arc;

const SIMPLE_CHARS_PER_TOKEN: usize = 4;
const TECHNICAL_CHARS_PER_TOKEN: f64 = 3.2;

/// Type of tokenizer to use for estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenizerKind {
    /// Simple character-based tokenizer (~4 chars per token)
    Simple,
    /// Tuned for documentation mixing prose and code (~3.2 chars per token)
    #[default]
    Technical,
}

impl TokenizerKind {
    /// Creates a new tokenizer instance of this kind.
    #[must_use]
    pub fn create(self) -> Arc<dyn TokenEstimator> {
        match self {
            Self::Simple => Arc::new(SimpleTokenizer),
            Self::Technical => Arc::new(TechnicalTokenizer),
        }
    }
}

/// Trait for estimating token counts in text.
pub trait TokenEstimator: Send + Sync {
    /// Estimates the number of tokens in the given text.
    fn estimate(&self, text: &str) -> usize;
}

/// Simple character-based tokenizer.
///
/// Uses a heuristic of approximately 4 characters per token,
/// which works reasonably well for English prose.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimpleTokenizer;

impl TokenEstimator for SimpleTokenizer {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        let char_count = text.chars().count();
        char_count
            .saturating_add(SIMPLE_CHARS_PER_TOKEN - 1)
            .saturating_div(SIMPLE_CHARS_PER_TOKEN)
            .max(1)
    }
}

/// Tokenizer for technical documentation.
///
/// Collapses whitespace runs to a single space, then assumes ~3.2
/// characters per token, closer to what code-heavy markdown produces.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TechnicalTokenizer;

impl TokenEstimator for TechnicalTokenizer {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn estimate(&self, text: &str) -> usize {
        let normalized = collapsed_len(text);
        (normalized as f64 / TECHNICAL_CHARS_PER_TOKEN) as usize
    }
}

/// Character length of `text` trimmed, with whitespace runs counted as one.
fn collapsed_len(text: &str) -> usize {
    text.split_whitespace()
        .map(|word| word.chars().count())
        .sum::<usize>()
        + text.split_whitespace().count().saturating_sub(1)
}

/// Counts words in text (whitespace-separated).
#[inline]
pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_tokenizer_empty() {
        assert_eq!(SimpleTokenizer.estimate(""), 0);
    }

    #[test]
    fn test_simple_tokenizer_rounds_up() {
        assert_eq!(SimpleTokenizer.estimate("a"), 1);
        assert_eq!(SimpleTokenizer.estimate("abcd"), 1);
        assert_eq!(SimpleTokenizer.estimate("abcde"), 2);
    }

    #[test]
    fn test_simple_tokenizer_large_input() {
        let huge_text = "a".repeat(1_000_000);
        assert_eq!(SimpleTokenizer.estimate(&huge_text), 250_000);
    }

    #[test]
    fn test_technical_tokenizer_collapses_whitespace() {
        // "aaaa bbbb" is 9 chars after collapsing; 9 / 3.2 = 2.8
        assert_eq!(TechnicalTokenizer.estimate("  aaaa \n\n\t bbbb  "), 2);
        assert_eq!(
            TechnicalTokenizer.estimate("aaaa bbbb"),
            TechnicalTokenizer.estimate("aaaa     bbbb")
        );
    }

    #[test]
    fn test_technical_tokenizer_empty_and_blank() {
        assert_eq!(TechnicalTokenizer.estimate(""), 0);
        assert_eq!(TechnicalTokenizer.estimate("   \n\t"), 0);
    }

    #[test]
    fn test_technical_tokenizer_scale() {
        let text = "x".repeat(32_000);
        assert_eq!(TechnicalTokenizer.estimate(&text), 10_000);
    }

    #[test]
    fn test_kind_create() {
        let simple = TokenizerKind::Simple.create();
        let technical = TokenizerKind::Technical.create();
        let text = "x".repeat(320);

        assert_eq!(simple.estimate(&text), 80);
        assert_eq!(technical.estimate(&text), 100);
        assert_eq!(TokenizerKind::default(), TokenizerKind::Technical);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("hello"), 1);
        assert_eq!(count_words("  hello   world  "), 2);
    }
}
