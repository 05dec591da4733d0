use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\S+").expect("valid regex");
}

/// Tokens of this many characters or fewer are never indexed or queried.
pub const MIN_TERM_CHARS: usize = 2;

/// Tokenize text into terms: lowercase, split on whitespace runs, drop short tokens.
///
/// Order and duplicates are preserved; callers that need a term set collect it themselves.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|token| token.chars().count() > MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Number of whitespace-separated words, short ones included.
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Length of the text in characters.
pub fn text_length(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("The QUICK brown fox is on it");
        assert_eq!(t, vec!["the", "quick", "brown", "fox"]);
    }

    #[test]
    fn counts_words_before_filtering() {
        assert_eq!(word_count("a bb ccc\n\tdddd  "), 4);
        assert_eq!(word_count("   "), 0);
        assert_eq!(text_length("héllo"), 5);
    }
}
