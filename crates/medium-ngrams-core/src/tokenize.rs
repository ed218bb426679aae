//! Word tokenization for medium descriptions.
//!
//! Splits on Unicode word boundaries (UAX #29) rather than whitespace, so
//! punctuation glued to a word ("canvas.", "(oil)") is dropped. Optional
//! stemming uses the English Snowball stemmer.

use std::sync::LazyLock;

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

/// Tokenizer settings shared by every document in a corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tokenizer {
    /// Reduce each token to its stem ("prints" → "print").
    pub stem: bool,
}

impl Tokenizer {
    /// Create a tokenizer, optionally stemming.
    pub const fn new(stem: bool) -> Self {
        Self { stem }
    }

    /// Split `text` into lowercase word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        tokenize(text, self.stem)
    }
}

/// Split `text` into lowercase word tokens, stemming them when `stem` is set.
pub fn tokenize(text: &str, stem: bool) -> Vec<String> {
    let words = text.unicode_words().map(str::to_lowercase);
    if stem {
        words.map(|w| STEMMER.stem(&w).into_owned()).collect()
    } else {
        words.collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(tokenize("", false).is_empty());
        assert!(tokenize("   \t\n", true).is_empty());
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(
            tokenize("Oil on Canvas.", false),
            vec!["oil", "on", "canvas"]
        );
    }

    #[test]
    fn handles_brackets_and_commas() {
        assert_eq!(
            tokenize("Gelatin silver print (mounted), ink", false),
            vec!["gelatin", "silver", "print", "mounted", "ink"]
        );
    }

    #[test]
    fn keeps_numbers_as_words() {
        assert_eq!(tokenize("2 prints, 1.5 cm", false), vec!["2", "prints", "1.5", "cm"]);
    }

    #[test]
    fn stems_when_enabled() {
        assert_eq!(tokenize("prints", true), vec!["print"]);
        assert_eq!(
            Tokenizer::new(true).tokenize("Etchings and engravings"),
            vec!["etch", "and", "engrav"]
        );
    }

    #[test]
    fn no_stemming_by_default() {
        assert_eq!(Tokenizer::default().tokenize("prints"), vec!["prints"]);
    }
}
