use crate::Position;
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*|\p{N}+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he",
        "her", "his", "i", "if", "in", "into", "is", "it", "its", "me", "my", "no", "not", "of", "on",
        "or", "our", "she", "so", "such", "than", "that", "the", "their", "them", "then", "there",
        "these", "they", "this", "those", "to", "too", "was", "we", "were", "what", "when", "where",
        "which", "while", "who", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect();
}

/// Reference normalizer that turns raw text into `(term, position)` pairs.
///
/// Positions count emitted tokens, so two content words separated only by
/// removed stopwords stay adjacent for phrase queries.
#[derive(Debug, Clone, Copy)]
pub struct Tokenizer {
    pub stem: bool,
    pub remove_stopwords: bool,
}

impl Default for Tokenizer {
    fn default() -> Self { Self { stem: true, remove_stopwords: false } }
}

impl Tokenizer {
    pub fn tokenize(&self, text: &str) -> Vec<(String, Position)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        WORD.find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|w| !(self.remove_stopwords && STOPWORDS.contains(w)))
            .map(|w| if self.stem { STEMMER.stem(w).into_owned() } else { w.to_string() })
            .zip(0..)
            .collect()
    }

    /// Terms only, for building queries.
    pub fn terms(&self, text: &str) -> Vec<String> { self.tokenize(text).into_iter().map(|(t, _)| t).collect() }
}
