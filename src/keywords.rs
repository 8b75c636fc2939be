//! Weighted keyword extraction.
//!
//! Pure, I/O-free helpers for turning a query or document into a ranked
//! keyword set. Each input source carries a weight; a term's final weight
//! is its frequency within a source times that source's weight, summed
//! across sources. Used to bias lexical retrieval toward title/query terms
//! over body terms.

use std::collections::HashMap;

/// One weighted text source, e.g. a query at weight 2.0 and a document
/// body at weight 1.0.
#[derive(Debug, Clone, Copy)]
pub struct WeightedSource<'a> {
    pub text: &'a str,
    pub weight: f64,
}

impl<'a> WeightedSource<'a> {
    pub fn new(text: &'a str, weight: f64) -> Self {
        Self { text, weight }
    }
}

/// A ranked keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub term: String,
    pub weight: f64,
}

// Minimal function-word list; domain terms are never this short on
// signal, so a heavier stemmer is not worth carrying.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "how",
    "in", "is", "it", "its", "of", "on", "or", "that", "the", "their", "this", "to", "was",
    "what", "when", "where", "which", "who", "why", "will", "with",
];

/// Lowercase and split on non-alphanumerics, keeping `+` and `#` so terms
/// like "c++" and "c#" survive. Tokens shorter than 2 chars are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|token| token.len() >= 2)
        .map(str::to_string)
        .collect()
}

/// Extract the top `limit` keywords across weighted sources.
///
/// Weights accumulate as `count_in_source * source_weight`, summed over
/// sources. Output is sorted by weight descending, term ascending on ties,
/// stop words removed. Sources with non-positive weight contribute
/// nothing.
pub fn extract_keywords(sources: &[WeightedSource<'_>], limit: usize) -> Vec<Keyword> {
    let mut weights: HashMap<String, f64> = HashMap::new();

    for source in sources {
        if source.weight <= 0.0 {
            continue;
        }
        for token in tokenize(source.text) {
            if STOP_WORDS.contains(&token.as_str()) {
                continue;
            }
            *weights.entry(token).or_insert(0.0) += source.weight;
        }
    }

    let mut keywords: Vec<Keyword> = weights
        .into_iter()
        .map(|(term, weight)| Keyword { term, weight })
        .collect();

    keywords.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.term.cmp(&b.term))
    });
    keywords.truncate(limit);
    keywords
}

/// Convenience wrapper for a single unweighted text.
pub fn query_keywords(query: &str, limit: usize) -> Vec<Keyword> {
    extract_keywords(&[WeightedSource::new(query, 1.0)], limit)
}
