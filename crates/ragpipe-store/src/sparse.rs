//! Sparse lexical scoring: lower-cased, stop-word-filtered tokens and an
//! IDF-weighted query-term overlap bounded to [0, 1].

use std::collections::{HashMap, HashSet};

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not",
    "this", "these", "they", "them", "their", "there", "then", "than", "so", "if", "when",
    "where", "why", "how", "what", "which", "who", "whom", "whose", "can", "could", "should",
    "would", "may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Split on non-alphanumerics, lower-case, drop stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Per-query scorer over a fixed snapshot of the corpus. IDF is computed
/// from document frequencies in the snapshot; each chunk scores the
/// IDF-mass of the query terms it contains, normalized by the total IDF
/// mass of the query so the result stays within [0, 1].
pub struct SparseScorer {
    query_idf: HashMap<String, f32>,
    total_idf: f32,
}

impl SparseScorer {
    pub fn new<'a, I>(query_terms: &[String], corpus: I, corpus_len: usize) -> Self
    where
        I: Iterator<Item = &'a [String]>,
    {
        let query: HashSet<&String> = query_terms.iter().collect();
        let mut doc_freq: HashMap<&String, usize> = HashMap::new();
        for terms in corpus {
            let seen: HashSet<&String> = terms.iter().filter(|t| query.contains(*t)).collect();
            for term in seen {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n = corpus_len as f32;
        let mut query_idf = HashMap::new();
        let mut total_idf = 0.0f32;
        for term in query {
            let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
            let idf = ((n + 1.0) / (df + 0.5)).ln().max(0.0);
            total_idf += idf;
            query_idf.insert(term.clone(), idf);
        }
        Self { query_idf, total_idf }
    }

    pub fn score(&self, chunk_terms: &[String]) -> f32 {
        if self.total_idf <= 0.0 {
            return 0.0;
        }
        let present: HashSet<&String> = chunk_terms.iter().collect();
        let matched: f32 = self
            .query_idf
            .iter()
            .filter(|(term, _)| present.contains(term))
            .map(|(_, idf)| idf)
            .sum();
        matched / self.total_idf
    }
}
