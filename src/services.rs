//! Seams to the linguistic collaborators the engine consumes: a
//! part-of-speech tagger, a base polarity scorer and a keyword ranker.
//!
//! Each is a trait so a real NLP backend can be plugged in; the built-in
//! implementations here are small lexicon/statistics models that keep the
//! binary usable without one.

use std::collections::{HashMap, HashSet};

use poem_types::Keyword;

use crate::error::Result;

/// Part-of-speech tag for place names.
pub const LOCATION_TAG: &str = "ns";
/// Tag for anything the built-in tagger does not recognize.
pub const OTHER_TAG: &str = "x";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub word: String,
    pub tag: String,
}

pub trait LocationTagger: Send + Sync {
    /// Segment `text` and tag every token.
    fn tag(&self, text: &str) -> Result<Vec<Token>>;
}

pub trait PolarityScorer: Send + Sync {
    /// Base polarity in [0, 1]; 0.5 is neutral.
    fn score(&self, text: &str) -> Result<f64>;
}

pub trait KeywordRanker: Send + Sync {
    /// Up to `top_k` keywords, highest weight first.
    fn rank(&self, text: &str, top_k: usize) -> Result<Vec<Keyword>>;
}

pub(crate) fn is_han(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

// ── Lexicon tagger ───────────────────────────────────────────────────────

/// Forward-maximum-matching segmenter over a place lexicon. Lexicon words
/// are tagged `ns`, every other character becomes its own `x` token.
pub struct LexiconTagger {
    words: HashSet<String>,
    max_len: usize,
}

impl LexiconTagger {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: HashSet<String> = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.is_empty())
            .collect();
        let max_len = words.iter().map(|w| w.chars().count()).max().unwrap_or(0);
        LexiconTagger { words, max_len }
    }
}

impl LocationTagger for LexiconTagger {
    fn tag(&self, text: &str) -> Result<Vec<Token>> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let longest = self.max_len.min(chars.len() - i);
            let hit = (1..=longest).rev().find_map(|len| {
                let word: String = chars[i..i + len].iter().collect();
                self.words.contains(&word).then_some((word, len))
            });
            match hit {
                Some((word, len)) => {
                    tokens.push(Token {
                        word,
                        tag: LOCATION_TAG.to_string(),
                    });
                    i += len;
                }
                None => {
                    tokens.push(Token {
                        word: chars[i].to_string(),
                        tag: OTHER_TAG.to_string(),
                    });
                    i += 1;
                }
            }
        }
        Ok(tokens)
    }
}

// ── Lexicon polarity ─────────────────────────────────────────────────────

const POSITIVE_CUES: &[char] = &[
    '喜', '乐', '欢', '笑', '春', '暖', '明', '美', '好', '佳', '胜', '荣', '福', '安', '和', '晴',
    '香', '新', '壮', '歌',
];

const NEGATIVE_CUES: &[char] = &[
    '愁', '悲', '哀', '泪', '苦', '恨', '孤', '寂', '寒', '残', '病', '死', '别', '老', '怨', '叹',
    '伤', '衰', '断', '泣',
];

/// Counts positive and negative cue characters:
/// `0.5 + 0.5 * (pos - neg) / (pos + neg + 1)`.
#[derive(Debug, Default)]
pub struct LexiconPolarity;

impl PolarityScorer for LexiconPolarity {
    fn score(&self, text: &str) -> Result<f64> {
        let pos = text.chars().filter(|c| POSITIVE_CUES.contains(c)).count() as f64;
        let neg = text.chars().filter(|c| NEGATIVE_CUES.contains(c)).count() as f64;
        let score = 0.5 + 0.5 * (pos - neg) / (pos + neg + 1.0);
        Ok(score.clamp(0.0, 1.0))
    }
}

// ── TF-IDF keyword ranker ────────────────────────────────────────────────

/// Keyword ranker over Han-character bigrams, with document frequencies
/// fitted once on the whole corpus.
#[derive(Debug, Default)]
pub struct TfIdfRanker {
    doc_freq: HashMap<String, usize>,
    n_docs: usize,
}

fn bigrams(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(2)
        .filter(|w| is_han(w[0]) && is_han(w[1]))
        .map(|w| w.iter().collect())
        .collect()
}

impl TfIdfRanker {
    pub fn fit<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut n_docs = 0;
        for doc in docs {
            n_docs += 1;
            let unique: HashSet<String> = bigrams(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }
        TfIdfRanker { doc_freq, n_docs }
    }

    fn idf(&self, term: &str) -> f64 {
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f64;
        (self.n_docs.max(1) as f64 / (1.0 + df)).ln() + 1.0
    }
}

impl KeywordRanker for TfIdfRanker {
    fn rank(&self, text: &str, top_k: usize) -> Result<Vec<Keyword>> {
        let terms = bigrams(text);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let total = terms.len() as f64;
        let mut tf: HashMap<String, usize> = HashMap::new();
        for t in terms {
            *tf.entry(t).or_insert(0) += 1;
        }
        let mut ranked: Vec<Keyword> = tf
            .into_iter()
            .map(|(word, count)| Keyword {
                weight: count as f64 / total * self.idf(&word),
                word,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.weight
                .total_cmp(&a.weight)
                .then_with(|| a.word.cmp(&b.word))
        });
        ranked.truncate(top_k);
        Ok(ranked)
    }
}
