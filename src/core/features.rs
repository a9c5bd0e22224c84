//! TF-IDF feature space.
//!
//! [`TfidfVectorizer::fit`] builds a frozen [`FeatureSpace`] from training
//! texts only; [`FeatureSpace::transform`] never grows the vocabulary, and
//! terms unseen at fit time are dropped silently.
//!
//! Weighting follows the usual smoothed scheme:
//! `tf(t, d) * (ln((1 + n) / (1 + df(t))) + 1)`, then L2 row normalization.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::Xxh64;

use crate::core::error::{Result, SiftError};
use crate::core::normalize::{normalize, tokens};

/// German function words removed before counting.
pub const GERMAN_STOP_WORDS: &[&str] = &[
    "aber", "alle", "allem", "allen", "aller", "alles", "als", "also", "am", "an", "ander", "andere",
    "anderem", "anderen", "anderer", "anderes", "auch", "auf", "aus", "bei", "bin", "bis", "bist",
    "da", "damit", "dann", "das", "dass", "dasselbe", "dazu", "dein", "deine", "dem", "den",
    "denn", "der", "des", "desselben", "dessen", "dich", "die", "dies", "diese", "dieselbe",
    "diesem", "diesen", "dieser", "dieses", "dir", "doch", "dort", "du", "durch", "ein", "eine",
    "einem", "einen", "einer", "eines", "einig", "einige", "er", "es", "etwas", "euch", "euer",
    "für", "gegen", "gewesen", "hab", "habe", "haben", "hat", "hatte", "hatten", "hier", "hin",
    "hinter", "ich", "ihm", "ihn", "ihnen", "ihr", "ihre", "ihrem", "ihren", "ihrer", "im", "in",
    "indem", "ins", "ist", "jede", "jedem", "jeden", "jeder", "jedes", "jene", "jetzt", "kann",
    "kein", "keine", "können", "man", "manche", "mein", "meine", "mich", "mir", "mit", "muss",
    "musste", "nach", "nicht", "nichts", "noch", "nun", "nur", "ob", "oder", "ohne", "sehr",
    "sein", "seine", "seinem", "seinen", "seiner", "selbst", "sich", "sie", "sind", "so",
    "solche", "soll", "sollte", "sondern", "sonst", "über", "um", "und", "uns", "unser", "unter",
    "viel", "vom", "von", "vor", "während", "war", "waren", "warst", "was", "weg", "weil",
    "weiter", "welche", "wenn", "werde", "werden", "wie", "wieder", "will", "wir", "wird",
    "wirst", "wo", "wollen", "wollte", "würde", "würden", "zu", "zum", "zur", "zwar", "zwischen",
];

/// Sparse row vector: strictly increasing feature indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector
{
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector
{
    /// Weight at `index`, zero when absent
    pub fn get(
        &self,
        index: usize,
    ) -> f64
    {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map_or(0.0, |pos| self.entries[pos].1)
    }

    pub fn nnz(&self) -> usize
    {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries.is_empty()
    }

    pub fn dot(
        &self,
        dense: &[f64],
    ) -> f64
    {
        self.entries
            .iter()
            .map(|&(i, v)| v * dense[i])
            .sum()
    }

    pub fn norm_sq(&self) -> f64
    {
        self.entries
            .iter()
            .map(|&(_, v)| v * v)
            .sum()
    }
}

/// Rows of sparse vectors over a fixed dimension, tagged with the identity
/// of the feature space that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix
{
    pub rows: Vec<SparseVector>,
    pub dim: usize,
    pub space_id: String,
}

impl FeatureMatrix
{
    pub fn len(&self) -> usize
    {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.rows.is_empty()
    }
}

/// Vectorizer settings. These become part of the feature-space identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerParams
{
    /// Keep only the top-N terms by total corpus frequency
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_features: Option<usize>,
    /// Minimum document frequency (absolute)
    pub min_df: usize,
    /// Maximum document frequency (fraction of documents)
    pub max_df: f64,
    /// Tokens shorter than this are ignored
    pub min_token_chars: usize,
    /// Stop words on top of the builtin German list
    pub extra_stop_words: Vec<String>,
}

impl Default for VectorizerParams
{
    fn default() -> Self
    {
        Self {
            max_features: None,
            min_df: 1,
            max_df: 1.0,
            min_token_chars: 2,
            extra_stop_words: Vec::new(),
        }
    }
}

impl VectorizerParams
{
    /// Reject bounds that would silently empty or distort the vocabulary.
    pub fn validate(&self) -> Result<()>
    {
        if !(self.max_df > 0.0 && self.max_df <= 1.0)
        {
            return Err(SiftError::InvalidParameter {
                name: "max_df".into(),
                reason: format!("{} is outside (0, 1]", self.max_df),
            });
        }
        if self.min_df == 0
        {
            return Err(SiftError::InvalidParameter {
                name: "min_df".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.max_features == Some(0)
        {
            return Err(SiftError::InvalidParameter {
                name: "max_features".into(),
                reason: "must be at least 1 when set".into(),
            });
        }
        Ok(())
    }
}

/// Builds feature spaces.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer
{
    params: VectorizerParams,
}

impl TfidfVectorizer
{
    pub fn new(params: VectorizerParams) -> Self
    {
        Self { params }
    }

    /// Learn vocabulary and document frequencies from training texts.
    pub fn fit<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> FeatureSpace
    {
        let analyzer = Analyzer::new(&self.params);
        let n_documents = texts.len();

        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        let mut corpus_freq: HashMap<String, usize> = HashMap::new();

        for text in texts
        {
            let toks = analyzer.analyze(text.as_ref());
            let mut unique: HashSet<&str> = HashSet::new();

            for t in &toks
            {
                *corpus_freq
                    .entry(t.clone())
                    .or_insert(0) += 1;
                if unique.insert(t.as_str())
                {
                    *doc_freq
                        .entry(t.clone())
                        .or_insert(0) += 1;
                }
            }
        }

        // Document-frequency bounds
        let max_count = (self.params.max_df * n_documents as f64).floor() as usize;
        let mut kept: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, df)| *df >= self.params.min_df && *df <= max_count.max(1))
            .collect();

        // Vocabulary cap by corpus frequency, ties broken lexicographically
        if let Some(cap) = self.params.max_features
            && kept.len() > cap
        {
            kept.sort_by(|(a, _), (b, _)| {
                corpus_freq[b]
                    .cmp(&corpus_freq[a])
                    .then_with(|| a.cmp(b))
            });
            kept.truncate(cap);
            kept.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        FeatureSpace::from_parts(self.params.clone(), n_documents, kept.into_iter().collect())
    }
}

/// Tokenization shared by fit and transform.
#[derive(Debug, Clone)]
struct Analyzer
{
    stop: HashSet<String>,
    min_chars: usize,
}

impl Analyzer
{
    fn new(params: &VectorizerParams) -> Self
    {
        let stop = GERMAN_STOP_WORDS
            .iter()
            .map(|s| s.to_string())
            .chain(
                params
                    .extra_stop_words
                    .iter()
                    .map(|s| normalize(s)),
            )
            .collect();

        Self { stop, min_chars: params.min_token_chars }
    }

    fn analyze(
        &self,
        text: &str,
    ) -> Vec<String>
    {
        tokens(text)
            .into_iter()
            .filter(|t| {
                t.chars()
                    .count()
                    >= self.min_chars
                    && !self
                        .stop
                        .contains(t)
            })
            .collect()
    }
}

/// Frozen vocabulary plus IDF table.
///
/// Persisted as integer document frequencies; IDF is recomputed on load so
/// the identity fingerprint is exact across save/load.
#[derive(Debug, Clone)]
pub struct FeatureSpace
{
    params: VectorizerParams,
    n_documents: usize,
    /// term -> document frequency; position is the feature index
    vocabulary: IndexMap<String, usize>,
    idf: Vec<f64>,
    identity: String,
    analyzer: Analyzer,
}

impl PartialEq for FeatureSpace
{
    fn eq(
        &self,
        other: &Self,
    ) -> bool
    {
        self.identity == other.identity
    }
}

impl FeatureSpace
{
    /// Rebuild from persisted parts. `vocabulary` must be in feature order.
    pub fn from_parts(
        params: VectorizerParams,
        n_documents: usize,
        vocabulary: IndexMap<String, usize>,
    ) -> Self
    {
        let n = n_documents as f64;
        let idf = vocabulary
            .values()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();
        let identity = fingerprint(&params, n_documents, &vocabulary);
        let analyzer = Analyzer::new(&params);

        Self { params, n_documents, vocabulary, idf, identity, analyzer }
    }

    /// Stable identity tag, e.g. `fs-3f2a...`
    pub fn identity(&self) -> &str
    {
        &self.identity
    }

    pub fn dim(&self) -> usize
    {
        self.vocabulary.len()
    }

    pub fn n_documents(&self) -> usize
    {
        self.n_documents
    }

    pub fn params(&self) -> &VectorizerParams
    {
        &self.params
    }

    /// Terms with their document frequencies, in feature order
    pub fn vocabulary(&self) -> &IndexMap<String, usize>
    {
        &self.vocabulary
    }

    pub fn index_of(
        &self,
        term: &str,
    ) -> Option<usize>
    {
        self.vocabulary
            .get_index_of(term)
    }

    pub fn term(
        &self,
        index: usize,
    ) -> Option<&str>
    {
        self.vocabulary
            .get_index(index)
            .map(|(t, _)| t.as_str())
    }

    pub fn idf(&self) -> &[f64]
    {
        &self.idf
    }

    /// TF-IDF vector for one text. Unknown terms contribute nothing.
    pub fn vectorize(
        &self,
        text: &str,
    ) -> SparseVector
    {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for tok in self
            .analyzer
            .analyze(text)
        {
            if let Some(idx) = self.index_of(&tok)
            {
                *counts
                    .entry(idx)
                    .or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(i, tf)| (i, tf * self.idf[i]))
            .collect();

        let norm = entries
            .iter()
            .map(|(_, v)| v * v)
            .sum::<f64>()
            .sqrt();
        if norm > 0.0
        {
            for (_, v) in &mut entries
            {
                *v /= norm;
            }
        }

        SparseVector { entries }
    }

    /// Vectorize many texts against this frozen space.
    pub fn transform<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> FeatureMatrix
    {
        FeatureMatrix {
            rows: texts
                .iter()
                .map(|t| self.vectorize(t.as_ref()))
                .collect(),
            dim: self.dim(),
            space_id: self
                .identity
                .clone(),
        }
    }

    /// Highest-weighted terms of a vector, descending, ties by term.
    pub fn top_terms(
        &self,
        vector: &SparseVector,
        n: usize,
    ) -> Vec<(String, f64)>
    {
        let mut scored: Vec<(String, f64)> = vector
            .entries
            .iter()
            .filter_map(|&(i, w)| {
                self.term(i)
                    .map(|t| (t.to_string(), w))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);
        scored
    }
}

fn fingerprint(
    params: &VectorizerParams,
    n_documents: usize,
    vocabulary: &IndexMap<String, usize>,
) -> String
{
    let mut h = Xxh64::new(0);

    h.update(&(n_documents as u64).to_le_bytes());
    h.update(&(params.min_token_chars as u64).to_le_bytes());
    for w in &params.extra_stop_words
    {
        h.update(w.as_bytes());
        h.update(&[0xff]);
    }
    for (term, df) in vocabulary
    {
        h.update(term.as_bytes());
        h.update(&[0]);
        h.update(&(*df as u64).to_le_bytes());
    }

    format!("fs-{:016x}", h.digest())
}
