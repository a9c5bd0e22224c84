//! Keyword rule engine.
//!
//! Terms are literal, case-insensitive substrings: `Schwarz` matches inside
//! `Schwarzenegger`, which is why the exclusion set exists. Each set is
//! compiled once into an Aho-Corasick automaton over folded terms, so
//! regex metacharacters in terms carry no meaning.

use aho_corasick::{AhoCorasick, MatchKind};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::article::Article;
use crate::core::error::{Result, SiftError};
use crate::core::normalize::fold;

/// How topic and qualifier sets combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode
{
    /// Either set hitting headline or body is sufficient; exclusion runs as
    /// its own stage over headline and body.
    #[default]
    Permissive,
    /// Both sets must hit the body and the exclusion set must not.
    Strict,
}

impl std::fmt::Display for MatchMode
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        match self
        {
            MatchMode::Permissive => write!(f, "permissive"),
            MatchMode::Strict => write!(f, "strict"),
        }
    }
}

/// Named, ordered list of distinct literal terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet
{
    name: String,
    terms: Vec<String>,
}

impl KeywordSet
{
    /// Validate and fold terms. Empty terms and duplicates (after folding)
    /// are rejected.
    pub fn new<I, S>(
        name: impl Into<String>,
        terms: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mut seen = IndexSet::new();

        for (i, raw) in terms
            .into_iter()
            .enumerate()
        {
            let folded = fold(raw.as_ref());
            if folded.is_empty()
            {
                return Err(SiftError::InvalidKeywordSet {
                    set: name,
                    reason: format!("term #{} is empty", i + 1),
                });
            }
            if !seen.insert(folded)
            {
                return Err(SiftError::InvalidKeywordSet {
                    set: name,
                    reason: format!("duplicate term `{}`", raw.as_ref().trim()),
                });
            }
        }

        Ok(Self { name, terms: seen.into_iter().collect() })
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Folded terms in their original order
    pub fn terms(&self) -> &[String]
    {
        &self.terms
    }

    pub fn len(&self) -> usize
    {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.terms.is_empty()
    }

    /// Copy with one more term; fails on duplicates like [`KeywordSet::new`].
    pub fn with_term(
        &self,
        term: &str,
    ) -> Result<Self>
    {
        Self::new(
            self.name.clone(),
            self.terms
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(term)),
        )
    }
}

/// Compiled matcher for one [`KeywordSet`].
#[derive(Debug, Clone)]
pub struct KeywordMatcher
{
    set: KeywordSet,
    automaton: AhoCorasick,
}

impl KeywordMatcher
{
    pub fn new(set: KeywordSet) -> Result<Self>
    {
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::Standard)
            .build(set.terms())
            .map_err(|e| SiftError::InvalidKeywordSet {
                set: set
                    .name()
                    .to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { set, automaton })
    }

    pub fn set(&self) -> &KeywordSet
    {
        &self.set
    }

    /// True if any term occurs in `text`. Empty text never matches.
    pub fn is_match(
        &self,
        text: &str,
    ) -> bool
    {
        if text
            .trim()
            .is_empty()
        {
            return false;
        }
        self.automaton
            .is_match(&fold(text))
    }

    /// Distinct terms found in `text`, in set order.
    pub fn hits(
        &self,
        text: &str,
    ) -> Vec<&str>
    {
        if text
            .trim()
            .is_empty()
        {
            return Vec::new();
        }

        let folded = fold(text);
        let mut found = vec![false; self.set.len()];

        // Overlapping search so nested terms ("afrika" in "südafrika") all count
        for m in self
            .automaton
            .find_overlapping_iter(&folded)
        {
            found[m
                .pattern()
                .as_usize()] = true;
        }

        self.set
            .terms()
            .iter()
            .zip(found)
            .filter_map(|(t, hit)| hit.then_some(t.as_str()))
            .collect()
    }

    fn hits_article(
        &self,
        article: &Article,
    ) -> bool
    {
        self.is_match(&article.headline) || self.is_match(&article.text)
    }
}

/// The three keyword sets of one topic, with a version tag.
#[derive(Debug, Clone)]
pub struct KeywordSets
{
    pub version: String,
    pub topic: KeywordSet,
    pub qualifier: KeywordSet,
    pub exclusion: KeywordSet,
}

/// Boolean rule evaluation over articles.
#[derive(Debug, Clone)]
pub struct KeywordEngine
{
    version: String,
    topic: KeywordMatcher,
    qualifier: KeywordMatcher,
    exclusion: KeywordMatcher,
}

impl KeywordEngine
{
    pub fn new(sets: KeywordSets) -> Result<Self>
    {
        Ok(Self {
            version: sets.version,
            topic: KeywordMatcher::new(sets.topic)?,
            qualifier: KeywordMatcher::new(sets.qualifier)?,
            exclusion: KeywordMatcher::new(sets.exclusion)?,
        })
    }

    pub fn version(&self) -> &str
    {
        &self.version
    }

    pub fn topic(&self) -> &KeywordMatcher
    {
        &self.topic
    }

    pub fn qualifier(&self) -> &KeywordMatcher
    {
        &self.qualifier
    }

    pub fn exclusion(&self) -> &KeywordMatcher
    {
        &self.exclusion
    }

    /// Topic and qualifier evidence for the given mode, ignoring the veto.
    ///
    /// - permissive: (topic | qualifier) over (headline | body)
    /// - strict: topic(body) & qualifier(body)
    pub fn candidate(
        &self,
        article: &Article,
        mode: MatchMode,
    ) -> bool
    {
        match mode
        {
            MatchMode::Permissive =>
            {
                self.topic
                    .hits_article(article)
                    || self
                        .qualifier
                        .hits_article(article)
            }
            MatchMode::Strict =>
            {
                self.topic
                    .is_match(&article.text)
                    && self
                        .qualifier
                        .is_match(&article.text)
            }
        }
    }

    /// Exclusion veto: headline or body in permissive mode, body only in
    /// strict mode.
    pub fn vetoed(
        &self,
        article: &Article,
        mode: MatchMode,
    ) -> bool
    {
        match mode
        {
            MatchMode::Permissive => self
                .exclusion
                .hits_article(article),
            MatchMode::Strict => self
                .exclusion
                .is_match(&article.text),
        }
    }

    /// What the keyword stage keeps. Strict mode applies its veto here;
    /// permissive mode leaves it to the exclusion stage.
    pub fn matches(
        &self,
        article: &Article,
        mode: MatchMode,
    ) -> bool
    {
        let hit = self.candidate(article, mode)
            && match mode
            {
                MatchMode::Permissive => true,
                MatchMode::Strict => !self.vetoed(article, mode),
            };

        trace!(id = %article.id, %mode, hit, "keyword match");
        hit
    }

    /// Exclusion veto over headline or body.
    pub fn excluded(
        &self,
        article: &Article,
    ) -> bool
    {
        self.vetoed(article, MatchMode::Permissive)
    }
}
