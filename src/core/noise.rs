//! Noise/event detector.
//!
//! High recall by intent: any single predicate firing marks the text as a
//! listing. Patterns only classify; they never remove text.

use itertools::Itertools;
use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SiftError};

/// One named regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoisePattern
{
    pub name: String,
    pub pattern: String,
}

impl NoisePattern
{
    pub fn new(
        name: &str,
        pattern: &str,
    ) -> Self
    {
        Self { name: name.to_string(), pattern: pattern.to_string() }
    }
}

/// Builtin predicates, in evaluation order.
pub fn default_patterns() -> Vec<NoisePattern>
{
    vec![
        NoisePattern::new("url", r"https?://[^\s]+"),
        NoisePattern::new("date", r"\d{1,2}[-/]\d{1,2}[-/]\d{4}"),
        NoisePattern::new("time", r"\d{1,2}:\d{1,2}"),
        NoisePattern::new("venue", r"\b(Theater|Kino|Filmvorführung|Vorstellung|Bühne)\b"),
        NoisePattern::new("ticketing", r"\b(Ticket|Eintritt|Reservierung|Online-Anmeldung)\b"),
        NoisePattern::new("postal_code", r"\b(\d{4,5})\b"),
    ]
}

/// Extra builtins that can be enabled by name from config.
pub fn optional_pattern(name: &str) -> Option<NoisePattern>
{
    match name
    {
        "phone" => Some(NoisePattern::new("phone", r"\d{10}")),
        _ => None,
    }
}

/// Compiled, ordered set of noise predicates.
#[derive(Debug, Clone)]
pub struct NoiseDetector
{
    names: Vec<String>,
    set: RegexSet,
}

impl NoiseDetector
{
    pub fn new(
        patterns: &[NoisePattern],
        case_insensitive: bool,
    ) -> Result<Self>
    {
        if let Some(dup) = patterns
            .iter()
            .map(|p| p.name.as_str())
            .duplicates()
            .next()
        {
            return Err(SiftError::InvalidNoisePattern {
                name: dup.to_string(),
                reason: "pattern name used more than once".to_string(),
            });
        }

        // Compile one by one first so a bad pattern is reported by name
        for p in patterns
        {
            regex::RegexBuilder::new(&p.pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| SiftError::InvalidNoisePattern {
                    name: p
                        .name
                        .clone(),
                    reason: e.to_string(),
                })?;
        }

        let set = RegexSetBuilder::new(
            patterns
                .iter()
                .map(|p| &p.pattern),
        )
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| SiftError::InvalidNoisePattern {
            name: "<set>".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            names: patterns
                .iter()
                .map(|p| {
                    p.name
                        .clone()
                })
                .collect(),
            set,
        })
    }

    /// Detector with the builtin predicates, case-insensitive.
    pub fn with_defaults() -> Result<Self>
    {
        Self::new(&default_patterns(), true)
    }

    /// True if any predicate fires. Total over all inputs; empty text is
    /// never noise.
    pub fn is_noise(
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
        self.set
            .is_match(text)
    }

    /// Names of the predicates that fire, in pattern order.
    pub fn matched(
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
        self.set
            .matches(text)
            .into_iter()
            .map(|i| self.names[i].as_str())
            .collect()
    }

    pub fn pattern_names(&self) -> &[String]
    {
        &self.names
    }
}
