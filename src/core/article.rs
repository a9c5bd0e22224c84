use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One corpus record.
///
/// `raw_date` is the free-form value as loaded; `date` is filled in by the
/// date-normalization stage and stays `None` when the raw value does not
/// parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article
{
    pub id: String,
    pub headline: String,
    pub text: String,
    pub raw_date: String,
    pub date: Option<NaiveDate>,
    pub source: String,
}

impl Article
{
    pub fn new(
        id: impl Into<String>,
        headline: impl Into<String>,
        text: impl Into<String>,
    ) -> Self
    {
        Self {
            id: id.into(),
            headline: headline.into(),
            text: text.into(),
            raw_date: String::new(),
            date: None,
            source: String::new(),
        }
    }

    pub fn with_date(
        mut self,
        raw: impl Into<String>,
    ) -> Self
    {
        self.raw_date = raw.into();
        self
    }

    /// Date column as written to the filtered output: ISO date or empty.
    pub fn date_column(&self) -> String
    {
        self.date
            .map(|d| {
                d.format("%Y-%m-%d")
                    .to_string()
            })
            .unwrap_or_default()
    }
}

/// Derived per-article verdict; reported, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelevanceDecision
{
    pub id: String,
    pub keyword_match: bool,
    pub excluded: bool,
    pub noise: bool,
    pub included: bool,
}
