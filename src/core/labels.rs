use serde::{Deserialize, Serialize};

use crate::core::normalize::normalize;

/// Closed binary label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label
{
    Irrelevant = 0,
    Relevant = 1,
}

impl Label
{
    pub const ALL: [Label; 2] = [Label::Irrelevant, Label::Relevant];

    /// Trim and lowercase, then map onto the closed set.
    pub fn parse(raw: &str) -> Option<Label>
    {
        match raw
            .trim()
            .to_lowercase()
            .as_str()
        {
            "irrelevant" => Some(Label::Irrelevant),
            "relevant" => Some(Label::Relevant),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str
    {
        match self
        {
            Label::Irrelevant => "irrelevant",
            Label::Relevant => "relevant",
        }
    }

    /// Regression target: 0.0 or 1.0
    pub fn target(self) -> f64
    {
        f64::from(self as u8)
    }

    pub fn from_bool(relevant: bool) -> Label
    {
        if relevant { Label::Relevant } else { Label::Irrelevant }
    }
}

impl std::fmt::Display for Label
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        f.write_str(self.as_str())
    }
}

/// Human-annotated training row. Text is stored normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample
{
    pub id: String,
    pub text: String,
    pub label: Label,
}

impl LabeledSample
{
    pub fn new(
        id: impl Into<String>,
        raw_text: &str,
        label: Label,
    ) -> Self
    {
        Self { id: id.into(), text: normalize(raw_text), label }
    }
}

/// Count of each label, indexed by `Label as usize`.
pub fn label_counts(labels: &[Label]) -> [usize; 2]
{
    let mut counts = [0usize; 2];
    for l in labels
    {
        counts[*l as usize] += 1;
    }
    counts
}

/// Number of labels with at least one occurrence
pub fn distinct_labels(labels: &[Label]) -> usize
{
    label_counts(labels)
        .iter()
        .filter(|&&c| c > 0)
        .count()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_free_form_values()
    {
        assert_eq!(Label::parse(" Relevant "), Some(Label::Relevant));
        assert_eq!(Label::parse("IRRELEVANT\n"), Some(Label::Irrelevant));
        assert_eq!(Label::parse("maybe"), None);
        assert_eq!(Label::parse(""), None);
    }

    #[test]
    fn sample_text_is_normalized()
    {
        let s = LabeledSample::new("1", "Rassismus, heute!", Label::Relevant);
        assert_eq!(s.text, "rassismus heute");
    }

    #[test]
    fn counts_and_distinct()
    {
        let labels = [Label::Relevant, Label::Relevant, Label::Irrelevant];
        assert_eq!(label_counts(&labels), [1, 2]);
        assert_eq!(distinct_labels(&labels), 2);
        assert_eq!(distinct_labels(&labels[..2]), 1);
        assert_eq!(distinct_labels(&[]), 0);
    }
}
