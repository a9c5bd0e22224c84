//! A feature space and the classifier trained against it, as one unit.

use serde::Serialize;

use crate::core::classifier::ClassifierModel;
use crate::core::error::{Result, SiftError};
use crate::core::features::FeatureSpace;
use crate::core::labels::{Label, LabeledSample};
use crate::core::metrics::EvaluationReport;

/// Probability and thresholded label for one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Scored
{
    pub probability: f64,
    pub label: Label,
}

/// One term's share of a text's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermContribution
{
    pub term: String,
    pub tfidf: f64,
    pub weight: f64,
    /// `tfidf * weight`, added to the logit
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation
{
    pub probability: f64,
    pub label: Label,
    pub bias: f64,
    pub terms: Vec<TermContribution>,
}

#[derive(Debug, Clone)]
pub struct RelevanceModel
{
    feature_space: FeatureSpace,
    classifier: ClassifierModel,
}

impl RelevanceModel
{
    /// Pair a feature space with weights trained on it.
    ///
    /// Fails with [`SiftError::ArtifactMismatch`] when the classifier was
    /// trained against another vocabulary.
    pub fn new(
        feature_space: FeatureSpace,
        classifier: ClassifierModel,
    ) -> Result<Self>
    {
        if classifier.feature_space_id != feature_space.identity()
        {
            return Err(SiftError::mismatch(
                feature_space.identity(),
                &classifier.feature_space_id,
                "classifier was trained against a different feature space",
            ));
        }
        if classifier.dim() != feature_space.dim()
        {
            return Err(SiftError::mismatch(
                format!("{} features", feature_space.dim()),
                format!("{} weights", classifier.dim()),
                "weight vector length differs from vocabulary size",
            ));
        }

        Ok(Self { feature_space, classifier })
    }

    /// Same weights, different decision threshold. Must lie in (0, 1).
    pub fn with_threshold(
        mut self,
        threshold: f64,
    ) -> Result<Self>
    {
        if !(threshold > 0.0 && threshold < 1.0)
        {
            return Err(SiftError::InvalidParameter {
                name: "threshold".into(),
                reason: format!("{threshold} is outside (0, 1)"),
            });
        }
        self.classifier
            .threshold = threshold;
        Ok(self)
    }

    pub fn feature_space(&self) -> &FeatureSpace
    {
        &self.feature_space
    }

    pub fn classifier(&self) -> &ClassifierModel
    {
        &self.classifier
    }

    pub fn score(
        &self,
        text: &str,
    ) -> Scored
    {
        let probability = self
            .classifier
            .probability(
                &self
                    .feature_space
                    .vectorize(text),
            );
        Scored { probability, label: self.classifier.label_for(probability) }
    }

    pub fn score_all<S: AsRef<str>>(
        &self,
        texts: &[S],
    ) -> Vec<Scored>
    {
        texts
            .iter()
            .map(|t| self.score(t.as_ref()))
            .collect()
    }

    /// Score every sample against its human label.
    pub fn evaluate(
        &self,
        samples: &[LabeledSample],
    ) -> Result<EvaluationReport>
    {
        let texts: Vec<&str> = samples
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        let truth: Vec<Label> = samples
            .iter()
            .map(|s| s.label)
            .collect();

        self.classifier
            .evaluate(
                &self
                    .feature_space
                    .transform(&texts),
                &truth,
            )
    }

    /// Top `n` TF-IDF terms of `text` with their contribution to the logit.
    pub fn explain(
        &self,
        text: &str,
        n: usize,
    ) -> Explanation
    {
        let vector = self
            .feature_space
            .vectorize(text);
        let probability = self
            .classifier
            .probability(&vector);

        let terms = self
            .feature_space
            .top_terms(&vector, n)
            .into_iter()
            .map(|(term, tfidf)| {
                let weight = self
                    .feature_space
                    .index_of(&term)
                    .map_or(0.0, |i| self.classifier.weights[i]);
                TermContribution { term, tfidf, weight, contribution: tfidf * weight }
            })
            .collect();

        Explanation {
            probability,
            label: self
                .classifier
                .label_for(probability),
            bias: self.classifier.bias,
            terms,
        }
    }
}
