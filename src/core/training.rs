//! Split, fit, train and evaluate in one pass.

use tracing::{info, instrument, warn};

use crate::core::classifier::{TrainParams, train};
use crate::core::error::{Result, SiftError};
use crate::core::features::{TfidfVectorizer, VectorizerParams};
use crate::core::labels::{Label, LabeledSample, distinct_labels, label_counts};
use crate::core::metrics::EvaluationReport;
use crate::core::model::RelevanceModel;
use crate::core::split::stratified_split;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSettings
{
    pub test_ratio: f64,
    pub seed: u64,
}

impl Default for SplitSettings
{
    fn default() -> Self
    {
        Self { test_ratio: 0.2, seed: 42 }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome
{
    pub model: RelevanceModel,
    /// Held-out evaluation
    pub report: EvaluationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Train on a stratified split of `samples` and evaluate on the held-out part.
///
/// The feature space is fit on the training partition only. With a test
/// ratio of zero the report is computed on the training rows instead.
#[instrument(skip_all, fields(samples = samples.len()))]
pub fn train_from_samples(
    samples: &[LabeledSample],
    vectorizer: &VectorizerParams,
    params: &TrainParams,
    split: &SplitSettings,
) -> Result<TrainingOutcome>
{
    let labels: Vec<Label> = samples
        .iter()
        .map(|s| s.label)
        .collect();

    vectorizer.validate()?;

    let found = distinct_labels(&labels);
    if found < 2
    {
        return Err(SiftError::InsufficientClasses { found });
    }

    let [irrelevant, relevant] = label_counts(&labels);
    info!(relevant, irrelevant, "label distribution");

    let parts = stratified_split(&labels, split.test_ratio, split.seed)?;
    let pick = |idx: &[usize]| {
        idx.iter()
            .map(|&i| (samples[i].text.as_str(), labels[i]))
            .unzip::<_, _, Vec<&str>, Vec<Label>>()
    };
    let (train_texts, train_labels) = pick(&parts.train);
    let (test_texts, test_labels) = pick(&parts.test);

    let [tr_irr, tr_rel] = label_counts(&train_labels);
    let [te_irr, te_rel] = label_counts(&test_labels);
    info!(
        train_relevant = tr_rel,
        train_irrelevant = tr_irr,
        test_relevant = te_rel,
        test_irrelevant = te_irr,
        "stratified split"
    );

    let space = TfidfVectorizer::new(vectorizer.clone()).fit(&train_texts);
    info!(vocabulary = space.dim(), identity = space.identity(), "feature space fit");

    let classifier = train(&space.transform(&train_texts), &train_labels, params)?;
    let model = RelevanceModel::new(space, classifier)?;

    let report = if test_texts.is_empty()
    {
        warn!("empty test split, reporting on the training rows");
        evaluate_texts(&model, &train_texts, &train_labels)?
    }
    else
    {
        evaluate_texts(&model, &test_texts, &test_labels)?
    };
    info!(accuracy = report.accuracy, "held-out evaluation");

    Ok(TrainingOutcome {
        model,
        report,
        train_size: train_labels.len(),
        test_size: test_labels.len(),
    })
}

fn evaluate_texts(
    model: &RelevanceModel,
    texts: &[&str],
    truth: &[Label],
) -> Result<EvaluationReport>
{
    model
        .classifier()
        .evaluate(
            &model
                .feature_space()
                .transform(texts),
            truth,
        )
}
