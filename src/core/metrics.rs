//! Evaluation metrics for the binary relevance classifier.

use serde::Serialize;

use crate::core::labels::Label;

/// Confusion counts with `Relevant` as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix
{
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix
{
    pub fn from_labels(
        truth: &[Label],
        predicted: &[Label],
    ) -> Self
    {
        let mut cm = Self::default();

        for (&t, &p) in truth
            .iter()
            .zip(predicted)
        {
            match (t, p)
            {
                (Label::Relevant, Label::Relevant) => cm.tp += 1,
                (Label::Irrelevant, Label::Irrelevant) => cm.tn += 1,
                (Label::Irrelevant, Label::Relevant) => cm.fp += 1,
                (Label::Relevant, Label::Irrelevant) => cm.fn_ += 1,
            }
        }

        cm
    }

    pub fn total(&self) -> usize
    {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// (true positives, predicted positives, actual positives) for `class`
    fn counts_for(
        &self,
        class: Label,
    ) -> (usize, usize, usize)
    {
        match class
        {
            Label::Relevant => (self.tp, self.tp + self.fp, self.tp + self.fn_),
            Label::Irrelevant => (self.tn, self.tn + self.fn_, self.tn + self.fp),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics
{
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AverageMetrics
{
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Accuracy plus per-class precision/recall/F1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport
{
    pub accuracy: f64,
    pub support: usize,
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub confusion: ConfusionMatrix,
}

fn ratio(
    num: usize,
    denom: usize,
) -> f64
{
    if denom == 0 { 0.0 } else { num as f64 / denom as f64 }
}

fn f1(
    precision: f64,
    recall: f64,
) -> f64
{
    if precision + recall == 0.0
    {
        0.0
    }
    else
    {
        2.0 * precision * recall / (precision + recall)
    }
}

impl EvaluationReport
{
    /// Build the report; zero denominators yield 0.0.
    pub fn from_labels(
        truth: &[Label],
        predicted: &[Label],
    ) -> Self
    {
        let confusion = ConfusionMatrix::from_labels(truth, predicted);
        let support = confusion.total();

        let classes: Vec<ClassMetrics> = Label::ALL
            .iter()
            .map(|&label| {
                let (hits, predicted_n, actual_n) = confusion.counts_for(label);
                let precision = ratio(hits, predicted_n);
                let recall = ratio(hits, actual_n);
                ClassMetrics { label, precision, recall, f1: f1(precision, recall), support: actual_n }
            })
            .collect();

        let n_classes = classes.len() as f64;
        let macro_avg = AverageMetrics {
            precision: classes
                .iter()
                .map(|c| c.precision)
                .sum::<f64>()
                / n_classes,
            recall: classes
                .iter()
                .map(|c| c.recall)
                .sum::<f64>()
                / n_classes,
            f1: classes
                .iter()
                .map(|c| c.f1)
                .sum::<f64>()
                / n_classes,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| -> f64 {
            if support == 0
            {
                return 0.0;
            }
            classes
                .iter()
                .map(|c| f(c) * c.support as f64)
                .sum::<f64>()
                / support as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
        };

        Self {
            accuracy: ratio(confusion.tp + confusion.tn, support),
            support,
            classes,
            macro_avg,
            weighted_avg,
            confusion,
        }
    }

    pub fn class(
        &self,
        label: Label,
    ) -> &ClassMetrics
    {
        &self.classes[label as usize]
    }
}

impl std::fmt::Display for EvaluationReport
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        writeln!(f, "{:>12} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes
        {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.as_str(),
                c.precision,
                c.recall,
                c.f1,
                c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>12} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.support)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)]
        {
            writeln!(
                f,
                "{:>12} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
