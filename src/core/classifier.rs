//! Class-balanced L2 logistic regression over sparse TF-IDF rows.
//!
//! Objective, with sample weights `s_i` and `λ = 1 / (C n)`:
//!
//! ```text
//! (1/n) Σ s_i · logloss(y_i, σ(w·x_i + b)) + λ/2 · ||w||²
//! ```
//!
//! The intercept is not penalized. Optimization is full-batch gradient
//! descent with a fixed `1/L` step, where `L` bounds the gradient's
//! Lipschitz constant, so a run is fully deterministic from its inputs.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{Result, SiftError};
use crate::core::features::{FeatureMatrix, SparseVector};
use crate::core::labels::{Label, distinct_labels, label_counts};
use crate::core::metrics::EvaluationReport;

const LOG_EPS: f64 = 1e-15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainParams
{
    /// Inverse regularization strength; larger means weaker penalty
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tolerance: f64,
    /// Reweight classes inversely to their frequency
    pub balanced: bool,
    /// Probability at or above which a row is `Relevant`
    pub threshold: f64,
}

impl Default for TrainParams
{
    fn default() -> Self
    {
        Self { c: 1.0, max_iter: 1000, tolerance: 1e-6, balanced: true, threshold: 0.5 }
    }
}

impl TrainParams
{
    fn validate(&self) -> Result<()>
    {
        if !(self.c > 0.0 && self.c.is_finite())
        {
            return Err(SiftError::InvalidParameter {
                name: "c".into(),
                reason: format!("{} must be a positive finite number", self.c),
            });
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0)
        {
            return Err(SiftError::InvalidParameter {
                name: "threshold".into(),
                reason: format!("{} is outside (0, 1)", self.threshold),
            });
        }
        if self.max_iter == 0
        {
            return Err(SiftError::InvalidParameter {
                name: "max_iter".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Trained weights, bound to the feature space they were fit against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierModel
{
    pub feature_space_id: String,
    pub weights: Vec<f64>,
    pub bias: f64,
    pub threshold: f64,
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
}

fn sigmoid(z: f64) -> f64
{
    if z >= 0.0
    {
        1.0 / (1.0 + (-z).exp())
    }
    else
    {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn log_loss(
    y: f64,
    p: f64,
) -> f64
{
    let p = p.clamp(LOG_EPS, 1.0 - LOG_EPS);
    -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
}

/// Per-sample weights. Balanced gives class `c` weight `n / (2 n_c)`.
fn sample_weights(
    labels: &[Label],
    balanced: bool,
) -> Vec<f64>
{
    if !balanced
    {
        return vec![1.0; labels.len()];
    }

    let n = labels.len() as f64;
    let counts = label_counts(labels);
    labels
        .iter()
        .map(|&l| n / (2.0 * counts[l as usize] as f64))
        .collect()
}

/// Fit a model on `features` with one label per row.
///
/// Fails with [`SiftError::InsufficientClasses`] unless both labels occur.
pub fn train(
    features: &FeatureMatrix,
    labels: &[Label],
    params: &TrainParams,
) -> Result<ClassifierModel>
{
    params.validate()?;

    if features.len() != labels.len()
    {
        return Err(SiftError::InvalidParameter {
            name: "labels".into(),
            reason: format!("{} labels for {} feature rows", labels.len(), features.len()),
        });
    }

    let found = distinct_labels(labels);
    if found < 2
    {
        return Err(SiftError::InsufficientClasses { found });
    }

    let n = labels.len() as f64;
    let dim = features.dim;
    let lambda = 1.0 / (params.c * n);
    let s = sample_weights(labels, params.balanced);
    let y: Vec<f64> = labels
        .iter()
        .map(|l| l.target())
        .collect();

    // σ' ≤ 1/4, and the bias acts as a constant feature of value 1
    let lipschitz = 0.25
        * features
            .rows
            .iter()
            .zip(&s)
            .map(|(x, si)| si * (x.norm_sq() + 1.0))
            .sum::<f64>()
        / n
        + lambda;
    let step = 1.0 / lipschitz;

    let mut w = vec![0.0; dim];
    let mut b = 0.0;
    let mut grad_w = vec![0.0; dim];
    let mut iterations = 0;
    let mut converged = false;

    for iter in 1..=params.max_iter
    {
        iterations = iter;

        for (g, wj) in grad_w
            .iter_mut()
            .zip(&w)
        {
            *g = lambda * wj;
        }
        let mut grad_b = 0.0;

        for ((x, &yi), &si) in features
            .rows
            .iter()
            .zip(&y)
            .zip(&s)
        {
            let residual = si * (sigmoid(x.dot(&w) + b) - yi) / n;
            for &(j, v) in &x.entries
            {
                grad_w[j] += residual * v;
            }
            grad_b += residual;
        }

        let grad_norm = (grad_w
            .iter()
            .map(|g| g * g)
            .sum::<f64>()
            + grad_b * grad_b)
            .sqrt();

        if grad_norm < params.tolerance
        {
            converged = true;
            break;
        }

        for (wj, g) in w
            .iter_mut()
            .zip(&grad_w)
        {
            *wj -= step * g;
        }
        b -= step * grad_b;

        if iter % 100 == 0
        {
            debug!(iter, grad_norm, "gradient descent progress");
        }
    }

    let final_loss = objective(features, &y, &s, &w, b, lambda);

    if converged
    {
        info!(iterations, final_loss, "classifier converged");
    }
    else
    {
        warn!(
            iterations,
            final_loss, "classifier stopped at max_iter before reaching tolerance"
        );
    }

    Ok(ClassifierModel {
        feature_space_id: features
            .space_id
            .clone(),
        weights: w,
        bias: b,
        threshold: params.threshold,
        iterations,
        converged,
        final_loss,
    })
}

fn objective(
    features: &FeatureMatrix,
    y: &[f64],
    s: &[f64],
    w: &[f64],
    b: f64,
    lambda: f64,
) -> f64
{
    let n = y.len() as f64;
    let data: f64 = features
        .rows
        .iter()
        .zip(y)
        .zip(s)
        .map(|((x, &yi), &si)| si * log_loss(yi, sigmoid(x.dot(w) + b)))
        .sum();
    let penalty = 0.5
        * lambda
        * w.iter()
            .map(|v| v * v)
            .sum::<f64>();

    data / n + penalty
}

impl ClassifierModel
{
    pub fn dim(&self) -> usize
    {
        self.weights.len()
    }

    /// Reject rows produced by any other feature space.
    pub fn check_compatible(
        &self,
        features: &FeatureMatrix,
    ) -> Result<()>
    {
        if features.space_id != self.feature_space_id
        {
            return Err(SiftError::mismatch(
                &self.feature_space_id,
                &features.space_id,
                "feature rows come from a different feature space",
            ));
        }
        if features.dim != self.dim()
        {
            return Err(SiftError::mismatch(
                format!("{} features", self.dim()),
                format!("{} features", features.dim),
                "dimension differs from trained weights",
            ));
        }
        Ok(())
    }

    /// Relevance probability of one vector. The caller guarantees the vector
    /// lives in this model's feature space.
    pub fn probability(
        &self,
        x: &SparseVector,
    ) -> f64
    {
        sigmoid(x.dot(&self.weights) + self.bias)
    }

    pub fn label_for(
        &self,
        probability: f64,
    ) -> Label
    {
        Label::from_bool(probability >= self.threshold)
    }

    pub fn predict_proba(
        &self,
        features: &FeatureMatrix,
    ) -> Result<Vec<f64>>
    {
        self.check_compatible(features)?;
        Ok(features
            .rows
            .iter()
            .map(|x| self.probability(x))
            .collect())
    }

    pub fn predict(
        &self,
        features: &FeatureMatrix,
    ) -> Result<Vec<Label>>
    {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| self.label_for(p))
            .collect())
    }

    pub fn evaluate(
        &self,
        features: &FeatureMatrix,
        truth: &[Label],
    ) -> Result<EvaluationReport>
    {
        if features.len() != truth.len()
        {
            return Err(SiftError::InvalidParameter {
                name: "labels".into(),
                reason: format!("{} labels for {} feature rows", truth.len(), features.len()),
            });
        }
        let predicted = self.predict(features)?;
        Ok(EvaluationReport::from_labels(truth, &predicted))
    }
}
