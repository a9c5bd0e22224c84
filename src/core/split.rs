//! Seeded stratified train/test split.

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::core::error::{Result, SiftError};
use crate::core::labels::Label;

/// Row indices of each partition, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split
{
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split preserving class proportions in both partitions.
///
/// Per class, `round(n_c * test_ratio)` rows go to test, but at least one
/// row of every present class stays in train. Same seed, same split.
pub fn stratified_split(
    labels: &[Label],
    test_ratio: f64,
    seed: u64,
) -> Result<Split>
{
    if !(0.0..1.0).contains(&test_ratio)
    {
        return Err(SiftError::InvalidParameter {
            name: "test_ratio".into(),
            reason: format!("{test_ratio} is outside [0, 1)"),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in Label::ALL
    {
        let mut idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| (*l == class).then_some(i))
            .collect();
        if idx.is_empty()
        {
            continue;
        }

        idx.shuffle(&mut rng);

        let n_test = ((idx.len() as f64 * test_ratio).round() as usize).min(idx.len() - 1);
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok(Split { train, test })
}
