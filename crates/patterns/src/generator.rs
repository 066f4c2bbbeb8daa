//! Random and structured pattern generators.
//!
//! Every generator draws from an explicit [`fastrand::Rng`] so catalogs can be
//! reproduced from a seed.

use crate::error::PatternError;
use crate::pattern::Pattern;
use fastrand::Rng;
use serde::{Deserialize, Serialize};

/// Uniformly random permutation of `0..arg_count` (Fisher–Yates).
pub fn uniform_permutation(rng: &mut Rng, arg_count: usize) -> Vec<usize> {
    let mut values: Vec<usize> = (0..arg_count).collect();
    shuffle(rng, &mut values);
    values
}

pub fn random_pattern(rng: &mut Rng, arg_count: usize) -> Result<Pattern, PatternError> {
    Pattern::new(uniform_permutation(rng, arg_count))
}

fn shuffle<T>(rng: &mut Rng, values: &mut [T]) {
    for i in (1..values.len()).rev() {
        let j = rng.usize(0..=i);
        values.swap(i, j);
    }
}

/// Shape of a structured sequence: a pool of `1..=pool_size` with clusters of
/// contiguous values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSpec {
    pub pool_size: usize,
    pub runs_of_eight: usize,
    pub runs_of_four: usize,
}

impl StructuredSpec {
    pub fn new(pool_size: usize, runs_of_eight: usize, runs_of_four: usize) -> Self {
        Self {
            pool_size,
            runs_of_eight,
            runs_of_four,
        }
    }
}

/// Location of a contiguous run inside a [`StructuredSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub start: usize,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSequence {
    pub values: Vec<usize>,
    pub runs: Vec<Run>,
}

impl StructuredSequence {
    /// The sequence shifted to `0..pool_size`, read as a pattern.
    pub fn to_pattern(&self) -> Result<Pattern, PatternError> {
        Pattern::new(self.values.iter().map(|value| value - 1).collect())
    }

    pub fn to_probe(&self) -> Vec<i64> {
        self.values.iter().map(|&value| value as i64).collect()
    }
}

/// Build a shuffled sequence of `1..=pool_size` with embedded clusters of
/// contiguous values.
///
/// Runs are laid out on the sorted pool in a random order with random gaps
/// between them, so a later run can never be starved by an earlier one. The
/// only refusal is a run longer than what the earlier runs left over. Runs
/// are shuffled internally and spliced into the shuffled residual pool at
/// random block boundaries, so later insertions never split an earlier run.
pub fn structured_sequence(
    rng: &mut Rng,
    spec: StructuredSpec,
) -> Result<StructuredSequence, PatternError> {
    let mut lengths: Vec<usize> = std::iter::repeat(8)
        .take(spec.runs_of_eight)
        .chain(std::iter::repeat(4).take(spec.runs_of_four))
        .collect();

    let mut remaining = spec.pool_size;
    for &len in &lengths {
        if len > remaining {
            return Err(PatternError::RunExceedsPool {
                run: len,
                remaining,
            });
        }
        remaining -= len;
    }

    shuffle(rng, &mut lengths);
    let (mut runs, mut pool) = carve_runs(rng, spec.pool_size, &lengths, remaining);
    for run in &mut runs {
        shuffle(rng, run);
    }

    shuffle(rng, &mut pool);
    let mut segments: Vec<(bool, Vec<usize>)> =
        pool.into_iter().map(|value| (false, vec![value])).collect();
    for run in runs {
        let at = rng.usize(0..=segments.len());
        segments.insert(at, (true, run));
    }

    let mut values = Vec::with_capacity(spec.pool_size);
    let mut placed = Vec::new();
    for (is_run, segment) in segments {
        if is_run {
            placed.push(Run {
                start: values.len(),
                len: segment.len(),
            });
        }
        values.extend(segment);
    }

    Ok(StructuredSequence {
        values,
        runs: placed,
    })
}

/// Split `1..=pool_size` into the requested runs and the residual values.
///
/// The `free` residual values are spread over the `lengths.len() + 1` gaps
/// around the runs (stars and bars), which keeps every run contiguous.
fn carve_runs(
    rng: &mut Rng,
    pool_size: usize,
    lengths: &[usize],
    free: usize,
) -> (Vec<Vec<usize>>, Vec<usize>) {
    let mut cuts: Vec<usize> = (0..lengths.len()).map(|_| rng.usize(0..=free)).collect();
    cuts.sort_unstable();

    let mut runs = Vec::with_capacity(lengths.len());
    let mut residual = Vec::with_capacity(free);
    let mut next = 1;
    let mut consumed = 0;
    for (&len, &cut) in lengths.iter().zip(&cuts) {
        residual.extend(next..next + (cut - consumed));
        next += cut - consumed;
        consumed = cut;
        runs.push((next..next + len).collect());
        next += len;
    }
    residual.extend(next..=pool_size);
    (runs, residual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_contiguous_runs(sequence: &StructuredSequence) {
        for run in &sequence.runs {
            let mut block = sequence.values[run.start..run.start + run.len].to_vec();
            block.sort_unstable();
            for window in block.windows(2) {
                assert_eq!(window[1], window[0] + 1, "run {:?} not contiguous", block);
            }
        }
    }

    #[test]
    fn uniform_is_seed_reproducible() {
        let a = uniform_permutation(&mut Rng::with_seed(7), 100);
        let b = uniform_permutation(&mut Rng::with_seed(7), 100);
        assert_eq!(a, b);
    }

    #[test]
    fn uniform_single_element() {
        assert_eq!(uniform_permutation(&mut Rng::with_seed(1), 1), vec![0]);
        assert!(random_pattern(&mut Rng::with_seed(1), 0).is_err());
    }

    #[test]
    fn structured_contains_requested_runs() {
        let mut rng = Rng::with_seed(42);
        let sequence = structured_sequence(&mut rng, StructuredSpec::new(128, 3, 4)).unwrap();

        let mut sorted = sequence.values.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (1..=128).collect::<Vec<_>>());

        assert_eq!(sequence.runs.iter().filter(|r| r.len == 8).count(), 3);
        assert_eq!(sequence.runs.iter().filter(|r| r.len == 4).count(), 4);
        assert_contiguous_runs(&sequence);

        let pattern = sequence.to_pattern().unwrap();
        assert_eq!(pattern.arg_count(), 128);
    }

    #[test]
    fn structured_fails_fast_when_pool_too_small() {
        let mut rng = Rng::with_seed(3);
        let err = structured_sequence(&mut rng, StructuredSpec::new(10, 2, 0)).unwrap_err();
        assert_eq!(
            err,
            PatternError::RunExceedsPool {
                run: 8,
                remaining: 2
            }
        );
    }

    #[test]
    fn structured_exact_fit() {
        let mut rng = Rng::with_seed(9);
        let sequence = structured_sequence(&mut rng, StructuredSpec::new(8, 1, 0)).unwrap();
        assert_eq!(sequence.runs, vec![Run { start: 0, len: 8 }]);
        assert_contiguous_runs(&sequence);
    }

    #[test]
    fn structured_two_runs_of_eight_fill_sixteen() {
        for seed in 0..200 {
            let spec = StructuredSpec::new(16, 2, 0);
            let sequence = structured_sequence(&mut Rng::with_seed(seed), spec)
                .unwrap_or_else(|err| panic!("seed {seed}: {err}"));
            assert_eq!(sequence.runs.len(), 2);
            assert_contiguous_runs(&sequence);
        }
    }

    #[test]
    fn structured_mixed_runs_fill_pool_exactly() {
        for seed in 0..50 {
            let spec = StructuredSpec::new(28, 2, 3);
            let sequence = structured_sequence(&mut Rng::with_seed(seed), spec)
                .unwrap_or_else(|err| panic!("seed {seed}: {err}"));
            assert_eq!(sequence.runs.len(), 5);
            assert_contiguous_runs(&sequence);
        }
    }

    proptest! {
        #[test]
        fn uniform_is_permutation(n in 1usize..512, seed in any::<u64>()) {
            let mut values = uniform_permutation(&mut Rng::with_seed(seed), n);
            values.sort_unstable();
            prop_assert_eq!(values, (0..n).collect::<Vec<_>>());
        }

        #[test]
        fn structured_is_permutation_with_runs(
            n8 in 0usize..4,
            n4 in 0usize..6,
            extra in 0usize..40,
            seed in any::<u64>(),
        ) {
            let pool_size = n8 * 8 + n4 * 4 + extra;
            let spec = StructuredSpec::new(pool_size, n8, n4);
            let sequence = structured_sequence(&mut Rng::with_seed(seed), spec).unwrap();
            let mut sorted = sequence.values.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (1..=pool_size).collect::<Vec<_>>());
            prop_assert_eq!(sequence.runs.iter().filter(|r| r.len == 8).count(), n8);
            prop_assert_eq!(sequence.runs.iter().filter(|r| r.len == 4).count(), n4);
            assert_contiguous_runs(&sequence);
        }
    }
}
