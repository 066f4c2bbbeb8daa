//! The pattern model: a validated bijection between source and destination
//! positions, plus its comma-separated textual encoding.

use crate::error::PatternError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One element move baked into a kernel: `out[destination] = in[source]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexPair {
    pub source: usize,
    pub destination: usize,
}

/// A validated permutation.
///
/// The pair at enumeration index `i` is `(i, destinations[i])`. Patterns may
/// optionally carry probe values, the input a harness feeds the kernel when
/// exercising it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    destinations: Vec<usize>,
    probe: Option<Vec<i64>>,
}

/// Validate `indices` and build a pattern from them.
pub fn make_pattern(indices: &[usize]) -> Result<Pattern, PatternError> {
    Pattern::new(indices.to_vec())
}

impl Pattern {
    pub fn new(destinations: Vec<usize>) -> Result<Self, PatternError> {
        validate_bijection(&destinations)?;
        Ok(Self {
            destinations,
            probe: None,
        })
    }

    /// Attach probe values; their length must match the pattern.
    pub fn with_probe(mut self, probe: Vec<i64>) -> Result<Self, PatternError> {
        if probe.len() != self.arg_count() {
            return Err(PatternError::ProbeLength {
                expected: self.arg_count(),
                found: probe.len(),
            });
        }
        self.probe = Some(probe);
        Ok(self)
    }

    pub fn arg_count(&self) -> usize {
        self.destinations.len()
    }

    pub fn destinations(&self) -> &[usize] {
        &self.destinations
    }

    pub fn pairs(&self) -> impl ExactSizeIterator<Item = IndexPair> + '_ {
        self.destinations
            .iter()
            .enumerate()
            .map(|(source, &destination)| IndexPair {
                source,
                destination,
            })
    }

    pub fn probe(&self) -> Option<&[i64]> {
        self.probe.as_deref()
    }

    /// The carried probe values, or the identity sequence `0..arg_count`.
    pub fn probe_or_identity(&self) -> Vec<i64> {
        self.probe
            .clone()
            .unwrap_or_else(|| identity_probe(self.arg_count()))
    }

    /// Apply the permutation directly: `output[destination] = input[source]`.
    pub fn apply<T: Copy + Default>(&self, input: &[T]) -> Result<Vec<T>, PatternError> {
        if input.len() != self.arg_count() {
            return Err(PatternError::InputLength {
                expected: self.arg_count(),
                found: input.len(),
            });
        }
        let mut output = vec![T::default(); input.len()];
        for pair in self.pairs() {
            output[pair.destination] = input[pair.source];
        }
        Ok(output)
    }

    /// Comma-joined destinations, the form handed to the search tool.
    pub fn canonical(&self) -> String {
        join_csv(&self.destinations)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())?;
        if let Some(probe) = &self.probe {
            write!(f, ";{}", join_csv(probe))?;
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (permutation, probe) = match s.split_once(';') {
            Some((permutation, probe)) => (permutation, Some(probe)),
            None => (s, None),
        };
        let pattern = Pattern::new(parse_csv(permutation)?)?;
        match probe {
            Some(probe) => pattern.with_probe(parse_csv(probe)?),
            None => Ok(pattern),
        }
    }
}

impl TryFrom<String> for Pattern {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Pattern> for String {
    fn from(value: Pattern) -> Self {
        value.to_string()
    }
}

pub fn identity_probe(arg_count: usize) -> Vec<i64> {
    (0..arg_count as i64).collect()
}

/// Parse a comma-separated list of decimal integers. Whitespace around
/// tokens is ignored; empty input yields an empty list.
pub fn parse_csv<T: FromStr>(text: &str) -> Result<Vec<T>, PatternError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(',')
        .map(|token| {
            let token = token.trim();
            token.parse().map_err(|_| PatternError::Parse {
                token: token.to_string(),
            })
        })
        .collect()
}

pub fn join_csv<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn validate_bijection(destinations: &[usize]) -> Result<(), PatternError> {
    if destinations.is_empty() {
        return Err(PatternError::Empty);
    }
    let arg_count = destinations.len();
    let mut seen = vec![false; arg_count];
    for &index in destinations {
        if index >= arg_count {
            return Err(PatternError::OutOfRange { index, arg_count });
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(PatternError::Duplicate { index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_duplicate_destination() {
        let err = make_pattern(&[0, 2, 1, 2]).unwrap_err();
        assert_eq!(err, PatternError::Duplicate { index: 2 });
    }

    #[test]
    fn accepts_swap() {
        let pattern = make_pattern(&[1, 0]).unwrap();
        assert_eq!(pattern.arg_count(), 2);
        assert_eq!(
            pattern.pairs().collect::<Vec<_>>(),
            vec![
                IndexPair {
                    source: 0,
                    destination: 1
                },
                IndexPair {
                    source: 1,
                    destination: 0
                },
            ]
        );
    }

    #[test]
    fn rejects_empty_and_out_of_range() {
        assert_eq!(make_pattern(&[]).unwrap_err(), PatternError::Empty);
        assert_eq!(
            make_pattern(&[0, 3, 1]).unwrap_err(),
            PatternError::OutOfRange {
                index: 3,
                arg_count: 3
            }
        );
    }

    #[test]
    fn apply_matches_expected_outputs() {
        let swap = make_pattern(&[1, 0]).unwrap();
        assert_eq!(swap.apply(&[7, 9]).unwrap(), vec![9, 7]);

        let rotate = make_pattern(&[2, 0, 1]).unwrap();
        assert_eq!(rotate.apply(&[10, 20, 30]).unwrap(), vec![20, 30, 10]);
        assert!(rotate.apply(&[1, 2]).is_err());
    }

    #[test]
    fn textual_encoding_with_probe() {
        let pattern: Pattern = "2,0,1;10,20,30".parse().unwrap();
        assert_eq!(pattern.destinations(), &[2, 0, 1]);
        assert_eq!(pattern.probe(), Some(&[10, 20, 30][..]));
        assert_eq!(pattern.to_string(), "2,0,1;10,20,30");
        assert_eq!(pattern.canonical(), "2,0,1");

        let plain: Pattern = " 1, 0 ".parse().unwrap();
        assert_eq!(plain.probe_or_identity(), vec![0, 1]);
    }

    #[test]
    fn textual_encoding_errors() {
        assert!(matches!(
            "1,x".parse::<Pattern>(),
            Err(PatternError::Parse { .. })
        ));
        assert_eq!(
            "1,0;5".parse::<Pattern>().unwrap_err(),
            PatternError::ProbeLength {
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn serde_uses_textual_form() {
        let pattern: Pattern = "1,0;7,9".parse().unwrap();
        let json = serde_json::to_string(&pattern).unwrap();
        assert_eq!(json, "\"1,0;7,9\"");
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pattern);
        assert!(serde_json::from_str::<Pattern>("\"0,0\"").is_err());
    }

    proptest! {
        #[test]
        fn shuffled_ranges_are_accepted(values in Just((0..64usize).collect::<Vec<_>>()).prop_shuffle()) {
            let pattern = make_pattern(&values).unwrap();
            let input: Vec<i64> = (0..64).collect();
            let output = pattern.apply(&input).unwrap();
            let mut sorted = output.clone();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, input);
        }

        #[test]
        fn duplicates_are_rejected(len in 2usize..32, a in 0usize..32, b in 0usize..32) {
            let a = a % len;
            let b = b % len;
            prop_assume!(a != b);
            let mut values: Vec<usize> = (0..len).collect();
            values[a] = values[b];
            prop_assert!(make_pattern(&values).is_err());
        }
    }
}
