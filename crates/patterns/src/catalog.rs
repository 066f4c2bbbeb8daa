//! Pattern catalogs grouped by element count.

use crate::generator::{random_pattern, structured_sequence, StructuredSpec};
use crate::pattern::Pattern;
use anyhow::{bail, Result};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternCatalog {
    groups: BTreeMap<usize, Vec<Pattern>>,
}

/// A pattern together with its position in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry<'a> {
    pub arg_count: usize,
    pub index: usize,
    pub pattern: &'a Pattern,
}

impl PatternCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pattern: Pattern) {
        self.groups
            .entry(pattern.arg_count())
            .or_default()
            .push(pattern);
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.insert(pattern);
        self
    }

    pub fn group(&self, arg_count: usize) -> &[Pattern] {
        self.groups
            .get(&arg_count)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn arg_counts(&self) -> impl Iterator<Item = usize> + '_ {
        self.groups.keys().copied()
    }

    /// Entries ordered by arg_count, then by insertion order within a group.
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry<'_>> {
        self.groups.iter().flat_map(|(&arg_count, patterns)| {
            patterns
                .iter()
                .enumerate()
                .map(move |(index, pattern)| CatalogEntry {
                    arg_count,
                    index,
                    pattern,
                })
        })
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `per_count` uniformly random patterns for each requested size.
    pub fn generate(rng: &mut Rng, arg_counts: &[usize], per_count: usize) -> Result<Self> {
        let mut catalog = Self::new();
        for &arg_count in arg_counts {
            for _ in 0..per_count {
                catalog.insert(random_pattern(rng, arg_count)?);
            }
        }
        Ok(catalog)
    }

    /// Patterns built from structured sequences; each carries the sequence it
    /// was derived from as probe values.
    pub fn structured(rng: &mut Rng, specs: &[StructuredSpec], per_spec: usize) -> Result<Self> {
        let mut catalog = Self::new();
        for &spec in specs {
            for _ in 0..per_spec {
                let sequence = structured_sequence(rng, spec)?;
                let pattern = sequence.to_pattern()?.with_probe(sequence.to_probe())?;
                catalog.insert(pattern);
            }
        }
        Ok(catalog)
    }

    /// Small fixed catalog with hand-checked expectations.
    pub fn smoke() -> Result<Self> {
        let encoded = [
            "1,0;7,9",
            "2,0,1;10,20,30",
            "3,2,1,0",
            "1,2,3,0",
            "7,6,5,4,3,2,1,0",
            "1,0,3,2,5,4,7,6,9,8,11,10,13,12,15,14",
            "4,5,6,7,0,1,2,3,12,13,14,15,8,9,10,11",
        ];
        let mut catalog = Self::new();
        for text in encoded {
            catalog.insert(text.parse()?);
        }
        Ok(catalog)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let catalog: Self = serde_json::from_slice(&data)?;
        catalog.validate()?;
        debug!(path = %path.display(), patterns = catalog.len(), "loaded pattern catalog");
        Ok(catalog)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let blob = serde_json::to_vec_pretty(self)?;
        fs::write(path, blob)?;
        debug!(path = %path.display(), patterns = self.len(), "saved pattern catalog");
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (&arg_count, patterns) in &self.groups {
            if let Some(pattern) = patterns.iter().find(|p| p.arg_count() != arg_count) {
                bail!(
                    "catalog group {} contains pattern `{}` with {} elements",
                    arg_count,
                    pattern,
                    pattern.arg_count()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoke_catalog_groups_by_arg_count() {
        let catalog = PatternCatalog::smoke().unwrap();
        assert_eq!(catalog.arg_counts().collect::<Vec<_>>(), vec![2, 3, 4, 8, 16]);
        assert_eq!(catalog.group(4).len(), 2);
        assert_eq!(catalog.len(), 7);

        let first = catalog.entries().next().unwrap();
        assert_eq!(first.arg_count, 2);
        assert_eq!(first.index, 0);
        assert_eq!(first.pattern.probe(), Some(&[7, 9][..]));
    }

    #[test]
    fn generated_catalog_is_reproducible() {
        let a = PatternCatalog::generate(&mut Rng::with_seed(11), &[4, 32], 3).unwrap();
        let b = PatternCatalog::generate(&mut Rng::with_seed(11), &[4, 32], 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.group(32).len(), 3);
    }

    #[test]
    fn structured_catalog_carries_probes() {
        let specs = [StructuredSpec::new(64, 2, 2)];
        let catalog = PatternCatalog::structured(&mut Rng::with_seed(5), &specs, 2).unwrap();
        for entry in catalog.entries() {
            let probe = entry.pattern.probe().unwrap();
            assert_eq!(probe.len(), 64);
        }
    }

    #[test]
    fn file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("catalog.json");
        let catalog = PatternCatalog::smoke()?;
        catalog.save_to_file(&path)?;
        assert_eq!(PatternCatalog::load_from_file(&path)?, catalog);
        Ok(())
    }

    #[test]
    fn load_rejects_misfiled_pattern() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("catalog.json");
        fs::write(&path, r#"{"groups": {"3": ["1,0"]}}"#)?;
        assert!(PatternCatalog::load_from_file(&path).is_err());
        Ok(())
    }
}
