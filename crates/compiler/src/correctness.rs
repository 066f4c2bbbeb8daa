//! Correctness harness: each kernel runs once on the identity probe and its
//! output is compared against an independently computed expectation.

use crate::config::CorrectnessConfig;
use crate::error::PipelineError;
use crate::report::{case_dir, unix_millis, CaseFailure};
use crate::session::CompilerSession;
use anyhow::Result;
use permforge_patterns::{identity_probe, CatalogEntry, Pattern, PatternCatalog};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub position: usize,
    pub expected: i64,
    pub actual: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    Passed,
    Mismatch { mismatches: Vec<Mismatch> },
    Failed { failure: CaseFailure },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessCase {
    pub backend: String,
    pub arg_count: usize,
    pub pattern_number: usize,
    pub pattern: String,
    pub outcome: CaseOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessReport {
    pub generated_at_unix_ms: u128,
    pub passed: usize,
    pub mismatched: usize,
    pub failed: usize,
    pub cases: Vec<CorrectnessCase>,
}

impl CorrectnessReport {
    pub fn new(cases: Vec<CorrectnessCase>) -> Self {
        let count = |f: fn(&CaseOutcome) -> bool| cases.iter().filter(|c| f(&c.outcome)).count();
        Self {
            generated_at_unix_ms: unix_millis(),
            passed: count(|o| matches!(o, CaseOutcome::Passed)),
            mismatched: count(|o| matches!(o, CaseOutcome::Mismatch { .. })),
            failed: count(|o| matches!(o, CaseOutcome::Failed { .. })),
            cases,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.mismatched == 0 && self.failed == 0
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }
}

/// `expected[pattern[i]] = probe[i]`, computed without going through
/// [`Pattern::apply`].
pub fn expected_output(pattern: &Pattern, probe: &[i64]) -> Vec<i64> {
    let mut expected = vec![0; probe.len()];
    for (i, &destination) in pattern.destinations().iter().enumerate() {
        expected[destination] = probe[i];
    }
    expected
}

pub fn compare(expected: &[i64], actual: &[i64]) -> Vec<Mismatch> {
    expected
        .iter()
        .zip(actual)
        .enumerate()
        .filter(|(_, (e, a))| e != a)
        .map(|(position, (&expected, &actual))| Mismatch {
            position,
            expected,
            actual,
        })
        .collect()
}

pub struct CorrectnessHarness<'a> {
    session: &'a CompilerSession,
    config: &'a CorrectnessConfig,
}

impl<'a> CorrectnessHarness<'a> {
    pub fn new(session: &'a CompilerSession, config: &'a CorrectnessConfig) -> Self {
        Self { session, config }
    }

    pub fn run(&self, catalog: &PatternCatalog) -> CorrectnessReport {
        let mut cases = Vec::new();
        for backend in &self.config.backends {
            for entry in catalog.entries() {
                let outcome = match self.check(backend, &entry) {
                    Ok(mismatches) if mismatches.is_empty() => CaseOutcome::Passed,
                    Ok(mismatches) => {
                        warn!(
                            backend = %backend,
                            arg_count = entry.arg_count,
                            pattern = entry.index,
                            mismatches = mismatches.len(),
                            "kernel output differs from expectation"
                        );
                        CaseOutcome::Mismatch { mismatches }
                    }
                    Err(err) => {
                        warn!(
                            backend = %backend,
                            arg_count = entry.arg_count,
                            pattern = entry.index,
                            kind = ?err.kind(),
                            error = %err,
                            "correctness case failed"
                        );
                        CaseOutcome::Failed {
                            failure: CaseFailure::new(backend, entry.arg_count, entry.index, &err),
                        }
                    }
                };
                cases.push(CorrectnessCase {
                    backend: backend.clone(),
                    arg_count: entry.arg_count,
                    pattern_number: entry.index,
                    pattern: entry.pattern.canonical(),
                    outcome,
                });
            }
        }
        let report = CorrectnessReport::new(cases);
        info!(
            passed = report.passed,
            mismatched = report.mismatched,
            failed = report.failed,
            "correctness run finished"
        );
        report
    }

    fn check(&self, backend: &str, entry: &CatalogEntry<'_>) -> Result<Vec<Mismatch>, PipelineError> {
        let dir = case_dir(&self.config.work_dir, backend, entry.arg_count, entry.index);
        let artifact = self
            .session
            .prepare(entry.pattern, backend, &dir, &self.config.build)?;
        let probe = identity_probe(entry.arg_count);
        let result = self.session.execute(&artifact.binary, &probe)?;
        Ok(compare(&expected_output(entry.pattern, &probe), &result.values))
    }
}
