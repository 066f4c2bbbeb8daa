//! Benchmark harness: backends × catalog × iterations, one record per
//! execution.

use crate::config::BenchmarkConfig;
use crate::error::PipelineError;
use crate::report::{case_dir, CaseFailure};
use crate::session::CompilerSession;
use anyhow::Result;
use permforge_patterns::{CatalogEntry, PatternCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const CSV_HEADER: &str = "compute_time,template_name,arg_count,pattern_number,iteration_number";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub compute_time: f64,
    pub template_name: String,
    pub arg_count: usize,
    pub pattern_number: usize,
    pub iteration_number: usize,
}

/// Compute-metric statistics for one (backend, pattern).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    pub template_name: String,
    pub arg_count: usize,
    pub pattern_number: usize,
    pub runs: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkTable {
    pub records: Vec<BenchmarkRecord>,
}

impl BenchmarkTable {
    pub fn push(&mut self, record: BenchmarkRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.records.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for r in &self.records {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                r.compute_time, r.template_name, r.arg_count, r.pattern_number, r.iteration_number
            );
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn summaries(&self) -> Vec<BenchmarkSummary> {
        let mut groups: BTreeMap<(&str, usize, usize), Vec<f64>> = BTreeMap::new();
        for r in &self.records {
            groups
                .entry((r.template_name.as_str(), r.arg_count, r.pattern_number))
                .or_default()
                .push(r.compute_time);
        }
        groups
            .into_iter()
            .map(|((name, arg_count, pattern_number), times)| {
                let min = times.iter().copied().fold(f64::INFINITY, f64::min);
                let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = times.iter().sum::<f64>() / times.len() as f64;
                BenchmarkSummary {
                    template_name: name.to_string(),
                    arg_count,
                    pattern_number,
                    runs: times.len(),
                    min,
                    mean,
                    max,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkOutcome {
    pub table: BenchmarkTable,
    pub failures: Vec<CaseFailure>,
}

pub struct BenchmarkHarness<'a> {
    session: &'a CompilerSession,
    config: &'a BenchmarkConfig,
}

impl<'a> BenchmarkHarness<'a> {
    pub fn new(session: &'a CompilerSession, config: &'a BenchmarkConfig) -> Self {
        Self { session, config }
    }

    pub fn run(&self, catalog: &PatternCatalog) -> BenchmarkOutcome {
        let mut outcome = BenchmarkOutcome::default();
        for backend in &self.config.backends {
            for entry in catalog.entries() {
                let mut records = Vec::with_capacity(self.config.iterations);
                if let Err(err) = self.run_case(backend, &entry, &mut records) {
                    warn!(
                        backend = %backend,
                        arg_count = entry.arg_count,
                        pattern = entry.index,
                        kind = ?err.kind(),
                        error = %err,
                        "benchmark case failed"
                    );
                    outcome
                        .failures
                        .push(CaseFailure::new(backend, entry.arg_count, entry.index, &err));
                }
                // Iterations completed before a failure stay in the table.
                outcome.table.records.extend(records);
            }
        }
        info!(
            records = outcome.table.len(),
            failures = outcome.failures.len(),
            "benchmark run finished"
        );
        outcome
    }

    fn run_case(
        &self,
        backend: &str,
        entry: &CatalogEntry<'_>,
        records: &mut Vec<BenchmarkRecord>,
    ) -> Result<(), PipelineError> {
        let dir = case_dir(&self.config.work_dir, backend, entry.arg_count, entry.index);
        let artifact = self
            .session
            .prepare(entry.pattern, backend, &dir, &self.config.build)?;
        let probe = entry.pattern.probe_or_identity();

        for _ in 0..self.config.warmup_runs {
            self.session.execute(&artifact.binary, &probe)?;
        }
        for iteration in 0..self.config.iterations {
            let result = self.session.execute(&artifact.binary, &probe)?;
            records.push(BenchmarkRecord {
                compute_time: result.compute,
                template_name: artifact.backend.clone(),
                arg_count: entry.arg_count,
                pattern_number: entry.index,
                iteration_number: iteration,
            });
        }
        info!(
            backend = %artifact.backend,
            arg_count = entry.arg_count,
            pattern = entry.index,
            iterations = self.config.iterations,
            "benchmarked kernel"
        );
        Ok(())
    }
}
