//! Tool and harness configuration.

use anyhow::{Context, Result};
use permforge_runtime::{BuildOptions, ProcessOptions};
use permforge_search::SearchCommand;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings loaded from an optional JSON file; missing fields keep their
/// defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub search: SearchCommand,
    /// Wall-clock limit for compiler, search tool and kernel processes.
    pub timeout_secs: Option<u64>,
    pub work_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            search: SearchCommand::default(),
            timeout_secs: None,
            work_dir: PathBuf::from("build"),
        }
    }
}

impl ToolConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions::with_timeout(self.timeout_secs.map(Duration::from_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub backends: Vec<String>,
    /// Recorded executions per (backend, pattern).
    pub iterations: usize,
    /// Unrecorded executions before the recorded ones.
    pub warmup_runs: usize,
    pub work_dir: PathBuf,
    pub build: BuildOptions,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            backends: vec!["scalar".to_string()],
            iterations: 500,
            warmup_runs: 0,
            work_dir: PathBuf::from("build").join("bench"),
            build: BuildOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectnessConfig {
    pub backends: Vec<String>,
    pub work_dir: PathBuf,
    pub build: BuildOptions,
}

impl Default for CorrectnessConfig {
    fn default() -> Self {
        Self {
            backends: vec!["scalar".to_string()],
            work_dir: PathBuf::from("build").join("tests"),
            build: BuildOptions::default(),
        }
    }
}
