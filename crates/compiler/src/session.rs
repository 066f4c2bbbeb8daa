//! Session orchestration: generate, build and execute kernels.

use crate::config::ToolConfig;
use crate::error::PipelineError;
use crate::pipeline::GenerationEngine;
use permforge_kernels::global_registry;
use permforge_patterns::Pattern;
use permforge_runtime::{BuildOptions, Builder, ExecutionResult, Executor, ProcessOptions};
use permforge_search::{DynSearchTool, ExternalSearch};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the compiled kernel inside its artifact directory.
pub const BINARY_NAME: &str = "kernel";

/// Source and binary produced for one (pattern, backend) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub backend: String,
    pub source: PathBuf,
    pub binary: PathBuf,
    pub assembly: Option<PathBuf>,
}

pub struct CompilerSession {
    engine: GenerationEngine,
    builder: Builder,
    executor: Executor,
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new(GenerationEngine::default(), ProcessOptions::default())
    }
}

impl CompilerSession {
    pub fn new(engine: GenerationEngine, process: ProcessOptions) -> Self {
        Self {
            engine,
            builder: Builder::new(process),
            executor: Executor::new(process),
        }
    }

    /// Session using `search` for SIMD backends and the configured timeout.
    pub fn from_config(config: &ToolConfig, search: DynSearchTool) -> Self {
        let engine = GenerationEngine::new(global_registry().clone(), search);
        Self::new(engine, config.process_options())
    }

    /// Session delegating SIMD selection to the configured external tool.
    pub fn with_external_search(config: &ToolConfig) -> Self {
        let search = ExternalSearch::new(config.search.clone(), config.process_options());
        Self::from_config(config, Arc::new(search))
    }

    pub fn engine(&self) -> &GenerationEngine {
        &self.engine
    }

    pub fn generate(
        &self,
        pattern: &Pattern,
        backend_id: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        self.engine.generate(pattern, backend_id, out_dir)
    }

    pub fn build(
        &self,
        source: &Path,
        binary: &Path,
        backend_id: &str,
        options: &BuildOptions,
    ) -> Result<Option<PathBuf>, PipelineError> {
        let backend = self.engine.backend(backend_id)?;
        let output = self
            .builder
            .build(source, binary, backend.descriptor(), options)?;
        Ok(output.assembly)
    }

    pub fn execute(&self, binary: &Path, values: &[i64]) -> Result<ExecutionResult, PipelineError> {
        Ok(self.executor.execute(binary, values)?)
    }

    /// Run a kernel on the probe values compiled into it.
    pub fn execute_baked(
        &self,
        binary: &Path,
        arg_count: usize,
    ) -> Result<ExecutionResult, PipelineError> {
        Ok(self.executor.execute_baked(binary, arg_count)?)
    }

    /// Generate and build into `dir`, producing `dir/kernel`.
    pub fn prepare(
        &self,
        pattern: &Pattern,
        backend_id: &str,
        dir: &Path,
        options: &BuildOptions,
    ) -> Result<GeneratedArtifact, PipelineError> {
        let backend = self.engine.backend(backend_id)?;
        let source = self.generate(pattern, backend_id, dir)?;
        let binary = dir.join(BINARY_NAME);
        let assembly = self.build(&source, &binary, backend_id, options)?;
        Ok(GeneratedArtifact {
            backend: backend.name().to_string(),
            source,
            binary,
            assembly,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::fake_session;
    use anyhow::Result;
    use permforge_patterns::make_pattern;

    #[test]
    fn prepare_then_execute() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let session = fake_session();
        let pattern = make_pattern(&[2, 0, 1])?;

        let artifact = session.prepare(&pattern, "sh", dir.path(), &BuildOptions::default())?;
        assert_eq!(artifact.backend, "sh");
        assert_eq!(artifact.source, dir.path().join("prog.sh"));
        assert_eq!(artifact.binary, dir.path().join(BINARY_NAME));
        assert_eq!(artifact.assembly, None);

        let result = session.execute(&artifact.binary, &[10, 20, 30])?;
        assert_eq!(result.values, vec![20, 30, 10]);
        assert_eq!(result.code, 0);
        Ok(())
    }

    #[test]
    fn baked_probe_values_are_used() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let session = fake_session();
        let pattern: Pattern = "1,0;7,9".parse()?;
        let artifact = session.prepare(&pattern, "sh", dir.path(), &BuildOptions::default())?;
        let result = session.execute_baked(&artifact.binary, 2)?;
        assert_eq!(result.values, vec![9, 7]);
        Ok(())
    }

    #[test]
    fn wrong_count_is_an_execution_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let session = fake_session();
        let pattern = make_pattern(&[4, 3, 2, 1, 0])?;
        let artifact = session.prepare(&pattern, "sh", dir.path(), &BuildOptions::default())?;

        let err = session.execute(&artifact.binary, &[1, 2, 3, 4]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert!(err.to_string().contains("5 vs 4"));
        Ok(())
    }
}
