//! Code generation engine: resolves a backend, asks the search tool for a
//! SIMD fragment when the backend needs one, and writes the rendered source.

use crate::error::PipelineError;
use permforge_kernels::{global_registry, DynKernelBackend, KernelRegistry, RenderContext};
use permforge_patterns::Pattern;
use permforge_search::{BlockSearch, DynSearchTool};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct GenerationEngine {
    registry: KernelRegistry,
    search: DynSearchTool,
}

impl Default for GenerationEngine {
    /// Global registry with the in-process [`BlockSearch`]. Construct the
    /// engine with an `ExternalSearch` (the CLI's `--search external`) to
    /// delegate SIMD fragments to the external search tool instead.
    fn default() -> Self {
        Self::new(global_registry().clone(), Arc::new(BlockSearch::new()))
    }
}

impl GenerationEngine {
    pub fn new(registry: KernelRegistry, search: DynSearchTool) -> Self {
        Self { registry, search }
    }

    pub fn registry(&self) -> &KernelRegistry {
        &self.registry
    }

    pub fn backend(&self, backend_id: &str) -> Result<DynKernelBackend, PipelineError> {
        Ok(self.registry.get(backend_id)?)
    }

    /// Render source text without touching the filesystem.
    pub fn render(&self, pattern: &Pattern, backend_id: &str) -> Result<String, PipelineError> {
        let backend = self.backend(backend_id)?;
        self.render_with(&backend, pattern)
    }

    fn render_with(
        &self,
        backend: &DynKernelBackend,
        pattern: &Pattern,
    ) -> Result<String, PipelineError> {
        let fragment = match backend.search_family() {
            Some(family) => {
                info!(
                    backend = backend.name(),
                    search = self.search.name(),
                    family = %family,
                    arg_count = pattern.arg_count(),
                    "selecting SIMD instructions"
                );
                Some(self.search.search(pattern, family)?)
            }
            None => None,
        };

        let mut ctx = RenderContext::new(pattern);
        if let Some(fragment) = fragment.as_deref() {
            ctx = ctx.with_fragment(fragment);
        }
        Ok(backend.render(&ctx)?)
    }

    /// Write the kernel for `pattern` to the backend's fixed source file name
    /// inside `out_dir` and return its path.
    pub fn generate(
        &self,
        pattern: &Pattern,
        backend_id: &str,
        out_dir: &Path,
    ) -> Result<PathBuf, PipelineError> {
        let backend = self.backend(backend_id)?;
        let source = self.render_with(&backend, pattern)?;

        let path = out_dir.join(backend.descriptor().program_output);
        fs::create_dir_all(out_dir)
            .and_then(|()| fs::write(&path, source))
            .map_err(|source| PipelineError::WriteSource {
                path: path.clone(),
                source,
            })?;
        info!(
            backend = backend.name(),
            arg_count = pattern.arg_count(),
            path = %path.display(),
            "generated kernel source"
        );
        Ok(path)
    }
}
