//! The kernel backend abstraction.

use crate::config::{BackendDescriptor, BackendKind, TargetFamily};
use crate::error::BackendError;
use permforge_patterns::Pattern;
use std::sync::Arc;

/// Everything a backend needs to render one kernel.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub pattern: &'a Pattern,
    /// Statements implementing the permutation, produced by a search tool.
    pub simd_fragment: Option<&'a str>,
}

impl<'a> RenderContext<'a> {
    pub fn new(pattern: &'a Pattern) -> Self {
        Self {
            pattern,
            simd_fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: &'a str) -> Self {
        self.simd_fragment = Some(fragment);
        self
    }
}

pub trait KernelBackend: Send + Sync {
    fn descriptor(&self) -> &BackendDescriptor;

    /// Render complete kernel source for the context's pattern. Rendering is
    /// pure: identical contexts yield identical text.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, BackendError>;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Instruction family to request from the search tool, if this backend
    /// needs a SIMD fragment.
    fn search_family(&self) -> Option<TargetFamily> {
        match self.descriptor().kind {
            BackendKind::Simd(family) => Some(family),
            BackendKind::Scalar | BackendKind::Gpu => None,
        }
    }
}

pub type DynKernelBackend = Arc<dyn KernelBackend>;
