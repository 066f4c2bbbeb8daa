//! Backend registry for lookup and discovery.

use crate::backend::{DynKernelBackend, KernelBackend};
use crate::error::BackendError;
use crate::gpu::GpuBackend;
use crate::scalar::ScalarBackend;
use crate::simd::SimdBackend;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

static GLOBAL: Lazy<KernelRegistry> = Lazy::new(KernelRegistry::with_default_backends);

/// Process-wide registry holding the built-in backends.
pub fn global_registry() -> &'static KernelRegistry {
    &GLOBAL
}

#[derive(Default, Clone)]
pub struct KernelRegistry {
    backends: Vec<DynKernelBackend>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with_default_backends() -> Self {
        let mut registry = Self::new();
        registry.register(ScalarBackend::new());
        registry.register(SimdBackend::avx2());
        registry.register(SimdBackend::neon());
        registry.register(GpuBackend::cuda());
        registry
    }

    pub fn register<B>(&mut self, backend: B)
    where
        B: KernelBackend + 'static,
    {
        debug!(backend = backend.name(), "registering kernel backend");
        self.backends.push(Arc::new(backend));
    }

    pub fn backends(&self) -> &[DynKernelBackend] {
        &self.backends
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|backend| backend.name()).collect()
    }

    /// Lookup by canonical name or alias.
    pub fn find(&self, name: &str) -> Option<DynKernelBackend> {
        self.backends
            .iter()
            .find(|backend| backend.descriptor().matches(name))
            .map(Arc::clone)
    }

    pub fn get(&self, name: &str) -> Result<DynKernelBackend, BackendError> {
        self.find(name).ok_or_else(|| BackendError::NotFound {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }
}
