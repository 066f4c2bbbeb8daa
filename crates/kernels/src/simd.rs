//! SIMD backends. The permutation body comes from a search tool; this module
//! only frames it with the shared argument handling and timing.

use crate::backend::{KernelBackend, RenderContext};
use crate::config::{BackendDescriptor, BackendKind, ComputeUnit, ElementType, TargetFamily};
use crate::error::BackendError;
use crate::utils;

const CLANG_AVX2: BackendDescriptor = BackendDescriptor {
    name: "simd-avx2",
    aliases: &["simd", "simd2"],
    kind: BackendKind::Simd(TargetFamily::Avx2),
    compiler_prefix: &["clang", "-O3", "-Wall", "-mavx", "-mavx2", "-msse", "-g"],
    program_output: "prog.c",
    openmp_flags: &["-fopenmp"],
    assembly_flag: "-S",
    assembly_extension: "s",
    element: ElementType::Float,
    compute_unit: ComputeUnit::ClockTicks,
};

const CLANG_NEON: BackendDescriptor = BackendDescriptor {
    name: "simd-neon",
    aliases: &["neon"],
    kind: BackendKind::Simd(TargetFamily::Neon),
    compiler_prefix: &["clang", "-O3", "-Wall", "-g"],
    program_output: "prog.c",
    openmp_flags: &["-fopenmp"],
    assembly_flag: "-S",
    assembly_extension: "s",
    element: ElementType::Float,
    compute_unit: ComputeUnit::ClockTicks,
};

pub struct SimdBackend {
    descriptor: BackendDescriptor,
    intrinsics_header: &'static str,
}

impl SimdBackend {
    pub fn avx2() -> Self {
        Self {
            descriptor: CLANG_AVX2,
            intrinsics_header: "immintrin.h",
        }
    }

    pub fn neon() -> Self {
        Self {
            descriptor: CLANG_NEON,
            intrinsics_header: "arm_neon.h",
        }
    }

    pub fn with_compiler(mut self, prefix: &'static [&'static str]) -> Self {
        self.descriptor.compiler_prefix = prefix;
        self
    }

    pub fn family(&self) -> TargetFamily {
        match self.descriptor.kind {
            BackendKind::Simd(family) => family,
            // Both constructors set a SIMD kind.
            BackendKind::Scalar | BackendKind::Gpu => TargetFamily::Avx2,
        }
    }
}

impl KernelBackend for SimdBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, BackendError> {
        let fragment = ctx
            .simd_fragment
            .ok_or_else(|| BackendError::MissingFragment {
                backend: self.descriptor.name.to_string(),
            })?;
        let pattern = ctx.pattern;
        let element = self.descriptor.element;

        let mut lines = utils::includes(&[self.intrinsics_header]);
        lines.extend(utils::constants(pattern.arg_count(), pattern.probe()));
        lines.extend(utils::helpers(element));

        lines.push("static void permute(const float *in, float *out) {".to_string());
        lines.extend(
            fragment
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| format!("    {}", line.trim_end())),
        );
        lines.push("}".to_string());
        lines.push(String::new());

        lines.extend(utils::main_prologue(element, ""));
        lines.extend(utils::clock_timed_permute());
        lines.extend(utils::main_epilogue(
            element,
            "%ld",
            "(long) (finish - start)",
        ));
        Ok(utils::join_lines(lines))
    }
}
