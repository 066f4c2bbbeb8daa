//! Scalar C backend: one assignment per pattern pair.

use crate::backend::{KernelBackend, RenderContext};
use crate::config::{BackendDescriptor, BackendKind, ComputeUnit, ElementType};
use crate::error::BackendError;
use crate::utils;

const CLANG_SCALAR: BackendDescriptor = BackendDescriptor {
    name: "scalar",
    aliases: &["base1"],
    kind: BackendKind::Scalar,
    compiler_prefix: &["clang", "-O3", "-Wall", "-g", "-std=c17", "-pedantic"],
    program_output: "prog.c",
    openmp_flags: &["-fopenmp"],
    assembly_flag: "-S",
    assembly_extension: "s",
    element: ElementType::Int,
    compute_unit: ComputeUnit::ClockTicks,
};

pub struct ScalarBackend {
    descriptor: BackendDescriptor,
}

impl ScalarBackend {
    pub fn new() -> Self {
        Self {
            descriptor: CLANG_SCALAR,
        }
    }

    /// Same backend built by another C compiler (`prefix[0]` is the program).
    pub fn with_compiler(mut self, prefix: &'static [&'static str]) -> Self {
        self.descriptor.compiler_prefix = prefix;
        self
    }
}

impl Default for ScalarBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBackend for ScalarBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, BackendError> {
        let pattern = ctx.pattern;
        let element = self.descriptor.element;

        let mut lines = utils::includes(&[]);
        lines.extend(utils::constants(pattern.arg_count(), pattern.probe()));
        lines.extend(utils::helpers(element));

        lines.push("static void permute(const int *in, int *out) {".to_string());
        lines.extend(
            pattern
                .pairs()
                .map(|pair| format!("    out[{}] = in[{}];", pair.destination, pair.source)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use permforge_patterns::make_pattern;

    #[test]
    fn renders_one_move_per_pair() {
        let pattern = make_pattern(&[2, 0, 1]).unwrap();
        let source = ScalarBackend::new()
            .render(&RenderContext::new(&pattern))
            .unwrap();
        assert!(source.contains("static const int arg_count = 3;"));
        assert!(source.contains("    out[2] = in[0];\n    out[0] = in[1];\n    out[1] = in[2];"));
        assert!(source.contains("#define HAS_PROBE_VALUES 0"));
    }

    #[test]
    fn compiler_override_keeps_identity() {
        let backend = ScalarBackend::new().with_compiler(&["cc", "-O2"]);
        let descriptor = backend.descriptor();
        assert_eq!(descriptor.compiler(), Some("cc"));
        assert!(descriptor.matches("base1"));
        assert_eq!(descriptor.program_output, "prog.c");
    }

    #[test]
    fn rendering_is_deterministic() {
        let pattern: permforge_patterns::Pattern = "3,1,0,2;5,6,7,8".parse().unwrap();
        let backend = ScalarBackend::new();
        let first = backend.render(&RenderContext::new(&pattern)).unwrap();
        let second = backend.render(&RenderContext::new(&pattern)).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("probe_values[4] = {5,6,7,8};"));
    }
}
