//! A shell-script backend so the harnesses can be exercised without a C
//! toolchain. The "compiler" copies the script and marks it executable.

use crate::pipeline::GenerationEngine;
use crate::session::CompilerSession;
use permforge_kernels::{
    BackendDescriptor, BackendError, BackendKind, ComputeUnit, ElementType, KernelBackend,
    KernelRegistry, RenderContext,
};
use permforge_patterns::join_csv;
use permforge_runtime::ProcessOptions;
use permforge_search::BlockSearch;
use std::sync::Arc;

const SHELL_KERNEL: BackendDescriptor = BackendDescriptor {
    name: "sh",
    aliases: &[],
    kind: BackendKind::Scalar,
    compiler_prefix: &[
        "sh",
        "-c",
        "for last; do :; done; cp \"$last\" \"$2\" && chmod +x \"$2\"",
        "fakecc",
    ],
    program_output: "prog.sh",
    openmp_flags: &[],
    assembly_flag: "-S",
    assembly_extension: "s",
    element: ElementType::Int,
    compute_unit: ComputeUnit::ClockTicks,
};

const FAILING_BUILD: BackendDescriptor = BackendDescriptor {
    name: "broken-cc",
    compiler_prefix: &["sh", "-c", "echo 'fatal: no compiler' >&2; exit 1", "fakecc"],
    ..SHELL_KERNEL
};

/// Renders a POSIX shell script speaking the kernel protocol. With
/// `scramble` set the script returns its input unchanged, which only matches
/// the identity permutation.
pub struct ShellBackend {
    descriptor: BackendDescriptor,
    scramble: bool,
}

impl KernelBackend for ShellBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, BackendError> {
        let pattern = ctx.pattern;
        let n = pattern.arg_count();
        let mut from = vec![0; n];
        for pair in pattern.pairs() {
            from[pair.destination] = pair.source;
        }
        if self.scramble {
            from = (0..n).collect();
        }
        let probe = pattern.probe().map(join_csv).unwrap_or_default();
        let outputs: Vec<String> = from.iter().map(|s| format!("$in_{s}")).collect();

        Ok(format!(
            r#"#!/bin/sh
if [ "$#" -ne 2 ] || [ "$1" != "{n}" ]; then
  echo "{{\"error\": \"must provide as many inputs as there are arguments ({n} vs $1 provided)\", \"code\": 1}}"
  exit 1
fi
values=$2
if [ "$values" = "-" ]; then values="{probe}"; fi
i=0
IFS=,
for v in $values; do eval "in_$i=$v"; i=$((i + 1)); done
echo "{{\"values\": [{outputs}], \"compute\": {n}, \"code\": 0}}"
"#,
            outputs = outputs.join(","),
        ))
    }
}

pub fn fake_registry() -> KernelRegistry {
    let mut registry = KernelRegistry::new();
    registry.register(ShellBackend {
        descriptor: SHELL_KERNEL,
        scramble: false,
    });
    registry.register(ShellBackend {
        descriptor: BackendDescriptor {
            name: "sh-scrambled",
            ..SHELL_KERNEL
        },
        scramble: true,
    });
    registry.register(ShellBackend {
        descriptor: FAILING_BUILD,
        scramble: false,
    });
    registry
}

pub fn fake_session() -> CompilerSession {
    let engine = GenerationEngine::new(fake_registry(), Arc::new(BlockSearch::new()));
    CompilerSession::new(engine, ProcessOptions::default())
}
