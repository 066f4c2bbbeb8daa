//! Build orchestration: one compiler invocation per output, run
//! synchronously.

use crate::error::BuildError;
use crate::process::{run_captured, ProcessOptions};
use permforge_kernels::BackendDescriptor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Append the backend's OpenMP flags.
    pub openmp: bool,
    /// Emit an assembly listing before building the binary.
    pub emit_assembly: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub binary: PathBuf,
    pub assembly: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct Builder {
    process: ProcessOptions,
}

impl Builder {
    pub fn new(process: ProcessOptions) -> Self {
        Self { process }
    }

    /// Path of the assembly listing that accompanies `binary`.
    pub fn assembly_path(binary: &Path, descriptor: &BackendDescriptor) -> PathBuf {
        binary.with_extension(descriptor.assembly_extension)
    }

    pub fn build(
        &self,
        source: &Path,
        binary: &Path,
        descriptor: &BackendDescriptor,
        options: &BuildOptions,
    ) -> Result<BuildOutput, BuildError> {
        if let Some(parent) = binary.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| BuildError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let assembly = if options.emit_assembly {
            let listing = Self::assembly_path(binary, descriptor);
            let mut extra = output_args(&listing, descriptor, options);
            extra.push(descriptor.assembly_flag.to_string());
            self.invoke(descriptor, extra, source)?;
            Some(listing)
        } else {
            None
        };

        self.invoke(descriptor, output_args(binary, descriptor, options), source)?;
        info!(
            backend = descriptor.name,
            path = %binary.display(),
            assembly = assembly.is_some(),
            "built kernel"
        );
        Ok(BuildOutput {
            binary: binary.to_path_buf(),
            assembly,
        })
    }

    fn invoke(
        &self,
        descriptor: &BackendDescriptor,
        extra: Vec<String>,
        source: &Path,
    ) -> Result<(), BuildError> {
        let (program, prefix) =
            descriptor
                .compiler_prefix
                .split_first()
                .ok_or_else(|| BuildError::EmptyInvocation {
                    backend: descriptor.name.to_string(),
                })?;

        let mut args: Vec<String> = prefix.iter().map(|arg| arg.to_string()).collect();
        args.extend(extra);
        args.push(source.display().to_string());
        debug!(backend = descriptor.name, program, args = ?args, "invoking compiler");

        let output = run_captured(program, &args, &self.process)?;
        if !output.success() {
            return Err(BuildError::Failed {
                exit_code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

fn output_args(path: &Path, descriptor: &BackendDescriptor, options: &BuildOptions) -> Vec<String> {
    let mut args = vec!["-o".to_string(), path.display().to_string()];
    if options.openmp {
        args.extend(descriptor.openmp_flags.iter().map(|flag| flag.to_string()));
    }
    args
}
