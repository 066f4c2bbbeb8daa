//! Execution protocol adapter: `[binary, count, values]` in, decoded result
//! out.

use crate::error::ExecutionError;
use crate::process::{run_captured, ProcessOptions};
use crate::protocol::KernelResponse;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Value-list argument that selects the probe values baked into a kernel.
pub const BAKED_PROBE_ARG: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub values: Vec<i64>,
    /// Backend-defined cost figure, not normalized across backends.
    pub compute: f64,
    pub code: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Executor {
    process: ProcessOptions,
}

impl Executor {
    pub fn new(process: ProcessOptions) -> Self {
        Self { process }
    }

    /// Run the kernel on `values`; the element count sent is `values.len()`.
    pub fn execute(&self, binary: &Path, values: &[i64]) -> Result<ExecutionResult, ExecutionError> {
        let csv = values
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.execute_raw(binary, values.len(), &csv)
    }

    /// Run the kernel on the probe values compiled into it.
    pub fn execute_baked(
        &self,
        binary: &Path,
        arg_count: usize,
    ) -> Result<ExecutionResult, ExecutionError> {
        self.execute_raw(binary, arg_count, BAKED_PROBE_ARG)
    }

    pub fn execute_raw(
        &self,
        binary: &Path,
        count: usize,
        values: &str,
    ) -> Result<ExecutionResult, ExecutionError> {
        let program = launch_path(binary).display().to_string();
        let count_arg = count.to_string();
        let output = run_captured(&program, &[count_arg.as_str(), values], &self.process)?;
        debug!(path = %program, code = ?output.code, "kernel finished");

        match KernelResponse::decode(&output.stdout) {
            Ok(KernelResponse::Err { message, code }) => Err(ExecutionError::Kernel {
                message,
                code,
                stderr: output.stderr,
            }),
            Ok(KernelResponse::Ok { .. }) | Err(_) if !output.success() => {
                Err(ExecutionError::Exit {
                    exit_code: output.code,
                    stderr: output.stderr,
                })
            }
            Ok(KernelResponse::Ok { values, compute }) => {
                if values.len() != count {
                    return Err(ExecutionError::LengthMismatch {
                        expected: count,
                        found: values.len(),
                    });
                }
                Ok(ExecutionResult {
                    values,
                    compute,
                    code: 0,
                })
            }
            Err(err) => Err(ExecutionError::Decode {
                reason: err.to_string(),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }
}

/// Path handed to the OS for a kernel binary. A bare file name is anchored to
/// the working directory, otherwise process spawning would search `PATH`.
pub fn launch_path(binary: &Path) -> PathBuf {
    match binary.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(binary),
        _ => binary.to_path_buf(),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn fake_kernel(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    // Swaps two values, rejecting any count other than 2.
    const SWAP_KERNEL: &str = r#"if [ "$1" != "2" ]; then
  echo "{\"error\": \"must provide as many inputs as there are arguments (2 vs $1 provided)\", \"code\": 1}"
  exit 1
fi
if [ "$2" = "-" ]; then set -- "$1" "7,9"; fi
a=${2%%,*}; b=${2##*,}
echo "{\"values\": [$b,$a], \"compute\": 42, \"code\": 0}""#;

    #[test]
    fn bare_names_are_anchored_to_the_working_directory() {
        assert_eq!(launch_path(Path::new("prog")), Path::new("./prog"));
        assert_eq!(launch_path(Path::new("./prog")), Path::new("./prog"));
        assert_eq!(launch_path(Path::new("out/prog")), Path::new("out/prog"));
        assert_eq!(launch_path(Path::new("/tmp/prog")), Path::new("/tmp/prog"));
    }

    #[test]
    fn decodes_successful_run() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(dir.path(), "swap", SWAP_KERNEL)?;
        let result = Executor::default().execute(&kernel, &[7, 9])?;
        assert_eq!(result.values, vec![9, 7]);
        assert_eq!(result.compute, 42.0);
        assert_eq!(result.code, 0);
        Ok(())
    }

    #[test]
    fn baked_probe_argument() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(dir.path(), "swap", SWAP_KERNEL)?;
        let result = Executor::default().execute_baked(&kernel, 2)?;
        assert_eq!(result.values, vec![9, 7]);
        Ok(())
    }

    #[test]
    fn count_mismatch_is_a_kernel_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(dir.path(), "swap", SWAP_KERNEL)?;
        let err = Executor::default().execute(&kernel, &[1, 2, 3]).unwrap_err();
        match err {
            ExecutionError::Kernel { code, message, .. } => {
                assert_eq!(code, 1);
                assert!(message.contains("2 vs 3"));
            }
            other => panic!("unexpected error {other}"),
        }
        Ok(())
    }

    #[test]
    fn crash_keeps_stderr() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(dir.path(), "crash", "echo 'bad access' >&2\nexit 139")?;
        let err = Executor::default().execute(&kernel, &[1]).unwrap_err();
        assert!(matches!(err, ExecutionError::Exit { exit_code: Some(139), .. }));
        assert_eq!(err.stderr(), Some("bad access\n"));
        Ok(())
    }

    #[test]
    fn garbage_stdout_is_a_decode_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(dir.path(), "noise", "echo hello")?;
        let err = Executor::default().execute(&kernel, &[1]).unwrap_err();
        assert!(matches!(err, ExecutionError::Decode { .. }));
        Ok(())
    }

    #[test]
    fn short_output_is_a_length_mismatch() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let kernel = fake_kernel(
            dir.path(),
            "short",
            r#"echo '{"values": [1], "compute": 0, "code": 0}'"#,
        )?;
        let err = Executor::default().execute(&kernel, &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ExecutionError::LengthMismatch {
                expected: 2,
                found: 1
            }
        ));
        Ok(())
    }
}
