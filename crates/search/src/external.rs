//! Adapter for the external permutation search tool.
//!
//! Invocation shapes (after the configured fixed arguments):
//! `-p <csv> --arch <hint> simplec` prints a C fragment and
//! `-l <len> randpat` prints a random permutation.

use crate::error::SearchError;
use crate::SearchTool;
use permforge_kernels::TargetFamily;
use permforge_patterns::{join_csv, Pattern};
use permforge_runtime::{run_captured, ProcessOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchCommand {
    pub program: String,
    /// Arguments placed before the mode arguments, e.g. a cargo manifest.
    pub args: Vec<String>,
}

impl Default for SearchCommand {
    fn default() -> Self {
        Self {
            program: "bruteforcer".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExternalSearch {
    command: SearchCommand,
    process: ProcessOptions,
}

impl ExternalSearch {
    pub fn new(command: SearchCommand, process: ProcessOptions) -> Self {
        Self { command, process }
    }

    pub fn command(&self) -> &SearchCommand {
        &self.command
    }

    pub fn random_pattern(&self, arg_count: usize) -> Result<Pattern, SearchError> {
        let stdout = self.invoke(&["-l".to_string(), arg_count.to_string(), "randpat".to_string()])?;
        let text = stdout.trim();
        let pattern: Pattern = text.parse().map_err(|source| SearchError::RandomPattern {
            output: text.to_string(),
            source,
        })?;
        if pattern.arg_count() != arg_count {
            return Err(SearchError::RandomLength {
                expected: arg_count,
                found: pattern.arg_count(),
            });
        }
        info!(arg_count, pattern = %pattern, "search tool produced random pattern");
        Ok(pattern)
    }

    fn invoke(&self, mode: &[String]) -> Result<String, SearchError> {
        let mut args = self.command.args.clone();
        args.extend_from_slice(mode);
        debug!(program = %self.command.program, args = ?args, "invoking search tool");

        let output = run_captured(&self.command.program, &args, &self.process)?;
        if !output.success() {
            return Err(SearchError::Failed {
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

impl SearchTool for ExternalSearch {
    fn name(&self) -> &str {
        &self.command.program
    }

    fn search(&self, pattern: &Pattern, family: TargetFamily) -> Result<String, SearchError> {
        let csv = join_csv(pattern.destinations());
        let fragment = self.invoke(&[
            "-p".to_string(),
            csv.clone(),
            "--arch".to_string(),
            family.hint().to_string(),
            "simplec".to_string(),
        ])?;
        if fragment.trim().is_empty() {
            return Err(SearchError::EmptyFragment { pattern: csv });
        }
        Ok(fragment)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use permforge_patterns::make_pattern;

    fn shell(script: &str) -> ExternalSearch {
        ExternalSearch::new(
            SearchCommand {
                program: "sh".to_string(),
                args: vec!["-c".to_string(), script.to_string(), "search".to_string()],
            },
            ProcessOptions::default(),
        )
    }

    #[test]
    fn passes_pattern_and_arch_hint() {
        // Echo the arguments back as a C comment.
        let tool = shell("echo \"/* $* */\"");
        let pattern = make_pattern(&[1, 0, 2]).unwrap();
        let fragment = tool.search(&pattern, TargetFamily::Neon).unwrap();
        assert_eq!(fragment, "/* -p 1,0,2 --arch arm simplec */\n");
    }

    #[test]
    fn non_zero_exit_surfaces_stderr() {
        let tool = shell("echo 'no solution' >&2; exit 2");
        let pattern = make_pattern(&[0]).unwrap();
        match tool.search(&pattern, TargetFamily::Avx2).unwrap_err() {
            SearchError::Failed { code, stderr } => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "no solution\n");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn empty_output_is_rejected() {
        let tool = shell("true");
        let pattern = make_pattern(&[0]).unwrap();
        assert!(matches!(
            tool.search(&pattern, TargetFamily::Avx2),
            Err(SearchError::EmptyFragment { .. })
        ));
    }

    #[test]
    fn random_pattern_is_parsed_and_checked() {
        let tool = shell("echo 3,1,0,2");
        let pattern = tool.random_pattern(4).unwrap();
        assert_eq!(pattern.destinations(), &[3, 1, 0, 2]);

        assert!(matches!(
            tool.random_pattern(5),
            Err(SearchError::RandomLength {
                expected: 5,
                found: 4
            })
        ));
        assert!(matches!(
            shell("echo 0,0").random_pattern(2),
            Err(SearchError::RandomPattern { .. })
        ));
    }
}
