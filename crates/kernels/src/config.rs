//! Backend descriptors and the enums that classify them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction family a SIMD backend asks the search tool to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetFamily {
    Avx2,
    Neon,
}

impl TargetFamily {
    /// Architecture hint passed to the external search tool.
    pub fn hint(&self) -> &'static str {
        match self {
            TargetFamily::Avx2 => "amd64",
            TargetFamily::Neon => "arm",
        }
    }

    /// Widest block of `f32` lanes one instruction can permute.
    pub fn max_lanes(&self) -> usize {
        match self {
            TargetFamily::Avx2 => 8,
            TargetFamily::Neon => 4,
        }
    }
}

impl fmt::Display for TargetFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hint())
    }
}

impl FromStr for TargetFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "amd64" | "x86_64" | "avx2" => Ok(TargetFamily::Avx2),
            "arm" | "arm64" | "aarch64" | "neon" => Ok(TargetFamily::Neon),
            other => Err(format!("unknown target family: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "family", rename_all = "kebab-case")]
pub enum BackendKind {
    Scalar,
    Simd(TargetFamily),
    Gpu,
}

/// Element type the generated kernel parses its input into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Int,
    Float,
}

impl ElementType {
    pub fn c_name(&self) -> &'static str {
        match self {
            ElementType::Int => "int",
            ElementType::Float => "float",
        }
    }
}

/// What the `compute` figure reported by a kernel measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComputeUnit {
    ClockTicks,
    Nanoseconds,
}

/// Static description of one backend: how it is compiled and where its
/// generated source lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: BackendKind,
    pub compiler_prefix: &'static [&'static str],
    pub program_output: &'static str,
    pub openmp_flags: &'static [&'static str],
    pub assembly_flag: &'static str,
    pub assembly_extension: &'static str,
    pub element: ElementType,
    pub compute_unit: ComputeUnit,
}

impl BackendDescriptor {
    pub fn compiler(&self) -> Option<&'static str> {
        self.compiler_prefix.first().copied()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(&name)
    }
}
