//! CLI wiring for PermForge.

use crate::bench::BenchmarkHarness;
use crate::config::{BenchmarkConfig, CorrectnessConfig, ToolConfig};
use crate::correctness::{CaseOutcome, CorrectnessHarness};
use crate::session::CompilerSession;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fastrand::Rng;
use permforge_kernels::global_registry;
use permforge_patterns::{identity_probe, parse_csv, random_pattern, Pattern, PatternCatalog, StructuredSpec};
use permforge_runtime::BuildOptions;
use permforge_search::{BlockSearch, ExternalSearch};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "permforge", about = "Permutation kernel generator and benchmark harness")]
pub struct Cli {
    /// JSON tool configuration (search command, timeout, work directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How SIMD backends select their permute instructions.
    #[arg(long, value_enum, default_value = "block", global = true)]
    pub search: SearchArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchArg {
    /// In-process block planner.
    Block,
    /// The configured external search tool.
    External,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternSource {
    Local,
    External,
}

#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Also write an assembly listing next to the binary.
    #[arg(long, default_value_t = false)]
    pub asm: bool,
    #[arg(long, default_value_t = false)]
    pub openmp: bool,
}

impl From<&BuildArgs> for BuildOptions {
    fn from(args: &BuildArgs) -> Self {
        BuildOptions {
            openmp: args.openmp,
            emit_assembly: args.asm,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct CatalogArgs {
    /// Load patterns from a catalog file instead of generating them.
    #[arg(long)]
    pub catalog: Option<PathBuf>,
    #[arg(long, value_delimiter = ',', default_values_t = [8usize, 16, 32, 64])]
    pub arg_counts: Vec<usize>,
    #[arg(long, default_value_t = 3)]
    pub per_count: usize,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Use the built-in smoke catalog.
    #[arg(long, default_value_t = false, conflicts_with = "catalog")]
    pub smoke: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate and build a kernel for one pattern (`1,0,2` or `1,0,2;7,8,9`).
    Generate {
        #[arg(long, short)]
        pattern: String,
        #[arg(long, short = 't', default_value = "scalar")]
        backend: String,
        /// Binary output path; the source is written next to it.
        #[arg(long, default_value = "./prog")]
        bin_output: PathBuf,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Generate and build a kernel for a random pattern.
    Genrand {
        #[arg(long, default_value_t = 1000)]
        arg_count: usize,
        #[arg(long, short = 't', default_value = "scalar")]
        backend: String,
        #[arg(long, default_value = "./prog")]
        bin_output: PathBuf,
        #[arg(long, value_enum, default_value = "local")]
        source: PatternSource,
        #[arg(long)]
        seed: Option<u64>,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Execute a built kernel and print its decoded result.
    Run {
        #[arg(long, default_value = "./prog")]
        input: PathBuf,
        /// Comma-separated values; omit to use probe values baked into the kernel.
        #[arg(long, required_unless_present = "baked")]
        values: Option<String>,
        /// Element count of a kernel with baked probe values.
        #[arg(long)]
        baked: Option<usize>,
    },
    /// Execute a kernel repeatedly on the identity input, printing compute figures.
    Runrand {
        #[arg(long, default_value = "./prog")]
        input: PathBuf,
        #[arg(long)]
        arg_count: usize,
        #[arg(long = "iter", default_value_t = 25)]
        iterations: usize,
    },
    /// Benchmark backends over a pattern catalog and write the results as CSV.
    Runbench {
        #[arg(long, value_delimiter = ',', default_value = "scalar")]
        backends: Vec<String>,
        #[command(flatten)]
        patterns: CatalogArgs,
        #[arg(long, default_value_t = 500)]
        iterations: usize,
        #[arg(long, default_value_t = 0)]
        warmup: usize,
        #[arg(long, default_value = "results.csv")]
        output: PathBuf,
        /// Also write per-pattern min/mean/max as JSON.
        #[arg(long)]
        summary: Option<PathBuf>,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Check every backend against independently computed expectations.
    Runtests {
        #[arg(long, value_delimiter = ',', default_value = "scalar")]
        backends: Vec<String>,
        /// Catalog file; defaults to the built-in smoke catalog.
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// List registered backends.
    Backends,
    /// Write a pattern catalog file.
    Catalog {
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        patterns: CatalogArgs,
        /// Structured specs as `pool:runs_of_eight:runs_of_four`.
        #[arg(long)]
        structured: Vec<String>,
    },
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let Cli {
        config,
        search,
        command,
    } = cli;
    let config = match config {
        Some(path) => ToolConfig::load_from_file(&path)?,
        None => ToolConfig::default(),
    };
    let session = match search {
        SearchArg::Block => CompilerSession::from_config(&config, Arc::new(BlockSearch::new())),
        SearchArg::External => CompilerSession::with_external_search(&config),
    };

    match command {
        Command::Generate {
            pattern,
            backend,
            bin_output,
            build,
        } => {
            let pattern: Pattern = pattern.parse()?;
            generate_and_build(&session, &pattern, &backend, &bin_output, &build)?;
        }
        Command::Genrand {
            arg_count,
            backend,
            bin_output,
            source,
            seed,
            build,
        } => {
            let pattern = match source {
                PatternSource::Local => random_pattern(&mut seeded(seed), arg_count)?,
                PatternSource::External => {
                    ExternalSearch::new(config.search.clone(), config.process_options())
                        .random_pattern(arg_count)?
                }
            };
            println!("pattern: {}", pattern);
            generate_and_build(&session, &pattern, &backend, &bin_output, &build)?;
        }
        Command::Run {
            input,
            values,
            baked,
        } => {
            let result = match (values, baked) {
                (Some(values), _) => session.execute(&input, &parse_csv::<i64>(&values)?)?,
                (None, Some(arg_count)) => session.execute_baked(&input, arg_count)?,
                (None, None) => bail!("either --values or --baked is required"),
            };
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Runrand {
            input,
            arg_count,
            iterations,
        } => {
            let probe = identity_probe(arg_count);
            let mut computes = Vec::with_capacity(iterations);
            for _ in 0..iterations {
                computes.push(session.execute(&input, &probe)?.compute);
            }
            println!("{}", serde_json::to_string(&computes)?);
        }
        Command::Runbench {
            backends,
            patterns,
            iterations,
            warmup,
            output,
            summary,
            build,
        } => {
            let catalog = load_catalog(&patterns)?;
            let bench = BenchmarkConfig {
                backends,
                iterations,
                warmup_runs: warmup,
                work_dir: config.work_dir.join("bench"),
                build: BuildOptions::from(&build),
            };
            let outcome = BenchmarkHarness::new(&session, &bench).run(&catalog);
            outcome.table.write_csv(&output)?;
            info!(path = %output.display(), records = outcome.table.len(), "wrote benchmark table");

            if let Some(path) = summary {
                std::fs::write(&path, serde_json::to_vec_pretty(&outcome.table.summaries())?)?;
            }
            for failure in &outcome.failures {
                eprintln!(
                    "{} arg_count={} pattern={}: {:?}: {}",
                    failure.backend, failure.arg_count, failure.pattern_number, failure.kind, failure.message
                );
            }
        }
        Command::Runtests {
            backends,
            catalog,
            report,
            build,
        } => {
            let catalog = match catalog {
                Some(path) => PatternCatalog::load_from_file(&path)?,
                None => PatternCatalog::smoke()?,
            };
            let tests = CorrectnessConfig {
                backends,
                work_dir: config.work_dir.join("tests"),
                build: BuildOptions::from(&build),
            };
            let results = CorrectnessHarness::new(&session, &tests).run(&catalog);
            for case in &results.cases {
                let name = format!("{}_{}_{}", case.backend, case.arg_count, case.pattern_number);
                match &case.outcome {
                    CaseOutcome::Passed => println!("test {name} passed"),
                    CaseOutcome::Mismatch { mismatches } => {
                        println!("test {name} failed, {} positions differ", mismatches.len())
                    }
                    CaseOutcome::Failed { failure } => {
                        println!("test {name} failed, {:?}: {}", failure.kind, failure.message)
                    }
                }
            }
            if let Some(path) = report {
                results.save_to_file(&path)?;
            }
            if !results.all_passed() {
                bail!(
                    "{} mismatched and {} failed of {} cases",
                    results.mismatched,
                    results.failed,
                    results.cases.len()
                );
            }
        }
        Command::Backends => {
            for backend in global_registry().backends() {
                let d = backend.descriptor();
                println!(
                    "{:<10} aliases=[{}] compiler=\"{}\" output={} element={:?} compute={:?}",
                    d.name,
                    d.aliases.join(","),
                    d.compiler_prefix.join(" "),
                    d.program_output,
                    d.element,
                    d.compute_unit
                );
            }
        }
        Command::Catalog {
            output,
            patterns,
            structured,
        } => {
            let mut catalog = load_catalog(&patterns)?;
            if !structured.is_empty() {
                let specs = structured
                    .iter()
                    .map(|text| parse_structured(text))
                    .collect::<Result<Vec<_>>>()?;
                let extra = PatternCatalog::structured(&mut seeded(patterns.seed), &specs, patterns.per_count)?;
                for entry in extra.entries() {
                    catalog.insert(entry.pattern.clone());
                }
            }
            catalog.save_to_file(&output)?;
            info!(path = %output.display(), patterns = catalog.len(), "wrote catalog");
        }
    }
    Ok(())
}

fn generate_and_build(
    session: &CompilerSession,
    pattern: &Pattern,
    backend: &str,
    bin_output: &Path,
    build: &BuildArgs,
) -> Result<()> {
    let out_dir = bin_output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let source = session.generate(pattern, backend, out_dir)?;
    let assembly = session.build(&source, bin_output, backend, &BuildOptions::from(build))?;
    println!("source: {}", source.display());
    println!("binary: {}", bin_output.display());
    if let Some(listing) = assembly {
        println!("assembly: {}", listing.display());
    }
    Ok(())
}

fn seeded(seed: Option<u64>) -> Rng {
    seed.map(Rng::with_seed).unwrap_or_default()
}

fn load_catalog(args: &CatalogArgs) -> Result<PatternCatalog> {
    if args.smoke {
        return PatternCatalog::smoke();
    }
    match &args.catalog {
        Some(path) => PatternCatalog::load_from_file(path),
        None => PatternCatalog::generate(&mut seeded(args.seed), &args.arg_counts, args.per_count),
    }
}

fn parse_structured(text: &str) -> Result<StructuredSpec> {
    let parts: Vec<usize> = text
        .split(':')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid structured spec `{text}`"))?;
    match parts.as_slice() {
        &[pool, eights, fours] => Ok(StructuredSpec::new(pool, eights, fours)),
        _ => bail!("structured spec `{text}` must be pool:runs_of_eight:runs_of_four"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_specs() {
        assert_eq!(parse_structured("128:3:4").unwrap(), StructuredSpec::new(128, 3, 4));
        assert!(parse_structured("128:3").is_err());
        assert!(parse_structured("a:b:c").is_err());
    }

    #[test]
    fn cli_parses_benchmark_flags() {
        let cli = Cli::parse_from([
            "permforge",
            "--search",
            "external",
            "runbench",
            "--backends",
            "scalar,simd2",
            "--arg-counts",
            "8,16",
            "--seed",
            "4",
            "--openmp",
        ]);
        assert_eq!(cli.search, SearchArg::External);
        match cli.command {
            Command::Runbench {
                backends,
                patterns,
                iterations,
                build,
                ..
            } => {
                assert_eq!(backends, vec!["scalar", "simd2"]);
                assert_eq!(patterns.arg_counts, vec![8, 16]);
                assert_eq!(patterns.seed, Some(4));
                assert_eq!(iterations, 500);
                assert!(build.openmp);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_requires_values_or_baked() {
        assert!(Cli::try_parse_from(["permforge", "run", "--input", "k"]).is_err());
        assert!(Cli::try_parse_from(["permforge", "run", "--baked", "4"]).is_ok());
    }

    #[test]
    fn default_kernel_paths_point_at_the_working_directory() {
        match Cli::parse_from(["permforge", "generate", "-p", "1,0"]).command {
            Command::Generate { bin_output, .. } => assert_eq!(bin_output, PathBuf::from("./prog")),
            other => panic!("unexpected command {other:?}"),
        }
        match Cli::parse_from(["permforge", "runrand", "--arg-count", "4"]).command {
            Command::Runrand { input, .. } => assert_eq!(input, PathBuf::from("./prog")),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
