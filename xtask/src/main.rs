use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "block-deque workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deque suite under every global allocator and write a report
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,

        /// Where the Markdown report goes
        #[arg(long, default_value = "benchmark_results/report.md")]
        output: PathBuf,
    },
}

const ALLOCATORS: &[&str] = &[
    "alloc-system",
    "alloc-mimalloc",
    "alloc-snmalloc",
    "alloc-jemalloc",
];

const CONTENDER: &str = "BlockDeque";
const REFERENCE: &str = "std::VecDeque";

/// `benchmark.json` as written by criterion.
#[derive(Debug, Deserialize)]
struct BenchmarkInfo {
    group_id: String,
    function_id: Option<String>,
    value_str: Option<String>,
    throughput: Option<Throughput>,
}

impl BenchmarkInfo {
    /// `function` or `function/parameter`, as criterion prints it.
    fn function_key(&self) -> String {
        let function = self.function_id.as_deref().unwrap_or_default();
        match &self.value_str {
            Some(value) => format!("{function}/{value}"),
            None => function.to_string(),
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
enum Throughput {
    Elements(u64),
    Bytes(u64),
    BytesDecimal(u64),
}

/// The part of `estimates.json` the report needs.
#[derive(Debug, Deserialize)]
struct Estimates {
    mean: Estimate,
}

#[derive(Debug, Deserialize)]
struct Estimate {
    point_estimate: f64,
}

/// group -> function -> allocator -> ops/s
type Results = BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench {
            quick,
            report_only,
            output,
        } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report(&output)?;
        }
    }

    Ok(())
}

fn baseline_name(feature: &str) -> String {
    feature.replace("alloc-", "")
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running deque benchmarks...");

    // Build first to avoid measuring build time
    println!("Compiling benchmarks...");
    let status = Command::new("cargo")
        .args(["build", "--bench", "suite", "--release"])
        .status()?;
    if !status.success() {
        anyhow::bail!("Failed to compile benchmarks");
    }

    for alloc in ALLOCATORS {
        println!("\n>>> Benchmarking with feature: {alloc}");
        let start = Instant::now();

        let mut cmd = Command::new("cargo");
        cmd.env("CARGO_INCREMENTAL", "0")
            .env("RUSTFLAGS", "-C opt-level=3 -C codegen-units=1");

        cmd.args(["bench", "--bench", "suite", "--no-default-features", "--features"])
            .arg(alloc);

        // Args for the test runner (Criterion) go after --
        cmd.arg("--");
        cmd.arg("--save-baseline").arg(baseline_name(alloc));

        if quick {
            cmd.args(["--measurement-time", "0.1", "--noplot", "--sample-size", "10"]);
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to run bench for {alloc}"))?;

        if status.success() {
            println!("Finished {alloc} in {:.2?}", start.elapsed());
        } else {
            eprintln!("Warning: Benchmark failed for {alloc}");
        }
    }

    Ok(())
}

fn generate_report(report_path: &Path) -> Result<()> {
    println!("\n>>> Generating Report...");

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    let mut results = Results::new();
    collect_results(criterion_dir, &mut results)?;

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(report_path)
        .with_context(|| format!("Failed to create {}", report_path.display()))?;

    writeln!(file, "# Deque Benchmark Report")?;
    writeln!(file)?;
    write_allocator_table(&mut file, &results)?;
    writeln!(file)?;
    write_contender_table(&mut file, &results)?;

    println!("Report written to {}", report_path.display());
    Ok(())
}

fn format_ops(ops: f64) -> String {
    if ops > 1_000_000.0 {
        format!("{:.2}M", ops / 1_000_000.0)
    } else if ops > 1_000.0 {
        format!("{:.2}K", ops / 1_000.0)
    } else {
        format!("{ops:.0}")
    }
}

/// One row per benchmark, one column pair per allocator.
fn write_allocator_table(file: &mut impl Write, results: &Results) -> Result<()> {
    writeln!(file, "## Throughput by allocator")?;
    writeln!(file)?;

    write!(file, "| Workload |")?;
    for alloc in ALLOCATORS {
        write!(file, " {} (Ops/s) | vs System |", baseline_name(alloc))?;
    }
    writeln!(file)?;

    write!(file, "|---|")?;
    for _ in ALLOCATORS {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    for (group, functions) in results {
        for (function, by_alloc) in functions {
            write!(file, "| {group} / {function} |")?;
            let system = by_alloc.get("system").copied().unwrap_or(0.0);
            for alloc in ALLOCATORS {
                match by_alloc.get(&baseline_name(alloc)) {
                    Some(&ops) => {
                        let rel = if system > 0.0 { ops / system } else { 0.0 };
                        write!(file, " {} | **{rel:.2}x** |", format_ops(ops))?;
                    }
                    None => write!(file, " N/A | - |")?,
                }
            }
            writeln!(file)?;
        }
    }
    Ok(())
}

/// `BlockDeque` against `VecDeque` for every group that measured both.
fn write_contender_table(file: &mut impl Write, results: &Results) -> Result<()> {
    writeln!(file, "## {CONTENDER} vs {REFERENCE}")?;
    writeln!(file)?;

    write!(file, "| Workload |")?;
    for alloc in ALLOCATORS {
        write!(file, " {} |", baseline_name(alloc))?;
    }
    writeln!(file)?;
    write!(file, "|---|")?;
    for _ in ALLOCATORS {
        write!(file, "---|")?;
    }
    writeln!(file)?;

    for (group, functions) in results {
        let (Some(ours), Some(theirs)) = (functions.get(CONTENDER), functions.get(REFERENCE)) else {
            continue;
        };
        write!(file, "| {group} |")?;
        for alloc in ALLOCATORS {
            let name = baseline_name(alloc);
            match (ours.get(&name), theirs.get(&name)) {
                (Some(&a), Some(&b)) if b > 0.0 => write!(file, " **{:.2}x** |", a / b)?,
                _ => write!(file, " - |")?,
            }
        }
        writeln!(file)?;
    }
    Ok(())
}

fn collect_results(dir: &Path, results: &mut Results) -> Result<()> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Ok(());
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results)?;
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }

        // Structure: .../<group>/<function>/<baseline>/estimates.json
        let Some(baseline_dir) = path.parent() else {
            continue;
        };
        let Some(baseline) = baseline_dir.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if baseline == "report" || baseline == "new" || baseline == "base" {
            continue;
        }

        let info_path = baseline_dir.join("benchmark.json");
        let Ok(info) = fs::read_to_string(&info_path) else {
            continue;
        };
        let info: BenchmarkInfo = serde_json::from_str(&info)
            .with_context(|| format!("Malformed {}", info_path.display()))?;
        let estimates: Estimates = serde_json::from_str(&fs::read_to_string(&path)?)
            .with_context(|| format!("Malformed {}", path.display()))?;

        let time_ns = estimates.mean.point_estimate;
        if time_ns <= 0.0 {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        let metric = match info.throughput {
            Some(Throughput::Elements(n)) => (n as f64 * 1e9) / time_ns,
            Some(Throughput::Bytes(_) | Throughput::BytesDecimal(_)) | None => 1e9 / time_ns,
        };

        let function = info.function_key();
        results
            .entry(info.group_id)
            .or_default()
            .entry(function)
            .or_default()
            .insert(baseline.to_string(), metric);
    }
    Ok(())
}
