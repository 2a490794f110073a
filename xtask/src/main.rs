use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Palisade workspace automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cell benchmarks and report overhead vs unwrapped access
    Bench {
        /// Run quickly (lower sample size/time)
        #[arg(long, default_value_t = false)]
        quick: bool,

        /// Generate report only (skip running benchmarks)
        #[arg(long, default_value_t = false)]
        report_only: bool,
    },
}

/// Bench variants, in report column order. `plain_variable` is the
/// unwrapped baseline the others are compared against.
const VARIANTS: &[&str] = &[
    "plain_variable",
    "std_mutex",
    "concurrent_cell",
    "serialized_cell",
];

const BASELINE: &str = "plain_variable";

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Bench { quick, report_only } => {
            if !report_only {
                run_benchmarks(quick)?;
            }
            generate_report()?;
        }
    }

    Ok(())
}

fn run_benchmarks(quick: bool) -> Result<()> {
    println!("Running cell benchmarks...");
    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.env("CARGO_INCREMENTAL", "0");
    cmd.arg("bench").arg("--bench").arg("cell_benchmark");

    // Args for the test runner (Criterion) go after --
    cmd.arg("--");
    if quick {
        // Aggressive settings for CI to avoid timeouts
        cmd.arg("--measurement-time").arg("0.5");
        cmd.arg("--noplot");
        cmd.arg("--sample-size").arg("10");
    }

    let status = cmd.status().context("Failed to run cell_benchmark")?;
    if !status.success() {
        anyhow::bail!("Benchmark run failed");
    }
    println!("Finished in {:.2?}", start.elapsed());

    Ok(())
}

fn generate_report() -> Result<()> {
    println!("\n>>> Generating Report...");
    let mut results: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();

    let criterion_dir = Path::new("target/criterion");
    if !criterion_dir.exists() {
        eprintln!("No criterion output found at {}", criterion_dir.display());
        return Ok(());
    }

    collect_results(criterion_dir, &mut results);

    let report_path = Path::new("benchmark_results/report.md");
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }

    use std::io::Write;
    let mut file = fs::File::create(report_path)?;

    writeln!(file, "# Cell Overhead Report")?;
    writeln!(file)?;
    writeln!(
        file,
        "Throughput of each wrapped variant relative to unwrapped access."
    )?;
    writeln!(file)?;

    // Header
    write!(file, "| Workload |")?;
    for variant in VARIANTS {
        write!(file, " {variant} (Ops/s) | vs {BASELINE} |")?;
    }
    writeln!(file)?;

    // Separator
    write!(file, "|---|")?;
    for _ in VARIANTS {
        write!(file, "---|---|")?;
    }
    writeln!(file)?;

    // Rows
    for (workload, by_variant) in &results {
        write!(file, "| {workload} |")?;

        let baseline_ops = by_variant.get(BASELINE).copied().unwrap_or(0.0);

        for variant in VARIANTS {
            if let Some(ops) = by_variant.get(*variant) {
                let rel = if baseline_ops > 0.0 {
                    ops / baseline_ops
                } else {
                    0.0
                };

                let ops_str = if *ops > 1_000_000.0 {
                    format!("{:.2}M", ops / 1_000_000.0)
                } else if *ops > 1_000.0 {
                    format!("{:.2}K", ops / 1_000.0)
                } else {
                    format!("{ops:.0}")
                };

                write!(file, " {ops_str} | **{rel:.2}x** |")?;
            } else {
                write!(file, " N/A | - |")?;
            }
        }
        writeln!(file)?;
    }

    println!("Report written to {}", report_path.display());
    Ok(())
}

/// Walks `target/criterion` looking for `new/estimates.json` leaves.
/// Structure: `.../workload/variant/new/estimates.json`.
fn collect_results(dir: &Path, results: &mut BTreeMap<String, BTreeMap<String, f64>>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_results(&path, results);
            continue;
        }
        if path.file_name().and_then(|s| s.to_str()) != Some("estimates.json") {
            continue;
        }

        let Some(sample_dir) = path.parent() else { continue };
        if sample_dir.file_name().and_then(|s| s.to_str()) != Some("new") {
            continue;
        }
        let Some(variant_dir) = sample_dir.parent() else { continue };
        let Some(workload_dir) = variant_dir.parent() else { continue };

        let variant = match variant_dir.file_name().and_then(|s| s.to_str()) {
            Some(name) if VARIANTS.contains(&name) => name.to_string(),
            _ => continue,
        };
        let workload = match workload_dir.file_name().and_then(|s| s.to_str()) {
            Some("report") | None => continue,
            Some(name) => name.to_string(),
        };

        // Throughput elements, if the group declared them
        let mut elements = 1.0;
        let mut is_throughput = false;
        let bench_json = variant_dir.join("benchmark.json");
        if let Ok(content) = fs::read_to_string(&bench_json) {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
                if let Some(t) = json.get("throughput").and_then(|t| t.get("Elements")) {
                    elements = t.as_f64().unwrap_or(1.0);
                    is_throughput = true;
                }
            }
        }

        // Mean time per iteration
        if let Ok(content) = fs::read_to_string(&path) {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&content) {
                if let Some(mean) = json.get("mean").and_then(|m| m.get("point_estimate")) {
                    let time_ns = mean.as_f64().unwrap_or(0.0);
                    if time_ns > 0.0 {
                        let metric = if is_throughput {
                            (elements * 1e9) / time_ns
                        } else {
                            1e9 / time_ns
                        };

                        results.entry(workload).or_default().insert(variant, metric);
                    }
                }
            }
        }
    }
}
