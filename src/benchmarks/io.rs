//! I/O utilities for benchmark results
//!
//! Results are written as pretty JSON, one file per target under `raw/`
//! plus one combined file per run, inside a configurable output directory.

use crate::benchmarks::BenchmarkResult;
use chrono::Utc;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Subdirectory holding one file per result
pub const RAW_SUBDIR: &str = "raw";

/// Write a single benchmark result to a specific directory
pub fn write_result_to_dir(result: &BenchmarkResult, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let filename = format!(
        "{}_{}.json",
        result.target_id.replace(['/', ':', ' '], "_"),
        result.timestamp.format("%Y%m%d_%H%M%S_%3f")
    );
    let path = dir.join(&filename);

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;

    Ok(path)
}

/// Write all results to a single combined JSON file in a specific directory
pub fn write_combined_results_to_dir(
    results: &[BenchmarkResult],
    dir: impl AsRef<Path>,
) -> std::io::Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let filename = format!("benchmark_results_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(&filename);

    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush()?;

    Ok(path)
}

/// Write every result to `<output_dir>/raw/` and a combined file to `<output_dir>`
pub fn save_results(results: &[BenchmarkResult], output_dir: impl AsRef<Path>) -> std::io::Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let raw_dir = output_dir.join(RAW_SUBDIR);

    let mut written = results
        .iter()
        .map(|result| write_result_to_dir(result, &raw_dir))
        .collect::<std::io::Result<Vec<_>>>()?;
    written.push(write_combined_results_to_dir(results, output_dir)?);

    tracing::info!(files = written.len(), dir = ?output_dir, "Benchmark results written");
    Ok(written)
}

/// Read a benchmark result from a JSON file
pub fn read_result(path: impl AsRef<Path>) -> std::io::Result<BenchmarkResult> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Read all benchmark results from a specific directory, newest first
pub fn read_all_results_from_dir(dir: impl AsRef<Path>) -> std::io::Result<Vec<BenchmarkResult>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut results = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            match read_result(&path) {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Skipping unreadable benchmark result");
                }
            }
        }
    }

    results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    Ok(results)
}
