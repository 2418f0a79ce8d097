use std::io::{self, Write};
use std::path::Path;

use crate::pipeline::{local_bounds, Normalization, RunReport};
use crate::types::Strategy;

/// Where the result sequence ended up
#[derive(Debug)]
pub enum SaveStatus<'a> {
    Saved(&'a Path),
    Failed { path: &'a Path, error: String },
}

/// Write the run summary to stdout
///
/// # Errors
///
/// Returns the stdout write error, e.g. on a closed pipe
pub fn print_report(report: &RunReport, save: &SaveStatus<'_>) -> io::Result<()> {
    write_report(&mut io::stdout().lock(), report, save)
}

pub fn write_report<W: Write>(out: &mut W, report: &RunReport, save: &SaveStatus<'_>) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "=== {} IMPLEMENTATION RESULTS ===", report.strategy)?;
    write_field(out, "Data size", format!("{} elements", report.len))?;

    match report.strategy {
        Strategy::Serial => {}
        Strategy::Threaded => write_field(out, "Number of threads", report.workers)?,
        Strategy::Distributed | Strategy::Mpi => write_field(out, "Number of workers", report.workers)?,
    }

    if report.bounds.is_identity() {
        write_field(out, "Global min", "n/a (no samples)")?;
        write_field(out, "Global max", "n/a (no samples)")?;
    } else {
        write_field(out, "Global min", format!("{:.6}", report.bounds.min))?;
        write_field(out, "Global max", format!("{:.6}", report.bounds.max))?;
    }

    if report.normalization == Normalization::Unchanged && report.len > 0 {
        write_field(out, "Normalization", "skipped, zero range")?;
    }

    write_field(out, "Execution time", format!("{:.6} seconds", report.elapsed.as_secs_f64()))?;
    write_field(out, "Throughput", format!("{:.2} elements/second", report.throughput()))?;

    if matches!(report.strategy, Strategy::Distributed | Strategy::Mpi) {
        write_field(out, "Gather time", format!("{:.6} seconds", report.gather_elapsed.as_secs_f64()))?;
    }

    match save {
        SaveStatus::Saved(path) => write_field(out, "Output saved to", path.display())?,
        SaveStatus::Failed { path, error } => {
            write_field(out, "Output NOT saved", format!("{} ({error})", path.display()))?;
        }
    }

    write_head(out, "First 5 normalized values", &report.head)
}

/// Summary of a sample file read back from disk
pub fn write_inspection<W: Write>(out: &mut W, path: &Path, samples: &[f32], head: usize) -> io::Result<()> {
    write_field(out, "File", path.display())?;
    write_field(out, "Samples", samples.len())?;

    let bounds = local_bounds(samples);
    if !bounds.is_identity() {
        write_field(out, "Min value", format!("{:.6}", bounds.min))?;
        write_field(out, "Max value", format!("{:.6}", bounds.max))?;
    }

    let shown = &samples[..head.min(samples.len())];
    write_head(out, &format!("First {head} values"), shown)
}

fn write_field<W: Write>(out: &mut W, name: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(out, "{name:20}: {value}")
}

fn write_head<W: Write>(out: &mut W, title: &str, values: &[f32]) -> io::Result<()> {
    if values.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "{title}:")?;
    for (i, v) in values.iter().enumerate() {
        writeln!(out, "  data[{i}] = {v:.6}")?;
    }
    Ok(())
}
