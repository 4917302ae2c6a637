// mod.rs - Output writers module

use crate::core::{
    MarginalMode, MarginalSummary, ReweightSummary, SampleSizeSummary, Statistics,
};
use crate::data::LoadReport;
use crate::error::{PrepError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Ensure parent directory exists before creating file
fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                PrepError::io(format!("creating parent directory '{}'", parent.display()), e)
            })?;
        }
    }
    Ok(())
}

fn create(file_path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dir(file_path)?;
    let file = File::create(file_path).map_err(|e| {
        PrepError::io(format!("creating output file '{}'", file_path.display()), e)
    })?;
    Ok(BufWriter::new(file))
}

/// Comment header shared by the TSV writers
fn write_header<W: Write>(writer: &mut W, command_line: &str, file_path: &Path) -> Result<()> {
    let context = || format!("writing header of '{}'", file_path.display());
    writeln!(writer, "# Command: {}", command_line).map_err(|e| PrepError::io(context(), e))?;
    writeln!(
        writer,
        "# Generated: {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .map_err(|e| PrepError::io(context(), e))?;
    writeln!(writer, "# potts-prep v{}", env!("CARGO_PKG_VERSION"))
        .map_err(|e| PrepError::io(context(), e))?;
    Ok(())
}

fn tsv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer)
}

/// Write one `name<TAB>weight` line per retained sequence
pub fn write_weights(file_path: &Path, stats: &Statistics, command_line: &str) -> Result<()> {
    let mut writer = create(file_path)?;
    write_header(&mut writer, command_line, file_path)?;

    let context = || format!("writing weights to '{}'", file_path.display());
    let mut tsv = tsv_writer(writer);
    tsv.write_record(["name", "weight"])
        .map_err(|e| PrepError::csv(context(), e))?;
    let alignment = &stats.alignment;
    for (name, weight) in alignment.names().iter().zip(alignment.weights()) {
        let weight = format!("{:.6}", weight);
        tsv.write_record([name.as_str(), weight.as_str()])
            .map_err(|e| PrepError::csv(context(), e))?;
    }
    tsv.flush().map_err(|e| PrepError::io(context(), e))?;
    Ok(())
}

/// Write single-site marginals, one line per site and state.
///
/// Columns: 1-based site, original position, symbol, frequency; gap-reduced
/// output adds the gap frequency of the site.
pub fn write_marginals(file_path: &Path, stats: &Statistics, command_line: &str) -> Result<()> {
    let alignment = &stats.alignment;
    let marginals = alignment.marginals().ok_or_else(|| {
        PrepError::config("marginals must be counted before they are written")
    })?;

    let mut writer = create(file_path)?;
    write_header(&mut writer, command_line, file_path)?;

    let context = || format!("writing marginals to '{}'", file_path.display());
    let mut tsv = tsv_writer(writer);
    let gap_reduced = marginals.mode == MarginalMode::GapReduced;
    let mut columns = vec!["site", "offset", "symbol", "fi"];
    if gap_reduced {
        columns.push("gap");
    }
    tsv.write_record(&columns)
        .map_err(|e| PrepError::csv(context(), e))?;

    // Gap-reduced states skip the gap symbol at index 0
    let shift = usize::from(gap_reduced);
    for i in 0..alignment.n_sites() {
        let site = (i + 1).to_string();
        let offset = alignment
            .offsets()
            .map_or(i + 1, |offsets| offsets[i])
            .to_string();
        let gap = marginals.gapi(i).map(|g| format!("{:.6}", g));
        for (a, fi) in marginals.fi_row(i).iter().enumerate() {
            let symbol = alignment.alphabet().letter((a + shift) as u8).to_string();
            let fi = format!("{:.6}", fi);
            let mut record = vec![site.as_str(), offset.as_str(), symbol.as_str(), fi.as_str()];
            if let Some(ref gap) = gap {
                record.push(gap.as_str());
            }
            tsv.write_record(&record)
                .map_err(|e| PrepError::csv(context(), e))?;
        }
    }
    tsv.flush().map_err(|e| PrepError::io(context(), e))?;
    Ok(())
}

/// Machine-readable record of a run
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub version: &'static str,
    pub generated: DateTime<Utc>,
    pub command: &'a str,
    pub alphabet: String,
    pub n_seqs: usize,
    pub n_sites: usize,
    pub n_codes: usize,
    pub model_codes: usize,
    pub theta: f64,
    pub scale: f64,
    pub gap_reduce: bool,
    pub n_eff: f64,
    pub load: &'a LoadReport,
    pub reweight: &'a ReweightSummary,
    pub marginals: &'a MarginalSummary,
    pub sample_size: Option<&'a SampleSizeSummary>,
    pub offsets: Option<&'a [usize]>,
}

impl<'a> RunSummary<'a> {
    pub fn new(stats: &'a Statistics, command_line: &'a str) -> Self {
        let alignment = &stats.alignment;
        Self {
            version: env!("CARGO_PKG_VERSION"),
            generated: Utc::now(),
            command: command_line,
            alphabet: alignment.alphabet().to_string(),
            n_seqs: alignment.n_seqs(),
            n_sites: alignment.n_sites(),
            n_codes: alignment.n_codes(),
            model_codes: alignment.model_codes(),
            theta: stats.theta,
            scale: stats.scale,
            gap_reduce: stats.gap_reduce,
            n_eff: alignment.n_eff(),
            load: &stats.load_report,
            reweight: &stats.reweight,
            marginals: &stats.marginals,
            sample_size: stats.sample_size.as_ref(),
            offsets: alignment.offsets(),
        }
    }
}

/// Write the run summary as pretty-printed JSON
pub fn write_summary(file_path: &Path, stats: &Statistics, command_line: &str) -> Result<()> {
    let mut writer = create(file_path)?;
    let summary = RunSummary::new(stats, command_line);
    serde_json::to_writer_pretty(&mut writer, &summary).map_err(|e| {
        PrepError::json(format!("writing summary to '{}'", file_path.display()), e)
    })?;
    writeln!(writer).map_err(|e| {
        PrepError::io(format!("writing summary to '{}'", file_path.display()), e)
    })?;
    writer
        .flush()
        .map_err(|e| PrepError::io(format!("flushing '{}'", file_path.display()), e))?;
    Ok(())
}
