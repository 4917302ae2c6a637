// loader.rs - FASTA alignment loading with focus-mode row/column reduction

use crate::data::alignment::Alignment;
use crate::data::alphabet::{Alphabet, Symbol};
use crate::error::{PrepError, Result};
use bio::io::fasta;
use regex::Regex;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Options controlling how raw records become an [`Alignment`]
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    pub alphabet: Alphabet,
    /// Name prefix of the focus sequence
    pub focus: Option<String>,
    /// Gap-reduced marginals will be used: drop focus gap columns for any alphabet
    pub gap_reduce: bool,
}

/// Diagnostic counts gathered while loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_seqs: usize,
    pub valid_seqs: usize,
    pub total_sites: usize,
    pub valid_sites: usize,
    /// Full name of the focus sequence, if one was selected
    pub focus: Option<String>,
    /// Region start parsed from the focus name (`NAME/START-END`)
    pub region_start: Option<usize>,
}

/// Reads alignments and applies the row/column filters
#[derive(Debug, Clone, Default)]
pub struct AlignmentLoader {
    options: LoaderOptions,
}

impl AlignmentLoader {
    pub fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load a FASTA alignment file
    pub fn load_file(&self, path: &Path) -> Result<(Alignment, LoadReport)> {
        let file = File::open(path).map_err(|e| {
            PrepError::io(format!("opening alignment {}", path.display()), e)
        })?;
        self.load(BufReader::new(file))
    }

    /// Load a FASTA alignment from any reader
    pub fn load<R: Read>(&self, reader: R) -> Result<(Alignment, LoadReport)> {
        let mut records = Vec::new();
        for record_result in fasta::Reader::new(reader).records() {
            let record = record_result
                .map_err(|e| PrepError::format(format!("invalid FASTA record: {}", e)))?;
            let name = match record.desc() {
                Some(desc) => format!("{} {}", record.id(), desc),
                None => record.id().to_string(),
            };
            records.push((name, record.seq().to_vec()));
        }
        self.from_records(records)
    }

    /// Encode and filter `(name, raw sequence)` records
    pub fn from_records(&self, records: Vec<(String, Vec<u8>)>) -> Result<(Alignment, LoadReport)> {
        let alphabet = &self.options.alphabet;

        let total_sites = match records.first() {
            Some((_, seq)) => seq.len(),
            None => return Err(PrepError::format("alignment contains no sequences")),
        };
        for (name, seq) in &records {
            if seq.len() != total_sites {
                return Err(PrepError::format(format!(
                    "incompatible sequence length ({} should be {}) for {}",
                    seq.len(),
                    total_sites,
                    name
                )));
            }
        }
        let total_seqs = records.len();

        let mut names = Vec::with_capacity(total_seqs);
        let mut encoded: Vec<Vec<Symbol>> = Vec::with_capacity(total_seqs);
        for (name, seq) in records {
            encoded.push(seq.iter().map(|&c| alphabet.encode(c)).collect());
            names.push(name);
        }

        // Focus search runs over every row, valid or not
        let mut target = self
            .options
            .focus
            .as_deref()
            .and_then(|prefix| find_focus(&names, prefix));

        // Rows with out-of-alphabet characters are always discarded
        let seq_valid: Vec<bool> = encoded
            .iter()
            .map(|row| row.iter().all(Symbol::is_valid))
            .collect();
        let valid_seqs = seq_valid.iter().filter(|&&v| v).count();
        info!("{} valid sequences out of {}", valid_seqs, total_seqs);

        if let Some(t) = target {
            if !seq_valid[t] {
                warn!(
                    "focus sequence {} contains out-of-alphabet characters, proceeding without focus",
                    names[t]
                );
                target = None;
            }
        }

        let mut site_valid = vec![true; total_sites];
        if let Some(t) = target {
            for (i, valid) in site_valid.iter_mut().enumerate() {
                let cell = encoded[t][i];
                if alphabet.is_protein() && matches!(cell, Symbol::Soft(_)) {
                    *valid = false;
                }
                if (alphabet.is_protein() || self.options.gap_reduce) && cell.is_gap() {
                    *valid = false;
                }
            }
        }
        let valid_sites = site_valid.iter().filter(|&&v| v).count();
        if target.is_some() {
            info!("{} sites out of {}", valid_sites, total_sites);
        } else {
            info!("{} sites", total_sites);
        }

        let mut region_start = None;
        let offsets = match (target, self.options.focus.as_deref()) {
            (Some(t), Some(prefix)) => {
                region_start = parse_region_start(&names[t], prefix)?;
                // Column i of a region starting at START sits at START + i
                let start = region_start.unwrap_or(1);
                Some(
                    site_valid
                        .iter()
                        .enumerate()
                        .filter(|(_, &v)| v)
                        .map(|(i, _)| i + start)
                        .collect::<Vec<usize>>(),
                )
            }
            _ => None,
        };

        if valid_seqs == 0 {
            return Err(PrepError::format(
                "no sequences left after removing rows with out-of-alphabet characters",
            ));
        }
        if valid_sites == 0 {
            return Err(PrepError::format("no sites left after focus column filtering"));
        }

        // Reposition the focus among the retained rows
        let reduced_target = target.map(|t| seq_valid[..t].iter().filter(|&&v| v).count());
        let focus_name = target.map(|t| names[t].clone());

        let cells = valid_seqs
            .checked_mul(valid_sites)
            .ok_or(PrepError::Resource {
                what: "alignment matrix",
                elements: usize::MAX,
            })?;
        let mut sequences = Vec::new();
        sequences
            .try_reserve_exact(cells)
            .map_err(|_| PrepError::Resource {
                what: "alignment matrix",
                elements: cells,
            })?;
        let mut kept_names = Vec::with_capacity(valid_seqs);
        for ((row, name), _) in encoded
            .iter()
            .zip(names)
            .zip(&seq_valid)
            .filter(|(_, &valid)| valid)
        {
            // Lowercase cells count as their uppercase symbol from here on
            sequences.extend(
                row.iter()
                    .zip(&site_valid)
                    .filter(|(_, &v)| v)
                    .filter_map(|(cell, _)| cell.index()),
            );
            kept_names.push(name);
        }

        let alignment = Alignment::from_parts(
            alphabet.clone(),
            kept_names,
            sequences,
            valid_sites,
            reduced_target,
            offsets,
        )?;

        let report = LoadReport {
            total_seqs,
            valid_seqs,
            total_sites,
            valid_sites,
            focus: focus_name,
            region_start,
        };
        Ok((alignment, report))
    }
}

/// First sequence whose name starts with `prefix`; later matches are reported and ignored
fn find_focus(names: &[String], prefix: &str) -> Option<usize> {
    let mut target = None;
    for (s, name) in names.iter().enumerate() {
        if name.starts_with(prefix) {
            if target.is_some() {
                warn!(
                    "multiple sequences start with {}, ignoring sequence {}",
                    prefix,
                    s + 1
                );
            } else {
                target = Some(s);
            }
        }
    }
    match target {
        Some(t) => info!("found focus {} as sequence {}", prefix, t + 1),
        None => warn!(
            "could not find {}, proceeding without focus sequence",
            prefix
        ),
    }
    target
}

/// Region start from a focus name of the form `PREFIX/START-END`.
///
/// Returns `None` when the name carries no region; malformed regions are
/// reported and also yield `None` (start at 1).
fn parse_region_start(name: &str, prefix: &str) -> Result<Option<usize>> {
    let rest = &name[prefix.len()..];
    if rest.len() <= 1 || !rest.starts_with('/') {
        return Ok(None);
    }
    let pattern = Regex::new(r"^/(\d+)")
        .map_err(|e| PrepError::config(format!("region pattern: {}", e)))?;
    let start = pattern
        .captures(rest)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok());
    match start {
        Some(start) => {
            info!("region starts at {}", start);
            Ok(Some(start))
        }
        None => {
            warn!("error parsing region of {}, assuming start at 1", name);
            Ok(None)
        }
    }
}
