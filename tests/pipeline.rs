// pipeline.rs - End-to-end tests through the public API

use potts_prep::core::{count_marginals, reweight, MarginalMode, Parallelism};
use potts_prep::output::{write_marginals, write_summary, write_weights};
use potts_prep::prelude::*;
use std::io::Cursor;

fn options(alphabet: &str) -> PipelineOptions {
    PipelineOptions {
        loader: LoaderOptions {
            alphabet: Alphabet::new(alphabet).unwrap(),
            ..Default::default()
        },
        sample_size: SampleSizeOptions {
            iterations: 100,
            batch_size: 20,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn assert_marginals_normalized(alignment: &Alignment) {
    for i in 0..alignment.n_sites() {
        let sum: f64 = alignment.fi_row(i).unwrap().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "fi row {} sums to {}", i, sum);
        for j in i + 1..alignment.n_sites() {
            let sum: f64 = alignment.fij_block(i, j).unwrap().iter().sum();
            assert!((sum - 1.0).abs() < 1e-6, "fij ({}, {}) sums to {}", i, j, sum);
        }
    }
}

const PROTEIN: &str = "\
>F/5-10 focus sequence
AC-dEF
>x
ACDDEF
>y
AC.DEy
>z
ACBDEF
>w
WCDDK-
";

#[test]
fn test_identical_sequences_end_to_end() {
    let fasta = ">s1\nAAAA\n>s2\nAAAA\n>s3\nAAAA\n";
    for skip_sample_size in [true, false] {
        let opts = PipelineOptions {
            theta: 0.5,
            scale: 1.0,
            skip_sample_size,
            ..options("AB")
        };
        let stats = run_pipeline(Cursor::new(fasta), &opts).unwrap();
        let alignment = &stats.alignment;

        for &w in alignment.weights() {
            assert!((w - 1.0 / 3.0).abs() < 1e-12);
        }
        assert!((alignment.n_eff() - 1.0).abs() < 1e-12);
        for i in 0..4 {
            let fi = alignment.fi_row(i).unwrap();
            assert!((fi[0] - 1.0).abs() < 1e-12);
            assert_eq!(fi[1], 0.0);
        }
        assert_eq!(stats.sample_size.is_some(), !skip_sample_size);
    }
}

#[test]
fn test_protein_focus_mode() {
    let opts = PipelineOptions {
        loader: LoaderOptions {
            focus: Some("F".to_string()),
            ..Default::default()
        },
        skip_sample_size: true,
        ..Default::default()
    };
    let stats = run_pipeline(Cursor::new(PROTEIN), &opts).unwrap();
    let alignment = &stats.alignment;

    // Row z carries B, outside the amino acid alphabet
    assert_eq!(stats.load_report.total_seqs, 5);
    assert_eq!(alignment.n_seqs(), 4);
    assert_eq!(alignment.target(), Some(0));
    assert_eq!(stats.load_report.focus.as_deref(), Some("F/5-10 focus sequence"));

    // Gap and lowercase focus columns (3 and 4) are removed
    assert_eq!(alignment.n_sites(), 4);
    assert_eq!(alignment.offsets(), Some(&[5usize, 6, 9, 10][..]));
    assert_eq!(alignment.row_string(0), "ACEF");
    // Lowercase y counts as Y, '.' was a gap in a dropped column
    assert_eq!(alignment.row_string(2), "ACEY");
    assert_eq!(alignment.row_string(3), "WCK-");

    assert_marginals_normalized(alignment);
}

#[test]
fn test_marginals_normalized_in_both_modes() {
    let fasta = "\
>a
ACDE-FG
>b
ACDEKFG
>c
-CDQKF-
>d
MC-QKYG
>e
ACDEKFG
>f
MCNE-YG
";
    for mode in [MarginalMode::Standard, MarginalMode::GapReduced] {
        let loader = AlignmentLoader::new(LoaderOptions::default());
        let (mut alignment, _) = loader.load(Cursor::new(fasta)).unwrap();
        reweight(&mut alignment, 0.2, 1.0, Parallelism::Parallel, false).unwrap();
        count_marginals(&mut alignment, mode).unwrap();
        assert_marginals_normalized(&alignment);

        if mode == MarginalMode::GapReduced {
            for i in 0..alignment.n_sites() {
                for j in i + 1..alignment.n_sites() {
                    let both = alignment.ungapij(i, j).unwrap();
                    let bound = (1.0 - alignment.gapi(i).unwrap())
                        .min(1.0 - alignment.gapi(j).unwrap());
                    assert!(both <= bound + 1e-12);
                }
            }
        }
    }
}

#[test]
fn test_theta_out_of_range_is_uniform() {
    let opts = PipelineOptions {
        theta: 1.5,
        scale: 0.5,
        ..Default::default()
    };
    let stats = run_pipeline(Cursor::new(PROTEIN), &opts).unwrap();
    assert!(stats.alignment.weights().iter().all(|&w| w == 0.5));
    assert!((stats.alignment.n_eff() - 2.0).abs() < 1e-12);
    assert!(stats.sample_size.is_none());
}

#[test]
fn test_sample_size_is_reproducible() {
    let fasta = "\
>a
ACGTACGT
>b
ACGTACGA
>c
TCGAACGT
>d
GGGTACCT
>e
ACCTAGGT
>f
TTGTACGT
";
    let run = || run_pipeline(Cursor::new(fasta), &options("-ACGT")).unwrap();
    let first = run();
    let second = run();
    assert_eq!(first.alignment.weights(), second.alignment.weights());
    let summary = first.sample_size.unwrap();
    assert_eq!(Some(summary), second.sample_size);
    assert!((first.alignment.n_eff() - summary.n_eff).abs() < 1e-12);
}

#[test]
fn test_gap_reduced_pairs_without_overlap_keep_weights_positive() {
    let fasta = ">a\nA-\n>b\n-C\n>c\nA-\n>d\n-C\n";
    let opts = PipelineOptions {
        loader: LoaderOptions {
            alphabet: Alphabet::new("-AC").unwrap(),
            gap_reduce: true,
            ..Default::default()
        },
        theta: 0.2,
        ..options("-AC")
    };
    let stats = run_pipeline(Cursor::new(fasta), &opts).unwrap();
    let summary = stats.sample_size.unwrap();

    assert_eq!(summary.avg_mi, 0.0);
    assert!(summary.n_eff > 0.0 && summary.n_eff.is_finite());
    assert!(stats.alignment.n_eff() > 0.0);
    assert!(stats
        .alignment
        .weights()
        .iter()
        .all(|&w| w > 0.0 && w.is_finite()));
}

#[test]
fn test_format_errors() {
    let ragged = ">a\nACGT\n>b\nACG\n";
    assert!(matches!(
        run_pipeline(Cursor::new(ragged), &options("-ACGT")),
        Err(PrepError::Format { .. })
    ));

    let no_marker = "ACGT\n>b\nACGT\n";
    assert!(matches!(
        run_pipeline(Cursor::new(no_marker), &options("-ACGT")),
        Err(PrepError::Format { .. })
    ));

    // Every row contains an out-of-alphabet character
    let all_invalid = ">a\nACGN\n>b\nNCGT\n";
    assert!(matches!(
        run_pipeline(Cursor::new(all_invalid), &options("-ACGT")),
        Err(PrepError::Format { .. })
    ));
}

#[test]
fn test_outputs_written() {
    let dir = tempfile::tempdir().unwrap();
    let opts = PipelineOptions {
        loader: LoaderOptions {
            focus: Some("F".to_string()),
            gap_reduce: true,
            ..Default::default()
        },
        skip_sample_size: true,
        ..Default::default()
    };
    let stats = run_pipeline(Cursor::new(PROTEIN), &opts).unwrap();

    let weights = dir.path().join("out").join("weights.tsv");
    let marginals = dir.path().join("out").join("marginals.tsv");
    let summary = dir.path().join("summary.json");
    write_weights(&weights, &stats, "test").unwrap();
    write_marginals(&marginals, &stats, "test").unwrap();
    write_summary(&summary, &stats, "test").unwrap();

    let content = std::fs::read_to_string(&marginals).unwrap();
    let rows: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
    // Header plus 4 sites × 20 non-gap states
    assert_eq!(rows.len(), 1 + 4 * 20);
    assert_eq!(rows[0], "site\toffset\tsymbol\tfi\tgap");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary).unwrap()).unwrap();
    assert_eq!(json["gap_reduce"], true);
    assert_eq!(json["model_codes"], 20);
    assert_eq!(json["offsets"], serde_json::json!([5, 6, 9, 10]));
}
