// main.rs - CLI entry point

use potts_prep::cli::Config;
use potts_prep::core::process;
use potts_prep::prelude::*;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run_main() {
        eprintln!("❌ ERROR: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_main() -> Result<(), String> {
    let mut args: Args = argh::from_env();
    let command_line = std::env::args().collect::<Vec<String>>().join(" ");

    // Handle generate config first
    if args.generate_config {
        let sample_config = Config::generate_sample();
        println!("{}", sample_config);
        println!("\n💡 Save this content to a .toml file and use --config /path/to/config.toml");
        return Ok(());
    }

    // Load configuration file if specified
    if let Some(config_path) = args.config.clone() {
        args = args
            .with_config_file(&config_path)
            .map_err(|e| e.to_string())?;
        println!("📄 Loaded configuration from: {}", config_path);
    }

    init_logging(args.quiet);

    // Validate all arguments
    let validation_result = validate_args(&args)?;
    let alignment_path = args.alignment.clone().ok_or("--alignment is required")?;

    println!("🚀 {}", potts_prep::get_info());

    // Configure thread pool
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| format!("Failed to configure thread pool: {}", e))?;
        println!("🧵 Threads: {}", n);
    } else {
        let num_threads = rayon::current_num_threads();
        println!("🧵 Threads: {} (auto-detected)", num_threads);
    }

    println!("🔤 Alphabet: {}", validation_result.alphabet);
    if let Some(ref focus) = args.focus {
        println!("🎯 Focus: {}", focus);
    }
    println!(
        "📐 Marginals: {}",
        validation_result.marginal_mode.description()
    );

    let total_start = Instant::now();

    // Load alignment
    let load_start = Instant::now();
    let loader = AlignmentLoader::new(validation_result.loader_options(&args));
    let (alignment, load_report) = loader
        .load_file(Path::new(&alignment_path))
        .map_err(|e| e.to_string())?;
    println!(
        "📊 Alignment: {} of {} sequences × {} of {} sites ({:.2}s)",
        load_report.valid_seqs,
        load_report.total_seqs,
        load_report.valid_sites,
        load_report.total_sites,
        load_start.elapsed().as_secs_f64()
    );

    if args.dry_run {
        println!("✅ Dry run completed successfully");
        return Ok(());
    }

    if validation_result.reweighting {
        println!(
            "⚖️  Reweighting: theta = {} ({:.0}% identity), scale = {}",
            args.theta,
            100.0 * (1.0 - args.theta),
            args.scale
        );
    } else {
        println!("⚠️  Theta {} outside 0-1: uniform weights, no sample size estimate", args.theta);
    }

    let options = PipelineOptions {
        loader: loader.options().clone(),
        theta: args.theta,
        scale: args.scale,
        parallelism: validation_result.parallelism,
        sample_size: validation_result.sample_size.clone(),
        skip_sample_size: args.skip_sample_size,
        show_progress: !args.quiet,
    };

    let compute_start = Instant::now();
    let stats = process(alignment, load_report, &options).map_err(|e| e.to_string())?;
    let compute_time = compute_start.elapsed();

    println!("\n📈 === ALIGNMENT STATISTICS ===");
    println!(
        "  • Neighborhood sample size: {:.1}",
        stats.reweight.n_eff
    );
    if let Some(ref summary) = stats.sample_size {
        println!("  • Average mutual information: {:.4}", summary.avg_mi);
        println!(
            "  • Effective sample size: {:.1} (weights × {:.3})",
            summary.n_eff, summary.ratio
        );
    }
    if stats.marginals.degenerate_sites > 0 {
        println!(
            "  ⚠️  {} fully gapped sites set to uniform",
            stats.marginals.degenerate_sites
        );
    }
    println!(
        "  • Model: {} sites × {} states",
        stats.alignment.n_sites(),
        stats.alignment.model_codes()
    );
    println!("⏱️  Computation: {:.2}s", compute_time.as_secs_f64());

    // Write outputs
    if let Some(ref path) = args.weights_out {
        write_weights(Path::new(path), &stats, &command_line).map_err(|e| e.to_string())?;
        println!("✅ Weights written to: {}", path);
    }
    if let Some(ref path) = args.marginals_out {
        write_marginals(Path::new(path), &stats, &command_line).map_err(|e| e.to_string())?;
        println!("✅ Marginals written to: {}", path);
    }
    if let Some(ref path) = args.summary_out {
        write_summary(Path::new(path), &stats, &command_line).map_err(|e| e.to_string())?;
        println!("✅ Summary written to: {}", path);
    }

    println!(
        "\n🎉 Completed in {:.2}s",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
