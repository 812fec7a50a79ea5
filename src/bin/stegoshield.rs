use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use stegoshield::{AnalysisResult, AnalyzeOptions, Decision, FileOutcome, RdrConfig, StegoEngine};

#[derive(Parser)]
#[command(
    name = "stegoshield",
    about = "Screen images for steganography and embedded instructions",
    version,
    after_help = "Simple usage: stegoshield <image>  (analyze and print a JSON report)\n\n\
                  NOTE: Text recognition runs with the built-in no-op backend unless the\n\
                  library is embedded with a real OCR implementation; the statistical and\n\
                  metadata analyzers are always active."
)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Embed a watermark when the verdict is ALLOW
    #[arg(short, long)]
    watermark: bool,

    /// Message to embed when watermarking
    #[arg(short, long, default_value = "stegoshield-demo")]
    message: String,

    /// Coefficient-adjustment magnitude for embedding
    #[arg(long, default_value = "4")]
    alpha: i32,

    /// Number of resample trials
    #[arg(long, default_value = "5")]
    trials: u32,

    /// Seed for the resample randomness (deterministic runs)
    #[arg(long)]
    seed: Option<u64>,

    /// Write the watermarked image here (single-file input only)
    #[arg(long)]
    save_watermarked: Option<String>,

    /// Pretty-print the JSON reports
    #[arg(short, long)]
    pretty: bool,

    /// Suppress all non-error status output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.alpha < 1 {
        eprintln!("Error: alpha must be at least 1");
        process::exit(1);
    }

    let opts = AnalyzeOptions {
        watermark: cli.watermark,
        watermark_message: cli.message.clone(),
        alpha: cli.alpha,
        rdr: RdrConfig {
            trials: cli.trials,
            ..RdrConfig::default()
        },
        seed: cli.seed,
        ..AnalyzeOptions::default()
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    let engine = StegoEngine::new();

    let outcomes = if input_path.is_dir() {
        if cli.save_watermarked.is_some() {
            eprintln!("Error: --save-watermarked requires a single-file input");
            process::exit(1);
        }
        engine.analyze_directory(input_path, &opts)
    } else {
        vec![FileOutcome {
            path: input_path.to_path_buf(),
            report: engine.analyze_file(input_path, &opts),
        }]
    };

    let mut block_count = 0u32;
    let mut suspicious_count = 0u32;
    let mut fail_count = 0u32;

    for outcome in &outcomes {
        match &outcome.report {
            Ok(report) => {
                print_report(&outcome.path, report, &cli);
                match report.decision {
                    Decision::Block => block_count += 1,
                    Decision::Suspicious => suspicious_count += 1,
                    Decision::Allow => {}
                }
                if let Some(dest) = &cli.save_watermarked {
                    save_watermarked(report, dest);
                }
            }
            Err(e) => {
                eprintln!("[FAIL] {}: {e}", display_name(&outcome.path));
                fail_count += 1;
            }
        }
    }

    if outcomes.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Analyzed: {}", outcomes.len());
        if suspicious_count > 0 {
            eprint!(", Suspicious: {suspicious_count}");
        }
        if block_count > 0 {
            eprint!(", Blocked: {block_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!();
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

fn print_report(path: &Path, report: &AnalysisResult, cli: &Cli) {
    let json = if cli.pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    match json {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("[FAIL] {}: could not serialize report: {e}", display_name(path)),
    }

    if !cli.quiet {
        eprintln!(
            "[{}] {} (score {:.2})",
            report.decision,
            display_name(path),
            report.stego_score
        );
        if let Some(err) = &report.watermark_error {
            eprintln!("  -> watermark not embedded: {err}");
        }
    }
}

fn save_watermarked(report: &AnalysisResult, dest: &str) {
    match &report.watermarked_png {
        Some(png) => {
            if let Err(e) = std::fs::write(PathBuf::from(dest), png) {
                eprintln!("Error: failed to write watermarked image: {e}");
                process::exit(1);
            }
        }
        None => {
            eprintln!("Note: no watermarked image produced (verdict {})", report.decision);
        }
    }
}
