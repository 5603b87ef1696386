//! Main entry point for the docximg CLI application.
//!
//! Extracts the images of one `.docx` document into a directory of
//! numbered files, or lists what would be extracted.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use docximg::media::create_output_dir;
use docximg::{Cli, ExtractionRecord, MediaExtractor, Progress};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    if !cli.file.exists() {
        eprintln!("error: cannot find file {}", cli.file.display());
        return ExitCode::FAILURE;
    }

    let result = if cli.list {
        list_media(&cli).await
    } else {
        extract_images(&cli).await.map(|records| print_summary(&records))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            // Debug form carries the cause chain and, with RUST_BACKTRACE
            // set, the backtrace.
            eprintln!("\n{e:?}");
            ExitCode::FAILURE
        }
    }
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the extraction, printing progress unless `-q` was given.
async fn extract_images(cli: &Cli) -> Result<Vec<ExtractionRecord>> {
    let display_name = cli
        .file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.display().to_string());
    println!("Extracting images from {}...", display_name);
    println!("{}", "-".repeat(50));

    create_output_dir(&cli.output_dir).await?;
    let extractor = MediaExtractor::open(&cli.file)
        .await?
        .with_prefix(cli.prefix.clone());

    let quiet = cli.quiet;
    extractor
        .extract_with(&cli.output_dir, |progress| match progress {
            Progress::Found { total } => println!("Found {} images", total),
            Progress::Extracted { index, total, name } if !quiet => {
                println!("[{}/{}] extracted: {}", index, total, name)
            }
            Progress::Extracted { .. } => {}
            Progress::Finished { output_dir, .. } => {
                println!("\nAll images extracted to: {}", output_dir.display())
            }
        })
        .await
}

fn print_summary(records: &[ExtractionRecord]) {
    println!("{}", "-".repeat(50));
    println!("Successfully extracted {} images!", records.len());
    if records.is_empty() {
        return;
    }
    println!("\nExtracted images:");
    for record in records {
        println!("  - {}", record.name);
    }
}

/// Print the media entries and their target names without writing.
async fn list_media(cli: &Cli) -> Result<()> {
    let extractor = MediaExtractor::open(&cli.file)
        .await?
        .with_prefix(cli.prefix.clone());
    let items = extractor.media();

    println!(
        "{:>10}  {:>10}  {:>5}  {:<16}  Name",
        "Length", "Date", "Time", "Saved as"
    );
    println!("{}", "-".repeat(70));

    let mut total = 0u64;
    for item in &items {
        let (year, month, day) = item.entry.mod_date();
        let (hour, minute, _second) = item.entry.mod_time();
        println!(
            "{:>10}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<16}  {}",
            item.entry.uncompressed_size,
            year,
            month,
            day,
            hour,
            minute,
            item.file_name,
            item.entry.name
        );
        total += item.entry.uncompressed_size;
    }

    println!("{}", "-".repeat(70));
    println!("{:>10}  {:>17}  {} images", total, "", items.len());
    Ok(())
}
