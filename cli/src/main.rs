//! DirMirror - Command-line interface for the directory mirroring engine.
//!
//! This is a simple CLI for testing and manual use of the mirror engine.
//! It provides argument parsing, a polling status display, and a final
//! summary (plain text or JSON).

use clap::Parser;
use engine::{FilterSet, Mirror, MirrorConfig, MirrorOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// DirMirror - mirror a source directory tree onto a destination
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(version = "0.1.0")]
#[command(about = "Mirror a directory tree with configurable change detection")]
struct Args {
    /// Source directory
    #[arg(long, value_name = "PATH")]
    src: PathBuf,

    /// Destination directory
    #[arg(long, value_name = "PATH")]
    dst: PathBuf,

    /// Copy when the source modification time is newer
    #[arg(long)]
    timestamp: bool,

    /// Allow 120s slack in timestamp comparison
    #[arg(long, requires = "timestamp")]
    time_buffer: bool,

    /// Copy when file sizes differ
    #[arg(long)]
    size: bool,

    /// With --size, copy only when the source is larger
    #[arg(long, requires = "size")]
    only_bigger: bool,

    /// Copy when tail-window CRC-32 content differs
    #[arg(long)]
    content: bool,

    /// With --content, hash at most the last 100,000 bytes of large files
    #[arg(long, requires = "content")]
    quick: bool,

    /// Delete destination files absent from the source
    #[arg(long)]
    delete: bool,

    /// Log and count every decision without touching the filesystem
    #[arg(long)]
    dry_run: bool,

    /// Comma-separated directory names/patterns to exclude
    #[arg(long, value_name = "PATTERNS", value_delimiter = ',')]
    exclude_dir: Vec<String>,

    /// Comma-separated file patterns to include (exclusive when non-empty)
    #[arg(long, value_name = "PATTERNS", value_delimiter = ',')]
    include_file: Vec<String>,

    /// Comma-separated file patterns to exclude
    #[arg(long, value_name = "PATTERNS", value_delimiter = ',')]
    exclude_file: Vec<String>,

    /// Print the final status snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Status poll interval in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500)]
    poll_ms: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let exit_code = match run_cli(&args) {
        Ok(()) => 0,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            2
        }
    };

    std::process::exit(exit_code);
}

/// Main CLI logic - separated for testability
fn run_cli(args: &Args) -> Result<(), String> {
    // Precondition checks belong to the caller, not the engine.
    if !args.src.exists() {
        return Err(format!(
            "Source directory does not exist: {}",
            args.src.display()
        ));
    }
    if !args.src.is_dir() {
        return Err(format!("Source is not a directory: {}", args.src.display()));
    }

    let filters = FilterSet::new(&args.exclude_dir, &args.include_file, &args.exclude_file)
        .map_err(|e| e.to_string())?;

    let mut options = MirrorOptions::default();
    options.check_timestamp = args.timestamp;
    options.apply_time_buffer = args.time_buffer;
    options.check_size = args.size;
    options.only_copy_if_bigger = args.only_bigger;
    options.check_content = args.content;
    options.quick_content_check = args.quick;
    options.delete_orphans = args.delete;
    options.dry_run = args.dry_run;
    options.use_filters =
        !args.exclude_dir.is_empty() || !args.include_file.is_empty() || !args.exclude_file.is_empty();

    let config = MirrorConfig::new(args.src.clone(), args.dst.clone(), options);
    let mut mirror = Mirror::new(config, Arc::new(filters));
    mirror
        .start()
        .map_err(|e| format!("Failed to start mirror run: {}", e))?;

    // Poll the engine the way an interactive shell would: print whatever
    // diagnostics queued up, then the running status line.
    while mirror.is_running() {
        thread::sleep(Duration::from_millis(args.poll_ms));
        for message in mirror.drain_messages() {
            eprintln!("{}", message);
        }
        if !args.json {
            eprintln!("{}", mirror.status().summary());
        }
    }
    mirror.stop();

    for message in mirror.drain_messages() {
        eprintln!("{}", message);
    }

    let status = mirror.status();
    if args.json {
        let rendered = serde_json::to_string_pretty(&status)
            .map_err(|e| format!("Failed to render status: {}", e))?;
        println!("{}", rendered);
    } else {
        println!("{}", status.summary());
    }

    Ok(())
}
