use anyhow::Result;
use clap::{Parser, Subcommand};
use oggpage_cli::commands;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "oggpage")]
#[command(about = "oggpage - Ogg page decoding, recovery and re-framing", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a stream and re-encode its packets
    Copy {
        /// Input file, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Output file, or - for stdout
        #[arg(short, long)]
        output: String,
    },

    /// Scan damaged file and recover pages
    Scan {
        /// Input file to scan, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Output JSON file for recovered pages
        #[arg(short, long)]
        output: Option<String>,

        /// Show statistics only
        #[arg(long)]
        stats_only: bool,
    },

    /// Sum the playback duration of an Opus stream
    Duration {
        /// Input file, or - for stdin
        #[arg(short, long)]
        input: String,

        /// Number of leading header packets to leave out
        #[arg(long, default_value = "2")]
        skip: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout may carry page data, so log to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Copy { input, output } => commands::copy::execute(&input, &output),

        Commands::Scan {
            input,
            output,
            stats_only,
        } => commands::scan::execute(&input, output.as_deref(), stats_only),

        Commands::Duration { input, skip } => commands::duration::execute(&input, skip),
    }
}
