//! notelink CLI - minify marimo notebooks into shareable links.

mod minify;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notelink")]
#[command(about = "Minify marimo notebooks into shareable links")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Prune a notebook to a whitelist and write the result to a file
    MinifyToFile {
        /// Path to the notebook (.py file)
        source: String,

        /// Whitelist expression selecting the outputs to keep
        /// (default: keep every cell)
        #[arg(long)]
        whitelist: Option<String>,

        /// Output path (default: <source stem>.min.py next to the source)
        #[arg(long)]
        out: Option<String>,

        /// Host-provided global name a cell may read without a producer
        /// (repeatable)
        #[arg(long = "external")]
        externals: Vec<String>,
    },

    /// Prune a notebook to a whitelist and print a shareable playground URL
    MinifyToUrl {
        /// Path to the notebook (.py file)
        source: String,

        /// Whitelist expression selecting the outputs to keep
        /// (default: keep every cell)
        #[arg(long)]
        whitelist: Option<String>,

        /// Host-provided global name a cell may read without a producer
        /// (repeatable)
        #[arg(long = "external")]
        externals: Vec<String>,

        /// Emit the read-only embed variant of the URL
        #[arg(long)]
        read_only: bool,

        /// Maximum token size in bytes
        #[arg(long, default_value_t = notelink_core::DEFAULT_MAX_TOKEN_LEN)]
        max_size: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::MinifyToFile {
            source,
            whitelist,
            out,
            externals,
        } => minify::to_file(&source, whitelist.as_deref(), out.as_deref(), &externals)?,

        Commands::MinifyToUrl {
            source,
            whitelist,
            externals,
            read_only,
            max_size,
        } => minify::to_url(&source, whitelist.as_deref(), &externals, read_only, max_size)?,
    }

    Ok(())
}
