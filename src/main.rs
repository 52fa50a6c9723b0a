use clap::{Parser, Subcommand, builder::styling};
use etl_chain::{
    RuntimeConfig,
    cli::{self, Combine, CopyOptions},
    etl::runtime,
};
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// ETL Chain: move NDJSON objects through sequential and parallel pipelines
#[derive(Parser)]
#[command(name = "etlc", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// JSON file with worker pool settings (overrides ETL_* variables)
    #[arg(long, global = true)]
    runtime_config: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy objects from NDJSON inputs to one or more NDJSON outputs
    Copy {
        /// NDJSON files to read, concatenated in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// NDJSON file to write (repeat to fan out)
        #[arg(short, long = "to", required = true)]
        outputs: Vec<PathBuf>,

        /// Read all inputs concurrently
        #[arg(long)]
        parallel_read: bool,

        /// Write all outputs concurrently
        #[arg(long)]
        parallel_write: bool,

        /// Top-level field to remove from every object (repeatable)
        #[arg(short, long = "drop-field")]
        drop_fields: Vec<String>,

        /// Append to outputs instead of replacing them
        #[arg(short, long)]
        append: bool,
    },

    /// Count objects in NDJSON files, grouped by their "type" field
    Stats {
        /// NDJSON files to read
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Read all inputs concurrently
        #[arg(long)]
        parallel_read: bool,

        /// Print the counts as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_loaded = dotenvy::from_filename(&cli.env).is_ok();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if !env_loaded {
        log::debug!("No dotenv file loaded from {}", cli.env);
    }

    if let Some(path) = &cli.runtime_config {
        log::debug!("Loading runtime config from {}", path.display());
        runtime::configure(&RuntimeConfig::from_json_file(path)?)?;
    }

    match cli.command {
        Commands::Copy {
            inputs,
            outputs,
            parallel_read,
            parallel_write,
            drop_fields,
            append,
        } => {
            let options = CopyOptions {
                read: Combine::from_parallel(parallel_read),
                write: Combine::from_parallel(parallel_write),
                drop_fields,
                append,
            };
            let count = cli::copy(&inputs, &outputs, &options)?;
            for output in &outputs {
                log::info!(
                    "{} {} objects to {}",
                    "✓".green(),
                    count,
                    output.display().bright_black()
                );
            }
        }
        Commands::Stats {
            inputs,
            parallel_read,
            json,
        } => {
            let stats = cli::stats(&inputs, Combine::from_parallel(parallel_read))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                for (kind, count) in &stats.by_type {
                    println!("{:>8}  {}", count.cyan(), kind);
                }
                println!("{:>8}  {}", stats.total.bright_white(), "total".bright_black());
            }
        }
    }

    Ok(())
}
