//! `zenodeo` command-line tool
//!
//! Works offline against a descriptor file (or the builtin catalog):
//!   zenodeo resources
//!   zenodeo validate --descriptors resources.json
//!   zenodeo explain treatments journalYear=1999 sortBy=journalYear:ASC

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Descriptor file to use instead of the builtin catalog
    #[arg(long, global = true)]
    descriptors: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List resources with their queryable columns
    Resources,
    /// Parse and validate the descriptor catalog
    Validate,
    /// Show the statements a request compiles to
    Explain(ExplainArgs),
}

#[derive(Parser, Debug)]
struct ExplainArgs {
    /// Resource name (case-insensitive)
    resource: String,

    /// Query parameters as key=value; repeat a key for several values
    params: Vec<String>,

    /// Print executable SQL with @name placeholders instead of bound values
    #[arg(long)]
    placeholders: bool,

    /// Default page size applied when the request has none
    #[arg(long, default_value_t = 30)]
    page_size: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = commands::load_catalog(cli.descriptors.as_deref())?;

    let output = match cli.command {
        Commands::Resources => commands::resources(&catalog),
        Commands::Validate => commands::validate(&catalog),
        Commands::Explain(args) => {
            let pairs = commands::parse_pairs(&args.params)?;
            commands::explain(&catalog, &args.resource, &pairs, args.page_size, args.placeholders)?
        }
    };

    println!("{output}");
    Ok(())
}
