mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixkit", about = "Derive new images from channel offsets and ROIs")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty image store
    Init(commands::init::InitArgs),
    /// Import TIFF planes as a new image
    Import(commands::import::ImportArgs),
    /// Add rectangle ROIs to an image
    Annotate(commands::annotate::AnnotateArgs),
    /// Show store contents or image metadata
    Info(commands::info::InfoArgs),
    /// Create new images with per-channel x/y/z shifts
    Offsets(commands::offsets::OffsetsArgs),
    /// Create new images from rectangle ROIs
    Rois(commands::rois::RoisArgs),
    /// Print a default parameter file for a job
    Params(commands::params::ParamsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::Annotate(args) => commands::annotate::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Offsets(args) => commands::offsets::run(args),
        Commands::Rois(args) => commands::rois::run(args),
        Commands::Params(args) => commands::params::run(args),
    }
}
