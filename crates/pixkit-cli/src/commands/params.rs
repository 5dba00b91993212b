use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pixkit_core::jobs::params::{ChannelOffsetsParams, ImagesFromRoisParams};

#[derive(Clone, Copy, ValueEnum)]
pub enum JobArg {
    /// Channel offsets
    Offsets,
    /// Images from ROIs
    Rois,
}

#[derive(Args)]
pub struct ParamsArgs {
    /// Job to describe
    #[arg(value_enum)]
    pub job: JobArg,

    /// Write parameters to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save a default parameter file as TOML.
pub fn run(args: &ParamsArgs) -> Result<()> {
    let toml_str = match args.job {
        JobArg::Offsets => toml::to_string_pretty(&ChannelOffsetsParams {
            ids: vec![1],
            ..Default::default()
        })?,
        JobArg::Rois => toml::to_string_pretty(&ImagesFromRoisParams {
            ids: vec![1],
            ..Default::default()
        })?,
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write parameters to {}", path.display()))?;
        println!("Default parameters saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
