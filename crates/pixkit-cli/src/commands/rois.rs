use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pixkit_core::consts::DEFAULT_CONTAINER_NAME;
use pixkit_core::jobs::params::{load_params, ImagesFromRoisParams};
use pixkit_core::jobs::run_images_from_rois;
use tracing::debug;

use super::{DataTypeArg, StoreArgs};
use crate::progress::BarReporter;
use crate::summary::print_rois_outcome;

#[derive(Args)]
pub struct RoisArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Parameter file (TOML); command-line IDs override its `ids`
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Comma-separated image or dataset IDs
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<u64>,

    /// How to interpret the IDs
    #[arg(long, value_enum, default_value = "image")]
    pub data_type: DataTypeArg,

    /// New dataset for per-ROI images, or name suffix for stacks
    #[arg(long, default_value = DEFAULT_CONTAINER_NAME)]
    pub container_name: String,

    /// Put per-ROI images in the source image's dataset instead of a new one
    #[arg(long)]
    pub no_container: bool,

    /// Make one image stack per source image from all of its ROIs
    #[arg(long)]
    pub stack: bool,
}

pub fn run(args: &RoisArgs) -> Result<()> {
    let params = match &args.params {
        Some(path) => {
            let mut params: ImagesFromRoisParams = load_params(path)
                .with_context(|| format!("Failed to read parameters {}", path.display()))?;
            if !args.ids.is_empty() {
                params.ids = args.ids.clone();
            }
            params
        }
        None => ImagesFromRoisParams {
            data_type: args.data_type.into(),
            ids: args.ids.clone(),
            container_name: (!args.no_container).then(|| args.container_name.clone()),
            make_image_stack: args.stack,
        },
    };

    debug!(?params, "Running images from ROIs");
    let session = args.store.open()?;
    let reporter = BarReporter::new();
    let outcome = run_images_from_rois(&*session, &params, &reporter)?;
    session.close().context("Failed to save store")?;

    print_rois_outcome(&outcome);
    Ok(())
}
