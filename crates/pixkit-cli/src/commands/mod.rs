pub mod annotate;
pub mod import;
pub mod info;
pub mod init;
pub mod offsets;
pub mod params;
pub mod rois;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pixkit_core::gateway::Session;
use pixkit_core::io::LocalStore;
use pixkit_core::jobs::params::DataType;

#[derive(Args)]
pub struct StoreArgs {
    /// Image store directory
    #[arg(short, long, default_value = ".")]
    pub store: PathBuf,
}

impl StoreArgs {
    /// Open the store as a session that is closed (and saved) on every exit path.
    pub fn open(&self) -> Result<Session<LocalStore>> {
        let store = LocalStore::open(&self.store)
            .with_context(|| format!("Failed to open store {}", self.store.display()))?;
        Ok(Session::new(store))
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum DataTypeArg {
    /// IDs are images
    Image,
    /// IDs are datasets; all their images are processed
    Dataset,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Image => DataType::Image,
            DataTypeArg::Dataset => DataType::Dataset,
        }
    }
}
