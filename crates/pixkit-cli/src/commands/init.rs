use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use pixkit_core::consts::CATALOG_FILE;
use pixkit_core::io::LocalStore;

#[derive(Args)]
pub struct InitArgs {
    /// Directory for the new store
    pub dir: PathBuf,
}

pub fn run(args: &InitArgs) -> Result<()> {
    if args.dir.join(CATALOG_FILE).exists() {
        bail!("{} already contains a store", args.dir.display());
    }
    let store = LocalStore::create(&args.dir)
        .with_context(|| format!("Failed to create store in {}", args.dir.display()))?;
    println!("Created empty store in {}", store.root().display());
    Ok(())
}
