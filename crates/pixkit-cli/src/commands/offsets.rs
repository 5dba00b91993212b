use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use pixkit_core::consts::CHANNEL_SLOTS;
use pixkit_core::jobs::params::{load_params, ChannelOffsetsParams};
use pixkit_core::jobs::run_channel_offsets;
use tracing::debug;

use super::{DataTypeArg, StoreArgs};
use crate::progress::BarReporter;
use crate::summary::print_offsets_outcome;

#[derive(Args)]
pub struct OffsetsArgs {
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

    /// Put the new images in a new dataset with this name
    #[arg(long)]
    pub new_dataset: Option<String>,

    /// Channel shift as CHANNEL:X:Y:Z (channel 1-4); repeatable
    #[arg(long = "shift", allow_hyphen_values = true, value_parser = parse_shift)]
    pub shifts: Vec<ChannelShift>,

    /// Comma-separated channels (1-4) to leave out of the output
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
pub struct ChannelShift {
    pub channel: usize,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

fn parse_shift(s: &str) -> std::result::Result<ChannelShift, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [channel, x, y, z] = parts.as_slice() else {
        return Err(format!("expected CHANNEL:X:Y:Z, got '{s}'"));
    };
    let int = |v: &str| v.trim().parse::<i64>().map_err(|e| format!("'{v}': {e}"));
    Ok(ChannelShift {
        channel: channel
            .trim()
            .parse()
            .map_err(|e| format!("'{channel}': {e}"))?,
        x: int(x)?,
        y: int(y)?,
        z: int(z)?,
    })
}

fn check_slot(channel: usize) -> Result<usize> {
    if channel == 0 || channel > CHANNEL_SLOTS {
        bail!("Channel {channel} out of range 1-{CHANNEL_SLOTS}");
    }
    Ok(channel - 1)
}

fn build_params(args: &OffsetsArgs) -> Result<ChannelOffsetsParams> {
    let mut params = ChannelOffsetsParams {
        data_type: args.data_type.into(),
        ids: args.ids.clone(),
        new_dataset_name: args.new_dataset.clone(),
        ..Default::default()
    };
    for shift in &args.shifts {
        let slot = &mut params.channels[check_slot(shift.channel)?];
        slot.x_shift = shift.x;
        slot.y_shift = shift.y;
        slot.z_shift = shift.z;
    }
    for &channel in &args.exclude {
        params.channels[check_slot(channel)?].include = false;
    }
    Ok(params)
}

pub fn run(args: &OffsetsArgs) -> Result<()> {
    let params = match &args.params {
        Some(path) => {
            let mut params: ChannelOffsetsParams = load_params(path)
                .with_context(|| format!("Failed to read parameters {}", path.display()))?;
            if !args.ids.is_empty() {
                params.ids = args.ids.clone();
            }
            params
        }
        None => build_params(args)?,
    };

    debug!(?params, "Running channel offsets");
    let session = args.store.open()?;
    let reporter = BarReporter::new();
    let outcome = run_channel_offsets(&*session, &params, &reporter)?;
    session.close().context("Failed to save store")?;

    print_offsets_outcome(&outcome);
    Ok(())
}
