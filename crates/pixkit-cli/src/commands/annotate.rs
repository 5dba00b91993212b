use anyhow::{bail, Result};
use clap::Args;
use pixkit_core::gateway::Gateway;
use pixkit_core::roi::Shape;

use super::StoreArgs;

#[derive(Args)]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Image to annotate
    pub image: u64,

    /// Rectangle as X,Y,WIDTH,HEIGHT; each occurrence becomes one ROI
    #[arg(long = "rect", required = true, allow_hyphen_values = true, value_parser = parse_rect)]
    pub rects: Vec<[f64; 4]>,

    /// Z-section of the rectangles
    #[arg(long, default_value = "0")]
    pub z: usize,

    /// Last z-section; repeats each rectangle on every section from --z
    #[arg(long)]
    pub z_end: Option<usize>,

    /// Timepoint of the rectangles
    #[arg(long, default_value = "0")]
    pub t: usize,
}

fn parse_rect(s: &str) -> std::result::Result<[f64; 4], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{v}': {e}")))
        .collect::<std::result::Result<_, _>>()?;
    match values.as_slice() {
        &[x, y, w, h] => Ok([x, y, w, h]),
        _ => Err(format!("expected X,Y,WIDTH,HEIGHT, got '{s}'")),
    }
}

pub fn run(args: &AnnotateArgs) -> Result<()> {
    let z_end = args.z_end.unwrap_or(args.z);
    if z_end < args.z {
        bail!("--z-end ({z_end}) is before --z ({})", args.z);
    }

    let session = args.store.open()?;
    if session.image(args.image)?.is_none() {
        bail!("Image {} not found", args.image);
    }

    for &[x, y, width, height] in &args.rects {
        let shapes = (args.z..=z_end)
            .map(|z| Shape::Rectangle {
                x,
                y,
                width,
                height,
                z,
                t: args.t,
            })
            .collect();
        let id = session.add_roi(args.image, shapes)?;
        println!("Added ROI {id}: {x},{y} {width}x{height} on image {}", args.image);
    }
    session.close()?;
    Ok(())
}
