use anyhow::{bail, Result};
use clap::Args;
use pixkit_core::gateway::Gateway;
use pixkit_core::roi::rectangle_roi;

use super::StoreArgs;

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Image to describe (lists all images when omitted)
    pub image: Option<u64>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let session = args.store.open()?;

    let Some(id) = args.image else {
        for dataset in session.all_datasets() {
            println!(
                "Dataset {:<6} {} ({} images)",
                dataset.id,
                dataset.name,
                dataset.images.len()
            );
        }
        for image in session.all_images() {
            println!(
                "Image   {:<6} {} ({}x{}, Z={} C={} T={})",
                image.id,
                image.name,
                image.size_x,
                image.size_y,
                image.size_z,
                image.size_c,
                image.size_t
            );
        }
        return Ok(());
    };

    let Some(info) = session.image(id)? else {
        bail!("Image {id} not found");
    };

    println!("Image:       {} ({})", info.name, info.id);
    println!("Dimensions:  {}x{}", info.size_x, info.size_y);
    println!("Z/C/T:       {}/{}/{}", info.size_z, info.size_c, info.size_t);
    println!("Pixel type:  {}", info.pixel_type);
    let plane_bytes =
        info.size_x as usize * info.size_y as usize * info.pixel_type.bytes_per_pixel();
    println!(
        "Planes:      {} ({} bytes each)",
        info.plane_count(),
        plane_bytes
    );
    if !info.channels.is_empty() {
        println!("Channels:    {}", info.channels.join(", "));
    }
    if let (Some(px), Some(py)) = (info.physical_size_x, info.physical_size_y) {
        println!("Pixel size:  {} x {}", px, py);
    }
    if info.requires_pyramid {
        println!("Pyramid:     yes");
    }
    if let Some(parent) = session.image_parent(id)? {
        println!("Dataset:     {} ({})", parent.name, parent.id);
    }
    if !info.description.is_empty() {
        println!("Description: {}", info.description.replace('\n', "\n             "));
    }

    let rois = session.rois(id)?;
    println!("ROIs:        {}", rois.len());
    for roi in &rois {
        match rectangle_roi(roi) {
            Some(rect) => println!(
                "  ROI {:<6} rect {},{} {}x{}  z {}..={}  t {}..={}",
                roi.id,
                rect.bbox.x,
                rect.bbox.y,
                rect.bbox.width,
                rect.bbox.height,
                rect.z_start,
                rect.z_end,
                rect.t_start,
                rect.t_end
            ),
            None => println!(
                "  ROI {:<6} {} shape(s), no rectangle",
                roi.id,
                roi.shapes.len()
            ),
        }
    }

    Ok(())
}
