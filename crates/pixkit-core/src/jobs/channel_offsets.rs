use std::cell::Cell;

use tracing::{debug, info, warn};

use crate::consts::OFFSETS_NAME_SUFFIX;
use crate::error::Result;
use crate::gateway::{DatasetMeta, Gateway, ImageId, ImageMeta, NewImage};
use crate::offsets::{effective_offsets, ChannelOffset, OffsetPlanes};
use crate::pixels::Plane;

use super::params::ChannelOffsetsParams;
use super::resolve::resolve_images;
use super::types::{JobStage, OffsetsOutcome, ProgressReporter};

/// Create one new image per target image, shifting each configured channel
/// by its x/y/z offset.
pub fn run_channel_offsets<G: Gateway + ?Sized>(
    gateway: &G,
    params: &ChannelOffsetsParams,
    reporter: &dyn ProgressReporter,
) -> Result<OffsetsOutcome> {
    params.validate()?;

    reporter.begin_stage(JobStage::Resolving, Some(params.ids.len()));
    let resolved = resolve_images(gateway, params.data_type, &params.ids)?;
    reporter.finish_stage();

    let mut outcome = OffsetsOutcome {
        message: resolved.message,
        ..Default::default()
    };
    let Some(first) = resolved.images.first() else {
        outcome.message.push_str("No image created.");
        return Ok(outcome);
    };

    let offsets = params.channel_offsets();
    info!(?offsets, images = resolved.images.len(), "Applying channel offsets");

    if let Some(name) = params.new_dataset_name() {
        outcome.new_dataset = Some(create_dataset_beside(gateway, name, first)?);
    }

    let mut linked = 0;
    for image in &resolved.images {
        let Some((new_image, was_linked)) = offset_image(
            gateway,
            image.id,
            &offsets,
            outcome.new_dataset.as_ref(),
            reporter,
        )?
        else {
            continue;
        };
        if was_linked {
            linked += 1;
        }
        outcome.images.push(new_image);
    }

    outcome
        .message
        .push_str(&summary_message(&outcome.images, linked));
    Ok(outcome)
}

/// Create the output dataset and put it in the project that holds the first
/// image's dataset, when that project accepts links.
fn create_dataset_beside<G: Gateway + ?Sized>(
    gateway: &G,
    name: &str,
    first: &ImageMeta,
) -> Result<DatasetMeta> {
    let dataset = gateway.create_dataset(name, "")?;
    info!(id = dataset.id, name, "Created dataset");

    let project = match gateway.image_parent(first.id)? {
        Some(parent) => gateway.dataset_parent(parent.id)?,
        None => None,
    };
    if let Some(project) = project.filter(|p| p.can_link) {
        gateway.link_project_dataset(project.id, dataset.id)?;
        debug!(project = project.id, dataset = dataset.id, "Linked dataset to project");
    }
    Ok(dataset)
}

/// Build the offset copy of one image. Returns `None` when the image was
/// skipped, otherwise the new image and whether it was linked to a dataset.
pub fn offset_image<G: Gateway + ?Sized>(
    gateway: &G,
    image_id: ImageId,
    offsets: &[ChannelOffset],
    dataset: Option<&DatasetMeta>,
    reporter: &dyn ProgressReporter,
) -> Result<Option<(ImageMeta, bool)>> {
    let Some(image) = gateway.image(image_id)? else {
        warn!(id = image_id, "Image not found");
        return Ok(None);
    };

    if image.requires_pyramid {
        warn!(
            id = image_id,
            size_x = image.size_x,
            size_y = image.size_y,
            "Pyramid images are not supported, skipping"
        );
        return Ok(None);
    }

    let target = match dataset {
        Some(ds) => Some(ds.clone()),
        None => gateway.image_parent(image_id)?,
    };

    let channels = effective_offsets(offsets, image.size_c);
    if channels.is_empty() {
        warn!(
            id = image_id,
            size_c = image.size_c,
            "None of the selected channels exist in image, skipping"
        );
        return Ok(None);
    }

    let mut request = NewImage::new(
        format!("{}{}", image.name, OFFSETS_NAME_SUFFIX),
        image.size_z,
        channels.len(),
        image.size_t,
    );
    request.description = offsets_description(image_id, offsets);
    request.source_image = Some(image_id);
    request.channel_list = Some(channels.iter().map(|o| o.index).collect());
    request.physical_size_x = image.physical_size_x;
    request.physical_size_y = image.physical_size_y;

    let planes = OffsetPlanes::new(gateway, &image, channels);
    reporter.begin_stage(JobStage::Planes, Some(planes.total()));
    let done = Cell::new(0);
    let mut sequence = planes.map(|plane| -> Result<Plane> {
        done.set(done.get() + 1);
        reporter.advance(done.get());
        Ok(plane)
    });
    let created = gateway.create_image(&request, &mut sequence);
    reporter.finish_stage();
    let new_image = created?;
    info!(source = image_id, id = new_image.id, name = %new_image.name, "Created image");

    let linked = match target.filter(|ds| ds.can_link) {
        Some(ds) => {
            gateway.link_dataset_image(ds.id, new_image.id)?;
            true
        }
        None => {
            debug!(id = new_image.id, "No linkable dataset, image left unattached");
            false
        }
    };

    Ok(Some((new_image, linked)))
}

fn offsets_description(image_id: ImageId, offsets: &[ChannelOffset]) -> String {
    let lines: Vec<String> = offsets
        .iter()
        .map(|o| {
            format!(
                " Channel {}: Offsets x: {} y: {} z: {}",
                o.index, o.x, o.y, o.z
            )
        })
        .collect();
    format!(
        "Image created from Image ID: {image_id} by applying Channel Offsets:\n{}",
        lines.join("\n")
    )
}

fn summary_message(images: &[ImageMeta], linked: usize) -> String {
    match images {
        [] => "No image created.".to_string(),
        [single] => {
            let attached = if linked == 1 {
                ""
            } else {
                " but could not be attached"
            };
            format!("New image created{attached}: {}.", single.name)
        }
        many => {
            let tail = if linked == many.len() {
                "."
            } else {
                " but some of them could not be attached."
            };
            format!("{} new images created{tail}", many.len())
        }
    }
}
