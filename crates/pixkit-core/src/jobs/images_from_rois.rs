use std::cell::Cell;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gateway::{DatasetMeta, Gateway, ImageId, ImageMeta, NewImage};
use crate::pixels::Plane;
use crate::roi::{clamp_all, rectangles, roi_tiles, stack_tiles, RectRoi, Roi, TileRequest};
use crate::timer::RunTimer;

use super::params::ImagesFromRoisParams;
use super::resolve::resolve_images;
use super::types::{JobStage, ProgressReporter, RoisOutcome};

/// What one source image produced.
#[derive(Clone, Debug, Default)]
pub struct RoiImages {
    pub images: Vec<ImageMeta>,
    pub dataset: Option<DatasetMeta>,
    pub links: usize,
}

/// Create new images from the rectangle ROIs of every target image.
///
/// In stack mode each source image yields one z-stack with a tile per ROI;
/// otherwise each ROI yields its own image covering the ROI's z/t range and
/// all channels.
pub fn run_images_from_rois<G: Gateway + ?Sized>(
    gateway: &G,
    params: &ImagesFromRoisParams,
    reporter: &dyn ProgressReporter,
) -> Result<RoisOutcome> {
    let timer = RunTimer::start();
    params.validate()?;

    reporter.begin_stage(JobStage::Resolving, Some(params.ids.len()));
    let resolved = resolve_images(gateway, params.data_type, &params.ids)?;
    reporter.finish_stage();

    let mut outcome = RoisOutcome {
        message: resolved.message,
        ..Default::default()
    };
    if resolved.images.is_empty() {
        outcome.elapsed_secs = timer.elapsed_secs();
        return Ok(outcome);
    }

    let mut candidates = Vec::new();
    for image in resolved.images {
        if gateway.rois(image.id)?.iter().any(Roi::has_rectangle) {
            candidates.push(image.id);
        } else {
            debug!(id = image.id, "No rectangle ROI on image");
        }
    }
    if candidates.is_empty() {
        outcome.message.push_str("No rectangle ROI found.");
        outcome.elapsed_secs = timer.elapsed_secs();
        return Ok(outcome);
    }

    for image_id in candidates {
        let Some(produced) = process_image(gateway, image_id, params, reporter)? else {
            continue;
        };
        outcome.images.extend(produced.images);
        outcome.datasets.extend(produced.dataset);
        outcome.links += produced.links;
    }

    outcome.message.push_str(&summary_message(&outcome));
    outcome.elapsed_secs = timer.elapsed_secs();
    info!(elapsed_secs = outcome.elapsed_secs, "Images from ROIs finished");
    Ok(outcome)
}

/// Process one source image. Returns `None` if the image is missing or has
/// no usable rectangle.
pub fn process_image<G: Gateway + ?Sized>(
    gateway: &G,
    image_id: ImageId,
    params: &ImagesFromRoisParams,
    reporter: &dyn ProgressReporter,
) -> Result<Option<RoiImages>> {
    let Some(image) = gateway.image(image_id)? else {
        warn!(id = image_id, "No image found");
        return Ok(None);
    };

    let mut rects = rectangles(&gateway.rois(image_id)?);
    clamp_all(&mut rects, image.size_x, image.size_y);
    rects.retain(|r| {
        if r.bbox.is_empty() {
            warn!(id = image_id, bbox = ?r.bbox, "ROI lies outside the image, skipping");
        }
        !r.bbox.is_empty()
    });
    if rects.is_empty() {
        warn!(id = image_id, "No rectangular ROIs found");
        return Ok(None);
    }
    debug!(id = image_id, rois = ?rects, "Rectangles");

    if params.make_image_stack {
        make_stack(gateway, &image, &rects, params, reporter).map(Some)
    } else {
        make_roi_images(gateway, &image, &rects, params, reporter).map(Some)
    }
}

fn make_stack<G: Gateway + ?Sized>(
    gateway: &G,
    image: &ImageMeta,
    rects: &[RectRoi],
    params: &ImagesFromRoisParams,
    reporter: &dyn ProgressReporter,
) -> Result<RoiImages> {
    info!(
        id = image.id,
        physical_size_x = ?image.physical_size_x,
        physical_size_y = ?image.physical_size_y,
        "Making image stack from ROIs"
    );
    let tiles = stack_tiles(rects)?;

    let base = basename(&image.name);
    let name = match params.container_name() {
        Some(container) => format!("{base}_{container}"),
        None => base.to_string(),
    };
    let mut request = NewImage::new(name, rects.len(), 1, 1);
    request.description = format!(
        "Image from ROIS on parent Image:\n  Name: {}\n  Image ID: {}",
        image.name, image.id
    );
    request.physical_size_x = image.physical_size_x;
    request.physical_size_y = image.physical_size_y;

    let stack = create_from_tiles(gateway, image.id, &request, &tiles, reporter)?;

    let mut links = 0;
    match gateway.image_parent(image.id)?.filter(|ds| ds.can_link) {
        Some(parent) => {
            gateway.link_dataset_image(parent.id, stack.id)?;
            links += 1;
        }
        None => debug!(id = stack.id, "No linkable parent dataset for stack"),
    }

    Ok(RoiImages {
        images: vec![stack],
        dataset: None,
        links,
    })
}

fn make_roi_images<G: Gateway + ?Sized>(
    gateway: &G,
    image: &ImageMeta,
    rects: &[RectRoi],
    params: &ImagesFromRoisParams,
    reporter: &dyn ProgressReporter,
) -> Result<RoiImages> {
    let mut produced = RoiImages::default();

    for rect in rects {
        let tiles = roi_tiles(rect, image.size_c)?;
        info!(
            x = rect.bbox.x,
            y = rect.bbox.y,
            w = rect.bbox.width,
            h = rect.bbox.height,
            z1 = rect.z_start,
            z2 = rect.z_end,
            t1 = rect.t_start,
            t2 = rect.t_end,
            "Extracting ROI"
        );

        let mut request = NewImage::new(image.name.clone(), rect.size_z(), image.size_c, rect.size_t());
        request.description = format!(
            "Created from image:\n  Name: {}\n  Image ID: {} \n x: {} y: {}",
            image.name, image.id, rect.bbox.x, rect.bbox.y
        );
        request.source_image = Some(image.id);
        request.physical_size_x = image.physical_size_x;
        request.physical_size_y = image.physical_size_y;

        let new_image = create_from_tiles(gateway, image.id, &request, &tiles, reporter)?;
        info!(id = new_image.id, "New image");
        produced.images.push(new_image);
    }

    let parent = gateway.image_parent(image.id)?;
    let (target, project) = match params.container_name() {
        Some(name) => {
            let description = format!(
                "Images in this Dataset are from ROIs of parent Image:\n  Name: {}\n  Image ID: {}",
                image.name, image.id
            );
            let dataset = gateway.create_dataset(name, &description)?;
            info!(id = dataset.id, name, source = image.id, "Created dataset for ROI images");
            let project = match &parent {
                Some(parent) => gateway.dataset_parent(parent.id)?,
                None => None,
            };
            produced.dataset = Some(dataset.clone());
            (Some(dataset), project)
        }
        None => (parent.filter(|ds| ds.can_link), None),
    };

    let Some(target) = target else {
        warn!(
            id = image.id,
            "No dataset created or found for new images, images will be orphans"
        );
        return Ok(produced);
    };

    reporter.begin_stage(JobStage::Linking, Some(produced.images.len()));
    for (i, new_image) in produced.images.iter().enumerate() {
        gateway.link_dataset_image(target.id, new_image.id)?;
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    produced.links = produced.images.len();

    if let Some(project) = project.filter(|p| p.can_link) {
        gateway.link_project_dataset(project.id, target.id)?;
        debug!(project = project.id, dataset = target.id, "Linked dataset to project");
    }

    Ok(produced)
}

fn create_from_tiles<G: Gateway + ?Sized>(
    gateway: &G,
    image_id: ImageId,
    request: &NewImage,
    tiles: &[TileRequest],
    reporter: &dyn ProgressReporter,
) -> Result<ImageMeta> {
    reporter.begin_stage(JobStage::Planes, Some(tiles.len()));
    let done = Cell::new(0);
    let mut sequence = tiles.iter().map(|req| -> Result<Plane> {
        let tile = gateway.tile(image_id, req.coord, &req.tile)?;
        done.set(done.get() + 1);
        reporter.advance(done.get());
        Ok(tile)
    });
    let created = gateway.create_image(request, &mut sequence);
    reporter.finish_stage();
    created
}

fn basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

fn summary_message(outcome: &RoisOutcome) -> String {
    let mut message = match outcome.images.len() {
        0 => "No image created".to_string(),
        1 => "Created a new image".to_string(),
        n => format!("Created {n} new images"),
    };
    match outcome.datasets.len() {
        0 => {}
        1 => message.push_str(" and a new dataset"),
        n => message.push_str(&format!(" and {n} new datasets")),
    }
    if !outcome.images.is_empty() && outcome.links != outcome.images.len() {
        message.push_str(" but some images could not be attached");
    }
    message.push('.');
    message
}
