use tracing::{info, warn};

use crate::error::Result;
use crate::gateway::{Gateway, ImageMeta};

use super::params::DataType;

/// Images targeted by a job plus the lookup message for the user.
#[derive(Clone, Debug, Default)]
pub struct Resolved {
    pub images: Vec<ImageMeta>,
    pub message: String,
}

/// Look up `ids` as images or datasets. Datasets expand to their images.
///
/// Missing IDs are not an error; they are reported in the message.
pub fn resolve_images<G: Gateway + ?Sized>(
    gateway: &G,
    data_type: DataType,
    ids: &[u64],
) -> Result<Resolved> {
    let mut images = Vec::new();
    let mut found = 0;

    for &id in ids {
        match data_type {
            DataType::Image => match gateway.image(id)? {
                Some(image) => {
                    found += 1;
                    images.push(image);
                }
                None => warn!(id, "Image not found"),
            },
            DataType::Dataset => match gateway.dataset(id)? {
                Some(dataset) => {
                    found += 1;
                    let children = gateway.dataset_images(dataset.id)?;
                    info!(id, images = children.len(), "Expanding dataset");
                    images.extend(children);
                }
                None => warn!(id, "Dataset not found"),
            },
        }
    }

    let kind = data_type.to_string().to_lowercase();
    let message = if found == 0 {
        format!("No {kind}s found. ")
    } else if found != ids.len() {
        format!("Found {found} out of {} {kind}s. ", ids.len())
    } else {
        String::new()
    };

    Ok(Resolved { images, message })
}
