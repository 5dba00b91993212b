use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::pixels::{PixelType, Plane, PlaneCoord, Tile};
use crate::roi::Roi;

pub type ImageId = u64;
pub type DatasetId = u64;
pub type ProjectId = u64;

/// Metadata of an image on the platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub id: ImageId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub size_x: u32,
    pub size_y: u32,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    pub pixel_type: PixelType,
    #[serde(default)]
    pub channels: Vec<String>,
    pub physical_size_x: Option<f64>,
    pub physical_size_y: Option<f64>,
    /// Large images served as a resolution pyramid; plane-wise jobs skip them.
    #[serde(default)]
    pub requires_pyramid: bool,
}

impl ImageMeta {
    pub fn plane_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }

    pub fn contains(&self, coord: PlaneCoord) -> bool {
        coord.z < self.size_z && coord.c < self.size_c && coord.t < self.size_t
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_can_link")]
    pub can_link: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_can_link")]
    pub can_link: bool,
}

fn default_can_link() -> bool {
    true
}

/// Declared shape and provenance of an image about to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct NewImage {
    pub name: String,
    pub description: String,
    pub size_z: usize,
    pub size_c: usize,
    pub size_t: usize,
    /// Image the new one was derived from; channel metadata is copied from it.
    pub source_image: Option<ImageId>,
    /// Source channel index for each new channel, when not the identity.
    pub channel_list: Option<Vec<usize>>,
    pub physical_size_x: Option<f64>,
    pub physical_size_y: Option<f64>,
}

impl NewImage {
    pub fn new(name: impl Into<String>, size_z: usize, size_c: usize, size_t: usize) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            size_z,
            size_c,
            size_t,
            source_image: None,
            channel_list: None,
            physical_size_x: None,
            physical_size_y: None,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.size_z * self.size_c * self.size_t
    }

    /// Coordinate of the `index`-th plane in creation order (z, then c, then t).
    pub fn coord_at(&self, index: usize) -> PlaneCoord {
        let t = index % self.size_t;
        let c = (index / self.size_t) % self.size_c;
        let z = index / (self.size_t * self.size_c);
        PlaneCoord::new(z, c, t)
    }
}

/// Session-scoped access to the image platform.
///
/// All methods take `&self` so that a lazy plane sequence reading from the
/// gateway can be handed back to [`Gateway::create_image`] on the same
/// session. Implementations that mutate state use interior mutability.
pub trait Gateway {
    fn image(&self, id: ImageId) -> Result<Option<ImageMeta>>;

    fn dataset(&self, id: DatasetId) -> Result<Option<DatasetMeta>>;

    /// Images contained in a dataset, in link order.
    fn dataset_images(&self, dataset: DatasetId) -> Result<Vec<ImageMeta>>;

    /// First dataset that contains the image, if any.
    fn image_parent(&self, image: ImageId) -> Result<Option<DatasetMeta>>;

    /// First project that contains the dataset, if any.
    fn dataset_parent(&self, dataset: DatasetId) -> Result<Option<ProjectMeta>>;

    fn plane(&self, image: ImageId, coord: PlaneCoord) -> Result<Plane>;

    fn tile(&self, image: ImageId, coord: PlaneCoord, tile: &Tile) -> Result<Plane>;

    fn rois(&self, image: ImageId) -> Result<Vec<Roi>>;

    /// Create an image, consuming exactly `request.plane_count()` planes in
    /// z, c, t order.
    fn create_image(
        &self,
        request: &NewImage,
        planes: &mut dyn Iterator<Item = Result<Plane>>,
    ) -> Result<ImageMeta>;

    fn create_dataset(&self, name: &str, description: &str) -> Result<DatasetMeta>;

    fn link_dataset_image(&self, dataset: DatasetId, image: ImageId) -> Result<()>;

    fn link_project_dataset(&self, project: ProjectId, dataset: DatasetId) -> Result<()>;

    /// Release the session. Called once by [`Session`].
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Owns a gateway for the duration of a run and closes it on every exit
/// path, including early returns and errors.
pub struct Session<G: Gateway> {
    gateway: G,
    closed: bool,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            closed: false,
        }
    }

    /// Close explicitly, surfacing any error from the gateway.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.gateway.close()
    }
}

impl<G: Gateway> Deref for Session<G> {
    type Target = G;

    fn deref(&self) -> &G {
        &self.gateway
    }
}

impl<G: Gateway> Drop for Session<G> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        debug!("Closing session on drop");
        if let Err(e) = self.gateway.close() {
            warn!(error = %e, "Failed to close session");
        }
    }
}
