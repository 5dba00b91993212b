use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::consts::{CATALOG_FILE, PIXELS_DIR};
use crate::error::{PixkitError, Result};
use crate::gateway::{
    DatasetId, DatasetMeta, Gateway, ImageId, ImageMeta, NewImage, ProjectId, ProjectMeta,
};
use crate::pixels::{PixelType, Plane, PlaneCoord, Tile};
use crate::roi::{Roi, Shape};

use super::catalog::{Catalog, DatasetRecord, ProjectRecord, RoiRecord};
use super::plane_io::{load_plane, save_plane};

/// A platform stand-in kept in a directory: `catalog.toml` describes the
/// object graph and each plane lives in
/// `pixels/<image id>/z<z>_c<c>_t<t>.tif`.
///
/// Catalog changes stay in memory until [`LocalStore::save`] or
/// [`Gateway::close`].
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    catalog: RefCell<Catalog>,
    dirty: Cell<bool>,
}

impl LocalStore {
    /// Open an existing store.
    pub fn open(root: &Path) -> Result<Self> {
        let contents = fs::read_to_string(root.join(CATALOG_FILE))?;
        let catalog: Catalog = toml::from_str(&contents)?;
        info!(
            root = %root.display(),
            images = catalog.images.len(),
            datasets = catalog.datasets.len(),
            "Opened store"
        );
        Ok(Self {
            root: root.to_path_buf(),
            catalog: RefCell::new(catalog),
            dirty: Cell::new(false),
        })
    }

    /// Create an empty store at `root`, writing its catalog immediately.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join(PIXELS_DIR))?;
        let store = Self {
            root: root.to_path_buf(),
            catalog: RefCell::new(Catalog::default()),
            dirty: Cell::new(true),
        };
        store.save()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write the catalog if anything changed since the last save.
    pub fn save(&self) -> Result<()> {
        if !self.dirty.get() {
            return Ok(());
        }
        let contents = toml::to_string_pretty(&*self.catalog.borrow())?;
        fs::write(self.root.join(CATALOG_FILE), contents)?;
        self.dirty.set(false);
        debug!(root = %self.root.display(), "Catalog saved");
        Ok(())
    }

    pub fn plane_path(&self, image: ImageId, coord: PlaneCoord) -> PathBuf {
        self.root
            .join(PIXELS_DIR)
            .join(image.to_string())
            .join(format!("z{}_c{}_t{}.tif", coord.z, coord.c, coord.t))
    }

    pub fn all_images(&self) -> Vec<ImageMeta> {
        self.catalog.borrow().images.clone()
    }

    pub fn all_datasets(&self) -> Vec<DatasetRecord> {
        self.catalog.borrow().datasets.clone()
    }

    pub fn create_project(&self, name: &str, description: &str) -> Result<ProjectMeta> {
        let mut catalog = self.catalog.borrow_mut();
        let record = ProjectRecord {
            id: catalog.allocate_id(),
            name: name.to_string(),
            description: description.to_string(),
            can_link: true,
            datasets: Vec::new(),
        };
        let meta = record.meta();
        catalog.projects.push(record);
        self.dirty.set(true);
        Ok(meta)
    }

    /// Attach a new ROI made of `shapes` to an image.
    pub fn add_roi(&self, image: ImageId, shapes: Vec<Shape>) -> Result<u64> {
        let mut catalog = self.catalog.borrow_mut();
        if catalog.image(image).is_none() {
            return Err(PixkitError::NotFound { kind: "Image", id: image });
        }
        let id = catalog.allocate_id();
        catalog.rois.push(RoiRecord { id, image, shapes });
        self.dirty.set(true);
        Ok(id)
    }

    /// Change whether new links into a dataset are permitted.
    pub fn set_dataset_can_link(&self, dataset: DatasetId, can_link: bool) -> Result<()> {
        let mut catalog = self.catalog.borrow_mut();
        let record = catalog.dataset_mut(dataset).ok_or(PixkitError::NotFound {
            kind: "Dataset",
            id: dataset,
        })?;
        record.can_link = can_link;
        self.dirty.set(true);
        Ok(())
    }

    /// Name the channels of an image. Extra names are an error.
    pub fn set_channel_names(&self, image: ImageId, names: Vec<String>) -> Result<()> {
        let mut catalog = self.catalog.borrow_mut();
        let meta = catalog
            .images
            .iter_mut()
            .find(|i| i.id == image)
            .ok_or(PixkitError::NotFound { kind: "Image", id: image })?;
        if names.len() > meta.size_c {
            return Err(PixkitError::InvalidParams(format!(
                "{} channel names given for {} channels",
                names.len(),
                meta.size_c
            )));
        }
        meta.channels = names;
        self.dirty.set(true);
        Ok(())
    }

    fn image_meta(&self, id: ImageId) -> Result<ImageMeta> {
        self.catalog
            .borrow()
            .image(id)
            .cloned()
            .ok_or(PixkitError::NotFound { kind: "Image", id })
    }

    fn channel_names(&self, request: &NewImage) -> Vec<String> {
        let catalog = self.catalog.borrow();
        let Some(source) = request.source_image.and_then(|id| catalog.image(id)) else {
            return Vec::new();
        };
        match &request.channel_list {
            Some(list) => list
                .iter()
                .map(|&c| source.channels.get(c).cloned().unwrap_or_default())
                .collect(),
            None if source.channels.len() == request.size_c => source.channels.clone(),
            None => Vec::new(),
        }
    }

    /// Write `expected` planes under `dir`, returning the first plane's
    /// height, width and pixel type.
    fn write_planes(
        &self,
        id: ImageId,
        dir: &Path,
        request: &NewImage,
        planes: &mut dyn Iterator<Item = Result<Plane>>,
        expected: usize,
    ) -> Result<(usize, usize, PixelType)> {
        fs::create_dir_all(dir)?;
        let mut first: Option<(usize, usize, PixelType)> = None;
        let mut written = 0;
        for plane in planes.take(expected) {
            let plane = plane?;
            let (h, w) = plane.dim();
            match first {
                None => first = Some((h, w, plane.pixel_type())),
                Some((fh, fw, pixel_type)) => {
                    if (fh, fw) != (h, w) {
                        return Err(PixkitError::PlaneDimensions {
                            expected_w: fw,
                            expected_h: fh,
                            actual_w: w,
                            actual_h: h,
                        });
                    }
                    if pixel_type != plane.pixel_type() {
                        return Err(PixkitError::PixelTypeMismatch {
                            expected: pixel_type,
                            actual: plane.pixel_type(),
                        });
                    }
                }
            }
            save_plane(&plane, &self.plane_path(id, request.coord_at(written)))?;
            written += 1;
        }
        first
            .filter(|_| written == expected)
            .ok_or(PixkitError::PlaneCount {
                expected,
                actual: written,
            })
    }
}

impl Gateway for LocalStore {
    fn image(&self, id: ImageId) -> Result<Option<ImageMeta>> {
        Ok(self.catalog.borrow().image(id).cloned())
    }

    fn dataset(&self, id: DatasetId) -> Result<Option<DatasetMeta>> {
        Ok(self.catalog.borrow().dataset(id).map(DatasetRecord::meta))
    }

    fn dataset_images(&self, dataset: DatasetId) -> Result<Vec<ImageMeta>> {
        let catalog = self.catalog.borrow();
        let record = catalog.dataset(dataset).ok_or(PixkitError::NotFound {
            kind: "Dataset",
            id: dataset,
        })?;
        Ok(record
            .images
            .iter()
            .filter_map(|&id| catalog.image(id).cloned())
            .collect())
    }

    fn image_parent(&self, image: ImageId) -> Result<Option<DatasetMeta>> {
        Ok(self
            .catalog
            .borrow()
            .datasets
            .iter()
            .find(|d| d.images.contains(&image))
            .map(DatasetRecord::meta))
    }

    fn dataset_parent(&self, dataset: DatasetId) -> Result<Option<ProjectMeta>> {
        Ok(self
            .catalog
            .borrow()
            .projects
            .iter()
            .find(|p| p.datasets.contains(&dataset))
            .map(ProjectRecord::meta))
    }

    fn plane(&self, image: ImageId, coord: PlaneCoord) -> Result<Plane> {
        let meta = self.image_meta(image)?;
        if !meta.contains(coord) {
            return Err(PixkitError::PlaneOutOfRange {
                image,
                z: coord.z as i64,
                c: coord.c,
                t: coord.t,
            });
        }
        let plane = load_plane(&self.plane_path(image, coord))?;
        if plane.pixel_type() != meta.pixel_type {
            return Err(PixkitError::PixelTypeMismatch {
                expected: meta.pixel_type,
                actual: plane.pixel_type(),
            });
        }
        Ok(plane)
    }

    fn tile(&self, image: ImageId, coord: PlaneCoord, tile: &Tile) -> Result<Plane> {
        self.plane(image, coord)?.crop(tile)
    }

    fn rois(&self, image: ImageId) -> Result<Vec<Roi>> {
        Ok(self
            .catalog
            .borrow()
            .rois
            .iter()
            .filter(|r| r.image == image)
            .map(RoiRecord::roi)
            .collect())
    }

    fn create_image(
        &self,
        request: &NewImage,
        planes: &mut dyn Iterator<Item = Result<Plane>>,
    ) -> Result<ImageMeta> {
        let expected = request.plane_count();
        if expected == 0 {
            return Err(PixkitError::Store(format!(
                "image '{}' must have at least one plane",
                request.name
            )));
        }
        let previous_next = self.catalog.borrow().next_id;
        let id = self.catalog.borrow_mut().allocate_id();
        let dir = self.root.join(PIXELS_DIR).join(id.to_string());
        let (height, width, pixel_type) =
            match self.write_planes(id, &dir, request, planes, expected) {
                Ok(first) => first,
                Err(err) => {
                    self.catalog.borrow_mut().next_id = previous_next;
                    if dir.exists() {
                        if let Err(cleanup) = fs::remove_dir_all(&dir) {
                            warn!(dir = %dir.display(), error = %cleanup, "Could not remove partial image");
                        }
                    }
                    return Err(err);
                }
            };

        let meta = ImageMeta {
            id,
            name: request.name.clone(),
            description: request.description.clone(),
            size_x: width as u32,
            size_y: height as u32,
            size_z: request.size_z,
            size_c: request.size_c,
            size_t: request.size_t,
            pixel_type,
            channels: self.channel_names(request),
            physical_size_x: request.physical_size_x,
            physical_size_y: request.physical_size_y,
            requires_pyramid: false,
        };
        self.catalog.borrow_mut().images.push(meta.clone());
        self.dirty.set(true);
        info!(id, name = %meta.name, planes = expected, "Image created");
        Ok(meta)
    }

    fn create_dataset(&self, name: &str, description: &str) -> Result<DatasetMeta> {
        let mut catalog = self.catalog.borrow_mut();
        let record = DatasetRecord {
            id: catalog.allocate_id(),
            name: name.to_string(),
            description: description.to_string(),
            can_link: true,
            images: Vec::new(),
        };
        let meta = record.meta();
        catalog.datasets.push(record);
        self.dirty.set(true);
        Ok(meta)
    }

    fn link_dataset_image(&self, dataset: DatasetId, image: ImageId) -> Result<()> {
        let mut catalog = self.catalog.borrow_mut();
        if catalog.image(image).is_none() {
            return Err(PixkitError::NotFound { kind: "Image", id: image });
        }
        let record = catalog.dataset_mut(dataset).ok_or(PixkitError::NotFound {
            kind: "Dataset",
            id: dataset,
        })?;
        if !record.can_link {
            return Err(PixkitError::LinkDenied(format!("dataset {dataset}")));
        }
        if !record.images.contains(&image) {
            record.images.push(image);
        }
        self.dirty.set(true);
        Ok(())
    }

    fn link_project_dataset(&self, project: ProjectId, dataset: DatasetId) -> Result<()> {
        let mut catalog = self.catalog.borrow_mut();
        if catalog.dataset(dataset).is_none() {
            return Err(PixkitError::NotFound {
                kind: "Dataset",
                id: dataset,
            });
        }
        let record = catalog.project_mut(project).ok_or(PixkitError::NotFound {
            kind: "Project",
            id: project,
        })?;
        if !record.can_link {
            return Err(PixkitError::LinkDenied(format!("project {project}")));
        }
        if !record.datasets.contains(&dataset) {
            record.datasets.push(dataset);
        }
        self.dirty.set(true);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.save()
    }
}
