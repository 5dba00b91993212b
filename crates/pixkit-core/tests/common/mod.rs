#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use ndarray::Array2;

use pixkit_core::error::{PixkitError, Result};
use pixkit_core::gateway::{DatasetMeta, Gateway, ImageMeta, NewImage, ProjectMeta};
use pixkit_core::jobs::{JobStage, ProgressReporter};
use pixkit_core::pixels::{PixelType, Plane, PlaneCoord, Tile};
use pixkit_core::roi::{Roi, Shape};

/// Deterministic non-zero 16-bit plane, distinct per (z, c, t).
pub fn pattern_plane(coord: PlaneCoord, height: usize, width: usize) -> Plane {
    let base = 100 * coord.z as u32 + 1000 * coord.c as u32 + 10000 * coord.t as u32;
    let data = Array2::from_shape_fn((height, width), |(r, c)| {
        (base + ((r * width + c) % 97) as u32 + 1) as u16
    });
    Plane::Uint16(data)
}

/// Plane whose pixel value is `row * width + col + 1`.
pub fn ramp_plane(height: usize, width: usize) -> Array2<u16> {
    Array2::from_shape_fn((height, width), |(r, c)| (r * width + c + 1) as u16)
}

pub fn rect(x: f64, y: f64, width: f64, height: f64, z: usize, t: usize) -> Shape {
    Shape::Rectangle {
        x,
        y,
        width,
        height,
        z,
        t,
    }
}

/// Reporter keeping every progress call as a line of text.
#[derive(Default)]
pub struct Recorder {
    pub events: RefCell<Vec<String>>,
}

impl ProgressReporter for Recorder {
    fn begin_stage(&self, stage: JobStage, total_items: Option<usize>) {
        self.events
            .borrow_mut()
            .push(format!("begin {stage:?} {total_items:?}"));
    }

    fn advance(&self, items_done: usize) {
        self.events.borrow_mut().push(format!("advance {items_done}"));
    }

    fn finish_stage(&self) {
        self.events.borrow_mut().push("finish".to_string());
    }
}

/// In-memory gateway recording every call the jobs make.
#[derive(Default)]
pub struct MemoryGateway {
    next_id: Cell<u64>,
    pub images: RefCell<Vec<ImageMeta>>,
    pub planes: RefCell<HashMap<(u64, PlaneCoord), Plane>>,
    pub failing_planes: RefCell<HashSet<(u64, PlaneCoord)>>,
    pub rois: RefCell<HashMap<u64, Vec<Roi>>>,
    pub datasets: RefCell<Vec<(DatasetMeta, Vec<u64>)>>,
    pub projects: RefCell<Vec<(ProjectMeta, Vec<u64>)>>,
    pub created: RefCell<Vec<NewImage>>,
    pub plane_requests: RefCell<Vec<(u64, PlaneCoord)>>,
    pub tile_requests: RefCell<Vec<(u64, PlaneCoord, Tile)>>,
    pub closed: Cell<usize>,
    /// Make `create_image` fail after consuming the planes.
    pub fail_create: Cell<bool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            ..Default::default()
        }
    }

    fn allocate(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Add a 16-bit image filled with [`pattern_plane`] data.
    pub fn add_image(
        &self,
        name: &str,
        size_x: u32,
        size_y: u32,
        size_z: usize,
        size_c: usize,
        size_t: usize,
    ) -> ImageMeta {
        let meta = ImageMeta {
            id: self.allocate(),
            name: name.to_string(),
            description: String::new(),
            size_x,
            size_y,
            size_z,
            size_c,
            size_t,
            pixel_type: PixelType::Uint16,
            channels: (0..size_c).map(|c| format!("ch{c}")).collect(),
            physical_size_x: Some(0.1),
            physical_size_y: Some(0.1),
            requires_pyramid: false,
        };
        let mut planes = self.planes.borrow_mut();
        for z in 0..size_z {
            for c in 0..size_c {
                for t in 0..size_t {
                    let coord = PlaneCoord::new(z, c, t);
                    planes.insert(
                        (meta.id, coord),
                        pattern_plane(coord, size_y as usize, size_x as usize),
                    );
                }
            }
        }
        self.images.borrow_mut().push(meta.clone());
        meta
    }

    pub fn set_pyramid(&self, image: u64) {
        for meta in self.images.borrow_mut().iter_mut() {
            if meta.id == image {
                meta.requires_pyramid = true;
            }
        }
    }

    pub fn add_dataset(&self, name: &str, can_link: bool, images: &[u64]) -> DatasetMeta {
        let meta = DatasetMeta {
            id: self.allocate(),
            name: name.to_string(),
            description: String::new(),
            can_link,
        };
        self.datasets
            .borrow_mut()
            .push((meta.clone(), images.to_vec()));
        meta
    }

    pub fn add_project(&self, name: &str, can_link: bool, datasets: &[u64]) -> ProjectMeta {
        let meta = ProjectMeta {
            id: self.allocate(),
            name: name.to_string(),
            description: String::new(),
            can_link,
        };
        self.projects
            .borrow_mut()
            .push((meta.clone(), datasets.to_vec()));
        meta
    }

    pub fn add_roi(&self, image: u64, shapes: Vec<Shape>) {
        let roi = Roi {
            id: self.allocate(),
            shapes,
        };
        self.rois.borrow_mut().entry(image).or_default().push(roi);
    }

    pub fn stored_plane(&self, image: u64, coord: PlaneCoord) -> Plane {
        self.planes.borrow()[&(image, coord)].clone()
    }

    pub fn dataset_members(&self, dataset: u64) -> Vec<u64> {
        self.datasets
            .borrow()
            .iter()
            .find(|(d, _)| d.id == dataset)
            .map(|(_, images)| images.clone())
            .unwrap_or_default()
    }

    pub fn project_members(&self, project: u64) -> Vec<u64> {
        self.projects
            .borrow()
            .iter()
            .find(|(p, _)| p.id == project)
            .map(|(_, datasets)| datasets.clone())
            .unwrap_or_default()
    }
}

impl Gateway for MemoryGateway {
    fn image(&self, id: u64) -> Result<Option<ImageMeta>> {
        Ok(self.images.borrow().iter().find(|i| i.id == id).cloned())
    }

    fn dataset(&self, id: u64) -> Result<Option<DatasetMeta>> {
        Ok(self
            .datasets
            .borrow()
            .iter()
            .find(|(d, _)| d.id == id)
            .map(|(d, _)| d.clone()))
    }

    fn dataset_images(&self, dataset: u64) -> Result<Vec<ImageMeta>> {
        let members = self.dataset_members(dataset);
        let images = self.images.borrow();
        Ok(members
            .iter()
            .filter_map(|id| images.iter().find(|i| i.id == *id).cloned())
            .collect())
    }

    fn image_parent(&self, image: u64) -> Result<Option<DatasetMeta>> {
        Ok(self
            .datasets
            .borrow()
            .iter()
            .find(|(_, images)| images.contains(&image))
            .map(|(d, _)| d.clone()))
    }

    fn dataset_parent(&self, dataset: u64) -> Result<Option<ProjectMeta>> {
        Ok(self
            .projects
            .borrow()
            .iter()
            .find(|(_, datasets)| datasets.contains(&dataset))
            .map(|(p, _)| p.clone()))
    }

    fn plane(&self, image: u64, coord: PlaneCoord) -> Result<Plane> {
        self.plane_requests.borrow_mut().push((image, coord));
        if self.failing_planes.borrow().contains(&(image, coord)) {
            return Err(PixkitError::Store("simulated fetch failure".into()));
        }
        self.planes
            .borrow()
            .get(&(image, coord))
            .cloned()
            .ok_or(PixkitError::PlaneOutOfRange {
                image,
                z: coord.z as i64,
                c: coord.c,
                t: coord.t,
            })
    }

    fn tile(&self, image: u64, coord: PlaneCoord, tile: &Tile) -> Result<Plane> {
        self.tile_requests.borrow_mut().push((image, coord, *tile));
        self.plane(image, coord)?.crop(tile)
    }

    fn rois(&self, image: u64) -> Result<Vec<Roi>> {
        Ok(self.rois.borrow().get(&image).cloned().unwrap_or_default())
    }

    fn create_image(
        &self,
        request: &NewImage,
        planes: &mut dyn Iterator<Item = Result<Plane>>,
    ) -> Result<ImageMeta> {
        let expected = request.plane_count();
        let planes: Vec<Plane> = planes.take(expected).collect::<Result<_>>()?;
        if self.fail_create.get() {
            return Err(PixkitError::Store("simulated create failure".into()));
        }
        if planes.len() != expected || planes.is_empty() {
            return Err(PixkitError::PlaneCount {
                expected,
                actual: planes.len(),
            });
        }
        let (h, w) = planes[0].dim();
        let meta = ImageMeta {
            id: self.allocate(),
            name: request.name.clone(),
            description: request.description.clone(),
            size_x: w as u32,
            size_y: h as u32,
            size_z: request.size_z,
            size_c: request.size_c,
            size_t: request.size_t,
            pixel_type: planes[0].pixel_type(),
            channels: Vec::new(),
            physical_size_x: request.physical_size_x,
            physical_size_y: request.physical_size_y,
            requires_pyramid: false,
        };
        let mut stored = self.planes.borrow_mut();
        for (i, plane) in planes.into_iter().enumerate() {
            stored.insert((meta.id, request.coord_at(i)), plane);
        }
        self.images.borrow_mut().push(meta.clone());
        self.created.borrow_mut().push(request.clone());
        Ok(meta)
    }

    fn create_dataset(&self, name: &str, description: &str) -> Result<DatasetMeta> {
        let meta = DatasetMeta {
            id: self.allocate(),
            name: name.to_string(),
            description: description.to_string(),
            can_link: true,
        };
        self.datasets.borrow_mut().push((meta.clone(), Vec::new()));
        Ok(meta)
    }

    fn link_dataset_image(&self, dataset: u64, image: u64) -> Result<()> {
        let mut datasets = self.datasets.borrow_mut();
        let (meta, images) = datasets
            .iter_mut()
            .find(|(d, _)| d.id == dataset)
            .ok_or(PixkitError::NotFound {
                kind: "Dataset",
                id: dataset,
            })?;
        if !meta.can_link {
            return Err(PixkitError::LinkDenied(format!("dataset {dataset}")));
        }
        images.push(image);
        Ok(())
    }

    fn link_project_dataset(&self, project: u64, dataset: u64) -> Result<()> {
        let mut projects = self.projects.borrow_mut();
        let (meta, datasets) = projects
            .iter_mut()
            .find(|(p, _)| p.id == project)
            .ok_or(PixkitError::NotFound {
                kind: "Project",
                id: project,
            })?;
        if !meta.can_link {
            return Err(PixkitError::LinkDenied(format!("project {project}")));
        }
        datasets.push(dataset);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.closed.set(self.closed.get() + 1);
        Ok(())
    }
}
