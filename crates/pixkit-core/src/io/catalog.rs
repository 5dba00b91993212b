use serde::{Deserialize, Serialize};

use crate::gateway::{DatasetId, DatasetMeta, ImageId, ImageMeta, ProjectId, ProjectMeta};
use crate::roi::{Roi, Shape};

/// Object graph of a local store, persisted as `catalog.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default)]
    pub datasets: Vec<DatasetRecord>,
    #[serde(default)]
    pub images: Vec<ImageMeta>,
    #[serde(default)]
    pub rois: Vec<RoiRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub can_link: bool,
    #[serde(default)]
    pub datasets: Vec<DatasetId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: DatasetId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub can_link: bool,
    #[serde(default)]
    pub images: Vec<ImageId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiRecord {
    pub id: u64,
    pub image: ImageId,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

fn default_true() -> bool {
    true
}

impl ProjectRecord {
    pub fn meta(&self) -> ProjectMeta {
        ProjectMeta {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            can_link: self.can_link,
        }
    }
}

impl DatasetRecord {
    pub fn meta(&self) -> DatasetMeta {
        DatasetMeta {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            can_link: self.can_link,
        }
    }
}

impl RoiRecord {
    pub fn roi(&self) -> Roi {
        Roi {
            id: self.id,
            shapes: self.shapes.clone(),
        }
    }
}

impl Catalog {
    pub fn image(&self, id: ImageId) -> Option<&ImageMeta> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn dataset(&self, id: DatasetId) -> Option<&DatasetRecord> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn dataset_mut(&mut self, id: DatasetId) -> Option<&mut DatasetRecord> {
        self.datasets.iter_mut().find(|d| d.id == id)
    }

    pub fn project_mut(&mut self, id: ProjectId) -> Option<&mut ProjectRecord> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Hand out an id not used by any object in the catalog.
    pub fn allocate_id(&mut self) -> u64 {
        let max_used = self
            .projects
            .iter()
            .map(|p| p.id)
            .chain(self.datasets.iter().map(|d| d.id))
            .chain(self.images.iter().map(|i| i.id))
            .chain(self.rois.iter().map(|r| r.id))
            .max()
            .unwrap_or(0);
        let id = self.next_id.max(max_used + 1);
        self.next_id = id + 1;
        id
    }
}
