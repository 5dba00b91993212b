use thiserror::Error;

use crate::pixels::PixelType;

#[derive(Error, Debug)]
pub enum PixkitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),

    #[error("Failed to serialize catalog: {0}")]
    CatalogWrite(#[from] toml::ser::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },

    #[error("Plane (z={z}, c={c}, t={t}) out of range for image {image}")]
    PlaneOutOfRange { image: u64, z: i64, c: usize, t: usize },

    #[error("Tile {x},{y} {width}x{height} exceeds plane dimensions {plane_width}x{plane_height}")]
    TileOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        plane_width: usize,
        plane_height: usize,
    },

    #[error("Region {x},{y} {width}x{height} is empty after clamping")]
    EmptyRegion { x: i64, y: i64, width: i64, height: i64 },

    #[error("Expected {expected} pixels, got {actual}")]
    PixelTypeMismatch { expected: PixelType, actual: PixelType },

    #[error("Unsupported pixel type for this store: {0}")]
    UnsupportedPixelType(String),

    #[error("Plane sequence yielded {actual} planes, expected {expected}")]
    PlaneCount { expected: usize, actual: usize },

    #[error("Plane dimensions {actual_w}x{actual_h} differ from {expected_w}x{expected_h}")]
    PlaneDimensions {
        expected_w: usize,
        expected_h: usize,
        actual_w: usize,
        actual_h: usize,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Link not permitted: {0}")]
    LinkDenied(String),
}

pub type Result<T> = std::result::Result<T, PixkitError>;
