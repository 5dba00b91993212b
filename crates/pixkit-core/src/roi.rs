use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::STACK_CHANNEL;
use crate::error::{PixkitError, Result};
use crate::pixels::{PlaneCoord, Tile};

/// A geometric annotation attached to an ROI, located on one (z, t) plane.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        z: usize,
        t: usize,
    },
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
        z: usize,
        t: usize,
    },
    Point {
        x: f64,
        y: f64,
        z: usize,
        t: usize,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        z: usize,
        t: usize,
    },
    Polygon {
        points: Vec<[f64; 2]>,
        z: usize,
        t: usize,
    },
    Label {
        x: f64,
        y: f64,
        text: String,
        z: usize,
        t: usize,
    },
    Mask {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        z: usize,
        t: usize,
    },
}

/// An ROI record: a group of shapes on one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub id: u64,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Roi {
    pub fn has_rectangle(&self) -> bool {
        self.shapes
            .iter()
            .any(|s| matches!(s, Shape::Rectangle { .. }))
    }
}

/// Axis-aligned box in pixel coordinates. May lie partly or wholly outside
/// the image until clamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clip the box to `[0, image_width) x [0, image_height)`, recomputing
    /// width and height from the clipped edges. Never fails; a box entirely
    /// outside the image comes back with a non-positive extent.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> BoundingBox {
        let x = self.x.max(0);
        let y = self.y.max(0);
        let x2 = self.x.saturating_add(self.width).min(image_width as i64);
        let y2 = self.y.saturating_add(self.height).min(image_height as i64);
        BoundingBox {
            x,
            y,
            width: x2.saturating_sub(x),
            height: y2.saturating_sub(y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn to_tile(&self) -> Result<Tile> {
        let empty = || PixkitError::EmptyRegion {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        };
        if self.is_empty() {
            return Err(empty());
        }
        Ok(Tile {
            x: u32::try_from(self.x).map_err(|_| empty())?,
            y: u32::try_from(self.y).map_err(|_| empty())?,
            width: u32::try_from(self.width).map_err(|_| empty())?,
            height: u32::try_from(self.height).map_err(|_| empty())?,
        })
    }
}

/// The rectangle of one ROI with the z/t range covered by all of its
/// rectangle shapes. Ranges are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RectRoi {
    pub bbox: BoundingBox,
    pub z_start: usize,
    pub z_end: usize,
    pub t_start: usize,
    pub t_end: usize,
}

impl RectRoi {
    pub fn size_z(&self) -> usize {
        self.z_end - self.z_start + 1
    }

    pub fn size_t(&self) -> usize {
        self.t_end - self.t_start + 1
    }
}

/// Extract the rectangle of an ROI.
///
/// x/y/width/height come from the first rectangle shape (truncated toward
/// zero); the z and t ranges widen over every rectangle. Other shape kinds
/// are ignored. Returns `None` if the ROI has no rectangle.
pub fn rectangle_roi(roi: &Roi) -> Option<RectRoi> {
    let mut found: Option<RectRoi> = None;
    for shape in &roi.shapes {
        let (x, y, width, height, z, t) = match *shape {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
                z,
                t,
            } => (x, y, width, height, z, t),
            Shape::Ellipse { .. }
            | Shape::Point { .. }
            | Shape::Line { .. }
            | Shape::Polygon { .. }
            | Shape::Label { .. }
            | Shape::Mask { .. } => continue,
        };
        match found.as_mut() {
            Some(rect) => {
                rect.z_start = rect.z_start.min(z);
                rect.z_end = rect.z_end.max(z);
                rect.t_start = rect.t_start.min(t);
                rect.t_end = rect.t_end.max(t);
            }
            None => {
                found = Some(RectRoi {
                    bbox: BoundingBox::new(
                        x.trunc() as i64,
                        y.trunc() as i64,
                        width.trunc() as i64,
                        height.trunc() as i64,
                    ),
                    z_start: z,
                    z_end: z,
                    t_start: t,
                    t_end: t,
                });
            }
        }
    }
    found
}

/// Rectangles of every ROI that has at least one, in ROI order.
pub fn rectangles(rois: &[Roi]) -> Vec<RectRoi> {
    rois.iter().filter_map(rectangle_roi).collect()
}

/// Clamp every rectangle to the image bounds, logging the ones that moved.
pub fn clamp_all(rects: &mut [RectRoi], image_width: u32, image_height: u32) {
    for rect in rects.iter_mut() {
        let clamped = rect.bbox.clamp_to(image_width, image_height);
        if clamped != rect.bbox {
            info!(
                from = ?rect.bbox,
                to = ?clamped,
                "Cropping ROI to be within image"
            );
            rect.bbox = clamped;
        }
    }
}

/// One tile to fetch from the source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRequest {
    pub coord: PlaneCoord,
    pub tile: Tile,
}

/// Tiles for an ROI image stack: one per ROI at its first z, first t and
/// channel 0.
///
/// Every tile takes the width and height of the first ROI. The ROIs are
/// expected to share one size; others are not checked.
pub fn stack_tiles(rois: &[RectRoi]) -> Result<Vec<TileRequest>> {
    let Some(first) = rois.first() else {
        return Ok(Vec::new());
    };
    rois.iter()
        .map(|roi| {
            let tile = BoundingBox::new(
                roi.bbox.x,
                roi.bbox.y,
                first.bbox.width,
                first.bbox.height,
            )
            .to_tile()?;
            Ok(TileRequest {
                coord: PlaneCoord::new(roi.z_start, STACK_CHANNEL, roi.t_start),
                tile,
            })
        })
        .collect()
}

/// Tiles for a per-ROI image: the ROI's z range x all `size_c` channels x
/// its t range, z-major then c then t.
pub fn roi_tiles(roi: &RectRoi, size_c: usize) -> Result<Vec<TileRequest>> {
    let tile = roi.bbox.to_tile()?;
    let mut tiles = Vec::with_capacity(roi.size_z() * size_c * roi.size_t());
    for z in roi.z_start..=roi.z_end {
        for c in 0..size_c {
            for t in roi.t_start..=roi.t_end {
                tiles.push(TileRequest {
                    coord: PlaneCoord::new(z, c, t),
                    tile,
                });
            }
        }
    }
    Ok(tiles)
}
