use std::fmt;

use ndarray::{s, Array2, ArrayView2};
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{PixkitError, Result};

/// Element type shared by every plane of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    Uint8,
    Uint16,
    Float,
}

impl PixelType {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Float => 4,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint8 => write!(f, "uint8"),
            Self::Uint16 => write!(f, "uint16"),
            Self::Float => write!(f, "float"),
        }
    }
}

/// Position of a single plane within a 5D image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlaneCoord {
    pub z: usize,
    pub c: usize,
    pub t: usize,
}

impl PlaneCoord {
    pub fn new(z: usize, c: usize, t: usize) -> Self {
        Self { z, c, t }
    }
}

impl fmt::Display for PlaneCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(z={}, c={}, t={})", self.z, self.c, self.t)
    }
}

/// A rectangular sub-region of a plane, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A single 2D slice of an image, shape = (height, width).
#[derive(Clone, Debug, PartialEq)]
pub enum Plane {
    Uint8(Array2<u8>),
    Uint16(Array2<u16>),
    Float(Array2<f32>),
}

impl Plane {
    /// All-zero plane of the given type and size.
    pub fn zeros(pixel_type: PixelType, height: usize, width: usize) -> Self {
        match pixel_type {
            PixelType::Uint8 => Self::Uint8(Array2::zeros((height, width))),
            PixelType::Uint16 => Self::Uint16(Array2::zeros((height, width))),
            PixelType::Float => Self::Float(Array2::zeros((height, width))),
        }
    }

    pub fn pixel_type(&self) -> PixelType {
        match self {
            Self::Uint8(_) => PixelType::Uint8,
            Self::Uint16(_) => PixelType::Uint16,
            Self::Float(_) => PixelType::Float,
        }
    }

    /// (height, width)
    pub fn dim(&self) -> (usize, usize) {
        match self {
            Self::Uint8(a) => a.dim(),
            Self::Uint16(a) => a.dim(),
            Self::Float(a) => a.dim(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Self::Uint8(a) => a.iter().all(|v| *v == 0),
            Self::Uint16(a) => a.iter().all(|v| *v == 0),
            Self::Float(a) => a.iter().all(|v| *v == 0.0),
        }
    }

    /// Shift the plane content by (dx, dy), keeping shape and pixel type.
    /// See [`offset_array`].
    pub fn offset(&self, dx: i64, dy: i64) -> Plane {
        match self {
            Self::Uint8(a) => Self::Uint8(offset_array(a.view(), dx, dy)),
            Self::Uint16(a) => Self::Uint16(offset_array(a.view(), dx, dy)),
            Self::Float(a) => Self::Float(offset_array(a.view(), dx, dy)),
        }
    }

    /// Copy out the region covered by `tile`.
    pub fn crop(&self, tile: &Tile) -> Result<Plane> {
        let (h, w) = self.dim();
        let x1 = tile.x as usize + tile.width as usize;
        let y1 = tile.y as usize + tile.height as usize;
        if x1 > w || y1 > h {
            return Err(PixkitError::TileOutOfBounds {
                x: tile.x,
                y: tile.y,
                width: tile.width,
                height: tile.height,
                plane_width: w,
                plane_height: h,
            });
        }
        let (x0, y0) = (tile.x as usize, tile.y as usize);
        Ok(match self {
            Self::Uint8(a) => Self::Uint8(a.slice(s![y0..y1, x0..x1]).to_owned()),
            Self::Uint16(a) => Self::Uint16(a.slice(s![y0..y1, x0..x1]).to_owned()),
            Self::Float(a) => Self::Float(a.slice(s![y0..y1, x0..x1]).to_owned()),
        })
    }
}

/// Split a shift along one axis of length `len` into
/// (source start, destination start, span length).
fn shift_span(len: usize, shift: i64) -> (usize, usize, usize) {
    let mag = (shift.unsigned_abs() as usize).min(len);
    let span = len - mag;
    if shift >= 0 {
        (0, mag, span)
    } else {
        (mag, 0, span)
    }
}

/// Shift a 2D array by `dx` columns and `dy` rows.
///
/// Positive `dx` moves content right and zero-fills the left edge, negative
/// moves it left and zero-fills the right edge. `dy` works the same way with
/// positive values moving content down. The output always has the input's
/// shape; a shift at least as large as the axis leaves only zeros.
pub fn offset_array<T: Clone + Zero>(plane: ArrayView2<'_, T>, dx: i64, dy: i64) -> Array2<T> {
    if dx == 0 && dy == 0 {
        return plane.to_owned();
    }
    let (h, w) = plane.dim();
    let (src_x, dst_x, cols) = shift_span(w, dx);
    let (src_y, dst_y, rows) = shift_span(h, dy);

    let mut out = Array2::zeros((h, w));
    out.slice_mut(s![dst_y..dst_y + rows, dst_x..dst_x + cols])
        .assign(&plane.slice(s![src_y..src_y + rows, src_x..src_x + cols]));
    out
}
