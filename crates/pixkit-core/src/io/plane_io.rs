use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::{PixkitError, Result};
use crate::pixels::Plane;

/// Save a plane as a single-page grayscale TIFF (8 or 16 bit).
pub fn save_plane(plane: &Plane, path: &Path) -> Result<()> {
    let (h, w) = plane.dim();
    let size_err = || PixkitError::Store(format!("plane buffer does not match {w}x{h}"));

    match plane {
        Plane::Uint8(data) => {
            let img = GrayImage::from_raw(w as u32, h as u32, data.iter().copied().collect())
                .ok_or_else(size_err)?;
            img.save_with_format(path, ImageFormat::Tiff)?;
        }
        Plane::Uint16(data) => {
            let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(
                w as u32,
                h as u32,
                data.iter().copied().collect(),
            )
            .ok_or_else(size_err)?;
            img.save_with_format(path, ImageFormat::Tiff)?;
        }
        Plane::Float(_) => {
            return Err(PixkitError::UnsupportedPixelType(
                "float planes cannot be written to TIFF".into(),
            ))
        }
    }
    Ok(())
}

/// Load a grayscale TIFF plane, keeping its bit depth.
pub fn load_plane(path: &Path) -> Result<Plane> {
    let img = image::open(path)?;
    match img {
        DynamicImage::ImageLuma8(buf) => {
            let (w, h) = buf.dimensions();
            let data = Array2::from_shape_vec((h as usize, w as usize), buf.into_raw())?;
            Ok(Plane::Uint8(data))
        }
        DynamicImage::ImageLuma16(buf) => {
            let (w, h) = buf.dimensions();
            let data = Array2::from_shape_vec((h as usize, w as usize), buf.into_raw())?;
            Ok(Plane::Uint16(data))
        }
        other => Err(PixkitError::UnsupportedPixelType(format!(
            "{:?} in {}",
            other.color(),
            path.display()
        ))),
    }
}
