//! Still raster decoding and saving

use crate::io::configuration::{BACKGROUND, OUTPUT_SUFFIX};
use crate::io::error::{MosaicError, Result};
use image::{Rgb, RgbImage, RgbaImage};
use std::path::{Path, PathBuf};

/// Decode any supported still image as 8-bit RGB
///
/// Transparent pixels are composited onto the white mosaic background.
///
/// # Errors
///
/// Returns `ImageLoad` if the file cannot be opened or decoded
pub fn load_raster<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path_buf = path.as_ref().to_path_buf();
    let img = image::open(&path_buf).map_err(|e| MosaicError::ImageLoad {
        path: path_buf,
        source: e,
    })?;
    if img.color().has_alpha() {
        Ok(flatten_alpha(&img.to_rgba8()))
    } else {
        Ok(img.to_rgb8())
    }
}

/// Composite `raster` over [`BACKGROUND`] and drop the alpha channel
pub fn flatten_alpha(raster: &RgbaImage) -> RgbImage {
    let [back_r, back_g, back_b] = BACKGROUND;
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |front: u8, back: u8| {
            ((u32::from(front) * alpha + u32::from(back) * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([blend(r, back_r), blend(g, back_g), blend(b, back_b)])
    })
}

/// Save `raster` with the format implied by the path's extension
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The extension names no supported format, or encoding fails
pub fn save_raster<P: AsRef<Path>>(raster: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    raster.save(path).map_err(|e| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create the directory that will hold `path`
///
/// # Errors
///
/// Returns `FileSystem` if the directory cannot be created
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
            path: parent.to_path_buf(),
            operation: "create directory",
            source: e,
        })?;
    }
    Ok(())
}

/// Default mosaic path next to `input`: `<stem>_mosaic.<ext>`
///
/// Inputs without an extension get a PNG.
pub fn mosaic_path_for(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let extension = input
        .extension()
        .map_or_else(|| "png".into(), |ext| ext.to_string_lossy());
    let output_name = format!("{}{OUTPUT_SUFFIX}.{extension}", stem.to_string_lossy());

    if let Some(parent) = input.parent() {
        parent.join(output_name)
    } else {
        PathBuf::from(output_name)
    }
}
