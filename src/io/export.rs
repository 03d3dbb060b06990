//! Serialization of rendered frame sequences

use crate::io::configuration::{FRAME_FILE_PREFIX, FRAME_NUMBER_WIDTH};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{ensure_parent_dir, save_raster};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where and how a rendered sequence is written
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    /// Numbered PNG stills inside a directory
    StillSequence(PathBuf),
    /// One looping animated GIF
    AnimatedContainer {
        /// File to write
        path: PathBuf,
        /// Playback rate in frames per second
        frame_rate: u32,
    },
}

impl OutputTarget {
    /// Directory or file this target writes to
    pub fn path(&self) -> &Path {
        match self {
            Self::StillSequence(dir) => dir,
            Self::AnimatedContainer { path, .. } => path,
        }
    }
}

/// File name of frame `index` in a still sequence
pub fn frame_file_name(index: usize) -> String {
    format!(
        "{FRAME_FILE_PREFIX}{index:0width$}.png",
        width = FRAME_NUMBER_WIDTH
    )
}

/// Write `frames` to `target`, calling `on_written` after each frame
///
/// # Errors
///
/// Returns an error if:
/// - `frames` is empty
/// - The animated target has a zero frame rate
/// - Any file or directory cannot be created or encoded
pub fn write_sequence<F>(frames: &[RgbImage], target: &OutputTarget, mut on_written: F) -> Result<()>
where
    F: FnMut(usize),
{
    if frames.is_empty() {
        return Err(MosaicError::InvalidSourceData {
            reason: "no frames to write".to_string(),
        });
    }

    match target {
        OutputTarget::StillSequence(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| MosaicError::FileSystem {
                path: dir.clone(),
                operation: "create directory",
                source: e,
            })?;
            for (index, frame) in frames.iter().enumerate() {
                save_raster(frame, dir.join(frame_file_name(index)))?;
                on_written(index);
            }
        }
        OutputTarget::AnimatedContainer { path, frame_rate } => {
            write_gif(frames, path, *frame_rate, &mut on_written)?;
        }
    }

    info!(path = %target.path().display(), frames = frames.len(), "wrote sequence");
    Ok(())
}

fn write_gif<F>(frames: &[RgbImage], path: &Path, frame_rate: u32, on_written: &mut F) -> Result<()>
where
    F: FnMut(usize),
{
    if frame_rate == 0 {
        return Err(invalid_parameter("fps", &frame_rate, &"must be positive"));
    }
    let export_error = |source| MosaicError::ImageExport {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "create file",
        source: e,
    })?;

    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite).map_err(export_error)?;

    let delay = Delay::from_numer_denom_ms(1000, frame_rate);
    for (index, frame) in frames.iter().enumerate() {
        let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
        encoder
            .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
            .map_err(export_error)?;
        on_written(index);
    }

    Ok(())
}
