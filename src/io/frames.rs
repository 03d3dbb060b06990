//! Frame extraction from animated GIFs and frame directories
//!
//! Animated input is decoded in full and resampled to the target frame rate:
//! the clip lasts as long as the sum of its frame delays, and output frame `i`
//! shows whichever source frame is on screen at `i / fps` seconds. A directory
//! of stills is taken frame for frame, ordered by file name.

use crate::io::configuration::{DEFAULT_GIF_FRAME_DELAY_MS, FRAME_EXTENSIONS};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::io::image::{flatten_alpha, load_raster};
use crate::pipeline::executor::FrameSequence;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Frames ready for rendering and the rate they play back at
#[derive(Debug)]
pub struct ExtractedVideo {
    /// Frames in temporal order
    pub frames: FrameSequence,
    /// Playback rate in frames per second
    pub frame_rate: u32,
}

/// Extract frames from an animated GIF or a directory of stills
///
/// # Errors
///
/// Returns an error if:
/// - `frame_rate` is zero
/// - The GIF cannot be decoded or contains no frames
/// - The directory cannot be read or contains no stills
pub fn extract_frames<P: AsRef<Path>>(path: P, frame_rate: u32) -> Result<ExtractedVideo> {
    let path = path.as_ref();
    if frame_rate == 0 {
        return Err(invalid_parameter("fps", &frame_rate, &"must be positive"));
    }

    let frames = if path.is_dir() {
        read_frame_directory(path)?
    } else {
        let (decoded, delays) = decode_gif(path)?;
        let timeline = resample_timeline(&delays, frame_rate);
        debug!(
            source_frames = decoded.len(),
            sampled_frames = timeline.len(),
            "resampled animation"
        );
        timeline
            .iter()
            .filter_map(|&index| decoded.get(index).cloned())
            .collect()
    };

    info!(path = %path.display(), frames = frames.len(), frame_rate, "extracted frames");
    Ok(ExtractedVideo { frames, frame_rate })
}

/// Decode every frame of a GIF with its delay in milliseconds
///
/// Transparent pixels are composited onto the white mosaic background.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, decoded, or has no frames
pub fn decode_gif(path: &Path) -> Result<(FrameSequence, Vec<u32>)> {
    let load_error = |source| MosaicError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation: "open animation",
        source: e,
    })?;
    let decoder = GifDecoder::new(BufReader::new(file)).map_err(load_error)?;
    let decoded = decoder
        .into_frames()
        .collect_frames()
        .map_err(load_error)?;

    if decoded.is_empty() {
        return Err(MosaicError::InvalidSourceData {
            reason: format!("'{}' contains no frames", path.display()),
        });
    }

    let mut frames = Vec::with_capacity(decoded.len());
    let mut delays = Vec::with_capacity(decoded.len());
    for frame in decoded {
        let (numer, denom) = frame.delay().numer_denom_ms();
        delays.push(numer / denom.max(1));
        frames.push(flatten_alpha(&frame.into_buffer()));
    }

    Ok((frames, delays))
}

/// Source frame shown at each output tick of a `frame_rate` timeline
///
/// Zero delays count as [`DEFAULT_GIF_FRAME_DELAY_MS`]. A clip shorter than
/// one tick still yields its first frame.
pub fn resample_timeline(delays_ms: &[u32], frame_rate: u32) -> Vec<usize> {
    if delays_ms.is_empty() || frame_rate == 0 {
        return Vec::new();
    }

    let delays: Vec<u64> = delays_ms
        .iter()
        .map(|&delay| u64::from(if delay == 0 { DEFAULT_GIF_FRAME_DELAY_MS } else { delay }))
        .collect();
    let fps = u64::from(frame_rate);
    let duration_ms: u64 = delays.iter().sum();
    let count = (duration_ms * fps / 1000).max(1);

    let mut timeline = Vec::with_capacity(count as usize);
    let mut source = 0;
    let mut source_end = delays.first().copied().unwrap_or(0);

    for tick in 0..count {
        // tick / fps seconds has passed the end of the current source frame
        while tick * 1000 >= source_end * fps {
            let Some(next) = delays.get(source + 1) else {
                break;
            };
            source += 1;
            source_end += next;
        }
        timeline.push(source);
    }

    timeline
}

/// Load every still in `dir`, ordered by file name
///
/// Digit runs in names compare by value, so `frame2.png` precedes
/// `frame10.png` whether or not the numbers are zero padded.
///
/// # Errors
///
/// Returns an error if the directory cannot be read, a still cannot be
/// decoded, or no stills are present
pub fn read_frame_directory(dir: &Path) -> Result<FrameSequence> {
    let read_error = |e| MosaicError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read frame directory",
        source: e,
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && is_frame_file(&path) {
            paths.push(path);
        }
    }
    paths.sort_by_cached_key(|path| frame_order_key(path));

    if paths.is_empty() {
        return Err(MosaicError::InvalidSourceData {
            reason: format!("no frames found in '{}'", dir.display()),
        });
    }

    paths.iter().map(load_raster).collect::<Result<Vec<RgbImage>>>()
}

/// Piece of a file name for natural ordering
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk {
    /// Digit run as (significant digit count, significant digits)
    Number(usize, String),
    Text(String),
}

fn frame_order_key(path: &Path) -> (Vec<NameChunk>, PathBuf) {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut chunks = Vec::new();
    let mut rest = name.as_str();
    while let Some(first) = rest.chars().next() {
        let is_digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != is_digit)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        chunks.push(if is_digit {
            let digits = run.trim_start_matches('0');
            NameChunk::Number(digits.len(), digits.to_string())
        } else {
            NameChunk::Text(run.to_lowercase())
        });
        rest = tail;
    }

    // Full path breaks ties such as `frame01` against `frame1`
    (chunks, path.to_path_buf())
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            FRAME_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}
