//! Error taxonomy for tileset loading, grid planning, rendering and export

use std::fmt;
use std::path::PathBuf;

/// Main error type for all mosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// Failed to decode a tileset or source raster
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Tileset dimensions do not match the fixed spritesheet grid
    Layout {
        /// Width of the offending spritesheet in pixels
        width: u32,
        /// Height of the offending spritesheet in pixels
        height: u32,
        /// Which part of the layout contract was violated
        reason: String,
    },

    /// Requested tile count per row cannot be laid over the source
    ///
    /// Raised when the derived tile side would be zero, i.e. the source is
    /// narrower than the number of requested columns.
    InvalidResolution {
        /// Source width in pixels
        width: u32,
        /// Requested number of tiles per row
        columns_per_row: u32,
    },

    /// Rendering of a single frame failed
    FrameRender {
        /// Position of the frame in the input sequence
        index: usize,
        /// Failure raised while rendering that frame
        source: Box<MosaicError>,
    },

    /// Configuration value rejected before any work was done
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Input is readable but unusable, e.g. an empty frame sequence
    InvalidSourceData {
        /// Description of what's wrong with the source data
        reason: String,
    },

    /// Failed to encode or save an output raster
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl MosaicError {
    /// Index of the frame that failed, for frame render errors
    pub const fn frame_index(&self) -> Option<usize> {
        match self {
            Self::FrameRender { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Whether this error belongs to the unreadable-asset class
    pub const fn is_load_error(&self) -> bool {
        matches!(self, Self::ImageLoad { .. } | Self::FileSystem { .. })
    }

    /// Wrap this error as the failure of frame `index`
    pub fn in_frame(self, index: usize) -> Self {
        Self::FrameRender {
            index,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::Layout {
                width,
                height,
                reason,
            } => {
                write!(f, "Invalid tileset layout ({width}x{height}): {reason}")
            }
            Self::InvalidResolution {
                width,
                columns_per_row,
            } => {
                write!(
                    f,
                    "Cannot fit {columns_per_row} tiles per row into a source {width}px wide"
                )
            }
            Self::FrameRender { index, source } => {
                write!(f, "Failed to render frame {index}: {source}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidSourceData { reason } => {
                write!(f, "Invalid source data: {reason}")
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::FrameRender { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a tileset layout error
pub fn layout_error(width: u32, height: u32, reason: &impl ToString) -> MosaicError {
    MosaicError::Layout {
        width,
        height,
        reason: reason.to_string(),
    }
}
