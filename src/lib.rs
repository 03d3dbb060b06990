//! Photomosaic rendering for still images and animations
//!
//! A source frame is split into a grid of square cells. Each cell's mean
//! brightness picks a tile column from a spritesheet palette, a random variant
//! row adds variety, and the tile replaces the cell. Animations are rendered
//! frame by frame on a worker pool and reassembled in their original order.

#![forbid(unsafe_code)]

/// Input/output operations, configuration and error handling
pub mod io;
/// Grid planning, brightness sampling, tile palettes and frame rendering
pub mod mosaic;
/// Parallel, order-preserving frame processing
pub mod pipeline;

pub use io::error::{MosaicError, Result};
