//! Single-frame photomosaic construction
//!
//! This module contains the per-frame building blocks:
//! - Grid planning from a source size and tile count per row
//! - Brightness sampling of pixel regions
//! - The brightness-indexed tile palette
//! - Rendering a frame into its mosaic

/// Tiling geometry
pub mod grid;
/// Region brightness sampling
pub mod luminance;
/// Mosaic rendering of a single frame
pub mod renderer;
/// Brightness-indexed tile palette
pub mod tileset;

pub use grid::GridPlan;
pub use renderer::{MosaicRenderer, ResampleFilter};
pub use tileset::{TileIndex, Tileset};
