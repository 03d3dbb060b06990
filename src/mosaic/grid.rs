//! Tiling geometry derived from a source size and a requested tile count per row
//!
//! The tile side is the floor of the source width over the requested columns,
//! and the grid covers as many whole cells as fit. Trailing pixels that do not
//! fill a whole cell are cropped from the output.

use crate::io::error::{MosaicError, Result};

/// Cell geometry for one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPlan {
    /// Side length in pixels of every cell
    pub tile_size: u32,
    /// Number of cells across
    pub cells_wide: u32,
    /// Number of cells down
    pub cells_high: u32,
}

/// Pixel rectangle and grid coordinates of a single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    /// Grid row of the cell
    pub row: u32,
    /// Grid column of the cell
    pub col: u32,
    /// Left edge in pixels
    pub x: u32,
    /// Top edge in pixels
    pub y: u32,
    /// Side length in pixels
    pub size: u32,
}

impl GridPlan {
    /// Plan the grid for a `width` x `height` source
    ///
    /// A source shorter than one tile yields zero cell rows; only the width is
    /// constrained by the requested column count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if `columns_per_row` is zero or larger than
    /// `width`, since either would make the tile side zero.
    pub fn plan(width: u32, height: u32, columns_per_row: u32) -> Result<Self> {
        let tile_size = width.checked_div(columns_per_row).unwrap_or(0);
        if tile_size == 0 {
            return Err(MosaicError::InvalidResolution {
                width,
                columns_per_row,
            });
        }

        Ok(Self {
            tile_size,
            cells_wide: width / tile_size,
            cells_high: height / tile_size,
        })
    }

    /// Width in pixels of the rendered mosaic
    pub const fn output_width(&self) -> u32 {
        self.cells_wide * self.tile_size
    }

    /// Height in pixels of the rendered mosaic
    pub const fn output_height(&self) -> u32 {
        self.cells_high * self.tile_size
    }

    /// Total number of cells in the grid
    pub const fn cell_count(&self) -> usize {
        self.cells_wide as usize * self.cells_high as usize
    }

    /// Cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = CellRect> + '_ {
        let size = self.tile_size;
        (0..self.cells_high).flat_map(move |row| {
            (0..self.cells_wide).map(move |col| CellRect {
                row,
                col,
                x: col * size,
                y: row * size,
                size,
            })
        })
    }
}
