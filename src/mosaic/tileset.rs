//! Brightness-indexed tile palette sliced from a spritesheet
//!
//! A spritesheet is a grid of square tiles, eight brightness columns wide
//! (darkest on the left) and any number of variant rows tall. Tiles are sliced
//! eagerly on load and never change afterwards, so a `Tileset` can be shared
//! by reference across render workers.

use crate::io::configuration::{MAX_BRIGHTNESS, SPRITE_SIZE, TILESET_COLUMNS, TILESET_WIDTH};
use crate::io::error::{MosaicError, Result, layout_error};
use crate::io::image::load_raster;
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, info};

/// Position of a tile in the palette
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileIndex {
    /// Variant row
    pub row: usize,
    /// Brightness column, 0 is darkest
    pub column: usize,
}

/// Dense grid of tiles indexed by `[variant row, brightness column]`
#[derive(Clone, Debug)]
pub struct Tileset {
    tiles: Array2<RgbImage>,
    tile_side: u32,
}

impl Tileset {
    /// Load and slice a spritesheet from disk
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be opened or decoded
    /// - The sheet is not exactly eight tiles wide
    /// - The sheet height is zero or not a multiple of the tile side
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let sheet = load_raster(path)?;

        let tileset = Self::from_spritesheet(&sheet)?;
        info!(
            path = %path.display(),
            rows = tileset.rows(),
            columns = tileset.columns(),
            "loaded tileset"
        );
        Ok(tileset)
    }

    /// Load several spritesheets and stack their variant rows in order
    ///
    /// # Errors
    ///
    /// Returns an error if no path is given or any sheet fails to load
    pub fn load_stacked<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let sheets = paths
            .iter()
            .map(Self::load)
            .collect::<Result<Vec<_>>>()?;
        Self::stack(&sheets)
    }

    /// Slice an in-memory spritesheet into tiles
    ///
    /// # Errors
    ///
    /// Returns `Layout` if the sheet dimensions break the grid contract
    pub fn from_spritesheet(sheet: &RgbImage) -> Result<Self> {
        let (width, height) = sheet.dimensions();

        if width != TILESET_WIDTH {
            return Err(layout_error(
                width,
                height,
                &format!("width must be {TILESET_COLUMNS} tiles of {SPRITE_SIZE}px ({TILESET_WIDTH}px)"),
            ));
        }
        if height == 0 || height % SPRITE_SIZE != 0 {
            return Err(layout_error(
                width,
                height,
                &format!("height must be a positive multiple of {SPRITE_SIZE}px"),
            ));
        }

        let rows = (height / SPRITE_SIZE) as usize;
        let mut tiles = Vec::with_capacity(rows * TILESET_COLUMNS);
        for row in 0..rows {
            for column in 0..TILESET_COLUMNS {
                let x = column as u32 * SPRITE_SIZE;
                let y = row as u32 * SPRITE_SIZE;
                tiles.push(imageops::crop_imm(sheet, x, y, SPRITE_SIZE, SPRITE_SIZE).to_image());
            }
        }

        let tiles = Array2::from_shape_vec((rows, TILESET_COLUMNS), tiles)
            .map_err(|e| layout_error(width, height, &e))?;

        Ok(Self {
            tiles,
            tile_side: SPRITE_SIZE,
        })
    }

    /// Concatenate the variant rows of several tilesets
    ///
    /// # Errors
    ///
    /// Returns an error if `tilesets` is empty or their tile sides differ
    pub fn stack(tilesets: &[Self]) -> Result<Self> {
        let Some(first) = tilesets.first() else {
            return Err(MosaicError::InvalidSourceData {
                reason: "at least one tileset is required".to_string(),
            });
        };

        if let Some(odd) = tilesets.iter().find(|t| t.tile_side != first.tile_side) {
            return Err(layout_error(
                odd.tile_side,
                odd.tile_side,
                &format!("tile side differs from {}px", first.tile_side),
            ));
        }

        let views: Vec<ArrayView2<'_, RgbImage>> = tilesets.iter().map(|t| t.tiles.view()).collect();
        let tiles = ndarray::concatenate(Axis(0), &views).map_err(|e| {
            layout_error(TILESET_WIDTH, first.tile_side, &e)
        })?;

        debug!(sheets = tilesets.len(), rows = tiles.nrows(), "stacked tilesets");
        Ok(Self {
            tiles,
            tile_side: first.tile_side,
        })
    }

    /// Number of variant rows
    pub fn rows(&self) -> usize {
        self.tiles.nrows()
    }

    /// Number of brightness columns
    pub fn columns(&self) -> usize {
        self.tiles.ncols()
    }

    /// Side length in pixels of every tile
    pub const fn tile_side(&self) -> u32 {
        self.tile_side
    }

    /// Tile at `index`, if it exists
    pub fn tile(&self, index: TileIndex) -> Option<&RgbImage> {
        self.tiles.get((index.row, index.column))
    }

    /// Brightness column for a value in [0, 255]
    ///
    /// The scale is split into eight equal bands; out-of-range input is
    /// clamped to the first or last column.
    pub fn column_for_brightness(brightness: f64) -> usize {
        let last = (TILESET_COLUMNS - 1) as f64;
        let band = (brightness / MAX_BRIGHTNESS * TILESET_COLUMNS as f64).floor();
        band.clamp(0.0, last) as usize
    }

    /// Pick a tile for `brightness` with a uniformly random variant row
    pub fn select_index<R: Rng + ?Sized>(&self, brightness: f64, rng: &mut R) -> TileIndex {
        TileIndex {
            row: rng.random_range(0..self.rows()),
            column: Self::column_for_brightness(brightness),
        }
    }

    /// Borrow a tile for `brightness` with a uniformly random variant row
    #[allow(clippy::indexing_slicing)]
    pub fn select_tile<R: Rng + ?Sized>(&self, brightness: f64, rng: &mut R) -> &RgbImage {
        let index = self.select_index(brightness, rng);
        // Construction guarantees at least one row and the column is clamped
        &self.tiles[[index.row, index.column]]
    }

    /// Palette with every tile rescaled to `side` pixels
    ///
    /// Borrows `self` when the tiles already have that side.
    pub fn resized(&self, side: u32, filter: FilterType) -> Cow<'_, Self> {
        if side == self.tile_side {
            return Cow::Borrowed(self);
        }

        let tiles = self
            .tiles
            .map(|tile| imageops::resize(tile, side, side, filter));
        Cow::Owned(Self {
            tiles,
            tile_side: side,
        })
    }
}
