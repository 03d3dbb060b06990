//! Single-frame mosaic rendering

use crate::io::configuration::BACKGROUND;
use crate::io::error::Result;
use crate::mosaic::grid::{CellRect, GridPlan};
use crate::mosaic::luminance::luminance;
use crate::mosaic::tileset::Tileset;
use image::imageops::{self, FilterType};
use image::{GenericImageView, Rgb, RgbImage};
use rand::Rng;
use std::borrow::Cow;
use tracing::debug;

/// Resampling filter used when tiles are scaled to the cell size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ResampleFilter {
    /// Nearest neighbour
    Nearest,
    /// Linear
    Triangle,
    /// Cubic
    CatmullRom,
    /// Gaussian
    Gaussian,
    /// Lanczos with window 3
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for FilterType {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => Self::Nearest,
            ResampleFilter::Triangle => Self::Triangle,
            ResampleFilter::CatmullRom => Self::CatmullRom,
            ResampleFilter::Gaussian => Self::Gaussian,
            ResampleFilter::Lanczos3 => Self::Lanczos3,
        }
    }
}

/// Replaces every grid cell of a frame with a brightness-matched tile
///
/// Rendering is free of I/O. The only source of nondeterminism is the random
/// generator passed to each call, which picks the tile variant per cell.
#[derive(Clone, Copy, Debug)]
pub struct MosaicRenderer<'a> {
    tileset: &'a Tileset,
    columns_per_row: u32,
    filter: ResampleFilter,
}

impl<'a> MosaicRenderer<'a> {
    /// Renderer laying `columns_per_row` tiles across each frame
    pub const fn new(tileset: &'a Tileset, columns_per_row: u32) -> Self {
        Self {
            tileset,
            columns_per_row,
            filter: ResampleFilter::Lanczos3,
        }
    }

    /// Use `filter` when tiles must be rescaled
    #[must_use]
    pub const fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Tiles across each rendered frame
    pub const fn columns_per_row(&self) -> u32 {
        self.columns_per_row
    }

    /// Grid geometry this renderer would use for `source`
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if the source is narrower than the column count
    pub fn plan(&self, source: &RgbImage) -> Result<GridPlan> {
        GridPlan::plan(source.width(), source.height(), self.columns_per_row)
    }

    /// Palette scaled to the cell size `source` plans to
    ///
    /// Frames of one sequence share a size, so a renderer built over this
    /// palette skips the per-frame rescale. Borrows the tileset when no scaling
    /// is needed or `source` cannot be planned.
    pub fn palette_for(&self, source: &RgbImage) -> Cow<'a, Tileset> {
        let tileset: &'a Tileset = self.tileset;
        self.plan(source).map_or(Cow::Borrowed(tileset), |plan| {
            tileset.resized(plan.tile_size, FilterType::from(self.filter))
        })
    }

    /// Render `source` into its mosaic
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if the source is narrower than the column count
    pub fn render<R: Rng + ?Sized>(&self, source: &RgbImage, rng: &mut R) -> Result<RgbImage> {
        self.render_observed(source, rng, |_| {})
    }

    /// Render `source`, reporting each cell after its tile is placed
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` if the source is narrower than the column count
    pub fn render_observed<R, F>(
        &self,
        source: &RgbImage,
        rng: &mut R,
        mut on_cell: F,
    ) -> Result<RgbImage>
    where
        R: Rng + ?Sized,
        F: FnMut(&CellRect),
    {
        let plan = self.plan(source)?;
        debug!(
            tile_size = plan.tile_size,
            cells_wide = plan.cells_wide,
            cells_high = plan.cells_high,
            "planned mosaic grid"
        );

        // Scaling the palette once is equivalent to scaling every placed tile
        let palette = self
            .tileset
            .resized(plan.tile_size, FilterType::from(self.filter));

        let mut output =
            RgbImage::from_pixel(plan.output_width(), plan.output_height(), Rgb(BACKGROUND));

        for cell in plan.cells() {
            let region = source.view(cell.x, cell.y, cell.size, cell.size);
            let brightness = luminance(&*region);
            let tile = palette.select_tile(brightness, rng);
            imageops::replace(&mut output, tile, i64::from(cell.x), i64::from(cell.y));
            on_cell(&cell);
        }

        Ok(output)
    }
}
