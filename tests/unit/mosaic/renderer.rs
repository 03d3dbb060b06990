//! Tests for single-frame rendering: geometry, tile choice and determinism

#[cfg(test)]
mod tests {
    use crate::fixtures::{coded_tileset, decode_tile, gray_for_column, uniform};
    use image::imageops::FilterType;
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use std::borrow::Cow;
    use rand::rngs::StdRng;
    use weaver::MosaicError;
    use weaver::mosaic::renderer::{MosaicRenderer, ResampleFilter};

    // Tests output size for an exact fit and a cropped source
    // Verified by sizing the output from the source dimensions
    #[test]
    fn test_output_dimensions() {
        let tileset = coded_tileset(2);
        let renderer = MosaicRenderer::new(&tileset, 50);
        let mut rng = StdRng::seed_from_u64(0);

        let exact = renderer.render(&uniform(500, 500, [90, 90, 90]), &mut rng).unwrap();
        assert_eq!(exact.dimensions(), (500, 500));

        let cropped = renderer.render(&uniform(505, 505, [90, 90, 90]), &mut rng).unwrap();
        assert_eq!(cropped.dimensions(), (500, 500));
    }

    // Tests every cell of a uniform frame gets a tile from the matching column
    // Verified by inverting the brightness to column mapping
    #[test]
    fn test_uniform_frame_uses_one_column() {
        let tileset = coded_tileset(3);
        let renderer = MosaicRenderer::new(&tileset, 4);
        let mut rng = StdRng::seed_from_u64(3);

        for column in 0..8 {
            let gray = gray_for_column(column);
            let mosaic = renderer.render(&uniform(200, 100, [gray, gray, gray]), &mut rng).unwrap();

            for y in (0..100).step_by(50) {
                for x in (0..200).step_by(50) {
                    let (row, decoded) = decode_tile(*mosaic.get_pixel(x + 25, y + 25));
                    assert_eq!(decoded, column);
                    assert!(row < 3);
                }
            }
        }
    }

    // Tests each cell is matched on its own region's brightness
    // Verified by sampling the whole frame for every cell
    #[test]
    fn test_cells_follow_local_brightness() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 2);
        let source = RgbImage::from_fn(100, 50, |x, _| {
            if x < 50 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });

        let mosaic = renderer.render(&source, &mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(decode_tile(*mosaic.get_pixel(10, 10)), (0, 0));
        assert_eq!(decode_tile(*mosaic.get_pixel(60, 10)), (0, 7));
    }

    // Tests tiles are rescaled to small cells and still identify their column
    // Verified by pasting tiles at native size
    #[test]
    fn test_tiles_scaled_to_cell_size() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 8).with_filter(ResampleFilter::Triangle);
        let gray = gray_for_column(5);

        let mosaic = renderer
            .render(&uniform(80, 40, [gray, gray, gray]), &mut StdRng::seed_from_u64(0))
            .unwrap();

        assert_eq!(mosaic.dimensions(), (80, 40));
        for (x, y) in [(5, 5), (75, 5), (45, 35)] {
            assert_eq!(decode_tile(*mosaic.get_pixel(x, y)), (0, 5));
        }
    }

    // Tests the same seed renders identical mosaics
    // Verified by seeding each render from entropy
    #[test]
    fn test_seeded_render_is_reproducible() {
        let tileset = coded_tileset(6);
        let renderer = MosaicRenderer::new(&tileset, 10);
        let source = RgbImage::from_fn(100, 60, |x, y| Rgb([(x * 2) as u8, (y * 4) as u8, 50]));

        let first = renderer.render(&source, &mut StdRng::seed_from_u64(11)).unwrap();
        let second = renderer.render(&source, &mut StdRng::seed_from_u64(11)).unwrap();

        assert_eq!(first, second);
    }

    // Tests a source narrower than the column count fails with the resolution error
    // Verified by clamping the tile size to one pixel
    #[test]
    fn test_invalid_resolution_propagates() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 64);

        let result = renderer.render(&uniform(32, 32, [0, 0, 0]), &mut StdRng::seed_from_u64(0));

        assert!(matches!(result, Err(MosaicError::InvalidResolution { .. })));
    }

    // Tests the observer sees every cell once in row-major order
    // Verified by reporting only the first cell of each row
    #[test]
    fn test_render_observed_reports_cells() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 5);
        let source = uniform(50, 30, [128, 128, 128]);
        let mut seen = Vec::new();

        let plan = renderer.plan(&source).unwrap();
        renderer
            .render_observed(&source, &mut StdRng::seed_from_u64(0), |cell| {
                seen.push((cell.row, cell.col));
            })
            .unwrap();

        assert_eq!(seen.len(), plan.cell_count());
        assert_eq!(seen.first().copied(), Some((0, 0)));
        assert_eq!(seen.get(5).copied(), Some((1, 0)));
        assert_eq!(seen.last().copied(), Some((2, 4)));
    }

    // Tests builder accessors and filter conversion
    // Verified by mapping Lanczos3 to a cubic filter
    #[test]
    fn test_filter_configuration() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 12);

        assert_eq!(renderer.columns_per_row(), 12);
        assert_eq!(ResampleFilter::default(), ResampleFilter::Lanczos3);
        assert_eq!(FilterType::from(ResampleFilter::Lanczos3), FilterType::Lanczos3);
        assert_eq!(FilterType::from(ResampleFilter::Nearest), FilterType::Nearest);
        assert_eq!(FilterType::from(ResampleFilter::CatmullRom), FilterType::CatmullRom);
    }

    // Tests a pre-scaled palette renders the same mosaic as per-frame scaling
    // Verified by scaling the palette to the source width instead of the cell size
    #[test]
    fn test_palette_for_matches_per_frame_scaling() {
        let tileset = coded_tileset(2);
        let renderer = MosaicRenderer::new(&tileset, 10).with_filter(ResampleFilter::Triangle);
        let frame = RgbImage::from_fn(200, 120, |x, y| Rgb([(x + y) as u8, x as u8, y as u8]));

        let palette = renderer.palette_for(&frame);
        assert!(matches!(palette, Cow::Owned(_)));
        assert_eq!(palette.tile_side(), 20);

        let cached = MosaicRenderer::new(&palette, 10).with_filter(ResampleFilter::Triangle);
        let expected = renderer.render(&frame, &mut StdRng::seed_from_u64(5)).unwrap();
        let actual = cached.render(&frame, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(actual, expected);
    }

    // Tests the palette is borrowed when no scaling applies or the frame cannot be planned
    // Verified by always cloning the tileset
    #[test]
    fn test_palette_for_borrows_when_unscaled() {
        let tileset = coded_tileset(1);
        let renderer = MosaicRenderer::new(&tileset, 4);

        assert!(matches!(renderer.palette_for(&uniform(200, 50, [0, 0, 0])), Cow::Borrowed(_)));
        assert!(matches!(renderer.palette_for(&uniform(3, 50, [0, 0, 0])), Cow::Borrowed(_)));
    }
}
