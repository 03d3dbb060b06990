//! Command-line interface for rendering images and animations as mosaics

use crate::io::configuration::{
    DEFAULT_COLUMNS_PER_ROW, DEFAULT_FRAME_RATE, DEFAULT_TILESET_PATH, FRAMES_DIR_SUFFIX,
    OUTPUT_SUFFIX,
};
use crate::io::error::{MosaicError, Result};
use crate::io::export::{OutputTarget, write_sequence};
use crate::io::frames::extract_frames;
use crate::io::image::{load_raster, mosaic_path_for, save_raster};
use crate::io::progress::ProgressManager;
use crate::mosaic::renderer::{MosaicRenderer, ResampleFilter};
use crate::mosaic::tileset::Tileset;
use crate::pipeline::config::{FailurePolicy, PipelineConfig, VariantSource, WorkerCount};
use crate::pipeline::executor::FramePipeline;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Command-line arguments for the mosaic renderer
#[derive(Parser, Debug)]
#[command(name = "weaver")]
#[command(
    author,
    version,
    about = "Render images and animations as photomosaics of brightness-matched tiles"
)]
pub struct Cli {
    /// What to render
    #[command(subcommand)]
    pub mode: Mode,
}

/// Processing mode
#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Render a single still image
    Image(ImageArgs),
    /// Render every frame of an animated GIF or a directory of stills
    Video(VideoArgs),
}

/// Options shared by every mode
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Source image, animation or frame directory
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Tileset spritesheet; repeat to stack several sheets
    #[arg(short, long = "tileset", value_name = "PATH", default_value = DEFAULT_TILESET_PATH)]
    pub tilesets: Vec<PathBuf>,

    /// Tiles per row
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_COLUMNS_PER_ROW,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub resolution: u32,

    /// Resampling filter used when tiles are scaled to the cell size
    #[arg(long, value_enum, default_value_t = ResampleFilter::Lanczos3)]
    pub filter: ResampleFilter,

    /// Seed for reproducible tile variants
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Log processing details
    #[arg(short, long)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Randomness implied by `--seed`
    pub const fn variant_source(&self) -> VariantSource {
        match self.seed {
            Some(seed) => VariantSource::Seeded(seed),
            None => VariantSource::Entropy,
        }
    }
}

/// Options of image mode
#[derive(Args, Debug)]
pub struct ImageArgs {
    /// Shared options
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output file; format follows the extension
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Serialization of rendered frames in video mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum VideoFormat {
    /// Numbered PNG stills in a directory
    #[default]
    Frames,
    /// Looping animated GIF
    Gif,
}

/// Options of video mode
#[derive(Args, Debug)]
pub struct VideoArgs {
    /// Shared options
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output directory or GIF file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// How rendered frames are written
    #[arg(long, value_enum, default_value_t = VideoFormat::Frames)]
    pub format: VideoFormat,

    /// Frames per second sampled from the input and used for GIF output
    #[arg(
        short,
        long,
        default_value_t = DEFAULT_FRAME_RATE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub fps: u32,

    /// Parallel workers: 'auto' or a positive count
    #[arg(short, long, default_value_t = WorkerCount::Auto)]
    pub workers: WorkerCount,

    /// Reaction to a frame that fails to render
    #[arg(long = "on-error", value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_error: FailurePolicy,
}

impl VideoArgs {
    /// Output target implied by `--output` and `--format`
    ///
    /// Without `--output`, frames go to `<stem>_frames/` and GIFs to
    /// `<stem>_mosaic.gif` next to the input.
    pub fn output_target(&self) -> OutputTarget {
        let input = &self.common.input;
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let sibling = |name: String| {
            input
                .parent()
                .map_or_else(|| PathBuf::from(&name), |parent| parent.join(&name))
        };

        match self.format {
            VideoFormat::Frames => OutputTarget::StillSequence(
                self.output
                    .clone()
                    .unwrap_or_else(|| sibling(format!("{stem}{FRAMES_DIR_SUFFIX}"))),
            ),
            VideoFormat::Gif => OutputTarget::AnimatedContainer {
                path: self
                    .output
                    .clone()
                    .unwrap_or_else(|| sibling(format!("{stem}{OUTPUT_SUFFIX}.gif"))),
                frame_rate: self.fps,
            },
        }
    }

    /// Pipeline settings implied by the worker, error and seed options
    pub const fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            policy: self.on_error,
            variants: self.common.variant_source(),
        }
    }
}

impl Cli {
    /// Options shared by the selected mode
    pub const fn common(&self) -> &CommonArgs {
        match &self.mode {
            Mode::Image(args) => &args.common,
            Mode::Video(args) => &args.common,
        }
    }
}

/// Orchestrates loading, rendering and writing for one invocation
pub struct MosaicProcessor {
    cli: Cli,
    progress_manager: ProgressManager,
}

impl MosaicProcessor {
    /// Create a processor for the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = if cli.common().quiet {
            ProgressManager::hidden()
        } else {
            ProgressManager::new()
        };

        Self {
            cli,
            progress_manager,
        }
    }

    /// Run the selected mode and return the path that was written
    ///
    /// # Errors
    ///
    /// Returns an error if an input is missing or unreadable, the tileset
    /// breaks the layout contract, the resolution does not fit the source,
    /// a frame fails under the abort policy, or the output cannot be written
    pub fn process(&mut self) -> Result<PathBuf> {
        let start_time = Instant::now();
        validate_exists(&self.cli.common().input, "open input")?;

        let written = match &self.cli.mode {
            Mode::Image(args) => Self::process_image(args, &mut self.progress_manager)?,
            Mode::Video(args) => Self::process_video(args, &mut self.progress_manager)?,
        };

        self.progress_manager.finish();
        info!(
            output = %written.display(),
            elapsed_ms = start_time.elapsed().as_millis(),
            "processing complete"
        );
        Ok(written)
    }

    fn process_image(args: &ImageArgs, progress: &mut ProgressManager) -> Result<PathBuf> {
        let common = &args.common;
        let tileset = load_tileset(&common.tilesets)?;
        let source = load_raster(&common.input)?;
        let renderer = MosaicRenderer::new(&tileset, common.resolution).with_filter(common.filter);

        let plan = renderer.plan(&source)?;
        info!(
            width = source.width(),
            height = source.height(),
            tile_size = plan.tile_size,
            cells_wide = plan.cells_wide,
            cells_high = plan.cells_high,
            "rendering image"
        );

        let tiles_bar = progress.start_stage("tiles", plan.cell_count());
        let mut rng = common.variant_source().rng_for_frame(0);
        let mosaic = renderer.render_observed(&source, &mut rng, |_| tiles_bar.inc(1))?;

        let output_path = args
            .output
            .clone()
            .unwrap_or_else(|| mosaic_path_for(&common.input));
        save_raster(&mosaic, &output_path)?;
        Ok(output_path)
    }

    fn process_video(args: &VideoArgs, progress: &mut ProgressManager) -> Result<PathBuf> {
        let common = &args.common;
        let tileset = load_tileset(&common.tilesets)?;
        let target = args.output_target();

        let extract_bar = progress.start_stage("extract", 1);
        let video = extract_frames(&common.input, args.fps)?;
        extract_bar.inc(1);

        let pipeline = FramePipeline::new(args.pipeline_config())?;
        let renderer = MosaicRenderer::new(&tileset, common.resolution).with_filter(common.filter);
        let palette = video
            .frames
            .first()
            .map_or(Cow::Borrowed(&tileset), |first| renderer.palette_for(first));
        let renderer = MosaicRenderer::new(&palette, common.resolution).with_filter(common.filter);

        let render_bar = progress.start_stage("frames", video.frames.len());
        let rendered =
            pipeline.process_all_observed(video.frames, &renderer, |_| render_bar.inc(1));
        pipeline.shutdown();
        let rendered = rendered?;

        for failure in &rendered.failures {
            warn!(frame = ?failure.frame_index(), %failure, "frame left out of output");
        }

        let save_bar = progress.start_stage("save", rendered.frames.len());
        write_sequence(&rendered.frames, &target, |_| save_bar.inc(1))?;
        Ok(target.path().to_path_buf())
    }
}

fn load_tileset(paths: &[PathBuf]) -> Result<Tileset> {
    for path in paths {
        validate_exists(path, "open tileset")?;
    }
    Tileset::load_stacked(paths)
}

fn validate_exists(path: &Path, operation: &'static str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    Err(MosaicError::FileSystem {
        path: path.to_path_buf(),
        operation,
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
    })
}
