//! Order-preserving parallel rendering of frame sequences
//!
//! Each frame is an independent unit of work. Frames are dispatched to a
//! caller-owned worker pool in index order, results are gathered through a
//! channel in whatever order workers finish, and the output order is restored
//! by sorting on the frame index before anything is returned.

use crate::io::configuration::WORKER_THREAD_PREFIX;
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::mosaic::renderer::MosaicRenderer;
use crate::mosaic::tileset::Tileset;
use crate::pipeline::config::{FailurePolicy, PipelineConfig};
use image::RgbImage;
use rand::rngs::StdRng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tracing::{debug, info, warn};

/// Temporally ordered frames, index 0 first
pub type FrameSequence = Vec<RgbImage>;

/// Per-frame render step run by pipeline workers
pub trait FrameRenderer: Sync {
    /// Render one frame using `rng` for every random choice
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be rendered
    fn render_frame(&self, frame: &RgbImage, rng: &mut StdRng) -> Result<RgbImage>;
}

impl FrameRenderer for MosaicRenderer<'_> {
    fn render_frame(&self, frame: &RgbImage, rng: &mut StdRng) -> Result<RgbImage> {
        self.render(frame, rng)
    }
}

/// Rendered frames in input order plus any skipped failures
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Rendered frames sorted by their input index
    pub frames: FrameSequence,
    /// Input index of each entry in `frames`
    pub indices: Vec<usize>,
    /// Frame errors tolerated under [`FailurePolicy::Skip`], by ascending index
    pub failures: Vec<MosaicError>,
}

impl PipelineOutput {
    /// Whether every input frame was rendered
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Drop bookkeeping and keep the ordered frames
    pub fn into_frames(self) -> FrameSequence {
        self.frames
    }
}

/// Parallel frame renderer backed by its own worker pool
///
/// The pool lives as long as the pipeline. Every `process_all` call joins all
/// of its tasks before returning, and [`FramePipeline::shutdown`] stops the
/// workers and waits until each thread has exited.
pub struct FramePipeline {
    pool: ThreadPool,
    config: PipelineConfig,
    // Each worker sends once from its exit handler
    exited: mpsc::Receiver<usize>,
}

impl FramePipeline {
    /// Build a pipeline and spawn its workers
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the worker pool cannot be created
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let workers = config.workers.resolve();
        let (exit_sender, exited) = mpsc::channel();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("{WORKER_THREAD_PREFIX}-{i}"))
            .exit_handler(move |i| {
                // The receiver is gone only if the pipeline was dropped without shutdown
                let _ = exit_sender.send(i);
            })
            .build()
            .map_err(|e| invalid_parameter("workers", &workers, &e))?;

        debug!(workers, "spawned frame worker pool");
        Ok(Self {
            pool,
            config,
            exited,
        })
    }

    /// Number of workers in the pool
    pub fn worker_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Configuration this pipeline was built with
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Render every frame and return them in input order
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], returns the `FrameRender` error of the
    /// lowest failed frame index and no frames
    pub fn process_all<F: FrameRenderer>(
        &self,
        frames: FrameSequence,
        renderer: &F,
    ) -> Result<PipelineOutput> {
        self.process_all_observed(frames, renderer, |_| {})
    }

    /// Render every frame, calling `on_frame` with each index as it finishes
    ///
    /// `on_frame` runs on worker threads in completion order.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], returns the `FrameRender` error of the
    /// lowest failed frame index and no frames
    pub fn process_all_observed<F, O>(
        &self,
        frames: FrameSequence,
        renderer: &F,
        on_frame: O,
    ) -> Result<PipelineOutput>
    where
        F: FrameRenderer,
        O: Fn(usize) + Sync,
    {
        let total = frames.len();
        let policy = self.config.policy;
        let variants = self.config.variants;
        info!(
            frames = total,
            workers = self.worker_count(),
            ?policy,
            "dispatching frames"
        );

        let aborted = AtomicBool::new(false);
        let (sender, receiver) = mpsc::channel::<(usize, Result<RgbImage>)>();

        self.pool.scope_fifo(|scope| {
            for (index, frame) in frames.into_iter().enumerate() {
                let sender = sender.clone();
                let aborted = &aborted;
                let on_frame = &on_frame;
                scope.spawn_fifo(move |_| {
                    if aborted.load(Ordering::Acquire) {
                        return;
                    }

                    let mut rng = variants.rng_for_frame(index);
                    let result = renderer
                        .render_frame(&frame, &mut rng)
                        .map_err(|e| e.in_frame(index));
                    drop(frame);

                    if result.is_err() && policy == FailurePolicy::Abort {
                        aborted.store(true, Ordering::Release);
                    }
                    on_frame(index);
                    // The receiver outlives the scope, so sending cannot fail
                    let _ = sender.send((index, result));
                });
            }
        });
        drop(sender);

        let mut collected: Vec<(usize, Result<RgbImage>)> = receiver.into_iter().collect();
        collected.sort_by_key(|(index, _)| *index);
        debug!(collected = collected.len(), "restored frame order");

        let mut output = PipelineOutput {
            frames: Vec::with_capacity(collected.len()),
            indices: Vec::with_capacity(collected.len()),
            failures: Vec::new(),
        };

        for (index, result) in collected {
            match result {
                Ok(frame) => {
                    output.indices.push(index);
                    output.frames.push(frame);
                }
                Err(error) if policy == FailurePolicy::Abort => return Err(error),
                Err(error) => {
                    warn!(index, %error, "skipping frame");
                    output.failures.push(error);
                }
            }
        }

        info!(
            rendered = output.frames.len(),
            skipped = output.failures.len(),
            "frame pipeline finished"
        );
        Ok(output)
    }

    /// Stop the worker pool and join every worker thread
    ///
    /// Returns the number of workers that exited.
    pub fn shutdown(self) -> usize {
        let workers = self.worker_count();
        debug!(workers, "shutting down frame worker pool");
        drop(self.pool);

        // Ends early only if the pool's exit handler was dropped, which happens
        // after the last worker has exited
        let joined = self.exited.iter().take(workers).count();
        debug!(joined, "frame workers exited");
        joined
    }
}

/// Render `frames` with a fresh pipeline and return them in input order
///
/// Frames dropped under [`FailurePolicy::Skip`] are absent from the result;
/// use [`FramePipeline::process_all`] to inspect them.
///
/// # Errors
///
/// Returns an error if the pool cannot be built, or the first frame failure
/// under [`FailurePolicy::Abort`]
pub fn process_all(
    frames: FrameSequence,
    tileset: &Tileset,
    columns_per_row: u32,
    config: PipelineConfig,
) -> Result<FrameSequence> {
    let pipeline = FramePipeline::new(config)?;
    let palette = frames.first().map_or(Cow::Borrowed(tileset), |first| {
        MosaicRenderer::new(tileset, columns_per_row).palette_for(first)
    });
    let renderer = MosaicRenderer::new(&palette, columns_per_row);
    let output = pipeline.process_all(frames, &renderer);
    pipeline.shutdown();
    output.map(PipelineOutput::into_frames)
}
