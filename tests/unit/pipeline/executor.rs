//! Tests for parallel frame dispatch, order restoration and failure policies

#[cfg(test)]
mod tests {
    use crate::fixtures::{coded_tileset, decode_tile, gray_for_column, uniform};
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use std::num::NonZeroUsize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use weaver::mosaic::MosaicRenderer;
    use weaver::pipeline::config::{FailurePolicy, PipelineConfig, VariantSource, WorkerCount};
    use weaver::pipeline::executor::{FramePipeline, FrameRenderer, process_all};
    use weaver::{MosaicError, Result};

    /// Echoes each frame after a latency that makes later frames finish first
    struct ScrambledLatency {
        fail_at: Option<usize>,
        calls: AtomicUsize,
    }

    impl ScrambledLatency {
        const fn new(fail_at: Option<usize>) -> Self {
            Self {
                fail_at,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FrameRenderer for ScrambledLatency {
        fn render_frame(&self, frame: &RgbImage, _rng: &mut StdRng) -> Result<RgbImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let marker = usize::from(frame.get_pixel(0, 0).0[0]);
            thread::sleep(Duration::from_millis(((marker * 7) % 11) as u64));

            if self.fail_at == Some(marker) {
                return Err(MosaicError::InvalidSourceData {
                    reason: format!("corrupt frame {marker}"),
                });
            }
            Ok(frame.clone())
        }
    }

    fn marked_frames(count: u8) -> Vec<RgbImage> {
        (0..count).map(|i| uniform(4, 4, [i, 0, 0])).collect()
    }

    fn config(workers: usize, policy: FailurePolicy) -> PipelineConfig {
        PipelineConfig {
            workers: WorkerCount::Fixed(NonZeroUsize::new(workers).unwrap()),
            policy,
            variants: VariantSource::Seeded(17),
        }
    }

    // Tests output order matches input order despite scrambled completion
    // Verified by returning results in completion order
    #[test]
    fn test_order_preserved_under_scrambled_latency() {
        let pipeline = FramePipeline::new(config(4, FailurePolicy::Abort)).unwrap();
        let renderer = ScrambledLatency::new(None);

        let output = pipeline.process_all(marked_frames(40), &renderer).unwrap();

        assert!(output.is_complete());
        assert_eq!(output.frames.len(), 40);
        assert_eq!(output.indices, (0..40).collect::<Vec<_>>());
        for (index, frame) in output.frames.iter().enumerate() {
            assert_eq!(usize::from(frame.get_pixel(0, 0).0[0]), index);
        }
        pipeline.shutdown();
    }

    // Tests a failing frame aborts with its index and no partial output
    // Verified by skipping failed frames under the abort policy
    #[test]
    fn test_abort_reports_failed_index() {
        let pipeline = FramePipeline::new(config(3, FailurePolicy::Abort)).unwrap();
        let renderer = ScrambledLatency::new(Some(3));

        let error = pipeline.process_all(marked_frames(10), &renderer).unwrap_err();

        assert_eq!(error.frame_index(), Some(3));
        match error {
            MosaicError::FrameRender { index, source } => {
                assert_eq!(index, 3);
                assert!(matches!(*source, MosaicError::InvalidSourceData { .. }));
            }
            other => panic!("expected FrameRender, got {other:?}"),
        }
    }

    // Tests no further frames are dispatched once a failure is observed
    // Verified by ignoring the abort flag in workers
    #[test]
    fn test_abort_stops_dispatch() {
        let pipeline = FramePipeline::new(config(1, FailurePolicy::Abort)).unwrap();
        let renderer = ScrambledLatency::new(Some(0));

        let result = pipeline.process_all(marked_frames(20), &renderer);

        assert_eq!(result.unwrap_err().frame_index(), Some(0));
        assert!(renderer.calls.load(Ordering::SeqCst) < 20);
    }

    // Tests the skip policy keeps the other frames in order and reports the failure
    // Verified by dropping the failure list under skip
    #[test]
    fn test_skip_policy_continues() {
        let pipeline = FramePipeline::new(config(4, FailurePolicy::Skip)).unwrap();
        let renderer = ScrambledLatency::new(Some(3));

        let output = pipeline.process_all(marked_frames(10), &renderer).unwrap();

        assert!(!output.is_complete());
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures.first().and_then(MosaicError::frame_index), Some(3));
        assert_eq!(output.indices, vec![0, 1, 2, 4, 5, 6, 7, 8, 9]);
        for (frame, index) in output.frames.iter().zip(&output.indices) {
            assert_eq!(usize::from(frame.get_pixel(0, 0).0[0]), *index);
        }
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 10);
    }

    // Tests a zero-width frame fails rendering with the resolution error and its index
    // Verified by rendering degenerate frames as empty images
    #[test]
    fn test_mosaic_renderer_failure_identifies_frame() {
        let tileset = coded_tileset(2);
        let renderer = MosaicRenderer::new(&tileset, 4);
        let mut frames: Vec<RgbImage> = (0..10).map(|_| uniform(200, 100, [9, 9, 9])).collect();
        if let Some(frame) = frames.get_mut(3) {
            *frame = RgbImage::new(0, 100);
        }
        let pipeline = FramePipeline::new(config(4, FailurePolicy::Abort)).unwrap();

        let error = pipeline.process_all(frames, &renderer).unwrap_err();

        assert_eq!(error.frame_index(), Some(3));
        assert!(matches!(
            error,
            MosaicError::FrameRender { ref source, .. }
                if matches!(**source, MosaicError::InvalidResolution { .. })
        ));
    }

    // Tests real mosaic frames come back in order, each matching its own brightness
    // Verified by sorting results by completion time
    #[test]
    fn test_mosaic_frames_keep_order() {
        let tileset = coded_tileset(3);
        let renderer = MosaicRenderer::new(&tileset, 2);
        let frames: Vec<RgbImage> = (0..16)
            .map(|i| {
                let gray = gray_for_column(i % 8);
                uniform(100, 50, [gray, gray, gray])
            })
            .collect();
        let pipeline = FramePipeline::new(config(4, FailurePolicy::Abort)).unwrap();

        let output = pipeline.process_all(frames, &renderer).unwrap();

        for (i, frame) in output.frames.iter().enumerate() {
            assert_eq!(frame.dimensions(), (100, 50));
            assert_eq!(decode_tile(*frame.get_pixel(25, 25)).1, i % 8);
        }
    }

    // Tests seeded pipelines render identical sequences on every run
    // Verified by sharing one generator across frames in completion order
    #[test]
    fn test_seeded_pipeline_is_reproducible() {
        let tileset = coded_tileset(8);
        let renderer = MosaicRenderer::new(&tileset, 10);
        let frames: Vec<RgbImage> = (0..6_u32)
            .map(|i| RgbImage::from_fn(100, 50, |x, y| Rgb([(x + i * 20) as u8, (y * 5) as u8, 0])))
            .collect();
        let pipeline = FramePipeline::new(config(3, FailurePolicy::Abort)).unwrap();

        let first = pipeline.process_all(frames.clone(), &renderer).unwrap();
        let second = pipeline.process_all(frames, &renderer).unwrap();

        assert_eq!(first.frames, second.frames);
    }

    // Tests the observer is told about every finished frame
    // Verified by notifying only successful frames
    #[test]
    fn test_observer_sees_every_frame() {
        let pipeline = FramePipeline::new(config(2, FailurePolicy::Skip)).unwrap();
        let renderer = ScrambledLatency::new(Some(5));
        let finished = AtomicUsize::new(0);

        let output = pipeline
            .process_all_observed(marked_frames(12), &renderer, |_| {
                finished.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        assert_eq!(finished.load(Ordering::SeqCst), 12);
        assert_eq!(output.frames.len(), 11);
    }

    // Tests pool sizing and the empty sequence
    // Verified by building the pool with the default thread count
    #[test]
    fn test_worker_count_and_empty_input() {
        let pipeline = FramePipeline::new(config(3, FailurePolicy::Abort)).unwrap();

        assert_eq!(pipeline.worker_count(), 3);
        assert_eq!(pipeline.config().policy, FailurePolicy::Abort);

        let output = pipeline
            .process_all(Vec::new(), &ScrambledLatency::new(None))
            .unwrap();
        assert!(output.frames.is_empty());
        assert!(output.is_complete());
    }

    // Tests shutdown waits for every worker thread to exit
    // Verified by returning before the exit handlers run
    #[test]
    fn test_shutdown_joins_workers() {
        let pipeline = FramePipeline::new(config(3, FailurePolicy::Abort)).unwrap();
        let output = pipeline
            .process_all(marked_frames(6), &ScrambledLatency::new(None))
            .unwrap();
        assert_eq!(output.frames.len(), 6);

        assert_eq!(pipeline.shutdown(), 3);

        let idle = FramePipeline::new(config(2, FailurePolicy::Skip)).unwrap();
        assert_eq!(idle.shutdown(), 2);
    }

    // Tests the one-call helper builds a renderer and returns ordered frames
    // Verified by returning frames before sorting
    #[test]
    fn test_process_all_helper() {
        let tileset = coded_tileset(1);
        let frames = vec![
            uniform(100, 100, [0, 0, 0]),
            uniform(100, 100, [255, 255, 255]),
        ];

        let rendered = process_all(frames, &tileset, 2, config(2, FailurePolicy::Abort)).unwrap();

        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered.first().map(|f| decode_tile(*f.get_pixel(0, 0)).1), Some(0));
        assert_eq!(rendered.last().map(|f| decode_tile(*f.get_pixel(0, 0)).1), Some(7));
    }
}
