//! Parallel, order-preserving rendering of frame sequences

/// Worker count, failure policy and variant randomness
pub mod config;
/// Frame dispatch, collection and reordering
pub mod executor;

pub use config::{FailurePolicy, PipelineConfig, VariantSource, WorkerCount};
pub use executor::{FramePipeline, FrameRenderer, FrameSequence, PipelineOutput, process_all};
