/// Command-line surface and orchestration
pub mod cli;
/// Layout contract constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Rendered sequence serialization
pub mod export;
/// Frame extraction for animated input
pub mod frames;
/// Still raster decoding and saving
pub mod image;
/// Terminal progress bars
pub mod progress;
