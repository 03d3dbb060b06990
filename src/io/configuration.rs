//! Spritesheet layout contract, luminance weights and runtime defaults

// Spritesheet layout
/// Number of brightness columns in a tileset, dark to bright
pub const TILESET_COLUMNS: usize = 8;
/// Side length in pixels of a tile as stored in the spritesheet
pub const SPRITE_SIZE: u32 = 50;
/// Required spritesheet width in pixels
pub const TILESET_WIDTH: u32 = SPRITE_SIZE * TILESET_COLUMNS as u32;

// ITU-R BT.601
/// Red weight of the luminance formula
pub const LUMINANCE_R: f64 = 0.299;
/// Green weight of the luminance formula
pub const LUMINANCE_G: f64 = 0.587;
/// Blue weight of the luminance formula
pub const LUMINANCE_B: f64 = 0.114;
/// Upper bound of the brightness scale
pub const MAX_BRIGHTNESS: f64 = 255.0;

/// Background of a freshly allocated mosaic before tiles are placed
pub const BACKGROUND: [u8; 3] = [255, 255, 255];

// Default values for configurable parameters
/// Tiles across the width of the output
pub const DEFAULT_COLUMNS_PER_ROW: u32 = 50;
/// Frames per second sampled from animated input and written to animated output
pub const DEFAULT_FRAME_RATE: u32 = 24;
/// Spritesheet used when no tileset is given
pub const DEFAULT_TILESET_PATH: &str = "tiles/tileset.png";

// Some encoders write a zero delay and rely on viewers to pick a sane one
/// Delay assumed for GIF frames that declare no delay
pub const DEFAULT_GIF_FRAME_DELAY_MS: u32 = 100;

// Output settings
/// Suffix added to output filenames in image mode
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// Suffix of the default frame directory in video mode
pub const FRAMES_DIR_SUFFIX: &str = "_frames";
/// File name prefix of each written frame
pub const FRAME_FILE_PREFIX: &str = "frame_";
/// Zero-padded width of frame numbers in file names
pub const FRAME_NUMBER_WIDTH: usize = 5;
/// Still formats accepted as frames of a frame directory
pub const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
/// Thread name prefix of pipeline workers
pub const WORKER_THREAD_PREFIX: &str = "weaver-worker";
