/// Image DPI cap for the High quality tier (print quality)
pub const HIGH_MAX_DPI: u32 = 300;

/// Image DPI cap for the Medium quality tier (screen reading)
pub const MEDIUM_MAX_DPI: u32 = 150;

/// Image DPI cap for the Low quality tier (maximum compression)
pub const LOW_MAX_DPI: u32 = 96;

/// JPEG quality for the High tier
pub const HIGH_IMAGE_QUALITY: u8 = 90;

/// JPEG quality for the Medium tier
pub const MEDIUM_IMAGE_QUALITY: u8 = 75;

/// JPEG quality for the Low tier
pub const LOW_IMAGE_QUALITY: u8 = 50;

/// Wall-clock limit for one backend execution in seconds
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 60;

/// Wall-clock limit for one probe version query in seconds
pub const PROBE_TIMEOUT_SECS: u64 = 2;

/// Interval between child process liveness checks in milliseconds
pub const EXIT_POLL_INTERVAL_MS: u64 = 50;

/// Suffix appended to the input stem for the default output name
pub const OUTPUT_SUFFIX: &str = "_compressed";
