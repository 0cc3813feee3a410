use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PresetError {
    #[error("Invalid DPI override: {0} (must be 1 or greater)")]
    InvalidDpi(u32),

    #[error("Invalid image quality override: {0} (must be 1-100)")]
    InvalidQuality(u8),
}

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("Invalid preset: {0}")]
    Preset(#[from] PresetError),

    #[error("Failed to create scratch file in {dir}: {source}")]
    Scratch {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Request cancelled before processing")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Input not found: {0}")]
    MissingInput(PathBuf),

    #[error("No PDF files found under {0}")]
    EmptyDirectory(PathBuf),

    #[error("--output must name a directory when more than one input is given")]
    OutputNotDirectory,
}
