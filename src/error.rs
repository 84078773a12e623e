use std::path::PathBuf;
use thiserror::Error;

/// The main error type for boxlabel operations.
///
/// The first group of variants is the annotation domain taxonomy; the
/// session turns these into status messages instead of aborting. The rest
/// are I/O and parsing failures from the CLI and batch operations.
#[derive(Debug, Error)]
pub enum BoxlabelError {
    #[error("class '{label}' already exists on image '{image}'; only one box per class is allowed")]
    DuplicateLabel { image: String, label: String },

    #[error("box has no area after clamping to the image bounds")]
    DegenerateBox,

    #[error("class '{label}' is not a known class")]
    InvalidClass { label: String },

    #[error("class name cannot be empty")]
    EmptyLabel,

    #[error("no box at index {index} on image '{image}'")]
    NotFound { image: String, index: usize },

    #[error("class '{label}' is missing from the class list")]
    UnknownClass { label: String },

    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("failed to decode {path}: {message}")]
    DecodeFailure { path: PathBuf, message: String },

    #[error("load result no longer matches the current image")]
    AsyncStale,

    #[error("no valid class is selected")]
    NoActiveClass,

    #[error("nothing to export: {message}")]
    NoOutput { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode crop {name}: {source}")]
    ImageEncode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[cfg(feature = "archive")]
    #[error("Failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigInvalid(String),

    #[error("Failed to parse script {path}: {source}")]
    ScriptParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
