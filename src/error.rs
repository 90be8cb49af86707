//! Error types shared across the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while making a model artifact available locally.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("model {file_name} not found at {path} and no download URL is configured")]
    Missing { file_name: String, path: PathBuf },

    #[error("download of {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("download of {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error while provisioning {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not unpack model pack {path}: {source}")]
    Pack {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("model {file_name} is not part of the pack at {url}")]
    NotInPack { file_name: String, url: String },

    #[error("checksum mismatch for {file_name}: expected {expected}, got {actual}")]
    Checksum {
        file_name: String,
        expected: String,
        actual: String,
    },
}

/// Failure inside a swap operation or while loading the inference services.
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image file: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("inference failed: {0}")]
    Inference(#[from] ort::Error),

    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("model error: {0}")]
    Model(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

pub type Result<T, E = SwapError> = std::result::Result<T, E>;
