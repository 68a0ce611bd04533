use std::path::PathBuf;

use thiserror::Error;

use crate::capture::Region;

/// Errors raised by the capture, calibration and splitting routines
#[derive(Debug, Error)]
pub enum Error {
    #[error("region {region:?} does not fit inside a {width}x{height} frame")]
    RegionOutOfBounds {
        region: Region,
        width: u32,
        height: u32,
    },

    #[error("not enough images: left {left}, right {right} (need more than {required} per side)")]
    NotEnoughImages {
        left: usize,
        right: usize,
        required: usize,
    },

    #[error("no chessboard corners found in any of the {images} buffered images")]
    NoCorrespondences { images: usize },

    #[error("buffered image {index} is {actual:?}, expected {expected:?}")]
    ImageSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("calibration buffer is empty")]
    EmptyBuffer,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed parameter file: {0}")]
    MalformedParameters(String),

    #[error("failed to load configuration")]
    Config(#[from] config::ConfigError),

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[cfg(feature = "opencv")]
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),

    #[error("video backend: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
