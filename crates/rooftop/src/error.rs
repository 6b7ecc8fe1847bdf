use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoofError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Fallback segmentation exhausted: {0}")]
    FallbackExhausted(String),

    #[error("Unsupported geodesy input: {0}")]
    GeodesyDomain(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons the primary (fused) segmentation branch gives up.
///
/// These never reach the caller: the estimator switches to the fallback
/// segmenter whenever one is raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentationFailure {
    #[error("raster has no pixels")]
    EmptyRaster,

    #[error("raster {width}x{height} is smaller than the {min}px analysis window")]
    TileTooSmall { width: u32, height: u32, min: u32 },

    #[error("{cue} cue produced a {actual:?} mask, expected {expected:?}")]
    CueDimensionMismatch {
        cue: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

pub type Result<T> = std::result::Result<T, RoofError>;

pub type SegmentationResult<T> = std::result::Result<T, SegmentationFailure>;
