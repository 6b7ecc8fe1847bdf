use std::path::{Path, PathBuf};

use rooftop::{
    EstimateReport, EstimatorBuilder, EstimatorConfig, RasterImage, RoofError, TileRequest,
};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Estimator(#[from] RoofError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Load an estimator configuration, picking the parser from the file extension
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EstimatorConfig, CliError> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(EstimatorConfig::from_toml_file(path)?),
        Some("json") => Ok(EstimatorConfig::from_json_file(path)?),
        _ => Err(CliError::UnsupportedFileFormat),
    }
}

/// One `estimate` invocation
#[derive(Debug, Clone)]
pub struct EstimateJob {
    pub image: PathBuf,
    pub request: TileRequest,
    pub config: Option<PathBuf>,
    pub mask_out: Option<PathBuf>,
    pub geojson_out: Option<PathBuf>,
}

impl EstimateJob {
    /// Estimate the roof area of the job's tile, writing any requested side outputs
    pub fn run(&self) -> Result<EstimateReport, CliError> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => EstimatorConfig::default(),
        };
        let estimator = EstimatorBuilder::build_from_config(config)?;

        let tile = RasterImage::open(&self.image)?;
        info!(
            "Loaded {:?} ({}x{}, {} channels)",
            self.image,
            tile.width(),
            tile.height(),
            tile.channels()
        );

        let TileRequest { lat, zoom, .. } = self.request;
        let (estimate, detection) = estimator.estimate_detailed(&tile, zoom, lat)?;

        if let Some(path) = &self.mask_out {
            detection.mask.save_png(path)?;
            info!("Mask saved to: {:?}", path);
        }
        if let Some(path) = &self.geojson_out {
            detection.save_geojson(path)?;
            info!("Outline saved to: {:?}", path);
        }

        Ok(EstimateReport::new(&estimate, Some(self.request.tile())))
    }
}
