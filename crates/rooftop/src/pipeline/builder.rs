use crate::{
    algorithms::{
        ColorCueDetector, EdgeCueDetector, MaskPostprocessor, RasterPreprocessor,
        TextureCueDetector,
    },
    config::EstimatorConfig,
    error::Result,
    geodesy::AreaGeodesyConverter,
    pipeline::RoofAreaEstimator,
    traits::{CueDetector, ImagePreprocessor, MaskPostProcessor},
};

/// Builder for creating estimators with a fluent API
pub struct EstimatorBuilder {
    config: EstimatorConfig,
    preprocessor: Option<Box<dyn ImagePreprocessor>>,
    cues: Vec<Box<dyn CueDetector>>,
    postprocessor: Option<Box<dyn MaskPostProcessor>>,
}

impl EstimatorBuilder {
    /// Create a new estimator builder
    pub fn new() -> Self {
        Self {
            config: EstimatorConfig::default(),
            preprocessor: None,
            cues: Vec::new(),
            postprocessor: None,
        }
    }

    /// Use `config` for every stage not set explicitly
    pub fn with_config(mut self, config: EstimatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the preprocessor (replaces any existing one)
    pub fn set_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Add a cue detector; when none is added the three standard cues are used
    pub fn add_cue<C>(mut self, cue: C) -> Self
    where
        C: CueDetector + 'static,
    {
        self.cues.push(Box::new(cue));
        self
    }

    /// Set the mask post-processor (replaces any existing one)
    pub fn set_postprocessor<P>(mut self, postprocessor: P) -> Self
    where
        P: MaskPostProcessor + 'static,
    {
        self.postprocessor = Some(Box::new(postprocessor));
        self
    }

    /// Build the estimator, filling unset stages from the configuration
    pub fn build(self) -> RoofAreaEstimator {
        let config = self.config;

        let preprocessor = self
            .preprocessor
            .unwrap_or_else(|| Box::new(RasterPreprocessor::from_config(&config.preprocess)));

        let cues = if self.cues.is_empty() {
            standard_cues(&config)
        } else {
            self.cues
        };

        let postprocessor = self
            .postprocessor
            .unwrap_or_else(|| Box::new(MaskPostprocessor::from_config(&config.postprocess)));

        // Smallest tile the texture cue can analyse: the sampling circle and
        // the averaging window must both fit.
        let min_side = config
            .texture
            .radius
            .saturating_mul(2)
            .saturating_add(1)
            .max(config.texture.window);

        RoofAreaEstimator::new(
            preprocessor,
            cues,
            postprocessor,
            AreaGeodesyConverter::from_config(&config.geodesy),
            min_side,
        )
    }

    /// Validate `config` and build an estimator with the standard stages
    pub fn build_from_config(config: EstimatorConfig) -> Result<RoofAreaEstimator> {
        config.validate()?;
        Ok(Self::new().with_config(config).build())
    }
}

impl Default for EstimatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn standard_cues(config: &EstimatorConfig) -> Vec<Box<dyn CueDetector>> {
    vec![
        Box::new(ColorCueDetector::default()),
        Box::new(TextureCueDetector::from_config(&config.texture)),
        Box::new(EdgeCueDetector::from_config(&config.edges)),
    ]
}
