pub mod clahe;
pub mod color;
pub mod contours;
pub mod edges;
pub mod fallback;
pub mod fusion;
pub mod morphology;
pub mod postprocessing;
pub mod preprocessing;
pub mod texture;

pub use clahe::clahe;
pub use color::{ColorCueDetector, HsvRange, ROOF_COLOR_RANGES};
pub use edges::EdgeCueDetector;
pub use fallback::FallbackSegmenter;
pub use fusion::{CueFuser, CueMask};
pub use morphology::StructuringElement;
pub use postprocessing::{MaskPostprocessor, largest_component};
pub use preprocessing::RasterPreprocessor;
pub use texture::TextureCueDetector;
