use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    geodesy::TileCoord,
    types::{AreaEstimate, Confidence, DetectionMethod},
};

/// JSON payload returned to callers of the serving layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimateReport {
    pub success: bool,
    /// Area rounded to whole square metres
    pub roof_area: i64,
    pub area_m2: f64,
    pub coverage_ratio: f64,
    pub confidence: Confidence,
    pub method: DetectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile: Option<TileCoord>,
}

impl EstimateReport {
    pub fn new(estimate: &AreaEstimate, tile: Option<TileCoord>) -> Self {
        Self {
            success: true,
            roof_area: estimate.area_m2.round() as i64,
            area_m2: estimate.area_m2,
            coverage_ratio: estimate.coverage_ratio,
            confidence: estimate.confidence,
            method: estimate.method,
            tile,
        }
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<AreaEstimate> for EstimateReport {
    fn from(estimate: AreaEstimate) -> Self {
        Self::new(&estimate, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_rounds_area_and_names_enums() {
        let estimate = AreaEstimate {
            area_m2: 152.6,
            coverage_ratio: 0.42,
            confidence: Confidence::High,
            method: DetectionMethod::Fallback,
        };
        let tile = TileCoord { x: 1, y: 2, zoom: 19 };
        let report = EstimateReport::new(&estimate, Some(tile));
        assert_eq!(report.roof_area, 153);

        let json: serde_json::Value = serde_json::from_str(&report.to_json_string().unwrap()).unwrap();
        assert_eq!(json["confidence"], "high");
        assert_eq!(json["method"], "fallback");
        assert_eq!(json["tile"]["zoom"], 19);
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_report_without_tile_omits_field() {
        let estimate = AreaEstimate {
            area_m2: 0.0,
            coverage_ratio: 0.0,
            confidence: Confidence::Low,
            method: DetectionMethod::Fused,
        };
        let json = EstimateReport::from(estimate).to_json_string().unwrap();
        assert!(!json.contains("\"tile\""));
    }
}
