use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, Value};
use imageproc::{
    contours::{BorderType, Contour, find_contours},
    point::Point,
};
use serde_json::{Map, Number};

use crate::{
    algorithms::contours::{contour_area, contour_perimeter},
    error::Result,
    types::DetectionResult,
};

impl DetectionResult {
    /// Roof outline(s) as a GeoJSON feature collection in pixel coordinates.
    ///
    /// One polygon feature per outer border of the mask, with the holes that
    /// border encloses. `area` is the exterior area less the holes.
    pub fn outline_geojson(&self) -> FeatureCollection {
        let contours = find_contours::<i32>(self.mask.as_image());
        let mut features = Vec::new();

        for (index, outer) in contours.iter().enumerate() {
            if !matches!(outer.border_type, BorderType::Outer) {
                continue;
            }
            let holes: Vec<&Contour<i32>> = contours
                .iter()
                .filter(|c| matches!(c.border_type, BorderType::Hole) && c.parent == Some(index))
                .collect();

            let mut rings = vec![closed_ring(&outer.points)];
            rings.extend(holes.iter().map(|h| closed_ring(&h.points)));

            let hole_area: f64 = holes.iter().map(|h| contour_area(&h.points)).sum();
            let area = (contour_area(&outer.points) - hole_area).max(0.0);

            let id = features.len();
            let mut properties = Map::new();
            properties.insert("id".to_string(), id.into());
            properties.insert("area".to_string(), number(area));
            properties.insert("perimeter".to_string(), number(contour_perimeter(&outer.points)));
            properties.insert("hole_count".to_string(), holes.len().into());

            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(rings))),
                id: Some(geojson::feature::Id::Number(Number::from(id))),
                properties: Some(properties),
                foreign_members: None,
            });
        }

        let (width, height) = self.mask.dimensions();
        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), width.into());
        foreign_members.insert("image_height".to_string(), height.into());
        foreign_members.insert("pixel_count".to_string(), self.pixel_count.into());
        foreign_members.insert("method".to_string(), self.method.to_string().into());

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    /// Export the outline and serialize it to a JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.outline_geojson())?)
    }

    /// Save the outline GeoJSON to a file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

fn closed_ring(points: &[Point<i32>]) -> Vec<Vec<f64>> {
    let mut ring: Vec<Vec<f64>> = points
        .iter()
        .map(|p| vec![f64::from(p.x), f64::from(p.y)])
        .collect();
    if let Some(first) = ring.first().cloned() {
        if ring.last() != Some(&first) {
            ring.push(first);
        }
    }
    ring
}

fn number(value: f64) -> serde_json::Value {
    Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BinaryMask, DetectionMethod};
    use image::{GrayImage, Luma};

    fn detection(mask: GrayImage) -> DetectionResult {
        let mask = BinaryMask::from_gray(mask);
        DetectionResult {
            pixel_count: mask.foreground_count(),
            mask,
            method: DetectionMethod::Fused,
        }
    }

    fn fill(mask: &mut GrayImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>, value: u8) {
        for y in ys {
            for x in xs.clone() {
                mask.put_pixel(x, y, Luma([value]));
            }
        }
    }

    #[test]
    fn test_single_block_outline() {
        let mut mask = GrayImage::new(20, 20);
        fill(&mut mask, 5..15, 5..15, 255);
        let collection = detection(mask).outline_geojson();

        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        let area = feature.property("area").and_then(|v| v.as_f64()).unwrap();
        assert_eq!(area, 81.0);
        assert_eq!(feature.property("hole_count").and_then(|v| v.as_u64()), Some(0));

        let Some(Value::Polygon(rings)) = feature.geometry.as_ref().map(|g| &g.value) else {
            panic!("expected a polygon");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].first(), rings[0].last());

        let members = collection.foreign_members.unwrap();
        assert_eq!(members["image_width"], 20);
        assert_eq!(members["pixel_count"], 100);
        assert_eq!(members["method"], "fused");
    }

    #[test]
    fn test_courtyard_becomes_hole() {
        let mut mask = GrayImage::new(30, 30);
        fill(&mut mask, 5..25, 5..25, 255);
        fill(&mut mask, 12..18, 12..18, 0);
        let collection = detection(mask).outline_geojson();

        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.property("hole_count").and_then(|v| v.as_u64()), Some(1));
        let Some(Value::Polygon(rings)) = feature.geometry.as_ref().map(|g| &g.value) else {
            panic!("expected a polygon");
        };
        assert_eq!(rings.len(), 2);
    }

    #[test]
    fn test_empty_mask_has_no_features() {
        let collection = detection(GrayImage::new(8, 8)).outline_geojson();
        assert!(collection.features.is_empty());
    }

    #[test]
    fn test_save_geojson_writes_parseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roof.geojson");
        let mut mask = GrayImage::new(10, 10);
        fill(&mut mask, 2..8, 2..8, 255);
        detection(mask).save_geojson(&path).unwrap();

        let parsed: FeatureCollection = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(parsed.features.len(), 1);
    }
}
