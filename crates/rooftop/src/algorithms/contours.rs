use geo::{Area, EuclideanLength, Simplify};
use geo_types::{Coord, LineString, Polygon};
use image::{GrayImage, Luma};
use imageproc::{
    contours::{BorderType, Contour, find_contours},
    point::Point,
};

/// Outermost borders only: outer contours that are not nested in a hole
pub fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .collect()
}

/// Closed polygon through the contour points
pub fn to_polygon(points: &[Point<i32>]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|p| Coord {
            x: f64::from(p.x),
            y: f64::from(p.y),
        })
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Shoelace area enclosed by the contour points
pub fn contour_area(points: &[Point<i32>]) -> f64 {
    to_polygon(points).unsigned_area()
}

/// Length of the closed contour
pub fn contour_perimeter(points: &[Point<i32>]) -> f64 {
    to_polygon(points).exterior().euclidean_length()
}

/// Vertex count of the Douglas-Peucker approximation of the closed contour
pub fn approximate_vertex_count(points: &[Point<i32>], epsilon: f64) -> usize {
    let simplified = to_polygon(points).simplify(&epsilon);
    // The ring repeats its first coordinate at the end.
    simplified.exterior().0.len().saturating_sub(1)
}

/// Fill the region bounded by the contour with foreground
pub fn fill_contour(mask: &mut GrayImage, points: &[Point<i32>]) {
    let mut ring = points.to_vec();
    while ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if ring.len() < 3 {
        return;
    }
    imageproc::drawing::draw_polygon_mut(mask, &ring, Luma([255u8]));
}
