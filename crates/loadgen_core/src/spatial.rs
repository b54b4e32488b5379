//! Planar geometry over raw coordinate degrees: points, polygon regions and
//! the containment/bounding-box queries the sampler needs.
//!
//! Distances here are Euclidean in degree space (`sqrt(dlat² + dlon²)`), not
//! meters. Distance-range parameters across the crate are calibrated to that
//! unit, so no geodesic correction is applied anywhere.

use serde::{Deserialize, Serialize};

/// Polygons with an absolute shoelace area below this are treated as degenerate.
const MIN_REGION_AREA: f64 = 1e-12;

/// Distance (degrees) within which a point counts as lying on an edge.
const ON_EDGE_EPSILON: f64 = 1e-12;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar distance in coordinate degrees.
    pub fn distance_to(&self, other: Point) -> f64 {
        planar_distance(*self, other)
    }
}

impl From<[f64; 2]> for Point {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

/// Euclidean distance between two points in raw coordinate degrees.
pub fn planar_distance(a: Point, b: Point) -> f64 {
    let dlat = a.lat - b.lat;
    let dlon = a.lon - b.lon;
    (dlat * dlat + dlon * dlon).sqrt()
}

/// Axis-aligned bounds of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    fn from_points(points: &[Point]) -> Self {
        let mut bbox = Self {
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
            lon_min: f64::INFINITY,
            lon_max: f64::NEG_INFINITY,
        };
        for p in points {
            bbox.lat_min = bbox.lat_min.min(p.lat);
            bbox.lat_max = bbox.lat_max.max(p.lat);
            bbox.lon_min = bbox.lon_min.min(p.lon);
            bbox.lon_max = bbox.lon_max.max(p.lon);
        }
        bbox
    }

    pub fn contains(&self, p: Point) -> bool {
        p.lat >= self.lat_min && p.lat <= self.lat_max && p.lon >= self.lon_min && p.lon <= self.lon_max
    }

    pub fn area(&self) -> f64 {
        (self.lat_max - self.lat_min) * (self.lon_max - self.lon_min)
    }

    /// Longest planar distance between two points of the box.
    pub fn diagonal(&self) -> f64 {
        planar_distance(
            Point::new(self.lat_min, self.lon_min),
            Point::new(self.lat_max, self.lon_max),
        )
    }
}

/// Reasons a vertex list cannot be used as a region.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegionError {
    #[error("region needs at least 3 distinct vertices, got {0}")]
    TooFewVertices(usize),

    #[error("vertex {index} ({lat}, {lon}) is not a valid coordinate")]
    InvalidCoordinate { index: usize, lat: f64, lon: f64 },

    #[error("vertex {index} repeats the previous vertex")]
    RepeatedVertex { index: usize },

    #[error("region is degenerate (area {area:e} deg²)")]
    Degenerate { area: f64 },

    #[error("region edges {first} and {second} intersect")]
    SelfIntersecting { first: usize, second: usize },
}

/// A simple polygon in (lat, lon) degrees. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    vertices: Vec<Point>,
    bounds: BoundingBox,
    area: f64,
}

impl Region {
    /// Build a region from its ring of vertices.
    ///
    /// An explicitly closed ring (last vertex equal to the first) is accepted;
    /// the closing vertex is dropped.
    ///
    /// # Errors
    ///
    /// Returns a [`RegionError`] for fewer than 3 vertices, out-of-range or
    /// non-finite coordinates, repeated consecutive vertices, zero area, or
    /// crossing edges.
    pub fn new(mut vertices: Vec<Point>) -> Result<Self, RegionError> {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            return Err(RegionError::TooFewVertices(vertices.len()));
        }

        for (index, v) in vertices.iter().enumerate() {
            let valid = v.lat.is_finite()
                && v.lon.is_finite()
                && (-90.0..=90.0).contains(&v.lat)
                && (-180.0..=180.0).contains(&v.lon);
            if !valid {
                return Err(RegionError::InvalidCoordinate {
                    index,
                    lat: v.lat,
                    lon: v.lon,
                });
            }
            if index > 0 && vertices[index - 1] == *v {
                return Err(RegionError::RepeatedVertex { index });
            }
        }

        let area = shoelace_area(&vertices).abs();
        if area < MIN_REGION_AREA {
            return Err(RegionError::Degenerate { area });
        }

        if let Some((first, second)) = first_crossing(&vertices) {
            return Err(RegionError::SelfIntersecting { first, second });
        }

        Ok(Self {
            bounds: BoundingBox::from_points(&vertices),
            vertices,
            area,
        })
    }

    /// Build a region from `[lat, lon]` pairs, as they appear in configuration.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self, RegionError> {
        Self::new(pairs.iter().copied().map(Point::from).collect())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Unsigned polygon area in square degrees.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// True if `p` is inside the polygon or on its boundary.
    pub fn contains(&self, p: Point) -> bool {
        if !self.bounds.contains(p) {
            return false;
        }

        let n = self.vertices.len();
        let mut inside = false;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            if point_on_segment(a, b, p) {
                return true;
            }
            // Even-odd ray cast along +lat.
            if (a.lon > p.lon) != (b.lon > p.lon) {
                let lat_at = a.lat + (p.lon - a.lon) / (b.lon - a.lon) * (b.lat - a.lat);
                if p.lat < lat_at {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn shoelace_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            a.lat * b.lon - b.lat * a.lon
        })
        .sum();
    twice * 0.5
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.lat - o.lat) * (b.lon - o.lon) - (a.lon - o.lon) * (b.lat - o.lat)
}

fn within_segment_box(a: Point, b: Point, p: Point, slack: f64) -> bool {
    p.lat >= a.lat.min(b.lat) - slack
        && p.lat <= a.lat.max(b.lat) + slack
        && p.lon >= a.lon.min(b.lon) - slack
        && p.lon <= a.lon.max(b.lon) + slack
}

fn point_on_segment(a: Point, b: Point, p: Point) -> bool {
    let len = planar_distance(a, b);
    if len == 0.0 {
        return planar_distance(a, p) <= ON_EDGE_EPSILON;
    }
    cross(a, b, p).abs() / len <= ON_EDGE_EPSILON && within_segment_box(a, b, p, ON_EDGE_EPSILON)
}

fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && within_segment_box(q1, q2, p1, 0.0))
        || (d2 == 0.0 && within_segment_box(q1, q2, p2, 0.0))
        || (d3 == 0.0 && within_segment_box(p1, p2, q1, 0.0))
        || (d4 == 0.0 && within_segment_box(p1, p2, q2, 0.0))
}

/// First pair of non-adjacent edges that touch or cross, if any. O(n²).
fn first_crossing(vertices: &[Point]) -> Option<(usize, usize)> {
    let n = vertices.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // Edge n-1 closes the ring and shares a vertex with edge 0.
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = (vertices[i], vertices[(i + 1) % n]);
            let (b1, b2) = (vertices[j], vertices[(j + 1) % n]);
            if segments_intersect(a1, a2, b1, b2) {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Region {
        Region::from_pairs(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]).expect("square")
    }

    #[test]
    fn square_contains_interior_and_boundary() {
        let square = unit_square();
        assert!(square.contains(Point::new(0.5, 0.5)));
        assert!(square.contains(Point::new(0.0, 0.5)), "edge point is inside");
        assert!(square.contains(Point::new(1.0, 1.0)), "vertex is inside");
        assert!(!square.contains(Point::new(1.0001, 0.5)));
        assert!(!square.contains(Point::new(-0.5, -0.5)));
    }

    #[test]
    fn concave_notch_is_excluded() {
        // U shape opening towards +lat.
        let u = Region::from_pairs(&[
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 1.0],
            [1.0, 1.0],
            [1.0, 2.0],
            [3.0, 2.0],
            [3.0, 3.0],
            [0.0, 3.0],
        ])
        .expect("u shape");
        assert!(u.contains(Point::new(0.5, 1.5)));
        assert!(!u.contains(Point::new(2.0, 1.5)));
        assert!(u.contains(Point::new(2.0, 0.5)));
    }

    #[test]
    fn closed_ring_drops_duplicate_vertex() {
        let region = Region::from_pairs(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]])
            .expect("triangle");
        assert_eq!(region.vertices().len(), 3);
        assert!((region.area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_regions() {
        assert_eq!(
            Region::from_pairs(&[[0.0, 0.0], [1.0, 1.0]]),
            Err(RegionError::TooFewVertices(2))
        );
        assert!(matches!(
            Region::from_pairs(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]),
            Err(RegionError::Degenerate { .. })
        ));
        assert!(matches!(
            Region::from_pairs(&[[0.0, 0.0], [95.0, 1.0], [1.0, 1.0]]),
            Err(RegionError::InvalidCoordinate { index: 1, .. })
        ));
        assert!(matches!(
            Region::from_pairs(&[[0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]),
            Err(RegionError::RepeatedVertex { index: 1 })
        ));
        // Bow tie.
        assert!(matches!(
            Region::from_pairs(&[[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 1.0]]),
            Err(RegionError::SelfIntersecting { first: 0, second: 2 })
        ));
    }

    #[test]
    fn planar_distance_ignores_curvature() {
        let a = Point::new(30.0, -9.5);
        let b = Point::new(30.03, -9.46);
        assert!((planar_distance(a, b) - 0.05).abs() < 1e-12);
        assert_eq!(a.distance_to(b), b.distance_to(a));
    }

    #[test]
    fn bounding_box_matches_vertices() {
        let bounds = unit_square().bounds();
        assert_eq!(bounds.lat_min, 0.0);
        assert_eq!(bounds.lon_max, 1.0);
        assert!((bounds.diagonal() - 2f64.sqrt()).abs() < 1e-12);
    }
}
