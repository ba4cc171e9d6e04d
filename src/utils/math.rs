// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point2, Point3, Vector3};

/// True when two points are closer than `epsilon_sqr` (a squared distance)
pub fn same_point(a: &Point3<f64>, b: &Point3<f64>, epsilon_sqr: f64) -> bool {
    (a - b).norm_squared() < epsilon_sqr
}

/// 2D variant of [`same_point`]
pub fn same_point_2d(a: &Point2<f64>, b: &Point2<f64>, epsilon_sqr: f64) -> bool {
    (a - b).norm_squared() < epsilon_sqr
}

/// Average of a set of points, origin for an empty slice
pub fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Component-wise division, used to undo a brush's non-uniform scale
pub fn divide_components(point: &Point3<f64>, scale: &Vector3<f64>) -> Point3<f64> {
    Point3::new(point.x / scale.x, point.y / scale.y, point.z / scale.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.01, 0.0, 0.0);
        assert!(same_point(&a, &b, 0.0006));
        assert!(!same_point(&a, &Point3::new(0.1, 0.0, 0.0), 0.0006));
    }

    #[test]
    fn test_centroid() {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(0.0, 0.0, 2.0),
        ];
        assert_eq!(centroid(&points), Point3::new(1.0, 0.0, 1.0));
        assert_eq!(centroid(&[]), Point3::origin());
    }

    #[test]
    fn test_divide_components() {
        let p = divide_components(&Point3::new(2.0, 4.0, 8.0), &Vector3::new(2.0, 2.0, 4.0));
        assert_eq!(p, Point3::new(1.0, 2.0, 2.0));
    }
}
