// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ear-clipping triangulation of simple 2D loops

use super::predicates::{orient2d, EPS};
use crate::error::{BrushError, Result};
use nalgebra::Point2;

/// Triangulate a simple loop into counter-clockwise index triples.
///
/// Collinear points may be skipped by the triangulator; the indices that
/// are returned always refer to `points`. Zero-area triangles are dropped.
pub fn triangulate(points: &[Point2<f64>]) -> Result<Vec<[usize; 3]>> {
    if points.len() < 3 {
        return Err(BrushError::partition(format!(
            "cannot triangulate {} points",
            points.len()
        )));
    }

    let flattened: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flattened, &[], 2)
        .map_err(|err| BrushError::partition(format!("triangulation failed: {:?}", err)))?;

    let triangles: Vec<[usize; 3]> = indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let (a, b, c) = (tri[0], tri[1], tri[2]);
            let turn = orient2d(&points[a], &points[b], &points[c]);
            if turn.abs() <= EPS {
                None
            } else if turn > 0.0 {
                Some([a, b, c])
            } else {
                Some([a, c, b])
            }
        })
        .collect();

    if triangles.is_empty() {
        return Err(BrushError::partition("triangulation produced no triangles"));
    }
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::predicates::signed_area;

    #[test]
    fn test_triangulate_concave() {
        // L shape
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let triangles = triangulate(&points).unwrap();
        assert_eq!(triangles.len(), 4);

        let total: f64 = triangles
            .iter()
            .map(|t| signed_area(&[points[t[0]], points[t[1]], points[t[2]]]))
            .sum();
        assert!((total - 3.0).abs() < 1e-9);
        assert!(triangles
            .iter()
            .all(|t| orient2d(&points[t[0]], &points[t[1]], &points[t[2]]) > 0.0));
    }

    #[test]
    fn test_too_few_points() {
        let result = triangulate(&[Point2::origin(), Point2::new(1.0, 0.0)]);
        assert!(matches!(result, Err(BrushError::PartitionFailure(_))));
    }
}
