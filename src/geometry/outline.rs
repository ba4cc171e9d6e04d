// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed outlines with per-edge material metadata

use super::plane::{newell_normal, Plane};
use super::shape::{Material, TexGen};
use crate::utils::math::same_point;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Planar closed outline.
///
/// Edge `i` runs from vertex `i` to vertex `(i + 1) % n`; the optional
/// per-edge tables are indexed the same way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShapePolygon {
    pub vertices: Vec<Point3<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_materials: Option<Vec<Material>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_texgens: Option<Vec<TexGen>>,
}

impl ShapePolygon {
    pub fn new(vertices: Vec<Point3<f64>>) -> Self {
        Self {
            vertices,
            edge_materials: None,
            edge_texgens: None,
        }
    }

    pub fn with_edge_metadata(
        vertices: Vec<Point3<f64>>,
        edge_materials: Vec<Material>,
        edge_texgens: Vec<TexGen>,
    ) -> Self {
        Self {
            vertices,
            edge_materials: Some(edge_materials),
            edge_texgens: Some(edge_texgens),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of edges that carry both a material and a texgen
    pub fn edge_metadata_count(&self) -> usize {
        match (&self.edge_materials, &self.edge_texgens) {
            (Some(materials), Some(texgens)) => materials.len().min(texgens.len()),
            _ => 0,
        }
    }

    /// Area-weighted normal, following the outline's winding
    pub fn winding_normal(&self) -> Vector3<f64> {
        newell_normal(&self.vertices)
    }

    pub fn plane(&self) -> Option<Plane> {
        Plane::from_polygon(&self.vertices)
    }

    /// Drop points closer than `distance_epsilon` (squared) to their
    /// predecessor, including a closing point equal to the first one.
    ///
    /// The zero-length edge's metadata goes with the dropped point. The
    /// outline never shrinks below three points through the wraparound check.
    pub fn remove_duplicate_points(&mut self, distance_epsilon: f64) {
        let mut j = self.vertices.len();
        while j > 1 {
            j -= 1;
            let i = j - 1;
            if same_point(&self.vertices[j], &self.vertices[i], distance_epsilon) {
                self.vertices.remove(j);
                // edge i (i -> j) collapsed; edge j now starts at i
                self.remove_edge_metadata(i);
            }
        }

        while self.vertices.len() > 3 {
            let last = self.vertices.len() - 1;
            if !same_point(&self.vertices[0], &self.vertices[last], distance_epsilon) {
                break;
            }
            self.vertices.remove(last);
            self.remove_edge_metadata(last);
        }
    }

    fn remove_edge_metadata(&mut self, edge: usize) {
        if let Some(materials) = self.edge_materials.as_mut() {
            if edge < materials.len() {
                materials.remove(edge);
            }
        }
        if let Some(texgens) = self.edge_texgens.as_mut() {
            if edge < texgens.len() {
                texgens.remove(edge);
            }
        }
    }
}

/// Remove consecutive duplicate points from a bare point loop
pub fn remove_duplicate_points(points: &mut Vec<Point3<f64>>, distance_epsilon: f64) {
    let mut outline = ShapePolygon::new(std::mem::take(points));
    outline.remove_duplicate_points(distance_epsilon);
    *points = outline.vertices;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<Material> {
        names.iter().map(|n| Material::new(*n)).collect()
    }

    #[test]
    fn test_remove_consecutive_duplicates_with_metadata() {
        let mut outline = ShapePolygon::with_edge_metadata(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            named(&["a", "zero", "b", "c", "d"]),
            vec![TexGen::default(); 5],
        );
        outline.remove_duplicate_points(0.0006);

        assert_eq!(outline.len(), 4);
        assert_eq!(outline.edge_materials.unwrap(), named(&["a", "b", "c", "d"]));
        assert_eq!(outline.edge_texgens.unwrap().len(), 4);
    }

    #[test]
    fn test_remove_closing_duplicate() {
        let mut points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.00001, 0.0, 0.0),
        ];
        remove_duplicate_points(&mut points, 0.0006);
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_edge_metadata_count() {
        let mut outline = ShapePolygon::new(vec![Point3::origin(); 3]);
        assert_eq!(outline.edge_metadata_count(), 0);
        outline.edge_materials = Some(named(&["a", "b", "c"]));
        outline.edge_texgens = Some(vec![TexGen::default(); 2]);
        assert_eq!(outline.edge_metadata_count(), 2);
    }
}
