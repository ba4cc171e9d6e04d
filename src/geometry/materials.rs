// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Carry per-edge materials from an outline over to its partitioned pieces

use super::{Material, ShapePolygon, TexGen};
use crate::config::BuildConfig;
use crate::utils::math::same_point;
use log::trace;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Per-edge tables of the original outline
#[derive(Debug, Clone, Copy)]
pub struct EdgeMetadata<'a> {
    pub materials: &'a [Material],
    pub texgens: &'a [TexGen],
}

impl<'a> EdgeMetadata<'a> {
    pub fn new(materials: &'a [Material], texgens: &'a [TexGen]) -> Self {
        Self { materials, texgens }
    }

    /// Borrow the tables of an outline that has both
    pub fn of(outline: &'a ShapePolygon) -> Option<Self> {
        match (&outline.edge_materials, &outline.edge_texgens) {
            (Some(materials), Some(texgens)) => Some(Self::new(materials, texgens)),
            _ => None,
        }
    }

    fn len(&self) -> usize {
        self.materials.len().min(self.texgens.len())
    }
}

/// Where an original outline edge ended up after partitioning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeEdge {
    pub polygon_index: Option<usize>,
    pub edge_index: Option<usize>,
}

impl ShapeEdge {
    pub fn is_mapped(&self) -> bool {
        self.polygon_index.is_some() && self.edge_index.is_some()
    }
}

/// Every original vertex that `point` coincides with
fn match_vertex(original: &[Point3<f64>], point: &Point3<f64>, epsilon_sqr: f64) -> Vec<usize> {
    original
        .iter()
        .enumerate()
        .filter(|(_, candidate)| same_point(candidate, point, epsilon_sqr))
        .map(|(index, _)| index)
        .collect()
}

/// Original edge running between two matched vertices, in either direction.
///
/// Self-touching outlines match one point to several original vertices;
/// any consecutive pair among the candidates counts.
fn original_edge(from: &[usize], to: &[usize], n: usize) -> Option<usize> {
    from.iter().find_map(|&a| {
        to.iter().find_map(|&b| {
            if b == (a + 1) % n {
                Some(a)
            } else if a == (b + 1) % n {
                Some(b)
            } else {
                None
            }
        })
    })
}

/// Assign edge materials and texgens to partitioned `polygons`.
///
/// Edges lying on an original outline edge copy its metadata and are
/// recorded in `shape_edges` (indexed by original edge). Diagonals get the
/// wall material and a texgen anchored at their end vertex. Without
/// `edges` every edge gets the wall material anchored at its start vertex.
pub fn reattach_edge_materials(
    original: &[Point3<f64>],
    polygons: &mut [ShapePolygon],
    edges: Option<EdgeMetadata<'_>>,
    mut shape_edges: Option<&mut [ShapeEdge]>,
    config: &BuildConfig,
) {
    if let Some(shape_edges) = shape_edges.as_deref_mut() {
        shape_edges.fill(ShapeEdge::default());
    }
    let epsilon_sqr = config.equality_epsilon_sqr();
    let n = original.len();

    for (polygon_index, polygon) in polygons.iter_mut().enumerate() {
        let count = polygon.len();
        let mut materials = Vec::with_capacity(count);
        let mut texgens = Vec::with_capacity(count);

        match edges {
            Some(metadata) if n > 0 => {
                let matched: Vec<Vec<usize>> = polygon
                    .vertices
                    .iter()
                    .map(|p| match_vertex(original, p, epsilon_sqr))
                    .collect();

                for n0 in 0..count {
                    let n1 = (n0 + 1) % count;
                    match original_edge(&matched[n0], &matched[n1], n)
                        .filter(|&source| source < metadata.len())
                    {
                        Some(source) => {
                            materials.push(metadata.materials[source].clone());
                            texgens.push(metadata.texgens[source]);
                            if let Some(slot) = shape_edges
                                .as_deref_mut()
                                .and_then(|edges| edges.get_mut(source))
                            {
                                *slot = ShapeEdge {
                                    polygon_index: Some(polygon_index),
                                    edge_index: Some(n0),
                                };
                            }
                        }
                        None => {
                            trace!("Polygon {} edge {} is a diagonal", polygon_index, n0);
                            materials.push(Material::wall());
                            texgens.push(TexGen::anchored(n1));
                        }
                    }
                }
            }
            _ => {
                for n0 in 0..count {
                    materials.push(Material::wall());
                    texgens.push(TexGen::anchored(n0));
                }
            }
        }

        polygon.edge_materials = Some(materials);
        polygon.edge_texgens = Some(texgens);
        polygon.remove_duplicate_points(config.distance_epsilon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn names(polygon: &ShapePolygon) -> Vec<String> {
        polygon
            .edge_materials
            .as_ref()
            .unwrap()
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    #[test]
    fn test_diagonal_split() {
        let original = square();
        let materials: Vec<Material> = ["a", "b", "c", "d"].iter().map(|n| Material::new(*n)).collect();
        let texgens = vec![TexGen::default(); 4];
        let mut polygons = vec![
            ShapePolygon::new(vec![original[0], original[1], original[2]]),
            ShapePolygon::new(vec![original[0], original[2], original[3]]),
        ];
        let mut shape_edges = vec![ShapeEdge::default(); 4];

        reattach_edge_materials(
            &original,
            &mut polygons,
            Some(EdgeMetadata::new(&materials, &texgens)),
            Some(&mut shape_edges),
            &BuildConfig::default(),
        );

        assert_eq!(names(&polygons[0]), vec!["a", "b", "Wall"]);
        assert_eq!(names(&polygons[1]), vec!["Wall", "c", "d"]);
        assert_eq!(polygons[0].edge_texgens.as_ref().unwrap()[2].anchor_vertex, Some(0));
        assert_eq!(polygons[1].edge_texgens.as_ref().unwrap()[0].anchor_vertex, Some(1));
        assert_eq!(polygons[1].edge_texgens.as_ref().unwrap()[1].anchor_vertex, None);

        assert!(shape_edges.iter().all(ShapeEdge::is_mapped));
        assert_eq!(
            shape_edges[3],
            ShapeEdge {
                polygon_index: Some(1),
                edge_index: Some(2),
            }
        );
    }

    #[test]
    fn test_reversed_winding() {
        let original = square();
        let materials: Vec<Material> = ["a", "b", "c", "d"].iter().map(|n| Material::new(*n)).collect();
        let texgens = vec![TexGen::default(); 4];
        let mut reversed: Vec<Point3<f64>> = original.clone();
        reversed.reverse();
        let mut polygons = vec![ShapePolygon::new(reversed)];

        reattach_edge_materials(
            &original,
            &mut polygons,
            Some(EdgeMetadata::new(&materials, &texgens)),
            None,
            &BuildConfig::default(),
        );
        // 3 -> 2 is edge c, 2 -> 1 is b, 1 -> 0 is a, 0 -> 3 is d
        assert_eq!(names(&polygons[0]), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_without_metadata() {
        let original = square();
        let mut polygons = vec![ShapePolygon::new(original.clone())];
        let mut shape_edges = vec![
            ShapeEdge {
                polygon_index: Some(9),
                edge_index: Some(9),
            };
            4
        ];
        reattach_edge_materials(
            &original,
            &mut polygons,
            None,
            Some(&mut shape_edges),
            &BuildConfig::default(),
        );

        assert!(polygons[0].edge_materials.as_ref().unwrap().iter().all(Material::is_wall));
        let anchors: Vec<Option<usize>> = polygons[0]
            .edge_texgens
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.anchor_vertex)
            .collect();
        assert_eq!(anchors, vec![Some(0), Some(1), Some(2), Some(3)]);
        assert!(shape_edges.iter().all(|e| !e.is_mapped()));
    }

    #[test]
    fn test_self_touching_outline_keeps_every_edge() {
        // figure-eight touching itself at (1, 1)
        let original = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let materials: Vec<Material> = (0..8).map(|i| Material::new(format!("m{}", i))).collect();
        let texgens = vec![TexGen::default(); 8];
        let mut polygons = vec![
            ShapePolygon::new(vec![original[0], original[1], original[6], original[7]]),
            ShapePolygon::new(original[2..6].to_vec()),
        ];
        let mut shape_edges = vec![ShapeEdge::default(); 8];

        reattach_edge_materials(
            &original,
            &mut polygons,
            Some(EdgeMetadata::new(&materials, &texgens)),
            Some(&mut shape_edges),
            &BuildConfig::default(),
        );

        assert_eq!(names(&polygons[0]), vec!["m0", "m1", "m6", "m7"]);
        assert_eq!(names(&polygons[1]), vec!["m2", "m3", "m4", "m5"]);
        assert!(shape_edges.iter().all(ShapeEdge::is_mapped));
        assert_eq!(
            shape_edges[6],
            ShapeEdge {
                polygon_index: Some(0),
                edge_index: Some(2),
            }
        );
    }

    #[test]
    fn test_duplicates_removed_after_reattach() {
        let original = square();
        let mut polygons = vec![ShapePolygon::new(vec![
            original[0],
            original[1],
            original[1],
            original[2],
        ])];
        reattach_edge_materials(&original, &mut polygons, None, None, &BuildConfig::default());
        assert_eq!(polygons[0].len(), 3);
        assert_eq!(polygons[0].edge_materials.as_ref().unwrap().len(), 3);
    }
}
