// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Control mesh validation

use super::{ControlMesh, Plane, Shape};
use crate::config::BuildConfig;
use crate::error::{BrushError, Result};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// A broken invariant found by [`inspect`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationIssue {
    VertexOutOfRange { edge: usize, vertex: usize },
    PolygonOutOfRange { edge: usize, polygon: usize },
    TwinOutOfRange { edge: usize, twin: usize },
    SelfTwin { edge: usize },
    TwinMismatch { edge: usize, twin: usize },
    TwinEndpoints { edge: usize, twin: usize },
    EdgeOutOfRange { polygon: usize, edge: usize },
    EdgeOwnership { edge: usize, polygon: usize },
    UnownedEdge { edge: usize },
    TooFewEdges { polygon: usize, count: usize },
    RepeatedVertex { polygon: usize, vertex: usize },
    DegeneratePolygon { polygon: usize },
    NonPlanar { polygon: usize },
    NonConvex { polygon: usize },
    ShapeMismatch { polygons: usize, surfaces: usize },
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VertexOutOfRange { edge, vertex } => {
                write!(f, "half-edge {} references missing vertex {}", edge, vertex)
            }
            Self::PolygonOutOfRange { edge, polygon } => {
                write!(f, "half-edge {} references missing polygon {}", edge, polygon)
            }
            Self::TwinOutOfRange { edge, twin } => {
                write!(f, "half-edge {} references missing twin {}", edge, twin)
            }
            Self::SelfTwin { edge } => write!(f, "half-edge {} is its own twin", edge),
            Self::TwinMismatch { edge, twin } => {
                write!(f, "twin of half-edge {} ({}) does not point back", edge, twin)
            }
            Self::TwinEndpoints { edge, twin } => {
                write!(f, "half-edges {} and {} do not share endpoints", edge, twin)
            }
            Self::EdgeOutOfRange { polygon, edge } => {
                write!(f, "polygon {} references missing half-edge {}", polygon, edge)
            }
            Self::EdgeOwnership { edge, polygon } => {
                write!(f, "half-edge {} is not owned by polygon {} alone", edge, polygon)
            }
            Self::UnownedEdge { edge } => write!(f, "half-edge {} belongs to no polygon", edge),
            Self::TooFewEdges { polygon, count } => {
                write!(f, "polygon {} has only {} half-edges", polygon, count)
            }
            Self::RepeatedVertex { polygon, vertex } => {
                write!(f, "polygon {} repeats vertex {}", polygon, vertex)
            }
            Self::DegeneratePolygon { polygon } => write!(f, "polygon {} has no area", polygon),
            Self::NonPlanar { polygon } => write!(f, "polygon {} is not planar", polygon),
            Self::NonConvex { polygon } => write!(f, "polygon {} is not convex", polygon),
            Self::ShapeMismatch { polygons, surfaces } => write!(
                f,
                "shape has {} surfaces for {} polygons",
                surfaces, polygons
            ),
        }
    }
}

/// Get mesh validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshValidation {
    pub vertex_count: usize,
    pub edge_count: usize,
    pub polygon_count: usize,
    pub issues: Vec<ValidationIssue>,
}

impl MeshValidation {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Validate a control mesh (and optionally its shape), failing on the first issue
pub fn validate(mesh: &ControlMesh, shape: Option<&Shape>, config: &BuildConfig) -> Result<()> {
    let report = inspect_with_shape(mesh, shape, config);
    match report.issues.first() {
        None => Ok(()),
        Some(issue) => Err(BrushError::validation(issue.to_string())),
    }
}

/// Collect every structural and geometric issue of a control mesh.
///
/// Geometric checks only run once the structure is sound.
pub fn inspect(mesh: &ControlMesh, config: &BuildConfig) -> MeshValidation {
    let mut issues = Vec::new();
    check_edges(mesh, &mut issues);
    check_polygons(mesh, &mut issues);
    if issues.is_empty() {
        check_twin_endpoints(mesh, &mut issues);
    }
    if issues.is_empty() {
        check_geometry(mesh, config, &mut issues);
    }

    MeshValidation {
        vertex_count: mesh.vertex_count(),
        edge_count: mesh.edge_count(),
        polygon_count: mesh.polygon_count(),
        issues,
    }
}

/// [`inspect`] plus the check that `shape` is parallel to the mesh polygons
pub fn inspect_with_shape(
    mesh: &ControlMesh,
    shape: Option<&Shape>,
    config: &BuildConfig,
) -> MeshValidation {
    let mut report = inspect(mesh, config);
    if let Some(shape) = shape {
        check_shape(mesh, shape, &mut report.issues);
    }
    report
}

fn check_edges(mesh: &ControlMesh, issues: &mut Vec<ValidationIssue>) {
    for (index, edge) in mesh.edges.iter().enumerate() {
        if edge.vertex >= mesh.vertices.len() {
            issues.push(ValidationIssue::VertexOutOfRange {
                edge: index,
                vertex: edge.vertex,
            });
        }
        if edge.polygon >= mesh.polygons.len() {
            issues.push(ValidationIssue::PolygonOutOfRange {
                edge: index,
                polygon: edge.polygon,
            });
        }
        if edge.twin >= mesh.edges.len() {
            issues.push(ValidationIssue::TwinOutOfRange {
                edge: index,
                twin: edge.twin,
            });
        } else if edge.twin == index {
            issues.push(ValidationIssue::SelfTwin { edge: index });
        } else if mesh.edges[edge.twin].twin != index {
            issues.push(ValidationIssue::TwinMismatch {
                edge: index,
                twin: edge.twin,
            });
        }
    }
}

fn check_polygons(mesh: &ControlMesh, issues: &mut Vec<ValidationIssue>) {
    let mut owner: Vec<Option<usize>> = vec![None; mesh.edges.len()];

    for (index, polygon) in mesh.polygons.iter().enumerate() {
        if polygon.edges.len() < 3 {
            issues.push(ValidationIssue::TooFewEdges {
                polygon: index,
                count: polygon.edges.len(),
            });
        }

        for &edge in &polygon.edges {
            if edge >= mesh.edges.len() {
                issues.push(ValidationIssue::EdgeOutOfRange {
                    polygon: index,
                    edge,
                });
                continue;
            }
            if owner[edge].is_some() || mesh.edges[edge].polygon != index {
                issues.push(ValidationIssue::EdgeOwnership {
                    edge,
                    polygon: index,
                });
            }
            owner[edge] = Some(index);
        }

        let vertices: Vec<usize> = polygon
            .edges
            .iter()
            .filter(|&&e| e < mesh.edges.len())
            .map(|&e| mesh.edges[e].vertex)
            .collect();
        for i in 0..vertices.len() {
            let next = vertices[(i + 1) % vertices.len()];
            if vertices[i] == next {
                issues.push(ValidationIssue::RepeatedVertex {
                    polygon: index,
                    vertex: next,
                });
            }
        }
    }

    for (edge, polygon) in owner.iter().enumerate() {
        if polygon.is_none() {
            issues.push(ValidationIssue::UnownedEdge { edge });
        }
    }
}

fn check_twin_endpoints(mesh: &ControlMesh, issues: &mut Vec<ValidationIssue>) {
    for (index, edge) in mesh.edges.iter().enumerate() {
        let twin = edge.twin;
        if mesh.edges[twin].vertex != mesh.destination(index) {
            issues.push(ValidationIssue::TwinEndpoints { edge: index, twin });
        }
    }
}

fn check_geometry(mesh: &ControlMesh, config: &BuildConfig, issues: &mut Vec<ValidationIssue>) {
    for index in 0..mesh.polygons.len() {
        let points = mesh.polygon_points(index);
        let Some(plane) = Plane::from_polygon(&points) else {
            issues.push(ValidationIssue::DegeneratePolygon { polygon: index });
            continue;
        };
        if points
            .iter()
            .any(|p| plane.signed_distance(p).abs() > config.planarity_epsilon)
        {
            issues.push(ValidationIssue::NonPlanar { polygon: index });
            continue;
        }
        if !is_convex_on_plane(&points, &plane, config.planarity_epsilon) {
            issues.push(ValidationIssue::NonConvex { polygon: index });
        }
    }
}

/// Every corner must turn the same way as the plane normal (collinear allowed)
fn is_convex_on_plane(points: &[Point3<f64>], plane: &Plane, epsilon: f64) -> bool {
    let n = points.len();
    (0..n).all(|i| {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let c = &points[(i + 2) % n];
        (b - a).cross(&(c - b)).dot(&plane.normal) >= -epsilon
    })
}

fn check_shape(mesh: &ControlMesh, shape: &Shape, issues: &mut Vec<ValidationIssue>) {
    let polygons = mesh.polygons.len();
    if shape.surfaces.len() != polygons
        || shape.texgens.len() != polygons
        || shape.materials.len() != polygons
    {
        issues.push(ValidationIssue::ShapeMismatch {
            polygons,
            surfaces: shape.surfaces.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build_prism_mesh, ExtrudeParams, ShapePolygon, SmoothingGroupAllocator};
    use nalgebra::Vector3;

    fn box_mesh() -> (ControlMesh, Shape) {
        let outline = ShapePolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ]);
        build_prism_mesh(
            &outline,
            &ExtrudeParams::new(Vector3::y(), 1.0),
            &mut SmoothingGroupAllocator::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_mesh() {
        let (mesh, shape) = box_mesh();
        let config = BuildConfig::default();
        let report = inspect(&mesh, &config);
        assert!(report.is_valid(), "{:?}", report.issues);
        assert!(validate(&mesh, Some(&shape), &config).is_ok());
    }

    #[test]
    fn test_broken_twin() {
        let (mut mesh, _) = box_mesh();
        mesh.edges[0].twin = 1;
        let report = inspect(&mesh, &BuildConfig::default());
        assert!(report
            .issues
            .contains(&ValidationIssue::TwinMismatch { edge: 0, twin: 1 }));
    }

    #[test]
    fn test_out_of_range_vertex() {
        let (mut mesh, _) = box_mesh();
        mesh.edges[3].vertex = 99;
        let result = validate(&mesh, None, &BuildConfig::default());
        assert!(matches!(result, Err(BrushError::ValidationFailure(_))));
    }

    #[test]
    fn test_too_few_edges() {
        let (mut mesh, _) = box_mesh();
        let removed = mesh.polygons[4].edges.split_off(2);
        assert_eq!(removed.len(), 2);
        let report = inspect(&mesh, &BuildConfig::default());
        assert!(report
            .issues
            .contains(&ValidationIssue::TooFewEdges { polygon: 4, count: 2 }));
    }

    #[test]
    fn test_non_planar_polygon() {
        let (mut mesh, _) = box_mesh();
        mesh.vertices[0].y += 0.25;
        let report = inspect(&mesh, &BuildConfig::default());
        assert!(report
            .issues
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::NonPlanar { .. })));
    }

    #[test]
    fn test_report_includes_shape_mismatch() {
        let (mesh, mut shape) = box_mesh();
        let config = BuildConfig::default();
        assert!(inspect_with_shape(&mesh, Some(&shape), &config).is_valid());

        shape.materials.truncate(3);
        let report = inspect_with_shape(&mesh, Some(&shape), &config);
        assert_eq!(
            report.issues,
            vec![ValidationIssue::ShapeMismatch {
                polygons: 6,
                surfaces: 6,
            }]
        );
        assert!(inspect(&mesh, &config).is_valid());
    }

    #[test]
    fn test_shape_mismatch() {
        let (mesh, mut shape) = box_mesh();
        shape.surfaces.pop();
        let result = validate(&mesh, Some(&shape), &BuildConfig::default());
        assert!(matches!(result, Err(BrushError::ValidationFailure(_))));
    }
}
