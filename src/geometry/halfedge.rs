// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge control mesh for brush volumes
//! Polygons are arbitrary convex loops; every edge has a twin on the neighbouring polygon

use super::{BoundingBox, Mesh, Plane};
use crate::error::{BrushError, Result};
use crate::utils::math::centroid;
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Directed edge owned by exactly one polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    /// Vertex this half-edge starts at
    pub vertex: usize,
    /// Opposite half-edge, owned by the adjacent polygon
    pub twin: usize,
    /// Polygon this half-edge belongs to
    pub polygon: usize,
    /// Breaks shading continuity across the edge
    pub hard_edge: bool,
}

impl HalfEdge {
    pub fn new(vertex: usize, twin: usize, polygon: usize) -> Self {
        Self {
            vertex,
            twin,
            polygon,
            hard_edge: true,
        }
    }
}

/// Closed loop of half-edges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    /// Half-edge indices in loop order
    pub edges: Vec<usize>,
    pub index: usize,
}

impl Polygon {
    pub fn new(edges: Vec<usize>, index: usize) -> Self {
        Self { edges, index }
    }
}

/// Editable half-edge representation of a convex brush
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlMesh {
    pub vertices: Vec<Point3<f64>>,
    pub edges: Vec<HalfEdge>,
    pub polygons: Vec<Polygon>,
}

impl ControlMesh {
    /// Create an empty control mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a closed mesh from vertex loops, pairing twins by shared endpoints.
    ///
    /// Every directed edge must have exactly one opposite edge in another loop.
    pub fn from_polygons(vertices: Vec<Point3<f64>>, loops: &[Vec<usize>]) -> Result<Self> {
        let mut mesh = Self {
            vertices,
            edges: Vec::new(),
            polygons: Vec::with_capacity(loops.len()),
        };

        // Map: (from, to) -> half_edge_index
        let mut edge_map: AHashMap<(usize, usize), usize> = AHashMap::new();

        for (polygon_index, vertex_loop) in loops.iter().enumerate() {
            if vertex_loop.len() < 3 {
                return Err(BrushError::validation(format!(
                    "polygon {} has {} vertices, expected at least 3",
                    polygon_index,
                    vertex_loop.len()
                )));
            }
            let mut polygon_edges = Vec::with_capacity(vertex_loop.len());
            for (i, &from) in vertex_loop.iter().enumerate() {
                let to = vertex_loop[(i + 1) % vertex_loop.len()];
                let edge_index = mesh.edges.len();
                if edge_map.insert((from, to), edge_index).is_some() {
                    return Err(BrushError::validation(format!(
                        "edge {} -> {} is used by more than one polygon",
                        from, to
                    )));
                }
                mesh.edges.push(HalfEdge::new(from, usize::MAX, polygon_index));
                polygon_edges.push(edge_index);
            }
            mesh.polygons.push(Polygon::new(polygon_edges, polygon_index));
        }

        // Second pass: set twin indices
        for edge_index in 0..mesh.edges.len() {
            let from = mesh.edges[edge_index].vertex;
            let to = mesh.destination(edge_index);
            match edge_map.get(&(to, from)) {
                Some(&twin) => mesh.edges[edge_index].twin = twin,
                None => {
                    return Err(BrushError::validation(format!(
                        "edge {} -> {} has no twin",
                        from, to
                    )))
                }
            }
        }

        Ok(mesh)
    }

    /// Half-edge following `edge` in its polygon's loop
    pub fn next_in_polygon(&self, edge: usize) -> usize {
        let polygon = &self.polygons[self.edges[edge].polygon];
        let position = polygon
            .edges
            .iter()
            .position(|&e| e == edge)
            .unwrap_or(0);
        polygon.edges[(position + 1) % polygon.edges.len()]
    }

    /// Vertex `edge` points to
    pub fn destination(&self, edge: usize) -> usize {
        self.edges[self.next_in_polygon(edge)].vertex
    }

    /// Vertex indices around a polygon, in loop order
    pub fn polygon_vertices(&self, polygon: usize) -> Vec<usize> {
        self.polygons[polygon]
            .edges
            .iter()
            .map(|&e| self.edges[e].vertex)
            .collect()
    }

    /// Vertex positions around a polygon, in loop order
    pub fn polygon_points(&self, polygon: usize) -> Vec<Point3<f64>> {
        self.polygon_vertices(polygon)
            .into_iter()
            .map(|v| self.vertices[v])
            .collect()
    }

    /// Plane through a polygon's vertices
    pub fn polygon_plane(&self, polygon: usize) -> Option<Plane> {
        Plane::from_polygon(&self.polygon_points(polygon))
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    pub fn centroid(&self) -> Point3<f64> {
        centroid(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get half-edge count
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Get polygon count
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Fan-triangulate every polygon into a flat-shaded render mesh
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from_control_mesh(self, None)
    }
}
