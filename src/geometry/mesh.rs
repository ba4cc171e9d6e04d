// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render mesh derived from a brush control mesh

use super::{BoundingBox, ControlMesh, Plane, Shape};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self { position, normal }
    }
}

/// Triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// Triangular mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    /// Fan-triangulate a control mesh.
    ///
    /// Without a shape every polygon is flat shaded. With a shape, corners of
    /// polygons sharing a non-zero smoothing group get the area-weighted
    /// average normal of those polygons.
    pub fn from_control_mesh(control: &ControlMesh, shape: Option<&Shape>) -> Self {
        let planes: Vec<Option<Plane>> = (0..control.polygon_count())
            .map(|p| control.polygon_plane(p))
            .collect();
        let group_of = |polygon: usize| -> u32 {
            shape
                .and_then(|s| s.texgens.get(polygon))
                .map(|t| t.smoothing_group)
                .unwrap_or(0)
        };

        // Map: (vertex, smoothing group) -> accumulated normal
        let mut smoothed: AHashMap<(usize, u32), Vector3<f64>> = AHashMap::new();
        for (polygon, plane) in planes.iter().enumerate() {
            let group = group_of(polygon);
            let Some(plane) = plane else { continue };
            if group == 0 {
                continue;
            }
            let points = control.polygon_points(polygon);
            let area = super::plane::newell_normal(&points).norm() * 0.5;
            for vertex in control.polygon_vertices(polygon) {
                *smoothed.entry((vertex, group)).or_insert_with(Vector3::zeros) +=
                    plane.normal * area;
            }
        }

        let triangle_count = control
            .polygons
            .iter()
            .map(|p| p.edges.len().saturating_sub(2))
            .sum();
        let mut mesh = Self::with_capacity(triangle_count * 3, triangle_count);

        for (polygon, plane) in planes.iter().enumerate() {
            let Some(plane) = plane else { continue };
            let group = group_of(polygon);
            let corners: Vec<usize> = control
                .polygon_vertices(polygon)
                .into_iter()
                .map(|vertex| {
                    let normal = smoothed
                        .get(&(vertex, group))
                        .map(|n| n.normalize())
                        .unwrap_or(plane.normal);
                    mesh.add_vertex(Vertex::new(control.vertices[vertex], normal))
                })
                .collect();
            for i in 1..corners.len() - 1 {
                mesh.add_triangle(Triangle::new([corners[0], corners[i], corners[i + 1]]));
            }
        }

        mesh
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a triangle
    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_vertices(&self.vertices)
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Merge with another mesh (no welding)
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.vertices.extend_from_slice(&other.vertices);

        for triangle in &other.triangles {
            self.triangles.push(Triangle::new([
                triangle.indices[0] + offset,
                triangle.indices[1] + offset,
                triangle.indices[2] + offset,
            ]));
        }
    }

    /// Weld vertices that are within epsilon distance of each other and
    /// share a normal. Flat-shaded corners stay separate.
    /// Returns the number of vertices removed
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() {
            return 0;
        }

        let original_count = self.vertices.len();
        let mut new_vertices: Vec<Vertex> = Vec::new();
        let mut new_indices: Vec<usize> = vec![0; original_count];

        for i in 0..original_count {
            let candidate = &self.vertices[i];
            let existing = new_vertices.iter().position(|kept| {
                (candidate.position - kept.position).norm() < epsilon
                    && (candidate.normal - kept.normal).norm() < epsilon
            });

            match existing {
                Some(j) => new_indices[i] = j,
                None => {
                    new_indices[i] = new_vertices.len();
                    new_vertices.push(*candidate);
                }
            }
        }

        for triangle in &mut self.triangles {
            for index in triangle.indices.iter_mut() {
                *index = new_indices[*index];
            }
        }

        self.vertices = new_vertices;
        original_count - self.vertices.len()
    }
}
