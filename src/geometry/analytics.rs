// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::{BoundingBox, ControlMesh, Mesh};
use ahash::AHashMap;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume
    pub volume: f64,
    /// Total surface area
    pub surface_area: f64,
    pub bbox: BoundingBox,
    /// Area-weighted surface centroid
    pub centroid: Point3<f64>,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Every edge (by position) is shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            surface_area: 0.0,
            bbox: BoundingBox::empty(),
            centroid: Point3::origin(),
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }

    /// Pretty print statistics
    pub fn print(&self) {
        let size = self.bbox.size();
        println!("╔══════════════════════════════════════════════════════════╗");
        println!("║              BRUSH ANALYTICS                             ║");
        println!("╠══════════════════════════════════════════════════════════╣");
        println!("║ Volume:          {:>10.4}                              ║", self.volume);
        println!("║ Surface Area:    {:>10.4}                              ║", self.surface_area);
        println!(
            "║ Centroid:        ({:>7.2}, {:>7.2}, {:>7.2})            ║",
            self.centroid.x, self.centroid.y, self.centroid.z
        );
        println!(
            "║ Size:            {:>7.2} × {:>7.2} × {:>7.2}            ║",
            size.x, size.y, size.z
        );
        println!("║ Vertices:        {:>10}                              ║", self.vertex_count);
        println!("║ Triangles:       {:>10}                              ║", self.triangle_count);
        println!(
            "║ Watertight:      {:>10}                              ║",
            if self.is_watertight { "Yes" } else { "No" }
        );
        println!("╚══════════════════════════════════════════════════════════╝");
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    let vertex_count = mesh.vertices.len();
    let triangle_count = mesh.triangles.len();

    if vertex_count == 0 || triangle_count == 0 {
        return GeometryStats::empty();
    }

    GeometryStats {
        volume: calculate_volume(mesh),
        surface_area: calculate_surface_area(mesh),
        bbox: mesh.bounding_box(),
        centroid: calculate_centroid(mesh),
        vertex_count,
        triangle_count,
        is_watertight: check_watertight(mesh),
    }
}

/// Analyze the flat-shaded render mesh of a control mesh
pub fn analyze_control_mesh(mesh: &ControlMesh) -> GeometryStats {
    analyze(&mesh.to_mesh())
}

fn triangle_points(mesh: &Mesh, indices: &[usize; 3]) -> [Point3<f64>; 3] {
    indices.map(|i| mesh.vertices[i].position)
}

/// Calculate mesh volume using signed volume of triangles
fn calculate_volume(mesh: &Mesh) -> f64 {
    let volume: f64 = mesh
        .triangles
        .iter()
        .map(|triangle| {
            let [v0, v1, v2] = triangle_points(mesh, &triangle.indices);
            // Signed volume of tetrahedron formed by triangle and origin
            v0.coords.dot(&v1.coords.cross(&v2.coords)) / 6.0
        })
        .sum();

    volume.abs()
}

/// Calculate total surface area
fn calculate_surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [v0, v1, v2] = triangle_points(mesh, &triangle.indices);
            (v1 - v0).cross(&(v2 - v0)).norm() / 2.0
        })
        .sum()
}

fn calculate_centroid(mesh: &Mesh) -> Point3<f64> {
    let mut weighted = nalgebra::Vector3::zeros();
    let mut total = 0.0;

    for triangle in &mesh.triangles {
        let [v0, v1, v2] = triangle_points(mesh, &triangle.indices);
        let area = (v1 - v0).cross(&(v2 - v0)).norm() / 2.0;
        weighted += (v0.coords + v1.coords + v2.coords) / 3.0 * area;
        total += area;
    }

    if total > 0.0 {
        Point3::from(weighted / total)
    } else {
        mesh.bounding_box().center()
    }
}

/// Check if mesh is watertight (manifold).
/// Render meshes repeat vertices per face, so edges are keyed by position.
fn check_watertight(mesh: &Mesh) -> bool {
    let mut canonical: AHashMap<[u64; 3], usize> = AHashMap::new();
    let ids: Vec<usize> = mesh
        .vertices
        .iter()
        .map(|vertex| {
            let key = [
                vertex.position.x.to_bits(),
                vertex.position.y.to_bits(),
                vertex.position.z.to_bits(),
            ];
            let next = canonical.len();
            *canonical.entry(key).or_insert(next)
        })
        .collect();

    let mut edge_count: AHashMap<(usize, usize), usize> = AHashMap::new();
    for triangle in &mesh.triangles {
        for i in 0..3 {
            let v1 = ids[triangle.indices[i]];
            let v2 = ids[triangle.indices[(i + 1) % 3]];
            // Normalize edge (smaller index first)
            let edge = if v1 < v2 { (v1, v2) } else { (v2, v1) };
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }

    // All edges should be used exactly twice
    edge_count.values().all(|&count| count == 2)
}
