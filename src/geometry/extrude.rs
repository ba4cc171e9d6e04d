// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Half-edge prism builder
//!
//! Extrudes a closed convex outline along a direction into a brush control
//! mesh. Side quads come first (side `i` carries outline edge `i`), then
//! either one cap polygon per end or a triangle fan per end.

use super::plane::newell_normal;
use super::validate::validate;
use super::{ControlMesh, HalfEdge, Material, Polygon, Shape, ShapePolygon, SmoothingGroupAllocator, TexGen};
use crate::config::BuildConfig;
use crate::error::{BrushError, Result};
use crate::utils::math::{centroid, divide_components};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Extrusion parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrudeParams {
    pub direction: Vector3<f64>,
    /// Signed distance along `direction`; the outline stays the lower ring
    /// when positive and becomes the upper ring when negative
    pub height: f64,
    /// Every built point is divided by this, component-wise
    pub scale: Vector3<f64>,
    pub cap_material: Option<Material>,
    pub cap_texgen: TexGen,
    /// `Some(true)` smooths the sides with a new group, `Some(false)` clears
    /// all groups, `None` keeps what the texgens carry
    pub smooth: Option<bool>,
    /// One polygon per cap instead of a triangle fan around the centroid
    pub single_surface_ends: bool,
}

impl ExtrudeParams {
    pub fn new(direction: Vector3<f64>, height: f64) -> Self {
        Self {
            direction,
            height,
            scale: Vector3::new(1.0, 1.0, 1.0),
            cap_material: None,
            cap_texgen: TexGen::default(),
            smooth: None,
            single_surface_ends: true,
        }
    }
}

/// Index arithmetic for a prism over `n` outline points
struct PrismLayout {
    n: usize,
    ccw: bool,
    multi: bool,
}

impl PrismLayout {
    /// Outline points bounding side `i`, ordered for outward winding
    fn ends(&self, i: usize) -> (usize, usize) {
        let j = (i + 1) % self.n;
        if self.ccw {
            (i, j)
        } else {
            (j, i)
        }
    }

    /// Side whose first end is this side's second end
    fn next(&self, i: usize) -> usize {
        if self.ccw {
            (i + 1) % self.n
        } else {
            (i + self.n - 1) % self.n
        }
    }

    fn prev(&self, i: usize) -> usize {
        if self.ccw {
            (i + self.n - 1) % self.n
        } else {
            (i + 1) % self.n
        }
    }

    fn from_vertex(&self, i: usize) -> usize {
        i
    }

    fn to_vertex(&self, i: usize) -> usize {
        self.n + i
    }

    fn from_center(&self) -> usize {
        2 * self.n
    }

    fn to_center(&self) -> usize {
        2 * self.n + 1
    }

    fn from_edge(&self, i: usize) -> usize {
        i
    }

    fn to_edge(&self, i: usize) -> usize {
        self.n + i
    }

    /// First spoke of from-fan triangle `i` (the second follows it)
    fn from_fan(&self, i: usize) -> usize {
        2 * self.n + 2 * i
    }

    fn to_fan(&self, i: usize) -> usize {
        4 * self.n + 2 * i
    }

    fn side(&self, i: usize) -> usize {
        let base = if self.multi { 6 * self.n } else { 2 * self.n };
        base + 4 * i
    }

    fn from_polygon(&self, i: usize) -> usize {
        if self.multi {
            self.n + i
        } else {
            self.n
        }
    }

    fn to_polygon(&self, i: usize) -> usize {
        if self.multi {
            2 * self.n + i
        } else {
            self.n + 1
        }
    }

    fn edge_count(&self) -> usize {
        if self.multi {
            10 * self.n
        } else {
            6 * self.n
        }
    }

    fn polygon_count(&self) -> usize {
        if self.multi {
            3 * self.n
        } else {
            self.n + 2
        }
    }
}

/// Extrude `outline` into a prism using default tolerances
pub fn build_prism_mesh(
    outline: &ShapePolygon,
    params: &ExtrudeParams,
    smoothing: &mut SmoothingGroupAllocator,
) -> Result<(ControlMesh, Shape)> {
    build_prism_mesh_with_config(outline, params, smoothing, &BuildConfig::default())
}

/// Extrude `outline` into a validated prism control mesh and its shape.
///
/// Nothing is returned unless the finished mesh passes validation.
pub fn build_prism_mesh_with_config(
    outline: &ShapePolygon,
    params: &ExtrudeParams,
    smoothing: &mut SmoothingGroupAllocator,
    config: &BuildConfig,
) -> Result<(ControlMesh, Shape)> {
    check_params(outline, params)?;

    let mut outline = outline.clone();
    let original_len = outline.len();
    outline.remove_duplicate_points(config.distance_epsilon);
    if outline.len() != original_len {
        debug!(
            "Dropped {} duplicate outline points",
            original_len - outline.len()
        );
    }
    if outline.len() < 3 {
        return Err(BrushError::invalid_input(format!(
            "outline has {} distinct points, expected at least 3",
            outline.len()
        )));
    }

    let winding = newell_normal(&outline.vertices).dot(&params.direction);
    if winding == 0.0 || !winding.is_finite() {
        return Err(BrushError::invalid_input(
            "outline has no area across the extrusion direction",
        ));
    }

    let layout = PrismLayout {
        n: outline.len(),
        ccw: winding > 0.0,
        multi: !params.single_surface_ends,
    };
    debug!(
        "Extruding {} points by {} ({}, {})",
        layout.n,
        params.height,
        if layout.ccw { "ccw" } else { "cw" },
        if layout.multi { "fan caps" } else { "single caps" }
    );

    let mut mesh = ControlMesh {
        vertices: ring_vertices(&outline.vertices, params, layout.multi),
        edges: build_edges(&layout),
        polygons: build_polygons(&layout),
    };
    for vertex in mesh.vertices.iter_mut() {
        *vertex = divide_components(vertex, &params.scale);
    }

    let mut shape = build_shape(&outline, params, layout.polygon_count());
    match params.smooth {
        Some(true) => {
            let group = smoothing.allocate();
            shape.assign_smoothing_group(0..layout.n, group);
            shape.assign_smoothing_group(layout.n..layout.polygon_count(), 0);
        }
        Some(false) => shape.assign_smoothing_group(0..layout.polygon_count(), 0),
        None => {}
    }

    shape.update_surfaces(&mesh).map_err(|polygon| {
        warn!("Rejected prism: polygon {} is degenerate", polygon);
        BrushError::validation(format!("polygon {} of the prism has no plane", polygon))
    })?;

    if let Err(err) = validate(&mesh, Some(&shape), config) {
        warn!("Rejected prism: {}", err);
        return Err(err);
    }

    Ok((mesh, shape))
}

fn check_params(outline: &ShapePolygon, params: &ExtrudeParams) -> Result<()> {
    if outline.len() < 3 {
        return Err(BrushError::invalid_input(format!(
            "outline has {} points, expected at least 3",
            outline.len()
        )));
    }
    if params.height == 0.0 {
        return Err(BrushError::invalid_input("extrusion height is zero"));
    }
    if !params.height.is_finite() {
        return Err(BrushError::invalid_input("extrusion height is not finite"));
    }
    if params.direction.iter().any(|c| !c.is_finite()) || params.direction.norm_squared() == 0.0 {
        return Err(BrushError::invalid_input(
            "extrusion direction must be finite and non-zero",
        ));
    }
    if outline
        .vertices
        .iter()
        .any(|p| p.iter().any(|c| !c.is_finite()))
    {
        return Err(BrushError::invalid_input("outline has non-finite points"));
    }
    Ok(())
}

/// From ring, to ring, then (for fan caps) the two ring centroids
fn ring_vertices(points: &[Point3<f64>], params: &ExtrudeParams, multi: bool) -> Vec<Point3<f64>> {
    let offset = params.direction * params.height;
    let (from_offset, to_offset) = if params.height > 0.0 {
        (offset, Vector3::zeros())
    } else {
        (Vector3::zeros(), offset)
    };

    let from: Vec<Point3<f64>> = points.iter().map(|p| p + from_offset).collect();
    let to: Vec<Point3<f64>> = points.iter().map(|p| p + to_offset).collect();

    let mut vertices = Vec::with_capacity(points.len() * 2 + 2);
    vertices.extend_from_slice(&from);
    vertices.extend_from_slice(&to);
    if multi {
        vertices.push(centroid(&from));
        vertices.push(centroid(&to));
    }
    vertices
}

fn build_edges(layout: &PrismLayout) -> Vec<HalfEdge> {
    let mut edges = vec![HalfEdge::new(0, 0, 0); layout.edge_count()];

    for i in 0..layout.n {
        let (a, b) = layout.ends(i);
        let side = layout.side(i);

        edges[layout.from_edge(i)] =
            HalfEdge::new(layout.from_vertex(a), side + 2, layout.from_polygon(i));
        edges[layout.to_edge(i)] =
            HalfEdge::new(layout.to_vertex(b), side, layout.to_polygon(i));

        // bottom, up, top, down
        edges[side] = HalfEdge::new(layout.to_vertex(a), layout.to_edge(i), i);
        edges[side + 1] = HalfEdge::new(layout.to_vertex(b), layout.side(layout.next(i)) + 3, i);
        edges[side + 2] = HalfEdge::new(layout.from_vertex(b), layout.from_edge(i), i);
        edges[side + 3] = HalfEdge::new(layout.from_vertex(a), layout.side(layout.prev(i)) + 1, i);

        if layout.multi {
            let fan = layout.from_fan(i);
            let polygon = layout.from_polygon(i);
            edges[fan] = HalfEdge::new(layout.from_vertex(b), layout.from_fan(layout.next(i)) + 1, polygon);
            edges[fan + 1] = HalfEdge::new(layout.from_center(), layout.from_fan(layout.prev(i)), polygon);

            let fan = layout.to_fan(i);
            let polygon = layout.to_polygon(i);
            edges[fan] = HalfEdge::new(layout.to_vertex(a), layout.to_fan(layout.prev(i)) + 1, polygon);
            edges[fan + 1] = HalfEdge::new(layout.to_center(), layout.to_fan(layout.next(i)), polygon);
        }
    }

    edges
}

fn build_polygons(layout: &PrismLayout) -> Vec<Polygon> {
    let mut polygons = Vec::with_capacity(layout.polygon_count());

    for i in 0..layout.n {
        let side = layout.side(i);
        polygons.push(Polygon::new(vec![side, side + 1, side + 2, side + 3], i));
    }

    if layout.multi {
        for i in 0..layout.n {
            let fan = layout.from_fan(i);
            polygons.push(Polygon::new(
                vec![layout.from_edge(i), fan, fan + 1],
                layout.from_polygon(i),
            ));
        }
        for i in 0..layout.n {
            let fan = layout.to_fan(i);
            polygons.push(Polygon::new(
                vec![layout.to_edge(i), fan, fan + 1],
                layout.to_polygon(i),
            ));
        }
    } else {
        let forward: Vec<usize> = (0..layout.n).collect();
        let backward: Vec<usize> = (0..layout.n).rev().collect();
        let (from_order, to_order) = if layout.ccw {
            (forward, backward)
        } else {
            (backward, forward)
        };
        polygons.push(Polygon::new(
            from_order.into_iter().map(|i| layout.from_edge(i)).collect(),
            layout.from_polygon(0),
        ));
        polygons.push(Polygon::new(
            to_order.into_iter().map(|i| layout.to_edge(i)).collect(),
            layout.to_polygon(0),
        ));
    }

    polygons
}

/// Materials and texgens per polygon; surfaces are filled in later
fn build_shape(outline: &ShapePolygon, params: &ExtrudeParams, polygon_count: usize) -> Shape {
    let (cap_material, cap_texgen) = match &params.cap_material {
        Some(material) => (material.clone(), params.cap_texgen),
        None => (Material::wall(), TexGen::default()),
    };
    let edge_materials = outline.edge_materials.as_deref().unwrap_or(&[]);
    let edge_texgens = outline.edge_texgens.as_deref().unwrap_or(&[]);
    let metadata = outline.edge_metadata_count();

    let mut shape = Shape {
        surfaces: Vec::new(),
        texgens: Vec::with_capacity(polygon_count),
        materials: Vec::with_capacity(polygon_count),
    };
    for polygon in 0..polygon_count {
        if polygon < metadata {
            shape.materials.push(edge_materials[polygon].clone());
            shape.texgens.push(edge_texgens[polygon]);
        } else {
            shape.materials.push(cap_material.clone());
            shape.texgens.push(cap_texgen);
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> ShapePolygon {
        ShapePolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
    }

    fn build(outline: &ShapePolygon, params: &ExtrudeParams) -> Result<(ControlMesh, Shape)> {
        build_prism_mesh(outline, params, &mut SmoothingGroupAllocator::new())
    }

    #[test]
    fn test_square_prism() {
        let (mesh, shape) = build(&square(), &ExtrudeParams::new(Vector3::y(), 1.0)).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.edge_count(), 24);
        assert_eq!(mesh.polygon_count(), 6);
        assert_eq!(shape.len(), 6);
        assert!(mesh.polygons.iter().all(|p| p.edges.len() == 4));
        assert!(mesh.edges.iter().all(|e| e.hard_edge));

        // from ring is the translated outline
        for i in 0..4 {
            assert_relative_eq!(mesh.vertices[i].y, 1.0);
            assert_relative_eq!(mesh.vertices[4 + i].y, 0.0);
        }

        assert_relative_eq!(shape.surfaces[4].plane.normal, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(shape.surfaces[5].plane.normal, -Vector3::y(), epsilon = 1e-12);
        // side 0 carries the z = 0 edge
        assert_relative_eq!(shape.surfaces[0].plane.normal, -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_winding_does_not_matter() {
        let mut reversed = square();
        reversed.vertices.reverse();
        let (mesh, shape) = build(&reversed, &ExtrudeParams::new(Vector3::y(), 1.0)).unwrap();
        assert_eq!(mesh.polygon_count(), 6);
        assert_relative_eq!(shape.surfaces[4].plane.normal, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(shape.surfaces[5].plane.normal, -Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_fan_caps() {
        let params = ExtrudeParams {
            single_surface_ends: false,
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let (mesh, shape) = build(&square(), &params).unwrap();

        assert_eq!(mesh.vertex_count(), 10);
        assert_eq!(mesh.edge_count(), 40);
        assert_eq!(mesh.polygon_count(), 12);
        assert_eq!(shape.len(), 12);
        assert_eq!(mesh.vertices[8], Point3::new(0.5, 1.0, 0.5));
        assert_eq!(mesh.vertices[9], Point3::new(0.5, 0.0, 0.5));
        assert!(mesh.polygons[4..].iter().all(|p| p.edges.len() == 3));
    }

    #[test]
    fn test_negative_height() {
        let (mesh, shape) = build(&square(), &ExtrudeParams::new(Vector3::y(), -1.0)).unwrap();
        for i in 0..4 {
            assert_relative_eq!(mesh.vertices[i].y, 0.0);
            assert_relative_eq!(mesh.vertices[4 + i].y, -1.0);
        }
        assert_relative_eq!(shape.surfaces[4].plane.normal, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_input() {
        let triangle_less = ShapePolygon::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        let params = ExtrudeParams::new(Vector3::y(), 1.0);
        assert!(matches!(
            build(&triangle_less, &params),
            Err(BrushError::InvalidInput(_))
        ));
        assert!(matches!(
            build(&square(), &ExtrudeParams::new(Vector3::y(), 0.0)),
            Err(BrushError::InvalidInput(_))
        ));
        assert!(matches!(
            build(&square(), &ExtrudeParams::new(Vector3::zeros(), 1.0)),
            Err(BrushError::InvalidInput(_))
        ));
        // outline parallel to the direction
        assert!(matches!(
            build(&square(), &ExtrudeParams::new(Vector3::x(), 1.0)),
            Err(BrushError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_concave_outline_is_rejected() {
        let outline = ShapePolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
        ]);
        let result = build(&outline, &ExtrudeParams::new(Vector3::y(), 1.0));
        assert!(matches!(result, Err(BrushError::ValidationFailure(_))));
    }

    #[test]
    fn test_materials() {
        let mut outline = square();
        outline.edge_materials = Some(vec![
            Material::new("Brick"),
            Material::new("Stone"),
            Material::new("Brick"),
            Material::new("Stone"),
        ]);
        outline.edge_texgens = Some(vec![TexGen::default(); 4]);

        let params = ExtrudeParams {
            cap_material: Some(Material::new("Floor")),
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let (_, shape) = build(&outline, &params).unwrap();
        assert_eq!(shape.materials[1], Material::new("Stone"));
        assert_eq!(shape.materials[4], Material::new("Floor"));
        assert_eq!(shape.materials[5], Material::new("Floor"));
        assert!(shape
            .surfaces
            .iter()
            .enumerate()
            .all(|(i, s)| s.texgen_index == i));

        let (_, shape) = build(&square(), &ExtrudeParams::new(Vector3::y(), 1.0)).unwrap();
        assert!(shape.materials.iter().all(Material::is_wall));
    }

    #[test]
    fn test_smoothing() {
        let mut allocator = SmoothingGroupAllocator::new();
        let params = ExtrudeParams {
            smooth: Some(true),
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let (_, first) = build_prism_mesh(&square(), &params, &mut allocator).unwrap();
        let (_, second) = build_prism_mesh(&square(), &params, &mut allocator).unwrap();

        assert!(first.texgens[..4].iter().all(|t| t.smoothing_group == 1));
        assert!(second.texgens[..4].iter().all(|t| t.smoothing_group == 2));
        assert!(first.texgens[4..].iter().all(|t| t.smoothing_group == 0));

        let mut grouped = TexGen::default();
        grouped.smoothing_group = 5;
        let mut outline = square();
        outline.edge_materials = Some(vec![Material::wall(); 4]);
        outline.edge_texgens = Some(vec![grouped; 4]);

        let (_, kept) = build(&outline, &ExtrudeParams::new(Vector3::y(), 1.0)).unwrap();
        assert_eq!(kept.texgens[0].smoothing_group, 5);

        let cleared_params = ExtrudeParams {
            smooth: Some(false),
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let (_, cleared) = build(&outline, &cleared_params).unwrap();
        assert!(cleared.texgens.iter().all(|t| t.smoothing_group == 0));
    }

    #[test]
    fn test_scale_divides_points() {
        let params = ExtrudeParams {
            scale: Vector3::new(2.0, 1.0, 4.0),
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let (mesh, _) = build(&square(), &params).unwrap();
        assert_relative_eq!(mesh.vertices[6].x, 0.5);
        assert_relative_eq!(mesh.vertices[6].z, 0.25);
    }

    #[test]
    fn test_repeatable() {
        let params = ExtrudeParams::new(Vector3::new(0.0, 1.0, 0.2), 3.0);
        let first = build(&square(), &params).unwrap();
        let second = build(&square(), &params).unwrap();
        assert_eq!(first, second);
    }
}
