// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Per-polygon render metadata: materials, texture generators, surfaces

use super::plane::{calculate_tangents, Plane};
use super::ControlMesh;
use nalgebra::{Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Name of the built-in placeholder material
pub const WALL_MATERIAL: &str = "Wall";

/// Reference to a render material, by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Placeholder assigned when the caller supplies nothing better
    pub fn wall() -> Self {
        Self::new(WALL_MATERIAL)
    }

    pub fn is_wall(&self) -> bool {
        self.name == WALL_MATERIAL
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::wall()
    }
}

/// Texture generator: how UVs are derived for one surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TexGen {
    pub translation: Vector2<f64>,
    pub scale: Vector2<f64>,
    /// Rotation in degrees
    pub rotation_angle: f64,
    /// Surfaces sharing a non-zero group are shaded smoothly across edges
    pub smoothing_group: u32,
    /// Outline vertex a synthesized generator is keyed to
    pub anchor_vertex: Option<usize>,
}

impl TexGen {
    /// Generator keyed to an outline vertex, used for edges without a source
    pub fn anchored(vertex: usize) -> Self {
        Self {
            anchor_vertex: Some(vertex),
            ..Self::default()
        }
    }
}

impl Default for TexGen {
    fn default() -> Self {
        Self {
            translation: Vector2::zeros(),
            scale: Vector2::new(1.0, 1.0),
            rotation_angle: 0.0,
            smoothing_group: 0,
            anchor_vertex: None,
        }
    }
}

/// Plane and texture frame of one polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub plane: Plane,
    pub tangent: Vector3<f64>,
    pub binormal: Vector3<f64>,
    pub texgen_index: usize,
}

/// Render metadata parallel-indexed to a control mesh's polygons
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Shape {
    pub surfaces: Vec<Surface>,
    pub texgens: Vec<TexGen>,
    pub materials: Vec<Material>,
}

impl Shape {
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Recompute every surface plane and tangent frame from mesh geometry.
    ///
    /// Returns the index of the first polygon without a plane, leaving the
    /// shape untouched in that case.
    pub fn update_surfaces(&mut self, mesh: &ControlMesh) -> Result<(), usize> {
        let mut surfaces = Vec::with_capacity(mesh.polygons.len());
        for index in 0..mesh.polygons.len() {
            let plane = Plane::from_polygon(&mesh.polygon_points(index)).ok_or(index)?;
            let (tangent, binormal) = calculate_tangents(&plane.normal);
            surfaces.push(Surface {
                plane,
                tangent,
                binormal,
                texgen_index: index,
            });
        }
        self.surfaces = surfaces;
        Ok(())
    }

    /// Put the given polygons into one smoothing group
    pub fn assign_smoothing_group(&mut self, polygons: std::ops::Range<usize>, group: u32) {
        for index in polygons {
            if let Some(texgen) = self.texgens.get_mut(index) {
                texgen.smoothing_group = group;
            }
        }
    }
}

/// Hands out smoothing group ids that have not been used yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingGroupAllocator {
    next: u32,
}

impl SmoothingGroupAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocator whose first id is `next` (0 is never handed out)
    pub fn starting_at(next: u32) -> Self {
        Self { next: next.max(1) }
    }

    /// Allocator that never returns ids already present in `shapes`
    pub fn after<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Self {
        let highest = shapes
            .into_iter()
            .flat_map(|shape| shape.texgens.iter())
            .map(|texgen| texgen.smoothing_group)
            .max()
            .unwrap_or(0);
        Self {
            next: highest.saturating_add(1).max(1),
        }
    }

    pub fn allocate(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }
}

impl Default for SmoothingGroupAllocator {
    fn default() -> Self {
        Self::new()
    }
}
