// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API for building brushes
//!
//! [`BrushKernel`] is the one stateful entry point: it owns the build
//! configuration, the smoothing group allocator and a cache of built prisms
//! keyed by a content hash of their inputs.

use crate::config::BuildConfig;
use crate::error::{BrushError, Result};
use crate::geometry::{
    build_prism_mesh_with_config, partition_polygon, reattach_edge_materials, validate,
    ControlMesh, EdgeMetadata, ExtrudeParams, Mesh, Partition, Plane, Shape, ShapeEdge,
    ShapePolygon, SmoothingGroupAllocator, TexGen,
};
use crate::utils::math::centroid;
use ahash::AHashMap;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// A built brush: control mesh plus its per-polygon metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub mesh: ControlMesh,
    pub shape: Shape,
}

impl Brush {
    /// Render mesh with smoothing groups applied
    pub fn to_mesh(&self) -> Mesh {
        Mesh::from_control_mesh(&self.mesh, Some(&self.shape))
    }
}

/// Partitioned outline with its reattached edge metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlinePartition {
    pub partition: Partition,
    /// Indexed by outline edge, after consecutive duplicates are dropped
    pub shape_edges: Vec<ShapeEdge>,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub cached_brushes: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

struct CachedBrush {
    brush: Brush,
    side_count: usize,
}

/// Main kernel for brush building
pub struct BrushKernel {
    config: BuildConfig,
    smoothing: SmoothingGroupAllocator,
    cache: AHashMap<String, CachedBrush>,
    // insertion order, oldest first
    order: VecDeque<String>,
    hits: usize,
    misses: usize,
}

impl BrushKernel {
    /// Create a new kernel with default tolerances
    pub fn new() -> Self {
        Self::with_config(BuildConfig::default())
    }

    pub fn with_config(config: BuildConfig) -> Self {
        Self {
            config,
            smoothing: SmoothingGroupAllocator::new(),
            cache: AHashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Replace the configuration; cached brushes are dropped
    pub fn set_config(&mut self, config: BuildConfig) {
        self.config = config;
        self.clear_cache();
    }

    /// Continue smoothing group ids after those used by existing shapes
    pub fn reserve_smoothing_groups<'a>(&mut self, shapes: impl IntoIterator<Item = &'a Shape>) {
        self.smoothing = SmoothingGroupAllocator::after(shapes);
    }

    /// Extrude one outline, reusing a cached build for identical input
    pub fn build_prism(&mut self, outline: &ShapePolygon, params: &ExtrudeParams) -> Result<Brush> {
        if self.config.cache_capacity == 0 {
            return self.build_uncached(outline, params);
        }

        let key = cache_key(outline, params);
        if let Some(cached) = self.cache.get(&key) {
            self.hits += 1;
            let mut brush = cached.brush.clone();
            if params.smooth == Some(true) {
                let group = self.smoothing.allocate();
                brush.shape.assign_smoothing_group(0..cached.side_count, group);
            }
            debug!("Prism cache hit {}", &key[..12]);
            return Ok(brush);
        }

        self.misses += 1;
        let brush = self.build_uncached(outline, params)?;
        let side_count = side_count(&brush.mesh, params);
        self.insert(
            key,
            CachedBrush {
                brush: brush.clone(),
                side_count,
            },
        );
        Ok(brush)
    }

    fn build_uncached(&mut self, outline: &ShapePolygon, params: &ExtrudeParams) -> Result<Brush> {
        let (mesh, shape) =
            build_prism_mesh_with_config(outline, params, &mut self.smoothing, &self.config)?;
        Ok(Brush { mesh, shape })
    }

    fn insert(&mut self, key: String, entry: CachedBrush) {
        while self.cache.len() >= self.config.cache_capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.cache.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.cache.insert(key, entry);
    }

    /// Split an outline into convex pieces and carry its edge metadata over.
    ///
    /// Consecutive duplicate points are dropped first, so `shape_edges` is
    /// indexed by the edges of the deduplicated outline. The working plane
    /// defaults to the outline's own plane.
    pub fn partition(
        &self,
        outline: &ShapePolygon,
        plane: Option<&Plane>,
    ) -> Result<OutlinePartition> {
        let mut outline = outline.clone();
        outline.remove_duplicate_points(self.config.distance_epsilon);

        let plane = match plane {
            Some(plane) => *plane,
            None => outline
                .plane()
                .ok_or_else(|| BrushError::invalid_input("outline has no plane"))?,
        };

        let mut partition = partition_polygon(
            &outline.vertices,
            centroid(&outline.vertices),
            &plane,
            &self.config,
        )?;

        let mut shape_edges = vec![ShapeEdge::default(); outline.len()];
        reattach_edge_materials(
            &outline.vertices,
            &mut partition.polygons,
            EdgeMetadata::of(&outline),
            Some(&mut shape_edges),
            &self.config,
        );

        Ok(OutlinePartition {
            partition,
            shape_edges,
        })
    }

    /// Partition an outline and extrude every convex piece into a brush.
    ///
    /// Pieces are built in parallel. With smoothing requested each brush
    /// gets its own group. Any failing piece fails the whole batch.
    pub fn build_brushes(
        &mut self,
        outline: &ShapePolygon,
        params: &ExtrudeParams,
    ) -> Result<Vec<Brush>> {
        let OutlinePartition { partition, .. } = self.partition(outline, None)?;

        let groups: Vec<u32> = partition
            .polygons
            .iter()
            .map(|_| match params.smooth {
                Some(true) => self.smoothing.allocate(),
                _ => 0,
            })
            .collect();

        let config = &self.config;
        let brushes = partition
            .polygons
            .par_iter()
            .zip(groups.par_iter())
            .map(|(piece, &group)| -> Result<Brush> {
                let mut allocator = SmoothingGroupAllocator::starting_at(group);
                let (mesh, shape) =
                    build_prism_mesh_with_config(piece, params, &mut allocator, config)?;
                Ok(Brush { mesh, shape })
            })
            .collect::<Result<Vec<Brush>>>()?;

        info!(
            "Built {} brushes from a {}-point outline",
            brushes.len(),
            outline.len()
        );
        Ok(brushes)
    }

    /// Validate a brush against this kernel's tolerances
    pub fn validate(&self, brush: &Brush) -> Result<()> {
        validate(&brush.mesh, Some(&brush.shape), &self.config)
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_brushes: self.cache.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.order.clear();
    }
}

impl Default for BrushKernel {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of side quads in a built prism
fn side_count(mesh: &ControlMesh, params: &ExtrudeParams) -> usize {
    if params.single_surface_ends {
        mesh.polygon_count().saturating_sub(2)
    } else {
        mesh.polygon_count() / 3
    }
}

fn hash_texgen(hasher: &mut Sha256, texgen: &TexGen) {
    for value in [
        texgen.translation.x,
        texgen.translation.y,
        texgen.scale.x,
        texgen.scale.y,
        texgen.rotation_angle,
    ] {
        hasher.update(value.to_le_bytes());
    }
    hasher.update(texgen.smoothing_group.to_le_bytes());
    match texgen.anchor_vertex {
        Some(vertex) => hasher.update((vertex as u64 + 1).to_le_bytes()),
        None => hasher.update(0u64.to_le_bytes()),
    }
}

/// SHA256 over everything that influences a built prism
fn cache_key(outline: &ShapePolygon, params: &ExtrudeParams) -> String {
    let mut hasher = Sha256::new();

    hasher.update((outline.len() as u64).to_le_bytes());
    for point in &outline.vertices {
        hasher.update(point.x.to_le_bytes());
        hasher.update(point.y.to_le_bytes());
        hasher.update(point.z.to_le_bytes());
    }
    for material in outline.edge_materials.iter().flatten() {
        hasher.update(material.name.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update([0xffu8]);
    for texgen in outline.edge_texgens.iter().flatten() {
        hash_texgen(&mut hasher, texgen);
    }

    for value in params.direction.iter().chain(params.scale.iter()) {
        hasher.update(value.to_le_bytes());
    }
    hasher.update(params.height.to_le_bytes());
    match &params.cap_material {
        Some(material) => {
            hasher.update([1u8]);
            hasher.update(material.name.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    hash_texgen(&mut hasher, &params.cap_texgen);
    hasher.update([
        match params.smooth {
            None => 0u8,
            Some(false) => 1,
            Some(true) => 2,
        },
        params.single_surface_ends as u8,
    ]);

    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::analyze;
    use nalgebra::{Point3, Vector3};

    fn square() -> ShapePolygon {
        ShapePolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
    }

    fn l_shape() -> ShapePolygon {
        ShapePolygon::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
        ])
    }

    #[test]
    fn test_cache_hit_returns_same_brush() {
        let mut kernel = BrushKernel::new();
        let params = ExtrudeParams::new(Vector3::y(), 2.0);

        let first = kernel.build_prism(&square(), &params).unwrap();
        let second = kernel.build_prism(&square(), &params).unwrap();
        assert_eq!(first, second);

        let stats = kernel.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.cached_brushes, 1);
        assert_eq!(stats.hit_rate(), 50.0);
    }

    #[test]
    fn test_cache_hit_allocates_new_smoothing_group() {
        let mut kernel = BrushKernel::new();
        let params = ExtrudeParams {
            smooth: Some(true),
            ..ExtrudeParams::new(Vector3::y(), 2.0)
        };

        let first = kernel.build_prism(&square(), &params).unwrap();
        let second = kernel.build_prism(&square(), &params).unwrap();
        assert_eq!(first.mesh, second.mesh);
        assert_eq!(first.shape.texgens[0].smoothing_group, 1);
        assert_eq!(second.shape.texgens[0].smoothing_group, 2);
        assert_eq!(second.shape.texgens[4].smoothing_group, 0);
    }

    #[test]
    fn test_cache_capacity() {
        let mut kernel = BrushKernel::with_config(BuildConfig {
            cache_capacity: 1,
            ..BuildConfig::default()
        });
        kernel
            .build_prism(&square(), &ExtrudeParams::new(Vector3::y(), 1.0))
            .unwrap();
        kernel
            .build_prism(&square(), &ExtrudeParams::new(Vector3::y(), 2.0))
            .unwrap();
        assert_eq!(kernel.cache_stats().cached_brushes, 1);

        kernel.set_config(BuildConfig {
            cache_capacity: 0,
            ..BuildConfig::default()
        });
        kernel
            .build_prism(&square(), &ExtrudeParams::new(Vector3::y(), 1.0))
            .unwrap();
        assert_eq!(kernel.cache_stats().cached_brushes, 0);
    }

    #[test]
    fn test_partition_keeps_edge_materials() {
        let kernel = BrushKernel::new();
        let mut outline = l_shape();
        outline.edge_materials = Some(
            (0..6)
                .map(|i| crate::geometry::Material::new(format!("m{}", i)))
                .collect(),
        );
        outline.edge_texgens = Some(vec![TexGen::default(); 6]);

        let result = kernel.partition(&outline, None).unwrap();
        assert!(result.partition.len() >= 2);
        assert!(result.shape_edges.iter().all(ShapeEdge::is_mapped));
        for (edge, mapped) in result.shape_edges.iter().enumerate() {
            let (Some(polygon), Some(index)) = (mapped.polygon_index, mapped.edge_index) else {
                unreachable!()
            };
            let materials = result.partition.polygons[polygon]
                .edge_materials
                .as_ref()
                .unwrap();
            assert_eq!(materials[index].name, format!("m{}", edge));
        }
    }

    #[test]
    fn test_build_brushes() {
        let mut kernel = BrushKernel::new();
        let params = ExtrudeParams {
            smooth: Some(true),
            ..ExtrudeParams::new(Vector3::y(), 2.0)
        };
        let brushes = kernel.build_brushes(&l_shape(), &params).unwrap();
        assert!(brushes.len() >= 2);

        let volume: f64 = brushes.iter().map(|b| analyze(&b.to_mesh()).volume).sum();
        assert!((volume - 6.0).abs() < 1e-9);

        for (i, brush) in brushes.iter().enumerate() {
            assert!(kernel.validate(brush).is_ok());
            assert_eq!(brush.shape.texgens[0].smoothing_group, i as u32 + 1);
        }
    }

    #[test]
    fn test_reserve_smoothing_groups() {
        let mut existing = Shape::default();
        existing.texgens = vec![TexGen::default(); 2];
        existing.assign_smoothing_group(0..2, 4);

        let mut kernel = BrushKernel::new();
        kernel.reserve_smoothing_groups([&existing]);
        let params = ExtrudeParams {
            smooth: Some(true),
            ..ExtrudeParams::new(Vector3::y(), 1.0)
        };
        let brush = kernel.build_prism(&square(), &params).unwrap();
        assert_eq!(brush.shape.texgens[0].smoothing_group, 5);
    }

    #[test]
    fn test_cache_key_depends_on_params() {
        let a = cache_key(&square(), &ExtrudeParams::new(Vector3::y(), 1.0));
        let b = cache_key(&square(), &ExtrudeParams::new(Vector3::y(), -1.0));
        assert_ne!(a, b);
        assert_eq!(a, cache_key(&square(), &ExtrudeParams::new(Vector3::y(), 1.0)));
        assert_eq!(a.len(), 64);
    }
}
