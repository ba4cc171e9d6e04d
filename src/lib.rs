// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Brushmesh
//!
//! Builds half-edge brush volumes from closed outlines: prism extrusion
//! with per-polygon materials, convex partitioning of self-touching
//! outlines, and reattachment of edge materials to the partitioned pieces.

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod utils;

pub use config::BuildConfig;
pub use error::{BrushError, Result};
pub use geometry::{
    build_prism_mesh, partition_polygon, reattach_edge_materials, validate, ControlMesh,
    ExtrudeParams, Mesh, Partition, ShapePolygon,
};
pub use kernel::{Brush, BrushKernel, CacheStats, OutlinePartition};
