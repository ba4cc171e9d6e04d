// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - brush construction, partitioning and mesh representation

pub mod analytics;
mod bbox;
pub mod extrude;
mod halfedge;
pub mod materials;
mod mesh;
mod outline;
pub mod partition;
pub mod plane;
pub mod predicates;
mod shape;
pub mod triangulate;
pub mod validate;

pub use analytics::{analyze, analyze_control_mesh, GeometryStats};
pub use bbox::BoundingBox;
pub use extrude::{build_prism_mesh, build_prism_mesh_with_config, ExtrudeParams};
pub use halfedge::{ControlMesh, HalfEdge, Polygon};
pub use materials::{reattach_edge_materials, EdgeMetadata, ShapeEdge};
pub use mesh::{Mesh, Triangle, Vertex};
pub use outline::{remove_duplicate_points, ShapePolygon};
pub use partition::{partition_polygon, Partition};
pub use plane::{calculate_tangents, Plane, PlaneProjection};
pub use shape::{Material, Shape, SmoothingGroupAllocator, Surface, TexGen, WALL_MATERIAL};
pub use validate::{inspect, inspect_with_shape, validate, MeshValidation, ValidationIssue};
