// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planes, tangent frames and working-plane projection

use crate::utils::math::centroid;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Plane `normal . p == distance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub distance: f64,
}

impl Plane {
    /// Plane through `point` with the given normal (normalized here)
    pub fn new(normal: Vector3<f64>, point: &Point3<f64>) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: normal.dot(&point.coords),
        }
    }

    /// Best-fit plane of a polygon loop using Newell's method.
    ///
    /// Returns `None` when the loop has no area.
    pub fn from_polygon(points: &[Point3<f64>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let normal = newell_normal(points);
        if normal.norm_squared() < 1e-24 {
            return None;
        }
        Some(Self::new(normal, &centroid(points)))
    }

    /// Signed distance of `point` from the plane
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.distance
    }
}

/// Area-weighted normal of a (possibly non-planar) loop.
///
/// The length equals twice the loop's area; direction follows the
/// right-hand rule.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::zeros();
    let n = points.len();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal
}

/// Tangent and binormal for a surface normal.
///
/// Floors and ceilings are mapped against the Z axis, everything else
/// against Y so wall textures stay upright. `tangent x binormal == normal`.
pub fn calculate_tangents(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let n = normal.normalize();
    let reference = if n.y.abs() >= n.x.abs() && n.y.abs() >= n.z.abs() {
        Vector3::z()
    } else {
        Vector3::y()
    };
    let tangent = reference.cross(&n).normalize();
    let binormal = n.cross(&tangent).normalize();
    (tangent, binormal)
}

/// Maps points between world space and 2D coordinates of a working plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneProjection {
    pub origin: Point3<f64>,
    pub normal: Vector3<f64>,
    pub u_axis: Vector3<f64>,
    pub v_axis: Vector3<f64>,
}

impl PlaneProjection {
    /// Frame at `origin` on `plane`; `u_axis x v_axis == plane.normal`
    pub fn new(origin: Point3<f64>, plane: &Plane) -> Self {
        let normal = plane.normal.normalize();
        // keep the origin on the plane so lifted points land on it
        let origin = origin - normal * plane.signed_distance(&origin);
        let (u_axis, v_axis) = calculate_tangents(&normal);
        Self {
            origin,
            normal,
            u_axis,
            v_axis,
        }
    }

    pub fn to_2d(&self, point: &Point3<f64>) -> Point2<f64> {
        let offset = point - self.origin;
        Point2::new(offset.dot(&self.u_axis), offset.dot(&self.v_axis))
    }

    pub fn to_world(&self, point: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u_axis * point.x + self.v_axis * point.y
    }

    pub fn project_all(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|p| self.to_2d(p)).collect()
    }

    pub fn lift_all(&self, points: &[Point2<f64>]) -> Vec<Point3<f64>> {
        points.iter().map(|p| self.to_world(p)).collect()
    }
}
