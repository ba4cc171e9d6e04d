// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Convex partitioning of planar outlines
//!
//! Outlines are projected into their working plane, split wherever they
//! touch themselves, and every non-convex loop is triangulated and then
//! merged back into convex pieces (Hertel-Mehlhorn).

use super::predicates::{is_convex, signed_area};
use super::triangulate::triangulate;
use super::{Plane, PlaneProjection, ShapePolygon};
use crate::config::BuildConfig;
use crate::error::{BrushError, Result};
use crate::utils::math::same_point_2d;
use log::{debug, trace};
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Convex pieces of an outline together with the frame used to find them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub projection: PlaneProjection,
    /// Outline in working-plane coordinates, duplicates removed
    pub projected: Vec<Point2<f64>>,
    /// World-space pieces, counter-clockwise around the plane normal
    pub polygons: Vec<ShapePolygon>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Split `outline`, lying in `plane`, into convex pieces.
///
/// `origin` anchors the working-plane frame. Degenerate loops produced by
/// self-touch splitting are skipped; an outline with nothing left fails.
pub fn partition_polygon(
    outline: &[Point3<f64>],
    origin: Point3<f64>,
    plane: &Plane,
    config: &BuildConfig,
) -> Result<Partition> {
    if outline.len() < 3 {
        return Err(BrushError::invalid_input(format!(
            "outline has {} points, expected at least 3",
            outline.len()
        )));
    }
    if plane.normal.norm_squared() == 0.0 || plane.normal.iter().any(|c| !c.is_finite()) {
        return Err(BrushError::invalid_input("working plane has no normal"));
    }

    let projection = PlaneProjection::new(origin, plane);
    let mut projected = projection.project_all(outline);
    remove_duplicates_2d(&mut projected, config.distance_epsilon);

    let mut pieces = Vec::new();
    if projected.len() >= 3 {
        split_self_touching(projected.clone(), 0, config, &mut pieces)?;
    }
    if pieces.is_empty() {
        return Err(BrushError::invalid_input("outline has no area"));
    }
    debug!(
        "Partitioned {} points into {} convex pieces",
        projected.len(),
        pieces.len()
    );

    let polygons = pieces
        .iter()
        .map(|piece| ShapePolygon::new(projection.lift_all(piece)))
        .collect();

    Ok(Partition {
        projection,
        projected,
        polygons,
    })
}

/// Drop points equal to their predecessor, wraparound included
fn remove_duplicates_2d(points: &mut Vec<Point2<f64>>, distance_epsilon: f64) {
    points.dedup_by(|b, a| same_point_2d(a, b, distance_epsilon));
    while points.len() > 1 {
        let last = points.len() - 1;
        if !same_point_2d(&points[0], &points[last], distance_epsilon) {
            break;
        }
        points.pop();
    }
}

/// First pair of non-adjacent points that coincide
fn find_self_touch(points: &[Point2<f64>], distance_epsilon: f64) -> Option<(usize, usize)> {
    let n = points.len();
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if same_point_2d(&points[i], &points[j], distance_epsilon) {
                return Some((i, j));
            }
        }
    }
    None
}

fn split_self_touching(
    points: Vec<Point2<f64>>,
    depth: usize,
    config: &BuildConfig,
    pieces: &mut Vec<Vec<Point2<f64>>>,
) -> Result<()> {
    if depth > config.max_partition_depth {
        return Err(BrushError::partition(format!(
            "self-touch splitting went deeper than {}",
            config.max_partition_depth
        )));
    }

    let Some((i, j)) = find_self_touch(&points, config.distance_epsilon) else {
        return convex_pieces(points, config, pieces);
    };
    trace!("Splitting {} points at {} / {}", points.len(), i, j);

    let mut outer = points[..i].to_vec();
    outer.extend_from_slice(&points[j..]);
    let inner = points[i..j].to_vec();

    for part in [outer, inner] {
        if part.len() >= 3 {
            split_self_touching(part, depth + 1, config, pieces)?;
        }
    }
    Ok(())
}

/// Convex decomposition of one simple loop
fn convex_pieces(
    mut points: Vec<Point2<f64>>,
    config: &BuildConfig,
    pieces: &mut Vec<Vec<Point2<f64>>>,
) -> Result<()> {
    let area = signed_area(&points);
    if area.abs() <= config.area_epsilon {
        trace!("Skipping degenerate loop of {} points", points.len());
        return Ok(());
    }
    if area < 0.0 {
        points.reverse();
    }

    if is_convex(&points) {
        pieces.push(points);
        return Ok(());
    }

    let triangles = triangulate(&points)?;
    let mut loops = merge_triangles(&points, triangles);
    restore_skipped_points(&mut loops, points.len());

    for indices in &loops {
        let piece: Vec<Point2<f64>> = indices.iter().map(|&i| points[i]).collect();
        if !is_convex(&piece) || signed_area(&piece) <= 0.0 {
            return Err(BrushError::partition(format!(
                "piece of {} points is not convex",
                piece.len()
            )));
        }
        pieces.push(piece);
    }
    Ok(())
}

/// Hertel-Mehlhorn: drop diagonals while both sides stay convex
fn merge_triangles(points: &[Point2<f64>], triangles: Vec<[usize; 3]>) -> Vec<Vec<usize>> {
    let mut loops: Vec<Vec<usize>> = triangles.into_iter().map(|t| t.to_vec()).collect();

    'search: loop {
        for a in 0..loops.len() {
            for b in (a + 1)..loops.len() {
                if let Some(merged) = try_merge(&loops[a], &loops[b], points) {
                    loops[a] = merged;
                    loops.remove(b);
                    continue 'search;
                }
            }
        }
        break;
    }
    loops
}

/// Join two loops across a shared edge when the result is convex
fn try_merge(a: &[usize], b: &[usize], points: &[Point2<f64>]) -> Option<Vec<usize>> {
    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        let u = a[i];
        let v = a[(i + 1) % na];
        let Some(j) = (0..nb).find(|&j| b[j] == v && b[(j + 1) % nb] == u) else {
            continue;
        };

        // a from v around to u, then b strictly between u and v
        let mut merged = Vec::with_capacity(na + nb - 2);
        merged.extend((0..na).map(|k| a[(i + 1 + k) % na]));
        merged.extend((2..nb).map(|k| b[(j + k) % nb]));

        let coords: Vec<Point2<f64>> = merged.iter().map(|&m| points[m]).collect();
        if is_convex(&coords) {
            return Some(merged);
        }
    }
    None
}

/// Put back outline points the triangulator skipped as collinear.
///
/// A piece edge `u -> v` along the outline whose intermediate points are
/// used by no piece gets those points inserted.
fn restore_skipped_points(loops: &mut [Vec<usize>], n: usize) {
    let mut used = vec![false; n];
    for index in loops.iter().flatten() {
        used[*index] = true;
    }
    if used.iter().all(|&u| u) {
        return;
    }

    for indices in loops.iter_mut() {
        let mut restored = Vec::with_capacity(indices.len());
        for k in 0..indices.len() {
            let u = indices[k];
            let v = indices[(k + 1) % indices.len()];
            restored.push(u);
            let gap = (v + n - u) % n;
            if gap > 1 && (1..gap).all(|step| !used[(u + step) % n]) {
                restored.extend((1..gap).map(|step| (u + step) % n));
            }
        }
        *indices = restored;
    }
}
