// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D geometric predicates for outline processing
//! Orientation falls back to fused multiply-add for near-degenerate cases

use nalgebra::Point2;

/// Epsilon for turn direction comparisons
pub const EPS: f64 = 1e-9;

/// Twice the signed area of triangle (a, b, c).
///
/// Positive when (a, b, c) winds counter-clockwise, negative when
/// clockwise, near zero when collinear.
pub fn orient2d(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let acx = c.x - a.x;
    let acy = c.y - a.y;

    let result = abx * acy - aby * acx;
    if result.abs() < EPS {
        // one rounding instead of two
        abx.mul_add(acy, -(aby * acx))
    } else {
        result
    }
}

/// Signed area of a closed loop (shoelace formula)
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Sign of the loop's winding: 1 counter-clockwise, -1 clockwise, 0 degenerate
pub fn polygon_sign(points: &[Point2<f64>], area_epsilon: f64) -> i8 {
    let area = signed_area(points);
    if area > area_epsilon {
        1
    } else if area < -area_epsilon {
        -1
    } else {
        0
    }
}

/// True when every corner turns the same way as the loop's winding.
///
/// Collinear corners are allowed; degenerate loops are not convex.
pub fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let sign = polygon_sign(points, EPS);
    if sign == 0 {
        return false;
    }

    for i in 0..n {
        let turn = orient2d(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]);
        if turn * (sign as f64) < -EPS {
            return false;
        }
    }
    true
}
