// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Reading outlines and brushes from JSON files

use crate::geometry::ShapePolygon;
use crate::kernel::Brush;
use anyhow::{bail, Context, Result};
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;

/// Load an outline: `{"vertices": [[x, y, z], ...], "edge_materials": [...]}`
pub fn load_outline(path: impl AsRef<Path>) -> Result<ShapePolygon> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read outline file: {:?}", path))?;
    let outline: ShapePolygon = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse outline file: {:?}", path))?;
    if outline.len() < 3 {
        bail!("Outline {:?} has {} vertices, expected at least 3", path, outline.len());
    }
    Ok(outline)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BrushFile {
    One(Brush),
    Many(Vec<Brush>),
}

/// Load one brush or an array of brushes as written by `extrude --json`
pub fn load_brushes(path: impl AsRef<Path>) -> Result<Vec<Brush>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read brush file: {:?}", path))?;
    let brushes = match serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse brush file: {:?}", path))?
    {
        BrushFile::One(brush) => vec![brush],
        BrushFile::Many(brushes) => brushes,
    };
    Ok(brushes)
}

/// Parse `x,y,z`
pub fn parse_vector(text: &str) -> Result<Vector3<f64>> {
    let parts: Vec<f64> = text
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid number {:?} in vector {:?}", part, text))
        })
        .collect::<Result<_>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => bail!("Expected three comma-separated numbers, got {:?}", text),
    }
}
