// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! brushmesh CLI

use anyhow::{Context, Result};
use brushmesh::cli::{load_brushes, load_outline, parse_vector, Reporter};
use brushmesh::geometry::{analyze, inspect_with_shape, ExtrudeParams, Plane};
use brushmesh::{BrushKernel, BuildConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "brushmesh")]
#[command(about = "Brushmesh - extrude outlines into half-edge brushes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to brushmesh.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extrude an outline into a prism brush
    Extrude {
        /// Outline JSON file
        input: PathBuf,

        /// Signed extrusion distance
        #[arg(long, allow_hyphen_values = true)]
        height: f64,

        /// Extrusion direction as x,y,z (defaults to the outline normal)
        #[arg(short, long, allow_hyphen_values = true)]
        direction: Option<String>,

        /// Triangle fans instead of single cap polygons
        #[arg(long)]
        multi_surface: bool,

        /// Put the side faces into a new smoothing group
        #[arg(long)]
        smooth: bool,

        /// Partition concave outlines and build one brush per piece
        #[arg(long)]
        split: bool,

        /// Print brushes as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split an outline into convex pieces
    Partition {
        /// Outline JSON file
        input: PathBuf,

        /// Working plane normal as x,y,z (defaults to the outline normal)
        #[arg(short, long, allow_hyphen_values = true)]
        normal: Option<String>,

        /// Print the partition as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check brushes written by `extrude --json`
    Validate {
        /// Brush JSON file
        input: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Extrude {
            input,
            height,
            direction,
            multi_surface,
            smooth,
            split,
            json,
        } => {
            let mut params = ExtrudeParams::new(nalgebra::Vector3::y(), *height);
            params.single_surface_ends = !multi_surface;
            params.smooth = smooth.then_some(true);
            extrude_command(&cli, input, direction.as_deref(), params, *split, *json)?;
        }
        Commands::Partition {
            input,
            normal,
            json,
        } => {
            partition_command(&cli, input, normal.as_deref(), *json)?;
        }
        Commands::Validate { input } => {
            validate_command(&cli, input)?;
        }
        Commands::Version => {
            println!("brushmesh v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let config = match &cli.config {
        Some(path) => BuildConfig::from_file(path)?,
        None => BuildConfig::load()?,
    };
    if cli.verbose {
        Reporter::report_info(&format!(
            "distance epsilon {}, equality epsilon {}",
            config.distance_epsilon, config.equality_epsilon
        ));
    }
    Ok(config)
}

fn extrude_command(
    cli: &Cli,
    input: &PathBuf,
    direction: Option<&str>,
    mut params: ExtrudeParams,
    split: bool,
    json: bool,
) -> Result<()> {
    let outline = load_outline(input)?;
    let mut kernel = BrushKernel::with_config(load_config(cli)?);

    params.direction = match direction {
        Some(text) => parse_vector(text)?,
        None => outline
            .plane()
            .map(|plane| plane.normal)
            .context("Outline has no area; pass --direction")?,
    };

    if cli.verbose {
        Reporter::progress(&format!("Extruding {}", input.display()));
    }
    let start = Instant::now();
    let brushes = if split {
        kernel.build_brushes(&outline, &params)?
    } else {
        vec![kernel.build_prism(&outline, &params)?]
    };
    let duration = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&brushes)?);
    } else {
        Reporter::report_brushes(&input.display().to_string(), &brushes, duration);
        if cli.verbose {
            for brush in &brushes {
                analyze(&brush.to_mesh()).print();
            }
        }
    }
    Ok(())
}

fn partition_command(cli: &Cli, input: &PathBuf, normal: Option<&str>, json: bool) -> Result<()> {
    let outline = load_outline(input)?;
    let kernel = BrushKernel::with_config(load_config(cli)?);

    let plane = match normal {
        Some(text) => Some(Plane::new(parse_vector(text)?, &outline.vertices[0])),
        None => None,
    };

    if cli.verbose {
        Reporter::progress(&format!("Partitioning {}", input.display()));
    }
    let start = Instant::now();
    let result = kernel.partition(&outline, plane.as_ref())?;
    let duration = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        Reporter::report_partition(&input.display().to_string(), &result.partition, duration);
    }
    Ok(())
}

fn validate_command(cli: &Cli, input: &PathBuf) -> Result<()> {
    let config = load_config(cli)?;
    let brushes = load_brushes(input)?;
    let file = input.display().to_string();

    let mut failures = 0;
    for (index, brush) in brushes.iter().enumerate() {
        let report = inspect_with_shape(&brush.mesh, Some(&brush.shape), &config);
        if !report.is_valid() {
            failures += 1;
        }
        Reporter::report_validation(&file, index, &report);
    }

    if failures > 0 {
        Reporter::report_error(&format!("{} of {} brushes failed validation", failures, brushes.len()));
        std::process::exit(1);
    }
    Reporter::success(&format!("{} brushes valid", brushes.len()));
    Ok(())
}
