// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::geometry::{analyze, MeshValidation, Partition};
use crate::kernel::Brush;
use colored::*;
use std::time::Duration;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report built brushes
    pub fn report_brushes(file: &str, brushes: &[Brush], duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Extruded:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());

        for (index, brush) in brushes.iter().enumerate() {
            let stats = analyze(&brush.to_mesh());
            println!(
                "  {} {} vertices, {} half-edges, {} polygons, volume {}",
                format!("Brush {}:", index).bright_black(),
                brush.mesh.vertex_count().to_string().cyan(),
                brush.mesh.edge_count().to_string().cyan(),
                brush.mesh.polygon_count().to_string().cyan(),
                format!("{:.4}", stats.volume).yellow()
            );
        }
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report convex pieces of a partitioned outline
    pub fn report_partition(file: &str, partition: &Partition, duration: Duration) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Partitioned:".bold(), file.cyan());
        println!("{}", "━".repeat(80).bright_black());
        println!(
            "  {} {}",
            "Outline points:".bright_black(),
            partition.projected.len().to_string().cyan()
        );
        for (index, piece) in partition.polygons.iter().enumerate() {
            let walls = piece
                .edge_materials
                .as_ref()
                .map(|m| m.iter().filter(|m| m.is_wall()).count())
                .unwrap_or(0);
            println!(
                "  {} {} points, {} diagonal edges",
                format!("Piece {}:", index).bright_black(),
                piece.len().to_string().cyan(),
                walls
            );
        }
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report validation result with colors
    pub fn report_validation(file: &str, index: usize, report: &MeshValidation) {
        if report.is_valid() {
            println!(
                "{} {} {}",
                "✅".green(),
                file.cyan(),
                format!("brush {} is valid", index).green().bold()
            );
            return;
        }

        println!(
            "{} {} {}",
            "❌".red(),
            file.cyan(),
            format!("brush {} has {} issues", index, report.issues.len())
                .red()
                .bold()
        );
        for issue in &report.issues {
            println!("  {} {}", "-".bright_black(), issue);
        }
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Format duration for display
    pub fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }

    /// Print progress line
    pub fn progress(message: &str) {
        println!("{} {}...", "⏳".bright_blue(), message.bright_black());
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }
}
