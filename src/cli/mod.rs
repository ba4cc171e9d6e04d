// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI subsystem for brushmesh

pub mod input;
pub mod reporter;

pub use input::{load_brushes, load_outline, parse_vector};
pub use reporter::Reporter;
