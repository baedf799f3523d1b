// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire core: types, tool catalogue and error definitions shared across all
// crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod tools;
pub mod types;

pub use config::AppConfig;
pub use error::{QuireError, Rejection};
pub use tools::{ToolId, ToolParams, ToolRules, ToolShape};
pub use types::*;
