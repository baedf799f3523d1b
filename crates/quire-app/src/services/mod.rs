// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer between the terminal front end and the quire crates.
//
// `AppServices` is the composition root; `Workflows` runs a tool session
// through the orchestrator and turns every failure into a notification.

pub mod app_services;
pub mod data_dir;
pub mod workflow;
