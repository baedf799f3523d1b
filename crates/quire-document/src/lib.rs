// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-document: everything that happens to a file before it leaves the
// device.  Covers the validation gate, the per-tool working set, PDF
// inspection (encryption heuristic, page count) and page-range handling.

pub mod pages;
pub mod pdf;
pub mod validation;
pub mod working_set;

pub use validation::{ValidationOutcome, validate};
pub use working_set::WorkingSet;
