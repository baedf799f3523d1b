// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: header and encryption checks on raw bytes, page counting.

pub mod encryption;
pub mod inspect;

pub use encryption::{has_pdf_header, is_password_protected};
pub use inspect::page_count;
