// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File validation gate.
//
// Rules run in a fixed order and the first failing rule rejects the whole
// batch: type, count, aggregate size, then (PDFs only) header and password
// protection.  Nothing is admitted unless everything passes.

use quire_core::error::Rejection;
use quire_core::tools::{ProtectionRequirement, ToolRules};
use quire_core::types::{CandidateFile, megabytes};
use tracing::{debug, info, instrument};

use crate::pdf::encryption::{has_pdf_header, is_password_protected};
use crate::working_set::WorkingSet;

const PDF_MIME: &str = "application/pdf";

/// Result of one validation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    rejection: Option<Rejection>,
}

impl ValidationOutcome {
    pub fn accepted() -> Self {
        Self { rejection: None }
    }

    pub fn rejected(rejection: Rejection) -> Self {
        Self {
            rejection: Some(rejection),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        self.rejection.as_ref()
    }

    /// Names of the offending files (empty for count/size rejections).
    pub fn rejected_names(&self) -> &[String] {
        self.rejection.as_ref().map(Rejection::names).unwrap_or(&[])
    }
}

/// Decide whether `candidates` may join `existing` under `rules`.
#[instrument(skip_all, fields(existing = existing.len(), candidates = candidates.len()))]
pub fn validate(
    existing: &WorkingSet,
    candidates: &[CandidateFile],
    rules: &ToolRules,
) -> ValidationOutcome {
    // 1. Type
    let wrong_type = names_where(candidates, |c| !rules.accepts(c));
    if !wrong_type.is_empty() {
        info!(rejected = ?wrong_type, "unsupported file type");
        return ValidationOutcome::rejected(Rejection::InvalidType { names: wrong_type });
    }

    // 2. Count
    let attempted = existing.len() + candidates.len();
    if attempted > rules.limits.max_files {
        info!(attempted, limit = rules.limits.max_files, "file count limit hit");
        return ValidationOutcome::rejected(Rejection::TooManyFiles {
            limit: rules.limits.max_files,
            attempted,
        });
    }

    // 3. Aggregate size
    let incoming: u64 = candidates.iter().map(CandidateFile::size).sum();
    let total = existing.total_bytes() + incoming;
    if total > rules.limits.max_bytes {
        info!(total, limit = rules.limits.max_bytes, "size limit hit");
        return ValidationOutcome::rejected(Rejection::TooLarge {
            total_mb: megabytes(total),
            limit_mb: megabytes(rules.limits.max_bytes),
        });
    }

    // 4. PDF header and protection
    if rules.protection != ProtectionRequirement::Any {
        let pdfs: Vec<&CandidateFile> = candidates.iter().filter(|c| is_pdf(c)).collect();

        let headerless: Vec<String> = pdfs
            .iter()
            .filter(|c| !has_pdf_header(&c.data))
            .map(|c| c.name.clone())
            .collect();
        if !headerless.is_empty() {
            info!(rejected = ?headerless, "missing PDF header");
            return ValidationOutcome::rejected(Rejection::NotPdf { names: headerless });
        }

        let want_protected = rules.protection == ProtectionRequirement::MustBeProtected;
        let mismatched: Vec<String> = pdfs
            .iter()
            .filter(|c| is_password_protected(&c.data) != want_protected)
            .map(|c| c.name.clone())
            .collect();
        if !mismatched.is_empty() {
            info!(rejected = ?mismatched, want_protected, "password protection mismatch");
            let rejection = if want_protected {
                Rejection::NotProtected { names: mismatched }
            } else {
                Rejection::Protected { names: mismatched }
            };
            return ValidationOutcome::rejected(rejection);
        }
    }

    debug!(total, "batch accepted");
    ValidationOutcome::accepted()
}

fn is_pdf(candidate: &CandidateFile) -> bool {
    candidate.mime_type == PDF_MIME || candidate.extension().as_deref() == Some(".pdf")
}

fn names_where(candidates: &[CandidateFile], pred: impl Fn(&CandidateFile) -> bool) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| pred(c))
        .map(|c| c.name.clone())
        .collect()
}
