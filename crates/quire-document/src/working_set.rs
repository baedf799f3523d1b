// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The ordered set of files a tool screen is working on.
//
// A working set has exactly one owner (the active tool session).  The
// methods below are its only write surface; file-count and size limits are
// enforced by `admit` before anything is appended.

use std::collections::BTreeMap;

use quire_core::error::{QuireError, Result};
use quire_core::tools::ToolRules;
use quire_core::types::{CandidateFile, FileId, Rotation, UploadedFile};
use tracing::{debug, info, instrument};

use crate::pdf::inspect;
use crate::validation::{ValidationOutcome, validate};

#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    files: Vec<UploadedFile>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Admission ------------------------------------------------------------

    /// Run the validation gate and, if the whole batch passes, append every
    /// candidate as a fresh `UploadedFile`.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn admit(
        &mut self,
        candidates: Vec<CandidateFile>,
        rules: &ToolRules,
    ) -> ValidationOutcome {
        let outcome = validate(self, &candidates, rules);
        if outcome.is_valid() {
            self.files
                .extend(candidates.into_iter().map(UploadedFile::from_candidate));
            info!(total = self.files.len(), "files admitted");
        }
        outcome
    }

    // -- Inspection -----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedFile> {
        self.files.iter()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: FileId) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Aggregate size of every admitted file.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Rotation of each file keyed by its name, in degrees.
    pub fn rotation_map(&self) -> BTreeMap<String, u16> {
        self.files
            .iter()
            .map(|f| (f.name.clone(), f.rotation.degrees()))
            .collect()
    }

    /// Page count of a PDF, computed on first use and cached on the record.
    pub fn page_count(&mut self, id: FileId) -> Result<u32> {
        let file = self.get_mut(id)?;
        if let Some(count) = file.page_count {
            return Ok(count);
        }
        let count = inspect::page_count(&file.data)?;
        file.page_count = Some(count);
        Ok(count)
    }

    // -- Mutation -------------------------------------------------------------

    /// Turn one file by `quarter_turns` (negative = counter-clockwise).
    pub fn rotate(&mut self, id: FileId, quarter_turns: i32) -> Result<Rotation> {
        let file = self.get_mut(id)?;
        file.rotation = file.rotation.turned(quarter_turns);
        debug!(file = %file.name, rotation = %file.rotation, "file rotated");
        Ok(file.rotation)
    }

    pub fn rotate_all(&mut self, quarter_turns: i32) {
        for file in &mut self.files {
            file.rotation = file.rotation.turned(quarter_turns);
        }
    }

    /// Move the file at position `from` to position `to`.
    pub fn move_file(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.files.len() || to >= self.files.len() {
            return Err(QuireError::UnknownFile(format!(
                "position {} of {}",
                from.max(to),
                self.files.len()
            )));
        }
        let file = self.files.remove(from);
        self.files.insert(to, file);
        Ok(())
    }

    pub fn remove(&mut self, id: FileId) -> Result<UploadedFile> {
        let index = self
            .files
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| QuireError::UnknownFile(id.to_string()))?;
        let removed = self.files.remove(index);
        debug!(file = %removed.name, "file removed");
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Record the name the remote server assigned during upload.
    pub fn set_server_filename(&mut self, id: FileId, server_filename: String) -> Result<()> {
        self.get_mut(id)?.server_filename = Some(server_filename);
        Ok(())
    }

    /// Forget server names from a previous run.
    pub fn clear_server_filenames(&mut self) {
        for file in &mut self.files {
            file.server_filename = None;
        }
    }

    fn get_mut(&mut self, id: FileId) -> Result<&mut UploadedFile> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| QuireError::UnknownFile(id.to_string()))
    }
}
