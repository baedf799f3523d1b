// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Quire.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a file in a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub Uuid);

impl FileId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page rotation in quarter turns, always normalised to 0/90/180/270.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub struct Rotation(u8);

impl Rotation {
    pub const NONE: Self = Self(0);

    /// Build from degrees.  Only multiples of 90 are accepted.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        Some(Self::NONE.turned(degrees / 90))
    }

    /// Rotation after `quarter_turns` clockwise turns (negative turns go
    /// counter-clockwise).
    pub fn turned(self, quarter_turns: i32) -> Self {
        Self(((self.0 as i32 + quarter_turns.rem_euclid(4)) % 4) as u8)
    }

    pub fn rotate_clockwise(self) -> Self {
        self.turned(1)
    }

    pub fn rotate_counter_clockwise(self) -> Self {
        self.turned(-1)
    }

    pub fn degrees(self) -> u16 {
        self.0 as u16 * 90
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl TryFrom<u16> for Rotation {
    type Error = String;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees as i32)
            .ok_or_else(|| format!("rotation must be a multiple of 90, got {degrees}"))
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// A file the user picked, before it has passed the validation gate.
#[derive(Clone)]
pub struct CandidateFile {
    pub name: String,
    /// Declared MIME type; may be empty when the platform could not tell.
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl CandidateFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Lowercase extension including the leading dot, e.g. `.pdf`.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

impl fmt::Debug for CandidateFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Lowercase extension of a file name including the leading dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// A file admitted into a tool's working set.
#[derive(Clone)]
pub struct UploadedFile {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Shared handle to the file bytes; cloning the record does not copy them.
    pub data: Arc<[u8]>,
    pub rotation: Rotation,
    /// Name assigned by the remote server once the upload phase has run.
    pub server_filename: Option<String>,
    /// Lazily computed page count (PDFs only).
    pub page_count: Option<u32>,
    pub added_at: DateTime<Utc>,
}

impl UploadedFile {
    pub fn from_candidate(candidate: CandidateFile) -> Self {
        Self {
            id: FileId::new(),
            size: candidate.size(),
            name: candidate.name,
            mime_type: candidate.mime_type,
            data: candidate.data,
            rotation: Rotation::NONE,
            server_filename: None,
            page_count: None,
            added_at: Utc::now(),
        }
    }
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size)
            .field("rotation", &self.rotation)
            .field("server_filename", &self.server_filename)
            .field("page_count", &self.page_count)
            .finish()
    }
}

/// Identifies one in-flight job on the task-based remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHandle {
    pub task: String,
    pub server: String,
}

/// Outcome of the process phase on the task-based remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub download_filename: String,
    #[serde(default)]
    pub filesize: u64,
    #[serde(default)]
    pub output_filesize: u64,
    #[serde(default = "one")]
    pub output_filenumber: u32,
    #[serde(default)]
    pub status: String,
}

fn one() -> u32 {
    1
}

/// Everything the download step needs to fetch the output of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultDescriptor {
    /// Custom backend: the processed file's name on the backend.
    Processed { filename: String },
    /// Task-based service: the download call needs the handle, not a name.
    Task {
        handle: TaskHandle,
        result: ProcessResult,
    },
    /// Conversion service: the output is hosted at a pre-signed URI.
    Hosted {
        download_uri: String,
        filename: String,
    },
}

impl ResultDescriptor {
    /// Name to save the output under.
    pub fn filename(&self) -> &str {
        match self {
            Self::Processed { filename } | Self::Hosted { filename, .. } => filename,
            Self::Task { result, .. } => &result.download_filename,
        }
    }
}

/// Screen a tool session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStage {
    /// Waiting for files.
    Upload,
    /// Files admitted; options can be edited.
    Preview,
    /// A remote job is running.
    Processing,
    /// A result is ready to download.
    Download,
}

/// Progress of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrchestrationState {
    Idle,
    Initializing,
    Uploading,
    Processing,
    Done,
}

/// Inclusive 1-based page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Size in megabytes rounded to two decimals.
pub fn megabytes(bytes: u64) -> f64 {
    (bytes as f64 / 1_048_576.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_clockwise_turns_return_to_zero() {
        let mut rotation = Rotation::NONE;
        for _ in 0..4 {
            rotation = rotation.rotate_clockwise();
        }
        assert_eq!(rotation, Rotation::NONE);
        assert_eq!(rotation.degrees(), 0);
    }

    #[test]
    fn counter_clockwise_wraps() {
        assert_eq!(Rotation::NONE.rotate_counter_clockwise().degrees(), 270);
        assert_eq!(Rotation::NONE.turned(-5).degrees(), 270);
    }

    #[test]
    fn extreme_turn_counts_wrap() {
        let quarter = Rotation::NONE.rotate_clockwise();
        // i32::MAX is 3 mod 4, i32::MIN is 0 mod 4.
        assert_eq!(quarter.turned(i32::MAX), Rotation::NONE);
        assert_eq!(quarter.turned(i32::MIN), quarter);
        assert_eq!(Rotation::NONE.turned(i32::MIN + 1).degrees(), 90);
    }

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(450).map(Rotation::degrees), Some(90));
        assert_eq!(Rotation::from_degrees(-90).map(Rotation::degrees), Some(270));
        assert!(Rotation::from_degrees(45).is_none());
    }

    #[test]
    fn rotation_serialises_as_degrees() {
        let json = serde_json::to_string(&Rotation::NONE.turned(2)).unwrap();
        assert_eq!(json, "180");
        let back: Rotation = serde_json::from_str("270").unwrap();
        assert_eq!(back.degrees(), 270);
        assert!(serde_json::from_str::<Rotation>("100").is_err());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(extension_of("Report.PDF").as_deref(), Some(".pdf"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some(".gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn megabytes_two_decimals() {
        assert_eq!(megabytes(52_428_800), 50.0);
        assert_eq!(megabytes(1_572_864), 1.5);
        assert_eq!(megabytes(1_000_000), 0.95);
    }

    #[test]
    fn page_range_display() {
        assert_eq!(PageRange::single(4).to_string(), "4");
        assert_eq!(PageRange { start: 2, end: 7 }.to_string(), "2-7");
    }

    #[test]
    fn result_descriptor_filename() {
        let processed = ResultDescriptor::Processed {
            filename: "merged123.pdf".into(),
        };
        assert_eq!(processed.filename(), "merged123.pdf");

        let task = ResultDescriptor::Task {
            handle: TaskHandle {
                task: "t".into(),
                server: "s".into(),
            },
            result: ProcessResult {
                download_filename: "out.zip".into(),
                filesize: 10,
                output_filesize: 5,
                output_filenumber: 2,
                status: "TaskSuccess".into(),
            },
        };
        assert_eq!(task.filename(), "out.zip");
    }
}
