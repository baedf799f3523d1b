// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool catalogue: which remote service each tool talks to, what files it
// admits, and the strongly typed options each tool screen collects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuireError;
use crate::types::{CandidateFile, PageRange};

/// Subscription plan; drives the file-count and size limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

impl FromStr for Plan {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "premium" | "pro" => Ok(Self::Premium),
            other => Err(QuireError::Config(format!("unknown plan '{other}'"))),
        }
    }
}

/// Every tool screen the product offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    Merge,
    Split,
    Compress,
    Rotate,
    Ocr,
    Protect,
    Unlock,
    PdfToPdfa,
    RemovePages,
    AddPageNumbers,
    Compare,
    ImageToPdf,
    PdfToWord,
    PdfToExcel,
    PdfToPowerpoint,
}

impl ToolId {
    pub const ALL: [ToolId; 15] = [
        Self::Merge,
        Self::Split,
        Self::Compress,
        Self::Rotate,
        Self::Ocr,
        Self::Protect,
        Self::Unlock,
        Self::PdfToPdfa,
        Self::RemovePages,
        Self::AddPageNumbers,
        Self::Compare,
        Self::ImageToPdf,
        Self::PdfToWord,
        Self::PdfToExcel,
        Self::PdfToPowerpoint,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::Compress => "compress",
            Self::Rotate => "rotate",
            Self::Ocr => "ocr",
            Self::Protect => "protect",
            Self::Unlock => "unlock",
            Self::PdfToPdfa => "pdf-to-pdfa",
            Self::RemovePages => "remove-pages",
            Self::AddPageNumbers => "add-page-numbers",
            Self::Compare => "compare",
            Self::ImageToPdf => "image-to-pdf",
            Self::PdfToWord => "pdf-to-word",
            Self::PdfToExcel => "pdf-to-excel",
            Self::PdfToPowerpoint => "pdf-to-powerpoint",
        }
    }

    /// Which remote service runs this tool, and under which name.
    pub fn shape(&self) -> ToolShape {
        match self {
            Self::Merge => ToolShape::SingleCall { action: "merge" },
            Self::Compare => ToolShape::SingleCall { action: "compare" },
            Self::AddPageNumbers => ToolShape::SingleCall {
                action: "add_page_numbers",
            },
            Self::Protect => ToolShape::SingleCall { action: "protect" },
            Self::Unlock => ToolShape::SingleCall { action: "unlock" },
            Self::RemovePages => ToolShape::SingleCall {
                action: "remove_pages",
            },
            Self::Split => ToolShape::Task { tool: "split" },
            Self::Compress => ToolShape::Task { tool: "compress" },
            Self::Rotate => ToolShape::Task { tool: "rotate" },
            Self::Ocr => ToolShape::Task { tool: "pdfocr" },
            Self::PdfToPdfa => ToolShape::Task { tool: "pdfa" },
            Self::ImageToPdf => ToolShape::Task { tool: "imagepdf" },
            Self::PdfToWord => ToolShape::Export {
                format: ExportFormat::Docx,
            },
            Self::PdfToExcel => ToolShape::Export {
                format: ExportFormat::Xlsx,
            },
            Self::PdfToPowerpoint => ToolShape::Export {
                format: ExportFormat::Pptx,
            },
        }
    }

    /// Prefix prepended to the original name to form the output name.
    pub fn output_prefix(&self) -> &'static str {
        match self {
            Self::Merge => "merged_",
            Self::Split => "split_",
            Self::Compress => "compressed_",
            Self::Rotate => "rotated_",
            Self::Ocr => "ocr_",
            Self::Protect => "protected_",
            Self::Unlock => "unlocked_",
            Self::PdfToPdfa => "pdfa_",
            Self::RemovePages => "trimmed_",
            Self::AddPageNumbers => "numbered_",
            Self::Compare => "compared_",
            Self::ImageToPdf => "images_",
            Self::PdfToWord | Self::PdfToExcel | Self::PdfToPowerpoint => "converted_",
        }
    }

    /// Validation rules for this tool under the given plan.
    pub fn rules(&self, plan: Plan) -> ToolRules {
        let (free_files, premium_files) = match self {
            Self::Merge => (3, 20),
            Self::Compare => (2, 2),
            Self::ImageToPdf => (5, 50),
            Self::Compress | Self::Rotate | Self::Ocr | Self::PdfToPdfa => (1, 10),
            _ => (1, 1),
        };
        let limits = match plan {
            Plan::Free => ToolLimits {
                max_files: free_files,
                max_bytes: FREE_MAX_BYTES,
            },
            Plan::Premium => ToolLimits {
                max_files: premium_files,
                max_bytes: PREMIUM_MAX_BYTES,
            },
        };

        let (accepted, protection) = match self {
            Self::ImageToPdf => (IMAGE_TYPES, ProtectionRequirement::Any),
            Self::Unlock => (PDF_TYPES, ProtectionRequirement::MustBeProtected),
            _ => (PDF_TYPES, ProtectionRequirement::MustBeUnprotected),
        };

        ToolRules {
            accepted,
            limits,
            protection,
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ToolId {
    type Err = QuireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.slug() == s)
            .ok_or_else(|| QuireError::Config(format!("unknown tool '{s}'")))
    }
}

/// How a tool's job is run remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolShape {
    /// One multipart request to the custom backend.
    SingleCall { action: &'static str },
    /// Initialize / upload / process on the task-based service.
    Task { tool: &'static str },
    /// Asset upload, export and status polling on the conversion service.
    Export { format: ExportFormat },
}

// ---------------------------------------------------------------------------
// Validation rules
// ---------------------------------------------------------------------------

/// 50 MiB.
pub const FREE_MAX_BYTES: u64 = 50 * 1_048_576;
/// 200 MiB.
pub const PREMIUM_MAX_BYTES: u64 = 200 * 1_048_576;

/// A MIME type and the extensions that stand in for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedType {
    pub mime: &'static str,
    pub extensions: &'static [&'static str],
}

pub const PDF_TYPES: &[AcceptedType] = &[AcceptedType {
    mime: "application/pdf",
    extensions: &[".pdf"],
}];

pub const IMAGE_TYPES: &[AcceptedType] = &[
    AcceptedType {
        mime: "image/jpeg",
        extensions: &[".jpg", ".jpeg"],
    },
    AcceptedType {
        mime: "image/png",
        extensions: &[".png"],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolLimits {
    pub max_files: usize,
    /// Aggregate size limit across the whole working set.
    pub max_bytes: u64,
}

/// Whether a tool expects password-protected PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionRequirement {
    MustBeUnprotected,
    MustBeProtected,
    /// Non-PDF tools: the encryption check is skipped.
    Any,
}

/// Static admission rules for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRules {
    pub accepted: &'static [AcceptedType],
    pub limits: ToolLimits,
    pub protection: ProtectionRequirement,
}

impl ToolRules {
    /// Declared MIME type in the accepted set, or extension matches.
    pub fn accepts(&self, candidate: &CandidateFile) -> bool {
        let ext = candidate.extension();
        self.accepted.iter().any(|accepted| {
            accepted.mime == candidate.mime_type
                || ext
                    .as_deref()
                    .is_some_and(|ext| accepted.extensions.contains(&ext))
        })
    }
}

// ---------------------------------------------------------------------------
// Tool parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Recommended,
    Extreme,
}

impl CompressionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Recommended => "recommended",
            Self::Extreme => "extreme",
        }
    }
}

/// PDF/A conformance level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdfaConformance {
    #[serde(rename = "pdfa-1b")]
    Pdfa1b,
    #[serde(rename = "pdfa-1a")]
    Pdfa1a,
    #[default]
    #[serde(rename = "pdfa-2b")]
    Pdfa2b,
    #[serde(rename = "pdfa-2u")]
    Pdfa2u,
    #[serde(rename = "pdfa-2a")]
    Pdfa2a,
    #[serde(rename = "pdfa-3b")]
    Pdfa3b,
    #[serde(rename = "pdfa-3u")]
    Pdfa3u,
    #[serde(rename = "pdfa-3a")]
    Pdfa3a,
}

impl PdfaConformance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdfa1b => "pdfa-1b",
            Self::Pdfa1a => "pdfa-1a",
            Self::Pdfa2b => "pdfa-2b",
            Self::Pdfa2u => "pdfa-2u",
            Self::Pdfa2a => "pdfa-2a",
            Self::Pdfa3b => "pdfa-3b",
            Self::Pdfa3u => "pdfa-3u",
            Self::Pdfa3a => "pdfa-3a",
        }
    }
}

/// Where page numbers are stamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl NumberPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top_left",
            Self::TopCenter => "top_center",
            Self::TopRight => "top_right",
            Self::BottomLeft => "bottom_left",
            Self::BottomCenter => "bottom_center",
            Self::BottomRight => "bottom_right",
        }
    }
}

/// Page number text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    /// "3"
    #[default]
    Number,
    /// "Page 3"
    PageNumber,
    /// "Page 3 of 10"
    PageOfTotal,
}

impl NumberFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::PageNumber => "page_number",
            Self::PageOfTotal => "page_of_total",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    #[default]
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

/// Page size for image-to-PDF.  `Fit` sizes each page to its image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePageSize {
    #[default]
    #[serde(rename = "fit")]
    Fit,
    #[serde(rename = "A4")]
    A4,
    #[serde(rename = "letter")]
    Letter,
}

impl ImagePageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::A4 => "A4",
            Self::Letter => "letter",
        }
    }
}

/// Office format produced by the conversion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Docx,
    Xlsx,
    Pptx,
}

impl ExportFormat {
    /// `targetFormat` value of the export operation.
    pub fn target_format(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }

    pub fn tool(&self) -> ToolId {
        match self {
            Self::Docx => ToolId::PdfToWord,
            Self::Xlsx => ToolId::PdfToExcel,
            Self::Pptx => ToolId::PdfToPowerpoint,
        }
    }
}

/// Options collected by each tool screen, tagged by tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", rename_all = "kebab-case")]
pub enum ToolParams {
    Merge,
    Split {
        ranges: Vec<PageRange>,
        /// Join the extracted ranges into a single output file.
        #[serde(default)]
        merge_after: bool,
    },
    Compress {
        #[serde(default)]
        level: CompressionLevel,
    },
    Rotate,
    Ocr {
        /// Tesseract-style language codes, e.g. `eng`.
        languages: Vec<String>,
    },
    Protect {
        password: String,
    },
    Unlock {
        password: String,
    },
    PdfToPdfa {
        #[serde(default)]
        conformance: PdfaConformance,
    },
    RemovePages {
        /// Pages to drop, as the user selected them.
        ranges: Vec<PageRange>,
    },
    AddPageNumbers {
        #[serde(default)]
        position: NumberPosition,
        #[serde(default)]
        format: NumberFormat,
    },
    Compare,
    ImageToPdf {
        #[serde(default)]
        orientation: PageOrientation,
        /// Margin in pixels around each image.
        #[serde(default)]
        margin: u32,
        #[serde(default)]
        page_size: ImagePageSize,
        #[serde(default = "default_true")]
        merge_after: bool,
    },
    Export {
        format: ExportFormat,
    },
}

fn default_true() -> bool {
    true
}

impl ToolParams {
    /// The tool these parameters belong to.
    pub fn tool(&self) -> ToolId {
        match self {
            Self::Merge => ToolId::Merge,
            Self::Split { .. } => ToolId::Split,
            Self::Compress { .. } => ToolId::Compress,
            Self::Rotate => ToolId::Rotate,
            Self::Ocr { .. } => ToolId::Ocr,
            Self::Protect { .. } => ToolId::Protect,
            Self::Unlock { .. } => ToolId::Unlock,
            Self::PdfToPdfa { .. } => ToolId::PdfToPdfa,
            Self::RemovePages { .. } => ToolId::RemovePages,
            Self::AddPageNumbers { .. } => ToolId::AddPageNumbers,
            Self::Compare => ToolId::Compare,
            Self::ImageToPdf { .. } => ToolId::ImageToPdf,
            Self::Export { format } => format.tool(),
        }
    }

    /// Check these parameters belong to `tool`.
    pub fn ensure_for(&self, tool: ToolId) -> Result<(), QuireError> {
        if self.tool() == tool {
            Ok(())
        } else {
            Err(QuireError::ParamsMismatch {
                tool: tool.slug().into(),
                given: self.tool().slug().into(),
            })
        }
    }
}
