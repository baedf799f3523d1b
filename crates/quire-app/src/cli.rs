// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: one subcommand per tool.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use quire_core::error::Result;
use quire_core::tools::{
    CompressionLevel, ExportFormat, ImagePageSize, NumberFormat, NumberPosition, PageOrientation,
    PdfaConformance, Plan, ToolId, ToolParams,
};
use quire_core::types::{CandidateFile, extension_of};
use quire_document::pages::parse_page_ranges;
use serde::de::DeserializeOwned;

#[derive(Debug, Parser)]
#[command(name = "quire", version, about = "Run PDF tools through the Quire processing services")]
pub struct Cli {
    /// Plan whose limits apply (free or premium); defaults to the configured plan.
    #[arg(long, global = true, value_parser = parse_plan)]
    pub plan: Option<Plan>,

    /// Directory to save the result in; defaults to the data directory.
    #[arg(long, global = true)]
    pub out: Option<PathBuf>,

    /// Quarter turns applied to every file before processing
    /// (negative turns counter-clockwise).
    #[arg(long, global = true, default_value_t = 0, allow_hyphen_values = true)]
    pub turns: i32,

    #[command(subcommand)]
    pub tool: ToolCommand,
}

#[derive(Debug, Subcommand)]
pub enum ToolCommand {
    /// Combine PDFs in the order given.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Extract page ranges, e.g. `--ranges 1-3,5`.
    Split {
        #[arg(long)]
        ranges: String,
        /// Join the extracted ranges into one file.
        #[arg(long)]
        merge_after: bool,
        file: PathBuf,
    },
    Compress {
        #[arg(long, default_value = "recommended", value_parser = parse_choice::<CompressionLevel>)]
        level: CompressionLevel,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Apply `--turns` rotation and save.
    Rotate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Ocr {
        /// Document language(s), e.g. `--lang eng --lang deu`.
        #[arg(long = "lang", default_value = "eng")]
        languages: Vec<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    Protect {
        #[arg(long)]
        password: String,
        file: PathBuf,
    },
    Unlock {
        #[arg(long)]
        password: String,
        file: PathBuf,
    },
    PdfToPdfa {
        #[arg(long, default_value = "pdfa-2b", value_parser = parse_choice::<PdfaConformance>)]
        conformance: PdfaConformance,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Drop pages, e.g. `--pages 2,4-6`.
    RemovePages {
        #[arg(long)]
        pages: String,
        file: PathBuf,
    },
    AddPageNumbers {
        #[arg(long, default_value = "bottom_center", value_parser = parse_choice::<NumberPosition>)]
        position: NumberPosition,
        #[arg(long, default_value = "number", value_parser = parse_choice::<NumberFormat>)]
        format: NumberFormat,
        file: PathBuf,
    },
    Compare {
        first: PathBuf,
        second: PathBuf,
    },
    ImageToPdf {
        #[arg(long, default_value = "portrait", value_parser = parse_choice::<PageOrientation>)]
        orientation: PageOrientation,
        /// Margin around each image, in pixels.
        #[arg(long, default_value_t = 0)]
        margin: u32,
        #[arg(long, default_value = "fit", value_parser = parse_choice::<ImagePageSize>)]
        page_size: ImagePageSize,
        /// One PDF per image instead of a single document.
        #[arg(long)]
        separate: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    PdfToWord {
        file: PathBuf,
    },
    PdfToExcel {
        file: PathBuf,
    },
    PdfToPowerpoint {
        file: PathBuf,
    },
}

/// A parsed tool invocation.
#[derive(Debug)]
pub struct ToolRequest {
    pub tool: ToolId,
    pub params: ToolParams,
    pub files: Vec<PathBuf>,
}

impl ToolCommand {
    pub fn into_request(self) -> Result<ToolRequest> {
        let (params, files) = match self {
            Self::Merge { files } => (ToolParams::Merge, files),
            Self::Split {
                ranges,
                merge_after,
                file,
            } => (
                ToolParams::Split {
                    ranges: parse_page_ranges(&ranges)?,
                    merge_after,
                },
                vec![file],
            ),
            Self::Compress { level, files } => (ToolParams::Compress { level }, files),
            Self::Rotate { files } => (ToolParams::Rotate, files),
            Self::Ocr { languages, files } => (ToolParams::Ocr { languages }, files),
            Self::Protect { password, file } => (ToolParams::Protect { password }, vec![file]),
            Self::Unlock { password, file } => (ToolParams::Unlock { password }, vec![file]),
            Self::PdfToPdfa { conformance, files } => {
                (ToolParams::PdfToPdfa { conformance }, files)
            }
            Self::RemovePages { pages, file } => (
                ToolParams::RemovePages {
                    ranges: parse_page_ranges(&pages)?,
                },
                vec![file],
            ),
            Self::AddPageNumbers {
                position,
                format,
                file,
            } => (ToolParams::AddPageNumbers { position, format }, vec![file]),
            Self::Compare { first, second } => (ToolParams::Compare, vec![first, second]),
            Self::ImageToPdf {
                orientation,
                margin,
                page_size,
                separate,
                files,
            } => (
                ToolParams::ImageToPdf {
                    orientation,
                    margin,
                    page_size,
                    merge_after: !separate,
                },
                files,
            ),
            Self::PdfToWord { file } => export(ExportFormat::Docx, file),
            Self::PdfToExcel { file } => export(ExportFormat::Xlsx, file),
            Self::PdfToPowerpoint { file } => export(ExportFormat::Pptx, file),
        };

        Ok(ToolRequest {
            tool: params.tool(),
            params,
            files,
        })
    }
}

fn export(format: ExportFormat, file: PathBuf) -> (ToolParams, Vec<PathBuf>) {
    (ToolParams::Export { format }, vec![file])
}

fn parse_plan(s: &str) -> std::result::Result<Plan, String> {
    s.parse().map_err(|e: quire_core::QuireError| e.to_string())
}

/// Parse a choice by its wire name, e.g. `extreme` or `pdfa-1b`.
fn parse_choice<T: DeserializeOwned>(s: &str) -> std::result::Result<T, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("'{s}' is not a valid choice"))
}

/// Read a file from disk as a candidate for admission.
pub fn read_candidate(path: &Path) -> Result<CandidateFile> {
    let data = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime_type = mime_for(&name);
    Ok(CandidateFile::new(name, mime_type, data))
}

fn mime_for(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some(".pdf") => "application/pdf",
        Some(".jpg" | ".jpeg") => "image/jpeg",
        Some(".png") => "image/png",
        _ => "application/octet-stream",
    }
}
