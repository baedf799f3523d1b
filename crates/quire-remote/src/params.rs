// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Serialization of `ToolParams` into what each remote service expects:
// multipart text fields for the custom backend, top-level JSON members for
// the task service's process call.

use quire_core::error::Result;
use quire_core::tools::ToolParams;
use quire_document::WorkingSet;
use quire_document::pages::{expand_pages, format_page_ranges};
use serde_json::{Map, Value, json};

/// Text fields sent alongside the files in a single-call request.
pub fn backend_fields(params: &ToolParams, files: &WorkingSet) -> Result<Vec<(String, String)>> {
    let data_dict = || -> Result<(String, String)> {
        Ok((
            "data_dict".to_string(),
            serde_json::to_string(&files.rotation_map())?,
        ))
    };

    let fields = match params {
        ToolParams::Merge => vec![data_dict()?],
        ToolParams::Compare => vec![
            data_dict()?,
            ("download_content_type".into(), "application/pdf".into()),
        ],
        ToolParams::AddPageNumbers { position, format } => vec![
            data_dict()?,
            ("position".into(), position.as_str().into()),
            ("format_choice".into(), format.as_str().into()),
        ],
        ToolParams::Protect { password } => {
            vec![data_dict()?, ("password".into(), password.clone())]
        }
        ToolParams::Unlock { password } => vec![("password".into(), password.clone())],
        ToolParams::RemovePages { ranges } => vec![
            data_dict()?,
            (
                "page_range".into(),
                expand_pages(ranges)
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        ],
        _ => Vec::new(),
    };
    Ok(fields)
}

/// Tool-specific members merged into the process call body.
pub fn task_parameters(params: &ToolParams) -> Map<String, Value> {
    let value = match params {
        ToolParams::Split {
            ranges,
            merge_after,
        } => json!({
            "split_mode": "ranges",
            "ranges": format_page_ranges(ranges),
            "merge_after": merge_after,
        }),
        ToolParams::Compress { level } => json!({ "compression_level": level.as_str() }),
        ToolParams::Ocr { languages } => json!({ "ocr_languages": languages }),
        ToolParams::PdfToPdfa { conformance } => json!({ "conformance": conformance.as_str() }),
        ToolParams::ImageToPdf {
            orientation,
            margin,
            page_size,
            merge_after,
        } => json!({
            "orientation": orientation.as_str(),
            "margin": margin,
            "pagesize": page_size.as_str(),
            "merge_after": merge_after,
        }),
        _ => json!({}),
    };

    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
