// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response bodies of the three remote services and how to read them.

use quire_core::error::{QuireError, Result};
use quire_core::human_errors::GENERIC_FAILURE;
use quire_core::types::{ProcessResult, TaskHandle};
use serde::Deserialize;
use serde_json::Value;

use crate::service::{AssetUpload, ExportStatus};

// ---------------------------------------------------------------------------
// Custom backend
// ---------------------------------------------------------------------------

/// `{ success, message?, status_code?, data?: { file } }`
#[derive(Debug, Deserialize)]
pub struct BackendEnvelope {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub status_code: Option<u16>,
    pub data: Option<BackendData>,
}

#[derive(Debug, Deserialize)]
pub struct BackendData {
    pub file: Option<String>,
}

impl BackendEnvelope {
    /// The processed filename, or an error carrying the server's message.
    pub fn into_filename(self) -> Result<String> {
        let file = self
            .data
            .and_then(|d| d.file)
            .filter(|f| !f.trim().is_empty());

        match (self.success, file) {
            (true, Some(file)) => Ok(file),
            _ => {
                let message = self
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                match self.status_code {
                    Some(status) if status >= 400 => Err(QuireError::Status {
                        status,
                        message: Some(message),
                    }),
                    _ => Err(QuireError::Remote(message)),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Task-based service
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StartResponse {
    pub task: String,
    pub server: String,
}

impl From<StartResponse> for TaskHandle {
    fn from(r: StartResponse) -> Self {
        TaskHandle {
            task: r.task,
            server: r.server,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub server_filename: String,
}

/// Read a process response.  The service reports failures either as an
/// `error` object or with a failed status.
pub fn parse_process_response(body: &str) -> Result<ProcessResult> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| QuireError::MalformedResponse(e.to_string()))?;

    if let Some(message) = value.get("error").map(message_of) {
        return Err(QuireError::Remote(message));
    }

    let status = value.get("status").and_then(Value::as_str).unwrap_or("");
    if status.eq_ignore_ascii_case("failed") || status.eq_ignore_ascii_case("error") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        return Err(QuireError::Remote(message));
    }

    serde_json::from_value(value).map_err(|e| QuireError::MalformedResponse(e.to_string()))
}

fn message_of(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_FAILURE)
            .to_string(),
    }
}

/// Best-effort extraction of a human message from an error body.
///
/// Understands `{ "message": .. }`, `{ "error": ".." }` and
/// `{ "error": { "message": .. } }`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| value.get("error").map(message_of))
        .filter(|m| !m.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Conversion service
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    #[serde(rename = "uploadUri")]
    pub upload_uri: String,
    #[serde(rename = "assetID")]
    pub asset_id: String,
}

impl From<AssetResponse> for AssetUpload {
    fn from(r: AssetResponse) -> Self {
        AssetUpload {
            upload_uri: r.upload_uri,
            asset_id: r.asset_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportStatusResponse {
    pub status: String,
    pub asset: Option<HostedAsset>,
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct HostedAsset {
    #[serde(rename = "downloadUri")]
    pub download_uri: String,
}

impl ExportStatusResponse {
    pub fn into_status(self) -> Result<ExportStatus> {
        match self.status.as_str() {
            "in progress" => Ok(ExportStatus::InProgress),
            "done" => {
                let asset = self.asset.ok_or_else(|| {
                    QuireError::MalformedResponse("finished export has no asset".into())
                })?;
                Ok(ExportStatus::Done {
                    download_uri: asset.download_uri,
                })
            }
            "failed" => Ok(ExportStatus::Failed {
                message: self
                    .error
                    .as_ref()
                    .map(message_of)
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            }),
            other => Err(QuireError::MalformedResponse(format!(
                "unknown export status '{other}'"
            ))),
        }
    }
}
