// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service traits for the three remote back ends.
//
// The orchestrator is written against these traits; the reqwest clients in
// this crate implement them for production and `testing` provides scripted
// doubles.

use std::future::Future;
use std::sync::Arc;

use quire_core::error::Result;
use quire_core::tools::ExportFormat;
use quire_core::types::{ProcessResult, TaskHandle, UploadedFile};
use serde::Serialize;
use serde_json::{Map, Value};

/// One file as sent over the wire.
#[derive(Clone)]
pub struct FilePart {
    pub name: String,
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl From<&UploadedFile> for FilePart {
    fn from(file: &UploadedFile) -> Self {
        Self {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            data: Arc::clone(&file.data),
        }
    }
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Custom backend
// ---------------------------------------------------------------------------

/// A single multipart call to `POST {base}/{action}`.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub action: String,
    pub files: Vec<FilePart>,
    /// Extra text fields, e.g. `data_dict` or `password`.
    pub fields: Vec<(String, String)>,
}

impl BackendRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub trait BackendService: Send + Sync {
    /// Run one action; returns the processed file's name on the backend.
    fn submit(&self, request: BackendRequest) -> impl Future<Output = Result<String>> + Send;

    /// Fetch a processed file by name.
    fn download(&self, filename: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Task-based service
// ---------------------------------------------------------------------------

/// Per-file entry of a process call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    pub server_filename: String,
    /// Output name: tool prefix + original name.
    pub filename: String,
    pub rotate: u16,
}

/// Body of `POST /process`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRequest {
    pub server: String,
    pub task: String,
    pub tool: String,
    pub files: Vec<FileDescriptor>,
    /// Tool-specific parameters, flattened into the top-level object.
    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

pub trait TaskService: Send + Sync {
    /// Initialize phase: obtain a fresh handle for `tool`.
    fn start(&self, tool: &str) -> impl Future<Output = Result<TaskHandle>> + Send;

    /// Upload one file; returns the server filename.
    fn upload(
        &self,
        handle: &TaskHandle,
        file: FilePart,
    ) -> impl Future<Output = Result<String>> + Send;

    fn process(
        &self,
        request: &ProcessRequest,
    ) -> impl Future<Output = Result<ProcessResult>> + Send;

    fn download(&self, handle: &TaskHandle) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

// ---------------------------------------------------------------------------
// Conversion service
// ---------------------------------------------------------------------------

/// Where to put the bytes of a newly created asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    pub upload_uri: String,
    pub asset_id: String,
}

/// State of an export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    InProgress,
    Done { download_uri: String },
    Failed { message: String },
}

pub trait ConversionService: Send + Sync {
    fn create_asset(&self, media_type: &str) -> impl Future<Output = Result<AssetUpload>> + Send;

    fn upload_asset(
        &self,
        asset: &AssetUpload,
        file: FilePart,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Start the export; returns the status location to poll.
    fn start_export(
        &self,
        asset_id: &str,
        format: ExportFormat,
    ) -> impl Future<Output = Result<String>> + Send;

    fn poll_export(&self, location: &str) -> impl Future<Output = Result<ExportStatus>> + Send;

    fn download(&self, uri: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}
