// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-memory doubles for the three service traits.  Each double
// records the calls it receives so tests can assert on ordering and
// payloads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use quire_core::error::{QuireError, Result};
use quire_core::tools::ExportFormat;
use quire_core::types::{ProcessResult, TaskHandle};

use crate::service::{
    AssetUpload, BackendRequest, BackendService, ConversionService, ExportStatus, FilePart,
    ProcessRequest, TaskService,
};

fn record<T>(log: &Mutex<Vec<T>>, entry: T) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
}

fn snapshot<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

pub struct MockBackend {
    outcome: std::result::Result<String, (u16, String)>,
    requests: Mutex<Vec<BackendRequest>>,
    downloads: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Every submit succeeds with `filename`.
    pub fn returning(filename: &str) -> Self {
        Self {
            outcome: Ok(filename.to_string()),
            requests: Mutex::new(Vec::new()),
            downloads: Mutex::new(Vec::new()),
        }
    }

    /// Every submit fails with `status` and `message`.
    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            outcome: Err((status, message.to_string())),
            ..Self::returning("")
        }
    }

    pub fn requests(&self) -> Vec<BackendRequest> {
        snapshot(&self.requests)
    }

    pub fn downloads(&self) -> Vec<String> {
        snapshot(&self.downloads)
    }
}

impl BackendService for MockBackend {
    async fn submit(&self, request: BackendRequest) -> Result<String> {
        record(&self.requests, request);
        match &self.outcome {
            Ok(filename) => Ok(filename.clone()),
            Err((status, message)) => Err(QuireError::Status {
                status: *status,
                message: Some(message.clone()),
            }),
        }
    }

    async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        record(&self.downloads, filename.to_string());
        Ok(format!("backend:{filename}").into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Task service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum TaskCall {
    Start(String),
    UploadStarted(String),
    Uploaded(String),
    Process(ProcessRequest),
    Download(TaskHandle),
}

pub struct MockTaskService {
    handle: TaskHandle,
    result: ProcessResult,
    failing_upload: Option<String>,
    upload_delays: HashMap<String, Duration>,
    calls: Mutex<Vec<TaskCall>>,
}

impl Default for MockTaskService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskService {
    pub fn new() -> Self {
        Self {
            handle: TaskHandle {
                task: "task-1".into(),
                server: "server-1".into(),
            },
            result: ProcessResult {
                download_filename: "output.pdf".into(),
                filesize: 0,
                output_filesize: 0,
                output_filenumber: 1,
                status: "TaskSuccess".into(),
            },
            failing_upload: None,
            upload_delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_result(mut self, result: ProcessResult) -> Self {
        self.result = result;
        self
    }

    /// Uploads of the file called `name` fail.
    pub fn failing_upload(mut self, name: &str) -> Self {
        self.failing_upload = Some(name.to_string());
        self
    }

    /// Hold the upload of `name` for `delay` before answering.
    pub fn with_upload_delay(mut self, name: &str, delay: Duration) -> Self {
        self.upload_delays.insert(name.to_string(), delay);
        self
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn calls(&self) -> Vec<TaskCall> {
        snapshot(&self.calls)
    }

    pub fn process_requests(&self) -> Vec<ProcessRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TaskCall::Process(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    /// Server filename the double assigns to `name`.
    pub fn server_filename(name: &str) -> String {
        format!("srv_{name}")
    }
}

impl TaskService for MockTaskService {
    async fn start(&self, tool: &str) -> Result<TaskHandle> {
        record(&self.calls, TaskCall::Start(tool.to_string()));
        Ok(self.handle.clone())
    }

    async fn upload(&self, _handle: &TaskHandle, file: FilePart) -> Result<String> {
        record(&self.calls, TaskCall::UploadStarted(file.name.clone()));
        if let Some(delay) = self.upload_delays.get(&file.name) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing_upload.as_deref() == Some(file.name.as_str()) {
            return Err(QuireError::Upload {
                file: file.name,
                detail: "connection reset".into(),
            });
        }
        record(&self.calls, TaskCall::Uploaded(file.name.clone()));
        Ok(Self::server_filename(&file.name))
    }

    async fn process(&self, request: &ProcessRequest) -> Result<ProcessResult> {
        record(&self.calls, TaskCall::Process(request.clone()));
        Ok(self.result.clone())
    }

    async fn download(&self, handle: &TaskHandle) -> Result<Vec<u8>> {
        record(&self.calls, TaskCall::Download(handle.clone()));
        Ok(format!("task:{}", self.result.download_filename).into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Conversion service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConversionCall {
    CreateAsset(String),
    UploadAsset {
        name: String,
        mime_type: String,
    },
    StartExport {
        asset_id: String,
        format: ExportFormat,
    },
    Poll(String),
    Download(String),
}

pub struct MockConversion {
    pending_polls: u32,
    failure: Option<String>,
    polls: AtomicU32,
    calls: Mutex<Vec<ConversionCall>>,
}

impl Default for MockConversion {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConversion {
    /// Exports finish on the first status check.
    pub fn new() -> Self {
        Self {
            pending_polls: 0,
            failure: None,
            polls: AtomicU32::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Report "in progress" this many times before finishing.
    pub fn pending_for(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Report the export as failed with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<ConversionCall> {
        snapshot(&self.calls)
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

pub const MOCK_DOWNLOAD_URI: &str = "https://cdn.example/output";

impl ConversionService for MockConversion {
    async fn create_asset(&self, media_type: &str) -> Result<AssetUpload> {
        record(&self.calls, ConversionCall::CreateAsset(media_type.to_string()));
        Ok(AssetUpload {
            upload_uri: "https://upload.example/asset-1".into(),
            asset_id: "asset-1".into(),
        })
    }

    async fn upload_asset(&self, _asset: &AssetUpload, file: FilePart) -> Result<()> {
        record(
            &self.calls,
            ConversionCall::UploadAsset {
                name: file.name,
                mime_type: file.mime_type,
            },
        );
        Ok(())
    }

    async fn start_export(&self, asset_id: &str, format: ExportFormat) -> Result<String> {
        record(
            &self.calls,
            ConversionCall::StartExport {
                asset_id: asset_id.to_string(),
                format,
            },
        );
        Ok("https://status.example/job-1".into())
    }

    async fn poll_export(&self, location: &str) -> Result<ExportStatus> {
        record(&self.calls, ConversionCall::Poll(location.to_string()));
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        if seen < self.pending_polls {
            return Ok(ExportStatus::InProgress);
        }
        Ok(match &self.failure {
            Some(message) => ExportStatus::Failed {
                message: message.clone(),
            },
            None => ExportStatus::Done {
                download_uri: MOCK_DOWNLOAD_URI.into(),
            },
        })
    }

    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        record(&self.calls, ConversionCall::Download(uri.to_string()));
        Ok(b"converted".to_vec())
    }
}
