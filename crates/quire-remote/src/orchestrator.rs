// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote task orchestration.
//
// Drives one tool run against whichever service the tool's shape names:
//
//   single call   pre-flight, one multipart request to the custom backend
//   task          initialize -> upload (all files concurrently) -> process
//   export        asset -> upload -> export -> bounded status polling
//
// Phases never overlap.  The first failure ends the run; nothing is retried
// and orphaned remote tasks are left to expire on the server.

use futures_util::future::try_join_all;
use quire_core::error::{QuireError, Result};
use quire_core::tools::{ExportFormat, ToolId, ToolParams, ToolShape};
use quire_core::types::{OrchestrationState, ProcessResult, ResultDescriptor, TaskHandle};
use quire_document::WorkingSet;
use quire_document::pages::{check_ranges, check_removal};
use tracing::{debug, info, instrument, warn};

use crate::params::{backend_fields, task_parameters};
use crate::retry::{Poll, RetryPolicy};
use crate::service::{
    BackendRequest, BackendService, ConversionService, ExportStatus, FileDescriptor, FilePart,
    ProcessRequest, TaskService,
};

pub struct RemoteTaskOrchestrator<B, T, C> {
    backend: B,
    tasks: T,
    conversion: C,
    polling: RetryPolicy,
}

impl<B, T, C> RemoteTaskOrchestrator<B, T, C>
where
    B: BackendService,
    T: TaskService,
    C: ConversionService,
{
    pub fn new(backend: B, tasks: T, conversion: C, polling: RetryPolicy) -> Self {
        Self {
            backend,
            tasks,
            conversion,
            polling,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tasks(&self) -> &T {
        &self.tasks
    }

    pub fn conversion(&self) -> &C {
        &self.conversion
    }

    /// Run `tool` over `files` and describe where its output can be fetched.
    ///
    /// `on_state` sees every orchestration state transition in order.
    #[instrument(skip_all, fields(tool = %tool, files = files.len()))]
    pub async fn run(
        &self,
        tool: ToolId,
        files: &mut WorkingSet,
        params: &ToolParams,
        mut on_state: impl FnMut(OrchestrationState),
    ) -> Result<ResultDescriptor> {
        params.ensure_for(tool)?;
        if files.is_empty() {
            return Err(QuireError::NoFiles);
        }

        let descriptor = match tool.shape() {
            ToolShape::SingleCall { .. } => ResultDescriptor::Processed {
                filename: self
                    .run_single_call(tool, files, params, &mut on_state)
                    .await?,
            },
            ToolShape::Task { .. } => {
                let (handle, result) = self.run_task(tool, files, params, &mut on_state).await?;
                ResultDescriptor::Task { handle, result }
            }
            ToolShape::Export { format } => {
                self.run_export(files, format, &mut on_state).await?
            }
        };

        on_state(OrchestrationState::Done);
        info!(output = descriptor.filename(), "tool run finished");
        Ok(descriptor)
    }

    /// One request to the custom backend; returns the processed filename.
    pub async fn run_single_call(
        &self,
        tool: ToolId,
        files: &mut WorkingSet,
        params: &ToolParams,
        on_state: &mut impl FnMut(OrchestrationState),
    ) -> Result<String> {
        let ToolShape::SingleCall { action } = tool.shape() else {
            return Err(shape_error(tool, "custom backend"));
        };

        preflight_single_call(files, params)?;

        let request = BackendRequest {
            action: action.to_string(),
            files: files.iter().map(FilePart::from).collect(),
            fields: backend_fields(params, files)?,
        };

        on_state(OrchestrationState::Processing);
        debug!(action, files = request.files.len(), "submitting to backend");
        self.backend.submit(request).await
    }

    /// Initialize, upload and process on the task service.
    ///
    /// Uploads run concurrently and the first failure aborts the run before
    /// the process phase; uploads already finished are not cleaned up.
    pub async fn run_task(
        &self,
        tool: ToolId,
        files: &mut WorkingSet,
        params: &ToolParams,
        on_state: &mut impl FnMut(OrchestrationState),
    ) -> Result<(TaskHandle, ProcessResult)> {
        let ToolShape::Task { tool: remote_tool } = tool.shape() else {
            return Err(shape_error(tool, "task service"));
        };

        if let ToolParams::Split { ranges, .. } = params {
            let ids: Vec<_> = files.iter().map(|f| f.id).collect();
            for id in ids {
                check_ranges(files.page_count(id)?, ranges)?;
            }
        }

        // Initialize
        on_state(OrchestrationState::Initializing);
        files.clear_server_filenames();
        let handle = self.tasks.start(remote_tool).await?;

        // Upload
        on_state(OrchestrationState::Uploading);
        let uploads = files.iter().map(|file| {
            let id = file.id;
            let part = FilePart::from(file);
            let handle = &handle;
            async move {
                let server_filename = self.tasks.upload(handle, part).await?;
                Ok::<_, QuireError>((id, server_filename))
            }
        });
        let uploaded = try_join_all(uploads).await.inspect_err(|err| {
            warn!(task = %handle.task, %err, "upload failed; task abandoned");
        })?;
        for (id, server_filename) in uploaded {
            files.set_server_filename(id, server_filename)?;
        }

        // Process
        on_state(OrchestrationState::Processing);
        let request = ProcessRequest {
            server: handle.server.clone(),
            task: handle.task.clone(),
            tool: remote_tool.to_string(),
            files: descriptors(tool, files)?,
            parameters: task_parameters(params),
        };
        let result = self.tasks.process(&request).await?;
        Ok((handle, result))
    }

    /// Convert the single file in `files` to an office format.
    pub async fn run_export(
        &self,
        files: &WorkingSet,
        format: ExportFormat,
        on_state: &mut impl FnMut(OrchestrationState),
    ) -> Result<ResultDescriptor> {
        let [file] = files.files() else {
            return Err(QuireError::WrongFileCount {
                expected: 1,
                actual: files.len(),
            });
        };

        let media_type = if file.mime_type.is_empty() {
            "application/pdf"
        } else {
            file.mime_type.as_str()
        };

        on_state(OrchestrationState::Initializing);
        let asset = self.conversion.create_asset(media_type).await?;

        // The upload must carry the media type the asset was declared with.
        on_state(OrchestrationState::Uploading);
        let part = FilePart {
            mime_type: media_type.to_string(),
            ..FilePart::from(file)
        };
        self.conversion.upload_asset(&asset, part).await?;

        on_state(OrchestrationState::Processing);
        let location = self.conversion.start_export(&asset.asset_id, format).await?;
        let download_uri = self
            .polling
            .poll(|_| async {
                let status = self.conversion.poll_export(&location).await?;
                Ok::<_, QuireError>(match status {
                    ExportStatus::InProgress => Poll::Pending,
                    ExportStatus::Done { download_uri } => Poll::Ready(download_uri),
                    ExportStatus::Failed { message } => return Err(QuireError::Remote(message)),
                })
            })
            .await?;

        Ok(ResultDescriptor::Hosted {
            download_uri,
            filename: export_filename(&file.name, format),
        })
    }

    /// Fetch the output a finished run described.
    #[instrument(skip_all, fields(output = result.filename()))]
    pub async fn download(&self, result: &ResultDescriptor) -> Result<Vec<u8>> {
        match result {
            ResultDescriptor::Processed { filename } => self.backend.download(filename).await,
            ResultDescriptor::Task { handle, .. } => self.tasks.download(handle).await,
            ResultDescriptor::Hosted { download_uri, .. } => {
                self.conversion.download(download_uri).await
            }
        }
    }
}

fn shape_error(tool: ToolId, service: &str) -> QuireError {
    QuireError::Config(format!("'{tool}' does not run on the {service}"))
}

fn preflight_single_call(files: &mut WorkingSet, params: &ToolParams) -> Result<()> {
    match params {
        ToolParams::Compare if files.len() != 2 => Err(QuireError::WrongFileCount {
            expected: 2,
            actual: files.len(),
        }),
        ToolParams::Merge if files.len() < 2 => Err(QuireError::Preflight(
            "Add at least two files to merge.".into(),
        )),
        ToolParams::RemovePages { ranges } => {
            let ids: Vec<_> = files.iter().map(|f| f.id).collect();
            for id in ids {
                check_removal(files.page_count(id)?, ranges)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Per-file entries of the process call, in working-set order.
fn descriptors(tool: ToolId, files: &WorkingSet) -> Result<Vec<FileDescriptor>> {
    files
        .iter()
        .map(|file| {
            let server_filename = file
                .server_filename
                .clone()
                .ok_or_else(|| QuireError::MissingServerFilename(file.name.clone()))?;
            Ok(FileDescriptor {
                server_filename,
                filename: format!("{}{}", tool.output_prefix(), file.name),
                rotate: file.rotation.degrees(),
            })
        })
        .collect()
}

/// `report.pdf` -> `converted_report.docx`.
fn export_filename(original: &str, format: ExportFormat) -> String {
    let stem = original
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(original);
    format!(
        "{}{stem}.{}",
        format.tool().output_prefix(),
        format.target_format()
    )
}
