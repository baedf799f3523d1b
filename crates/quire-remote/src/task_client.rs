// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client for the task-based PDF service, reached through the local API
// routes: start, upload, process, download.

use std::time::Duration;

use quire_core::error::{QuireError, Result};
use quire_core::types::{ProcessResult, TaskHandle};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument};

use crate::envelope::{StartResponse, UploadResponse, parse_process_response};
use crate::http::{build_client, check_status, read_bytes, read_json, transport_error};
use crate::service::{FilePart, ProcessRequest, TaskService};

pub struct TaskClient {
    base_url: String,
    client: reqwest::Client,
}

impl TaskClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{route}", self.base_url)
    }
}

impl TaskService for TaskClient {
    #[instrument(skip(self))]
    async fn start(&self, tool: &str) -> Result<TaskHandle> {
        let url = self.url("start");
        let response = self
            .client
            .get(&url)
            .query(&[("tool", tool)])
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let started: StartResponse = read_json(check_status(response).await?).await?;
        info!(task = %started.task, server = %started.server, "task started");
        Ok(started.into())
    }

    #[instrument(skip_all, fields(file = %file.name, bytes = file.data.len()))]
    async fn upload(&self, handle: &TaskHandle, file: FilePart) -> Result<String> {
        let url = self.url("upload");
        let upload_error = |detail: String| QuireError::Upload {
            file: file.name.clone(),
            detail,
        };

        let mut part = Part::bytes(file.data.to_vec()).file_name(file.name.clone());
        if !file.mime_type.is_empty() {
            part = part
                .mime_str(&file.mime_type)
                .map_err(|e| upload_error(e.to_string()))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("task", handle.task.clone())
            .text("server", handle.server.clone());

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| upload_error(transport_error(&url, e).to_string()))?;
        let response = check_status(response)
            .await
            .map_err(|e| upload_error(e.to_string()))?;
        let uploaded: UploadResponse = read_json(response).await?;

        if uploaded.server_filename.trim().is_empty() {
            return Err(QuireError::MissingServerFilename(file.name));
        }
        debug!(server_filename = %uploaded.server_filename, "file uploaded");
        Ok(uploaded.server_filename)
    }

    #[instrument(skip_all, fields(tool = %request.tool, files = request.files.len()))]
    async fn process(&self, request: &ProcessRequest) -> Result<ProcessResult> {
        let url = self.url("process");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let body = check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| QuireError::Http(e.to_string()))?;
        let result = parse_process_response(&body)?;
        info!(
            output = %result.download_filename,
            files = result.output_filenumber,
            "task processed"
        );
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn download(&self, handle: &TaskHandle) -> Result<Vec<u8>> {
        let url = self.url("download");
        let response = self
            .client
            .post(&url)
            .json(handle)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        read_bytes(check_status(response).await?).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Query};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::service::FileDescriptor;
    use crate::test_server::serve;

    fn handle() -> TaskHandle {
        TaskHandle {
            task: "t-1".into(),
            server: "api8.example".into(),
        }
    }

    fn part(name: &str) -> FilePart {
        FilePart {
            name: name.into(),
            mime_type: "application/pdf".into(),
            data: Arc::from(&b"%PDF-1.7"[..]),
        }
    }

    async fn client_for(router: Router) -> TaskClient {
        TaskClient::new(&serve(router).await, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn start_returns_handle() {
        let client = client_for(Router::new().route(
            "/start",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                assert_eq!(q["tool"], "compress");
                Json(json!({ "task": "t-1", "server": "api8.example" }))
            }),
        ))
        .await;
        assert_eq!(client.start("compress").await.unwrap(), handle());
    }

    #[tokio::test]
    async fn upload_sends_task_and_server() {
        let seen = Arc::new(Mutex::new(Vec::<(String, String)>::new()));
        let recorder = Arc::clone(&seen);
        let client = client_for(Router::new().route(
            "/upload",
            post(move |mut multipart: Multipart| {
                let recorder = Arc::clone(&recorder);
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let value = match field.file_name() {
                            Some(file_name) => file_name.to_string(),
                            None => field.text().await.unwrap(),
                        };
                        recorder.lock().unwrap().push((name, value));
                    }
                    Json(json!({ "server_filename": "srv_a.pdf" }))
                }
            }),
        ))
        .await;

        let server_filename = client.upload(&handle(), part("a.pdf")).await.unwrap();
        assert_eq!(server_filename, "srv_a.pdf");

        let seen = seen.lock().unwrap();
        assert!(seen.contains(&("file".into(), "a.pdf".into())));
        assert!(seen.contains(&("task".into(), "t-1".into())));
        assert!(seen.contains(&("server".into(), "api8.example".into())));
    }

    #[tokio::test]
    async fn failed_upload_names_the_file() {
        let client = client_for(Router::new().route(
            "/upload",
            post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        ))
        .await;
        match client.upload(&handle(), part("b.pdf")).await.unwrap_err() {
            QuireError::Upload { file, .. } => assert_eq!(file, "b.pdf"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_server_filename_is_rejected() {
        let client = client_for(Router::new().route(
            "/upload",
            post(|| async { Json(json!({ "server_filename": "" })) }),
        ))
        .await;
        let err = client.upload(&handle(), part("a.pdf")).await.unwrap_err();
        assert!(matches!(err, QuireError::MissingServerFilename(name) if name == "a.pdf"));
    }

    #[tokio::test]
    async fn process_flattens_parameters() {
        let seen = Arc::new(Mutex::new(Value::Null));
        let recorder = Arc::clone(&seen);
        let client = client_for(Router::new().route(
            "/process",
            post(move |Json(body): Json<Value>| {
                let recorder = Arc::clone(&recorder);
                async move {
                    *recorder.lock().unwrap() = body;
                    Json(json!({
                        "download_filename": "compressed.pdf",
                        "filesize": 2048,
                        "output_filesize": 1024,
                        "output_filenumber": 1,
                        "status": "TaskSuccess"
                    }))
                }
            }),
        ))
        .await;

        let mut parameters = Map::new();
        parameters.insert("compression_level".into(), json!("extreme"));
        let request = ProcessRequest {
            server: "api8.example".into(),
            task: "t-1".into(),
            tool: "compress".into(),
            files: vec![FileDescriptor {
                server_filename: "srv_a.pdf".into(),
                filename: "compressed_a.pdf".into(),
                rotate: 90,
            }],
            parameters,
        };
        let result = client.process(&request).await.unwrap();
        assert_eq!(result.download_filename, "compressed.pdf");
        assert_eq!(result.output_filesize, 1024);

        let body = seen.lock().unwrap().clone();
        assert_eq!(body["compression_level"], "extreme");
        assert_eq!(body["tool"], "compress");
        assert_eq!(body["files"][0]["rotate"], 90);
        assert_eq!(body["files"][0]["filename"], "compressed_a.pdf");
    }

    #[tokio::test]
    async fn process_error_envelope_is_terminal() {
        let client = client_for(Router::new().route(
            "/process",
            post(|| async { Json(json!({ "error": { "message": "Damaged PDF" } })) }),
        ))
        .await;
        let request = ProcessRequest {
            server: "s".into(),
            task: "t".into(),
            tool: "compress".into(),
            files: Vec::new(),
            parameters: Map::new(),
        };
        let err = client.process(&request).await.unwrap_err();
        assert!(matches!(err, QuireError::Remote(m) if m == "Damaged PDF"));
    }

    #[tokio::test]
    async fn download_posts_handle() {
        let client = client_for(Router::new().route(
            "/download",
            post(|Json(body): Json<Value>| async move {
                format!("{}@{}", body["task"].as_str().unwrap(), body["server"].as_str().unwrap())
            }),
        ))
        .await;
        assert_eq!(client.download(&handle()).await.unwrap(), b"t-1@api8.example");
    }
}
