// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client for the custom processing backend: one multipart POST per action.

use std::time::Duration;

use quire_core::error::{QuireError, Result};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info, instrument};

use crate::envelope::BackendEnvelope;
use crate::http::{build_client, check_status, read_bytes, read_json, transport_error};
use crate::service::{BackendRequest, BackendService, FilePart};

pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn file_part(file: &FilePart) -> Result<Part> {
    let part = Part::bytes(file.data.to_vec()).file_name(file.name.clone());
    if file.mime_type.is_empty() {
        return Ok(part);
    }
    part.mime_str(&file.mime_type)
        .map_err(|e| QuireError::Upload {
            file: file.name.clone(),
            detail: e.to_string(),
        })
}

impl BackendService for BackendClient {
    #[instrument(skip_all, fields(action = %request.action, files = request.files.len()))]
    async fn submit(&self, request: BackendRequest) -> Result<String> {
        let url = format!("{}/{}", self.base_url, request.action);

        let mut form = Form::new();
        for file in &request.files {
            form = form.part("files", file_part(file)?);
        }
        for (name, value) in request.fields {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let envelope: BackendEnvelope = read_json(check_status(response).await?).await?;
        let filename = envelope.into_filename()?;
        info!(%filename, "backend action finished");
        Ok(filename)
    }

    #[instrument(skip(self))]
    async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let url = format!("{}/download", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("file", filename)])
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;
        let bytes = read_bytes(check_status(response).await?).await?;
        debug!(bytes = bytes.len(), "result downloaded");
        Ok(bytes)
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
    use serde_json::json;

    use super::*;
    use crate::test_server::serve;

    #[derive(Default, Debug)]
    struct Seen {
        files: Vec<String>,
        fields: Vec<(String, String)>,
    }

    fn request(files: &[&str], fields: &[(&str, &str)]) -> BackendRequest {
        BackendRequest {
            action: "merge".into(),
            files: files
                .iter()
                .map(|n| FilePart {
                    name: n.to_string(),
                    mime_type: "application/pdf".into(),
                    data: Arc::from(&b"%PDF-1.4"[..]),
                })
                .collect(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn submit_sends_files_and_fields() {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let recorder = Arc::clone(&seen);
        let router = Router::new().route(
            "/merge",
            post(move |mut multipart: Multipart| {
                let recorder = Arc::clone(&recorder);
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        if name == "files" {
                            let file_name = field.file_name().unwrap_or_default().to_string();
                            recorder.lock().unwrap().files.push(file_name);
                        } else {
                            let value = field.text().await.unwrap();
                            recorder.lock().unwrap().fields.push((name, value));
                        }
                    }
                    Json(json!({ "success": true, "data": { "file": "merged123.pdf" } }))
                }
            }),
        );
        let base = serve(router).await;

        let client = BackendClient::new(&base, Duration::from_secs(5)).unwrap();
        let filename = client
            .submit(request(&["a.pdf", "b.pdf"], &[("data_dict", r#"{"a.pdf":0}"#)]))
            .await
            .unwrap();

        assert_eq!(filename, "merged123.pdf");
        let seen = seen.lock().unwrap();
        assert_eq!(seen.files, ["a.pdf", "b.pdf"]);
        assert_eq!(
            seen.fields,
            [("data_dict".to_string(), r#"{"a.pdf":0}"#.to_string())]
        );
    }

    #[tokio::test]
    async fn error_status_keeps_server_message() {
        let router = Router::new().route(
            "/merge",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "message": "Incorrect password" })),
                )
            }),
        );
        let base = serve(router).await;

        let client = BackendClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.submit(request(&["a.pdf"], &[])).await.unwrap_err();
        match err {
            QuireError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("Incorrect password"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unsuccessful_envelope_is_an_error() {
        let router = Router::new().route(
            "/merge",
            post(|| async { Json(json!({ "success": false })) }),
        );
        let base = serve(router).await;

        let client = BackendClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.submit(request(&["a.pdf"], &[])).await.unwrap_err();
        assert!(matches!(err, QuireError::Remote(_)));
    }

    #[tokio::test]
    async fn download_passes_filename() {
        let router = Router::new().route(
            "/download",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                format!("bytes of {}", q["file"])
            }),
        );
        let base = serve(router).await;

        let client = BackendClient::new(&base, Duration::from_secs(5)).unwrap();
        let bytes = client.download("merged123.pdf").await.unwrap();
        assert_eq!(bytes, b"bytes of merged123.pdf");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client =
            BackendClient::new("http://backend.test/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://backend.test/api");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.download("x.pdf").await.unwrap_err();
        assert!(matches!(err, QuireError::Http(_)));
    }
}
