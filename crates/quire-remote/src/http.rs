// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared reqwest plumbing: client construction, transport error mapping and
// status checks.

use std::time::Duration;

use quire_core::error::{QuireError, Result};
use reqwest::Response;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::envelope;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| QuireError::Config(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn transport_error(url: &str, err: reqwest::Error) -> QuireError {
    if err.is_timeout() {
        QuireError::Http(format!("request to {url} timed out"))
    } else if err.is_connect() {
        QuireError::Http(format!("could not connect to {url}"))
    } else {
        QuireError::Http(err.to_string())
    }
}

/// Turn a non-2xx response into `QuireError::Status`, keeping the server's
/// message when the body carries one.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = envelope::error_message(&body);
    warn!(status = status.as_u16(), message = message.as_deref().unwrap_or(""), "request rejected");
    Err(QuireError::Status {
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| QuireError::Http(e.to_string()))?;
    serde_json::from_str(&body).map_err(|e| QuireError::MalformedResponse(e.to_string()))
}

pub(crate) async fn read_bytes(response: Response) -> Result<Vec<u8>> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| QuireError::Http(e.to_string()))?;
    Ok(bytes.to_vec())
}
