// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Client for the PDF Services conversion API.
//
// Flow: exchange client credentials for an access token, create an asset,
// PUT the bytes to its pre-signed upload URI, start an export job and poll
// the status location until the output is hosted.

use std::time::{Duration, Instant};

use quire_core::config::AdobeConfig;
use quire_core::error::{QuireError, Result};
use quire_core::tools::ExportFormat;
use reqwest::RequestBuilder;
use reqwest::header::LOCATION;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::envelope::{AssetResponse, ExportStatusResponse, TokenResponse};
use crate::http::{build_client, check_status, read_bytes, read_json, transport_error};
use crate::service::{AssetUpload, ConversionService, ExportStatus, FilePart};

/// Refresh this long before the server-side expiry.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct AdobeClient {
    config: AdobeConfig,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl AdobeClient {
    pub fn new(config: AdobeConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            config: AdobeConfig {
                api_url: config.api_url.trim_end_matches('/').to_string(),
                ..config
            },
            client: build_client(timeout)?,
            token: Mutex::new(None),
        })
    }

    /// A valid access token, exchanging credentials when the cache is empty
    /// or about to expire.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        if self.config.client_id.is_empty() || self.config.client_secret.is_empty() {
            return Err(QuireError::Config(
                "conversion service credentials are not configured".into(),
            ));
        }

        let url = &self.config.ims_url;
        let response = self
            .client
            .post(url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let token: TokenResponse = read_json(check_status(response).await?).await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        debug!(expires_in = token.expires_in, "access token obtained");
        let value = token.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(builder
            .bearer_auth(token)
            .header("X-API-Key", &self.config.client_id))
    }
}

impl ConversionService for AdobeClient {
    #[instrument(skip(self))]
    async fn create_asset(&self, media_type: &str) -> Result<AssetUpload> {
        let url = format!("{}/assets", self.config.api_url);
        let request = self
            .authorized(self.client.post(&url))
            .await?
            .json(&json!({ "mediaType": media_type }));
        let response = request.send().await.map_err(|e| transport_error(&url, e))?;
        let asset: AssetResponse = read_json(check_status(response).await?).await?;
        debug!(asset_id = %asset.asset_id, "asset created");
        Ok(asset.into())
    }

    #[instrument(skip_all, fields(asset_id = %asset.asset_id, bytes = file.data.len()))]
    async fn upload_asset(&self, asset: &AssetUpload, file: FilePart) -> Result<()> {
        let url = &asset.upload_uri;
        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, file.mime_type.as_str())
            .body(file.data.to_vec())
            .send()
            .await
            .map_err(|e| QuireError::Upload {
                file: file.name.clone(),
                detail: transport_error(url, e).to_string(),
            })?;
        check_status(response)
            .await
            .map_err(|e| QuireError::Upload {
                file: file.name.clone(),
                detail: e.to_string(),
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn start_export(&self, asset_id: &str, format: ExportFormat) -> Result<String> {
        let url = format!("{}/operation/exportpdf", self.config.api_url);
        let request = self.authorized(self.client.post(&url)).await?.json(&json!({
            "assetID": asset_id,
            "targetFormat": format.target_format(),
        }));
        let response = request.send().await.map_err(|e| transport_error(&url, e))?;
        let response = check_status(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                QuireError::MalformedResponse("export started without a status location".into())
            })?;
        info!(%location, "export started");
        Ok(location)
    }

    #[instrument(skip(self))]
    async fn poll_export(&self, location: &str) -> Result<ExportStatus> {
        let request = self.authorized(self.client.get(location)).await?;
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(location, e))?;
        let status: ExportStatusResponse = read_json(check_status(response).await?).await?;
        status.into_status()
    }

    #[instrument(skip(self))]
    async fn download(&self, uri: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .map_err(|e| transport_error(uri, e))?;
        read_bytes(check_status(response).await?).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post, put};
    use axum::{Json, Router};
    use serde_json::Value;

    use super::*;
    use crate::test_server::serve;

    fn config(base: &str) -> AdobeConfig {
        AdobeConfig {
            ims_url: format!("{base}/token"),
            api_url: base.to_string(),
            client_id: "client".into(),
            client_secret: "secret".into(),
        }
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer tok-1")
            && headers.get("x-api-key").and_then(|v| v.to_str().ok()) == Some("client")
    }

    type BaseSlot = Arc<std::sync::Mutex<String>>;

    fn base_of(slot: &BaseSlot) -> String {
        slot.lock().unwrap().clone()
    }

    /// Token, asset, upload, export and status routes; the status route
    /// reports "in progress" once before finishing.
    fn conversion_router(base_slot: BaseSlot, token_calls: Arc<AtomicU32>) -> Router {
        let status_calls = Arc::new(AtomicU32::new(0));
        let asset_base = Arc::clone(&base_slot);
        let export_base = Arc::clone(&base_slot);
        let status_base = base_slot;

        Router::new()
            .route(
                "/token",
                post(move || {
                    let token_calls = Arc::clone(&token_calls);
                    async move {
                        token_calls.fetch_add(1, Ordering::SeqCst);
                        Json(json!({ "access_token": "tok-1", "expires_in": 86399 }))
                    }
                }),
            )
            .route(
                "/assets",
                post(move |headers: HeaderMap, Json(body): Json<Value>| {
                    let base = base_of(&asset_base);
                    async move {
                        if !authorized(&headers) || body["mediaType"] != "application/pdf" {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        let upload_uri = format!("{base}/upload/a-1");
                        Json(json!({ "uploadUri": upload_uri, "assetID": "a-1" })).into_response()
                    }
                }),
            )
            .route(
                "/upload/a-1",
                put(|headers: HeaderMap, body: axum::body::Bytes| async move {
                    let content_type = headers.get("content-type").and_then(|v| v.to_str().ok());
                    if content_type == Some("application/pdf") && body.starts_with(b"%PDF") {
                        StatusCode::OK
                    } else {
                        StatusCode::BAD_REQUEST
                    }
                }),
            )
            .route(
                "/operation/exportpdf",
                post(move |headers: HeaderMap, Json(body): Json<Value>| {
                    let base = base_of(&export_base);
                    async move {
                        let expected = body["assetID"] == "a-1" && body["targetFormat"] == "docx";
                        if !authorized(&headers) || !expected {
                            return StatusCode::BAD_REQUEST.into_response();
                        }
                        let location = format!("{base}/status/j-1");
                        (StatusCode::CREATED, [("location", location)]).into_response()
                    }
                }),
            )
            .route(
                "/status/j-1",
                get(move || {
                    let status_calls = Arc::clone(&status_calls);
                    let base = base_of(&status_base);
                    async move {
                        if status_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            return Json(json!({ "status": "in progress" }));
                        }
                        let download_uri = format!("{base}/out/a-2");
                        Json(json!({ "status": "done", "asset": { "downloadUri": download_uri } }))
                    }
                }),
            )
            .route("/out/a-2", get(|| async { "docx bytes" }))
    }

    async fn start() -> (AdobeClient, Arc<AtomicU32>) {
        let base_slot: BaseSlot = Arc::default();
        let token_calls = Arc::new(AtomicU32::new(0));
        let router = conversion_router(Arc::clone(&base_slot), Arc::clone(&token_calls));
        let base = serve(router).await;
        *base_slot.lock().unwrap() = base.clone();
        let client = AdobeClient::new(config(&base), Duration::from_secs(5)).unwrap();
        (client, token_calls)
    }

    #[tokio::test]
    async fn full_export_round() {
        let (client, token_calls) = start().await;

        let asset = client.create_asset("application/pdf").await.unwrap();
        assert_eq!(asset.asset_id, "a-1");

        let file = FilePart {
            name: "report.pdf".into(),
            mime_type: "application/pdf".into(),
            data: Arc::from(&b"%PDF-1.7"[..]),
        };
        client.upload_asset(&asset, file).await.unwrap();

        let location = client.start_export(&asset.asset_id, ExportFormat::Docx).await.unwrap();
        assert!(location.ends_with("/status/j-1"));

        assert_eq!(client.poll_export(&location).await.unwrap(), ExportStatus::InProgress);
        let status = client.poll_export(&location).await.unwrap();
        let ExportStatus::Done { download_uri } = status else {
            panic!("export should be done on the second check, got {status:?}");
        };
        assert_eq!(client.download(&download_uri).await.unwrap(), b"docx bytes");

        // One exchange serves every authorized call.
        assert_eq!(token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_credentials_are_a_config_error() {
        let client = AdobeClient::new(
            AdobeConfig {
                client_id: String::new(),
                ..config("http://127.0.0.1:9")
            },
            Duration::from_secs(1),
        )
        .unwrap();
        let err = client.create_asset("application/pdf").await.unwrap_err();
        assert!(matches!(err, QuireError::Config(_)));
    }
}
