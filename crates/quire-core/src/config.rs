// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Defaults are overlaid by `config.json` in the data directory and then by
// `QUIRE_*` environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QuireError, Result};
use crate::tools::Plan;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Plan whose limits the validation gate enforces.
    pub plan: Plan,
    /// Base URL of the custom processing backend.
    pub backend_url: String,
    /// Base URL of the task API routes (start/upload/process/download).
    pub task_api_url: String,
    pub adobe: AdobeConfig,
    /// Per-request timeout for every HTTP client.
    pub http_timeout_secs: u64,
    pub polling: PollingConfig,
}

/// Credentials and endpoints for the PDF conversion service.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdobeConfig {
    /// Token exchange endpoint.
    pub ims_url: String,
    /// PDF Services API base.
    pub api_url: String,
    pub client_id: String,
    pub client_secret: String,
}

// Hand-written so the secret never reaches a log line.
impl std::fmt::Debug for AdobeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdobeConfig")
            .field("ims_url", &self.ims_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Status polling budget for the conversion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
    /// When set, delays double from `delay_ms` up to this cap instead of
    /// staying fixed.
    pub max_delay_ms: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            plan: Plan::Free,
            backend_url: "http://localhost:8000/api".into(),
            task_api_url: "http://localhost:3000/api/ilovepdf".into(),
            adobe: AdobeConfig::default(),
            http_timeout_secs: 120,
            polling: PollingConfig::default(),
        }
    }
}

impl Default for AdobeConfig {
    fn default() -> Self {
        Self {
            ims_url: "https://pdf-services.adobe.io/token".into(),
            api_url: "https://pdf-services.adobe.io".into(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            delay_ms: 2_000,
            max_delay_ms: None,
        }
    }
}

impl PollingConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay_ms.map(Duration::from_millis)
    }
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Apply `QUIRE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(plan) = lookup("QUIRE_PLAN") {
            self.plan = plan.parse()?;
        }
        if let Some(url) = lookup("QUIRE_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(url) = lookup("QUIRE_TASK_API_URL") {
            self.task_api_url = url;
        }
        if let Some(url) = lookup("QUIRE_ADOBE_IMS_URL") {
            self.adobe.ims_url = url;
        }
        if let Some(url) = lookup("QUIRE_ADOBE_API_URL") {
            self.adobe.api_url = url;
        }
        if let Some(id) = lookup("QUIRE_ADOBE_CLIENT_ID") {
            self.adobe.client_id = id;
        }
        if let Some(secret) = lookup("QUIRE_ADOBE_CLIENT_SECRET") {
            self.adobe.client_secret = secret;
        }
        if let Some(secs) = lookup("QUIRE_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = secs.trim().parse().map_err(|_| {
                QuireError::Config(format!("QUIRE_HTTP_TIMEOUT_SECS is not a number: '{secs}'"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn overrides_replace_defaults() {
        let env: HashMap<&str, &str> = [
            ("QUIRE_PLAN", "premium"),
            ("QUIRE_BACKEND_URL", "https://backend.example/api"),
            ("QUIRE_ADOBE_CLIENT_SECRET", "s3cret"),
            ("QUIRE_HTTP_TIMEOUT_SECS", "15"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.plan, Plan::Premium);
        assert_eq!(config.backend_url, "https://backend.example/api");
        assert_eq!(config.adobe.client_secret, "s3cret");
        assert_eq!(config.http_timeout(), Duration::from_secs(15));
        // Untouched keys keep their defaults.
        assert_eq!(config.task_api_url, AppConfig::default().task_api_url);
    }

    #[test]
    fn bad_timeout_is_a_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|k| (k == "QUIRE_HTTP_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, QuireError::Config(_)));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"plan":"premium"}"#).unwrap();
        assert_eq!(config.plan, Plan::Premium);
        assert_eq!(config.polling.max_attempts, 30);
        assert!(config.polling.max_delay().is_none());

        let config: AppConfig =
            serde_json::from_str(r#"{"polling":{"max_delay_ms":8000}}"#).unwrap();
        assert_eq!(config.polling.delay_ms, 2_000);
        assert_eq!(config.polling.max_delay(), Some(Duration::from_secs(8)));
    }

    #[test]
    fn debug_redacts_secret() {
        let mut config = AppConfig::default();
        config.adobe.client_secret = "hunter2".into();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
