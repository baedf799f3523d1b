// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Composition root: loads configuration and builds the three HTTP clients
// behind the tool workflows.
//
// Configuration is layered: built-in defaults, then `config.json` in the
// data directory, then `QUIRE_*` environment variables.

use std::path::{Path, PathBuf};

use quire_core::AppConfig;
use quire_core::error::Result;
use quire_core::tools::{Plan, ToolId};
use quire_remote::{AdobeClient, BackendClient, RemoteTaskOrchestrator, RetryPolicy, TaskClient};
use tracing::{info, warn};

use super::data_dir;
use super::workflow::Workflows;
use crate::state::ToolSession;

pub type LiveWorkflows = Workflows<BackendClient, TaskClient, AdobeClient>;

const CONFIG_FILE: &str = "config.json";

pub struct AppServices {
    data_dir: PathBuf,
    config: AppConfig,
    workflows: LiveWorkflows,
}

#[allow(dead_code)]
impl AppServices {
    /// Initialise services from the default data directory.
    pub fn init() -> Result<Self> {
        Self::init_in(data_dir::data_dir())
    }

    /// Initialise services with `dir` as the data directory.
    pub fn init_in(dir: PathBuf) -> Result<Self> {
        info!(path = %dir.display(), "initialising app services");

        let mut config = load_config(&dir).unwrap_or_default();
        config.apply_env_overrides()?;
        let workflows = build_workflows(&config)?;

        info!(plan = ?config.plan, backend = %config.backend_url, "app services initialised");
        Ok(Self {
            data_dir: dir,
            config,
            workflows,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn workflows(&self) -> &LiveWorkflows {
        &self.workflows
    }

    /// Persist `config` and rebuild the clients from it.
    pub fn save_config(&mut self, config: AppConfig) -> Result<()> {
        persist_config(&self.data_dir, &config)?;
        self.workflows = build_workflows(&config)?;
        self.config = config;
        Ok(())
    }

    /// A fresh session for `tool`, limited by `plan` or the configured plan.
    pub fn new_session(&self, tool: ToolId, plan: Option<Plan>) -> ToolSession {
        ToolSession::new(tool, plan.unwrap_or(self.config.plan))
    }
}

fn build_workflows(config: &AppConfig) -> Result<LiveWorkflows> {
    let timeout = config.http_timeout();
    let orchestrator = RemoteTaskOrchestrator::new(
        BackendClient::new(&config.backend_url, timeout)?,
        TaskClient::new(&config.task_api_url, timeout)?,
        AdobeClient::new(config.adobe.clone(), timeout)?,
        RetryPolicy::from(&config.polling),
    );
    Ok(Workflows::new(orchestrator))
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(path = %path.display(), "ignoring unreadable config: {e}");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
