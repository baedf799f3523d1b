// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool workflows: run a session's files through the orchestrator and hand
// the result over for download.
//
// This is the error boundary.  Whatever goes wrong during a run ends up as
// exactly one notification on the session, and the session goes back to its
// preview.

use quire_core::error::{QuireError, Result};
use quire_core::tools::ToolParams;
use quire_remote::RemoteTaskOrchestrator;
use quire_remote::service::{BackendService, ConversionService, TaskService};
use tracing::{debug, error, info, instrument};

use crate::state::ToolSession;

pub struct Workflows<B, T, C> {
    orchestrator: RemoteTaskOrchestrator<B, T, C>,
}

impl<B, T, C> Workflows<B, T, C>
where
    B: BackendService,
    T: TaskService,
    C: ConversionService,
{
    pub fn new(orchestrator: RemoteTaskOrchestrator<B, T, C>) -> Self {
        Self { orchestrator }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn orchestrator(&self) -> &RemoteTaskOrchestrator<B, T, C> {
        &self.orchestrator
    }

    /// Process the session's files with `params`.  Returns whether a result
    /// is ready; on failure the session carries a notification instead.
    #[instrument(skip_all, fields(tool = %session.tool()))]
    pub async fn process(&self, session: &mut ToolSession, params: &ToolParams) -> bool {
        if let Err(err) = session.begin_processing() {
            session.fail(&err);
            return false;
        }

        let tool = session.tool();
        let (files, progress) = session.run_parts();
        let outcome = self
            .orchestrator
            .run(tool, files, params, |state| {
                debug!(?state, "orchestration state");
                *progress = state;
            })
            .await;

        match outcome {
            Ok(descriptor) => {
                session.store_result(descriptor);
                true
            }
            Err(err) => {
                error!(%err, "tool run failed");
                session.fail(&err);
                false
            }
        }
    }

    /// Fetch the pending result: `(filename, bytes)`.
    #[instrument(skip_all, fields(tool = %session.tool()))]
    pub async fn download(&self, session: &ToolSession) -> Result<(String, Vec<u8>)> {
        let result = session.result().ok_or(QuireError::NoResult)?;
        let bytes = self.orchestrator.download(result).await?;
        info!(output = result.filename(), bytes = bytes.len(), "result downloaded");
        Ok((result.filename().to_string(), bytes))
    }
}
