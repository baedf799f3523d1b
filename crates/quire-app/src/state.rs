// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-tool session state.
//
// One `ToolSession` owns the working set of the tool being used, the stage
// it is on, the progress of the current remote run and the one pending
// result.  Its methods are the only way to change any of that.

use quire_core::error::{QuireError, Result};
use quire_core::human_errors::{Notification, humanize_error, humanize_rejection};
use quire_core::tools::{Plan, ToolId, ToolRules};
use quire_core::types::{
    CandidateFile, FileId, OrchestrationState, ResultDescriptor, Rotation, ToolStage,
};
use quire_document::WorkingSet;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ToolSession {
    tool: ToolId,
    plan: Plan,
    stage: ToolStage,
    working_set: WorkingSet,
    orchestration: OrchestrationState,
    /// At most one result awaits download.
    result: Option<ResultDescriptor>,
    notifications: Vec<Notification>,
}

#[allow(dead_code)]
impl ToolSession {
    pub fn new(tool: ToolId, plan: Plan) -> Self {
        Self {
            tool,
            plan,
            stage: ToolStage::Upload,
            working_set: WorkingSet::new(),
            orchestration: OrchestrationState::Idle,
            result: None,
            notifications: Vec::new(),
        }
    }

    // -- Inspection -----------------------------------------------------------

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn stage(&self) -> ToolStage {
        self.stage
    }

    pub fn rules(&self) -> ToolRules {
        self.tool.rules(self.plan)
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn orchestration(&self) -> OrchestrationState {
        self.orchestration
    }

    pub fn result(&self) -> Option<&ResultDescriptor> {
        self.result.as_ref()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hand over pending notifications, leaving none behind.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    // -- Working set ----------------------------------------------------------

    /// Offer files to the tool.  Returns whether they were admitted; a
    /// rejected batch leaves the working set as it was and queues a
    /// notification.
    pub fn add_files(&mut self, candidates: Vec<CandidateFile>) -> bool {
        let rules = self.rules();
        let outcome = self.working_set.admit(candidates, &rules);
        match outcome.rejection() {
            Some(rejection) => {
                self.notify(humanize_rejection(rejection));
                false
            }
            None => {
                if self.stage == ToolStage::Upload {
                    self.stage = ToolStage::Preview;
                }
                true
            }
        }
    }

    pub fn rotate(&mut self, id: FileId, quarter_turns: i32) -> Result<Rotation> {
        self.working_set.rotate(id, quarter_turns)
    }

    pub fn rotate_all(&mut self, quarter_turns: i32) {
        self.working_set.rotate_all(quarter_turns);
    }

    pub fn move_file(&mut self, from: usize, to: usize) -> Result<()> {
        self.working_set.move_file(from, to)
    }

    pub fn remove(&mut self, id: FileId) -> Result<()> {
        self.working_set.remove(id)?;
        if self.working_set.is_empty() {
            self.stage = ToolStage::Upload;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.working_set.clear();
        self.stage = ToolStage::Upload;
    }

    /// Back to an empty upload screen, dropping files and any result.
    pub fn start_over(&mut self) {
        self.clear();
        self.result = None;
        self.orchestration = OrchestrationState::Idle;
        debug!(tool = %self.tool, "session reset");
    }

    // -- Processing -----------------------------------------------------------

    /// Enter the processing stage.  Any previous result is discarded.
    pub fn begin_processing(&mut self) -> Result<()> {
        if self.working_set.is_empty() {
            return Err(QuireError::NoFiles);
        }
        if self.stage == ToolStage::Processing {
            return Err(QuireError::Preflight("This tool is already running.".into()));
        }
        self.stage = ToolStage::Processing;
        self.orchestration = OrchestrationState::Idle;
        self.result = None;
        Ok(())
    }

    /// Split borrows for a run: the orchestrator mutates the working set
    /// while reporting progress into the session.
    pub fn run_parts(&mut self) -> (&mut WorkingSet, &mut OrchestrationState) {
        (&mut self.working_set, &mut self.orchestration)
    }

    /// Hand the finished run's descriptor to the download step.
    pub fn store_result(&mut self, descriptor: ResultDescriptor) {
        info!(tool = %self.tool, output = descriptor.filename(), "result ready");
        self.result = Some(descriptor);
        self.orchestration = OrchestrationState::Done;
        self.stage = ToolStage::Download;
    }

    /// Record a failed run: back to the preview with one notification.
    pub fn fail(&mut self, err: &QuireError) {
        self.notify(humanize_error(err));
        self.orchestration = OrchestrationState::Idle;
        self.stage = if self.working_set.is_empty() {
            ToolStage::Upload
        } else {
            ToolStage::Preview
        };
    }
}

#[cfg(test)]
mod tests {
    use quire_core::human_errors::Severity;
    use quire_core::types::{ProcessResult, TaskHandle};
    use quire_document::pdf::inspect::sample_pdf;

    use super::*;

    fn pdf(name: &str) -> CandidateFile {
        CandidateFile::new(name, "application/pdf", sample_pdf(1))
    }

    fn previewing(tool: ToolId, names: &[&str]) -> ToolSession {
        let mut session = ToolSession::new(tool, Plan::Free);
        assert!(session.add_files(names.iter().map(|n| pdf(n)).collect()));
        session
    }

    #[test]
    fn admission_moves_to_preview() {
        let session = previewing(ToolId::Merge, &["a.pdf", "b.pdf"]);
        assert_eq!(session.stage(), ToolStage::Preview);
        assert_eq!(session.working_set().len(), 2);
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn rejection_notifies_and_keeps_files() {
        let mut session = previewing(ToolId::Merge, &["a.pdf", "b.pdf"]);
        // Free merge takes three files.
        assert!(!session.add_files(vec![pdf("c.pdf"), pdf("d.pdf")]));
        assert_eq!(session.working_set().len(), 2);
        assert_eq!(session.stage(), ToolStage::Preview);

        let notes = session.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::UpgradeRequired);
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn removing_last_file_returns_to_upload() {
        let mut session = previewing(ToolId::Compress, &["a.pdf"]);
        let id = session.working_set().files()[0].id;
        session.remove(id).unwrap();
        assert_eq!(session.stage(), ToolStage::Upload);
    }

    #[test]
    fn processing_needs_files() {
        let mut session = ToolSession::new(ToolId::Compress, Plan::Free);
        assert!(matches!(session.begin_processing(), Err(QuireError::NoFiles)));
    }

    #[test]
    fn result_handoff() {
        let mut session = previewing(ToolId::Compress, &["a.pdf"]);
        session.begin_processing().unwrap();
        assert_eq!(session.stage(), ToolStage::Processing);
        assert!(session.begin_processing().is_err());

        session.store_result(ResultDescriptor::Task {
            handle: TaskHandle {
                task: "t".into(),
                server: "s".into(),
            },
            result: ProcessResult {
                download_filename: "compressed.pdf".into(),
                filesize: 10,
                output_filesize: 4,
                output_filenumber: 1,
                status: "TaskSuccess".into(),
            },
        });
        assert_eq!(session.stage(), ToolStage::Download);
        assert_eq!(session.orchestration(), OrchestrationState::Done);
        assert_eq!(session.result().unwrap().filename(), "compressed.pdf");

        // Running again drops the old result.
        session.begin_processing().unwrap();
        assert!(session.result().is_none());
    }

    #[test]
    fn failure_returns_to_preview() {
        let mut session = previewing(ToolId::Compress, &["a.pdf"]);
        session.begin_processing().unwrap();
        *session.run_parts().1 = OrchestrationState::Uploading;

        session.fail(&QuireError::Upload {
            file: "a.pdf".into(),
            detail: "reset".into(),
        });
        assert_eq!(session.stage(), ToolStage::Preview);
        assert_eq!(session.orchestration(), OrchestrationState::Idle);
        assert_eq!(session.notifications().len(), 1);
    }

    #[test]
    fn start_over_clears_everything() {
        let mut session = previewing(ToolId::Merge, &["a.pdf", "b.pdf"]);
        session.store_result(ResultDescriptor::Processed {
            filename: "merged.pdf".into(),
        });
        session.start_over();
        assert_eq!(session.stage(), ToolStage::Upload);
        assert!(session.working_set().is_empty());
        assert!(session.result().is_none());
        assert_eq!(session.orchestration(), OrchestrationState::Idle);
    }
}
