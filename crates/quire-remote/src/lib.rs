// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire remote: HTTP clients for the custom backend, the task-based PDF
// service and the conversion service, plus the orchestrator that drives a
// tool run through them.

pub mod adobe_client;
pub mod backend_client;
pub mod envelope;
mod http;
pub mod orchestrator;
pub mod params;
pub mod retry;
pub mod service;
pub mod task_client;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

#[cfg(test)]
mod test_server;

pub use adobe_client::AdobeClient;
pub use backend_client::BackendClient;
pub use orchestrator::RemoteTaskOrchestrator;
pub use retry::RetryPolicy;
pub use task_client::TaskClient;
