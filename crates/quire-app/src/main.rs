// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire: PDF tools on the command line.
//
// Entry point. Initialises logging and services, then runs one tool session:
// admit the files, process them remotely, save the result.

mod cli;
mod services;
mod state;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use quire_core::error::Result;
use quire_core::human_errors::{Notification, humanize_error};

use cli::{Cli, read_candidate};
use services::app_services::AppServices;
use services::data_dir;
use state::ToolSession;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("Quire starting");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "quire failed");
            print_notification(&humanize_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let services = AppServices::init()?;
    let request = cli.tool.into_request()?;
    let mut session = services.new_session(request.tool, cli.plan);

    let candidates = request
        .files
        .iter()
        .map(|path| read_candidate(path))
        .collect::<Result<Vec<_>>>()?;
    if !session.add_files(candidates) {
        return Ok(report_failure(&mut session));
    }
    if cli.turns != 0 {
        session.rotate_all(cli.turns);
    }

    let workflows = services.workflows();
    if !workflows.process(&mut session, &request.params).await {
        return Ok(report_failure(&mut session));
    }

    let (filename, bytes) = match workflows.download(&session).await {
        Ok(output) => output,
        Err(e) => {
            session.notify(humanize_error(&e));
            return Ok(report_failure(&mut session));
        }
    };

    let out_dir = cli.out.unwrap_or_else(|| data_dir::data_subdir("downloads"));
    let path = save_output(&out_dir, &filename, &bytes)?;
    println!("{}", path.display());
    Ok(ExitCode::SUCCESS)
}

/// Write `bytes` under `dir`, keeping only the final component of the
/// server-supplied name.
fn save_output(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "result saved");
    Ok(path)
}

fn report_failure(session: &mut ToolSession) -> ExitCode {
    for notification in session.take_notifications() {
        print_notification(&notification);
    }
    ExitCode::FAILURE
}

fn print_notification(notification: &Notification) {
    eprintln!("{}", notification.message);
    if !notification.suggestion.is_empty() {
        eprintln!("  {}", notification.suggestion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_cannot_escape_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_output(dir.path(), "../../etc/merged.pdf", b"%PDF").unwrap();
        assert_eq!(path, dir.path().join("merged.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
    }

    #[test]
    fn output_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("today");
        let path = save_output(&nested, "compressed.pdf", b"x").unwrap();
        assert!(path.starts_with(&nested));
    }
}
