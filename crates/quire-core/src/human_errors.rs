// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing notifications.
//
// Every technical error and every validation rejection is mapped to a plain
// English toast with a suggestion.  Four severity levels drive presentation;
// `UpgradeRequired` is the upgrade prompt shown when a plan limit is hit.

use crate::error::{QuireError, Rejection};

/// Severity of a notification from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or server hiccup; trying again may work.
    Transient,
    /// The user must change something (files, options, password).
    ActionRequired,
    /// Cannot be fixed by retrying or changing options.
    Permanent,
    /// The current plan's limits were hit.
    UpgradeRequired,
}

/// A toast shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether running the tool again unchanged may succeed.
    pub retriable: bool,
    pub severity: Severity,
}

/// Message used when the server gave no usable explanation.
pub const GENERIC_FAILURE: &str = "Something went wrong while processing your files.";

/// Convert a `QuireError` into a notification.
pub fn humanize_error(err: &QuireError) -> Notification {
    match err {
        QuireError::Http(detail) => humanize_transport(detail),

        QuireError::Status { status, message } => {
            let message = message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_FAILURE.into());
            if (500..600).contains(status) {
                Notification {
                    message,
                    suggestion: "The service is having trouble. Please try again in a moment."
                        .into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            } else if *status == 413 {
                Notification {
                    message,
                    suggestion:
                        "These files are too large for the service. Try fewer or smaller files."
                            .into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                Notification {
                    message,
                    suggestion: "Check your files and options, then try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            }
        }

        QuireError::MalformedResponse(_) => Notification {
            message: GENERIC_FAILURE.into(),
            suggestion: "The service sent an answer we didn't understand. Please try again."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::Remote(detail) => Notification {
            message: if detail.trim().is_empty() {
                GENERIC_FAILURE.into()
            } else {
                detail.clone()
            },
            suggestion: "Please start the tool again. If it keeps failing, try a different file."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::Upload { file, .. } => Notification {
            message: format!("We couldn't upload {file}."),
            suggestion: "Check your connection and start again. None of your files were processed."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::MissingServerFilename(file) => Notification {
            message: format!("{file} was not uploaded."),
            suggestion: "Please start again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::PollingExhausted { .. } => Notification {
            message: "The conversion is taking too long.".into(),
            suggestion: "The service is busy. Please try again in a few minutes.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        QuireError::NoResult => Notification {
            message: "There is nothing to download yet.".into(),
            suggestion: "Run the tool first, then download the result.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::InvalidPageRange(detail) => Notification {
            message: "Those page numbers don't look right.".into(),
            suggestion: format!("Use numbers and ranges like 1-3, 5. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::Preflight(detail) => Notification {
            message: detail.clone(),
            suggestion: "Change your selection and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::NoFiles => Notification {
            message: "No files selected.".into(),
            suggestion: "Add at least one file, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::WrongFileCount { expected, actual } => Notification {
            message: format!("This tool needs exactly {expected} files."),
            suggestion: format!("You have {actual}. Add or remove files, then try again."),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::ParamsMismatch { .. } => Notification {
            message: "These options don't belong to this tool.".into(),
            suggestion: "Reopen the tool and choose its options again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::Pdf(_) => Notification {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first, \
                         or use a different file."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::UnknownFile(_) => Notification {
            message: "That file is no longer in the list.".into(),
            suggestion: "Add it again if you still need it.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        QuireError::Config(detail) => Notification {
            message: "The app is not set up correctly.".into(),
            suggestion: format!("Check the service settings. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        QuireError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                Notification {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again."
                        .into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                Notification {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first."
                        .into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                Notification {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        QuireError::Serialization(_) => Notification {
            message: GENERIC_FAILURE.into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

/// Turn a transport error string into a notification.
fn humanize_transport(detail: &str) -> Notification {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        Notification {
            message: "The service didn't respond in time.".into(),
            suggestion: "It might be busy. Please try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else if lower.contains("connect") || lower.contains("dns") {
        Notification {
            message: "We couldn't reach the service.".into(),
            suggestion: "Check your internet connection, then try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    } else {
        Notification {
            message: GENERIC_FAILURE.into(),
            suggestion: "Please try again.".into(),
            retriable: true,
            severity: Severity::Transient,
        }
    }
}

/// Convert a validation rejection into a notification.  Each rejection
/// reason has its own wording.
pub fn humanize_rejection(rejection: &Rejection) -> Notification {
    match rejection {
        Rejection::InvalidType { names } => Notification {
            message: format!("This tool can't open {}.", join_names(names)),
            suggestion: "Choose files of a supported type and try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        Rejection::TooManyFiles { limit, attempted } => Notification {
            message: format!("You can add up to {limit} files here ({attempted} selected)."),
            suggestion: "Upgrade your plan to work with more files at once.".into(),
            retriable: false,
            severity: Severity::UpgradeRequired,
        },

        Rejection::TooLarge { total_mb, limit_mb } => Notification {
            message: format!(
                "Your files add up to {total_mb:.2} MB, over the {limit_mb:.2} MB limit."
            ),
            suggestion: "Upgrade your plan to work with larger files.".into(),
            retriable: false,
            severity: Severity::UpgradeRequired,
        },

        Rejection::NotPdf { names } => Notification {
            message: format!("{} is not a valid PDF.", join_names(names)),
            suggestion: "The file may be damaged or mislabelled. Try a different file.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        Rejection::NotProtected { names } => Notification {
            message: format!("{} is not password-protected.", join_names(names)),
            suggestion: "This tool only removes passwords. Choose a protected PDF.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        Rejection::Protected { names } => Notification {
            message: format!("{} is password-protected.", join_names(names)),
            suggestion: "Remove the password with the Unlock tool first, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => "this file".into(),
        [one] => one.clone(),
        _ => names.join(", "),
    }
}
