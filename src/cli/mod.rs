//! Offline operator commands.
//!
//! Everything here runs in-process against the library; nothing talks to a
//! running service.
//!
//! ```bash
//! safeplate-cli guard --caller user-7 --endpoint ai < recipe.json
//! safeplate-cli scan "<img src=x onerror=alert(1)>"
//! safeplate-cli sanitize "<b>Fold</b> gently"
//! safeplate-cli taxonomy --json
//! safeplate-cli config show
//! ```

pub mod config_cmd;
pub mod guard_cmd;
pub mod inspect_cmd;

use thiserror::Error;

pub use guard_cmd::{parse_guard_args, run_guard, GuardArgs};
pub use inspect_cmd::{run_sanitize, run_scan, run_taxonomy};

/// Exit code for a successful command or an accepted request.
pub const EXIT_OK: i32 = 0;
/// Exit code for a rejected request or a flagged input.
pub const EXIT_REJECTED: i32 = 1;
/// Exit code for bad arguments or unreadable input.
pub const EXIT_USAGE: i32 = 2;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("missing required option {0}")]
    MissingOption(&'static str),

    #[error("option {0} needs a value")]
    MissingValue(String),

    #[error("unknown option {0}")]
    UnknownOption(String),

    #[error("unknown endpoint class {0:?} (expected ai, write, feedback or standard)")]
    UnknownEndpoint(String),

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
