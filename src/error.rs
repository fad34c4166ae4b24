//! Errors raised by the file and wire surfaces around the planner.
//!
//! Planning itself never fails; problems with the job show up as
//! [`crate::types::Warning`]s in the returned plan.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported settings file version {found}, expected {expected}")]
    UnsupportedSettingsVersion { found: u32, expected: u32 },
}
