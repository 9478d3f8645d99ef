//! Typed errors for the harvesting pipeline.
//!
//! Library code returns these `thiserror` enums; the binary wraps them in
//! `anyhow` at the CLI boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Bad input detected before any browser session exists.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid year `{0}`: expected a four-digit year")]
    InvalidYear(String),

    #[error("invalid year range `{spec}`: start {start} is after end {end}")]
    InvertedRange { spec: String, start: u16, end: u16 },

    #[error("batch file not found: {}", .0.display())]
    BatchFileMissing(PathBuf),

    #[error("failed to read batch file {}: {source}", path.display())]
    BatchFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("batch file contains no scholar ids: {}", .0.display())]
    BatchFileEmpty(PathBuf),
}

/// Failures reported by a rendered-page session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// A wait or page operation ran out of time.
    #[error("timed out: {0}")]
    Timeout(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The element behind a handle is gone from the document.
    #[error("stale element reference: {0}")]
    StaleElement(String),

    #[error("click intercepted: {0}")]
    ClickIntercepted(String),

    #[error("browser launch failed: {0}")]
    Launch(String),

    /// The browser or its connection went away mid-run.
    #[error("browser session closed")]
    SessionClosed,

    #[error("browser protocol error: {0}")]
    Protocol(String),
}

impl RenderError {
    /// Errors after which the session cannot serve any further page.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionClosed | Self::Launch(_))
    }
}

/// Failures while persisting the citation table or listing snapshots.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write workbook {}: {source}", path.display())]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("failed to write csv {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("could not acquire a browser session: {0}")]
    SessionAcquire(#[source] RenderError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_classification() {
        assert!(!RenderError::Timeout("#gsc_bpf_more".into()).is_session_fatal());
        assert!(!RenderError::StaleElement("node".into()).is_session_fatal());
        assert!(RenderError::SessionClosed.is_session_fatal());
        assert!(RenderError::Launch("no chrome".into()).is_session_fatal());
        assert!(!RenderError::Navigation {
            url: "https://example.com".into(),
            reason: "net::ERR_FAILED".into(),
        }
        .is_session_fatal());
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvertedRange {
            spec: "2023:2021".into(),
            start: 2023,
            end: 2021,
        };
        assert_eq!(
            err.to_string(),
            "invalid year range `2023:2021`: start 2023 is after end 2021"
        );
    }
}
