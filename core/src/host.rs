//! Extension directory service boundary.
//!
//! The engine talks to the platform exclusively through [`ExtensionHost`];
//! calls may block on host I/O and are awaited per execution batch. The
//! engine never retries a failed call — retry policy, if any, belongs on
//! the host side of this boundary.

use std::future::Future;

use thiserror::Error;

/// One installed extension as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

/// Errors surfaced by the host boundary.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("extension not found: {0}")]
    NotFound(String),

    #[error("host call failed: {0}")]
    Unavailable(String),
}

/// Async boundary to the platform's extension directory.
pub trait ExtensionHost {
    /// List all installed extensions with their enabled flag.
    fn list_extensions(&self) -> impl Future<Output = Result<Vec<ExtensionInfo>, HostError>> + Send;

    /// Enable or disable one extension by id.
    fn set_enabled(
        &self,
        id: &str,
        enabled: bool,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Reload the active document after a state change.
    fn reload_active_document(&self) -> impl Future<Output = Result<(), HostError>> + Send;
}
