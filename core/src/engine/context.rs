//! Injected evaluation context.
//!
//! The engine holds no global state about its environment; every round
//! receives a fresh snapshot built by the embedding host from its
//! context providers.

use chrono::NaiveDateTime;

use stagehand_types::OsKind;

/// One open document, as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentView {
    pub url: String,
}

impl DocumentView {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Snapshot of the external context for one evaluation round.
#[derive(Debug, Clone)]
pub struct EvalContext {
    /// The active document, if any
    pub current_document: Option<DocumentView>,

    /// All open documents, including the active one
    pub open_documents: Vec<DocumentView>,

    /// The user-selected scene, if any
    pub active_scene: Option<String>,

    /// Host operating system kind
    pub os: OsKind,

    /// Wall-clock time the snapshot was taken
    pub now: NaiveDateTime,
}

impl EvalContext {
    /// Empty context on the host OS at the current wall-clock time.
    pub fn new() -> Self {
        Self {
            current_document: None,
            open_documents: Vec::new(),
            active_scene: None,
            os: OsKind::current(),
            now: chrono::Local::now().naive_local(),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary to the host's context providers: builds one snapshot per
/// round, after event coalescing has settled.
pub trait ContextProvider {
    fn snapshot(&self) -> EvalContext;
}
