//! Failure kinds that abort a whole run
//!
//! Soft problems (missing include files, unknown macros) never surface here;
//! they are collected as diagnostics in the run context instead.

use std::path::PathBuf;

use crate::document::TextRange;

#[derive(Debug, thiserror::Error)]
pub enum TemplaterError {
    #[error("%INCLUDE% nested too deeply; maximal depth is {limit} (still unresolved: {pending})")]
    IncludeDepthExceeded { limit: usize, pending: String },

    #[error("property '{property}' of object '{object}' is {problem}")]
    PropertyAccess {
        object: String,
        property: String,
        problem: String,
    },

    #[error("{0}")]
    InvalidPaths(String),

    #[error("failed to load {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    #[error("text range {0:?} no longer exists in the document")]
    StaleRange(TextRange),
}
