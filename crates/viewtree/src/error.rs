//! Error types for the view.tree toolkit.

use thiserror::Error;

pub use viewtree_ast::{GrammarError, Location, ParseError};

/// All errors that can occur in the view.tree toolkit.
#[derive(Error, Debug)]
pub enum ViewtreeError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("Load error: {message}")]
    Load { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ViewtreeError {
    pub(crate) fn load(message: impl Into<String>) -> Self {
        ViewtreeError::Load {
            message: message.into(),
        }
    }
}

/// Result type alias for view.tree operations.
pub type Result<T> = std::result::Result<T, ViewtreeError>;
