//! Error types for the dialogue engine.

use std::path::PathBuf;

use sb_core::CoreError;
use thiserror::Error;

/// Result type for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;

/// Errors that can occur while loading content or driving a conversation.
///
/// Everything here is a content or programmer defect. Degraded content that
/// the engine can work around is reported as a
/// [`Diagnostic`](crate::diagnostic::Diagnostic) instead.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// A tree with this id is already registered.
    #[error("dialogue tree already registered: \"{0}\"")]
    DuplicateTree(String),

    /// No tree with this id is registered.
    #[error("dialogue tree not found: \"{id}\"{}", did_you_mean(.suggestion))]
    UnknownTree {
        /// The requested id.
        id: String,
        /// The closest registered id, if any is close.
        suggestion: Option<String>,
    },

    /// The node does not exist in the conversation's tree.
    #[error("node not found in tree \"{tree}\": \"{node}\"")]
    UnknownNode {
        /// The tree being walked.
        tree: String,
        /// The requested node id.
        node: String,
    },

    /// The choice index is outside the list of available choices.
    #[error("invalid choice {index} at node \"{node}\": {available} available")]
    ChoiceOutOfRange {
        /// The node currently displayed.
        node: String,
        /// The requested index.
        index: usize,
        /// How many choices are available.
        available: usize,
    },

    /// A choice was made while no node is displayed.
    #[error("no node is displayed; enter a node before choosing")]
    NoNodeDisplayed,

    /// The conversation is over.
    #[error("the conversation has ended")]
    ConversationEnded,

    /// A tree failed structural checks.
    #[error(transparent)]
    Content(#[from] CoreError),

    /// Content could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Content is not valid JSON for the expected shape.
    #[error("invalid JSON in {origin}: {source}")]
    Json {
        /// File name or other label for the input.
        origin: String,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The engine configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean \"{s}\"?)"),
        None => String::new(),
    }
}
