/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Content-integrity errors found in a single dialogue tree.
///
/// These are authoring defects. They are reported when a tree is
/// registered and never recovered from at runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A node is stored under a key that differs from its own id.
    #[error("tree \"{tree}\": node stored as \"{key}\" declares id \"{id}\"")]
    NodeKeyMismatch {
        /// The tree id.
        tree: String,
        /// The key the node is stored under.
        key: String,
        /// The id the node declares.
        id: String,
    },

    /// A choice points at a node that does not exist in the tree.
    #[error("tree \"{tree}\": choice {choice} of node \"{node}\" leads to missing node \"{target}\"")]
    DanglingNextNode {
        /// The tree id.
        tree: String,
        /// The node holding the choice.
        node: String,
        /// Index of the choice in the authored list.
        choice: usize,
        /// The missing node id.
        target: String,
    },

    /// An entry point names a node that does not exist in the tree.
    #[error("tree \"{tree}\": entry point {index} starts at missing node \"{target}\"")]
    DanglingEntryNode {
        /// The tree id.
        tree: String,
        /// Index of the entry point in the authored list.
        index: usize,
        /// The missing node id.
        target: String,
    },

    /// A condition or effect could not be understood. Only raised when
    /// content is checked strictly.
    #[error("tree \"{tree}\": unrecognized {what} \"{kind}\" at {location}: {reason}")]
    UnrecognizedContent {
        /// The tree id.
        tree: String,
        /// Either `"condition"` or `"effect"`.
        what: &'static str,
        /// The authored `type` string.
        kind: String,
        /// Where the item was found, e.g. `node "greet" choice 2`.
        location: String,
        /// Why it was rejected.
        reason: String,
    },
}
