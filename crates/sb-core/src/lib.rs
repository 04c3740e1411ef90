//! Core types for Sagebrush: dialogue trees, conditions, effects, and game state.
//!
//! This crate defines the authored content model that the dialogue engine
//! walks, plus the game-state facade the engine reads and writes. It does no
//! evaluation of its own. A [`DialogueTree`] can be built in code or
//! deserialized from JSON.

/// Gating predicates attached to entry points and choices.
pub mod condition;
/// State mutations applied on node entry and choice selection.
pub mod effect;
/// Error types used throughout the crate.
pub mod error;
/// Game-state facade and the default in-memory implementation.
pub mod state;
/// Dialogue trees, entry points, nodes, and choices.
pub mod tree;
mod wire;

/// Re-export condition types.
pub use condition::{Condition, WireCondition};
/// Re-export effect types.
pub use effect::{Effect, WireEffect};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export game-state types.
pub use state::{GameState, QuestStatus, StateMutation, StateQuery, TimeOfDay};
/// Re-export tree types.
pub use tree::{Choice, DialogueNode, DialogueTree, EntryPoint};
