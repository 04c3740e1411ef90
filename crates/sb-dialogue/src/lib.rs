//! Dialogue tree resolution engine for Sagebrush.
//!
//! Given a registry of authored dialogue trees and a host-owned game
//! state, the engine picks where a conversation starts, walks nodes and
//! choices, evaluates gating conditions and applies effects. It performs
//! no I/O during play; content is loaded up front.
//!
//! ```
//! use sb_core::{Choice, DialogueNode, DialogueTree, EntryPoint, GameState};
//! use sb_dialogue::{DialogueEngine, DialogueRegistry, Transition};
//!
//! let mut registry = DialogueRegistry::new();
//! registry
//!     .register(
//!         DialogueTree::new("barber_intro", "Barber")
//!             .with_tag("barber")
//!             .with_entry(EntryPoint::new("chair", 0))
//!             .with_node(
//!                 DialogueNode::new("chair", "Shave and a haircut?")
//!                     .with_choice(Choice::new("Not today.")),
//!             ),
//!     )
//!     .unwrap();
//!
//! let engine = DialogueEngine::new(registry);
//! let mut state = GameState::new();
//! let (mut convo, node) = engine.start("barber", &mut state).unwrap().unwrap();
//! assert_eq!(node.text, "Shave and a haircut?");
//! assert_eq!(convo.choose(0, &mut state).unwrap(), Transition::End);
//! ```

/// Effect application.
pub mod apply;
/// Engine configuration.
pub mod config;
/// The per-conversation graph walker.
pub mod conversation;
/// Non-fatal content reports.
pub mod diagnostic;
/// Starting conversations with NPCs.
pub mod engine;
/// Error types for the dialogue engine.
pub mod error;
/// Condition evaluation.
pub mod evaluate;
/// Reading dialogue content from JSON.
pub mod loader;
/// The dialogue tree registry.
pub mod registry;
/// Entry point selection.
pub mod select;
/// Content validation.
pub mod validate;

pub use apply::{EffectOutcome, EffectRecord, apply, apply_all};
pub use config::{EngineConfig, ReputationBounds};
pub use conversation::{
    AvailableChoice, Conversation, Phase, RenderedNode, TranscriptEntry, Transition,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use engine::{DialogueEngine, NpcSelection, Opening, Started};
pub use error::{DialogueError, DialogueResult};
pub use evaluate::{all_hold, evaluate};
pub use registry::DialogueRegistry;
pub use select::{EntrySelection, eligible_entries, select_entry};
pub use validate::{
    QuestCatalog, QuestDefinition, ValidationIssue, validate_registry, validate_tree,
    validate_trees,
};
