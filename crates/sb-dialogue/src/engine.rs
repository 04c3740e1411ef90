//! The entry point a host calls to talk to an NPC.

use std::sync::Arc;

use sb_core::{DialogueTree, StateMutation, StateQuery};

use crate::config::EngineConfig;
use crate::conversation::{Conversation, RenderedNode};
use crate::diagnostic::Diagnostics;
use crate::error::DialogueResult;
use crate::registry::DialogueRegistry;
use crate::select::{EntrySelection, HasPriority, best_of, select_entry};

/// The winning entry point among all of an NPC's trees.
#[derive(Debug, Clone, Copy)]
pub struct NpcSelection<'t> {
    /// The tree the entry point belongs to.
    pub tree: &'t DialogueTree,
    /// The entry point.
    pub selection: EntrySelection<'t>,
}

impl HasPriority for NpcSelection<'_> {
    fn priority_key(&self) -> i32 {
        self.selection.priority()
    }
}

/// A started conversation together with its first node.
pub type Started<'e> = (Conversation<'e>, RenderedNode);

/// A conversation whose entry point is chosen but not yet entered.
///
/// Hosts that record meetings do so between [`DialogueEngine::open`] and
/// [`Opening::enter`], so `first_meeting` gates only the choice of entry
/// point and the opening node already sees the NPC as met.
#[derive(Debug)]
pub struct Opening<'e> {
    conversation: Conversation<'e>,
    node_id: &'e str,
}

impl<'e> Opening<'e> {
    /// The tree the conversation will run in.
    pub fn tree(&self) -> &'e DialogueTree {
        self.conversation.tree()
    }

    /// The node the conversation will open on.
    pub fn node_id(&self) -> &'e str {
        self.node_id
    }

    /// Enter the opening node.
    pub fn enter<S: StateMutation + ?Sized>(self, state: &mut S) -> DialogueResult<Started<'e>> {
        let mut conversation = self.conversation;
        let first = conversation.enter(self.node_id, state)?;
        Ok((conversation, first))
    }
}

/// Starts conversations against a shared registry.
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    registry: Arc<DialogueRegistry>,
    config: EngineConfig,
}

impl DialogueEngine {
    /// Create an engine with the default configuration.
    pub fn new(registry: impl Into<Arc<DialogueRegistry>>) -> Self {
        Self {
            registry: registry.into(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry conversations are started from.
    pub fn registry(&self) -> &DialogueRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Pick the start of a conversation with `npc` across every tree
    /// tagged with the NPC's id.
    ///
    /// The highest priority wins. Ties go to the tree registered first,
    /// then to the entry declared first.
    pub fn select_for_npc<S: StateQuery + ?Sized>(
        &self,
        npc: &str,
        state: &S,
        diagnostics: &mut Diagnostics,
    ) -> Option<NpcSelection<'_>> {
        let candidates = self.registry.by_tag(npc).into_iter().filter_map(|tree| {
            select_entry(tree, state, Some(npc), diagnostics)
                .map(|selection| NpcSelection { tree, selection })
        });
        best_of(candidates.collect::<Vec<_>>())
    }

    /// Choose where a conversation with `npc` starts, without entering it.
    ///
    /// `None` means the NPC has nothing to say right now.
    pub fn open<S: StateQuery + ?Sized>(&self, npc: &str, state: &S) -> Option<Opening<'_>> {
        let mut diagnostics = Diagnostics::new();
        let Some(chosen) = self.select_for_npc(npc, state, &mut diagnostics) else {
            tracing::info!(npc, "nothing to say");
            return None;
        };
        let node_id = chosen.selection.node_id();
        tracing::info!(npc, tree = %chosen.tree.id, node = %node_id, "starting conversation");

        let mut conversation = Conversation::new(chosen.tree, &self.config).with_npc(npc);
        conversation.absorb_diagnostics(diagnostics);
        Some(Opening {
            conversation,
            node_id,
        })
    }

    /// Start a conversation with `npc` and enter its first node.
    ///
    /// `Ok(None)` means the NPC has nothing to say right now.
    pub fn start<S: StateMutation + ?Sized>(
        &self,
        npc: &str,
        state: &mut S,
    ) -> DialogueResult<Option<Started<'_>>> {
        self.open(npc, &*state)
            .map(|opening| opening.enter(state))
            .transpose()
    }

    /// Start a conversation from a specific tree.
    ///
    /// Fails when the tree is not registered. `Ok(None)` means none of its
    /// entry points is eligible.
    pub fn start_tree<S: StateMutation + ?Sized>(
        &self,
        tree_id: &str,
        npc: Option<&str>,
        state: &mut S,
    ) -> DialogueResult<Option<Started<'_>>> {
        let tree = self.registry.require(tree_id)?;
        let mut conversation = Conversation::new(tree, &self.config);
        if let Some(npc) = npc {
            conversation = conversation.with_npc(npc);
        }
        Ok(conversation.begin(state)?.map(|first| (conversation, first)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::{Choice, Condition, DialogueNode, Effect, EntryPoint, GameState};

    use crate::conversation::Transition;
    use crate::error::DialogueError;

    fn registry() -> DialogueRegistry {
        let mut reg = DialogueRegistry::new();
        reg.register(
            DialogueTree::new("sheriff_intro", "Sheriff")
                .with_tag("sheriff")
                .with_entry(
                    EntryPoint::new("first", 5)
                        .with_condition(Condition::FirstMeeting { npc: None }),
                )
                .with_entry(EntryPoint::new("again", 0))
                .with_node(
                    DialogueNode::new("first", "New in town?")
                        .with_choice(
                            Choice::new("Just passing through.")
                                .with_effect(Effect::change_reputation(5)),
                        ),
                )
                .with_node(DialogueNode::new("again", "You again.")),
        )
        .unwrap();
        reg.register(
            DialogueTree::new("sheriff_bounty", "Bounty")
                .with_tag("sheriff")
                .with_entry(
                    EntryPoint::new("poster", 5).with_condition(Condition::flag_set("saw_poster")),
                )
                .with_entry(
                    EntryPoint::new("reward", 20)
                        .with_condition(Condition::flag_set("caught_outlaw")),
                )
                .with_node(DialogueNode::new("poster", "Seen that poster?"))
                .with_node(DialogueNode::new("reward", "Here's your reward.")),
        )
        .unwrap();
        reg
    }

    #[test]
    fn first_meeting_then_return_visit() {
        let engine = DialogueEngine::new(registry());
        let mut state = GameState::new();

        let (mut convo, first) = engine.start("sheriff", &mut state).unwrap().unwrap();
        assert_eq!(first.node_id, "first");
        assert_eq!(convo.choose(0, &mut state).unwrap(), Transition::End);
        state.record_conversation("sheriff");

        let (_, again) = engine.start("sheriff", &mut state).unwrap().unwrap();
        assert_eq!(again.node_id, "again");
    }

    #[test]
    fn meeting_recorded_at_open_is_seen_by_opening_node() {
        let mut reg = DialogueRegistry::new();
        reg.register(
            DialogueTree::new("deputy_intro", "Deputy")
                .with_tag("deputy")
                .with_entry(
                    EntryPoint::new("hello", 0)
                        .with_condition(Condition::FirstMeeting { npc: None }),
                )
                .with_node(
                    DialogueNode::new("hello", "Howdy.")
                        .with_choice(Choice::new("Bye."))
                        .with_choice(
                            Choice::new("Remember me?")
                                .with_condition(Condition::ReturnVisit { npc: None }),
                        ),
                ),
        )
        .unwrap();
        let engine = DialogueEngine::new(reg);
        let mut state = GameState::new();

        let opening = engine.open("deputy", &state).unwrap();
        assert_eq!(opening.node_id(), "hello");
        state.record_conversation("deputy");
        let (_, node) = opening.enter(&mut state).unwrap();
        assert_eq!(node.choices.len(), 2);

        // Once met, the first-meeting entry no longer opens.
        assert!(engine.open("deputy", &state).is_none());
    }

    #[test]
    fn ties_across_trees_go_to_registration_order() {
        let engine = DialogueEngine::new(registry());
        let mut state = GameState::new();
        state.set_flag("saw_poster");
        let chosen = engine
            .select_for_npc("sheriff", &state, &mut Diagnostics::new())
            .unwrap();
        assert_eq!(chosen.tree.id, "sheriff_intro");
    }

    #[test]
    fn higher_priority_tree_wins() {
        let engine = DialogueEngine::new(registry());
        let mut state = GameState::new();
        state.set_flag("caught_outlaw");
        let (convo, node) = engine.start("sheriff", &mut state).unwrap().unwrap();
        assert_eq!(convo.tree().id, "sheriff_bounty");
        assert_eq!(node.node_id, "reward");
    }

    #[test]
    fn npc_without_trees_has_nothing_to_say() {
        let engine = DialogueEngine::new(registry());
        assert!(engine.start("undertaker", &mut GameState::new()).unwrap().is_none());
    }

    #[test]
    fn start_tree_by_id() {
        let engine = DialogueEngine::new(registry());
        let mut state = GameState::new();
        assert!(engine.start_tree("sheriff_bounty", None, &mut state).unwrap().is_none());

        let (convo, node) = engine
            .start_tree("sheriff_intro", Some("sheriff"), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(node.node_id, "first");
        assert_eq!(convo.npc(), Some("sheriff"));

        assert!(matches!(
            engine.start_tree("sherriff_intro", None, &mut state),
            Err(DialogueError::UnknownTree { .. })
        ));
    }

    #[test]
    fn engine_config_reaches_effects() {
        let engine = DialogueEngine::new(registry())
            .with_config(EngineConfig::default().with_reputation_bounds(0, 3));
        let mut state = GameState::new();
        let (mut convo, _) = engine.start("sheriff", &mut state).unwrap().unwrap();
        convo.choose(0, &mut state).unwrap();
        assert_eq!(state.reputation(None), 3);
        assert_eq!(convo.diagnostics().len(), 1);
    }

    #[test]
    fn engines_share_one_registry() {
        let shared = Arc::new(registry());
        let a = DialogueEngine::new(Arc::clone(&shared));
        let b = DialogueEngine::new(shared);
        assert_eq!(a.registry().len(), b.registry().len());
    }
}
