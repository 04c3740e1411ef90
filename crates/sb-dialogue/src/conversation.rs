//! The per-conversation graph walker.
//!
//! A [`Conversation`] borrows one tree and walks it node by node. Game
//! state is owned by the host and passed into each call, so a conversation
//! never holds on to it between steps.
//!
//! ```text
//! AwaitingEntry --enter--> NodeDisplayed --choose--> AwaitingEntry (next node)
//!                               |                 \-> Ended (null nextNodeId)
//!                               \-- no available choices --> Ended
//! ```

use sb_core::{DialogueTree, StateMutation};

use crate::apply::{EffectRecord, apply_all};
use crate::config::EngineConfig;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::error::{DialogueError, DialogueResult};
use crate::evaluate::all_hold;
use crate::select::select_entry;

/// Where a conversation is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for a node to be entered.
    AwaitingEntry,
    /// A node is on screen and waiting for a choice.
    NodeDisplayed(String),
    /// Over. No further calls are accepted.
    Ended,
}

/// A choice that passed its conditions and can be selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableChoice {
    /// Index to pass to [`Conversation::choose`].
    pub index: usize,
    /// Position of the choice in the node's authored list.
    pub authored_index: usize,
    /// The label shown to the player.
    pub text: String,
}

/// What the host displays after entering a node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    /// The node that was entered.
    pub node_id: String,
    /// Text to display.
    pub text: String,
    /// Optional mood or portrait tag.
    pub expression: Option<String>,
    /// Choices whose conditions hold, in authored order.
    pub choices: Vec<AvailableChoice>,
    /// The on-enter effects that fired.
    pub effects: Vec<EffectRecord>,
}

impl RenderedNode {
    /// Returns true if no choices are available; the conversation ends
    /// once this node has been shown.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }
}

/// Result of selecting a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Enter this node next.
    Next(String),
    /// The conversation is over.
    End,
}

/// One step of a conversation's history.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptEntry {
    /// A node was entered.
    Entered {
        /// The node entered.
        node_id: String,
        /// On-enter effects that fired.
        effects: Vec<EffectRecord>,
    },
    /// A choice was selected.
    Chose {
        /// The node the choice belongs to.
        node_id: String,
        /// Position of the choice in the node's authored list.
        authored_index: usize,
        /// The choice label.
        text: String,
        /// Choice effects that fired.
        effects: Vec<EffectRecord>,
    },
}

/// A stateful walk through one dialogue tree.
#[derive(Debug)]
pub struct Conversation<'t> {
    tree: &'t DialogueTree,
    config: &'t EngineConfig,
    npc: Option<String>,
    phase: Phase,
    available: Vec<usize>,
    transcript: Vec<TranscriptEntry>,
    diagnostics: Diagnostics,
}

impl<'t> Conversation<'t> {
    /// Create a conversation over `tree`, awaiting its first node.
    pub fn new(tree: &'t DialogueTree, config: &'t EngineConfig) -> Self {
        Self {
            tree,
            config,
            npc: None,
            phase: Phase::AwaitingEntry,
            available: Vec::new(),
            transcript: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Set the NPC the conversation is held with.
    pub fn with_npc(mut self, npc: impl Into<String>) -> Self {
        self.npc = Some(npc.into());
        self
    }

    /// Select an entry point and enter it.
    ///
    /// Returns `Ok(None)` and ends the conversation when no entry point
    /// is eligible.
    pub fn begin<S: StateMutation + ?Sized>(
        &mut self,
        state: &mut S,
    ) -> DialogueResult<Option<RenderedNode>> {
        self.ensure_open()?;
        let tree = self.tree;
        let selection = select_entry(tree, &*state, self.npc.as_deref(), &mut self.diagnostics);
        match selection {
            Some(sel) => self.enter(sel.node_id(), state).map(Some),
            None => {
                self.phase = Phase::Ended;
                Ok(None)
            }
        }
    }

    /// Enter a node: fire its on-enter effects, then filter its choices.
    ///
    /// Effects fire before filtering, so a choice may be gated on a flag
    /// its own node sets. A node with no available choices ends the
    /// conversation.
    pub fn enter<S: StateMutation + ?Sized>(
        &mut self,
        node_id: &str,
        state: &mut S,
    ) -> DialogueResult<RenderedNode> {
        self.ensure_open()?;
        let tree = self.tree;
        let node = tree
            .node(node_id)
            .ok_or_else(|| DialogueError::UnknownNode {
                tree: tree.id.clone(),
                node: node_id.to_string(),
            })?;

        let effects = apply_all(&node.on_enter_effects, state, self.config, &mut self.diagnostics);

        let npc = self.npc.as_deref();
        let mut available = Vec::new();
        for (authored_index, choice) in node.choices.iter().enumerate() {
            if all_hold(&choice.conditions, &*state, npc, &mut self.diagnostics) {
                available.push(authored_index);
            }
        }

        let choices = available
            .iter()
            .enumerate()
            .map(|(index, &authored_index)| AvailableChoice {
                index,
                authored_index,
                text: node.choices[authored_index].text.clone(),
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            tree = %tree.id,
            node = %node.id,
            choices = choices.len(),
            "entered node"
        );

        self.phase = if available.is_empty() {
            Phase::Ended
        } else {
            Phase::NodeDisplayed(node.id.clone())
        };
        self.available = available;
        self.transcript.push(TranscriptEntry::Entered {
            node_id: node.id.clone(),
            effects: effects.clone(),
        });

        Ok(RenderedNode {
            node_id: node.id.clone(),
            text: node.text.clone(),
            expression: node.expression.clone(),
            choices,
            effects,
        })
    }

    /// Select one of the displayed node's available choices.
    ///
    /// `index` counts available choices only; hidden choices cannot be
    /// selected. The choice's effects fire before the transition.
    pub fn choose<S: StateMutation + ?Sized>(
        &mut self,
        index: usize,
        state: &mut S,
    ) -> DialogueResult<Transition> {
        let node_id = match &self.phase {
            Phase::NodeDisplayed(id) => id.clone(),
            Phase::AwaitingEntry => return Err(DialogueError::NoNodeDisplayed),
            Phase::Ended => return Err(DialogueError::ConversationEnded),
        };
        let Some(&authored_index) = self.available.get(index) else {
            return Err(DialogueError::ChoiceOutOfRange {
                node: node_id,
                index,
                available: self.available.len(),
            });
        };
        let tree = self.tree;
        let choice = tree
            .node(&node_id)
            .and_then(|n| n.choices.get(authored_index))
            .ok_or_else(|| DialogueError::UnknownNode {
                tree: tree.id.clone(),
                node: node_id.clone(),
            })?;

        let effects = apply_all(&choice.effects, state, self.config, &mut self.diagnostics);
        self.transcript.push(TranscriptEntry::Chose {
            node_id: node_id.clone(),
            authored_index,
            text: choice.text.clone(),
            effects,
        });
        self.available.clear();

        let transition = match &choice.next_node_id {
            Some(next) => {
                self.phase = Phase::AwaitingEntry;
                Transition::Next(next.clone())
            }
            None => {
                self.phase = Phase::Ended;
                Transition::End
            }
        };
        tracing::debug!(tree = %tree.id, from = %node_id, ?transition, "chose");
        Ok(transition)
    }

    /// Choose, then enter the next node if there is one.
    pub fn advance<S: StateMutation + ?Sized>(
        &mut self,
        index: usize,
        state: &mut S,
    ) -> DialogueResult<Option<RenderedNode>> {
        match self.choose(index, state)? {
            Transition::Next(next) => self.enter(&next, state).map(Some),
            Transition::End => Ok(None),
        }
    }

    /// End the conversation early, e.g. when the player walks away.
    pub fn leave(&mut self) {
        self.available.clear();
        self.phase = Phase::Ended;
    }

    pub(crate) fn absorb_diagnostics(&mut self, mut diagnostics: Diagnostics) {
        self.diagnostics.append(&mut diagnostics);
    }

    fn ensure_open(&self) -> DialogueResult<()> {
        match self.phase {
            Phase::Ended => Err(DialogueError::ConversationEnded),
            _ => Ok(()),
        }
    }

    /// The tree being walked.
    pub fn tree(&self) -> &'t DialogueTree {
        self.tree
    }

    /// The NPC the conversation is held with.
    pub fn npc(&self) -> Option<&str> {
        self.npc.as_deref()
    }

    /// The current phase.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Returns true once the conversation is over.
    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }

    /// The node on screen, if any.
    pub fn current_node(&self) -> Option<&str> {
        match &self.phase {
            Phase::NodeDisplayed(id) => Some(id),
            _ => None,
        }
    }

    /// Everything that happened so far, in order.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Diagnostics reported during the walk.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// Take the diagnostics reported so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_core::{Choice, Condition, DialogueNode, Effect, EntryPoint, GameState, StateQuery};

    use crate::diagnostic::DiagnosticKind;

    fn saloon() -> DialogueTree {
        DialogueTree::new("saloon", "Saloon")
            .with_entry(EntryPoint::new("door", 0))
            .with_node(
                DialogueNode::new("door", "The piano stops.")
                    .with_choice(Choice::new("Sit down.").with_next("take_seat"))
                    .with_choice(
                        Choice::new("Order the good stuff.")
                            .with_condition(Condition::gold_gte(10))
                            .with_effect(Effect::take_gold(10))
                            .with_next("door"),
                    )
                    .with_choice(Choice::new("Leave.")),
            )
            .with_node(
                DialogueNode::new("take_seat", "*you pull up a chair*")
                    .with_on_enter(Effect::set_flag("seated"))
                    .with_on_enter(Effect::give_gold(1))
                    .with_choice(
                        Choice::new("Deal me in.")
                            .with_condition(Condition::flag_set("seated"))
                            .with_next("cards"),
                    )
                    .with_choice(Choice::new("Stand up.").with_next("door")),
            )
            .with_node(DialogueNode::new("cards", "The dealer shuffles."))
    }

    #[test]
    fn on_enter_effects_fire_before_filtering() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        let node = convo.enter("take_seat", &mut state).unwrap();
        assert!(state.has_flag("seated"));
        assert_eq!(node.choices[0].text, "Deal me in.");
        assert_eq!(node.choices.len(), 2);
        assert_eq!(node.effects.len(), 2);
    }

    #[test]
    fn on_enter_effects_fire_on_every_visit() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        convo.enter("take_seat", &mut state).unwrap();
        assert_eq!(state.gold(), 1);
        // Stand up, then sit back down.
        convo.advance(1, &mut state).unwrap();
        convo.advance(0, &mut state).unwrap();
        assert_eq!(state.gold(), 2);
        assert_eq!(convo.current_node(), Some("take_seat"));
    }

    #[test]
    fn hidden_choices_are_not_indexable() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        let node = convo.enter("door", &mut state).unwrap();
        let labels: Vec<&str> = node.choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(labels, ["Sit down.", "Leave."]);
        assert_eq!(node.choices[1].authored_index, 2);

        let err = convo.choose(2, &mut state).unwrap_err();
        assert!(matches!(
            err,
            DialogueError::ChoiceOutOfRange {
                index: 2,
                available: 2,
                ..
            }
        ));
        assert_eq!(state.gold(), 0);
    }

    #[test]
    fn choice_effects_apply_before_transition() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new().with_gold(25);
        let mut convo = Conversation::new(&tree, &config);

        convo.enter("door", &mut state).unwrap();
        let transition = convo.choose(1, &mut state).unwrap();
        assert_eq!(transition, Transition::Next("door".to_string()));
        assert_eq!(state.gold(), 15);
        assert_eq!(convo.phase(), &Phase::AwaitingEntry);
    }

    #[test]
    fn null_next_node_ends_conversation() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        convo.enter("door", &mut state).unwrap();
        assert_eq!(convo.choose(1, &mut state).unwrap(), Transition::End);
        assert!(convo.is_ended());
        assert!(matches!(
            convo.enter("door", &mut state),
            Err(DialogueError::ConversationEnded)
        ));
        assert!(matches!(
            convo.choose(0, &mut state),
            Err(DialogueError::ConversationEnded)
        ));
    }

    #[test]
    fn terminal_node_ends_after_display() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        let node = convo.enter("cards", &mut state).unwrap();
        assert!(node.is_terminal());
        assert!(convo.is_ended());
        assert!(matches!(
            convo.choose(0, &mut state),
            Err(DialogueError::ConversationEnded)
        ));
    }

    #[test]
    fn unknown_node_fails_fast() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut convo = Conversation::new(&tree, &config);
        let err = convo.enter("back_room", &mut GameState::new()).unwrap_err();
        assert!(matches!(err, DialogueError::UnknownNode { ref node, .. } if node == "back_room"));
    }

    #[test]
    fn choose_before_enter_is_rejected() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut convo = Conversation::new(&tree, &config);
        assert!(matches!(
            convo.choose(0, &mut GameState::new()),
            Err(DialogueError::NoNodeDisplayed)
        ));
    }

    #[test]
    fn begin_uses_entry_selection() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config).with_npc("bartender");
        let node = convo.begin(&mut state).unwrap().unwrap();
        assert_eq!(node.node_id, "door");
        assert_eq!(convo.npc(), Some("bartender"));
    }

    #[test]
    fn begin_without_eligible_entry_ends() {
        let tree = DialogueTree::new("closed", "Closed")
            .with_entry(EntryPoint::new("open", 0).with_condition(Condition::flag_set("open")))
            .with_node(DialogueNode::new("open", "Come in."));
        let config = EngineConfig::default();
        let mut convo = Conversation::new(&tree, &config);
        assert_eq!(convo.begin(&mut GameState::new()).unwrap(), None);
        assert!(convo.is_ended());
    }

    #[test]
    fn repeated_enter_filters_identically_with_unchanged_state() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);
        let first = convo.enter("door", &mut state).unwrap();
        let second = convo.enter("door", &mut state).unwrap();
        assert_eq!(first.choices, second.choices);
    }

    #[test]
    fn transcript_records_walk() {
        let tree = saloon();
        let config = EngineConfig::default();
        let mut state = GameState::new();
        let mut convo = Conversation::new(&tree, &config);

        convo.enter("door", &mut state).unwrap();
        convo.advance(0, &mut state).unwrap();
        convo.leave();

        let transcript = convo.transcript();
        assert_eq!(transcript.len(), 3);
        assert!(matches!(
            &transcript[1],
            TranscriptEntry::Chose { node_id, authored_index: 0, .. } if node_id == "door"
        ));
        assert!(matches!(
            &transcript[2],
            TranscriptEntry::Entered { node_id, .. } if node_id == "take_seat"
        ));
        assert!(convo.is_ended());
    }

    #[test]
    fn malformed_choice_condition_hides_choice_and_is_reported() {
        let bad: Condition = serde_json::from_str(r#"{"type":"moon_phase"}"#).unwrap();
        let tree = DialogueTree::new("wolf", "Wolf")
            .with_entry(EntryPoint::new("howl", 0))
            .with_node(
                DialogueNode::new("howl", "Awoo.")
                    .with_choice(Choice::new("Howl back.").with_condition(bad))
                    .with_choice(Choice::new("Back away.")),
            );
        let config = EngineConfig::default();
        let mut convo = Conversation::new(&tree, &config);
        let node = convo.enter("howl", &mut GameState::new()).unwrap();
        assert_eq!(node.choices.len(), 1);
        assert_eq!(
            convo.diagnostics()[0].kind,
            DiagnosticKind::UnrecognizedCondition
        );
        assert_eq!(convo.take_diagnostics().len(), 1);
        assert!(convo.diagnostics().is_empty());
    }
}
