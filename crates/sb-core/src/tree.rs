//! Authored dialogue trees: entry points, nodes and the choices between them.
//!
//! A tree stores its nodes in a map keyed by node id rather than nesting
//! them, so cycles (returning to a hub node) need no special handling.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::effect::Effect;
use crate::error::{CoreError, CoreResult};

/// A named, self-contained conversation graph for one NPC or scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTree {
    /// Unique identifier across the registry.
    pub id: String,
    /// Display name, for tools only.
    #[serde(default)]
    pub name: String,
    /// Free-form description, for tools only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Tags used to associate the tree with NPCs and for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Candidate starting nodes, in authored order.
    #[serde(default)]
    pub entry_points: Vec<EntryPoint>,
    /// All nodes, keyed by node id.
    #[serde(default)]
    pub nodes: BTreeMap<String, DialogueNode>,
}

impl DialogueTree {
    /// Create an empty tree.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            entry_points: Vec::new(),
            nodes: BTreeMap::new(),
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add an entry point.
    pub fn with_entry(mut self, entry: EntryPoint) -> Self {
        self.entry_points.push(entry);
        self
    }

    /// Add a node, keyed by its id.
    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&DialogueNode> {
        self.nodes.get(id)
    }

    /// Returns true if the tree carries the tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Fill in node ids omitted in authored content from their map keys.
    ///
    /// Content may write `"nodes": { "greet": { "text": ... } }` without
    /// repeating the id inside the node.
    pub fn adopt_node_keys(&mut self) {
        for (key, node) in &mut self.nodes {
            if node.id.is_empty() {
                node.id = key.clone();
            }
        }
    }

    /// Iterate over every condition in the tree together with a
    /// human-readable location.
    pub fn conditions(&self) -> impl Iterator<Item = (String, &Condition)> {
        let entries = self.entry_points.iter().enumerate().flat_map(|(i, entry)| {
            entry
                .conditions
                .iter()
                .map(move |c| (format!("entry point {i}"), c))
        });
        let choices = self.nodes.values().flat_map(|node| {
            node.choices.iter().enumerate().flat_map(move |(i, choice)| {
                choice
                    .conditions
                    .iter()
                    .map(move |c| (format!("node \"{}\" choice {i}", node.id), c))
            })
        });
        entries.chain(choices)
    }

    /// Iterate over every effect in the tree together with a
    /// human-readable location.
    pub fn effects(&self) -> impl Iterator<Item = (String, &Effect)> {
        self.nodes.values().flat_map(|node| {
            let on_enter = node
                .on_enter_effects
                .iter()
                .map(move |e| (format!("node \"{}\" on enter", node.id), e));
            let on_choice = node.choices.iter().enumerate().flat_map(move |(i, choice)| {
                choice
                    .effects
                    .iter()
                    .map(move |e| (format!("node \"{}\" choice {i}", node.id), e))
            });
            on_enter.chain(on_choice)
        })
    }

    /// Every structural defect in the tree: node key/id mismatches and
    /// references to nodes that do not exist.
    pub fn integrity_errors(&self) -> Vec<CoreError> {
        let mut errors = Vec::new();

        for (key, node) in &self.nodes {
            if key != &node.id {
                errors.push(CoreError::NodeKeyMismatch {
                    tree: self.id.clone(),
                    key: key.clone(),
                    id: node.id.clone(),
                });
            }
        }

        for (index, entry) in self.entry_points.iter().enumerate() {
            if !self.nodes.contains_key(&entry.node_id) {
                errors.push(CoreError::DanglingEntryNode {
                    tree: self.id.clone(),
                    index,
                    target: entry.node_id.clone(),
                });
            }
        }

        for node in self.nodes.values() {
            for (choice, c) in node.choices.iter().enumerate() {
                if let Some(target) = &c.next_node_id {
                    if !self.nodes.contains_key(target) {
                        errors.push(CoreError::DanglingNextNode {
                            tree: self.id.clone(),
                            node: node.id.clone(),
                            choice,
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        errors
    }

    /// Fail with the first structural defect, if any.
    pub fn check_integrity(&self) -> CoreResult<()> {
        match self.integrity_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Conditions and effects that could not be decoded, as errors.
    pub fn unrecognized_content(&self) -> Vec<CoreError> {
        let conditions = self.conditions().filter_map(|(location, c)| match c {
            Condition::Unrecognized { record, reason } => Some(CoreError::UnrecognizedContent {
                tree: self.id.clone(),
                what: "condition",
                kind: record.kind.clone(),
                location,
                reason: reason.clone(),
            }),
            _ => None,
        });
        let effects = self.effects().filter_map(|(location, e)| match e {
            Effect::Unrecognized { record, reason } => Some(CoreError::UnrecognizedContent {
                tree: self.id.clone(),
                what: "effect",
                kind: record.kind.clone(),
                location,
                reason: reason.clone(),
            }),
            _ => None,
        });
        conditions.chain(effects).collect()
    }

    /// Node ids reachable from any entry point by following choices.
    pub fn reachable_nodes(&self) -> HashSet<&str> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = self
            .entry_points
            .iter()
            .map(|e| e.node_id.as_str())
            .collect();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.choices.iter().filter_map(|c| c.next_node_id.as_deref()));
            }
        }

        seen.retain(|id| self.nodes.contains_key(*id));
        seen
    }
}

/// A candidate starting node, gated by conditions and ranked by priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPoint {
    /// Node the conversation starts at.
    pub node_id: String,
    /// Conditions that must all hold. Empty means always eligible.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Higher wins.
    #[serde(default)]
    pub priority: i32,
}

impl EntryPoint {
    /// Create an unconditional entry point.
    pub fn new(node_id: impl Into<String>, priority: i32) -> Self {
        Self {
            node_id: node_id.into(),
            conditions: Vec::new(),
            priority,
        }
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Returns true if the entry has no conditions.
    pub fn is_unconditional(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// One beat of dialogue: text plus the choices available from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueNode {
    /// Unique within the tree. May be omitted in content and taken from
    /// the map key (see [`DialogueTree::adopt_node_keys`]).
    #[serde(default)]
    pub id: String,
    /// Text to display. Stage directions are opaque to the engine.
    pub text: String,
    /// Optional mood or portrait tag for the front end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Player choices, in authored order. Empty means terminal.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Effects applied every time the node is entered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_enter_effects: Vec<Effect>,
}

impl DialogueNode {
    /// Create a terminal node with the given id and text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            expression: None,
            choices: Vec::new(),
            on_enter_effects: Vec::new(),
        }
    }

    /// Set the expression tag.
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Add a choice.
    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// Add an on-enter effect.
    pub fn with_on_enter(mut self, effect: Effect) -> Self {
        self.on_enter_effects.push(effect);
        self
    }

    /// Returns true if the node has no authored choices.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }
}

/// A single player choice on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    /// The label shown to the player.
    pub text: String,
    /// Node to go to next; `None` ends the conversation.
    #[serde(default)]
    pub next_node_id: Option<String>,
    /// Conditions that must all hold for the choice to be shown.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    /// Effects applied when the choice is selected, before transitioning.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<Effect>,
}

impl Choice {
    /// Create a choice that ends the conversation.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            next_node_id: None,
            conditions: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Set the node to go to next.
    pub fn with_next(mut self, node_id: impl Into<String>) -> Self {
        self.next_node_id = Some(node_id.into());
        self
    }

    /// Add a condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an effect.
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saloon() -> DialogueTree {
        DialogueTree::new("bartender_intro", "Bartender")
            .with_tag("bartender")
            .with_entry(EntryPoint::new("greet", 0))
            .with_node(
                DialogueNode::new("greet", "*wipes a glass* What'll it be?")
                    .with_choice(Choice::new("Whiskey.").with_next("pour"))
                    .with_choice(Choice::new("Nothing.")),
            )
            .with_node(
                DialogueNode::new("pour", "*slides the glass over*")
                    .with_choice(Choice::new("Another question.").with_next("greet")),
            )
    }

    #[test]
    fn builder_tree_is_intact() {
        let tree = saloon();
        assert!(tree.check_integrity().is_ok());
        assert_eq!(tree.node_count(), 2);
        assert!(tree.has_tag("bartender"));
        assert!(!tree.has_tag("sheriff"));
    }

    #[test]
    fn dangling_next_node_is_reported() {
        let tree = saloon().with_node(
            DialogueNode::new("brawl", "Fists fly.")
                .with_choice(Choice::new("Run!").with_next("street")),
        );
        let errors = tree.integrity_errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CoreError::DanglingNextNode { node, target, choice: 0, .. }
                if node == "brawl" && target == "street"
        ));
    }

    #[test]
    fn dangling_entry_is_reported() {
        let tree = saloon().with_entry(EntryPoint::new("nowhere", 5));
        assert!(matches!(
            tree.check_integrity(),
            Err(CoreError::DanglingEntryNode { index: 1, .. })
        ));
    }

    #[test]
    fn node_key_mismatch_is_reported() {
        let mut tree = saloon();
        let mut node = DialogueNode::new("other", "…");
        node.id = "different".to_string();
        tree.nodes.insert("other".to_string(), node);
        assert!(matches!(
            tree.check_integrity(),
            Err(CoreError::NodeKeyMismatch { .. })
        ));
    }

    #[test]
    fn deserializes_authored_json() {
        let json = r#"{
            "id": "prospector",
            "name": "Old Pete",
            "tags": ["pete"],
            "entryPoints": [
                { "nodeId": "hello", "conditions": [], "priority": 0 }
            ],
            "nodes": {
                "hello": {
                    "text": "*spits* Howdy.",
                    "expression": "grumpy",
                    "onEnterEffects": [{ "type": "set_flag", "target": "met_pete" }],
                    "choices": [
                        { "text": "Bye.", "nextNodeId": null }
                    ]
                }
            }
        }"#;
        let mut tree: DialogueTree = serde_json::from_str(json).unwrap();
        tree.adopt_node_keys();
        assert!(tree.check_integrity().is_ok());

        let hello = tree.node("hello").unwrap();
        assert_eq!(hello.id, "hello");
        assert_eq!(hello.expression.as_deref(), Some("grumpy"));
        assert_eq!(hello.on_enter_effects, vec![Effect::set_flag("met_pete")]);
        assert_eq!(hello.choices[0].next_node_id, None);
    }

    #[test]
    fn reachable_nodes_follow_cycles() {
        let tree = saloon().with_node(DialogueNode::new("orphan", "Nobody comes here."));
        let reachable = tree.reachable_nodes();
        assert!(reachable.contains("greet"));
        assert!(reachable.contains("pour"));
        assert!(!reachable.contains("orphan"));
    }

    #[test]
    fn unrecognized_content_is_located() {
        let choice: Choice = serde_json::from_str(
            r#"{ "text": "Howl", "conditions": [{ "type": "moon_phase" }] }"#,
        )
        .unwrap();
        let tree = saloon().with_node(DialogueNode::new("wolf", "Awoo").with_choice(choice));
        let found = tree.unrecognized_content();
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string().contains("node \"wolf\" choice 0"));
    }
}
