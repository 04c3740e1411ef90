//! Content validation.
//!
//! Registration already rejects trees that cannot be walked. Validation
//! goes further and reports everything an author should look at before
//! shipping: unrecognized content, unreachable nodes, unguarded costs and,
//! when a [`QuestCatalog`] is supplied, quest ids and stage names.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sb_core::{Choice, Condition, CoreError, DialogueTree, Effect};

use crate::error::{DialogueError, DialogueResult};
use crate::registry::DialogueRegistry;

/// A warning or error found during content validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// The tree the issue was found in.
    pub tree: String,
    /// A human-readable description of the issue.
    pub message: String,
    /// Whether this is an error (true) or a warning (false).
    pub is_error: bool,
}

impl ValidationIssue {
    fn error(tree: &str, message: impl Into<String>) -> Self {
        Self {
            tree: tree.to_string(),
            message: message.into(),
            is_error: true,
        }
    }

    fn warning(tree: &str, message: impl Into<String>) -> Self {
        Self {
            tree: tree.to_string(),
            message: message.into(),
            is_error: false,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{level}: {}: {}", self.tree, self.message)
    }
}

/// A quest and the stages it may be in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestDefinition {
    /// Quest id.
    pub id: String,
    /// Declared stage names. Empty means stages are not checked.
    #[serde(default)]
    pub stages: Vec<String>,
}

/// The quests content is allowed to reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestCatalog {
    /// Declared quests.
    #[serde(default)]
    pub quests: Vec<QuestDefinition>,
}

impl QuestCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a quest.
    pub fn with_quest<I, S>(mut self, id: impl Into<String>, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quests.push(QuestDefinition {
            id: id.into(),
            stages: stages.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Look up a quest.
    pub fn quest(&self, id: &str) -> Option<&QuestDefinition> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Parse a catalog from JSON.
    pub fn from_json_str(json: &str, origin: &str) -> DialogueResult<Self> {
        serde_json::from_str(json).map_err(|source| DialogueError::Json {
            origin: origin.to_string(),
            source,
        })
    }

    /// Read and parse a catalog file.
    pub fn from_json_file(path: impl AsRef<Path>) -> DialogueResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DialogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, &path.display().to_string())
    }
}

/// Validate every tree in a registry.
pub fn validate_registry(
    registry: &DialogueRegistry,
    quests: Option<&QuestCatalog>,
) -> Vec<ValidationIssue> {
    registry
        .iter()
        .flat_map(|tree| validate_tree(tree, quests))
        .collect()
}

/// Validate trees that have not been registered, including duplicate ids
/// across the set.
pub fn validate_trees<'a>(
    trees: impl IntoIterator<Item = &'a DialogueTree>,
    quests: Option<&QuestCatalog>,
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for tree in trees {
        if !seen.insert(tree.id.as_str()) {
            issues.push(ValidationIssue::error(&tree.id, "duplicate tree id"));
        }
        issues.extend(validate_tree(tree, quests));
    }
    issues
}

/// Validate a single tree.
pub fn validate_tree(tree: &DialogueTree, quests: Option<&QuestCatalog>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for err in tree.integrity_errors().iter().chain(&tree.unrecognized_content()) {
        issues.push(ValidationIssue::error(&tree.id, describe(tree, err)));
    }

    validate_entries(tree, &mut issues);
    validate_reachability(tree, &mut issues);

    for node in tree.nodes.values() {
        if node.text.trim().is_empty() {
            issues.push(ValidationIssue::warning(
                &tree.id,
                format!("node \"{}\" has empty text", node.id),
            ));
        }
        for (i, choice) in node.choices.iter().enumerate() {
            let location = format!("node \"{}\" choice {i}", node.id);
            if choice.text.trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    &tree.id,
                    format!("{location} has empty text"),
                ));
            }
            validate_guards(tree, &location, choice, &mut issues);
        }
    }

    if let Some(catalog) = quests {
        validate_quests(tree, catalog, &mut issues);
    }

    issues
}

/// Strip the tree prefix the core error carries; the issue names the tree.
fn describe(tree: &DialogueTree, err: &CoreError) -> String {
    let text = err.to_string();
    let prefix = format!("tree \"{}\": ", tree.id);
    match text.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

fn validate_entries(tree: &DialogueTree, issues: &mut Vec<ValidationIssue>) {
    if tree.entry_points.is_empty() {
        issues.push(ValidationIssue::error(
            &tree.id,
            "no entry points; the tree can never start",
        ));
    } else if !tree.entry_points.iter().any(|e| e.is_unconditional()) {
        issues.push(ValidationIssue::warning(
            &tree.id,
            "no unconditional entry point; the NPC may have nothing to say",
        ));
    }
}

fn validate_reachability(tree: &DialogueTree, issues: &mut Vec<ValidationIssue>) {
    let reachable = tree.reachable_nodes();
    for id in tree.nodes.keys() {
        if !reachable.contains(id.as_str()) {
            issues.push(ValidationIssue::warning(
                &tree.id,
                format!("node \"{id}\" is unreachable from any entry point"),
            ));
        }
    }
}

/// Costs on a choice should be guarded by a condition that proves the
/// player can pay.
fn validate_guards(
    tree: &DialogueTree,
    location: &str,
    choice: &Choice,
    issues: &mut Vec<ValidationIssue>,
) {
    for effect in &choice.effects {
        match effect {
            Effect::TakeGold { amount } => {
                let needed = i64::from(*amount);
                let guarded = choice
                    .conditions
                    .iter()
                    .any(|c| matches!(c, Condition::GoldGte { amount: a } if *a >= needed));
                if !guarded {
                    let guard = format!("gold_gte({amount})");
                    issues.push(ValidationIssue::warning(
                        &tree.id,
                        format!("{location} takes {amount} gold without a {guard} guard"),
                    ));
                }
            }
            Effect::TakeItem { item, count } => {
                let guarded = choice.conditions.iter().any(|c| {
                    matches!(c, Condition::HasItem { item: i, count: n } if i == item && n >= count)
                });
                if !guarded {
                    issues.push(ValidationIssue::warning(
                        &tree.id,
                        format!("{location} takes {count} \"{item}\" without a has_item guard"),
                    ));
                }
            }
            _ => {}
        }
    }
}

fn validate_quests(tree: &DialogueTree, catalog: &QuestCatalog, issues: &mut Vec<ValidationIssue>) {
    let mut check = |location: &str, quest: &str, stage: Option<&str>| {
        let Some(def) = catalog.quest(quest) else {
            issues.push(ValidationIssue::error(
                &tree.id,
                format!("{location}: unknown quest \"{quest}\""),
            ));
            return;
        };
        if let Some(stage) = stage
            && !def.stages.is_empty()
            && !def.stages.iter().any(|s| s == stage)
        {
            issues.push(ValidationIssue::error(
                &tree.id,
                format!("{location}: quest \"{quest}\" has no stage \"{stage}\""),
            ));
        }
    };

    for (location, condition) in tree.conditions() {
        match condition {
            Condition::QuestActive { quest, stage } => check(&location, quest, stage.as_deref()),
            Condition::QuestComplete { quest } => check(&location, quest, None),
            _ => {}
        }
    }
    for (location, effect) in tree.effects() {
        match effect {
            Effect::StartQuest { quest, stage } => check(&location, quest, stage.as_deref()),
            Effect::AdvanceQuest { quest, stage } => check(&location, quest, Some(stage)),
            Effect::CompleteQuest { quest } => check(&location, quest, None),
            _ => {}
        }
    }
}
