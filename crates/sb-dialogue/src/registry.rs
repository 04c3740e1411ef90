//! The dialogue tree registry.
//!
//! Trees are registered once at startup and are read-only afterwards, so a
//! registry can be shared between sessions behind an `Arc`.

use std::collections::HashMap;
use std::path::Path;

use sb_core::DialogueTree;
use strsim::jaro_winkler;

use crate::error::{DialogueError, DialogueResult};
use crate::loader;

/// Minimum similarity for a "did you mean" suggestion (0.0-1.0).
const FUZZY_THRESHOLD: f64 = 0.8;

/// Lookup of dialogue trees by id and by tag.
#[derive(Debug, Default)]
pub struct DialogueRegistry {
    trees: Vec<DialogueTree>,
    by_id: HashMap<String, usize>,
    by_tag: HashMap<String, Vec<usize>>,
    strict: bool,
}

impl DialogueRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject trees containing unrecognized conditions or effects.
    pub fn with_strict_content(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Register a tree.
    ///
    /// Fails on a duplicate id or on any dangling node reference. In
    /// strict mode, unrecognized content is rejected too; otherwise it is
    /// logged and left to fail closed at runtime.
    pub fn register(&mut self, tree: DialogueTree) -> DialogueResult<()> {
        if self.by_id.contains_key(&tree.id) {
            return Err(DialogueError::DuplicateTree(tree.id));
        }
        tree.check_integrity()?;

        let unrecognized = tree.unrecognized_content();
        if let Some(first) = unrecognized.first() {
            if self.strict {
                return Err(first.clone().into());
            }
            for issue in &unrecognized {
                tracing::warn!("{issue}");
            }
        }

        let index = self.trees.len();
        for tag in &tree.tags {
            let slots = self.by_tag.entry(tag.clone()).or_default();
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        self.by_id.insert(tree.id.clone(), index);
        tracing::debug!(tree = %tree.id, nodes = tree.node_count(), "registered dialogue tree");
        self.trees.push(tree);
        Ok(())
    }

    /// Look up a tree by id.
    pub fn get(&self, id: &str) -> Option<&DialogueTree> {
        self.by_id.get(id).map(|&i| &self.trees[i])
    }

    /// Look up a tree by id, suggesting a close match when it is missing.
    pub fn require(&self, id: &str) -> DialogueResult<&DialogueTree> {
        self.get(id).ok_or_else(|| DialogueError::UnknownTree {
            id: id.to_string(),
            suggestion: self.suggest(id),
        })
    }

    /// The registered id most similar to `input`, if any is close enough.
    pub fn suggest(&self, input: &str) -> Option<String> {
        let input_lower = input.to_lowercase();
        self.trees
            .iter()
            .map(|t| (jaro_winkler(&input_lower, &t.id.to_lowercase()), &t.id))
            .filter(|(score, _)| *score >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(_, id)| id.clone())
    }

    /// Trees carrying the tag, in registration order.
    pub fn by_tag(&self, tag: &str) -> Vec<&DialogueTree> {
        self.by_tag
            .get(tag)
            .map(|slots| slots.iter().map(|&i| &self.trees[i]).collect())
            .unwrap_or_default()
    }

    /// All tags in use, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.by_tag.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// All trees, in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, DialogueTree> {
        self.trees.iter()
    }

    /// Number of registered trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Returns true if no trees are registered.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Register every tree in a JSON document. Returns how many were added.
    pub fn load_json_str(&mut self, json: &str, origin: &str) -> DialogueResult<usize> {
        let trees = loader::parse_trees(json, origin)?;
        self.register_all(trees)
    }

    /// Register every tree in a JSON file. Returns how many were added.
    pub fn load_json_file(&mut self, path: impl AsRef<Path>) -> DialogueResult<usize> {
        let trees = loader::read_tree_file(path.as_ref())?;
        self.register_all(trees)
    }

    /// Register every tree in every `.json` file of a directory, in path
    /// order. Returns how many were added.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> DialogueResult<usize> {
        let mut count = 0;
        for path in loader::json_files_in(dir.as_ref())? {
            count += self.load_json_file(&path)?;
        }
        tracing::info!(trees = count, dir = %dir.as_ref().display(), "loaded dialogue content");
        Ok(count)
    }

    fn register_all(&mut self, trees: Vec<DialogueTree>) -> DialogueResult<usize> {
        let count = trees.len();
        for tree in trees {
            self.register(tree)?;
        }
        Ok(count)
    }
}

impl<'a> IntoIterator for &'a DialogueRegistry {
    type Item = &'a DialogueTree;
    type IntoIter = std::slice::Iter<'a, DialogueTree>;

    fn into_iter(self) -> Self::IntoIter {
        self.trees.iter()
    }
}
