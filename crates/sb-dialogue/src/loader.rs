//! Reading dialogue content from JSON.
//!
//! A content file holds either a single tree object or an array of trees.
//! Node ids may be omitted inside nodes and are then taken from the keys
//! of the `nodes` map.

use std::path::{Path, PathBuf};

use sb_core::DialogueTree;
use serde_json::Value;

use crate::error::{DialogueError, DialogueResult};

/// Parse the trees in one JSON document.
///
/// `origin` names the input in error messages.
pub fn parse_trees(json: &str, origin: &str) -> DialogueResult<Vec<DialogueTree>> {
    let json_err = |source| DialogueError::Json {
        origin: origin.to_string(),
        source,
    };
    let value: Value = serde_json::from_str(json).map_err(json_err)?;
    let mut trees: Vec<DialogueTree> = match value {
        Value::Array(_) => serde_json::from_value(value).map_err(json_err)?,
        other => vec![serde_json::from_value(other).map_err(json_err)?],
    };
    for tree in &mut trees {
        tree.adopt_node_keys();
    }
    Ok(trees)
}

/// Read and parse one content file.
pub fn read_tree_file(path: &Path) -> DialogueResult<Vec<DialogueTree>> {
    let json = std::fs::read_to_string(path).map_err(|source| DialogueError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trees(&json, &path.display().to_string())
}

/// All `.json` files directly inside `dir`, sorted by path.
pub fn json_files_in(dir: &Path) -> DialogueResult<Vec<PathBuf>> {
    let io_err = |source| DialogueError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINGLE: &str = r#"{
        "id": "undertaker",
        "name": "Undertaker",
        "entryPoints": [{ "nodeId": "measure" }],
        "nodes": { "measure": { "text": "*eyes you up for a coffin*" } }
    }"#;

    #[test]
    fn parses_single_tree() {
        let trees = parse_trees(SINGLE, "inline").unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].node("measure").unwrap().id, "measure");
        assert_eq!(trees[0].entry_points[0].priority, 0);
    }

    #[test]
    fn parses_array_of_trees() {
        let json = format!("[{SINGLE}, {}]", SINGLE.replace("undertaker", "gravedigger"));
        let trees = parse_trees(&json, "inline").unwrap();
        let ids: Vec<&str> = trees.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["undertaker", "gravedigger"]);
    }

    #[test]
    fn errors_name_their_origin() {
        let err = parse_trees(r#"{ "id": 5 }"#, "broken.json").unwrap_err();
        assert!(matches!(err, DialogueError::Json { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn malformed_condition_does_not_fail_the_file() {
        let json = r#"{
            "id": "assayer",
            "entryPoints": [
                { "nodeId": "weigh", "conditions": [{ "type": "reputation_gte", "value": "50" }], "priority": 5 },
                { "nodeId": "weigh" }
            ],
            "nodes": {
                "weigh": {
                    "text": "Let's see that nugget.",
                    "choices": [{ "text": "Here.", "effects": [{ "value": 3 }] }]
                }
            }
        }"#;
        let trees = parse_trees(json, "assayer.json").unwrap();
        let tree = &trees[0];
        assert!(tree.entry_points[0].conditions[0].is_unrecognized());
        assert!(tree.node("weigh").unwrap().choices[0].effects[0].is_unrecognized());
        assert_eq!(tree.unrecognized_content().len(), 2);
    }

    #[test]
    fn directory_listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), SINGLE).unwrap();
        std::fs::write(dir.path().join("a.json"), SINGLE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not content").unwrap();

        let files = json_files_in(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_tree_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, DialogueError::Io { .. }));
    }
}
