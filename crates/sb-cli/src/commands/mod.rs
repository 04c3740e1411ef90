pub mod check;
pub mod list;
pub mod play;
pub mod show;

use std::path::Path;

use sb_core::{Condition, Effect, GameState};
use sb_dialogue::DialogueRegistry;

/// Load every dialogue file in a directory into a registry.
fn load_registry(dir: &Path, strict: bool) -> Result<DialogueRegistry, String> {
    let mut registry = DialogueRegistry::new().with_strict_content(strict);
    registry.load_dir(dir).map_err(|e| e.to_string())?;
    if registry.is_empty() {
        return Err(format!("no dialogue trees found in {}", dir.display()));
    }
    Ok(registry)
}

/// Read a saved game state, or start a new game.
fn load_state(path: Option<&Path>) -> Result<GameState, String> {
    let Some(path) = path else {
        return Ok(GameState::new());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("invalid state in {}: {e}", path.display()))
}

fn save_state(path: &Path, state: &GameState) -> Result<(), String> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| format!("failed to serialize state: {e}"))?;
    std::fs::write(path, json).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

fn describe_conditions(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        "always".to_string()
    } else {
        conditions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

fn describe_effects(effects: &[Effect]) -> String {
    effects
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
