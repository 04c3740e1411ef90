use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use sb_dialogue::{Diagnostics, eligible_entries, select_entry};

use super::{describe_conditions, describe_effects};

pub fn run(
    dir: &Path,
    tree_id: &str,
    state: Option<&Path>,
    npc: Option<&str>,
) -> Result<(), String> {
    let registry = super::load_registry(dir, false)?;
    let tree = registry.require(tree_id).map_err(|e| e.to_string())?;

    // Header
    println!("  {} [{}]", tree.name.bold(), tree.id.dimmed());
    if !tree.description.is_empty() {
        println!();
        for line in tree.description.lines() {
            println!("  {}", line.trim());
        }
    }
    if !tree.tags.is_empty() {
        println!("  tags: {}", tree.tags.join(", "));
    }
    println!();

    // Entry points, with eligibility when a state is given. Scope-dependent
    // conditions need the NPC, which defaults to the tree's first tag.
    let game = state.map(|p| super::load_state(Some(p))).transpose()?;
    let npc = npc.or_else(|| tree.tags.first().map(String::as_str));
    let mut diagnostics = Diagnostics::new();
    let (eligible, selected) = match &game {
        Some(game) => (
            Some(eligible_entries(tree, game, npc, &mut diagnostics)),
            select_entry(tree, game, npc, &mut diagnostics).map(|s| s.index),
        ),
        None => (None, None),
    };

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let mut header = vec!["#", "Node", "Priority", "Conditions"];
    if eligible.is_some() {
        header.push("Eligible");
    }
    table.set_header(header);

    for (i, entry) in tree.entry_points.iter().enumerate() {
        let mut row = vec![
            i.to_string(),
            entry.node_id.clone(),
            entry.priority.to_string(),
            describe_conditions(&entry.conditions),
        ];
        if let Some(eligible) = &eligible {
            let mark = match (selected == Some(i), eligible.iter().any(|s| s.index == i)) {
                (true, _) => "selected",
                (false, true) => "yes",
                (false, false) => "no",
            };
            row.push(mark.to_string());
        }
        table.add_row(row);
    }

    match (&game, npc) {
        (Some(_), Some(npc)) => println!("  {} (talking to {npc})", "Entry points".underline()),
        _ => println!("  {}", "Entry points".underline()),
    }
    println!("{table}");
    if game.is_some() && selected.is_none() {
        println!("  {}", "No eligible entry point: the NPC has nothing to say.".yellow());
    }
    println!();

    // Nodes
    println!("  {}", "Nodes".underline());
    for node in tree.nodes.values() {
        match &node.expression {
            Some(expr) => println!("  {} ({})", node.id.bold(), expr.dimmed()),
            None => println!("  {}", node.id.bold()),
        }
        println!("    \"{}\"", node.text);
        if !node.on_enter_effects.is_empty() {
            println!("    on enter: {}", describe_effects(&node.on_enter_effects).cyan());
        }
        for (i, choice) in node.choices.iter().enumerate() {
            let next = choice.next_node_id.as_deref().unwrap_or("(end)");
            println!("    {}. {} -> {}", i + 1, choice.text, next.green());
            if !choice.conditions.is_empty() {
                println!("       if {}", describe_conditions(&choice.conditions).dimmed());
            }
            if !choice.effects.is_empty() {
                println!("       then {}", describe_effects(&choice.effects).cyan());
            }
        }
        if node.is_terminal() {
            println!("    {}", "(terminal)".dimmed());
        }
    }

    Ok(())
}
