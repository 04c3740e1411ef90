use std::path::Path;

use comfy_table::{ContentArrangement, Table};

use super::plural;

pub fn run(dir: &Path, tag: Option<&str>) -> Result<(), String> {
    let registry = super::load_registry(dir, false)?;

    let trees = match tag {
        Some(tag) => registry.by_tag(tag),
        None => registry.iter().collect(),
    };

    if trees.is_empty() {
        println!("  No dialogue trees found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name", "Tags", "Nodes", "Entries"]);

    for tree in &trees {
        let tags = if tree.tags.is_empty() {
            "-".to_string()
        } else {
            tree.tags.join(", ")
        };
        table.add_row(vec![
            tree.id.clone(),
            tree.name.clone(),
            tags,
            tree.node_count().to_string(),
            tree.entry_points.len().to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} dialogue tree{}", trees.len(), plural(trees.len()));

    Ok(())
}
