use std::path::Path;

use colored::Colorize;
use sb_dialogue::loader::{json_files_in, read_tree_file};
use sb_dialogue::{QuestCatalog, ValidationIssue, validate_trees};

use super::plural;

pub fn run(dir: &Path, quests: Option<&Path>) -> Result<(), String> {
    let catalog = quests
        .map(QuestCatalog::from_json_file)
        .transpose()
        .map_err(|e| e.to_string())?;

    let files = json_files_in(dir).map_err(|e| e.to_string())?;
    if files.is_empty() {
        return Err(format!("no .json dialogue files found in {}", dir.display()));
    }

    // Keep going past unreadable files so every problem is reported at once.
    let mut trees = Vec::new();
    let mut load_errors = 0;
    for file in &files {
        match read_tree_file(file) {
            Ok(mut parsed) => trees.append(&mut parsed),
            Err(e) => {
                eprintln!("  {}: {e}", "error".red().bold());
                load_errors += 1;
            }
        }
    }

    let issues = validate_trees(&trees, catalog.as_ref());
    for issue in &issues {
        print_issue(issue);
    }

    let errors = load_errors + issues.iter().filter(|i| i.is_error).count();
    let warnings = issues.iter().filter(|i| !i.is_error).count();

    if errors > 0 {
        eprintln!(
            "  {errors} error{}, {warnings} warning{}",
            plural(errors),
            plural(warnings)
        );
        return Err("content check failed".into());
    }

    let nodes: usize = trees.iter().map(|t| t.node_count()).sum();
    println!("  All checks passed.");
    println!(
        "  {} tree{} in {} file{}, {nodes} node{}",
        trees.len(),
        plural(trees.len()),
        files.len(),
        plural(files.len()),
        plural(nodes),
    );
    if warnings > 0 {
        println!("  {warnings} warning{}", plural(warnings));
    }
    Ok(())
}

fn print_issue(issue: &ValidationIssue) {
    let level = if issue.is_error {
        "error".red().bold()
    } else {
        "warning".yellow().bold()
    };
    eprintln!("  {level}: {}: {}", issue.tree.bold(), issue.message);
}
