//! Drive a conversation from the terminal, acting as the host application.

use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;
use sb_core::GameState;
use sb_dialogue::{
    Conversation, DialogueEngine, EffectOutcome, EffectRecord, EngineConfig, Opening,
    RenderedNode, TranscriptEntry, Transition,
};

use super::plural;

/// Optional inputs for a play-through.
pub struct PlayOptions<'a> {
    pub state: Option<&'a Path>,
    pub save: Option<&'a Path>,
    pub choices: &'a [usize],
    pub config: Option<&'a Path>,
}

/// Where the player's picks come from.
enum ChoiceSource<'a> {
    Scripted(std::slice::Iter<'a, usize>),
    Stdin(io::StdinLock<'static>),
}

impl ChoiceSource<'_> {
    /// The next 1-based pick, or `None` when the player walks away.
    fn next(&mut self, available: usize) -> Result<Option<usize>, String> {
        match self {
            Self::Scripted(picks) => match picks.next() {
                Some(&pick) if (1..=available).contains(&pick) => Ok(Some(pick)),
                Some(&pick) => Err(format!(
                    "scripted choice {pick} is not between 1 and {available}"
                )),
                None => Ok(None),
            },
            Self::Stdin(input) => loop {
                print!("  > ");
                io::stdout().flush().map_err(|e| e.to_string())?;
                let mut line = String::new();
                if input.read_line(&mut line).map_err(|e| e.to_string())? == 0 {
                    return Ok(None);
                }
                let line = line.trim();
                if line.eq_ignore_ascii_case("q") {
                    return Ok(None);
                }
                match line.parse::<usize>() {
                    Ok(pick) if (1..=available).contains(&pick) => return Ok(Some(pick)),
                    _ => println!("  Pick a number between 1 and {available}, or q to leave."),
                }
            },
        }
    }
}

pub fn run(dir: &Path, npc: &str, options: PlayOptions<'_>) -> Result<(), String> {
    let config = match options.config {
        Some(path) => EngineConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    let registry = super::load_registry(dir, config.strict_content)?;
    let mut state = super::load_state(options.state)?;
    let engine = DialogueEngine::new(registry).with_config(config);

    let Some(opening) = engine.open(npc, &state) else {
        println!("  {npc} has nothing to say.");
        return Ok(());
    };
    tracing::info!(npc, tree = %opening.tree().id, "conversation started");
    state.record_conversation(npc);

    let mut source = if options.choices.is_empty() {
        ChoiceSource::Stdin(io::stdin().lock())
    } else {
        ChoiceSource::Scripted(options.choices.iter())
    };

    // Effects applied before a failure are still saved.
    let walked = walk(opening, &mut state, &mut source);
    if let Some(path) = options.save {
        super::save_state(path, &state)?;
        println!("  State saved to {}", path.display());
    }
    walked
}

fn walk(
    opening: Opening<'_>,
    state: &mut GameState,
    source: &mut ChoiceSource<'_>,
) -> Result<(), String> {
    let (mut convo, mut node) = opening.enter(state).map_err(|e| e.to_string())?;

    loop {
        print_node(&node);
        if node.is_terminal() {
            break;
        }
        let Some(pick) = source.next(node.choices.len())? else {
            println!("  {}", "(you walk away)".dimmed());
            convo.leave();
            break;
        };
        println!("  {} {}", "You:".bold(), node.choices[pick - 1].text);

        let transition = convo.choose(pick - 1, state).map_err(|e| e.to_string())?;
        print_choice_effects(&convo);
        match transition {
            Transition::Next(next) => {
                node = convo.enter(&next, state).map_err(|e| e.to_string())?;
            }
            Transition::End => break,
        }
    }

    println!();
    println!("  {}", "Conversation over.".dimmed());

    let diagnostics = convo.diagnostics();
    if !diagnostics.is_empty() {
        println!(
            "  {} content diagnostic{} (see log output)",
            diagnostics.len(),
            plural(diagnostics.len())
        );
    }
    Ok(())
}

fn print_node(node: &RenderedNode) {
    println!();
    if let Some(expr) = &node.expression {
        println!("  {}", format!("[{expr}]").dimmed());
    }
    println!("  {}", node.text);
    print_effects(&node.effects);
    if !node.choices.is_empty() {
        println!();
        for choice in &node.choices {
            println!("  {}. {}", choice.index + 1, choice.text);
        }
    }
}

fn print_choice_effects(convo: &Conversation<'_>) {
    if let Some(TranscriptEntry::Chose { effects, .. }) = convo.transcript().last() {
        print_effects(effects);
    }
}

fn print_effects(effects: &[EffectRecord]) {
    for record in effects {
        let line = format!("» {}", record.effect);
        match record.outcome {
            EffectOutcome::Applied => println!("  {}", line.cyan()),
            EffectOutcome::Clamped => println!("  {} {}", line.yellow(), "(clamped)".dimmed()),
            EffectOutcome::NoOp => println!("  {} {}", line.dimmed(), "(no effect)".dimmed()),
        }
    }
}
