//! CLI frontend for the Sagebrush dialogue engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "sagebrush",
    about = "Sagebrush: check, inspect and play dialogue trees",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate dialogue content and report errors and warnings
    Check {
        /// Directory containing .json dialogue files (default: current directory)
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Quest catalog to check quest ids and stages against
        #[arg(long)]
        quests: Option<PathBuf>,
    },

    /// List dialogue trees
    List {
        /// Filter by tag (usually an NPC id)
        #[arg(short, long)]
        tag: Option<String>,

        /// Directory containing .json dialogue files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Show the entry points and nodes of a dialogue tree
    Show {
        /// Tree id
        tree: String,

        /// Directory containing .json dialogue files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Game state (JSON) to evaluate entry points against
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// NPC the conversation is with (default: the tree's first tag)
        #[arg(short, long)]
        npc: Option<String>,
    },

    /// Talk to an NPC in the terminal
    Play {
        /// NPC id (trees tagged with it are candidates)
        npc: String,

        /// Directory containing .json dialogue files
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Game state (JSON) to start from (default: a new game)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Write the game state here when the conversation ends
        #[arg(long)]
        save: Option<PathBuf>,

        /// Scripted choices, numbered from 1 as displayed (default: read stdin)
        #[arg(short, long, value_delimiter = ',')]
        choices: Vec<usize>,

        /// Engine configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sagebrush=info,sb_dialogue=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { dir, quests } => commands::check::run(&dir, quests.as_deref()),
        Commands::List { tag, dir } => commands::list::run(&dir, tag.as_deref()),
        Commands::Show {
            tree,
            dir,
            state,
            npc,
        } => commands::show::run(&dir, &tree, state.as_deref(), npc.as_deref()),
        Commands::Play {
            npc,
            dir,
            state,
            save,
            choices,
            config,
        } => commands::play::run(
            &dir,
            &npc,
            commands::play::PlayOptions {
                state: state.as_deref(),
                save: save.as_deref(),
                choices: &choices,
                config: config.as_deref(),
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
