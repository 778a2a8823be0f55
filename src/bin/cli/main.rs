mod app;
mod commands;
mod editor;
mod render;
mod shell;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall_lib::CardId;

#[derive(Parser)]
#[command(name = "recall", about = "Spaced-repetition flashcards", version)]
struct Cli {
    /// Deck file to open (default: from config, then the data directory)
    #[arg(long, global = true)]
    deck: Option<PathBuf>,

    /// Config file (default: <config dir>/recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Count the cards due for review
    Due,

    /// List all cards in the deck
    List,

    /// Show a card's prompt and answer
    Show {
        /// Card id
        id: CardId,
    },

    /// Create a new card (opens $EDITOR for anything not given)
    New {
        /// Prompt text
        #[arg(long)]
        prompt: Option<String>,
        /// Answer text
        #[arg(long)]
        answer: Option<String>,
    },

    /// Edit a card's prompt and answer in $EDITOR
    Edit {
        /// Card id
        id: CardId,
    },

    /// Delete a card by id
    Del {
        /// Card id
        id: CardId,
    },

    /// Study all due cards
    Study {
        /// Maximum cards to review (default: max_study from config)
        #[arg(long)]
        max: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    let mut app = app::App::open(cli.config.as_deref(), cli.deck.as_deref())?;

    let result = match cli.command {
        // No subcommand starts the interactive shell
        None => shell::run(&mut app, use_color),
        Some(Command::Due) => commands::due::run(&app, &cli.format),
        Some(Command::List) => commands::list::run(&app, &cli.format, use_color),
        Some(Command::Show { id }) => commands::show::run(&app, id, &cli.format, use_color),
        Some(Command::New { prompt, answer }) => {
            commands::new::run(&mut app, prompt, answer, &cli.format)
        }
        Some(Command::Edit { id }) => commands::edit::run(&mut app, id),
        Some(Command::Del { id }) => commands::del::run(&mut app, id),
        Some(Command::Study { max }) => {
            let stdin = std::io::stdin();
            commands::study::run(&mut app, max, &mut stdin.lock(), &mut std::io::stdout(), use_color)
                .map(|_| ())
        }
    };

    // Close even when the command failed, but report the command's error first
    let closed = app.close();
    result?;
    closed
}
