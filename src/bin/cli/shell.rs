//! Interactive shell, entered when `recall` runs without a subcommand

use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{bail, Context, Result};

use recall_lib::CardId;

use crate::app::App;
use crate::commands;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

const PROMPT: &str = "recall> ";

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

type Handler = fn(&Shell, &mut App, &[&str]) -> Result<Flow>;

struct Entry {
    run: Handler,
    help: &'static str,
}

struct Shell {
    commands: BTreeMap<&'static str, Entry>,
    use_color: bool,
}

impl Shell {
    fn new(use_color: bool) -> Self {
        let mut shell = Self {
            commands: BTreeMap::new(),
            use_color,
        };

        shell.register("del", del, "del ID: delete a card");
        shell.register("due", due, "due: count the cards due for review");
        shell.register("edit", edit, "edit ID: edit a card in the editor");
        shell.register("list", list, "list: list every card");
        shell.register("new", new, "new: create a card in the editor");
        shell.register("quit", quit, "quit: sync and leave");
        shell.register("show", show, "show ID: print a card");
        shell.register("study", study, "study [MAX]: review due cards");
        shell.register("?", help, "?: show this help");
        shell.register("help", help, "help: show this help");

        shell
    }

    fn register(&mut self, name: &'static str, run: Handler, help: &'static str) {
        self.commands.insert(name, Entry { run, help });
    }

    fn help_text(&self) -> String {
        self.commands
            .values()
            .map(|entry| format!("  {}", entry.help))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Run one input line
    fn dispatch(&self, app: &mut App, line: &str) -> Result<Flow> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((name, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };

        match self.commands.get(*name) {
            Some(entry) => (entry.run)(self, app, args),
            None => bail!("Unknown command '{}'. Enter ? for help", name),
        }
    }
}

/// Read commands from stdin until `quit` or end of input
pub fn run(app: &mut App, use_color: bool) -> Result<()> {
    let shell = Shell::new(use_color);

    println!("Opened deck {}", app.deck.path().display());
    let noun = if app.deck.len() == 1 { "card" } else { "cards" };
    println!("{} {}. Enter ? for help", app.deck.len(), noun);

    let stdin = io::stdin();
    loop {
        print!("{}", terminal::paint(PROMPT, Color::BOLD, use_color));
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            println!();
            break;
        }

        match shell.dispatch(app, &line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => eprintln!("{}", terminal::paint(&format!("{:#}", e), Color::YELLOW, use_color)),
        }
    }

    app.sync()
}

/// Parse the single card id argument
fn parse_id(args: &[&str]) -> Result<CardId> {
    match args {
        [id] => id
            .parse::<CardId>()
            .with_context(|| format!("Invalid card id '{}'", id)),
        [] => bail!("Missing card id"),
        _ => bail!("Expected a single card id"),
    }
}

fn del(_shell: &Shell, app: &mut App, args: &[&str]) -> Result<Flow> {
    commands::del::run(app, parse_id(args)?)?;
    Ok(Flow::Continue)
}

fn due(_shell: &Shell, app: &mut App, _args: &[&str]) -> Result<Flow> {
    commands::due::run(app, &OutputFormat::Plain)?;
    Ok(Flow::Continue)
}

fn edit(_shell: &Shell, app: &mut App, args: &[&str]) -> Result<Flow> {
    commands::edit::run(app, parse_id(args)?)?;
    Ok(Flow::Continue)
}

fn list(shell: &Shell, app: &mut App, _args: &[&str]) -> Result<Flow> {
    commands::list::run(app, &OutputFormat::Plain, shell.use_color)?;
    Ok(Flow::Continue)
}

fn new(_shell: &Shell, app: &mut App, _args: &[&str]) -> Result<Flow> {
    commands::new::run(app, None, None, &OutputFormat::Plain)?;
    Ok(Flow::Continue)
}

fn quit(_shell: &Shell, _app: &mut App, _args: &[&str]) -> Result<Flow> {
    Ok(Flow::Quit)
}

fn show(shell: &Shell, app: &mut App, args: &[&str]) -> Result<Flow> {
    commands::show::run(app, parse_id(args)?, &OutputFormat::Plain, shell.use_color)?;
    Ok(Flow::Continue)
}

fn study(shell: &Shell, app: &mut App, args: &[&str]) -> Result<Flow> {
    let max = match args {
        [] => None,
        [max] | ["--max", max] => Some(
            max.parse::<usize>()
                .with_context(|| format!("Invalid card count '{}'", max))?,
        ),
        _ => bail!("Usage: study [MAX]"),
    };

    commands::study::run(
        app,
        max,
        &mut io::stdin().lock(),
        &mut io::stdout(),
        shell.use_color,
    )?;
    Ok(Flow::Continue)
}

fn help(shell: &Shell, _app: &mut App, _args: &[&str]) -> Result<Flow> {
    println!("{}", shell.help_text());
    Ok(Flow::Continue)
}
