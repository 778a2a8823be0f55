use anyhow::Result;
use chrono::Utc;

use recall_lib::flashcards::algorithm::format_due;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

/// Prompt characters shown per row
const PROMPT_WIDTH: usize = 42;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(app.deck.cards())?);
        }
        OutputFormat::Plain => {
            if app.deck.is_empty() {
                println!("(no cards)");
                return Ok(());
            }

            let now = Utc::now();
            let rows: Vec<Vec<String>> = app
                .deck
                .cards()
                .iter()
                .map(|card| {
                    vec![
                        card.id.to_string(),
                        card.repetitions.to_string(),
                        format_due(card.next_due, now),
                        terminal::one_line(&card.prompt, PROMPT_WIDTH),
                    ]
                })
                .collect();

            let table = terminal::table(&["Id", "Reps", "Due", "Prompt"], &rows);
            let mut lines = table.lines();
            if let Some(header) = lines.next() {
                println!("{}", terminal::paint(header, Color::BOLD, use_color));
            }
            for line in lines {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
