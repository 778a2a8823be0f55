use anyhow::Result;
use chrono::Utc;

use recall_lib::flashcards::algorithm::format_due;
use recall_lib::CardId;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, id: CardId, format: &OutputFormat, use_color: bool) -> Result<()> {
    let card = app.find_card(id)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(card)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::paint("PROMPT", Color::BOLD, use_color));
            println!();
            println!("{}", card.prompt);
            println!();
            println!("{}", terminal::paint("ANSWER", Color::BOLD, use_color));
            println!();
            println!("{}", card.answer);
            println!();

            let summary = format!(
                "{} reviews, due {}",
                card.repetitions,
                format_due(card.next_due, Utc::now())
            );
            println!("{}", terminal::paint(&summary, Color::DIM, use_color));
        }
    }

    Ok(())
}
