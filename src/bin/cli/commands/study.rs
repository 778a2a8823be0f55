use std::io::{BufRead, Write};

use anyhow::Result;
use chrono::Utc;

use recall_lib::flashcards::algorithm::{format_interval, preview};
use recall_lib::CardId;

use crate::app::App;
use crate::render::terminal::{self, Color};

/// Review due cards, reading ratings from `input`. Returns how many cards
/// were reviewed. End of input stops the session early; reviews made so far
/// are kept.
pub fn run<R: BufRead, W: Write>(
    app: &mut App,
    max: Option<usize>,
    input: &mut R,
    output: &mut W,
    use_color: bool,
) -> Result<usize> {
    let max = max.unwrap_or(app.config.max_study);
    let default_hardness = app.config.default_hardness;

    let due: Vec<CardId> = app
        .deck
        .due_cards(Utc::now())
        .map(|c| c.id)
        .take(max)
        .collect();

    if due.is_empty() {
        writeln!(output, "No cards due.")?;
        return Ok(0);
    }

    let mut studied = 0;
    for id in due {
        let card = app.find_card(id)?.clone();

        writeln!(output)?;
        writeln!(output, "{}", terminal::paint(&card.prompt, Color::BOLD, use_color))?;
        if read_line(input, output, "Press ENTER to see the ANSWER")?.is_none() {
            break;
        }

        writeln!(output, "{}", terminal::paint(&card.answer, Color::GREEN, use_color))?;
        let choices = preview(&card)
            .iter()
            .zip(1..)
            .map(|(days, hardness)| format!("{}: {}", hardness, format_interval(*days)))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(output, "{}", terminal::paint(&choices, Color::DIM, use_color))?;

        let Some(hardness) = read_hardness(input, output, default_hardness)? else {
            break;
        };

        app.deck.review(id, hardness)?;
        studied += 1;
    }

    app.sync()?;

    let noun = if studied == 1 { "card" } else { "cards" };
    writeln!(output, "\nStudied {} {}.", studied, noun)?;
    Ok(studied)
}

/// Parse a typed rating. Blank input means `default`.
pub fn parse_hardness(input: &str, default: i32) -> std::result::Result<i32, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }

    match trimmed.parse::<i32>() {
        Ok(hardness) if (1..=5).contains(&hardness) => Ok(hardness),
        Ok(hardness) => Err(format!("Hardness must be between 1 and 5, got {}", hardness)),
        Err(e) => Err(format!("Error reading hardness: {}", e)),
    }
}

fn read_hardness<R: BufRead, W: Write>(input: &mut R, output: &mut W, default: i32) -> Result<Option<i32>> {
    loop {
        let Some(line) = read_line(input, output, "Enter HARDNESS (1-5) and hit ENTER> ")? else {
            return Ok(None);
        };
        match parse_hardness(&line, default) {
            Ok(hardness) => return Ok(Some(hardness)),
            Err(message) => writeln!(output, "{}", message)?,
        }
    }
}

/// Print `message` and read one line; None at end of input
fn read_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, message: &str) -> Result<Option<String>> {
    write!(output, "{} ", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
