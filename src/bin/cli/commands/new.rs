use anyhow::{bail, Result};

use recall_lib::{Card, CardId};

use crate::app::App;
use crate::editor::Editor;
use crate::OutputFormat;

const PROMPT_PLACEHOLDER: &str = "Write the PROMPT here, then save and quit";
const ANSWER_PLACEHOLDER: &str = "Write the ANSWER here, then save and quit";

pub fn run(
    app: &mut App,
    prompt: Option<String>,
    answer: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    // Gather all text before touching the deck, so an editor failure adds nothing
    let (prompt, answer) = match (prompt, answer) {
        (Some(prompt), Some(answer)) => (prompt, answer),
        (prompt, answer) => {
            let editor = app.editor()?;
            let prompt = match prompt {
                Some(prompt) => prompt,
                None => author(&editor, "prompt", PROMPT_PLACEHOLDER)?,
            };
            let answer = match answer {
                Some(answer) => answer,
                None => author(&editor, "answer", ANSWER_PLACEHOLDER)?,
            };
            (prompt, answer)
        }
    };

    let id = create(app, prompt, answer)?;

    match format {
        OutputFormat::Json => {
            let card = app.find_card(id)?;
            println!("{}", serde_json::to_string_pretty(card)?);
        }
        OutputFormat::Plain => println!("Created card {}", id),
    }

    Ok(())
}

/// Add a card and write it out
pub fn create(app: &mut App, prompt: String, answer: String) -> Result<CardId> {
    if prompt.trim().is_empty() {
        bail!("Empty prompt, card not created");
    }

    let id = app.deck.add_card(Card::new(prompt, answer))?;
    app.sync()?;
    Ok(id)
}

fn author(editor: &Editor, label: &str, placeholder: &str) -> Result<String> {
    let text = editor.edit(label, placeholder)?;
    if text == placeholder {
        bail!("The {} was left unchanged, card not created", label);
    }
    Ok(text)
}
