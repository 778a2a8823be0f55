use anyhow::Result;

use recall_lib::CardId;

use crate::app::App;

pub fn run(app: &mut App, id: CardId) -> Result<()> {
    let card = app.find_card(id)?.clone();
    let editor = app.editor()?;

    let prompt = editor.edit("prompt", &card.prompt)?;
    let answer = editor.edit("answer", &card.answer)?;

    let prompt = (prompt != card.prompt).then_some(prompt);
    let answer = (answer != card.answer).then_some(answer);
    if prompt.is_none() && answer.is_none() {
        println!("Card {} unchanged", id);
        return Ok(());
    }

    app.deck.edit_card(id, prompt, answer)?;
    app.sync()?;

    println!("Updated card {}", id);
    Ok(())
}
