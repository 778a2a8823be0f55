use anyhow::Result;
use chrono::Utc;

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let due = app.deck.due_cards(Utc::now()).count();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "due": due,
                "total": app.deck.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let noun = if due == 1 { "card" } else { "cards" };
            println!("{} {} due.", due, noun);
        }
    }

    Ok(())
}
