use anyhow::{bail, Result};

use recall_lib::CardId;

use crate::app::App;

pub fn run(app: &mut App, id: CardId) -> Result<()> {
    if !app.deck.delete_card(id) {
        bail!("Unknown card id {}", id);
    }
    app.sync()?;

    println!("Deleted card {}", id);
    Ok(())
}
