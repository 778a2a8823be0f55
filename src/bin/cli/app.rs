use std::path::Path;

use anyhow::{Context, Result};

use recall_lib::{Card, CardId, Config, Deck};

use crate::editor::Editor;

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
    pub deck: Deck,
}

impl App {
    /// Load the config and open the deck. An explicit deck path wins over
    /// the one in the config.
    pub fn open(config_path: Option<&Path>, deck_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => Config::load(path),
            None => Config::load_default(),
        }
        .context("Failed to load configuration")?;

        let deck_path = match deck_path {
            Some(path) => path.to_path_buf(),
            None => config.deck_path().context("Failed to resolve deck path")?,
        };

        let deck = Deck::open(&deck_path)
            .with_context(|| format!("Failed to open deck {}", deck_path.display()))?;

        Ok(Self { config, deck })
    }

    /// Find a card by id
    pub fn find_card(&self, id: CardId) -> Result<&Card> {
        self.deck
            .card(id)
            .with_context(|| format!("Unknown card id {}", id))
    }

    /// Editor used for authoring card text
    pub fn editor(&self) -> Result<Editor> {
        Editor::resolve(self.config.editor.as_deref())
    }

    /// Write pending changes to disk
    pub fn sync(&mut self) -> Result<()> {
        if !self.deck.is_dirty() {
            return Ok(());
        }
        self.deck
            .sync()
            .with_context(|| format!("Failed to sync deck {}", self.deck.path().display()))
    }

    /// Sync if needed and release the deck
    pub fn close(self) -> Result<()> {
        self.deck.close().context("Failed to close deck")
    }

    #[cfg(test)]
    pub fn for_test(deck: Deck) -> Self {
        Self {
            config: Config::default(),
            deck,
        }
    }
}
