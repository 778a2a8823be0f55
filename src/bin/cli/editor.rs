//! External editor support
//!
//! Card text is authored by writing it to a scratch file, handing that file
//! to the user's editor and reading it back once the editor exits.

use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};

pub struct Editor {
    command: String,
}

impl Editor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// The configured editor, else $VISUAL, else $EDITOR
    pub fn resolve(configured: Option<&str>) -> Result<Self> {
        let command = configured
            .map(str::to_string)
            .filter(|c| !c.trim().is_empty())
            .or_else(|| env_var("VISUAL"))
            .or_else(|| env_var("EDITOR"))
            .context("No editor configured: set $EDITOR or `editor` in config.toml")?;
        Ok(Self::new(command))
    }

    /// Let the user edit `initial` and return the saved text
    pub fn edit(&self, label: &str, initial: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix(&format!("recall.{}.", label))
            .suffix(".txt")
            .tempfile()
            .context("Failed to create scratch file")?;
        file.write_all(initial.as_bytes())?;
        file.flush()?;

        let status = self
            .command_for(file.path())
            .status()
            .with_context(|| format!("Failed to launch editor '{}'", self.command))?;
        if !status.success() {
            bail!("Editor '{}' exited with {}", self.command, status);
        }

        log::debug!("Read back {} from {:?}", label, file.path());
        let text = fs::read_to_string(file.path())?;
        Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    #[cfg(not(windows))]
    fn command_for(&self, path: &std::path::Path) -> Command {
        // Through the shell so the editor setting may carry its own arguments
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c")
            .arg(format!("{} \"$1\"", self.command))
            .arg("sh")
            .arg(path);
        cmd
    }

    #[cfg(windows)]
    fn command_for(&self, path: &std::path::Path) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(&self.command).arg(path);
        cmd
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_file_returns_initial_text() {
        let editor = Editor::new("true");
        let text = editor.edit("prompt", "line one\nline two\n").unwrap();
        assert_eq!(text, "line one\nline two");
    }

    #[test]
    fn test_reads_back_edited_text() {
        let editor = Editor::new("printf 'edited answer\\n' >");
        let text = editor.edit("answer", "placeholder").unwrap();
        assert_eq!(text, "edited answer");
    }

    #[test]
    fn test_failing_editor_is_an_error() {
        let editor = Editor::new("false");
        assert!(editor.edit("prompt", "x").is_err());
    }

    #[test]
    fn test_configured_editor_wins() {
        let editor = Editor::resolve(Some("nano")).unwrap();
        assert_eq!(editor.command, "nano");
    }
}
