use std::sync::OnceLock;

use regex::Regex;

static WHITESPACE: OnceLock<Regex> = OnceLock::new();

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Wrap `text` in an ANSI style when color is enabled
pub fn paint(text: &str, style: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", style, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Collapse all whitespace runs (newlines included) into single spaces and
/// cut the result to `max_chars`, marking the cut with "..."
pub fn one_line(text: &str, max_chars: usize) -> String {
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let flat = whitespace.replace_all(text.trim(), " ");

    if flat.chars().count() <= max_chars {
        flat.into_owned()
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Left-align `rows` into columns separated by two spaces
pub fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: Vec<&str>| {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if i == last {
                    cell.to_string()
                } else {
                    format!("{:<width$}", cell, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![format_row(header.to_vec())];
    let divider: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    lines.push(format_row(divider.iter().map(String::as_str).collect()));
    for row in rows {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }

    lines.join("\n")
}
