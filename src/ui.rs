//! Terminal rendering for thoughtbot
//!
//! The `format_*` and `wrap_*` functions are pure and return plain text; the
//! `print_*` functions add color and write to stdout.

use console::{measure_text_width, style, Term};
use dialoguer::theme::{ColorfulTheme, Theme};
use dialoguer::Confirm;
use std::fmt;

use crate::config::MIN_WIDTH;
use crate::EntryId;

/// Columns reserved for the entry number; continuation lines are indented by the same amount
pub const ID_COLUMN: usize = 8;

/// Width used when stdout is not a terminal
pub const FALLBACK_WIDTH: usize = 60;

/// Columns left free on the right of a terminal
const TERMINAL_MARGIN: usize = 20;

/// Format a string with the given width for display
pub fn format_column(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// UI Theme to use consistently throughout the application
pub fn get_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Prompt theme for the shell: `thoughtbot > `
pub struct ShellTheme;

impl Theme for ShellTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{} > ", prompt)
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{} > {}", prompt, sel)
    }
}

/// Wrap width for a terminal with the given number of columns.
pub fn width_for_columns(columns: Option<u16>) -> usize {
    match columns {
        Some(columns) => (columns as usize)
            .saturating_sub(TERMINAL_MARGIN)
            .max(MIN_WIDTH),
        None => FALLBACK_WIDTH,
    }
}

/// The configured width, or one derived from the current terminal
pub fn display_width(configured: Option<usize>) -> usize {
    match configured {
        Some(width) => width,
        None => width_for_columns(Term::stdout().size_checked().map(|(_rows, cols)| cols)),
    }
}

/// Greedy word wrap. Words longer than `width` get a line of their own;
/// explicit newlines in the text are kept.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_width = 0;
        for word in paragraph.split_whitespace() {
            let word_width = measure_text_width(word);
            if line_width > 0 && line_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            if line_width > 0 {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn id_prefix(id: EntryId) -> String {
    let id = id.to_string();
    // Always leave at least one space between a long number and the text
    let column = ID_COLUMN.max(id.len() + 1);
    format_column(&id, column)
}

/// Wrapped text of an entry, continuation lines indented to the text column
fn entry_body(text: &str, width: usize) -> String {
    let indent = format!("\n{}", " ".repeat(ID_COLUMN));
    wrap_text(text, width.saturating_sub(ID_COLUMN)).join(&indent)
}

/// One entry as display lines: the number padded to the id column, then the
/// wrapped text with continuation lines indented to line up.
pub fn format_entry(id: EntryId, text: &str, width: usize) -> String {
    format!("{}{}", id_prefix(id), entry_body(text, width))
}

/// All entries of a `load`, surrounded by blank lines
pub fn format_entries(entries: &[(EntryId, String)], width: usize) -> String {
    let mut out = String::from("\n");
    for (id, text) in entries {
        out.push_str(&format_entry(*id, text, width));
        out.push('\n');
    }
    out.push('\n');
    out
}

/// Print entries with the entry numbers highlighted
pub fn print_entries(entries: &[(EntryId, String)], width: usize) {
    if entries.is_empty() {
        println!("\n{}\n", style("No thoughts found").italic().dim());
        return;
    }
    if !console::colors_enabled() {
        print!("{}", format_entries(entries, width));
        return;
    }

    println!();
    for (id, text) in entries {
        println!(
            "{}{}",
            style(id_prefix(*id)).blue().bold(),
            entry_body(text, width)
        );
    }
    println!();
}

/// Print every tag, one per line
pub fn print_tags(tags: &[String]) {
    if tags.is_empty() {
        println!("{}", style("No tags yet").italic().dim());
        return;
    }
    for tag in tags {
        println!("{}", style(tag).yellow());
    }
}

/// Print the tags of one entry on a single line
pub fn print_entry_tags(tags: &[String]) {
    if tags.is_empty() {
        println!("{}", style("(no tags)").italic().dim());
    } else {
        println!("{}", style(tags.join(" ")).yellow());
    }
}

/// Print the shell usage
pub fn print_help(usage: &str) {
    println!("\n{}", style("Commands:").bold());
    println!("{}\n", usage);
}

/// Confirmation dialog with enhanced styling
pub fn confirm(message: &str, default: bool) -> anyhow::Result<bool> {
    Ok(Confirm::with_theme(&get_theme())
        .with_prompt(message)
        .default(default)
        .interact()?)
}
