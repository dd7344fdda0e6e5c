//! Line commands for the interactive shell
//!
//! A command line is split into whitespace-delimited tokens. The first token is
//! the verb; for `new` and `edit` the standalone marker tokens `tags_` and
//! `thought_` separate the tag list from the free text. Everything after
//! `thought_` is taken verbatim as the text, so the text itself may contain any
//! word, including the markers.
//!
//! ```text
//! new <tag> [tag...] thought_ <text>
//! load [tag...]
//! tags [entry]
//! delete <entry>
//! edit <entry> [tags_ [tag...]] [thought_ <text>]
//! help
//! exit
//! ```
//!
//! Markers are only recognised as whole tokens, and neither marker may be used
//! as a tag name.

use crate::config::EmptyTagsPolicy;
use crate::{EntryId, Result, TagEdit, ThoughtBotError};

/// Token that starts the replacement tag list of `edit`
pub const TAGS_MARKER: &str = "tags_";

/// Token that starts the free text of `new` and `edit`
pub const TEXT_MARKER: &str = "thought_";

/// A parsed shell command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Add a thought with the given tags
    New { tags: Vec<String>, text: String },
    /// Show the thoughts carrying every given tag (all thoughts if none)
    Load { tags: Vec<String> },
    /// List all tags, or the tags of one entry
    Tags { id: Option<EntryId> },
    /// Delete an entry
    Delete { id: EntryId },
    /// Change the tags and/or text of an entry
    Edit {
        id: EntryId,
        tags: TagEdit,
        text: Option<String>,
    },
    /// Show usage
    Help,
    /// Leave the shell
    Exit,
}

impl Command {
    /// Whether running the command changes the store
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::New { .. } | Command::Delete { .. } | Command::Edit { .. }
        )
    }
}

/// Usage text shown by `help`
pub fn usage() -> &'static str {
    "\
new <tag> [tag...] thought_ <text>         add a thought
load [tag...]                              show thoughts carrying every tag
tags [entry]                               list all tags, or the tags of an entry
delete <entry>                             delete a thought
edit <entry> [tags_ [tag...]] [thought_ <text>]
                                           replace the tags and/or the text
help                                       show this message
exit                                       leave thoughtbot"
}

/// Rejects tag names that would collide with the marker tokens.
pub fn check_tag_names<S: AsRef<str>>(tags: &[S]) -> Result<()> {
    for tag in tags {
        let tag = tag.as_ref();
        if tag == TAGS_MARKER || tag == TEXT_MARKER {
            return Err(ThoughtBotError::InvalidTag(tag.to_string()));
        }
        crate::validate_tag(tag)?;
    }
    Ok(())
}

#[derive(Clone, Copy, Debug)]
struct Token<'a> {
    start: usize,
    text: &'a str,
}

impl Token<'_> {
    fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push(Token { start: s, text: &line[s..i] });
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push(Token { start: s, text: &line[s..] });
    }
    tokens
}

fn tag_list(tokens: &[Token<'_>]) -> Result<Vec<String>> {
    let tags: Vec<String> = tokens.iter().map(|t| t.text.to_string()).collect();
    check_tag_names(&tags)?;
    Ok(tags)
}

/// Text after a marker token, trimmed
fn tail<'a>(line: &'a str, marker: &Token<'_>) -> &'a str {
    line[marker.end()..].trim()
}

/// Parses one shell line.
///
/// `policy` decides what `edit <entry> tags_ thought_ ...` means when the tag
/// marker is given without any tags.
///
/// # Examples
///
/// ```
/// use thoughtbot::command::{parse_line, Command};
/// use thoughtbot::config::EmptyTagsPolicy;
///
/// let command = parse_line("new work urgent thought_ finish  the report", EmptyTagsPolicy::Keep).unwrap();
/// assert_eq!(
///     command,
///     Command::New {
///         tags: vec!["work".to_string(), "urgent".to_string()],
///         text: "finish  the report".to_string(),
///     }
/// );
/// ```
pub fn parse_line(line: &str, policy: EmptyTagsPolicy) -> Result<Command> {
    let tokens = tokenize(line);
    let (verb, args) = tokens.split_first().ok_or(ThoughtBotError::EmptyCommand)?;
    // Verbs may carry a trailing underscore: `new_`, `load_`, ...
    let name = verb.text.strip_suffix('_').unwrap_or(verb.text);

    match name {
        "new" => parse_new(line, args),
        "load" => Ok(Command::Load { tags: tag_list(args)? }),
        "tags" => match args {
            [] => Ok(Command::Tags { id: None }),
            [id] => Ok(Command::Tags { id: Some(id.text.parse()?) }),
            [_, extra, ..] => Err(ThoughtBotError::UnexpectedArgument(extra.text.to_string())),
        },
        "delete" => match args {
            [] => Err(ThoughtBotError::MissingEntryId),
            [id] => Ok(Command::Delete { id: id.text.parse()? }),
            [_, extra, ..] => Err(ThoughtBotError::UnexpectedArgument(extra.text.to_string())),
        },
        "edit" => parse_edit(line, args, policy),
        "help" | "?" => Ok(Command::Help),
        "exit" | "quit" => Ok(Command::Exit),
        _ => Err(ThoughtBotError::UnknownCommand(verb.text.to_string())),
    }
}

fn parse_new(line: &str, args: &[Token<'_>]) -> Result<Command> {
    let marker = args
        .iter()
        .position(|t| t.text == TEXT_MARKER)
        .ok_or(ThoughtBotError::MissingMarker(TEXT_MARKER))?;

    let tags = tag_list(&args[..marker])?;
    if tags.is_empty() {
        return Err(ThoughtBotError::MissingTags);
    }
    let text = tail(line, &args[marker]);
    if text.is_empty() {
        return Err(ThoughtBotError::MissingText);
    }

    Ok(Command::New {
        tags,
        text: text.to_string(),
    })
}

fn parse_edit(line: &str, args: &[Token<'_>], policy: EmptyTagsPolicy) -> Result<Command> {
    let (id, rest) = args.split_first().ok_or(ThoughtBotError::MissingEntryId)?;
    let id: EntryId = id.text.parse()?;

    let text_at = rest.iter().position(|t| t.text == TEXT_MARKER);
    let before_text = &rest[..text_at.unwrap_or(rest.len())];

    let tags = match before_text.split_first() {
        None => TagEdit::Keep,
        Some((first, tags)) if first.text == TAGS_MARKER => {
            let tags = tag_list(tags)?;
            if tags.is_empty() {
                match policy {
                    EmptyTagsPolicy::Keep => TagEdit::Keep,
                    EmptyTagsPolicy::Clear => TagEdit::Clear,
                }
            } else {
                TagEdit::Replace(tags)
            }
        }
        Some((first, _)) => {
            return Err(ThoughtBotError::UnexpectedArgument(first.text.to_string()));
        }
    };

    let text = text_at
        .map(|at| tail(line, &rest[at]))
        .filter(|text| !text.is_empty())
        .map(str::to_string);

    if text_at.is_none() && before_text.is_empty() {
        return Err(ThoughtBotError::NothingToEdit);
    }

    Ok(Command::Edit { id, tags, text })
}
