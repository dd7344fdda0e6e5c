use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{BasicHistory, Input};
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use thoughtbot::command::{self, check_tag_names, parse_line, Command};
use thoughtbot::config::{Config, EmptyTagsPolicy};
use thoughtbot::persist::{JsonFileStore, SnapshotStore};
use thoughtbot::session::{Outcome, Session};
use thoughtbot::{ui, EntryId, TagEdit, ThoughtBotError};

/// Entries remembered by the shell's up-arrow history
const HISTORY_SIZE: usize = 100;

/// Command-line arguments
#[derive(Parser)]
#[command(author, version, about = "Jot down short thoughts and find them again by tag", long_about = None)]
struct Cli {
    /// Path to the thoughts JSON file
    #[arg(short, long, value_name = "FILE", env = "THOUGHTBOT_FILE")]
    file: Option<PathBuf>,

    /// What an edit with an empty tag list does to the entry's tags
    #[arg(long, value_enum, env = "THOUGHTBOT_EMPTY_TAGS", default_value_t = EmptyTagsPolicy::Keep)]
    empty_tags: EmptyTagsPolicy,

    /// Wrap thoughts to this many columns instead of following the terminal
    #[arg(long, value_name = "COLUMNS", env = "THOUGHTBOT_WIDTH")]
    width: Option<usize>,

    /// Command to run; starts the interactive shell if omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a thought
    New {
        /// Tags for the thought (can be repeated)
        #[arg(short, long = "tag", required = true)]
        tags: Vec<String>,

        /// The thought itself
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show the thoughts carrying every given tag, or all thoughts
    Load {
        /// Tags to filter by
        tags: Vec<String>,
    },

    /// List all tags, or the tags of one entry
    Tags {
        /// Entry number
        id: Option<EntryId>,
    },

    /// Delete a thought
    Delete {
        /// Entry number
        id: EntryId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Replace the tags and/or the text of a thought
    Edit {
        /// Entry number
        id: EntryId,

        /// New tags (can be repeated); replaces all current tags
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Remove the thought from all of its tags
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        /// New text
        #[arg(long)]
        text: Option<String>,
    },

    /// Start the interactive shell
    Shell,
}

impl Commands {
    fn into_command(self) -> thoughtbot::Result<Command> {
        match self {
            Commands::New { tags, text } => {
                check_tag_names(&tags)?;
                Ok(Command::New {
                    tags,
                    text: text.join(" "),
                })
            }
            Commands::Load { tags } => {
                check_tag_names(&tags)?;
                Ok(Command::Load { tags })
            }
            Commands::Tags { id } => Ok(Command::Tags { id }),
            Commands::Delete { id, .. } => Ok(Command::Delete { id }),
            Commands::Edit {
                id,
                tags,
                clear_tags,
                text,
            } => {
                let tags = if clear_tags {
                    TagEdit::Clear
                } else if tags.is_empty() {
                    TagEdit::Keep
                } else {
                    check_tag_names(&tags)?;
                    TagEdit::Replace(tags)
                };
                let text = text.filter(|t| !t.trim().is_empty());
                if matches!(tags, TagEdit::Keep) && text.is_none() {
                    return Err(ThoughtBotError::NothingToEdit);
                }
                Ok(Command::Edit { id, tags, text })
            }
            Commands::Shell => unreachable!("the shell is not a single command"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("THOUGHTBOT_LOG", "warn"))
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.file, cli.empty_tags, cli.width)
        .context("Could not determine data directory for your platform")?;
    log::debug!("using data file {}", config.data_file.display());

    let mut session = Session::open(JsonFileStore::new(&config.data_file)).with_context(|| {
        format!("Failed to load thoughts from {}", config.data_file.display())
    })?;

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(&mut session, &config),
        Commands::Delete { id, force } => delete_thought(&mut session, &config, id, force),
        other => {
            let command = other.into_command()?;
            run_command(&mut session, &config, command)?;
            Ok(())
        }
    }
}

/// Runs one command and prints its result. Returns `false` when the shell should stop.
fn run_command<S: SnapshotStore>(
    session: &mut Session<S>,
    config: &Config,
    command: Command,
) -> thoughtbot::Result<bool> {
    let single_entry_tags = matches!(command, Command::Tags { id: Some(_) });

    match session.execute(command)? {
        Outcome::Added(id) => println!("Thought {} added", id.to_string().green()),
        Outcome::Entries(entries) => {
            ui::print_entries(&entries, ui::display_width(config.width))
        }
        Outcome::Tags(tags) if single_entry_tags => ui::print_entry_tags(&tags),
        Outcome::Tags(tags) => ui::print_tags(&tags),
        Outcome::Edited(id) => println!("Thought {} updated", id.to_string().green()),
        Outcome::Deleted(id) => println!("Thought {} deleted", id.to_string().green()),
        Outcome::Help => ui::print_help(command::usage()),
        Outcome::Exit => return Ok(false),
    }
    Ok(true)
}

/// Delete a thought, asking first unless forced
fn delete_thought<S: SnapshotStore>(
    session: &mut Session<S>,
    config: &Config,
    id: EntryId,
    force: bool,
) -> Result<()> {
    if !session.store().contains(id) {
        return Err(ThoughtBotError::EntryNotFound(id).into());
    }

    if !force {
        if io::stdin().is_terminal() {
            let text = session.store().get(id).unwrap_or_default();
            println!("{}", ui::format_entry(id, text, ui::display_width(config.width)).dimmed());
            if !ui::confirm(&format!("Are you sure you want to delete thought {}?", id), false)? {
                println!("Deletion cancelled");
                return Ok(());
            }
        } else {
            // In non-interactive mode, we should require the --force flag
            return Err(anyhow::anyhow!(
                "Deletion requires --force flag in non-interactive mode"
            ));
        }
    }

    run_command(session, config, Command::Delete { id })?;
    Ok(())
}

/// Read commands until `exit` or end of input
fn run_shell<S: SnapshotStore>(session: &mut Session<S>, config: &Config) -> Result<()> {
    if !io::stdin().is_terminal() {
        for line in io::stdin().lock().lines() {
            let line = line.context("Failed to read from stdin")?;
            if !shell_line(session, config, &line) {
                break;
            }
        }
        return Ok(());
    }

    println!(
        "{}",
        "Type `help` for the list of commands, `exit` to leave.".dimmed()
    );
    let theme = ui::ShellTheme;
    let mut history = BasicHistory::new()
        .max_entries(HISTORY_SIZE)
        .no_duplicates(true);

    loop {
        let line = Input::<String>::with_theme(&theme)
            .with_prompt("thoughtbot")
            .allow_empty(true)
            .history_with(&mut history)
            .interact_text();
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                // Ctrl-D / Ctrl-C
                log::debug!("prompt closed: {}", e);
                break;
            }
        };
        if !shell_line(session, config, &line) {
            break;
        }
    }
    Ok(())
}

/// Runs one shell line, printing any error. Returns `false` on `exit`.
fn shell_line<S: SnapshotStore>(session: &mut Session<S>, config: &Config, line: &str) -> bool {
    if line.trim().is_empty() {
        return true;
    }
    let result = parse_line(line, config.empty_tags)
        .and_then(|command| run_command(session, config, command));
    match result {
        Ok(keep_going) => keep_going,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            true
        }
    }
}
