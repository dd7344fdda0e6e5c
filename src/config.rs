//! Runtime configuration
//!
//! Settings come from command-line flags, which fall back to environment
//! variables (wired up by clap in the binary), which fall back to the defaults
//! below.

use crate::{Result, ThoughtBotError};
use clap::ValueEnum;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Name of the data file inside the application data directory
pub const DEFAULT_FILENAME: &str = "data.json";

/// Directory created under the platform data directory
pub const APP_DIR: &str = "thoughtbot";

/// Narrowest width text is wrapped to
pub const MIN_WIDTH: usize = 20;

/// What `edit <entry> tags_ thought_ ...` means when no tags follow the marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmptyTagsPolicy {
    /// Leave the entry's tags untouched
    #[default]
    Keep,
    /// Remove the entry from all of its tags
    Clear,
}

/// Resolved settings for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// JSON file holding the tags and entries
    pub data_file: PathBuf,
    /// Meaning of an empty tag list in `edit`
    pub empty_tags: EmptyTagsPolicy,
    /// Fixed wrap width; `None` follows the terminal
    pub width: Option<usize>,
}

impl Config {
    /// Builds a config, filling in the default data file when none is given.
    pub fn resolve(
        data_file: Option<PathBuf>,
        empty_tags: EmptyTagsPolicy,
        width: Option<usize>,
    ) -> Result<Self> {
        let data_file = match data_file {
            Some(path) => path,
            None => default_data_file()?,
        };
        Ok(Self {
            data_file,
            empty_tags,
            width: width.map(|w| w.max(MIN_WIDTH)),
        })
    }
}

/// `<platform data dir>/thoughtbot/data.json`, creating the directory if needed
pub fn default_data_file() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        ThoughtBotError::IoError(io::Error::new(
            io::ErrorKind::NotFound,
            "could not determine data directory for your platform",
        ))
    })?;
    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join(DEFAULT_FILENAME))
}
