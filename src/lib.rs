//! # ThoughtBot
//!
//! A library for jotting down short thoughts and retrieving them by tag.
//!
//! ThoughtBot keeps every thought ("entry") in a forward index ordered by id and
//! maintains an inverted index from tag name to the ids of the entries carrying
//! that tag. All mutations go through [`ThoughtStore`], which keeps both indexes
//! consistent: a tag never lists an entry that does not exist, and a tag whose
//! list becomes empty is removed on the spot.
//!
//! ## Key Features
//!
//! - **Tagged entries**: every new thought carries one or more tags
//! - **AND filtering**: retrieve the entries that carry all of the given tags
//! - **Stable ids**: entry ids start at 1 and are never reused or shifted
//! - **Line commands**: a small command language for the interactive shell
//! - **Persistence**: the whole store is written to a JSON file after each change
//!
//! ## Example
//!
//! ```
//! use thoughtbot::{EntryId, TagEdit, ThoughtStore};
//!
//! let mut store = ThoughtStore::new();
//!
//! let report = store.add(&["work", "urgent"], "finish report").unwrap();
//! let groceries = store.add(&["home"], "buy milk").unwrap();
//! assert_eq!(report, EntryId::new(1));
//! assert_eq!(groceries, EntryId::new(2));
//!
//! // Entries carrying every requested tag
//! let urgent_work = store.query(&["urgent", "work"]);
//! assert_eq!(urgent_work, vec![(report, "finish report")]);
//!
//! // Replace the tags of an entry
//! store.edit(groceries, TagEdit::Replace(vec!["errands".to_string()]), None).unwrap();
//! assert_eq!(store.list_tags(), vec!["work", "urgent", "errands"]);
//!
//! // Deleting prunes tags left without entries
//! store.delete(report).unwrap();
//! assert_eq!(store.list_tags(), vec!["errands"]);
//! ```
//!
//! ## Command Line Tool
//!
//! ThoughtBot includes a command-line tool called `thoughtbot` with an interactive
//! shell and one-shot subcommands. See the binary documentation for more details.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

pub mod command;
pub mod config;
pub mod persist;
pub mod session;
pub mod ui;

/// Error types for ThoughtBot operations
#[derive(Error, Debug)]
pub enum ThoughtBotError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("No entry with entry number {0}")]
    EntryNotFound(EntryId),

    #[error("Invalid entry number: {0:?}")]
    InvalidEntryId(String),

    #[error("No entry number given")]
    MissingEntryId,

    #[error("No thought given")]
    MissingText,

    #[error("A thought needs at least one tag")]
    MissingTags,

    #[error("Invalid tag: {0:?}")]
    InvalidTag(String),

    #[error("Missing `{0}` marker")]
    MissingMarker(&'static str),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("No command given")]
    EmptyCommand,

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Nothing to edit: give new tags, a new thought, or both")]
    NothingToEdit,

    #[error("No entry numbers left to hand out")]
    IdSpaceExhausted,
}

/// Broad classification of a [`ThoughtBotError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request was malformed; nothing was changed.
    Validation,
    /// The request named an entry that does not exist; nothing was changed.
    NotFound,
    /// Reading or writing the data file failed.
    Storage,
}

impl ThoughtBotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ThoughtBotError::IoError(_)
            | ThoughtBotError::SerializationError(_)
            | ThoughtBotError::IdSpaceExhausted => ErrorKind::Storage,
            ThoughtBotError::EntryNotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

/// Result type for ThoughtBot operations
pub type Result<T> = std::result::Result<T, ThoughtBotError>;

/// Identifier of an entry.
///
/// Ids are handed out from a counter starting at 1. Deleting an entry never
/// renumbers the others, and a deleted id is never handed out again, so an id
/// shown to the user keeps pointing at the same thought.
#[derive(Clone, Copy, Debug, PartialOrd, Ord, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// The id given to the first entry of an empty store.
    pub const FIRST: EntryId = EntryId(1);

    /// Creates an EntryId from its numeric value.
    ///
    /// # Examples
    ///
    /// ```
    /// use thoughtbot::EntryId;
    ///
    /// let id = EntryId::new(3);
    /// assert_eq!(id.get(), 3);
    /// assert_eq!(id.to_string(), "3");
    /// ```
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Numeric value of the id
    pub fn get(self) -> u64 {
        self.0
    }

    /// The following id, or `None` once `u64::MAX` is reached
    fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = ThoughtBotError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(EntryId)
            .map_err(|_| ThoughtBotError::InvalidEntryId(s.to_string()))
    }
}

/// Checks that a tag token can be stored.
///
/// Tags are whitespace-delimited tokens in the command language, so a tag must be
/// non-empty and may not contain whitespace. Any other content is accepted.
///
/// # Examples
///
/// ```
/// use thoughtbot::validate_tag;
///
/// assert!(validate_tag("work").is_ok());
/// assert!(validate_tag("c++").is_ok());
/// assert!(validate_tag("").is_err());
/// assert!(validate_tag("two words").is_err());
/// ```
pub fn validate_tag(tag: &str) -> Result<()> {
    if tag.is_empty() || tag.chars().any(char::is_whitespace) {
        return Err(ThoughtBotError::InvalidTag(tag.to_string()));
    }
    Ok(())
}

/// Validates tag tokens and drops repeats, keeping first-seen order.
fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.as_ref();
        validate_tag(tag)?;
        if !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    Ok(normalized)
}

/// Inverted index from tag name to the ids of the entries carrying it.
///
/// Tags keep the order in which they were first created; that order is what
/// `tags` lists and what is written to the data file. Each id appears at most
/// once per tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagIndex {
    tags: Vec<(String, Vec<EntryId>)>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids listed under a tag, or `None` if the tag does not exist
    pub fn get(&self, tag: &str) -> Option<&[EntryId]> {
        self.position(tag).map(|pos| self.tags[pos].1.as_slice())
    }

    /// Whether the tag exists
    pub fn contains(&self, tag: &str) -> bool {
        self.position(tag).is_some()
    }

    /// Tag names in creation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(name, _)| name.as_str())
    }

    /// Tags and their ids in creation order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[EntryId])> {
        self.tags.iter().map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Appends an id to a tag, creating the tag if needed.
    pub fn push(&mut self, tag: &str, id: EntryId) {
        match self.position(tag) {
            Some(pos) => {
                let ids = &mut self.tags[pos].1;
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => self.tags.push((tag.to_string(), vec![id])),
        }
    }

    /// Removes a tag and returns its ids.
    pub fn remove(&mut self, tag: &str) -> Option<Vec<EntryId>> {
        self.position(tag).map(|pos| self.tags.remove(pos).1)
    }

    /// Removes an id from every tag and drops tags left empty.
    ///
    /// Returns the names of the tags that were dropped.
    pub fn remove_entry(&mut self, id: EntryId) -> Vec<String> {
        let mut pruned = Vec::new();
        self.tags.retain_mut(|(name, ids)| {
            ids.retain(|listed| *listed != id);
            if ids.is_empty() {
                pruned.push(name.clone());
                false
            } else {
                true
            }
        });
        pruned
    }

    /// Tags listing the given id, in creation order
    pub fn tags_of(&self, id: EntryId) -> Vec<&str> {
        self.tags
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn position(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|(name, _)| name == tag)
    }
}

impl Serialize for TagIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tags.len()))?;
        for (name, ids) in &self.tags {
            map.serialize_entry(name, ids)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TagIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TagIndexVisitor;

        impl<'de> Visitor<'de> for TagIndexVisitor {
            type Value = TagIndex;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map from tag name to a list of entry numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<TagIndex, A::Error> {
                let mut index = TagIndex::new();
                while let Some((name, ids)) = access.next_entry::<String, Vec<EntryId>>()? {
                    // A repeated key replaces the earlier list but keeps its position
                    match index.position(&name) {
                        Some(pos) => index.tags[pos].1 = ids,
                        None => index.tags.push((name, ids)),
                    }
                }
                Ok(index)
            }
        }

        deserializer.deserialize_map(TagIndexVisitor)
    }
}

/// The persisted form of a [`ThoughtStore`].
///
/// Serialized as a JSON object with `tags` (tag name to list of entry numbers, in
/// creation order), `entries` (string-encoded entry number to text) and
/// `next_id`. `next_id` may be missing from older files; it is then derived from
/// the largest entry number.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tags: TagIndex,
    #[serde(default)]
    pub entries: BTreeMap<EntryId, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<EntryId>,
}

/// How an edit treats the tags of an entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagEdit {
    /// Leave tag membership untouched
    Keep,
    /// Remove the entry from every tag
    Clear,
    /// Make the entry a member of exactly these tags
    Replace(Vec<String>),
}

/// The tag-indexed note store.
///
/// `ThoughtStore` owns the entries (ordered by id) and the [`TagIndex`], and is
/// the only way to change either. Every operation validates its input before
/// touching any state, so an operation that returns an error leaves the store
/// exactly as it was.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThoughtStore {
    entries: BTreeMap<EntryId, String>,
    tags: TagIndex,
    next_id: EntryId,
}

impl Default for ThoughtStore {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            tags: TagIndex::new(),
            next_id: EntryId::FIRST,
        }
    }
}

impl ThoughtStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from its persisted form.
    ///
    /// Tag lists are repaired rather than rejected: ids without an entry and
    /// repeated ids are dropped, and tags left empty are removed. Each repair is
    /// logged as a warning.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let Snapshot {
            tags,
            mut entries,
            next_id,
        } = snapshot;

        // Ids are 1-based
        if let Some(text) = entries.remove(&EntryId(0)) {
            log::warn!("dropping entry 0 from data file: {:?}", text);
        }

        let mut repaired = TagIndex::new();
        for (name, ids) in tags.tags {
            if let Err(e) = validate_tag(&name) {
                log::warn!("dropping tag from data file: {}", e);
                continue;
            }
            let mut kept: Vec<EntryId> = Vec::with_capacity(ids.len());
            for id in ids {
                if !entries.contains_key(&id) {
                    log::warn!("tag {:?} listed missing entry {}; dropping it", name, id);
                } else if kept.contains(&id) {
                    log::warn!("tag {:?} listed entry {} twice", name, id);
                } else {
                    kept.push(id);
                }
            }
            if kept.is_empty() {
                log::warn!("tag {:?} has no entries; dropping it", name);
                continue;
            }
            repaired.tags.push((name, kept));
        }

        let after_last = match entries.keys().next_back() {
            None => EntryId::FIRST,
            Some(last) => last.next().unwrap_or_else(|| {
                log::warn!("data file uses the largest entry number; no new entries can be added");
                *last
            }),
        };
        let next_id = next_id.map_or(after_last, |stored| stored.max(after_last));

        Self {
            entries,
            tags: repaired,
            next_id,
        }
    }

    /// Produces the persisted form of the store.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            tags: self.tags.clone(),
            entries: self.entries.clone(),
            next_id: Some(self.next_id),
        }
    }

    /// Adds a new entry and returns its id.
    ///
    /// The text is trimmed and must not be empty, and at least one tag is
    /// required. Repeated tags are stored once. Tags that do not exist yet are
    /// created.
    ///
    /// # Examples
    ///
    /// ```
    /// use thoughtbot::{ThoughtBotError, ThoughtStore};
    ///
    /// let mut store = ThoughtStore::new();
    /// let id = store.add(&["work"], "  finish report ").unwrap();
    /// assert_eq!(store.get(id), Some("finish report"));
    ///
    /// assert!(matches!(store.add(&["work"], "   "), Err(ThoughtBotError::MissingText)));
    /// assert!(matches!(store.add::<&str>(&[], "untagged"), Err(ThoughtBotError::MissingTags)));
    /// ```
    pub fn add<S: AsRef<str>>(&mut self, tags: &[S], text: &str) -> Result<EntryId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ThoughtBotError::MissingText);
        }
        let tags = normalize_tags(tags)?;
        if tags.is_empty() {
            return Err(ThoughtBotError::MissingTags);
        }

        let id = self.next_id;
        // The last id is never handed out, so `next_id` always names a free slot
        let next_id = id.next().ok_or(ThoughtBotError::IdSpaceExhausted)?;
        if self.entries.contains_key(&id) {
            return Err(ThoughtBotError::IdSpaceExhausted);
        }
        self.next_id = next_id;
        self.entries.insert(id, text.to_string());
        for tag in &tags {
            self.tags.push(tag, id);
        }

        log::debug!("added entry {} tagged {:?}", id, tags);
        Ok(id)
    }

    /// Returns the entries carrying every given tag, in ascending id order.
    ///
    /// With no tags, returns every entry. A tag that does not exist matches
    /// nothing, so asking for it yields no entries. Repeating a tag has no
    /// effect.
    pub fn query<S: AsRef<str>>(&self, tags: &[S]) -> Vec<(EntryId, &str)> {
        let mut wanted: Vec<&str> = Vec::with_capacity(tags.len());
        for tag in tags {
            let tag = tag.as_ref();
            if !wanted.contains(&tag) {
                wanted.push(tag);
            }
        }

        if wanted.is_empty() {
            return self
                .entries
                .iter()
                .map(|(id, text)| (*id, text.as_str()))
                .collect();
        }

        // An entry matches when it shows up under every requested tag
        let mut appearances: BTreeMap<EntryId, usize> = BTreeMap::new();
        for tag in &wanted {
            if let Some(ids) = self.tags.get(tag) {
                for id in ids {
                    *appearances.entry(*id).or_default() += 1;
                }
            }
        }

        appearances
            .into_iter()
            .filter(|(_, count)| *count == wanted.len())
            .filter_map(|(id, _)| self.entries.get(&id).map(|text| (id, text.as_str())))
            .collect()
    }

    /// Every tag currently in use, in the order the tags were created.
    pub fn list_tags(&self) -> Vec<&str> {
        self.tags.names().collect()
    }

    /// The tags carried by one entry, in the order the tags were created.
    pub fn tags_for(&self, id: EntryId) -> Result<Vec<&str>> {
        if !self.entries.contains_key(&id) {
            return Err(ThoughtBotError::EntryNotFound(id));
        }
        Ok(self.tags.tags_of(id))
    }

    /// Edits the text and/or tags of an entry, keeping its id.
    ///
    /// A `new_text` that is `None` or blank keeps the current text. See
    /// [`TagEdit`] for the tag options; `TagEdit::Replace` with an empty list
    /// behaves like `TagEdit::Clear`.
    ///
    /// # Examples
    ///
    /// ```
    /// use thoughtbot::{TagEdit, ThoughtStore};
    ///
    /// let mut store = ThoughtStore::new();
    /// let id = store.add(&["b", "c"], "draft").unwrap();
    ///
    /// store.edit(id, TagEdit::Replace(vec!["a".into(), "b".into()]), Some("final")).unwrap();
    ///
    /// assert_eq!(store.get(id), Some("final"));
    /// assert_eq!(store.tags_for(id).unwrap(), vec!["b", "a"]);
    /// assert_eq!(store.list_tags(), vec!["b", "a"]);
    /// ```
    pub fn edit(&mut self, id: EntryId, tags: TagEdit, new_text: Option<&str>) -> Result<()> {
        if !self.entries.contains_key(&id) {
            return Err(ThoughtBotError::EntryNotFound(id));
        }
        let new_tags = match tags {
            TagEdit::Keep => None,
            TagEdit::Clear => Some(Vec::new()),
            TagEdit::Replace(tags) => Some(normalize_tags(&tags)?),
        };

        if let Some(text) = new_text.map(str::trim).filter(|t| !t.is_empty()) {
            self.entries.insert(id, text.to_string());
        }

        if let Some(new_tags) = new_tags {
            self.reconcile_tags(id, new_tags);
        }

        log::debug!("edited entry {}", id);
        Ok(())
    }

    /// Makes `id` a member of exactly `wanted`.
    ///
    /// Existing tags are settled first; tags still left in the worklist are new
    /// and get created afterwards, and emptied tags are dropped last.
    fn reconcile_tags(&mut self, id: EntryId, wanted: Vec<String>) {
        let mut worklist = wanted;
        let mut emptied: Vec<String> = Vec::new();

        for (name, ids) in self.tags.tags.iter_mut() {
            let requested = worklist.iter().position(|t| t == &*name);
            let listed = ids.contains(&id);
            match (requested, listed) {
                (Some(pos), false) => {
                    ids.push(id);
                    worklist.remove(pos);
                }
                (Some(pos), true) => {
                    worklist.remove(pos);
                }
                (None, true) => {
                    ids.retain(|listed| *listed != id);
                    if ids.is_empty() {
                        emptied.push(name.clone());
                    }
                }
                (None, false) => {}
            }
        }

        for name in worklist {
            self.tags.tags.push((name, vec![id]));
        }

        for name in emptied {
            self.tags.remove(&name);
        }
    }

    /// Deletes an entry and returns its text.
    ///
    /// The id is removed from every tag and tags left empty are dropped. Other
    /// entries keep their ids.
    pub fn delete(&mut self, id: EntryId) -> Result<String> {
        let text = self
            .entries
            .remove(&id)
            .ok_or(ThoughtBotError::EntryNotFound(id))?;
        let pruned = self.tags.remove_entry(id);

        log::debug!("deleted entry {}, pruned tags {:?}", id, pruned);
        Ok(text)
    }

    /// Text of an entry
    pub fn get(&self, id: EntryId) -> Option<&str> {
        self.entries.get(&id).map(String::as_str)
    }

    /// Whether an entry exists
    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// The tag index
    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// The id the next added entry will receive
    pub fn next_id(&self) -> EntryId {
        self.next_id
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
