//! Applying commands to a persisted store
//!
//! A [`Session`] owns the in-memory [`ThoughtStore`] and the [`SnapshotStore`]
//! it is saved to. Each command is applied in full before the next one: a
//! mutating command either changes the store *and* gets saved, or leaves the
//! store as it was.

use crate::command::Command;
use crate::persist::SnapshotStore;
use crate::{EntryId, Result, ThoughtStore};

/// What a command produced, ready to be rendered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A thought was added under this id
    Added(EntryId),
    /// Thoughts matching a `load`, in ascending id order
    Entries(Vec<(EntryId, String)>),
    /// Tag names from `tags`
    Tags(Vec<String>),
    /// The entry was edited
    Edited(EntryId),
    /// The entry was deleted
    Deleted(EntryId),
    /// `help` was requested
    Help,
    /// The shell should stop
    Exit,
}

/// A store paired with the place it is saved to.
pub struct Session<S: SnapshotStore> {
    store: ThoughtStore,
    persistence: S,
}

impl<S: SnapshotStore> Session<S> {
    /// Loads the saved store, or starts an empty one and saves it right away.
    pub fn open(persistence: S) -> Result<Self> {
        let store = match persistence.load()? {
            Some(snapshot) => ThoughtStore::from_snapshot(snapshot),
            None => {
                log::info!("no saved thoughts found, starting empty");
                let store = ThoughtStore::new();
                persistence.save(&store.to_snapshot())?;
                store
            }
        };
        Ok(Self { store, persistence })
    }

    /// Runs one command.
    ///
    /// Mutating commands are saved after they succeed. If saving fails, the
    /// in-memory store is put back the way it was and the error is returned.
    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        if !command.is_mutating() {
            return self.read(command);
        }

        let before = self.store.clone();
        let outcome = match command {
            Command::New { tags, text } => Outcome::Added(self.store.add(&tags, &text)?),
            Command::Edit { id, tags, text } => {
                self.store.edit(id, tags, text.as_deref())?;
                Outcome::Edited(id)
            }
            Command::Delete { id } => {
                self.store.delete(id)?;
                Outcome::Deleted(id)
            }
            _ => unreachable!("read-only commands are handled above"),
        };

        if let Err(e) = self.persistence.save(&self.store.to_snapshot()) {
            log::warn!("save failed, rolling back: {}", e);
            self.store = before;
            return Err(e);
        }
        Ok(outcome)
    }

    fn read(&self, command: Command) -> Result<Outcome> {
        let outcome = match command {
            Command::Load { tags } => Outcome::Entries(
                self.store
                    .query(&tags)
                    .into_iter()
                    .map(|(id, text)| (id, text.to_string()))
                    .collect(),
            ),
            Command::Tags { id: None } => Outcome::Tags(to_owned(self.store.list_tags())),
            Command::Tags { id: Some(id) } => Outcome::Tags(to_owned(self.store.tags_for(id)?)),
            Command::Help => Outcome::Help,
            Command::Exit => Outcome::Exit,
            _ => unreachable!("mutating commands are handled by execute"),
        };
        Ok(outcome)
    }

    /// The current store
    pub fn store(&self) -> &ThoughtStore {
        &self.store
    }

    /// Where the store is saved
    pub fn persistence(&self) -> &S {
        &self.persistence
    }
}

fn to_owned(tags: Vec<&str>) -> Vec<String> {
    tags.into_iter().map(str::to_string).collect()
}
