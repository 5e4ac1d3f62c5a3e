//! Archive root directory management.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::error::{LecternError, LecternResult};
use crate::event::Event;
use crate::utils::{base_name, parameterize};

/// The directory holding one subdirectory per event.
#[derive(Clone, Debug)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Archive { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn event_dir(&self, event_id: &str) -> PathBuf {
        self.root.join(event_id)
    }

    /// Create a new event dated today and return its id.
    pub fn create_event(&self, name: &str) -> LecternResult<String> {
        self.create_event_on(name, Local::now().date_naive())
    }

    /// Create a new event directory `YYYY-MM-DD-<slug>` for `date`.
    ///
    /// Fails if the directory already exists, so the same event cannot be
    /// created twice.
    pub fn create_event_on(&self, name: &str, date: NaiveDate) -> LecternResult<String> {
        let id = format!("{}-{}", date.format("%Y-%m-%d"), parameterize(base_name(name)));

        std::fs::create_dir(self.event_dir(&id)).map_err(|e| LecternError::EventCreation {
            id: id.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!("Created event {}", id);
        Ok(id)
    }

    /// Discover events by scanning the archive root for `YYYY-MM-DD-*`
    /// subdirectories, sorted by id.
    pub fn events(&self) -> Vec<Event> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Could not read archive {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        let mut events: Vec<Event> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| Event::from_dir(&path))
            .collect();

        events.sort_by(|a, b| a.id.cmp(&b.id));
        events
    }

    /// Events clients can still stream to, keyed by id.
    pub fn active_events(&self) -> BTreeMap<String, Event> {
        self.active_events_on(Local::now().date_naive())
    }

    pub fn active_events_on(&self, today: NaiveDate) -> BTreeMap<String, Event> {
        self.events()
            .into_iter()
            .filter(|event| event.is_active_on(today))
            .map(|event| (event.id.clone(), event))
            .collect()
    }

    /// The `/announcements.json` document. Always a JSON object, `{}` when
    /// nothing is active.
    pub fn announcements_json_on(&self, today: NaiveDate) -> LecternResult<String> {
        serde_json::to_string(&self.active_events_on(today))
            .map_err(|e| LecternError::Serialization(e.to_string()))
    }

    pub fn announcements_json(&self) -> LecternResult<String> {
        self.announcements_json_on(Local::now().date_naive())
    }
}
