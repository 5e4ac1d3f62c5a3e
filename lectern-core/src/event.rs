//! Event records derived from an event directory and its announcement.

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::announcement::{self, ANNOUNCEMENT_FILE, Announcement, Headers, HeaderValue};
use crate::utils::humanize;

static EVENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.*)$").expect("valid event id regex")
});

static TALK_FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+").expect("valid talk separator regex"));

/// Header fields mapped onto dedicated fields instead of being copied.
const RESERVED_FIELDS: [&str; 6] = ["title", "start", "end", "description", "talk", "talks"];

/// A talk announced for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Talk {
    pub title: String,
    pub speakers: Option<String>,
}

impl Talk {
    /// Parse a `Title<TAB>Speakers[<TAB>...]` header value.
    pub fn parse(value: &str) -> Self {
        let mut fields = TALK_FIELD_SEPARATOR.splitn(value, 3);
        let title = fields.next().unwrap_or_default().to_string();
        let speakers = fields.next().map(str::to_string);
        Talk { title, speakers }
    }
}

/// Talks keyed by title in announcement order. A repeated title replaces
/// the earlier entry in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Talks(Vec<Talk>);

impl Talks {
    pub fn insert(&mut self, talk: Talk) {
        match self.0.iter_mut().find(|t| t.title == talk.title) {
            Some(existing) => *existing = talk,
            None => self.0.push(talk),
        }
    }

    pub fn get(&self, title: &str) -> Option<&Talk> {
        self.0.iter().find(|t| t.title == title)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Talks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(serde::Serialize)]
        struct Entry<'a> {
            speakers: &'a Option<String>,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for talk in &self.0 {
            map.serialize_entry(&talk.title, &Entry { speakers: &talk.speakers })?;
        }
        map.end()
    }
}

/// An event as announced to clients.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub path: PathBuf,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: Option<String>,
    /// Announcement headers without a dedicated field, lower-cased.
    pub extra: Headers,
    pub talks: Option<Talks>,
}

impl Event {
    /// Derive an event from its directory name alone.
    ///
    /// Returns `None` unless the name looks like `YYYY-MM-DD-<name>` with a
    /// real calendar date.
    pub fn from_id(id: &str, path: PathBuf) -> Option<Self> {
        let captures = EVENT_ID_PATTERN.captures(id)?;
        let year = captures[1].parse().ok()?;
        let month = captures[2].parse().ok()?;
        let day = captures[3].parse().ok()?;
        let start = NaiveDate::from_ymd_opt(year, month, day)?;
        let end = start.checked_add_days(Days::new(1))?;

        Some(Event {
            id: id.to_string(),
            path,
            title: humanize(&captures[4]),
            start,
            end,
            description: None,
            extra: Headers::new(),
            talks: None,
        })
    }

    /// Derive an event from its directory, overlaying `announcement.txt`
    /// if the directory has one.
    pub fn from_dir(path: &Path) -> Option<Self> {
        let id = path.file_name()?.to_str()?;
        let mut event = Self::from_id(id, path.to_path_buf())?;

        if let Some(announcement) = announcement::load(&path.join(ANNOUNCEMENT_FILE)) {
            event.overlay(&announcement);
        }

        Some(event)
    }

    /// Apply announcement data on top of the derived fields.
    pub fn overlay(&mut self, announcement: &Announcement) {
        for (name, value) in announcement.headers.iter() {
            if !RESERVED_FIELDS.contains(&name) {
                self.extra.insert(name, value.clone());
            }
        }

        if let Some(title) = announcement.raw("title") {
            self.title = title.first().to_string();
        }

        if !announcement.content.is_empty() {
            self.description = Some(announcement.content.clone());
        } else if let Some(description) = announcement.raw("description") {
            self.description = Some(description.first().to_string());
        }

        if announcement.raw("start").is_some() {
            match announcement.as_time("start") {
                Some(start) => self.start = start.date(),
                None => tracing::warn!("{}: ignoring unparsable start header", self.id),
            }
        }
        if announcement.raw("end").is_some() {
            match announcement.as_time("end") {
                Some(end) => self.end = end.date(),
                None => tracing::warn!("{}: ignoring unparsable end header", self.id),
            }
        }

        let talk_lines = announcement.as_array("talk");
        if !talk_lines.is_empty() {
            let mut talks = Talks::default();
            for line in &talk_lines {
                talks.insert(Talk::parse(line));
            }
            self.talks = Some(talks);
        } else if let Some(talks) = announcement.raw("talks") {
            // A plain "talks" header without structured talk lines.
            self.extra.insert("talks", talks.clone());
        }
    }

    /// Value of a copied announcement header.
    pub fn field(&self, name: &str) -> Option<&HeaderValue> {
        self.extra.get(name)
    }

    /// Whether clients can still stream to this event on `today`.
    /// Only events that both started and ended before today are over.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        !(self.start < today && self.end < today)
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("start", &self.start.format("%Y-%m-%d").to_string())?;
        map.serialize_entry("end", &self.end.format("%Y-%m-%d").to_string())?;
        for (name, value) in self.extra.iter() {
            map.serialize_entry(name, value)?;
        }
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        if let Some(talks) = &self.talks {
            map.serialize_entry("talks", talks)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_id_derives_title_and_dates() {
        let event = Event::from_id("2024-06-01-rust--meetup night", PathBuf::from("/x")).unwrap();
        assert_eq!(event.title, "Rust Meetup Night");
        assert_eq!(event.start, date(2024, 6, 1));
        assert_eq!(event.end, date(2024, 6, 2));
    }

    #[test]
    fn test_from_id_rejects_other_names() {
        assert!(Event::from_id("rust-meetup", PathBuf::new()).is_none());
        assert!(Event::from_id("2024-06-01", PathBuf::new()).is_none());
        assert!(Event::from_id("2024-02-31-impossible", PathBuf::new()).is_none());
    }

    #[test]
    fn test_overlay_from_announcement() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("2024-06-01-meetup");
        std::fs::create_dir(&dir).unwrap();
        std::fs::write(
            dir.join(ANNOUNCEMENT_FILE),
            "Title: Rust Meetup\nLocation: Room 1\nStart: 2024-06-01 18:00\nEnd: 2024-06-03\n\
             Talk: Ownership\tAda\nTalk: Async\tGrace\tBarbara\n\nBring snacks.",
        )
        .unwrap();

        let event = Event::from_dir(&dir).unwrap();
        assert_eq!(event.title, "Rust Meetup");
        assert_eq!(event.end, date(2024, 6, 3));
        assert_eq!(event.description.as_deref(), Some("Bring snacks."));
        assert_eq!(event.field("location"), Some(&HeaderValue::from("Room 1")));
        assert!(event.field("talk").is_none());

        let talks = event.talks.as_ref().unwrap();
        assert_eq!(talks.len(), 2);
        assert_eq!(talks.get("Async").unwrap().speakers.as_deref(), Some("Grace"));
    }

    #[test]
    fn test_overlay_keeps_derived_dates_for_bad_headers() {
        let mut event = Event::from_id("2024-06-01-meetup", PathBuf::new()).unwrap();
        let announcement = Announcement {
            headers: {
                let mut h = Headers::new();
                h.append("start", "tomorrow-ish");
                h
            },
            content: String::new(),
        };
        event.overlay(&announcement);
        assert_eq!(event.start, date(2024, 6, 1));
    }

    #[test]
    fn test_talk_without_speakers() {
        let talk = Talk::parse("Lightning talks");
        assert_eq!(talk.title, "Lightning talks");
        assert!(talk.speakers.is_none());
    }

    #[test]
    fn test_is_active_on() {
        let event = Event::from_id("2024-06-01-meetup", PathBuf::new()).unwrap();
        assert!(event.is_active_on(date(2024, 5, 1)));
        assert!(event.is_active_on(date(2024, 6, 2)));
        assert!(!event.is_active_on(date(2024, 6, 3)));

        let mut long = event.clone();
        long.end = date(2024, 7, 1);
        assert!(long.is_active_on(date(2024, 7, 1)));
        assert!(!long.is_active_on(date(2024, 7, 2)));
    }

    #[test]
    fn test_serialize_shape() {
        let mut event = Event::from_id("2024-06-01-meetup", PathBuf::new()).unwrap();
        event.extra.insert("location", "Room 1");
        let mut talks = Talks::default();
        talks.insert(Talk::parse("Ownership\tAda"));
        talks.insert(Talk::parse("Open mic"));
        event.talks = Some(talks);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Meetup",
                "start": "2024-06-01",
                "end": "2024-06-02",
                "location": "Room 1",
                "talks": {
                    "Ownership": { "speakers": "Ada" },
                    "Open mic": { "speakers": null }
                }
            })
        );
    }
}
