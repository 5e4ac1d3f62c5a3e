//! Announcement documents: a block of `Name: value` header lines, a blank
//! line, then free-text content.
//!
//! ```text
//! Title: Rust Meetup
//! Start: 2024-06-01 18:30
//! Talk: Ownership in practice	Ada
//! Talk: Async without tears	Grace
//!
//! Monthly meetup of the local Rust user group.
//! ```
//!
//! [`analyze`] returns headers exactly as written so a document can be
//! modified and written back with [`save`] without disturbing the rest of
//! it. [`load`] normalizes header names for case-insensitive lookup.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{LecternError, LecternResult};

/// File name of the announcement inside an event directory.
pub const ANNOUNCEMENT_FILE: &str = "announcement.txt";

const HEAD_SEPARATOR: &str = "\n\n";
const FIELD_SEPARATOR: &str = ": ";

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})(?:-(\d{2})(?:-(\d{2})(?:\s+(\d{2}):(\d{2})(?::(\d{2}))?)?)?)?")
        .expect("valid time regex")
});

/// Value of a header field. Repeating a field name turns it into `Multiple`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeaderValue {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValue {
    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(first) => {
                let first = std::mem::take(first);
                *self = HeaderValue::Multiple(vec![first, value]);
            }
            HeaderValue::Multiple(values) => values.push(value),
        }
    }

    /// First occurrence of the field.
    pub fn first(&self) -> &str {
        match self {
            HeaderValue::Single(value) => value,
            HeaderValue::Multiple(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// All occurrences in file order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            HeaderValue::Single(value) => vec![value.as_str()],
            HeaderValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::Multiple(values)
    }
}

/// Ordered multi-map of header fields, keyed by the name's first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, HeaderValue)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, accumulating into a sequence if the name is already present.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((name, HeaderValue::Single(value))),
        }
    }

    /// Set a field, replacing any previous value but keeping its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse head text. Blank and whitespace-only lines are ignored and are
    /// not written back by `save`; a line without `": "` becomes a field with
    /// an empty value and is written back as `<line>: `.
    fn parse(head: &str) -> Self {
        let mut headers = Headers::new();
        for line in head.split('\n').filter(|line| !line.trim().is_empty()) {
            let (name, value) = line.split_once(FIELD_SEPARATOR).unwrap_or((line, ""));
            headers.append(name, value);
        }
        headers
    }

    fn lowercased(self) -> Self {
        let mut headers = Headers::new();
        for (name, value) in self.entries {
            let name = name.to_lowercase();
            for value in value.values() {
                headers.append(name.clone(), value);
            }
        }
        headers
    }

    fn to_head(&self) -> String {
        let mut lines = Vec::new();
        for (name, value) in &self.entries {
            let name = name.replace(['\n', ':'], " ");
            for value in value.values() {
                lines.push(format!("{}{}{}", name, FIELD_SEPARATOR, value.replace('\n', " ")));
            }
        }
        lines.join("\n")
    }
}

/// A loaded announcement with lower-cased header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub headers: Headers,
    pub content: String,
}

impl Announcement {
    /// Raw value of a header: a string, or a sequence if it was repeated.
    pub fn raw(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(&name.to_lowercase())
    }

    /// Comma separated header as trimmed elements: `"foo, bar"` → `["foo", "bar"]`.
    pub fn as_list(&self, name: &str) -> Vec<String> {
        let Some(value) = self.raw(name) else {
            return Vec::new();
        };
        value
            .values()
            .into_iter()
            .filter(|v| !v.is_empty())
            .flat_map(|v| v.split(','))
            .map(|element| element.trim().to_string())
            .collect()
    }

    /// Header values as a sequence, even if the field occurs only once.
    pub fn as_array(&self, name: &str) -> Vec<String> {
        self.raw(name)
            .map(|value| value.values().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Header parsed as a timestamp, see [`parse_time`]. Repeated fields use
    /// their first occurrence.
    pub fn as_time(&self, name: &str) -> Option<NaiveDateTime> {
        self.raw(name).and_then(|value| parse_time(value.first()))
    }
}

/// Read the headers and content of a document without any normalization.
///
/// Returns `None` if the file does not exist, cannot be read or is empty.
pub fn analyze(path: &Path) -> Option<(Headers, String)> {
    let data = std::fs::read_to_string(path).ok()?;
    if data.is_empty() {
        return None;
    }

    let (head, content) = data.split_once(HEAD_SEPARATOR).unwrap_or((&data, ""));
    Some((Headers::parse(head), content.to_string()))
}

/// Load a document with header names lower-cased. Fields whose names only
/// differ in case accumulate into one entry.
pub fn load(path: &Path) -> Option<Announcement> {
    let (headers, content) = analyze(path)?;
    Some(Announcement {
        headers: headers.lowercased(),
        content,
    })
}

/// Write a document. Line breaks and colons in names, and line breaks in
/// values, are replaced by spaces so the head stays parseable.
pub fn save(path: &Path, headers: &Headers, content: &str) -> LecternResult<()> {
    let document = format!("{}{}{}", headers.to_head(), HEAD_SEPARATOR, content);
    std::fs::write(path, document).map_err(|e| {
        LecternError::Announcement(format!("Could not write {}: {e}", path.display()))
    })
}

/// Parse a leading `YYYY[-MM[-DD[ HH:MM[:SS]]]]` timestamp.
///
/// Missing month and day default to 1, a missing time to midnight.
/// Returns `None` if no year is found or the date does not exist.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let captures = TIME_PATTERN.captures(value)?;
    let number = |index: usize, default: u32| {
        captures
            .get(index)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(default)
    };

    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, number(2, 1), number(3, 1))?.and_hms_opt(
        number(4, 0),
        number(5, 0),
        number(6, 0),
    )
}
