//! Name helpers shared by the archive and the relay.

use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_äöüß]+").expect("valid slug regex"));

static TITLE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s-]+").expect("valid separator regex"));

/// Convert a free-text name into a slug usable in URLs and directory names.
///
/// Runs of anything other than ASCII word characters and the German
/// umlauts collapse into a single hyphen.
pub fn parameterize(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_SLUG_CHARS
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// Turn a slug back into a display title: `"rust-meetup"` → `"Rust Meetup"`.
pub fn humanize(slug: &str) -> String {
    let spaced = TITLE_SEPARATORS.replace_all(slug, " ");
    spaced
        .trim()
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Last path component of `name`, ignoring trailing slashes.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((_, last)) => last,
        None => trimmed,
    }
}

/// Split a file name at its last dot into stem and extension.
/// A name without a dot has an empty extension.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    file_name.rsplit_once('.').unwrap_or((file_name, ""))
}
