use anyhow::{Result, bail};
use lectern_core::Archive;
use lectern_core::announcement::{self, ANNOUNCEMENT_FILE, Headers};
use lectern_core::utils::base_name;

use crate::context::Context;

const TALK_FIELD: &str = "Talk";

pub fn run(ctx: &Context, event_id: &str, title: &str, speakers: Option<&str>) -> Result<()> {
    let event_id = add_talk(&ctx.archive, event_id, title, speakers)?;
    println!("Added talk \"{}\" to {}", title, event_id);
    Ok(())
}

/// Append a talk line to an event's announcement, leaving everything else in
/// the document as it was written. A failed write is reported but does not
/// fail the command.
fn add_talk(archive: &Archive, event_id: &str, title: &str, speakers: Option<&str>) -> Result<String> {
    let event_id = base_name(event_id);
    let event_dir = archive.event_dir(event_id);
    if event_id.is_empty() || !event_dir.is_dir() {
        bail!("Event '{}' does not exist in {}", event_id, archive.root().display());
    }

    let path = event_dir.join(ANNOUNCEMENT_FILE);
    let (mut headers, content) = announcement::analyze(&path).unwrap_or_else(|| (Headers::new(), String::new()));

    // Keep repeated talk lines under the spelling the document already uses.
    let field = headers
        .iter()
        .map(|(name, _)| name)
        .find(|name| name.eq_ignore_ascii_case(TALK_FIELD))
        .unwrap_or(TALK_FIELD)
        .to_string();

    let value = match speakers {
        Some(speakers) => format!("{title}\t{speakers}"),
        None => title.to_string(),
    };
    headers.append(field, value);

    if let Err(e) = announcement::save(&path, &headers, &content) {
        tracing::warn!("{}", e);
        eprintln!("Warning: {}", e);
    }

    Ok(event_id.to_string())
}
