//! Streaming relay.
//!
//! Pipes an uploaded request body into an external shell command (usually
//! an ffmpeg invocation that transcodes and publishes the stream). The
//! command runs inside the event directory with its output appended to
//! the event's `streaming.log`, and receives these environment variables
//! for templating:
//!
//! - `event_id`: the event directory name
//! - `event_dir`: canonical absolute path of the event directory
//! - `talk_name`: the talk name without extension
//! - `talk_filename`: versioned destination, e.g. `lecture.2.mp4`
//!
//! The command's exit status is not inspected and no timeout is applied.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::Command;

use crate::archive::Archive;
use crate::error::{LecternError, LecternResult};
use crate::utils::{base_name, split_extension};

/// Per-event log receiving the streaming command's stdout and stderr.
pub const STREAMING_LOG: &str = "streaming.log";

const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Where an upload for a talk ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamTarget {
    pub event_id: String,
    pub event_dir: PathBuf,
    pub talk_name: String,
    pub talk_filename: String,
}

impl StreamTarget {
    /// Resolve the event directory and the next free version of the talk file.
    ///
    /// Both names are reduced to their last path component. Existing files
    /// named `<talk>*.<ext>` (or `<talk>.*` without an extension) are counted
    /// and the count becomes the version, so re-uploads never overwrite
    /// earlier recordings.
    pub fn resolve(archive: &Archive, event_id: &str, talk: &str) -> LecternResult<Self> {
        let event_id = base_name(event_id);
        let talk = base_name(talk);
        if is_unusable_name(event_id) || is_unusable_name(talk) {
            return Err(LecternError::NotFound(format!("Invalid stream target {event_id}/{talk}")));
        }

        let event_dir = std::fs::canonicalize(archive.event_dir(event_id))
            .ok()
            .filter(|dir| dir.is_dir())
            .ok_or_else(|| LecternError::NotFound(format!("Event {event_id} does not exist")))?;

        let (talk_name, extension) = split_extension(talk);
        let version = count_versions(&event_dir, talk_name, extension)?;
        let talk_filename = if extension.is_empty() {
            format!("{talk_name}.{version}")
        } else {
            format!("{talk_name}.{version}.{extension}")
        };

        Ok(StreamTarget {
            event_id: event_id.to_string(),
            event_dir,
            talk_name: talk_name.to_string(),
            talk_filename,
        })
    }
}

fn is_unusable_name(name: &str) -> bool {
    matches!(name, "" | "." | "..")
}

fn count_versions(event_dir: &std::path::Path, talk_name: &str, extension: &str) -> LecternResult<usize> {
    let (prefix, suffix) = if extension.is_empty() {
        (format!("{talk_name}."), String::new())
    } else {
        (talk_name.to_string(), format!(".{extension}"))
    };

    let count = std::fs::read_dir(event_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            name.len() >= prefix.len() + suffix.len() && name.starts_with(&prefix) && name.ends_with(&suffix)
        })
        .count();

    Ok(count)
}

/// Result of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub talk_filename: String,
    pub bytes: u64,
}

/// Forwards a request body into a streaming command.
pub struct Relay {
    command: String,
}

impl Relay {
    pub fn new(command: impl Into<String>) -> Self {
        Relay {
            command: command.into(),
        }
    }

    /// Resolve the target and stream `body` into the command.
    pub async fn stream<R>(
        &self,
        archive: &Archive,
        event_id: &str,
        talk: &str,
        body: &mut R,
    ) -> LecternResult<StreamOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        tracing::info!(
            "Streaming {}/{} with command {:?}",
            base_name(event_id),
            base_name(talk),
            self.command
        );

        let target = StreamTarget::resolve(archive, event_id, talk)?;
        self.stream_to(&target, body).await
    }

    /// Spawn the command for `target` and copy `body` into its stdin until
    /// the body ends.
    pub async fn stream_to<R>(&self, target: &StreamTarget, body: &mut R) -> LecternResult<StreamOutcome>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(target.event_dir.join(STREAMING_LOG))?;

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .current_dir(&target.event_dir)
            .env("event_id", &target.event_id)
            .env("event_dir", &target.event_dir)
            .env("talk_name", &target.talk_name)
            .env("talk_filename", &target.talk_filename)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(log.try_clone()?))
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| LecternError::Relay(format!("Failed to spawn streaming command: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| LecternError::Relay("Streaming command has no stdin".into()))?;

        let copied = tokio::io::copy(body, &mut stdin).await;
        let copied = match copied {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    "Couldn't write data into streaming pipeline ({}). Please check the streaming log.",
                    e
                );
                drop(stdin);
                let _ = child.wait().await;
                return Err(LecternError::Relay(e.to_string()));
            }
        };

        tracing::info!("Streaming done, handled {:.2} MiByte.", copied as f64 / MEBIBYTE);

        if let Err(e) = stdin.shutdown().await {
            tracing::debug!("Closing streaming pipe: {}", e);
        }
        drop(stdin);

        if let Err(e) = child.wait().await {
            tracing::warn!("Could not reap streaming command: {}", e);
        }

        Ok(StreamOutcome {
            talk_filename: target.talk_filename.clone(),
            bytes: copied,
        })
    }
}
