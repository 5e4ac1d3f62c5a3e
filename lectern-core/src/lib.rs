//! Core types for the lectern intake service.
//!
//! - `archive` and `event` for the directory-backed event repository
//! - `announcement` for the announcement text format
//! - `relay` for piping uploads into the streaming command

pub mod announcement;
pub mod archive;
pub mod config;
pub mod error;
pub mod event;
pub mod relay;
pub mod utils;

pub use archive::Archive;
pub use config::LecternConfig;
pub use error::{LecternError, LecternResult};
pub use event::Event;
pub use relay::Relay;
