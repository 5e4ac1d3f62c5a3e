pub mod add_talk;
pub mod handle;
pub mod list;
