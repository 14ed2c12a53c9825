//! Android platform edits.
mod manifest;

pub use manifest::write_preferences;
