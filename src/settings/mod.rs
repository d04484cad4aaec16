//! Ordered, concurrent settings store.

mod builder;
pub mod env;
mod error;
pub mod extract;
pub mod merge;
pub mod pending;
pub mod source;
mod store;

pub use builder::SettingsBuilder;
pub use error::{ParseError, Result, SettingsError};
pub use source::{FormatParser, FsReader, JsonParser, Parser, SourceReader, TomlParser};
pub use store::Settings;

/// A nested string-keyed mapping of settings values.
pub type SettingsTree = serde_json::Map<String, serde_json::Value>;
