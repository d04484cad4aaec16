pub mod settings;

pub use serde_json::Value;
pub use settings::{
    FormatParser, FsReader, JsonParser, ParseError, Parser, Result, Settings, SettingsBuilder,
    SettingsError, SettingsTree, SourceReader, TomlParser,
};
