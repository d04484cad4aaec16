//! Collaborators used by [`Settings::load`](super::Settings::load): a reader
//! that fetches raw bytes and a parser that turns them into a tree.

use std::fmt;
use std::path::Path;

use serde_json::{Number, Value};

use super::{ParseError, SettingsTree};

/// Fetches the raw contents of a settings source.
pub trait SourceReader: Send + Sync + fmt::Debug {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads sources from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Converts raw bytes into a [`SettingsTree`].
///
/// `path` is the locator the bytes came from; parsers may use it to pick a
/// format but must not read from it.
pub trait Parser: Send + Sync + fmt::Debug {
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<SettingsTree, ParseError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, _path: &Path, bytes: &[u8]) -> Result<SettingsTree, ParseError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(tree) => Ok(tree),
            other => Err(ParseError::NotATable {
                found: kind_of(&other),
            }),
        }
    }
}

/// Parses TOML documents into the same tree shape as JSON.
///
/// Datetimes become their RFC 3339 string form. Non-finite floats, which JSON
/// numbers cannot hold, are kept as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl Parser for TomlParser {
    fn parse(&self, _path: &Path, bytes: &[u8]) -> Result<SettingsTree, ParseError> {
        let text = std::str::from_utf8(bytes)?;
        let table: toml::Table = toml::from_str(text)?;
        Ok(table_to_tree(table))
    }
}

/// Picks [`TomlParser`] for `.toml` locators and [`JsonParser`] otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatParser;

impl Parser for FormatParser {
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<SettingsTree, ParseError> {
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            TomlParser.parse(path, bytes)
        } else {
            JsonParser.parse(path, bytes)
        }
    }
}

fn table_to_tree(table: toml::Table) -> SettingsTree {
    table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect()
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(f.to_string())),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(table_to_tree(table)),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}
