use std::sync::Arc;

use parking_lot::Mutex;

use super::pending::PendingQueue;
use super::source::{FormatParser, FsReader, Parser, SourceReader};
use super::store::{Settings, State};

const DEFAULT_THREAD_NAME: &str = "settings-worker";

/// Builder for a [`Settings`] store with custom collaborators.
///
/// ## Example
///
/// ```no_run
/// use ordered_settings::{JsonParser, Settings};
///
/// let settings = Settings::builder()
///     .with_parser(JsonParser)
///     .thread_name("app-settings")
///     .build();
///
/// let port = settings.load("config/default.json").get("server.port")?;
/// # Ok::<(), ordered_settings::SettingsError>(())
/// ```
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct SettingsBuilder {
    reader: Arc<dyn SourceReader>,
    parser: Arc<dyn Parser>,
    thread_name: String,
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self {
            reader: Arc::new(FsReader),
            parser: Arc::new(FormatParser),
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reader used by [`Settings::load`]. Defaults to [`FsReader`].
    pub fn with_reader(mut self, reader: impl SourceReader + 'static) -> Self {
        self.reader = Arc::new(reader);
        self
    }

    /// Replaces the parser used by [`Settings::load`]. Defaults to [`FormatParser`].
    pub fn with_parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Name given to the background threads that run operations.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn build(self) -> Settings {
        Settings {
            pending: PendingQueue::new(),
            state: Mutex::new(State::default()),
            reader: self.reader,
            parser: self.parser,
            thread_name: self.thread_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ParseError, SettingsError, SettingsTree};
    use serde_json::json;
    use std::path::Path;

    #[derive(Debug)]
    struct FixedReader(&'static [u8]);

    impl SourceReader for FixedReader {
        fn read(&self, _path: &Path) -> std::io::Result<Vec<u8>> {
            Ok(self.0.to_vec())
        }
    }

    #[derive(Debug)]
    struct RejectAll;

    impl Parser for RejectAll {
        fn parse(&self, _path: &Path, _bytes: &[u8]) -> Result<SettingsTree, ParseError> {
            Err(ParseError::NotATable { found: "null" })
        }
    }

    #[test]
    fn test_custom_reader_is_used() {
        let settings = Settings::builder()
            .with_reader(FixedReader(br#"{"from": "reader"}"#))
            .build();
        assert_eq!(settings.load("ignored.json").get("from").unwrap(), json!("reader"));
    }

    #[test]
    fn test_custom_parser_is_used() {
        let settings = Settings::builder()
            .with_reader(FixedReader(b"{}"))
            .with_parser(RejectAll)
            .build();
        let err = settings.load("anything").get("x").unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_worker_threads_use_configured_name() {
        #[derive(Debug)]
        struct ThreadNameReader;

        impl SourceReader for ThreadNameReader {
            fn read(&self, _path: &Path) -> std::io::Result<Vec<u8>> {
                let name = std::thread::current().name().unwrap_or_default().to_string();
                Ok(json!({ "thread": name }).to_string().into_bytes())
            }
        }

        let settings = Settings::builder()
            .with_reader(ThreadNameReader)
            .thread_name("cfg-loader")
            .build();
        assert_eq!(settings.load("x.json").get("thread").unwrap(), json!("cfg-loader"));
    }
}
