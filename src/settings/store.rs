use std::path::Path;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::builder::SettingsBuilder;
use super::env::tree_from_vars;
use super::extract::extract;
use super::merge::deep_merge;
use super::pending::{Outcome, PendingQueue};
use super::source::{Parser, SourceReader};
use super::{Result, SettingsError, SettingsTree};

#[derive(Debug, Default)]
pub(crate) struct State {
    values: SettingsTree,
    error: Option<SettingsError>,
}

impl State {
    /// Folds one drained outcome into the accumulated tree.
    ///
    /// The first error becomes sticky. Outcomes after it are still consumed
    /// but never merged.
    fn absorb(&mut self, seq: u64, outcome: Outcome) {
        if self.error.is_some() {
            warn!(
                seq,
                ok = outcome.is_ok(),
                "discarding settings operation after an earlier failure"
            );
            return;
        }

        match outcome {
            Ok(tree) => {
                trace!(seq, keys = tree.len(), "merging settings operation");
                deep_merge(&mut self.values, tree);
            }
            Err(err) => {
                warn!(seq, error = %err, "settings operation failed; store is now in error");
                self.error = Some(err);
            }
        }
    }
}

/// An in-memory settings store with ordered, non-blocking updates.
///
/// [`load`](Self::load), [`set`](Self::set) and [`load_env`](Self::load_env)
/// return immediately and run their work on a background thread. However long
/// each one takes, their results are merged in the order the calls were made.
/// Reads ([`get`](Self::get) and friends) block until every earlier operation
/// has finished and been merged.
///
/// Deep merge semantics apply: nested tables combine recursively, every other
/// value (arrays included) is replaced by the later operation.
///
/// The first read or parse failure is sticky. From then on every read
/// returns that error, for the lifetime of the store.
///
/// ## Example
///
/// ```no_run
/// use ordered_settings::Settings;
/// use serde_json::json;
///
/// let settings = Settings::new();
/// settings
///     .set(json!({ "server": { "port": 8080 } }).as_object().cloned().unwrap_or_default())
///     .load("config/local.json");
///
/// let port = settings.get("server.port")?;
/// # Ok::<(), ordered_settings::SettingsError>(())
/// ```
#[derive(Debug)]
pub struct Settings {
    pub(crate) pending: PendingQueue,
    pub(crate) state: Mutex<State>,
    pub(crate) reader: Arc<dyn SourceReader>,
    pub(crate) parser: Arc<dyn Parser>,
    pub(crate) thread_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

impl Settings {
    /// Creates an empty store that reads files from disk and picks the format
    /// by file extension.
    pub fn new() -> Self {
        SettingsBuilder::new().build()
    }

    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Loads a settings document and merges it in turn.
    ///
    /// Read and parse failures are reported by the next read, not here.
    pub fn load(&self, path: impl AsRef<Path>) -> &Self {
        let path = path.as_ref().to_path_buf();
        let reader = Arc::clone(&self.reader);
        let parser = Arc::clone(&self.parser);

        self.submit("load", move || {
            let bytes = reader
                .read(&path)
                .map_err(|e| SettingsError::io(&path, e))?;
            parser
                .parse(&path, &bytes)
                .map_err(|e| SettingsError::parse(&path, e))
        })
    }

    /// Merges `values` in turn.
    pub fn set(&self, values: SettingsTree) -> &Self {
        self.submit("set", move || Ok(values))
    }

    /// Merges environment variables under `prefix` in turn.
    ///
    /// The environment is captured now; see
    /// [`tree_from_vars`](super::env::tree_from_vars) for the name mapping.
    /// Variables whose name or value is not valid unicode are skipped.
    ///
    /// # Panics
    ///
    /// Panics if `separator` is empty.
    pub fn load_env(&self, prefix: impl Into<String>, separator: impl Into<String>) -> &Self {
        let prefix = prefix.into();
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");

        let vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect();

        self.submit("env", move || Ok(tree_from_vars(vars, &prefix, &separator)))
    }

    /// Returns the value at a dot-delimited `path`.
    ///
    /// Blocks until all earlier operations are merged. Returns the sticky
    /// error if any operation has failed, otherwise
    /// [`NotFound`](SettingsError::NotFound) or
    /// [`NotATree`](SettingsError::NotATree) when the path does not resolve.
    pub fn get(&self, path: &str) -> Result<Value> {
        let state = self.settle();
        Self::check(&state)?;
        extract(&state.values, path).cloned()
    }

    /// Like [`get`](Self::get), then deserializes the value into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get(path)?;
        serde_json::from_value(value).map_err(|e| SettingsError::Deserialize {
            path: path.to_string(),
            source: Arc::new(e),
        })
    }

    /// Returns a copy of the whole merged tree.
    pub fn snapshot(&self) -> Result<SettingsTree> {
        let state = self.settle();
        Self::check(&state)?;
        Ok(state.values.clone())
    }

    /// Deserializes the whole merged tree into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let tree = self.snapshot()?;
        serde_json::from_value(Value::Object(tree)).map_err(|e| SettingsError::Deserialize {
            path: String::new(),
            source: Arc::new(e),
        })
    }

    /// Drains the pending queue into the state and returns the held lock.
    ///
    /// The state lock is taken before the queue is drained, so concurrent
    /// readers settle one after another and none of them can observe a
    /// later operation merged ahead of an earlier one.
    fn settle(&self) -> parking_lot::MutexGuard<'_, State> {
        let mut state = self.state.lock();
        for (seq, outcome) in self.pending.drain_in_order() {
            state.absorb(seq, outcome);
        }
        state
    }

    fn check(state: &State) -> Result<()> {
        match &state.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn submit<F>(&self, kind: &'static str, work: F) -> &Self
    where
        F: FnOnce() -> Outcome + Send + 'static,
    {
        let completer = self.pending.enqueue();
        let seq = completer.seq();
        debug!(seq, kind, "settings operation enqueued");

        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || {
                let outcome = work();
                debug!(seq, kind, ok = outcome.is_ok(), "settings operation finished");
                completer.complete(outcome);
            });

        // A failed spawn drops the completer, so the slot resolves to WorkerLost.
        if let Err(e) = spawned {
            warn!(seq, kind, error = %e, "failed to spawn settings worker");
        }

        self
    }
}
