//! Persistent session memory
//!
//! Traveller preferences and the chat transcript live in one JSON document:
//!
//! ```text
//! {
//!   "preferences": { "destination": "Japan", "season": "spring" },
//!   "history": [
//!     { "type": "human", "content": "..." },
//!     { "type": "ai", "content": "..." }
//!   ]
//! }
//! ```
//!
//! Reads are permissive: a missing or corrupt file is a fresh start. Writes go
//! through a temporary file that is renamed over the target.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::llm::Message;
use crate::preferences::PreferenceMap;

/// One turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatTurn {
    Human { content: String },
    Ai { content: String },
}

impl ChatTurn {
    pub fn human(content: impl Into<String>) -> Self {
        ChatTurn::Human {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        ChatTurn::Ai {
            content: content.into(),
        }
    }

    /// Rebuild a turn from a stored record
    ///
    /// Returns `None` for unknown `type` tags, non-object records and
    /// non-string content. A missing `content` is treated as empty.
    fn from_stored(record: &serde_json::Value) -> Option<Self> {
        let object = record.as_object()?;
        let content = match object.get("content") {
            None => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(_) => return None,
        };
        match object.get("type")?.as_str()? {
            "human" => Some(ChatTurn::human(content)),
            "ai" => Some(ChatTurn::ai(content)),
            other => {
                debug!(%other, "ChatTurn::from_stored: skipping unknown turn type");
                None
            }
        }
    }

    /// Convert to an LLM transcript message
    pub fn to_message(&self) -> Message {
        match self {
            ChatTurn::Human { content } => Message::user(content.clone()),
            ChatTurn::Ai { content } => Message::assistant(content.clone()),
        }
    }
}

/// Ordered conversation transcript, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::human(content));
    }

    pub fn add_ai_message(&mut self, content: impl Into<String>) {
        self.push(ChatTurn::ai(content));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop the oldest turns so at most `max_turns` remain
    ///
    /// The kept transcript always opens with a human turn, so an odd cap keeps
    /// one turn fewer. Caps below 2 keep the last exchange.
    pub fn retain_last(&mut self, max_turns: usize) {
        let max_turns = max_turns.max(2);
        if self.turns.len() <= max_turns {
            return;
        }

        let mut excess = self.turns.len() - max_turns;
        while matches!(self.turns.get(excess), Some(ChatTurn::Ai { .. })) {
            excess += 1;
        }
        debug!(%excess, %max_turns, "ChatHistory::retain_last: dropping oldest turns");
        self.turns.drain(..excess);
    }

    /// Transcript in LLM message form
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(ChatTurn::to_message).collect()
    }
}

impl FromIterator<ChatTurn> for ChatHistory {
    fn from_iter<I: IntoIterator<Item = ChatTurn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

/// Everything that persists between runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub preferences: PreferenceMap,
    pub history: ChatHistory,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty() && self.history.is_empty()
    }
}

/// On-disk shape, read permissively
#[derive(Debug, Default, Deserialize)]
struct StoredState {
    #[serde(default)]
    preferences: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    history: Vec<serde_json::Value>,
}

impl StoredState {
    fn into_session(self) -> SessionState {
        let preferences = self
            .preferences
            .into_iter()
            .filter_map(|(key, value)| match value {
                serde_json::Value::String(s) => Some((key, s)),
                serde_json::Value::Number(n) => Some((key, n.to_string())),
                serde_json::Value::Bool(b) => Some((key, b.to_string())),
                _ => {
                    debug!(%key, "StoredState::into_session: skipping non-scalar preference");
                    None
                }
            })
            .collect();
        let history = self.history.iter().filter_map(ChatTurn::from_stored).collect();
        SessionState { preferences, history }
    }
}

/// On-disk shape for writing
#[derive(Serialize)]
struct StoredStateRef<'a> {
    preferences: &'a PreferenceMap,
    history: &'a [ChatTurn],
}

/// JSON-file backing store for [`SessionState`]
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, or an empty one if the file is missing or corrupt
    pub fn load(&self) -> SessionState {
        debug!(path = ?self.path, "SessionStore::load: called");
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("SessionStore::load: no state file, starting fresh");
                return SessionState::default();
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read session state, starting fresh");
                return SessionState::default();
            }
        };

        match serde_json::from_str::<StoredState>(&content) {
            Ok(stored) => {
                let state = stored.into_session();
                info!(
                    preferences = state.preferences.len(),
                    turns = state.history.len(),
                    "Loaded session state"
                );
                state
            }
            Err(e) => {
                debug!(error = %e, "SessionStore::load: state file is corrupt, starting fresh");
                SessionState::default()
            }
        }
    }

    /// Write the session atomically (temp file in the same directory, then rename)
    pub fn save(&self, state: &SessionState) -> Result<()> {
        debug!(path = ?self.path, turns = state.history.len(), "SessionStore::save: called");
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).context(format!("Failed to create state directory {}", dir.display()))?;

        let payload = StoredStateRef {
            preferences: &state.preferences,
            history: state.history.turns(),
        };
        let json = serde_json::to_string_pretty(&payload).context("Failed to serialize session state")?;

        let mut tmp = NamedTempFile::new_in(&dir).context("Failed to create temporary state file")?;
        writeln!(tmp, "{}", json).context("Failed to write temporary state file")?;
        tmp.as_file().sync_all().context("Failed to flush temporary state file")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .context(format!("Failed to replace state file {}", self.path.display()))?;
        Ok(())
    }

    /// Clear everything and persist the empty state immediately
    pub fn reset(&self) -> Result<SessionState> {
        debug!(path = ?self.path, "SessionStore::reset: called");
        let state = SessionState::default();
        self.save(&state)?;
        info!("Session state reset");
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> SessionStore {
        SessionStore::new(temp.path().join("data").join("preferences.json"))
    }

    fn sample_state() -> SessionState {
        let mut state = SessionState::default();
        state.preferences.set("destination", "Japan");
        state.preferences.set("budget", "2000");
        state.history.add_user_message("I want to go to japan");
        state.history.add_ai_message("Great choice! When are you travelling?");
        state
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        assert!(store(&temp).load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        for corrupt in ["{not json", "[1, 2, 3]", "\"just a string\"", r#"{"history": "nope"}"#] {
            fs::write(store.path(), corrupt).unwrap();
            assert!(store.load().is_empty(), "{corrupt} should load as empty");
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let state = sample_state();

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_saved_document_shape() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.save(&sample_state()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  \"preferences\""), "two-space indentation expected");

        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["preferences"]["destination"], "Japan");
        assert_eq!(doc["history"][0]["type"], "human");
        assert_eq!(doc["history"][1]["type"], "ai");
        assert_eq!(doc["history"][1]["content"], "Great choice! When are you travelling?");
    }

    #[test]
    fn test_load_skips_unknown_and_malformed_turns() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"{
              "preferences": {"season": "winter", "group_size": 3, "notes": null},
              "history": [
                {"type": "system", "content": "ignored"},
                {"type": "human", "content": "hello"},
                {"type": "tool", "content": "ignored"},
                {"type": "ai"},
                {"type": "human", "content": 5},
                "garbage"
              ]
            }"#,
        )
        .unwrap();

        let state = store.load();
        assert_eq!(state.preferences.get("season"), Some("winter"));
        assert_eq!(state.preferences.get("group_size"), Some("3"));
        assert!(state.preferences.get("notes").is_none());
        assert_eq!(
            state.history.turns(),
            &[ChatTurn::human("hello"), ChatTurn::ai("")]
        );
    }

    #[test]
    fn test_load_missing_sections_default() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), r#"{"preferences": {"destination": "Peru"}}"#).unwrap();

        let state = store.load();
        assert_eq!(state.preferences.get("destination"), Some("Peru"));
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_reset_clears_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.save(&sample_state()).unwrap();

        let state = store.reset().unwrap();
        assert!(state.is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.save(&sample_state()).unwrap();
        store.save(&SessionState::default()).unwrap();

        let entries: Vec<_> = fs::read_dir(store.path().parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("preferences.json")]);
    }

    fn exchanges(n: usize) -> ChatHistory {
        let mut history = ChatHistory::new();
        for i in 0..n {
            history.add_user_message(format!("q{i}"));
            history.add_ai_message(format!("a{i}"));
        }
        history
    }

    #[test]
    fn test_retain_last_odd_cap_keeps_whole_exchanges() {
        let mut history = exchanges(3);
        history.retain_last(3);
        assert_eq!(history.turns(), &[ChatTurn::human("q2"), ChatTurn::ai("a2")]);
    }

    #[test]
    fn test_retain_last_never_starts_with_ai() {
        for cap in 0..8 {
            let mut history = exchanges(4);
            history.retain_last(cap);
            assert!(
                matches!(history.turns().first(), Some(ChatTurn::Human { .. })),
                "cap {cap} left {:?}",
                history.turns()
            );
            assert!(history.len() <= cap.max(2));
        }
    }

    #[test]
    fn test_retain_last() {
        let mut history: ChatHistory = (0..5).map(|i| ChatTurn::human(i.to_string())).collect();
        history.retain_last(2);
        assert_eq!(history.turns(), &[ChatTurn::human("3"), ChatTurn::human("4")]);

        history.retain_last(10);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_to_messages_preserves_order() {
        let history = sample_state().history;
        let messages = history.to_messages();
        assert_eq!(messages[0], Message::user("I want to go to japan"));
        assert_eq!(messages[1], Message::assistant("Great choice! When are you travelling?"));
    }

    proptest! {
        #[test]
        fn prop_round_trip_any_history(
            turns in prop::collection::vec((any::<bool>(), ".{0,40}"), 0..12),
            prefs in prop::collection::btree_map("[a-z_]{1,10}", ".{0,20}", 0..5),
        ) {
            let temp = TempDir::new().unwrap();
            let store = store(&temp);
            let state = SessionState {
                preferences: prefs.into_iter().collect(),
                history: turns
                    .into_iter()
                    .map(|(human, text)| if human { ChatTurn::human(text) } else { ChatTurn::ai(text) })
                    .collect(),
            };

            store.save(&state).unwrap();
            prop_assert_eq!(store.load(), state);
        }
    }
}
