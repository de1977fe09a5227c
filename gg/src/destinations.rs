//! Destination name normalization
//!
//! Best-effort correction of free-text destination names against a known
//! list. This is a prefix heuristic, not fuzzy matching: it fixes casing and
//! completes obvious abbreviations ("rio" → "Rio De Janeiro") and otherwise
//! passes the cleaned input through.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info, warn};

/// Title-case a string: the first cased letter of every run of cased
/// letters is upper-cased, the rest lower-cased
///
/// Anything without case starts a new run, so `o'hare` becomes `O'Hare` and
/// `東京tokyo` becomes `東京Tokyo`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_cased = false;
    for c in s.chars() {
        if prev_is_cased {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_is_cased = is_cased(c);
    }
    out
}

/// Upper, lower or title case letter; scripts without case are not cased
fn is_cased(c: char) -> bool {
    c.is_lowercase() || c.is_uppercase() || c.to_lowercase().ne(c.to_uppercase())
}

/// Canonical destination names, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct KnownDestinations {
    /// Title-cased names in file order, without duplicates
    names: Vec<String>,
}

impl KnownDestinations {
    /// Build from raw names; each is trimmed and title-cased
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = title_case(name.as_ref().trim());
            if !name.is_empty() && !out.contains(&name) {
                out.push(name);
            }
        }
        Self { names: out }
    }

    /// Load a JSON array of names
    ///
    /// Never fails: a missing, unreadable or malformed file yields an empty
    /// set and the normalizer degrades to plain title-casing.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        debug!(?path, "KnownDestinations::load: called");

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(?path, "KnownDestinations::load: file not found");
                return Self::default();
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to read destinations list");
                return Self::default();
            }
        };

        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(serde_json::Value::Array(items)) => {
                let names = items.iter().map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
                let known = Self::new(names);
                info!(count = known.len(), "Loaded known destinations");
                known
            }
            Ok(_) => {
                debug!(?path, "KnownDestinations::load: document is not a list");
                Self::default()
            }
            Err(e) => {
                debug!(?path, error = %e, "Failed to load destinations list");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Map a raw destination string to its canonical form
    pub fn normalize(&self, raw: &str) -> String {
        let title_cased = title_case(raw.trim());
        if title_cased.is_empty() {
            return title_cased;
        }

        if self.names.is_empty() || self.contains(&title_cased) {
            return title_cased;
        }

        let needle = title_cased.to_lowercase();
        match self.names.iter().find(|known| known.to_lowercase().starts_with(&needle)) {
            Some(known) => {
                debug!(%raw, %known, "normalize: prefix match");
                known.clone()
            }
            None => title_cased,
        }
    }
}
