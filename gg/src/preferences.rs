//! Traveller preference types and merge rules

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::destinations::KnownDestinations;

/// Preference key for the trip destination
pub const DESTINATION: &str = "destination";
/// Preference key for the travel season
pub const SEASON: &str = "season";
/// Preference key for the number of travellers
pub const GROUP_SIZE: &str = "group_size";
/// Preference key for the budget
pub const BUDGET: &str = "budget";

/// Display order for the well-known keys; extension keys follow alphabetically
const DISPLAY_ORDER: [&str; 4] = [DESTINATION, SEASON, GROUP_SIZE, BUDGET];

/// Result of one extraction call, before it is merged
///
/// Every field is optional; `null` and missing both mean "not mentioned".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TripPreferences {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub group_size: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub budget: Option<i64>,
}

/// Accept integers, integral floats and numeric strings
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(Some(f as i64)),
                    _ => Err(D::Error::custom(format!("expected an integer, got {}", n))),
                }
            }
        }
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected an integer, got \"{}\"", s))),
        Some(other) => Err(D::Error::custom(format!("expected an integer, got {}", other))),
    }
}

impl TripPreferences {
    /// True when no field was extracted
    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.season.is_none() && self.group_size.is_none() && self.budget.is_none()
    }

    /// Merge into a copy of `current`, overwriting only the fields present here
    ///
    /// Destinations go through the normalizer, seasons are lower-cased and
    /// numbers are stringified. Blank strings count as absent.
    pub fn merge_into(&self, current: &PreferenceMap, destinations: &KnownDestinations) -> PreferenceMap {
        debug!(?self, "TripPreferences::merge_into: called");
        let mut updated = current.clone();

        if let Some(destination) = &self.destination {
            let normalized = destinations.normalize(destination);
            if !normalized.is_empty() {
                updated.set(DESTINATION, normalized);
            }
        }

        if let Some(season) = &self.season {
            let season = season.trim().to_lowercase();
            if !season.is_empty() {
                updated.set(SEASON, season);
            }
        }

        if let Some(group_size) = self.group_size {
            updated.set(GROUP_SIZE, group_size.to_string());
        }

        if let Some(budget) = self.budget {
            updated.set(BUDGET, budget.to_string());
        }

        updated
    }
}

/// Persisted traveller preferences: key to display-ready string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceMap(BTreeMap<String, String>);

impl PreferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Insert or overwrite a key; keys are never removed
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries with the well-known keys first, then the rest alphabetically
    pub fn display_entries(&self) -> Vec<(&str, &str)> {
        let known = DISPLAY_ORDER.iter().filter_map(|key| self.get(key).map(|value| (*key, value)));
        let extra = self.iter().filter(|(key, _)| !DISPLAY_ORDER.contains(key));
        known.chain(extra).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PreferenceMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Render preferences for the system prompt
pub fn preferences_to_text(preferences: &PreferenceMap) -> String {
    if preferences.is_empty() {
        return "No confirmed traveller preferences yet. Ask follow-up questions to learn more.".to_string();
    }

    let formatted = preferences
        .display_entries()
        .into_iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Confirmed traveller preferences - {}.", formatted)
}
