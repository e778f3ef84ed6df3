use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::io::write_atomic;
use crate::models::ArticleIdea;

/// Record of every idea already published, used to keep new topics novel across runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageHistory {
    #[serde(default)]
    pub topic_keys: BTreeSet<String>,
    #[serde(default)]
    pub titles: BTreeSet<String>,
    #[serde(default)]
    pub category_counts: BTreeMap<String, u32>,
}

/// Every shape `used_topics.json` has had on disk
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    /// Early versions stored only the list of topic keys
    Legacy(Vec<String>),
    Current(UsageHistory),
}

impl From<StoredHistory> for UsageHistory {
    fn from(stored: StoredHistory) -> Self {
        match stored {
            StoredHistory::Legacy(keys) => Self {
                topic_keys: keys.into_iter().collect(),
                ..Self::default()
            },
            StoredHistory::Current(history) => history,
        }
    }
}

impl UsageHistory {
    /// Parse either the current object form or the legacy bare list of keys
    pub fn from_json_str(json: &str) -> Result<Self> {
        let stored: StoredHistory =
            serde_json::from_str(json).context("Failed to parse usage history JSON")?;
        Ok(stored.into())
    }

    /// Load history from disk. A missing or unreadable file yields an empty history.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "no usage history yet, starting empty");
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read usage history, starting empty");
                return Self::default();
            }
        };

        match Self::from_json_str(&content) {
            Ok(history) => history,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt usage history, starting empty");
                Self::default()
            }
        }
    }

    /// Persist the history. The previous file stays intact if the write fails midway.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize usage history")?;
        write_atomic(path, json.as_bytes())
            .with_context(|| format!("Failed to write usage history: {}", path.display()))?;

        Ok(())
    }

    /// Mark an idea as used after its article has been published
    pub fn record(&mut self, idea: &ArticleIdea) {
        self.topic_keys.insert(idea.topic_key.clone());
        self.titles.insert(idea.title.clone());
        *self.category_counts.entry(idea.category.clone()).or_insert(0) += 1;
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.topic_keys.contains(key)
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn category_count(&self, category: &str) -> u32 {
        self.category_counts.get(category).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.topic_keys.is_empty() && self.titles.is_empty() && self.category_counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(key: &str, title: &str, category: &str) -> ArticleIdea {
        ArticleIdea {
            title: title.to_string(),
            category: category.to_string(),
            outline: vec!["Intro".to_string()],
            topic_key: key.to_string(),
        }
    }

    #[test]
    fn legacy_list_becomes_keys_only() {
        let history =
            UsageHistory::from_json_str(r#"["Breed Profiles_Ragdoll", "Health Care_Obesity"]"#)
                .unwrap();

        let expected: BTreeSet<String> = ["Breed Profiles_Ragdoll", "Health Care_Obesity"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(history.topic_keys, expected);
        assert!(history.titles.is_empty());
        assert!(history.category_counts.is_empty());
    }

    #[test]
    fn empty_legacy_list_is_empty_history() {
        let history = UsageHistory::from_json_str("[]").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn current_format_with_missing_fields_uses_defaults() {
        let history = UsageHistory::from_json_str(r#"{"topic_keys": ["a"]}"#).unwrap();
        assert!(history.has_key("a"));
        assert!(history.titles.is_empty());
        assert_eq!(history.category_count("anything"), 0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(UsageHistory::from_json_str("not json").is_err());
        assert!(UsageHistory::from_json_str("42").is_err());
    }

    #[test]
    fn record_updates_all_three_fields() {
        let mut history = UsageHistory::default();
        history.record(&idea("Kitten Care_1-2 Month Old_Feeding", "Kitten Feeding", "Kitten Care"));
        history.record(&idea("Kitten Care_2-3 Month Old_Feeding", "More Feeding", "Kitten Care"));

        assert!(history.has_key("Kitten Care_1-2 Month Old_Feeding"));
        assert!(history.has_title("More Feeding"));
        assert_eq!(history.category_count("Kitten Care"), 2);
        assert_eq!(history.category_count("Health Care"), 0);
    }

    #[test]
    fn load_treats_corrupt_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("used_topics.json");
        fs::write(&path, "{ this is not json").unwrap();

        assert!(UsageHistory::load(&path).is_empty());
    }

    #[test]
    fn load_treats_missing_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(UsageHistory::load(&dir.path().join("nope.json")).is_empty());
    }

    #[test]
    fn save_replaces_existing_file_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site").join("used_topics.json");

        let mut history = UsageHistory::default();
        history.record(&idea("Health Care_Obesity", "Obesity in Cats", "Health Care"));
        history.save(&path).unwrap();
        history.record(&idea("Health Care_Arthritis", "Arthritis in Cats", "Health Care"));
        history.save(&path).unwrap();

        assert_eq!(UsageHistory::load(&path), history);
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
