//! Archetype resource-description metadata
//!
//! The slice of an archetype's resource description this editor works
//! on, stored as a JSON document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ArchetypeMeta {
    #[serde(default)]
    pub archetype_id: String,

    /// Main concept name, e.g. "Blood pressure".
    #[serde(default)]
    pub concept: String,

    #[serde(default)]
    pub purpose: String,

    #[serde(default = "default_language")]
    pub original_language: String,

    /// Free-form author details (name, organisation, email, date, ...).
    #[serde(default)]
    pub original_author: BTreeMap<String, String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Translation languages; `checked` marks a translation as present.
    #[serde(default)]
    pub languages: Vec<LanguageItem>,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageItem {
    pub code: String,
    pub label: String,
    #[serde(default)]
    pub checked: bool,
}

impl ArchetypeMeta {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut meta: ArchetypeMeta = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        if meta.languages.is_empty() {
            meta.languages = default_languages();
        }
        Ok(meta)
    }

    /// Loads the document, falling back to an empty one when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match Self::load(path) {
                Ok(meta) => return meta,
                Err(e) => tracing::warn!("failed to load {}: {:#}", path.display(), e),
            }
        }
        let mut meta = ArchetypeMeta::default();
        meta.original_language = default_language();
        meta.languages = default_languages();
        meta
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

/// Catalog of translation languages offered by default.
pub fn default_languages() -> Vec<LanguageItem> {
    [
        ("en", "English"),
        ("de", "German"),
        ("es", "Spanish"),
        ("pt", "Portuguese"),
        ("sl", "Slovenian"),
        ("ja", "Japanese"),
    ]
    .iter()
    .map(|(code, label)| LanguageItem {
        code: code.to_string(),
        label: label.to_string(),
        checked: false,
    })
    .collect()
}

/// Languages as `(code, label)` pairs for select population.
pub fn language_choices(languages: &[LanguageItem]) -> Vec<(String, String)> {
    languages
        .iter()
        .map(|l| (l.code.clone(), l.label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let mut meta = ArchetypeMeta::default();
        meta.archetype_id = "openEHR-EHR-OBSERVATION.blood_pressure.v1".to_string();
        meta.concept = "Blood pressure".to_string();
        meta.original_language = "en".to_string();
        meta.original_author
            .insert("name".to_string(), "A. Person".to_string());
        meta.keywords = vec!["pressure".to_string(), "vital signs".to_string()];
        meta.languages = default_languages();

        let json = serde_json::to_string_pretty(&meta).unwrap();
        let back: ArchetypeMeta = serde_json::from_str(&json).unwrap();

        assert_eq!(back.archetype_id, meta.archetype_id);
        assert_eq!(back.keywords, meta.keywords);
        assert_eq!(back.original_author, meta.original_author);
        assert_eq!(back.languages.len(), meta.languages.len());
    }

    #[test]
    fn missing_fields_default() {
        let meta: ArchetypeMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta.original_language, "en");
        assert!(meta.keywords.is_empty());
        assert!(meta.original_author.is_empty());
    }
}
