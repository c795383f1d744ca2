//! Dialogue token store and the text-key bundles handed to localization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::TextKey;

/// Per-encounter interpolation values. Later writes replace earlier ones.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueTokens {
    tokens: BTreeMap<String, String>,
}

impl DialogueTokens {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tokens.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.tokens.remove(key)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// `"money"` becomes `"Money"`.
pub fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn namespaced(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        return key.to_string();
    }
    format!("{prefix}{}", capitalize(key))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    pub speaker: Option<TextKey>,
    pub text: TextKey,
}

impl DialogueLine {
    pub fn new(text: impl Into<TextKey>) -> Self {
        Self { speaker: None, text: text.into() }
    }

    pub fn spoken_by(speaker: impl Into<TextKey>, text: impl Into<TextKey>) -> Self {
        Self { speaker: Some(speaker.into()), text: text.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDialogue {
    pub intro: Vec<DialogueLine>,
    pub title: Option<TextKey>,
    pub description: Option<TextKey>,
    pub query: Option<TextKey>,
    pub outro: Vec<DialogueLine>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDialogue {
    pub label: Option<TextKey>,
    pub tooltip: Option<TextKey>,
    pub disabled_tooltip: Option<TextKey>,
    pub selected: Vec<DialogueLine>,
}
