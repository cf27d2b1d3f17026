//! In-memory model of the engine's own settings file (`springsettings.cfg`).
//!
//! The file is a flat list of `Key = Value` lines. Anything that does not
//! parse as an entry (comments, blank lines) is kept verbatim so that a
//! rewrite only touches the keys that were changed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::OptionTable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("invalid engine setting {key:?}: {reason}")]
    Malformed { key: String, reason: &'static str },
}

/// Settings to push into the engine's store before launch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsPatch {
    /// Written only when the key is not set yet.
    #[serde(default)]
    pub defaults: OptionTable,
    /// Always written.
    #[serde(default)]
    pub overrides: OptionTable,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.overrides.is_empty()
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        for (key, value) in self.defaults.iter().chain(self.overrides.iter()) {
            validate_entry(key, value)?;
        }
        Ok(())
    }
}

fn validate_entry(key: &str, value: &str) -> Result<(), SettingsError> {
    let malformed = |reason| {
        Err(SettingsError::Malformed {
            key: key.to_string(),
            reason,
        })
    };

    if key.is_empty() {
        return malformed("key is empty");
    }
    if key.contains('=') {
        return malformed("key contains '='");
    }
    if key.chars().any(char::is_whitespace) {
        return malformed("key contains whitespace");
    }
    if value.contains(['\n', '\r']) {
        return malformed("value contains a line break");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Entry { key: String, value: String },
    Verbatim(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    lines: Vec<Line>,
}

impl EngineSettings {
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|raw| {
                let trimmed = raw.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    return Line::Verbatim(raw.to_string());
                }
                match trimmed.split_once('=') {
                    Some((key, value)) if !key.trim().is_empty() => Line::Entry {
                        key: key.trim().to_string(),
                        value: value.trim().to_string(),
                    },
                    _ => Line::Verbatim(raw.to_string()),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns `true` if the stored value changed.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    if v == value {
                        return false;
                    }
                    *v = value.to_string();
                    return true;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
        true
    }

    /// Applies defaults then overrides. Nothing is modified when any entry of
    /// the patch is malformed. Returns the number of keys that changed.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<usize, SettingsError> {
        patch.validate()?;

        let mut changed = 0;
        for (key, value) in patch.defaults.iter() {
            if !self.contains(key) && self.set(key, value) {
                changed += 1;
            }
        }
        for (key, value) in patch.overrides.iter() {
            if self.set(key, value) {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push_str(" = ");
                    out.push_str(value);
                }
                Line::Verbatim(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }
}
