use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{ANONYMOUS_IDENTITY, LABEL_HEAD, LABEL_MAX_LEN, LABEL_TAIL};

/// Opaque principal identifier. Only ever rendered, never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_IDENTITY.to_string())
    }

    pub fn to_text(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_IDENTITY
    }

    /// Shortened display label: identifiers longer than 10 characters
    /// become `first5…last3`, shorter ones are returned unchanged.
    pub fn short_label(&self) -> String {
        shorten(&self.0)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Character-based so multi-byte identifiers never split mid-codepoint.
pub(crate) fn shorten(text: &str) -> String {
    let count = text.chars().count();
    if count <= LABEL_MAX_LEN {
        return text.to_string();
    }
    let head: String = text.chars().take(LABEL_HEAD).collect();
    let tail: String = text.chars().skip(count - LABEL_TAIL).collect();
    format!("{head}…{tail}")
}
