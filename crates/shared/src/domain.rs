use std::fmt;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

/// Menu item identifier. Doubles as the button text on the reply keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatting {
    Plain,
    /// Rendered with the transport's markup mode (HTML for Telegram).
    Rich,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyPayload {
    pub text: String,
    pub formatting: Formatting,
    pub keyboard_attached: bool,
}

impl ReplyPayload {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatting: Formatting::Plain,
            keyboard_attached: false,
        }
    }

    pub fn rich(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            formatting: Formatting::Rich,
            keyboard_attached: false,
        }
    }

    pub fn with_keyboard(mut self) -> Self {
        self.keyboard_attached = true;
        self
    }
}

/// Outcome of routing one inbound text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    /// `None` for fallback replies, admin commands and failed handling.
    pub label: Option<Label>,
    pub replies: Vec<ReplyPayload>,
}

impl DispatchResult {
    pub fn unmatched(replies: Vec<ReplyPayload>) -> Self {
        Self {
            label: None,
            replies,
        }
    }

    pub fn silent() -> Self {
        Self::unmatched(Vec::new())
    }
}

/// Per-label counts in canonical label order.
///
/// The label set is fixed when the set is built; [`CounterSet::increment`]
/// refuses labels outside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterSet {
    entries: Vec<(Label, u64)>,
}

impl CounterSet {
    pub fn zeroed<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = Label>,
    {
        let mut entries: Vec<(Label, u64)> = Vec::new();
        for label in labels {
            if !entries.iter().any(|(known, _)| *known == label) {
                entries.push((label, 0));
            }
        }
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(known, _)| known.as_str() == label)
            .map(|(_, count)| *count)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Overwrites the count for a known label. Returns `false` for unknown labels.
    pub fn set(&mut self, label: &str, count: u64) -> bool {
        match self.slot(label) {
            Some(slot) => {
                *slot = count;
                true
            }
            None => false,
        }
    }

    /// Adds one to a known label and returns the new count.
    pub fn increment(&mut self, label: &str) -> Option<u64> {
        let slot = self.slot(label)?;
        *slot = slot.saturating_add(1);
        Some(*slot)
    }

    pub fn reset(&mut self) {
        for (_, count) in &mut self.entries {
            *count = 0;
        }
    }

    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, (_, count)| acc.saturating_add(*count))
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.entries.iter().map(|(label, _)| label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, u64)> {
        self.entries.iter().map(|(label, count)| (label, *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&mut self, label: &str) -> Option<&mut u64> {
        self.entries
            .iter_mut()
            .find(|(known, _)| known.as_str() == label)
            .map(|(_, count)| count)
    }
}

impl Serialize for CounterSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label.as_str(), count)?;
        }
        map.end()
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
