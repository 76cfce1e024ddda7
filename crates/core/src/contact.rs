use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(name, number)` candidate extracted from a single line of OCR text.
/// Either field may be empty; [`ContactPair::is_empty`] pairs are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactPair {
    pub name: String,
    pub number: String,
}

impl ContactPair {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self { name: name.into(), number: number.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.number.is_empty()
    }
}

impl fmt::Display for ContactPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.number)
    }
}

/// Render pairs one per line as `name - number`.
pub fn format_contact_list(pairs: &[ContactPair]) -> String {
    pairs
        .iter()
        .map(ContactPair::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten recognized texts into trimmed, non-empty lines.
/// Image order is kept, then line order within each text.
pub fn split_lines<I, S>(texts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    texts
        .into_iter()
        .flat_map(|text| {
            text.as_ref()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
