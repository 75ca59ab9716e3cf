//! Hashtag normalization.
//!
//! Tags are stored as one lower-cased, `#`-stripped, de-duplicated, sorted,
//! comma-joined string. Nothing outside this module builds that string.

use std::collections::BTreeSet;

fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

/// Splits raw user input into individual normalized tags.
pub fn split_tags<S: AsRef<str>>(inputs: &[S]) -> BTreeSet<String> {
    inputs
        .iter()
        .flat_map(|input| input.as_ref().split(is_separator))
        .map(|tag| tag.trim_matches('#').trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// `["#Foo", "bar", "FOO"]` becomes `"bar,foo"`.
#[allow(dead_code)]
pub fn normalize<S: AsRef<str>>(inputs: &[S]) -> String {
    join(&split_tags(inputs))
}

#[allow(dead_code)]
pub fn join(tags: &BTreeSet<String>) -> String {
    tags.iter().cloned().collect::<Vec<_>>().join(",")
}

/// Reads a stored string back into sorted tags.
pub fn parse_stored(stored: Option<&str>) -> Vec<String> {
    stored
        .map(|s| split_tags(&[s]).into_iter().collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Add,
    Remove,
}

/// Result of a hashtag edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagEdit {
    /// Tags that actually changed; empty when the edit was a no-op
    pub applied: Vec<String>,
    pub resulting: Vec<String>,
}

impl HashtagEdit {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn stored(&self) -> String {
        self.resulting.join(",")
    }
}

/// Union (add) or difference (remove) of `current` with the requested tags.
pub fn apply_edit<S: AsRef<str>>(current: Option<&str>, requested: &[S], mode: EditMode) -> HashtagEdit {
    let mut tags: BTreeSet<String> = parse_stored(current).into_iter().collect();
    let requested = split_tags(requested);

    let applied: Vec<String> = match mode {
        EditMode::Add => requested.into_iter().filter(|t| tags.insert(t.clone())).collect(),
        EditMode::Remove => requested.into_iter().filter(|t| tags.remove(t)).collect(),
    };

    HashtagEdit {
        applied,
        resulting: tags.into_iter().collect(),
    }
}
