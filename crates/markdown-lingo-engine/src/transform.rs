//! The hook through which prose is swapped for translations.
//!
//! The renderer decides which text is eligible and in which shape it is
//! offered; a [`Transform`] only answers "replace this?" for the exact string
//! it receives. Returning `None` keeps the original text and is the normal
//! outcome for anything the hook does not know.

use std::collections::HashMap;

/// How a piece of text offered to a [`Transform`] should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Whitespace-trimmed prose from a run of sibling text nodes.
    Plain,
    /// A complete raw markup (HTML) fragment.
    RawMarkup,
}

/// Supplies replacement text during rendering.
///
/// Runs synchronously on the rendering thread, so implementations should
/// return promptly.
pub trait Transform {
    fn transform(&self, kind: TextKind, text: &str) -> Option<String>;
}

impl<F> Transform for F
where
    F: Fn(TextKind, &str) -> Option<String>,
{
    fn transform(&self, kind: TextKind, text: &str) -> Option<String> {
        self(kind, text)
    }
}

/// A lookup table of exact source strings to their replacements.
///
/// Answers both [`TextKind`]s, so whole raw markup fragments can be translated
/// by listing them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Translations {
    entries: HashMap<String, String>,
}

impl Translations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, replacement: impl Into<String>) {
        self.entries.insert(source.into(), replacement.into());
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for Translations {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Translations {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Extend<(String, String)> for Translations {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl IntoIterator for Translations {
    type Item = (String, String);
    type IntoIter = std::collections::hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Transform for Translations {
    fn transform(&self, _kind: TextKind, text: &str) -> Option<String> {
        self.get(text).map(str::to_owned)
    }
}
