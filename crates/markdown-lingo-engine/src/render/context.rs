use std::borrow::Cow;

use crate::policy::Policy;
use crate::transform::{TextKind, Transform};

use super::writer::Writer;

/// Numbering and marker state of one open list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFrame {
    pub ordered: bool,
    pub marker: u8,
    pub next_number: u64,
}

/// How the code span currently being rendered is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpanState {
    /// Number of backticks on each side.
    pub delimiter_width: usize,
    /// Whether one space pads the content on each side.
    pub pad: bool,
}

/// The line break that followed the last text node added to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    Soft,
    Hard,
}

/// Accumulates a maximal run of sibling text nodes.
#[derive(Debug, Default)]
pub struct TextRun {
    pub buffer: String,
    /// Break recorded by the most recent node, not yet materialized.
    pub pending_break: Option<LineBreak>,
    pub active: bool,
}

/// Mutable state of one in-flight render.
///
/// Created fresh for every render call and passed explicitly to each handler.
pub struct RenderContext<'r> {
    pub writer: Writer<'r>,
    pub source: &'r str,
    pub policy: &'r Policy,
    transform: Option<&'r dyn Transform>,
    pub lists: Vec<ListFrame>,
    pub code_span: Option<CodeSpanState>,
    pub text_run: TextRun,
    skip_translation: bool,
}

impl<'r> RenderContext<'r> {
    pub fn new(
        writer: Writer<'r>,
        source: &'r str,
        policy: &'r Policy,
        transform: Option<&'r dyn Transform>,
    ) -> Self {
        Self {
            writer,
            source,
            policy,
            transform,
            lists: Vec::new(),
            code_span: None,
            text_run: TextRun::default(),
            skip_translation: false,
        }
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    pub fn skip_translation(&self) -> bool {
        self.skip_translation
    }

    /// Opens or closes a skip-translation region.
    ///
    /// # Panics
    /// In debug builds, panics when a region is opened inside another one or
    /// closed twice; regions never nest.
    pub fn set_skip_translation(&mut self, skip: bool) {
        debug_assert_ne!(
            self.skip_translation, skip,
            "skip-translation regions must be strictly paired"
        );
        self.skip_translation = skip;
    }

    /// Offers `text` to the transform hook.
    ///
    /// Plain text inside a skip-translation region and empty text are never
    /// offered.
    pub fn transform(&self, kind: TextKind, text: &str) -> Option<String> {
        if text.is_empty() || (kind == TextKind::Plain && self.skip_translation) {
            return None;
        }
        let replacement = self.transform?.transform(kind, text)?;
        log::trace!(
            "replaced {kind:?} text ({} bytes -> {} bytes)",
            text.len(),
            replacement.len()
        );
        Some(replacement)
    }

    /// Looks up the whitespace-trimmed `text` and returns the replacement with
    /// the original leading and trailing whitespace re-attached, or `text`
    /// itself when there is none.
    pub fn translate<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match self.transform(TextKind::Plain, text.trim()) {
            Some(replacement) => {
                let leading = &text[..text.len() - text.trim_start().len()];
                let trailing = &text[text.trim_end().len()..];
                Cow::Owned(format!("{leading}{replacement}{trailing}"))
            }
            None => Cow::Borrowed(text),
        }
    }

    /// Writes `text` through [`RenderContext::translate`].
    pub fn write_translatable(&mut self, text: &str) -> std::io::Result<()> {
        let translated = self.translate(text);
        self.writer.write_str(&translated)
    }
}

impl std::fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("writer", &self.writer)
            .field("lists", &self.lists)
            .field("code_span", &self.code_span)
            .field("text_run", &self.text_run)
            .field("skip_translation", &self.skip_translation)
            .finish_non_exhaustive()
    }
}
