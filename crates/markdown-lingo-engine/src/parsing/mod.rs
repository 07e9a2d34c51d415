//! # Tree Adapter
//!
//! Builds the [`Node`] tree from pulldown-cmark's event stream. Every span in
//! the result points back into the source; the adapter never copies prose.
//!
//! pulldown-cmark reports each event with its source range
//! (`into_offset_iter`), and the renderer needs things the events do not carry
//! directly, so the adapter recovers them from the source:
//!
//! - blank lines between sibling blocks, from the gap between their ranges
//! - heading content lines, with ATX markers or the setext underline removed
//! - the list marker byte and the fenced code info string
//! - per-line spans for code and raw markup blocks
//!
//! Tables are enabled; other extensions are not.

mod builder;

use pulldown_cmark::{Options, Parser};

use crate::tree::Node;

use builder::TreeBuilder;

/// Parses `source` into a document tree.
pub fn parse_document(source: &str) -> Node {
    let mut builder = TreeBuilder::new(source);
    for (event, range) in Parser::new_ext(source, Options::ENABLE_TABLES).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

/// Returns true when a blank line separates a block ending at `previous_end`
/// from one starting at `start`.
///
/// A line holding only whitespace and block quote markers counts as blank.
pub(crate) fn has_blank_line_between(source: &str, previous_end: usize, start: usize) -> bool {
    if previous_end >= start || start > source.len() {
        return false;
    }
    // Block ranges can run past their content into trailing blank lines.
    let end = source[..previous_end]
        .trim_end_matches(|c: char| c.is_whitespace() || c == '>')
        .len();
    let lines: Vec<&str> = source[end..start].split('\n').collect();
    lines.len() > 2
        && lines[1..lines.len() - 1]
            .iter()
            .any(|line| line.chars().all(|c| c.is_whitespace() || c == '>'))
}
