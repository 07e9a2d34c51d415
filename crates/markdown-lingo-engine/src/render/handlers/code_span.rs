//! Inline code spans.
//!
//! The delimiter is the shortest backtick run that does not already occur in
//! the content, so the span can never close early.

use std::collections::BTreeSet;

use crate::error::RenderResult;
use crate::render::context::CodeSpanState;
use crate::render::{RenderContext, WalkStatus};
use crate::tree::{Node, NodeData, NodeRef};

/// Chooses the delimiter width and padding for code span `content`.
pub fn delimit(content: &str) -> CodeSpanState {
    let mut runs = BTreeSet::new();
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
        } else if run > 0 {
            runs.insert(run);
            run = 0;
        }
    }
    if run > 0 {
        runs.insert(run);
    }
    let delimiter_width = (1..).find(|n| !runs.contains(n)).unwrap_or(1);

    let starts_with_space = content.starts_with(char::is_whitespace);
    let ends_with_space = content.ends_with(char::is_whitespace);
    let only_space = content.chars().all(char::is_whitespace);
    let pad = (starts_with_space && ends_with_space && !only_space)
        || content.starts_with('`')
        || content.ends_with('`');

    CodeSpanState {
        delimiter_width,
        pad,
    }
}

/// The span's content as it will be written: child texts joined by their
/// line breaks.
fn content(cx: &RenderContext<'_>, n: &Node) -> String {
    let mut out = String::new();
    for child in &n.children {
        if let NodeData::Text {
            span,
            soft_line_break,
            hard_line_break,
        } = &child.data
        {
            out.push_str(span.text(cx.source));
            if *soft_line_break || *hard_line_break {
                out.push('\n');
            }
        }
    }
    out
}

pub fn code_span(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.set_skip_translation(true);
        let state = delimit(&content(cx, node.node()));
        cx.writer.write(&vec![b'`'; state.delimiter_width])?;
        if state.pad {
            cx.writer.write_byte(b' ')?;
        }
        cx.code_span = Some(state);
    } else {
        let Some(state) = cx.code_span.take() else {
            unreachable!("code span state is set when the span is entered");
        };
        if state.pad {
            cx.writer.write_byte(b' ')?;
        }
        cx.writer.write(&vec![b'`'; state.delimiter_width])?;
        cx.set_skip_translation(false);
    }
    Ok(WalkStatus::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::handlers::test_support::{render, render_translated};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("code", 1, false)]
    #[case("a ` b `` c", 3, false)]
    #[case("` x `", 2, true)]
    #[case("  text  ", 1, true)]
    #[case("   ", 1, false)]
    #[case(" lead", 1, false)]
    #[case("``", 1, true)]
    #[case("", 1, false)]
    fn delimiter_selection(#[case] content: &str, #[case] width: usize, #[case] pad: bool) {
        assert_eq!(
            delimit(content),
            CodeSpanState {
                delimiter_width: width,
                pad
            }
        );
    }

    fn paragraph_with_code(source_len: usize) -> Node {
        Node::new(NodeData::Document).with_children(vec![
            Node::new(NodeData::Paragraph).with_children(vec![
                Node::new(NodeData::CodeSpan).with_children(vec![Node::text(0..source_len)]),
            ]),
        ])
    }

    #[test]
    fn wraps_content_that_contains_backticks() {
        let source = "a`b";
        assert_eq!(render(source, &paragraph_with_code(3)), "``a`b``\n");
    }

    #[test]
    fn content_is_not_translated() {
        let source = "Hello";
        let out = render_translated(&[("Hello", "你好")], source, &paragraph_with_code(5));
        assert_eq!(out, "`Hello`\n");
    }
}
