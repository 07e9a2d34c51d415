//! Block-level formatting: headings, quotes, code, raw markup blocks, lists
//! and thematic breaks.

use unicode_width::UnicodeWidthStr;

use crate::error::RenderResult;
use crate::policy::HeadingStyle;
use crate::render::context::ListFrame;
use crate::render::writer::LineRange;
use crate::render::{RenderContext, WalkStatus};
use crate::transform::TextKind;
use crate::tree::{Node, NodeData, NodeRef};

const SETEXT_UNDERLINE_MINIMUM: usize = 3;
const FENCE_LENGTH_MINIMUM: usize = 3;

pub fn heading(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    let NodeData::Heading { level } = *node.data() else {
        return Ok(WalkStatus::Continue);
    };
    let n = node.node();
    let setext = if !n.has_children() || level > 2 {
        false
    } else if n.lines.len() > 1 {
        true
    } else {
        cx.policy.heading_style.is_setext()
    };

    if setext {
        setext_heading(cx, n, level, entering)?;
    } else {
        atx_heading(cx, n, level, entering)?;
    }
    Ok(WalkStatus::Continue)
}

fn atx_heading(
    cx: &mut RenderContext<'_>,
    n: &Node,
    level: u8,
    entering: bool,
) -> std::io::Result<()> {
    let marker = "#".repeat(usize::from(level));
    if entering {
        cx.writer.write_str(&marker)?;
        if n.has_children() {
            cx.writer.write_byte(b' ')?;
        }
    } else if cx.policy.heading_style == HeadingStyle::AtxSurround {
        cx.writer.write_byte(b' ')?;
        cx.writer.write_str(&marker)?;
    }
    Ok(())
}

/// The full-width underline matches the display width of the widest line,
/// so wide characters get one underline column per cell they occupy.
fn setext_heading(
    cx: &mut RenderContext<'_>,
    n: &Node,
    level: u8,
    entering: bool,
) -> std::io::Result<()> {
    if entering {
        return Ok(());
    }
    let underline = if level == 1 { b'=' } else { b'-' };
    let mut width = SETEXT_UNDERLINE_MINIMUM;
    if cx.policy.heading_style == HeadingStyle::SetextFullWidth {
        for line in &n.lines {
            width = width.max(line.text(cx.source).trim_end().width());
        }
    }
    cx.writer.write_byte(b'\n')?;
    cx.writer.write(&vec![underline; width])
}

pub fn block_quote(
    cx: &mut RenderContext<'_>,
    _node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.push_prefix("> ", LineRange::ALL);
    } else {
        cx.writer.pop_prefix();
    }
    Ok(WalkStatus::Continue)
}

pub fn thematic_break(
    cx: &mut RenderContext<'_>,
    _node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        let length = cx.policy.effective_thematic_break_length();
        let byte = cx.policy.thematic_break_char.byte();
        cx.writer.write(&vec![byte; length])?;
    }
    Ok(WalkStatus::Continue)
}

/// Writes each source line and commits it.
fn write_lines(cx: &mut RenderContext<'_>, n: &Node) -> std::io::Result<()> {
    for line in &n.lines {
        cx.writer.write_str(line.text(cx.source))?;
        cx.writer.flush_line()?;
    }
    Ok(())
}

pub fn code_block(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer
            .push_prefix(cx.policy.code_indent.bytes(), LineRange::ALL);
        cx.set_skip_translation(true);
        write_lines(cx, node.node())?;
    } else {
        cx.writer.pop_prefix();
        cx.set_skip_translation(false);
    }
    Ok(WalkStatus::Continue)
}

/// Fence width that no content line can mistake for a closing fence.
fn fence_width(cx: &RenderContext<'_>, n: &Node) -> usize {
    n.lines
        .iter()
        .map(|line| {
            let text = line.text(cx.source).trim_start_matches(' ');
            text.len() - text.trim_start_matches('`').len() + 1
        })
        .fold(FENCE_LENGTH_MINIMUM, usize::max)
}

pub fn fenced_code_block(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    let n = node.node();
    let fence = "`".repeat(fence_width(cx, n));
    cx.writer.write_str(&fence)?;
    if entering {
        cx.set_skip_translation(true);
        if let NodeData::FencedCodeBlock { info: Some(info) } = &n.data {
            cx.writer.write_str(info.text(cx.source))?;
        }
        cx.writer.flush_line()?;
        write_lines(cx, n)?;
    } else {
        cx.set_skip_translation(false);
    }
    Ok(WalkStatus::Continue)
}

/// Raw markup blocks are offered to the hook as one fragment, closure line
/// included. Without a replacement the lines are copied verbatim.
pub fn html_block(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let n = node.node();
    let closure = match &n.data {
        NodeData::HtmlBlock { closure } => *closure,
        _ => None,
    };

    if cx.has_transform() {
        let mut fragment = String::new();
        for line in n.lines.iter().chain(closure.as_ref()) {
            fragment.push_str(line.text(cx.source));
        }
        if let Some(replacement) = cx.transform(TextKind::RawMarkup, &fragment) {
            cx.writer.write_str(&replacement)?;
            return Ok(WalkStatus::SkipChildren);
        }
    }

    cx.set_skip_translation(true);
    write_lines(cx, n)?;
    if let Some(closure) = closure {
        cx.writer.write_line(closure.text(cx.source).as_bytes())?;
    }
    cx.set_skip_translation(false);
    Ok(WalkStatus::SkipChildren)
}

pub fn list(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        let frame = match *node.data() {
            NodeData::List {
                ordered,
                marker,
                start,
            } => ListFrame {
                ordered,
                marker,
                next_number: start,
            },
            _ => bullet_frame(),
        };
        cx.lists.push(frame);
    } else {
        cx.lists.pop();
    }
    Ok(WalkStatus::Continue)
}

fn bullet_frame() -> ListFrame {
    ListFrame {
        ordered: false,
        marker: b'-',
        next_number: 1,
    }
}

/// Pushes the item marker for the first line and matching padding for the
/// rest.
pub fn list_item(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        if cx.lists.is_empty() {
            log::debug!("list item outside of a list; rendering as a bullet");
            cx.lists.push(bullet_frame());
        }
        let Some(frame) = cx.lists.last_mut() else {
            unreachable!("list frame pushed above");
        };

        let mut marker = Vec::new();
        if frame.ordered {
            marker.extend_from_slice(frame.next_number.to_string().as_bytes());
            frame.next_number += 1;
        }
        marker.push(frame.marker);
        marker.push(b' ');

        let padding = vec![b' '; marker.len() * cx.policy.effective_list_indent_width()];
        cx.writer.push_prefix(marker, LineRange::first(1));
        cx.writer.push_prefix(padding, LineRange::starting_at(1));
    } else {
        if !node.node().has_children() {
            cx.writer.end_line()?;
        }
        cx.writer.pop_prefix();
        cx.writer.pop_prefix();
        if node.parent().is_none_or(|p| !matches!(p.data, NodeData::List { .. })) {
            cx.lists.pop();
        }
    }
    Ok(WalkStatus::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{IndentStyle, Policy, ThematicBreakChar};
    use crate::render::handlers::test_support::{render, render_translated, render_with_policy};
    use crate::tree::Span;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn doc(children: Vec<Node>) -> Node {
        Node::new(NodeData::Document).with_children(children)
    }

    fn heading_node(level: u8, span: std::ops::Range<usize>) -> Node {
        Node::new(NodeData::Heading { level })
            .with_children(vec![Node::text(span.clone())])
            .with_lines(vec![Span::from(span)])
    }

    #[rstest]
    #[case(HeadingStyle::Atx, 1, "# Hi\n")]
    #[case(HeadingStyle::AtxSurround, 2, "## Hi ##\n")]
    #[case(HeadingStyle::Setext, 1, "Hi\n===\n")]
    #[case(HeadingStyle::Setext, 2, "Hi\n---\n")]
    #[case(HeadingStyle::Setext, 3, "### Hi\n")]
    #[case(HeadingStyle::SetextFullWidth, 1, "Hi\n===\n")]
    fn heading_styles(#[case] style: HeadingStyle, #[case] level: u8, #[case] expected: &str) {
        // Given a single-line heading "Hi"
        let tree = doc(vec![heading_node(level, 0..2)]);

        // When rendered under the style
        let out = render_with_policy(Policy::default().with_heading_style(style), "Hi", &tree);

        // Then
        assert_eq!(out, expected);
    }

    #[test]
    fn full_width_underline_matches_longest_line() {
        let source = "Ten chars!";
        let tree = doc(vec![heading_node(1, 0..10)]);
        let policy = Policy::default().with_heading_style(HeadingStyle::SetextFullWidth);
        assert_eq!(
            render_with_policy(policy, source, &tree),
            "Ten chars!\n==========\n"
        );
    }

    #[test]
    fn multi_line_heading_is_always_setext() {
        let source = "one\ntwo";
        let tree = doc(vec![
            Node::new(NodeData::Heading { level: 2 })
                .with_children(vec![Node::soft_text(0..3), Node::text(4..7)])
                .with_lines(vec![Span::new(0, 3), Span::new(4, 7)]),
        ]);
        assert_eq!(render(source, &tree), "one\ntwo\n---\n");
    }

    #[test]
    fn empty_heading_has_no_trailing_space() {
        let tree = doc(vec![Node::new(NodeData::Heading { level: 2 })]);
        assert_eq!(render("", &tree), "##\n");
    }

    #[test]
    fn ordered_list_counts_from_start() {
        // Given an ordered list starting at 5 with an unrelated nested bullet list
        let source = "abcx";
        let item = |span: std::ops::Range<usize>| {
            Node::new(NodeData::ListItem)
                .with_children(vec![Node::new(NodeData::TextBlock).with_children(vec![Node::text(span)])])
        };
        let nested = Node::new(NodeData::List {
            ordered: false,
            marker: b'-',
            start: 1,
        })
        .with_children(vec![item(3..4)]);
        let mut second = item(1..2);
        second.children.push(nested);
        let tree = doc(vec![
            Node::new(NodeData::List {
                ordered: true,
                marker: b'.',
                start: 5,
            })
            .with_children(vec![item(0..1), second, item(2..3)]),
        ]);

        // When
        let out = render(source, &tree);

        // Then numbering ignores the nested list
        assert_snapshot!(out, @r"
        5. a
        6. b
           - x
        7. c
        ");
    }

    #[test]
    fn continuation_indent_scales_with_policy() {
        let source = "ab";
        let tree = doc(vec![
            Node::new(NodeData::List {
                ordered: false,
                marker: b'*',
                start: 1,
            })
            .with_children(vec![Node::new(NodeData::ListItem).with_children(vec![
                Node::new(NodeData::TextBlock).with_children(vec![Node::soft_text(0..1), Node::text(1..2)]),
            ])]),
        ]);
        let policy = Policy::default().with_list_indent_width(2);
        assert_eq!(render_with_policy(policy, source, &tree), "* a\n    b\n");
    }

    #[test]
    fn empty_list_item_keeps_its_marker() {
        let tree = doc(vec![
            Node::new(NodeData::List {
                ordered: false,
                marker: b'-',
                start: 1,
            })
            .with_children(vec![Node::new(NodeData::ListItem)]),
        ]);
        assert_eq!(render("", &tree), "-\n");
    }

    #[test]
    fn block_quote_prefixes_every_line() {
        let source = "ab";
        let tree = doc(vec![Node::new(NodeData::BlockQuote).with_children(vec![
            Node::new(NodeData::Paragraph).with_children(vec![Node::text(0..1)]),
            Node::new(NodeData::Paragraph)
                .with_children(vec![Node::text(1..2)])
                .with_blank_previous_lines(),
        ])]);
        assert_eq!(render(source, &tree), "> a\n>\n> b\n");
    }

    #[rstest]
    #[case(ThematicBreakChar::Dash, 3, "---\n")]
    #[case(ThematicBreakChar::Star, 5, "*****\n")]
    #[case(ThematicBreakChar::Underscore, 1, "___\n")]
    fn thematic_breaks(#[case] char: ThematicBreakChar, #[case] length: usize, #[case] expected: &str) {
        let tree = doc(vec![Node::new(NodeData::ThematicBreak)]);
        let policy = Policy::default().with_thematic_break(char, length);
        assert_eq!(render_with_policy(policy, "", &tree), expected);
    }

    #[test]
    fn indented_code_uses_policy_indent() {
        let source = "let x;\n\nx += 1;\n";
        let tree = doc(vec![Node::new(NodeData::CodeBlock).with_lines(vec![
            Span::new(0, 7),
            Span::new(7, 8),
            Span::new(8, 16),
        ])]);
        let out = render_with_policy(
            Policy::default().with_code_indent(IndentStyle::Tabs),
            source,
            &tree,
        );
        assert_eq!(out, "\tlet x;\n\n\tx += 1;\n");
    }

    #[test]
    fn fence_outgrows_backtick_lines() {
        let source = "md```\ninner\n```\n";
        let tree = doc(vec![
            Node::new(NodeData::FencedCodeBlock {
                info: Some(Span::new(0, 2)),
            })
            .with_lines(vec![Span::new(2, 6), Span::new(6, 12), Span::new(12, 16)]),
        ]);
        assert_snapshot!(render(source, &tree), @r"
        ````md
        ```
        inner
        ```
        ````
        ");
    }

    #[test]
    fn code_lines_are_never_translated() {
        let source = "Hello\n";
        let tree = doc(vec![
            Node::new(NodeData::FencedCodeBlock { info: None }).with_lines(vec![Span::new(0, 6)]),
        ]);
        let out = render_translated(&[("Hello", "你好"), ("Hello\n", "你好\n")], source, &tree);
        assert_eq!(out, "```\nHello\n```\n");
    }

    #[test]
    fn fence_info_is_never_translated() {
        // Given an info string that matches a translation key
        let source = "rustfn main() {}\n";
        let tree = doc(vec![
            Node::new(NodeData::FencedCodeBlock {
                info: Some(Span::new(0, 4)),
            })
            .with_lines(vec![Span::new(4, 17)]),
        ]);

        // When
        let out = render_translated(&[("rust", "铁锈")], source, &tree);

        // Then the fence line stays as written
        assert_eq!(out, "```rust\nfn main() {}\n```\n");
    }

    #[test]
    fn html_block_offered_whole_with_closure() {
        let source = "<!--\nnote\n-->\n";
        let tree = doc(vec![
            Node::new(NodeData::HtmlBlock {
                closure: Some(Span::new(10, 14)),
            })
            .with_lines(vec![Span::new(0, 5), Span::new(5, 10)]),
        ]);
        let out = render_translated(&[("<!--\nnote\n-->\n", "<!--\n注释\n-->\n")], source, &tree);
        assert_eq!(out, "<!--\n注释\n-->\n");
        assert_eq!(render(source, &tree), source);
    }
}
