//! Text-run coalescing.
//!
//! Sibling text nodes form one translation unit. Each node's line break is
//! held back until the next node arrives: a break between two nodes becomes a
//! `\n` inside the lookup key, while a break after the last node is written as
//! a real line end after the (possibly translated) run.

use crate::error::RenderResult;
use crate::render::context::LineBreak;
use crate::render::{RenderContext, WalkStatus};
use crate::tree::{NodeData, NodeKind, NodeRef};

pub fn text(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let NodeData::Text {
        span,
        soft_line_break,
        hard_line_break,
    } = *node.data()
    else {
        return Ok(WalkStatus::Continue);
    };

    let run = &mut cx.text_run;
    if run.active {
        if run.pending_break.take() == Some(LineBreak::Soft) {
            run.buffer.push('\n');
        }
    } else {
        run.buffer.clear();
        run.pending_break = None;
        run.active = true;
    }
    run.buffer.push_str(span.text(cx.source));
    run.pending_break = if hard_line_break {
        Some(LineBreak::Hard)
    } else if soft_line_break {
        Some(LineBreak::Soft)
    } else {
        None
    };

    let continues = !hard_line_break
        && node
            .next_sibling()
            .is_some_and(|next| next.kind() == NodeKind::Text);
    if !continues {
        flush_run(cx)?;
    }
    Ok(WalkStatus::Continue)
}

/// Translates and writes the accumulated run, then materializes its trailing
/// break.
fn flush_run(cx: &mut RenderContext<'_>) -> std::io::Result<()> {
    let buffer = std::mem::take(&mut cx.text_run.buffer);
    let pending = cx.text_run.pending_break.take();
    cx.text_run.active = false;

    let translated = cx.translate(&buffer);
    cx.writer.write_str(&translated)?;
    match pending {
        Some(LineBreak::Soft) => cx.writer.end_line()?,
        Some(LineBreak::Hard) => {
            cx.writer.write_byte(b'\\')?;
            cx.writer.end_line()?;
        }
        None => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::render::handlers::test_support::{render, render_translated};
    use crate::tree::{Node, NodeData};
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn paragraph(children: Vec<Node>) -> Node {
        Node::new(NodeData::Document)
            .with_children(vec![Node::new(NodeData::Paragraph).with_children(children)])
    }

    #[test]
    fn coalesced_run_is_one_lookup() {
        // Given "Hello" with a soft break followed by "world"
        let source = "Hello\nworld";
        let tree = paragraph(vec![Node::soft_text(0..5), Node::text(6..11)]);

        // When only the joined key has an entry
        let out = render_translated(
            &[("Hello", "H"), ("world", "W"), ("Hello\nworld", "你好\n世界")],
            source,
            &tree,
        );

        // Then the break inside the replacement survives
        assert_eq!(out, "你好\n世界\n");
    }

    #[test]
    fn surrounding_whitespace_is_kept() {
        let source = "  Hi  ";
        let tree = paragraph(vec![Node::text(0..6)]);
        assert_eq!(render_translated(&[("Hi", "嗨")], source, &tree), "  嗨  \n");
    }

    #[test]
    fn trailing_soft_break_ends_exactly_one_line() {
        // A run whose last node carries a soft break, followed by emphasis
        let source = "lineem";
        let tree = paragraph(vec![
            Node::soft_text(0..4),
            Node::new(NodeData::Emphasis { level: 1 }).with_children(vec![Node::text(4..6)]),
        ]);
        assert_eq!(render(source, &tree), "line\n*em*\n");
    }

    #[test]
    fn trailing_soft_break_at_end_of_parent() {
        let source = "last";
        let tree = Node::new(NodeData::Document).with_children(vec![
            Node::new(NodeData::Paragraph).with_children(vec![Node::soft_text(0..4)]),
            Node::new(NodeData::Paragraph)
                .with_children(vec![Node::text(0..4)])
                .with_blank_previous_lines(),
        ]);
        assert_eq!(render(source, &tree), "last\n\nlast\n");
    }

    #[test]
    fn hard_break_splits_runs() {
        // Given "one" ending in a hard break followed by "two"
        let source = "onetwo";
        let tree = paragraph(vec![
            Node::new(NodeData::Text {
                span: (0..3).into(),
                soft_line_break: false,
                hard_line_break: true,
            }),
            Node::text(3..6),
        ]);

        // When translated
        let out = render_translated(&[("one", "一"), ("two", "二")], source, &tree);

        // Then each side is looked up on its own
        assert_snapshot!(out, @r"
        一\
        二
        ");
    }

    #[test]
    fn empty_key_is_not_offered() {
        let source = "   ";
        let tree = paragraph(vec![Node::text(0..3)]);
        assert_eq!(render_translated(&[("", "boom")], source, &tree), "   \n");
    }
}
