//! Enter/exit behaviour per node kind.
//!
//! Block kinds are registered through [`Handler::block`], which wraps them in
//! [`separate_block`]. Inline kinds write directly into the current line.

pub mod blocks;
pub mod code_span;
pub mod inline;
pub mod table;
pub mod text;

pub use table::TableExtension;

use crate::error::RenderResult;
use crate::tree::{NodeKind, NodeRef};

use super::{Handler, RenderContext, Renderer, WalkStatus};

/// Reproduces the blank line the source had before a block and commits the
/// block's last line when it closes.
///
/// A blank line is only ever written when the node has a previous sibling and
/// the source recorded one.
pub fn separate_block(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        if node.previous_sibling().is_some() && node.node().blank_previous_lines {
            cx.writer.end_line()?;
        }
    } else {
        cx.writer.flush_line()?;
    }
    Ok(WalkStatus::Continue)
}

pub(crate) fn register_defaults(renderer: &mut Renderer) {
    // blocks
    renderer.register(NodeKind::Document, Handler::new(separate_block));
    renderer.register(NodeKind::Paragraph, Handler::new(separate_block));
    renderer.register(NodeKind::TextBlock, Handler::new(separate_block));
    renderer.register(NodeKind::Heading, Handler::block(blocks::heading));
    renderer.register(NodeKind::BlockQuote, Handler::block(blocks::block_quote));
    renderer.register(NodeKind::CodeBlock, Handler::block(blocks::code_block));
    renderer.register(
        NodeKind::FencedCodeBlock,
        Handler::block(blocks::fenced_code_block),
    );
    renderer.register(NodeKind::HtmlBlock, Handler::block(blocks::html_block));
    renderer.register(NodeKind::List, Handler::block(blocks::list));
    renderer.register(NodeKind::ListItem, Handler::block(blocks::list_item));
    renderer.register(
        NodeKind::ThematicBreak,
        Handler::block(blocks::thematic_break),
    );

    // inlines
    renderer.register(NodeKind::AutoLink, Handler::new(inline::auto_link));
    renderer.register(NodeKind::CodeSpan, Handler::new(code_span::code_span));
    renderer.register(NodeKind::Emphasis, Handler::new(inline::emphasis));
    renderer.register(NodeKind::Image, Handler::new(inline::image));
    renderer.register(NodeKind::Link, Handler::new(inline::link));
    renderer.register(NodeKind::RawHtml, Handler::new(inline::raw_html));
    renderer.register(NodeKind::Text, Handler::new(text::text));
}
