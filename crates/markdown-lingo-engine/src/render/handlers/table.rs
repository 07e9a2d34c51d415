//! Pipe tables, registered through [`TableExtension`].

use crate::error::RenderResult;
use crate::render::{Extension, Handler, RenderContext, Renderer, WalkStatus};
use crate::tree::{Alignment, NodeData, NodeKind, NodeRef};

use super::separate_block;

/// Adds handlers for table, header, row and cell nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExtension;

impl Extension for TableExtension {
    fn register(&self, renderer: &mut Renderer) {
        renderer.register(NodeKind::Table, Handler::new(separate_block));
        renderer.register(NodeKind::TableHeader, Handler::new(table_header));
        renderer.register(NodeKind::TableRow, Handler::new(table_row));
        renderer.register(NodeKind::TableCell, Handler::new(table_cell));
    }
}

fn separator_cell(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => ":---",
        Alignment::Right => "---:",
        Alignment::Center => ":---:",
        Alignment::None => "---",
    }
}

fn table_header(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.write_byte(b'|')?;
        return Ok(WalkStatus::Continue);
    }
    cx.writer.end_line()?;

    let alignments: &[Alignment] = match node.parent().map(|p| &p.data) {
        Some(NodeData::Table { alignments }) => alignments.as_slice(),
        _ => &[],
    };
    let columns = alignments.len().max(node.node().children.len());
    cx.writer.write_byte(b'|')?;
    for column in 0..columns {
        let alignment = alignments.get(column).copied().unwrap_or_default();
        cx.writer.write_byte(b' ')?;
        cx.writer.write_str(separator_cell(alignment))?;
        cx.writer.write_str(" |")?;
    }
    cx.writer.end_line()?;
    Ok(WalkStatus::Continue)
}

fn table_row(
    cx: &mut RenderContext<'_>,
    _node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.write_byte(b'|')?;
    } else {
        cx.writer.end_line()?;
    }
    Ok(WalkStatus::Continue)
}

fn table_cell(
    cx: &mut RenderContext<'_>,
    _node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.write_byte(b' ')?;
    } else {
        cx.writer.write_str(" |")?;
    }
    Ok(WalkStatus::Continue)
}
