//! Inline formatting: emphasis, links, images, autolinks and raw markup.
//!
//! Destinations and raw markup are written inside skip-translation regions.
//! Link and image titles are prose and stay translatable.

use std::borrow::Cow;

use crate::error::RenderResult;
use crate::render::{RenderContext, WalkStatus};
use crate::transform::TextKind;
use crate::tree::{NodeData, NodeRef, Span};

pub fn emphasis(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    _entering: bool,
) -> RenderResult<WalkStatus> {
    let level = match *node.data() {
        NodeData::Emphasis { level } => level,
        _ => 1,
    };
    cx.writer.write(&vec![b'*'; usize::from(level)])?;
    Ok(WalkStatus::Continue)
}

pub fn link(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.write_byte(b'[')?;
    } else if let NodeData::Link {
        destination,
        title,
        raw_destination,
    } = node.data()
    {
        write_target(cx, destination, *raw_destination, title)?;
    }
    Ok(WalkStatus::Continue)
}

pub fn image(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if entering {
        cx.writer.write_str("![")?;
    } else if let NodeData::Image {
        destination,
        title,
        raw_destination,
    } = node.data()
    {
        write_target(cx, destination, *raw_destination, title)?;
    }
    Ok(WalkStatus::Continue)
}

/// Writes `](destination "title")`, copying the destination from the source
/// when the node points at it.
fn write_target(
    cx: &mut RenderContext<'_>,
    destination: &str,
    raw_destination: Option<Span>,
    title: &str,
) -> std::io::Result<()> {
    cx.set_skip_translation(true);
    cx.writer.write_str("](")?;
    match raw_destination {
        Some(raw) => cx.writer.write_str(raw.text(cx.source))?,
        None => cx.writer.write_str(&format_destination(destination))?,
    }
    if !title.is_empty() {
        cx.writer.write_str(" \"")?;
        cx.set_skip_translation(false);
        let translated = cx.translate(title);
        cx.set_skip_translation(true);
        cx.writer.write_str(&translated.replace('"', "\\\""))?;
        cx.writer.write_byte(b'"')?;
    }
    cx.writer.write_byte(b')')?;
    cx.set_skip_translation(false);
    Ok(())
}

/// Wraps a destination in angle brackets when it would not survive bare.
pub fn format_destination(destination: &str) -> Cow<'_, str> {
    let mut depth = 0i32;
    let mut balanced = true;
    for c in destination.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    balanced = false;
                }
            }
            _ => {}
        }
    }
    let needs_brackets =
        !balanced || depth != 0 || destination.contains(char::is_whitespace) || destination.starts_with('<');
    if !needs_brackets {
        return Cow::Borrowed(destination);
    }
    let escaped = destination.replace('<', "\\<").replace('>', "\\>");
    Cow::Owned(format!("<{escaped}>"))
}

pub fn auto_link(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    if let NodeData::AutoLink { url } = node.data() {
        cx.set_skip_translation(true);
        cx.writer.write_byte(b'<')?;
        cx.writer.write_str(url.text(cx.source))?;
        cx.writer.write_byte(b'>')?;
        cx.set_skip_translation(false);
    }
    Ok(WalkStatus::SkipChildren)
}

/// Inline raw markup is offered to the hook as one fragment; without a
/// replacement its segments are written back to back.
pub fn raw_html(
    cx: &mut RenderContext<'_>,
    node: NodeRef<'_>,
    entering: bool,
) -> RenderResult<WalkStatus> {
    if !entering {
        return Ok(WalkStatus::Continue);
    }
    let NodeData::RawHtml { segments } = node.data() else {
        return Ok(WalkStatus::Continue);
    };
    let fragment: String = segments.iter().map(|s| s.text(cx.source)).collect();

    if let Some(replacement) = cx.transform(TextKind::RawMarkup, &fragment) {
        cx.writer.write_str(&replacement)?;
    } else {
        cx.set_skip_translation(true);
        cx.writer.write_str(&fragment)?;
        cx.set_skip_translation(false);
    }
    Ok(WalkStatus::SkipChildren)
}
