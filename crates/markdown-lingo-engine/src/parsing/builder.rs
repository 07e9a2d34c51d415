use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, LinkType, Tag};

use crate::tree::{Alignment, Node, NodeData, NodeKind, Span};

use super::has_blank_line_between;

/// A node still receiving children.
#[derive(Debug)]
struct Open {
    node: Node,
    /// End of the node's source range.
    end: usize,
    /// End of the last block child, for blank line detection.
    last_block_end: Option<usize>,
    /// Opened by the builder rather than by an event (tight list text).
    implicit: bool,
}

impl Open {
    fn new(node: Node, end: usize) -> Self {
        Self {
            node,
            end,
            last_block_end: None,
            implicit: false,
        }
    }
}

pub(super) struct TreeBuilder<'s> {
    source: &'s str,
    stack: Vec<Open>,
    quote_depth: usize,
    /// Nesting depth inside an element the tree has no kind for.
    skipped: usize,
}

impl<'s> TreeBuilder<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            stack: vec![Open::new(Node::new(NodeData::Document), source.len())],
            quote_depth: 0,
            skipped: 0,
        }
    }

    pub fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        if self.skipped > 0 {
            match event {
                Event::Start(_) => self.skipped += 1,
                Event::End(_) => self.skipped -= 1,
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(_) => self.end(),
            Event::Text(_) => match self.top().node.kind() {
                NodeKind::CodeBlock | NodeKind::FencedCodeBlock | NodeKind::HtmlBlock => {
                    self.push_lines(range)
                }
                _ => self.text(range),
            },
            Event::Code(_) => self.code_span(range),
            Event::Html(_) if self.top().node.kind() == NodeKind::HtmlBlock => self.push_lines(range),
            Event::Html(_) | Event::InlineHtml(_) => self.raw_html(range),
            Event::SoftBreak => self.line_break(range, false),
            Event::HardBreak => self.line_break(range, true),
            Event::Rule => {
                self.open_block(Node::new(NodeData::ThematicBreak), range);
                self.close();
            }
            other => log::debug!("ignoring unsupported event {other:?}"),
        }
    }

    pub fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.close();
        }
        match self.stack.pop() {
            Some(root) => root.node,
            None => Node::new(NodeData::Document),
        }
    }

    fn start(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let source = self.source;
        match tag {
            Tag::Paragraph => self.open_block(Node::new(NodeData::Paragraph), range),
            Tag::Heading { level, .. } => {
                let lines = heading_lines(source, range.clone());
                let node = Node::new(NodeData::Heading { level: level as u8 }).with_lines(lines);
                self.open_block(node, range);
            }
            Tag::BlockQuote(_) => {
                self.open_block(Node::new(NodeData::BlockQuote), range);
                self.quote_depth += 1;
            }
            Tag::CodeBlock(CodeBlockKind::Indented) => {
                self.open_block(Node::new(NodeData::CodeBlock), range)
            }
            Tag::CodeBlock(CodeBlockKind::Fenced(_)) => {
                let info = fence_info(source, range.start);
                self.open_block(Node::new(NodeData::FencedCodeBlock { info }), range);
            }
            Tag::HtmlBlock => {
                self.open_block(Node::new(NodeData::HtmlBlock { closure: None }), range)
            }
            Tag::List(start) => {
                let ordered = start.is_some();
                let node = Node::new(NodeData::List {
                    ordered,
                    marker: if ordered { b'.' } else { b'-' },
                    start: start.unwrap_or(1),
                });
                self.open_block(node, range);
            }
            Tag::Item => {
                self.read_list_marker(range.start);
                self.open_block(Node::new(NodeData::ListItem), range);
            }
            Tag::Table(alignments) => {
                let alignments = alignments.into_iter().map(convert_alignment).collect();
                self.open_block(Node::new(NodeData::Table { alignments }), range);
            }
            Tag::TableHead => self.open_container(NodeData::TableHeader, range),
            Tag::TableRow => self.open_container(NodeData::TableRow, range),
            Tag::TableCell => self.open_container(NodeData::TableCell, range),
            Tag::Emphasis => self.open_inline(NodeData::Emphasis { level: 1 }, range),
            Tag::Strong => self.open_inline(NodeData::Emphasis { level: 2 }, range),
            Tag::Link {
                link_type: LinkType::Autolink | LinkType::Email,
                ..
            } => {
                let url = Span::new(range.start + 1, range.end.saturating_sub(1).max(range.start + 1));
                self.open_inline(NodeData::AutoLink { url }, range);
            }
            Tag::Link {
                dest_url, title, ..
            } => {
                let raw_destination = destination_span(source, range.clone(), &dest_url);
                self.open_inline(
                    NodeData::Link {
                        destination: dest_url.to_string(),
                        title: title.to_string(),
                        raw_destination,
                    },
                    range,
                )
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let raw_destination = destination_span(source, range.clone(), &dest_url);
                self.open_inline(
                    NodeData::Image {
                        destination: dest_url.to_string(),
                        title: title.to_string(),
                        raw_destination,
                    },
                    range,
                )
            }
            other => {
                log::debug!("skipping unsupported element {other:?}");
                self.skipped = 1;
            }
        }
    }

    fn end(&mut self) {
        if self.top().implicit {
            self.close();
        }
        if self.top().node.kind() == NodeKind::BlockQuote {
            self.quote_depth = self.quote_depth.saturating_sub(1);
        }
        self.close();
    }

    fn top(&self) -> &Open {
        let Some(top) = self.stack.last() else {
            unreachable!("the document root stays on the stack until finish");
        };
        top
    }

    fn top_mut(&mut self) -> &mut Open {
        let Some(top) = self.stack.last_mut() else {
            unreachable!("the document root stays on the stack until finish");
        };
        top
    }

    fn open_block(&mut self, mut node: Node, range: Range<usize>) {
        self.close_implicit();
        let source = self.source;
        node.blank_previous_lines = self
            .top()
            .last_block_end
            .is_some_and(|end| has_blank_line_between(source, end, range.start));
        self.stack.push(Open::new(node, range.end));
    }

    fn open_container(&mut self, data: NodeData, range: Range<usize>) {
        self.stack.push(Open::new(Node::new(data), range.end));
    }

    fn open_inline(&mut self, data: NodeData, range: Range<usize>) {
        self.ensure_inline_container(range.start);
        self.stack.push(Open::new(Node::new(data), range.end));
    }

    /// Gives inline content directly under a list item a TextBlock parent.
    fn ensure_inline_container(&mut self, start: usize) {
        if self.top().node.kind() != NodeKind::ListItem {
            return;
        }
        self.open_block(Node::new(NodeData::TextBlock), start..start);
        self.top_mut().implicit = true;
    }

    fn close_implicit(&mut self) {
        if self.top().implicit {
            self.close();
        }
    }

    fn close(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(mut open) = self.stack.pop() else {
            return;
        };
        if open.node.kind() == NodeKind::TableCell {
            trim_cell(self.source, &mut open.node);
        }
        let parent = self.top_mut();
        if open.node.kind().is_block() {
            parent.last_block_end = Some(open.end);
        }
        if parent.implicit {
            parent.end = parent.end.max(open.end);
        }
        parent.node.children.push(open.node);
    }

    fn push_inline(&mut self, node: Node, start: usize, end: usize) {
        self.ensure_inline_container(start);
        let top = self.top_mut();
        if top.implicit {
            top.end = top.end.max(end);
        }
        top.node.children.push(node);
    }

    fn push_lines(&mut self, range: Range<usize>) {
        let source = self.source;
        let lines = split_lines(source, range);
        self.top_mut().node.lines.extend(lines);
    }

    fn text(&mut self, range: Range<usize>) {
        let source = self.source;
        self.ensure_inline_container(range.start);
        let top = self.top_mut();
        let span = Span::from(range);
        if top.implicit {
            top.end = top.end.max(span.end);
        }

        // Escapes and entities arrive as separate events; keep the source
        // text between them verbatim.
        if let Some(Node {
            data:
                NodeData::Text {
                    span: previous,
                    soft_line_break: false,
                    hard_line_break: false,
                },
            ..
        }) = top.node.children.last_mut()
            && previous.end <= span.start
            && source[previous.end..span.start].bytes().all(|b| b == b'\\')
        {
            previous.end = span.end;
            return;
        }
        top.node.children.push(Node::text(span));
    }

    fn line_break(&mut self, range: Range<usize>, hard: bool) {
        let source = self.source;
        self.ensure_inline_container(range.start);
        let top = self.top_mut();
        match top.node.children.last_mut() {
            Some(Node {
                data:
                    NodeData::Text {
                        span,
                        soft_line_break,
                        hard_line_break,
                    },
                ..
            }) if !*soft_line_break && !*hard_line_break => {
                let kept = span.text(source).trim_end_matches([' ', '\t']).len();
                span.end = span.start + kept;
                *soft_line_break = !hard;
                *hard_line_break = hard;
            }
            _ => top.node.children.push(Node::new(NodeData::Text {
                span: Span::new(range.start, range.start),
                soft_line_break: !hard,
                hard_line_break: hard,
            })),
        }
    }

    fn code_span(&mut self, range: Range<usize>) {
        let source = self.source;
        let raw = &source[range.clone()];
        let ticks = raw.len() - raw.trim_start_matches('`').len();
        let mut start = range.start + ticks;
        let mut end = range.end.saturating_sub(ticks).max(start);

        let content = &source[start..end];
        let padded = |c: char| c == ' ' || c == '\n';
        if content.len() >= 2
            && content.starts_with(padded)
            && content.ends_with(padded)
            && !content.bytes().all(|b| b == b' ')
        {
            start += 1;
            end -= 1;
        }

        let mut children = Vec::new();
        let mut pos = start;
        loop {
            let line_end = source[pos..end].find('\n').map_or(end, |i| pos + i);
            let line_start = if children.is_empty() {
                pos
            } else {
                self.skip_continuation_prefix(pos, line_end)
            };
            let text_end = if source[line_start..line_end].ends_with('\r') {
                line_end - 1
            } else {
                line_end
            };
            if line_end == end {
                children.push(Node::text(line_start..text_end));
                break;
            }
            children.push(Node::soft_text(line_start..text_end));
            pos = line_end + 1;
        }

        let node = Node::new(NodeData::CodeSpan).with_children(children);
        self.push_inline(node, range.start, range.end);
    }

    /// Splits inline raw markup into line segments so that continuation lines
    /// leave out the container prefix the writer adds back.
    fn raw_html(&mut self, range: Range<usize>) {
        let source = self.source;
        let mut segments = Vec::new();
        let mut pos = range.start;
        loop {
            let line_end = source[pos..range.end]
                .find('\n')
                .map_or(range.end, |i| pos + i + 1);
            let line_start = if segments.is_empty() {
                pos
            } else {
                self.skip_continuation_prefix(pos, line_end)
            };
            segments.push(Span::new(line_start, line_end));
            if line_end >= range.end {
                break;
            }
            pos = line_end;
        }
        let node = Node::new(NodeData::RawHtml { segments });
        self.push_inline(node, range.start, range.end);
    }

    /// Skips block quote markers and indentation at the start of a
    /// continuation line.
    fn skip_continuation_prefix(&self, start: usize, end: usize) -> usize {
        let mut rest = self.source[start..end].trim_start_matches([' ', '\t']);
        for _ in 0..self.quote_depth {
            match rest.strip_prefix('>') {
                Some(after) => rest = after.trim_start_matches([' ', '\t']),
                None => break,
            }
        }
        end - rest.len()
    }

    /// Records the marker byte of the enclosing list from its first item.
    fn read_list_marker(&mut self, item_start: usize) {
        let source = self.source;
        let top = self.top_mut();
        let NodeData::List {
            ordered, marker, ..
        } = &mut top.node.data
        else {
            return;
        };
        if top.node.children.is_empty() {
            let rest = source[item_start..].trim_start_matches(' ');
            let rest = if *ordered {
                rest.trim_start_matches(|c: char| c.is_ascii_digit())
            } else {
                rest
            };
            match rest.as_bytes().first() {
                Some(&b @ (b'-' | b'*' | b'+' | b'.' | b')')) => *marker = b,
                _ => log::debug!("no list marker found at offset {item_start}"),
            }
        }
    }
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}

/// Splits `range` into line spans, each keeping its `\n`.
fn split_lines(source: &str, range: Range<usize>) -> Vec<Span> {
    let mut pos = range.start;
    source[range]
        .split_inclusive('\n')
        .map(|line| {
            let span = Span::new(pos, pos + line.len());
            pos = span.end;
            span
        })
        .collect()
}

/// Trims the whitespace around a cell's content, leaving the spaces between
/// its inline children alone.
fn trim_cell(source: &str, cell: &mut Node) {
    if let Some(Node {
        data: NodeData::Text { span, .. },
        ..
    }) = cell.children.first_mut()
    {
        let text = span.text(source);
        span.start += text.len() - text.trim_start().len();
    }
    if let Some(Node {
        data: NodeData::Text { span, .. },
        ..
    }) = cell.children.last_mut()
    {
        span.end = span.start + span.text(source).trim_end().len();
    }
}

/// Locates a link's destination as written inside the link's source range.
///
/// Returns `None` for reference links, whose destination lives elsewhere.
fn destination_span(source: &str, range: Range<usize>, decoded: &str) -> Option<Span> {
    let raw = &source[range.clone()];
    let mut found = None;
    for (open, _) in raw.match_indices("](") {
        let after = open + 2;
        let rest = &raw[after..];
        let leading = rest.len() - rest.trim_start().len();
        let dest = &rest[leading..];
        let Some(len) = scan_destination(dest) else {
            continue;
        };
        let tail = dest[len..].trim_start();
        let closes = tail == ")"
            || (tail.len() >= 3 && tail.starts_with(['"', '\'', '(']) && tail.ends_with(')'));
        if !closes {
            continue;
        }
        let start = range.start + after + leading;
        let span = Span::new(start, start + len);
        if unescaped_matches(&dest[..len], decoded) {
            return Some(span);
        }
        found = Some(span);
    }
    found
}

/// Byte length of the link destination at the start of `text`.
fn scan_destination(text: &str) -> Option<usize> {
    let mut escaped = false;
    if let Some(rest) = text.strip_prefix('<') {
        for (i, c) in rest.char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match c {
                '\\' => escaped = true,
                '>' => return Some(i + 2),
                '<' | '\n' => return None,
                _ => {}
            }
        }
        return None;
    }

    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            c if c.is_whitespace() || c.is_control() => return Some(i),
            _ => {}
        }
    }
    Some(text.len())
}

/// Whether `raw` reads as `decoded` once brackets and backslash escapes are
/// removed. Entities are not decoded.
fn unescaped_matches(raw: &str, decoded: &str) -> bool {
    let raw = raw
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\'
            && let Some(&next) = chars.peek()
            && next.is_ascii_punctuation()
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(c);
    }
    out == decoded
}

fn trim_span(source: &str, span: Span) -> Span {
    let text = span.text(source);
    let start = span.start + (text.len() - text.trim_start().len());
    let end = span.start + text.trim_end().len();
    Span::new(start, end.max(start))
}

/// Content lines of a heading: the text between ATX markers, or every line
/// above a setext underline.
fn heading_lines(source: &str, range: Range<usize>) -> Vec<Span> {
    let trimmed = source[range.clone()].trim_end().len();
    let mut lines = split_lines(source, range.start..range.start + trimmed);
    if source[range.start..].trim_start_matches(' ').starts_with('#') {
        return lines.into_iter().map(|line| atx_content(source, line)).collect();
    }

    let strip_quote = |line: Span| {
        let text = line.text(source);
        let rest = text.trim_start_matches(|c: char| c == '>' || c.is_whitespace());
        Span::new(line.end - rest.len(), line.end)
    };
    let is_underline = |line: &Span| {
        let text = strip_quote(*line).text(source).trim_end();
        !text.is_empty() && (text.bytes().all(|b| b == b'=') || text.bytes().all(|b| b == b'-'))
    };
    if lines.len() > 1 && lines.last().is_some_and(is_underline) {
        lines.pop();
    }
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let line = if i == 0 { line } else { strip_quote(line) };
            trim_span(source, line)
        })
        .collect()
}

fn atx_content(source: &str, line: Span) -> Span {
    let text = line.text(source);
    let open = text.trim_start_matches(' ').trim_start_matches('#');
    let body = open.trim_start();
    let start = line.end - body.len();

    let mut content = body.trim_end();
    let without_closing = content.trim_end_matches('#');
    if without_closing.is_empty() || without_closing.ends_with([' ', '\t']) {
        content = without_closing.trim_end();
    }
    Span::new(start, start + content.len())
}

/// Locates the info string on the opening fence line at `start`.
fn fence_info(source: &str, start: usize) -> Option<Span> {
    let line_end = source[start..].find('\n').map_or(source.len(), |i| start + i);
    let line = &source[start..line_end];
    let fence = line.trim_start_matches(|c: char| c == ' ' || c == '>');
    let fence_char = fence.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let after_fence = fence.trim_start_matches(fence_char);
    let info = after_fence.trim();
    if info.is_empty() {
        return None;
    }
    let info_start = line_end - after_fence.trim_start().len();
    Some(Span::new(info_start, info_start + info.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn atx_content_strips_closing_sequence() {
        let source = "### Title ###";
        assert_eq!(atx_content(source, Span::new(0, 13)).text(source), "Title");
    }

    #[test]
    fn atx_content_keeps_attached_hashes() {
        let source = "# C#";
        assert_eq!(atx_content(source, Span::new(0, 4)).text(source), "C#");
    }

    #[test]
    fn empty_atx_heading_has_empty_content() {
        let source = "##";
        assert!(atx_content(source, Span::new(0, 2)).is_empty());
    }

    #[test]
    fn fence_info_inside_quote() {
        let source = "> ~~~ python \n";
        let info = fence_info(source, 0).map(|s| s.text(source));
        assert_eq!(info, Some("python"));
    }

    #[test]
    fn bare_fence_has_no_info() {
        assert_eq!(fence_info("```\n", 0), None);
    }

    #[test]
    fn split_lines_keeps_terminators() {
        let source = "a\nbc\nd";
        let lines: Vec<_> = split_lines(source, 0..source.len())
            .into_iter()
            .map(|s| s.text(source))
            .collect();
        assert_eq!(lines, vec!["a\n", "bc\n", "d"]);
    }
}
