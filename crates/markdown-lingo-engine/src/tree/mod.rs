//! # Document Tree
//!
//! The read-only tree the renderer consumes. Nodes reference the original
//! source through [`Span`]s and never copy prose; kind-specific attributes
//! live in [`NodeData`].
//!
//! The tree is normally produced by [`crate::parsing::parse_document`], but it
//! is plain data and can be assembled by hand with the builder methods on
//! [`Node`].

pub mod span;

pub use span::Span;

/// Column alignment of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Kind-specific attributes of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// The root of a document.
    Document,
    /// A paragraph in a loose context.
    Paragraph,
    /// Inline content directly inside a tight list item.
    TextBlock,
    /// A heading; `level` is 1..=6.
    Heading { level: u8 },
    ThematicBreak,
    /// An indented code block. Content lines are in [`Node::lines`].
    CodeBlock,
    /// A fenced code block with its optional info string.
    FencedCodeBlock { info: Option<Span> },
    /// A raw markup block. Lines are in [`Node::lines`]; `closure` is the
    /// terminating line for block types that have one.
    HtmlBlock { closure: Option<Span> },
    BlockQuote,
    /// A list. `marker` is `-`, `*` or `+` for bullets and `.` or `)` for
    /// ordered lists.
    List { ordered: bool, marker: u8, start: u64 },
    ListItem,
    /// A run of prose. Break flags record the line break that followed it in
    /// the source.
    Text {
        span: Span,
        soft_line_break: bool,
        hard_line_break: bool,
    },
    /// An inline code span. Its content is held by Text children.
    CodeSpan,
    /// Emphasis; level 1 is regular emphasis, level 2 is strong.
    Emphasis { level: u8 },
    /// A link. `destination` and `title` are decoded; `raw_destination`
    /// points at the destination as written, angle brackets included.
    Link {
        destination: String,
        title: String,
        raw_destination: Option<Span>,
    },
    /// An image, with the same target fields as [`NodeData::Link`].
    Image {
        destination: String,
        title: String,
        raw_destination: Option<Span>,
    },
    /// An autolink; `url` excludes the angle brackets.
    AutoLink { url: Span },
    /// Inline raw markup. Segments concatenate to the fragment; a segment
    /// keeps its line terminator and continuation lines start after the
    /// container prefix.
    RawHtml { segments: Vec<Span> },
    Table { alignments: Vec<Alignment> },
    TableHeader,
    TableRow,
    TableCell,
}

/// The registry key for a node: [`NodeData`] without its attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Document,
    Paragraph,
    TextBlock,
    Heading,
    ThematicBreak,
    CodeBlock,
    FencedCodeBlock,
    HtmlBlock,
    BlockQuote,
    List,
    ListItem,
    Text,
    CodeSpan,
    Emphasis,
    Link,
    Image,
    AutoLink,
    RawHtml,
    Table,
    TableHeader,
    TableRow,
    TableCell,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Document => NodeKind::Document,
            NodeData::Paragraph => NodeKind::Paragraph,
            NodeData::TextBlock => NodeKind::TextBlock,
            NodeData::Heading { .. } => NodeKind::Heading,
            NodeData::ThematicBreak => NodeKind::ThematicBreak,
            NodeData::CodeBlock => NodeKind::CodeBlock,
            NodeData::FencedCodeBlock { .. } => NodeKind::FencedCodeBlock,
            NodeData::HtmlBlock { .. } => NodeKind::HtmlBlock,
            NodeData::BlockQuote => NodeKind::BlockQuote,
            NodeData::List { .. } => NodeKind::List,
            NodeData::ListItem => NodeKind::ListItem,
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::CodeSpan => NodeKind::CodeSpan,
            NodeData::Emphasis { .. } => NodeKind::Emphasis,
            NodeData::Link { .. } => NodeKind::Link,
            NodeData::Image { .. } => NodeKind::Image,
            NodeData::AutoLink { .. } => NodeKind::AutoLink,
            NodeData::RawHtml { .. } => NodeKind::RawHtml,
            NodeData::Table { .. } => NodeKind::Table,
            NodeData::TableHeader => NodeKind::TableHeader,
            NodeData::TableRow => NodeKind::TableRow,
            NodeData::TableCell => NodeKind::TableCell,
        }
    }
}

impl NodeKind {
    /// Returns true for kinds that occupy whole lines and take part in block
    /// separation.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Document
                | Self::Paragraph
                | Self::TextBlock
                | Self::Heading
                | Self::ThematicBreak
                | Self::CodeBlock
                | Self::FencedCodeBlock
                | Self::HtmlBlock
                | Self::BlockQuote
                | Self::List
                | Self::ListItem
                | Self::Table
        )
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub data: NodeData,
    pub children: Vec<Node>,
    /// Source lines for kinds that carry them (headings, code and raw blocks).
    pub lines: Vec<Span>,
    /// Whether the source had a blank line between this block and its
    /// previous sibling.
    pub blank_previous_lines: bool,
}

impl Node {
    pub fn new(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
            lines: Vec::new(),
            blank_previous_lines: false,
        }
    }

    /// A plain Text node without line breaks.
    pub fn text(span: impl Into<Span>) -> Self {
        Self::new(NodeData::Text {
            span: span.into(),
            soft_line_break: false,
            hard_line_break: false,
        })
    }

    /// A Text node followed by a soft line break.
    pub fn soft_text(span: impl Into<Span>) -> Self {
        Self::new(NodeData::Text {
            span: span.into(),
            soft_line_break: true,
            hard_line_break: false,
        })
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_lines(mut self, lines: Vec<Span>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_blank_previous_lines(mut self) -> Self {
        self.blank_previous_lines = true;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A node seen from its position in the tree during traversal.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    node: &'a Node,
    parent: Option<&'a Node>,
    index: usize,
}

impl<'a> NodeRef<'a> {
    pub fn root(node: &'a Node) -> Self {
        Self {
            node,
            parent: None,
            index: 0,
        }
    }

    /// The `index`-th child of `parent`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn child(parent: &'a Node, index: usize) -> Self {
        Self {
            node: &parent.children[index],
            parent: Some(parent),
            index,
        }
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn data(&self) -> &'a NodeData {
        &self.node.data
    }

    pub fn parent(&self) -> Option<&'a Node> {
        self.parent
    }

    pub fn previous_sibling(&self) -> Option<&'a Node> {
        let index = self.index.checked_sub(1)?;
        self.parent.and_then(|p| p.children.get(index))
    }

    pub fn next_sibling(&self) -> Option<&'a Node> {
        self.parent.and_then(|p| p.children.get(self.index + 1))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let node = self.node;
        (0..node.children.len()).map(move |i| NodeRef::child(node, i))
    }
}
