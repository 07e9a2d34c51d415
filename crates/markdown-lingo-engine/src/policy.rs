use serde::{Deserialize, Serialize};

/// Minimum number of characters in a thematic break.
pub const THEMATIC_BREAK_LENGTH_MINIMUM: usize = 3;
/// Minimum number of spaces per list-marker column on continuation lines.
pub const LIST_INDENT_WIDTH_MINIMUM: usize = 1;

/// How headings of level 1 and 2 are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingStyle {
    /// `# Heading`
    #[default]
    Atx,
    /// `# Heading #`
    AtxSurround,
    /// `Heading` underlined with `===` or `---`
    Setext,
    /// Setext with the underline as wide as the longest content line.
    #[serde(rename = "setext-fullwidth")]
    SetextFullWidth,
}

impl HeadingStyle {
    pub fn is_setext(self) -> bool {
        matches!(self, Self::Setext | Self::SetextFullWidth)
    }
}

/// The character a thematic break is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThematicBreakChar {
    #[default]
    Dash,
    Star,
    Underscore,
}

impl ThematicBreakChar {
    pub fn byte(self) -> u8 {
        match self {
            Self::Dash => b'-',
            Self::Star => b'*',
            Self::Underscore => b'_',
        }
    }
}

/// Indentation used for indented code blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndentStyle {
    Spaces(usize),
    Tabs,
}

impl Default for IndentStyle {
    fn default() -> Self {
        Self::Spaces(4)
    }
}

impl IndentStyle {
    /// The prefix pushed for one level of code indentation.
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            IndentStyle::Spaces(n) => vec![b' '; *n],
            IndentStyle::Tabs => vec![b'\t'],
        }
    }
}

/// Formatting choices the renderer makes where the source leaves room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Policy {
    pub heading_style: HeadingStyle,
    pub thematic_break_char: ThematicBreakChar,
    pub thematic_break_length: usize,
    /// Spaces per list-marker column on an item's continuation lines.
    pub list_indent_width: usize,
    pub code_indent: IndentStyle,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            heading_style: HeadingStyle::default(),
            thematic_break_char: ThematicBreakChar::default(),
            thematic_break_length: THEMATIC_BREAK_LENGTH_MINIMUM,
            list_indent_width: LIST_INDENT_WIDTH_MINIMUM,
            code_indent: IndentStyle::default(),
        }
    }
}

impl Policy {
    pub fn with_heading_style(mut self, style: HeadingStyle) -> Self {
        self.heading_style = style;
        self
    }

    pub fn with_thematic_break(mut self, char: ThematicBreakChar, length: usize) -> Self {
        self.thematic_break_char = char;
        self.thematic_break_length = length;
        self
    }

    pub fn with_list_indent_width(mut self, width: usize) -> Self {
        self.list_indent_width = width;
        self
    }

    pub fn with_code_indent(mut self, indent: IndentStyle) -> Self {
        self.code_indent = indent;
        self
    }

    pub(crate) fn effective_thematic_break_length(&self) -> usize {
        self.thematic_break_length.max(THEMATIC_BREAK_LENGTH_MINIMUM)
    }

    pub(crate) fn effective_list_indent_width(&self) -> usize {
        self.list_indent_width.max(LIST_INDENT_WIDTH_MINIMUM)
    }
}
