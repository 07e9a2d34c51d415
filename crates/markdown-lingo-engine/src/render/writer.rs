//! Line-buffered output with a stack of line prefixes.
//!
//! Every physical line is committed as `prefixes + content + '\n'`, where
//! `prefixes` is the concatenation of the active prefixes, outermost first.
//! A prefix may be limited to a window of lines counted from the line it was
//! pushed on, which is how a list marker decorates only an item's first line
//! while its padding covers the rest.

use std::io;

/// The window of lines, relative to the push, that a prefix applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line (inclusive) the prefix applies to.
    pub from: usize,
    /// Line (exclusive) the prefix stops applying at.
    pub until: Option<usize>,
}

impl LineRange {
    /// Every line of the scope.
    pub const ALL: LineRange = LineRange {
        from: 0,
        until: None,
    };

    /// Only the first `n` lines of the scope.
    pub const fn first(n: usize) -> Self {
        Self {
            from: 0,
            until: Some(n),
        }
    }

    /// Every line of the scope from line `m` onward.
    pub const fn starting_at(m: usize) -> Self {
        Self {
            from: m,
            until: None,
        }
    }

    fn contains(self, line: usize) -> bool {
        line >= self.from && self.until.is_none_or(|until| line < until)
    }
}

#[derive(Debug)]
struct LinePrefix {
    bytes: Vec<u8>,
    range: LineRange,
    /// Value of the writer's line counter when the prefix was pushed.
    pushed_at: usize,
}

/// The only component that touches the output sink.
pub struct Writer<'w> {
    out: Box<dyn io::Write + 'w>,
    line: Vec<u8>,
    prefixes: Vec<LinePrefix>,
    /// Number of lines committed so far.
    lines_written: usize,
}

impl<'w> Writer<'w> {
    pub fn new(out: impl io::Write + 'w) -> Self {
        Self {
            out: Box::new(out),
            line: Vec::new(),
            prefixes: Vec::new(),
            lines_written: 0,
        }
    }

    /// Appends bytes to the current line. Each `\n` commits the line.
    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut rest = bytes;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.line.extend_from_slice(&rest[..pos]);
            self.end_line()?;
            rest = &rest[pos + 1..];
        }
        self.line.extend_from_slice(rest);
        Ok(())
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        self.write(s.as_bytes())
    }

    pub fn write_byte(&mut self, b: u8) -> io::Result<()> {
        self.write(&[b])
    }

    /// Writes `bytes` followed by a line commit.
    pub fn write_line(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write(bytes)?;
        self.flush_line()
    }

    /// Commits the current line, even when it is empty.
    ///
    /// An empty line drops trailing whitespace from its prefixes, so a blank
    /// line inside a block quote is written as `>` rather than `> `.
    pub fn end_line(&mut self) -> io::Result<()> {
        let mut prefix = Vec::new();
        for p in &self.prefixes {
            if p.range.contains(self.lines_written - p.pushed_at) {
                prefix.extend_from_slice(&p.bytes);
            }
        }
        if self.line.is_empty() {
            while prefix.last().is_some_and(|b| matches!(b, b' ' | b'\t')) {
                prefix.pop();
            }
        }
        self.out.write_all(&prefix)?;
        self.out.write_all(&self.line)?;
        self.out.write_all(b"\n")?;
        self.line.clear();
        self.lines_written += 1;
        Ok(())
    }

    /// Commits the current line if anything has been written to it.
    pub fn flush_line(&mut self) -> io::Result<()> {
        if self.line.is_empty() {
            return Ok(());
        }
        self.end_line()
    }

    pub fn push_prefix(&mut self, bytes: impl Into<Vec<u8>>, range: LineRange) {
        self.prefixes.push(LinePrefix {
            bytes: bytes.into(),
            range,
            pushed_at: self.lines_written,
        });
    }

    /// Removes the most recently pushed prefix.
    ///
    /// # Panics
    /// Panics if no prefix is active; pushes and pops are strictly paired.
    pub fn pop_prefix(&mut self) {
        let popped = self.prefixes.pop();
        assert!(popped.is_some(), "pop_prefix without a matching push_prefix");
    }

    pub fn prefix_depth(&self) -> usize {
        self.prefixes.len()
    }

    /// Commits any pending content and flushes the sink.
    pub fn finish(&mut self) -> io::Result<()> {
        self.flush_line()?;
        self.out.flush()
    }
}

impl std::fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("line", &String::from_utf8_lossy(&self.line))
            .field("prefixes", &self.prefixes)
            .field("lines_written", &self.lines_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn collect(f: impl FnOnce(&mut Writer<'_>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        {
            let mut w = Writer::new(&mut out);
            f(&mut w).unwrap();
            w.finish().unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn newlines_commit_lines() {
        let out = collect(|w| w.write(b"one\ntwo"));
        assert_eq!(out, "one\ntwo\n");
    }

    #[test]
    fn flush_line_ignores_empty_line() {
        let out = collect(|w| {
            w.write(b"a")?;
            w.flush_line()?;
            w.flush_line()?;
            w.write(b"b")
        });
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn end_line_emits_blank_line() {
        let out = collect(|w| {
            w.write_line(b"a")?;
            w.end_line()?;
            w.write_line(b"b")
        });
        assert_eq!(out, "a\n\nb\n");
    }

    #[test]
    fn prefixes_apply_outer_to_inner() {
        let out = collect(|w| {
            w.push_prefix("> ", LineRange::ALL);
            w.push_prefix("> ", LineRange::ALL);
            w.write(b"deep\nquote")?;
            w.flush_line()?;
            w.pop_prefix();
            w.pop_prefix();
            Ok(())
        });
        assert_eq!(out, "> > deep\n> > quote\n");
    }

    #[test]
    fn marker_and_continuation_windows() {
        let out = collect(|w| {
            w.push_prefix("- ", LineRange::first(1));
            w.push_prefix("  ", LineRange::starting_at(1));
            w.write(b"first\nsecond\nthird")?;
            w.flush_line()?;
            w.pop_prefix();
            w.pop_prefix();
            Ok(())
        });
        assert_eq!(out, "- first\n  second\n  third\n");
    }

    #[test]
    fn windows_count_from_the_push() {
        let out = collect(|w| {
            w.write_line(b"before")?;
            w.push_prefix("1. ", LineRange::first(1));
            w.write_line(b"item")?;
            w.pop_prefix();
            Ok(())
        });
        assert_eq!(out, "before\n1. item\n");
    }

    #[test]
    fn blank_line_trims_prefix_whitespace() {
        let out = collect(|w| {
            w.push_prefix("> ", LineRange::ALL);
            w.write_line(b"a")?;
            w.end_line()?;
            w.write_line(b"b")?;
            w.pop_prefix();
            Ok(())
        });
        assert_eq!(out, "> a\n>\n> b\n");
    }

    #[test]
    fn depth_tracks_push_and_pop() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out);
        assert_eq!(w.prefix_depth(), 0);
        w.push_prefix("  ", LineRange::ALL);
        assert_eq!(w.prefix_depth(), 1);
        w.pop_prefix();
        assert_eq!(w.prefix_depth(), 0);
    }

    #[test]
    #[should_panic(expected = "pop_prefix without a matching push_prefix")]
    fn unbalanced_pop_panics() {
        let mut out = Vec::new();
        let mut w = Writer::new(&mut out);
        w.pop_prefix();
    }

    #[test]
    fn sink_errors_propagate() {
        struct Broken;
        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut w = Writer::new(Broken);
        w.write(b"buffered").unwrap();
        let err = w.end_line().unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
