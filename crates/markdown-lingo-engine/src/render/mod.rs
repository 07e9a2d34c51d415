//! # Rendering
//!
//! Depth-first traversal of a document tree that writes canonical Markdown.
//!
//! ## Pieces
//!
//! - **`writer`**: [`Writer`], the line-buffered sink with a prefix stack
//! - **`context`**: [`RenderContext`], per-render state handed to every handler
//! - **`handlers`**: the enter/exit behaviour for each [`NodeKind`]
//! - this module: the kind-keyed [`Handler`] registry and the walk itself
//!
//! ## Handler composition
//!
//! A [`Handler`] is an ordered list of steps. On enter the steps run in
//! declaration order, on exit in reverse, so a block handler built as
//! `[separate_block, render_heading]` inserts block separation before the
//! heading opens and commits the line after it closes.
//!
//! ## Extensions
//!
//! Optional node kinds (tables) get their handlers from an [`Extension`]. A
//! registration replaces whatever handler the kind had before, so extensions
//! can also override defaults.

pub mod context;
pub mod handlers;
pub mod writer;

use std::collections::HashMap;
use std::io;

pub use context::{CodeSpanState, LineBreak, ListFrame, RenderContext, TextRun};
pub use writer::{LineRange, Writer};

use crate::error::RenderResult;
use crate::policy::Policy;
use crate::transform::Transform;
use crate::tree::{Node, NodeKind, NodeRef};

/// Whether the walk should descend into a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    SkipChildren,
}

/// One enter/exit behaviour. Called with `entering == true` before the node's
/// children are visited and with `false` after.
pub type RenderFn = fn(&mut RenderContext<'_>, NodeRef<'_>, bool) -> RenderResult<WalkStatus>;

/// An ordered composition of [`RenderFn`] steps for one node kind.
#[derive(Debug, Clone)]
pub struct Handler {
    steps: Vec<RenderFn>,
}

impl Handler {
    /// A handler with a single step.
    pub fn new(step: RenderFn) -> Self {
        Self { steps: vec![step] }
    }

    /// A block handler: block separation wrapped around `step`.
    pub fn block(step: RenderFn) -> Self {
        Self::new(handlers::separate_block).then(step)
    }

    /// Appends a step that runs after the existing ones on enter and before
    /// them on exit.
    pub fn then(mut self, step: RenderFn) -> Self {
        self.steps.push(step);
        self
    }

    fn enter(&self, cx: &mut RenderContext<'_>, node: NodeRef<'_>) -> RenderResult<WalkStatus> {
        let mut status = WalkStatus::Continue;
        for step in &self.steps {
            if step(cx, node, true)? == WalkStatus::SkipChildren {
                status = WalkStatus::SkipChildren;
            }
        }
        Ok(status)
    }

    fn exit(&self, cx: &mut RenderContext<'_>, node: NodeRef<'_>) -> RenderResult {
        for step in self.steps.iter().rev() {
            step(cx, node, false)?;
        }
        Ok(())
    }
}

/// A bundle of handlers for node kinds outside the core set.
pub trait Extension {
    fn register(&self, renderer: &mut Renderer);
}

/// Renders document trees back to Markdown.
///
/// A renderer holds only configuration; all per-document state lives in a
/// [`RenderContext`] created by each [`Renderer::render`] call.
pub struct Renderer {
    policy: Policy,
    transform: Option<Box<dyn Transform>>,
    handlers: HashMap<NodeKind, Handler>,
}

impl Renderer {
    pub fn new(policy: Policy) -> Self {
        let mut renderer = Self {
            policy,
            transform: None,
            handlers: HashMap::new(),
        };
        handlers::register_defaults(&mut renderer);
        renderer
    }

    pub fn with_transform(self, transform: impl Transform + 'static) -> Self {
        self.with_boxed_transform(Box::new(transform))
    }

    pub fn with_boxed_transform(mut self, transform: Box<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        extension.register(&mut self);
        self
    }

    /// Registers `handler` for `kind`, replacing any previous handler.
    pub fn register(&mut self, kind: NodeKind, handler: Handler) {
        if self.handlers.insert(kind, handler).is_some() {
            log::debug!("handler for {kind:?} overridden");
        }
    }

    pub fn has_handler(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Renders `document`, whose spans point into `source`, to `out`.
    ///
    /// Output is streamed line by line. A failing sink aborts the render; what
    /// was already written stays written.
    pub fn render(&self, out: impl io::Write, source: &str, document: &Node) -> RenderResult {
        let mut cx = RenderContext::new(
            Writer::new(out),
            source,
            &self.policy,
            self.transform.as_deref(),
        );
        self.walk(&mut cx, NodeRef::root(document))?;
        cx.writer.finish()?;
        debug_assert_eq!(cx.writer.prefix_depth(), 0, "unbalanced line prefixes");
        debug_assert!(cx.lists.is_empty(), "unbalanced list frames");
        Ok(())
    }

    /// Renders into a `String`.
    pub fn render_to_string(&self, source: &str, document: &Node) -> RenderResult<String> {
        let mut out = Vec::new();
        self.render(&mut out, source, document)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn walk(&self, cx: &mut RenderContext<'_>, node: NodeRef<'_>) -> RenderResult {
        let kind = node.node().kind();
        let handler = self.handlers.get(&kind);
        if handler.is_none() {
            log::debug!("no handler registered for {kind:?}; rendering children only");
        }

        let status = match handler {
            Some(h) => h.enter(cx, node)?,
            None => WalkStatus::Continue,
        };
        if status == WalkStatus::Continue {
            for child in node.children() {
                self.walk(cx, child)?;
            }
        }
        if let Some(h) = handler {
            h.exit(cx, node)?;
        }
        Ok(())
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(Policy::default())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Renderer")
            .field("policy", &self.policy)
            .field("has_transform", &self.transform.is_some())
            .field("kinds", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeData;
    use pretty_assertions::assert_eq;

    fn mark_enter(cx: &mut RenderContext<'_>, _: NodeRef<'_>, entering: bool) -> RenderResult<WalkStatus> {
        cx.writer.write_str(if entering { "[a" } else { "a]" })?;
        Ok(WalkStatus::Continue)
    }

    fn mark_inner(cx: &mut RenderContext<'_>, _: NodeRef<'_>, entering: bool) -> RenderResult<WalkStatus> {
        cx.writer.write_str(if entering { "[b" } else { "b]" })?;
        Ok(WalkStatus::Continue)
    }

    fn skip(_: &mut RenderContext<'_>, _: NodeRef<'_>, _: bool) -> RenderResult<WalkStatus> {
        Ok(WalkStatus::SkipChildren)
    }

    #[test]
    fn steps_unwind_in_reverse() {
        let mut renderer = Renderer::default();
        renderer.register(
            NodeKind::Emphasis,
            Handler::new(mark_enter).then(mark_inner),
        );
        let doc = Node::new(NodeData::Document).with_children(vec![
            Node::new(NodeData::Paragraph)
                .with_children(vec![Node::new(NodeData::Emphasis { level: 1 })]),
        ]);
        let out = renderer.render_to_string("", &doc).unwrap();
        assert_eq!(out, "[a[bb]a]\n");
    }

    #[test]
    fn skip_children_still_exits() {
        let source = "hidden";
        let mut renderer = Renderer::default();
        renderer.register(NodeKind::Emphasis, Handler::new(mark_enter).then(skip));
        let doc = Node::new(NodeData::Document).with_children(vec![
            Node::new(NodeData::Paragraph).with_children(vec![
                Node::new(NodeData::Emphasis { level: 1 }).with_children(vec![Node::text(0..6)]),
            ]),
        ]);
        let out = renderer.render_to_string(source, &doc).unwrap();
        assert_eq!(out, "[aa]\n");
    }

    #[test]
    fn unregistered_kinds_render_children() {
        let source = "cell";
        let renderer = Renderer::default();
        assert!(!renderer.has_handler(NodeKind::TableCell));
        let doc = Node::new(NodeData::Document).with_children(vec![
            Node::new(NodeData::Paragraph).with_children(vec![
                Node::new(NodeData::TableCell).with_children(vec![Node::text(0..4)]),
            ]),
        ]);
        assert_eq!(renderer.render_to_string(source, &doc).unwrap(), "cell\n");
    }

    #[test]
    fn empty_document_renders_nothing() {
        let doc = Node::new(NodeData::Document);
        assert_eq!(Renderer::default().render_to_string("", &doc).unwrap(), "");
    }
}
