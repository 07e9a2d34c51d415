pub mod error;
pub mod parsing;
pub mod policy;
pub mod render;
pub mod transform;
pub mod tree;

// Re-export key types for easier usage
pub use error::{RenderError, RenderResult};
pub use parsing::parse_document;
pub use policy::{HeadingStyle, IndentStyle, Policy, ThematicBreakChar};
pub use render::handlers::TableExtension;
pub use render::{Extension, Handler, RenderFn, Renderer, WalkStatus};
pub use transform::{TextKind, Transform, Translations};
pub use tree::{Alignment, Node, NodeData, NodeKind, NodeRef, Span};

/// Parses `source` and renders it with tables enabled.
///
/// The one-call path for callers that do not build trees themselves.
pub fn render_markdown(
    source: &str,
    policy: Policy,
    transform: Option<Box<dyn Transform>>,
) -> RenderResult<String> {
    let document = parse_document(source);
    let mut renderer = Renderer::new(policy).with_extension(TableExtension);
    if let Some(transform) = transform {
        renderer = renderer.with_boxed_transform(transform);
    }
    renderer.render_to_string(source, &document)
}
