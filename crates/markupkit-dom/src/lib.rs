//! # MarkupKit DOM
//!
//! Programmatic markup tree for building, mutating and serializing HTML/XML.
//!
//! ## Design Goals
//!
//! 1. **Permissive mutation**: structural changes on text, comment and void
//!    nodes are silent no-ops that still return the receiver for chaining
//! 2. **Single ownership**: parents own children through `Rc`; the parent
//!    link is a `Weak` back-reference
//! 3. **Explicit render configuration**: serializers take a [`RenderConfig`];
//!    a thread-local default is kept only for the convenience entry points
//! 4. **No recursion on deep trees**: serializers walk an explicit stack

pub mod as_code;
pub mod attributes;
pub mod children;
pub mod document;
pub mod escape;
pub mod node;
pub mod serialize;
pub mod widgets;

pub use as_code::{AsCodeColors, AsCodeOptions};
pub use attributes::{is_valid_attribute_name, AttrValue, AttributeStore};
pub use children::ChildList;
pub use document::Document;
pub use escape::escape_html;
pub use node::{ChildOptions, ChildTarget, Node, NodeKind};
pub use serialize::{
    push_render_defaults, render_defaults, set_render_defaults, RenderConfig, RenderDefaultsGuard,
    XML_DECLARATION,
};

/// Sentinel name of text nodes.
pub const TEXT_NODE_NAME: &str = "#TEXT";

/// Sentinel name of comment nodes.
pub const COMMENT_NODE_NAME: &str = "#COMMENT";

/// Tags that never own children.
pub const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "meta", "img", "input", "wbr", "embed", "base", "col", "link", "param", "source",
    "track", "area",
];

/// Check if a (lowercase) tag name is in the void set.
pub fn is_void_tag(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Validate a node name.
///
/// Non-empty; the first character is not a digit, `-`, `.` or `:`; every
/// character is alphanumeric or one of `-`, `:`, `.`.
pub fn is_valid_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_digit() || matches!(first, '-' | '.' | ':') {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | ':' | '.'))
}
