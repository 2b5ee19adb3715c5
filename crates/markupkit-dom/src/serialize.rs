//! # Serializer
//!
//! Node to text, compact or pretty-printed.
//!
//! The walk uses an explicit stack local to each call, so deep trees do not
//! grow the call stack and serializing a subtree from inside another
//! serialization is safe.

use crate::attributes::AttrValue;
use crate::node::{Node, NodeKind};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Prologue written by [`Node::to_xml`].
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Elements whose content is rendered byte-exact, without inner indentation.
const INLINE_CONTENT_ELEMENTS: &[&str] = &["pre", "textarea", "code"];

/// Rendering flags threaded through the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Emit newlines and indentation.
    pub pretty: bool,
    /// Spaces per nesting level in pretty mode.
    pub indent_width: usize,
    /// Quote every attribute value.
    pub quote_all: bool,
    /// Render void tags as `<br/>`.
    pub self_closing_slash: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::html()
    }
}

impl RenderConfig {
    /// HTML rendering: compact, 4-space indent unit, minimal quoting.
    pub const fn html() -> Self {
        Self {
            pretty: false,
            indent_width: 4,
            quote_all: false,
            self_closing_slash: false,
        }
    }

    /// XML rendering: every value quoted, void tags self-closed.
    pub const fn xml() -> Self {
        Self {
            quote_all: true,
            self_closing_slash: true,
            ..Self::html()
        }
    }

    /// Set pretty printing.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set the indent unit.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }
}

thread_local! {
    static RENDER_DEFAULTS: Cell<RenderConfig> = const { Cell::new(RenderConfig::html()) };
}

/// Render flags read by [`Node::to_html`] and `Display`.
pub fn render_defaults() -> RenderConfig {
    RENDER_DEFAULTS.with(Cell::get)
}

/// Replace the render defaults of the current thread.
pub fn set_render_defaults(config: RenderConfig) {
    RENDER_DEFAULTS.with(|defaults| defaults.set(config));
}

/// Install `config` as the render defaults until the guard drops.
pub fn push_render_defaults(config: RenderConfig) -> RenderDefaultsGuard {
    let previous = RENDER_DEFAULTS.with(|defaults| defaults.replace(config));
    RenderDefaultsGuard { previous }
}

/// Restores the previous render defaults on drop, including while unwinding.
#[must_use = "the defaults are restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct RenderDefaultsGuard {
    previous: RenderConfig,
}

impl Drop for RenderDefaultsGuard {
    fn drop(&mut self) {
        set_render_defaults(self.previous);
    }
}

enum Step {
    Open {
        node: Rc<Node>,
        depth: usize,
        inline: bool,
    },
    Close {
        name: String,
        depth: usize,
        inline: bool,
        inline_content: bool,
    },
}

struct Writer<'a> {
    config: &'a RenderConfig,
    out: String,
    stack: Vec<Step>,
}

impl Writer<'_> {
    fn indent(&mut self, depth: usize, inline: bool) {
        if !inline {
            self.out
                .extend(std::iter::repeat(' ').take(depth * self.config.indent_width));
        }
    }

    fn newline(&mut self, inline: bool) {
        if !inline {
            self.out.push('\n');
        }
    }

    fn open(&mut self, node: &Node, depth: usize, inline: bool) {
        match node.kind() {
            NodeKind::Text => {
                self.indent(depth, inline);
                self.out.push_str(&node.text());
                self.newline(inline);
            }
            NodeKind::Comment => {
                self.indent(depth, inline);
                self.out.push_str("<!--");
                self.out.push_str(&node.text());
                self.out.push_str("-->");
                self.newline(inline);
            }
            NodeKind::Element => self.open_element(node, depth, inline),
        }
    }

    fn open_element(&mut self, node: &Node, depth: usize, inline: bool) {
        let name = node.name();
        self.indent(depth, inline);
        self.out.push('<');
        self.out.push_str(&name);
        for (attr, value) in node.attributes().iter() {
            self.out.push(' ');
            self.out.push_str(attr);
            write_attribute_value(&mut self.out, value, self.config.quote_all);
        }

        if node.is_void() {
            if self.config.self_closing_slash {
                self.out.push('/');
            }
            self.out.push('>');
            self.newline(inline);
            return;
        }
        self.out.push('>');

        let children = node.children();
        if children.is_empty() {
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
            self.newline(inline);
            return;
        }

        let inline_content = inline || INLINE_CONTENT_ELEMENTS.contains(&name.as_str());
        self.newline(inline_content);
        self.stack.push(Step::Close {
            name,
            depth,
            inline,
            inline_content,
        });
        for child in children.into_iter().rev() {
            self.stack.push(Step::Open {
                node: child,
                depth: depth + 1,
                inline: inline_content,
            });
        }
    }

    fn close(&mut self, name: &str, depth: usize, inline: bool, inline_content: bool) {
        if !inline_content {
            self.indent(depth, inline);
        }
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
        self.newline(inline);
    }

    fn run(mut self, root: &Node, depth: usize) -> String {
        let inline = !self.config.pretty;
        self.open(root, depth, inline);
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Open {
                    node,
                    depth,
                    inline,
                } => self.open(&node, depth, inline),
                Step::Close {
                    name,
                    depth,
                    inline,
                    inline_content,
                } => self.close(&name, depth, inline, inline_content),
            }
        }
        self.out
    }
}

/// Whether a text attribute value must be quoted. Values containing `&`
/// are quoted and escaped.
fn needs_quotes(value: &str) -> bool {
    value.is_empty()
        || value.chars().any(|c| {
            c.is_whitespace()
                || matches!(c, '?' | '"' | '/' | '-' | '\'' | '=' | '<' | '>' | '`' | '&')
        })
}

fn write_attribute_value(out: &mut String, value: &AttrValue, quote_all: bool) {
    let text = match value {
        AttrValue::Empty => return,
        AttrValue::Int(_) | AttrValue::Float(_) => {
            let rendered = value.to_string();
            if quote_all {
                push_quoted(out, &rendered);
            } else {
                out.push('=');
                out.push_str(&rendered);
            }
            return;
        }
        AttrValue::Text(text) => text,
    };
    if quote_all || needs_quotes(text) {
        push_quoted(out, text);
    } else {
        out.push('=');
        out.push_str(text);
    }
}

fn push_quoted(out: &mut String, value: &str) {
    out.push_str("=\"");
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '&' => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

impl Node {
    /// Serialize with an explicit configuration, starting at `initial_indent`
    /// nesting levels.
    pub fn render(&self, config: &RenderConfig, initial_indent: usize) -> String {
        debug!(node = %self.name(), pretty = config.pretty, "serializing");
        Writer {
            config,
            out: String::new(),
            stack: Vec::new(),
        }
        .run(self, initial_indent)
    }

    /// Serialize as HTML using the current render defaults.
    ///
    /// Pretty mode writes one node per line, indenting each nesting level,
    /// except inside `pre`, `textarea` and `code`, whose content follows the
    /// opening tag directly.
    pub fn to_html(&self, pretty: bool, initial_indent: usize) -> String {
        self.render(&render_defaults().with_pretty(pretty), initial_indent)
    }

    /// Serialize as XML: every value quoted, void tags self-closed, preceded
    /// by the XML declaration. The render defaults are restored afterwards.
    pub fn to_xml(&self, pretty: bool) -> String {
        let xml = RenderConfig {
            quote_all: true,
            self_closing_slash: true,
            ..render_defaults()
        };
        let _guard = push_render_defaults(xml);
        format!("{XML_DECLARATION}{}", self.to_html(pretty, 0))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&render_defaults(), 0))
    }
}
