//! # As-code rendering
//!
//! Renders a tree as HTML that *displays* its own markup: every tag name,
//! attribute and punctuation mark is escaped and optionally wrapped in a
//! colored span.

use crate::attributes::AttrValue;
use crate::escape::escape_html;
use crate::node::{Node, NodeKind};
use markupkit_common::{MarkupKitError, Result};
use serde::{Deserialize, Deserializer};
use std::rc::Rc;
use tracing::debug;

/// Upper bound of `tab-spaces`.
pub const MAX_TAB_SPACES: usize = 8;

/// Colors used when `with-colors` is on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AsCodeColors {
    pub bg_color: String,
    pub text_color: String,
    pub attribute_color: String,
    pub attribute_value_color: String,
    pub node_name_color: String,
    pub lt_gt_color: String,
    pub comment_color: String,
    pub operator_color: String,
}

impl Default for AsCodeColors {
    fn default() -> Self {
        Self {
            bg_color: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
            attribute_color: "#ff0000".to_string(),
            attribute_value_color: "#0000ff".to_string(),
            node_name_color: "#800000".to_string(),
            lt_gt_color: "#0000ff".to_string(),
            comment_color: "#008000".to_string(),
            operator_color: "#000000".to_string(),
        }
    }
}

/// Options of [`Node::as_code`].
///
/// Deserializes from the kebab-case keys `tab-spaces`, `initial-tab`,
/// `with-colors`, `use-pre` and `colors`; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AsCodeOptions {
    /// Indent width, clamped to `0..=8`.
    #[serde(deserialize_with = "clamped_tab_spaces")]
    pub tab_spaces: usize,
    /// Starting indent level.
    pub initial_tab: usize,
    /// Emit color spans instead of plain escaped text.
    pub with_colors: bool,
    /// Wrap the output in a `pre` block.
    pub use_pre: bool,
    pub colors: AsCodeColors,
}

impl Default for AsCodeOptions {
    fn default() -> Self {
        Self {
            tab_spaces: 4,
            initial_tab: 0,
            with_colors: true,
            use_pre: true,
            colors: AsCodeColors::default(),
        }
    }
}

fn clamped_tab_spaces<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<usize, D::Error> {
    let requested = i64::deserialize(deserializer)?;
    Ok(requested.clamp(0, MAX_TAB_SPACES as i64) as usize)
}

impl AsCodeOptions {
    /// Parse options from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| MarkupKitError::config(format!("invalid as-code options: {e}")))
    }

    /// Plain escaped output without colors or `pre` wrapper.
    pub fn plain() -> Self {
        Self {
            with_colors: false,
            use_pre: false,
            ..Self::default()
        }
    }
}

struct Painter<'a> {
    options: &'a AsCodeOptions,
    indent_unit: String,
    lines: Vec<String>,
}

impl Painter<'_> {
    fn paint(&self, line: &mut String, color: &str, text: &str) {
        if self.options.with_colors {
            line.push_str("<span style=\"color:");
            line.push_str(color);
            line.push_str(";\">");
            line.push_str(text);
            line.push_str("</span>");
        } else {
            line.push_str(text);
        }
    }

    fn start_line(&self, depth: usize) -> String {
        self.indent_unit.repeat(depth)
    }

    fn escaped_text(&self, text: &str) -> String {
        let escaped = escape_html(text);
        if self.options.use_pre {
            escaped.into_owned()
        } else {
            escaped.replace('\n', "<br>")
        }
    }

    fn open_tag(&self, node: &Node, depth: usize) -> String {
        let colors = &self.options.colors;
        let mut line = self.start_line(depth);
        self.paint(&mut line, &colors.lt_gt_color, "&lt;");
        self.paint(&mut line, &colors.node_name_color, &node.name());
        for (name, value) in node.attributes().iter() {
            line.push(' ');
            self.paint(&mut line, &colors.attribute_color, &escape_html(name));
            if !matches!(value, AttrValue::Empty) {
                self.paint(&mut line, &colors.operator_color, "=");
                let quoted = format!("&quot;{}&quot;", escape_html(&value.to_string()));
                self.paint(&mut line, &colors.attribute_value_color, &quoted);
            }
        }
        self.paint(&mut line, &colors.lt_gt_color, "&gt;");
        line
    }

    fn close_tag(&self, line: &mut String, name: &str) {
        let colors = &self.options.colors;
        self.paint(line, &colors.lt_gt_color, "&lt;/");
        self.paint(line, &colors.node_name_color, name);
        self.paint(line, &colors.lt_gt_color, "&gt;");
    }

    fn leaf(&self, node: &Node, depth: usize) -> String {
        let colors = &self.options.colors;
        let mut line = self.start_line(depth);
        if node.kind() == NodeKind::Comment {
            let comment = format!("&lt;!--{}--&gt;", self.escaped_text(&node.raw_text()));
            self.paint(&mut line, &colors.comment_color, &comment);
        } else {
            self.paint(&mut line, &colors.text_color, &self.escaped_text(&node.text()));
        }
        line
    }

    fn run(mut self, root: &Node) -> String {
        enum Step {
            Open(Rc<Node>, usize),
            Close(String, usize),
        }

        let mut stack = Vec::new();
        let visit = |painter: &mut Self, node: &Node, depth: usize, stack: &mut Vec<Step>| {
            if !node.is_element() {
                let line = painter.leaf(node, depth);
                painter.lines.push(line);
                return;
            }
            let mut line = painter.open_tag(node, depth);
            let children = node.children();
            if node.is_void() {
                painter.lines.push(line);
            } else if children.is_empty() {
                painter.close_tag(&mut line, &node.name());
                painter.lines.push(line);
            } else {
                painter.lines.push(line);
                stack.push(Step::Close(node.name(), depth));
                for child in children.into_iter().rev() {
                    stack.push(Step::Open(child, depth + 1));
                }
            }
        };

        let initial = self.options.initial_tab;
        visit(&mut self, root, initial, &mut stack);
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(node, depth) => visit(&mut self, &node, depth, &mut stack),
                Step::Close(name, depth) => {
                    let mut line = self.start_line(depth);
                    self.close_tag(&mut line, &name);
                    self.lines.push(line);
                }
            }
        }
        self.finish()
    }

    fn finish(self) -> String {
        let options = self.options;
        let colors = &options.colors;
        let block_style = format!(
            "background-color:{};color:{};",
            colors.bg_color, colors.text_color
        );
        if options.use_pre {
            let body = self.lines.join("\n");
            if options.with_colors {
                format!("<pre style=\"{block_style}\">{body}</pre>")
            } else {
                format!("<pre>{body}</pre>")
            }
        } else {
            let body = self
                .lines
                .iter()
                .map(|line| format!("{line}<br>"))
                .collect::<Vec<_>>()
                .join("\n");
            if options.with_colors {
                format!("<div style=\"{block_style}font-family:monospace;\">{body}</div>")
            } else {
                body
            }
        }
    }
}

impl Node {
    /// Render the tree as markup that displays its own source.
    pub fn as_code(&self, options: &AsCodeOptions) -> String {
        debug!(node = %self.name(), with_colors = options.with_colors, use_pre = options.use_pre, "rendering as code");
        let tab_spaces = options.tab_spaces.min(MAX_TAB_SPACES);
        let indent_unit = if options.use_pre {
            " ".repeat(tab_spaces)
        } else {
            "&nbsp;".repeat(tab_spaces)
        };
        Painter {
            options,
            indent_unit,
            lines: Vec::new(),
        }
        .run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rc<Node> {
        let div = Node::new("div").unwrap();
        div.set_attribute("id", "main");
        div.add_text("a & b");
        div.add_element("br").unwrap();
        div
    }

    #[test]
    fn test_plain_output() {
        let code = sample().as_code(&AsCodeOptions::plain());
        assert_eq!(
            code,
            "&lt;div id=&quot;main&quot;&gt;<br>\n\
             &nbsp;&nbsp;&nbsp;&nbsp;a &amp;amp; b<br>\n\
             &nbsp;&nbsp;&nbsp;&nbsp;&lt;br&gt;<br>\n\
             &lt;/div&gt;<br>"
        );
    }

    #[test]
    fn test_pre_output_without_colors() {
        let options = AsCodeOptions {
            with_colors: false,
            tab_spaces: 2,
            initial_tab: 1,
            ..AsCodeOptions::default()
        };
        let p = Node::new("p").unwrap();
        p.add_comment("note");
        assert_eq!(
            p.as_code(&options),
            "<pre>  &lt;p&gt;\n    &lt;!--note--&gt;\n  &lt;/p&gt;</pre>"
        );
    }

    #[test]
    fn test_colored_spans() {
        let code = Node::new("hr").unwrap().as_code(&AsCodeOptions::default());
        assert!(code.starts_with("<pre style=\"background-color:#ffffff;color:#000000;\">"));
        assert!(code.contains("<span style=\"color:#800000;\">hr</span>"));
        assert!(code.contains("<span style=\"color:#0000ff;\">&lt;</span>"));
        assert!(code.ends_with("</pre>"));
    }

    #[test]
    fn test_options_from_json() {
        let options = AsCodeOptions::from_json(
            r##"{"tab-spaces": 20, "use-pre": false, "colors": {"node-name-color": "#123456"}}"##,
        )
        .unwrap();
        assert_eq!(options.tab_spaces, MAX_TAB_SPACES);
        assert!(!options.use_pre);
        assert!(options.with_colors);
        assert_eq!(options.colors.node_name_color, "#123456");
        assert_eq!(options.colors.bg_color, "#ffffff");

        let negative = AsCodeOptions::from_json(r#"{"tab-spaces": -3}"#).unwrap();
        assert_eq!(negative.tab_spaces, 0);

        assert!(matches!(
            AsCodeOptions::from_json(r#"{"with-colors": "yes"}"#),
            Err(MarkupKitError::Config(_))
        ));
    }

    #[test]
    fn test_programmatic_tab_spaces_clamped() {
        let options = AsCodeOptions {
            tab_spaces: 100,
            ..AsCodeOptions::plain()
        };
        let ul = Node::new("ul").unwrap();
        ul.add_element("li").unwrap();
        let code = ul.as_code(&options);
        assert!(code.contains(&format!("{}&lt;li&gt;", "&nbsp;".repeat(8))));
    }
}
