//! Tree builder.
//!
//! Drives a [`TreeSink`] from the token stream with an explicit stack of
//! open elements. There are no insertion modes and no implied elements:
//! the tree mirrors the markup as written, with lenient recovery for
//! mismatched tags.

use crate::tokenizer::Token;
use crate::{ParseResult, TreeSink};
use tracing::trace;

/// Void elements that cannot have children.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements inside which whitespace-only text is kept.
const WHITESPACE_PRESERVING: &[&str] = &["pre", "textarea", "code", "script", "style"];

/// Check if a tag name is void.
pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Tree builder.
pub struct TreeBuilder<S: TreeSink> {
    sink: S,
    open_elements: Vec<String>,
}

impl<S: TreeSink> TreeBuilder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            open_elements: Vec::new(),
        }
    }

    fn preserves_whitespace(&self) -> bool {
        self.open_elements
            .iter()
            .any(|name| WHITESPACE_PRESERVING.contains(&name.as_str()))
    }

    /// Close elements down to and including `tag_name`.
    fn pop_until(&mut self, tag_name: &str) {
        while let Some(name) = self.open_elements.pop() {
            let matched = name == tag_name;
            if !matched {
                trace!(closing = %name, by = tag_name, "implicitly closing element");
            }
            self.sink.end_element(name);
            if matched {
                break;
            }
        }
    }

    pub fn build(mut self, tokens: Vec<Token>) -> ParseResult<S> {
        for token in tokens {
            self.process_token(token);
        }
        Ok(self.sink)
    }

    fn process_token(&mut self, token: Token) {
        match token {
            Token::Doctype { name } => self.sink.doctype(name),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if is_void_element(&name) || self_closing {
                    self.sink.start_element(name.clone(), attrs, self_closing);
                    self.sink.end_element(name);
                } else {
                    self.sink.start_element(name.clone(), attrs, false);
                    self.open_elements.push(name);
                }
            }
            Token::EndTag { name } => {
                if self.open_elements.contains(&name) {
                    self.pop_until(&name);
                } else {
                    trace!(tag = %name, "ignoring unmatched end tag");
                }
            }
            Token::Text(text) => {
                if text.trim().is_empty() && !self.preserves_whitespace() {
                    return;
                }
                self.sink.text(text);
            }
            Token::Comment(comment) => self.sink.comment(comment),
            Token::Eof => {
                while let Some(name) = self.open_elements.pop() {
                    trace!(tag = %name, "closing element at end of input");
                    self.sink.end_element(name);
                }
            }
        }
    }
}

/// Build a tree from tokens into the sink.
pub fn build_tree<S: TreeSink>(tokens: Vec<Token>, sink: S) -> ParseResult<S> {
    TreeBuilder::new(sink).build(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{tokenize, Attributes};

    #[derive(Default)]
    struct EventSink {
        events: Vec<String>,
    }

    impl TreeSink for EventSink {
        fn doctype(&mut self, name: String) {
            self.events.push(format!("doctype:{name}"));
        }

        fn start_element(&mut self, name: String, _attrs: Attributes, self_closing: bool) {
            let marker = if self_closing { "/" } else { "" };
            self.events.push(format!("start:{name}{marker}"));
        }

        fn end_element(&mut self, name: String) {
            self.events.push(format!("end:{name}"));
        }

        fn text(&mut self, data: String) {
            self.events.push(format!("text:{data}"));
        }

        fn comment(&mut self, data: String) {
            self.events.push(format!("comment:{data}"));
        }
    }

    fn events(html: &str) -> Vec<String> {
        let tokens = tokenize(html).unwrap();
        build_tree(tokens, EventSink::default()).unwrap().events
    }

    #[test]
    fn test_nested_elements() {
        assert_eq!(
            events("<ul><li>One</li><li>Two</li></ul>"),
            vec![
                "start:ul", "start:li", "text:One", "end:li", "start:li", "text:Two", "end:li",
                "end:ul"
            ]
        );
    }

    #[test]
    fn test_void_elements_close_immediately() {
        assert_eq!(
            events("<p>a<br>b</p>"),
            vec!["start:p", "text:a", "start:br", "end:br", "text:b", "end:p"]
        );
    }

    #[test]
    fn test_self_closing_non_void() {
        assert_eq!(
            events("<div/><span>x</span>"),
            vec!["start:div/", "end:div", "start:span", "text:x", "end:span"]
        );
    }

    #[test]
    fn test_whitespace_text_dropped_outside_pre() {
        assert_eq!(
            events("<ul>\n  <li>x</li>\n</ul>"),
            vec!["start:ul", "start:li", "text:x", "end:li", "end:ul"]
        );
        assert_eq!(
            events("<pre>  </pre>"),
            vec!["start:pre", "text:  ", "end:pre"]
        );
    }

    #[test]
    fn test_malformed_nesting() {
        // </b> closes the still-open <i>; the stray </i> is ignored.
        assert_eq!(
            events("<b><i>x</b></i>y"),
            vec!["start:b", "start:i", "text:x", "end:i", "end:b", "text:y"]
        );
    }

    #[test]
    fn test_unclosed_elements_closed_at_eof() {
        assert_eq!(
            events("<div><p>text"),
            vec!["start:div", "start:p", "text:text", "end:p", "end:div"]
        );
    }

    #[test]
    fn test_doctype_and_comment() {
        assert_eq!(
            events("<!DOCTYPE html><!-- c --><html></html>"),
            vec!["doctype:html", "comment: c ", "start:html", "end:html"]
        );
    }
}
