//! # Document
//!
//! A full page: an `html` root owning a `head` and a `body`, with setters for
//! the head metadata that templates special-case.

use crate::node::Node;
use crate::serialize::XML_DECLARATION;
use std::rc::Rc;
use tracing::debug;

/// Doctype line written by [`Document::to_html`].
pub const HTML_DOCTYPE: &str = "<!DOCTYPE html>";

/// An `html` > (`head`, `body`) tree.
#[derive(Debug, Clone)]
pub struct Document {
    root: Rc<Node>,
    head: Rc<Node>,
    body: Rc<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        let root = Node::trusted("html");
        let head = root.add_child(Node::trusted("head"));
        let body = root.add_child(Node::trusted("body"));
        Self { root, head, body }
    }

    /// The `html` element.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// The `head` element.
    pub fn head(&self) -> &Rc<Node> {
        &self.head
    }

    /// The `body` element.
    pub fn body(&self) -> &Rc<Node> {
        &self.body
    }

    /// First `head` child named `name` that satisfies `matches`.
    fn head_child(&self, name: &str, matches: impl Fn(&Node) -> bool) -> Option<Rc<Node>> {
        self.head
            .children()
            .into_iter()
            .find(|child| child.is_named(name) && matches(child))
    }

    fn head_child_or_insert(
        &self,
        name: &str,
        matches: impl Fn(&Node) -> bool,
        position: Option<usize>,
    ) -> Rc<Node> {
        if let Some(existing) = self.head_child(name, matches) {
            return existing;
        }
        let node = Node::trusted(name);
        match position {
            Some(position) => {
                self.head.insert(node.clone(), position);
                node
            }
            None => self.head.add_child(node),
        }
    }

    /// Set the page title, creating the `title` element if needed.
    pub fn set_title(&self, title: &str) -> &Self {
        let node = self.head_child_or_insert("title", |_| true, None);
        node.remove_all_child_nodes();
        node.add_text(title);
        self
    }

    /// The page title, if a `title` element exists.
    pub fn title(&self) -> Option<String> {
        self.head_child("title", |_| true)
            .map(|title| title.text_content())
    }

    /// Set `base href`.
    pub fn set_base_url(&self, href: &str) -> &Self {
        self.head_child_or_insert("base", |_| true, None)
            .set_attribute("href", href);
        self
    }

    /// The `base href`, if set.
    pub fn base_url(&self) -> Option<String> {
        self.head_child("base", |_| true)?
            .get_attribute("href")
            .map(|href| href.to_string())
    }

    /// Set `link rel=canonical`.
    pub fn set_canonical_url(&self, href: &str) -> &Self {
        let link = self.head_child_or_insert("link", is_canonical_link, None);
        link.set_attribute("rel", "canonical").set_attribute("href", href);
        self
    }

    /// The canonical URL, if set.
    pub fn canonical_url(&self) -> Option<String> {
        self.head_child("link", is_canonical_link)?
            .get_attribute("href")
            .map(|href| href.to_string())
    }

    /// Set `meta charset`, kept as the first `head` child.
    pub fn set_charset(&self, charset: &str) -> &Self {
        self.head_child_or_insert("meta", |meta| meta.has_attribute("charset"), Some(0))
            .set_attribute("charset", charset);
        self
    }

    /// The declared charset, if set.
    pub fn charset(&self) -> Option<String> {
        self.head_child("meta", |meta| meta.has_attribute("charset"))?
            .get_attribute("charset")
            .map(|charset| charset.to_string())
    }

    /// Set the `lang` attribute of the root.
    pub fn set_language(&self, language: &str) -> &Self {
        self.root.set_attribute("lang", language);
        self
    }

    /// Append a node to `head` and return it.
    pub fn add_to_head(&self, node: Rc<Node>) -> Rc<Node> {
        self.head.add_child(node)
    }

    /// Append a node to `body` and return it.
    pub fn add_to_body(&self, node: Rc<Node>) -> Rc<Node> {
        self.body.add_child(node)
    }

    /// Serialize with a leading doctype.
    pub fn to_html(&self, pretty: bool) -> String {
        debug!(pretty, "serializing document");
        let separator = if pretty { "\n" } else { "" };
        format!("{HTML_DOCTYPE}{separator}{}", self.root.to_html(pretty, 0))
    }

    /// Serialize the root as XML.
    pub fn to_xml(&self, pretty: bool) -> String {
        let xml = self.root.to_xml(pretty);
        debug_assert!(xml.starts_with(XML_DECLARATION));
        xml
    }
}

fn is_canonical_link(link: &Node) -> bool {
    link.get_attribute("rel")
        .is_some_and(|rel| rel.to_string().eq_ignore_ascii_case("canonical"))
}
