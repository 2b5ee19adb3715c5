//! Record to Node conversion.

use markupkit_dom::{AttrValue, Document, Node};
use markupkit_html::Record;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Elements whose text is emitted without re-escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Result of materializing a parsed forest.
#[derive(Debug, Clone)]
pub enum Materialized {
    /// Nothing but whitespace, doctypes or dropped records.
    Empty,
    /// Exactly one top-level node.
    Node(Rc<Node>),
    /// Several top-level siblings.
    Nodes(Vec<Rc<Node>>),
    /// A full page.
    Document(Document),
}

impl Materialized {
    /// The single node, if there is exactly one. A document yields its root.
    pub fn into_node(self) -> Option<Rc<Node>> {
        match self {
            Materialized::Node(node) => Some(node),
            Materialized::Document(doc) => Some(doc.root().clone()),
            Materialized::Empty | Materialized::Nodes(_) => None,
        }
    }

    /// All top-level nodes.
    pub fn into_nodes(self) -> Vec<Rc<Node>> {
        match self {
            Materialized::Empty => Vec::new(),
            Materialized::Node(node) => vec![node],
            Materialized::Nodes(nodes) => nodes,
            Materialized::Document(doc) => vec![doc.root().clone()],
        }
    }

    /// The document, if the markup was a full page.
    pub fn into_document(self) -> Option<Document> {
        match self {
            Materialized::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Serialize whatever was materialized.
    pub fn to_html(&self, pretty: bool) -> String {
        match self {
            Materialized::Empty => String::new(),
            Materialized::Node(node) => node.to_html(pretty, 0),
            Materialized::Nodes(nodes) => nodes.iter().map(|n| n.to_html(pretty, 0)).collect(),
            Materialized::Document(doc) => doc.to_html(pretty),
        }
    }
}

/// Create the node for one record, without children. `None` for records that
/// have no node form (doctypes, invalid element names).
fn shallow_node(record: &Record, raw_text: bool) -> Option<Rc<Node>> {
    match record {
        Record::Doctype(_) => {
            trace!("dropping doctype outside a document");
            None
        }
        Record::Text(text) => {
            let node = Node::new_text(text.as_str());
            if raw_text {
                node.set_escape_entities(false);
            }
            Some(node)
        }
        Record::Comment(comment) => Some(Node::new_comment(comment.as_str())),
        Record::Element {
            name, attributes, ..
        } => match Node::new(name) {
            Ok(node) => {
                for (attr, value) in attributes {
                    let value = value
                        .as_deref()
                        .map_or(AttrValue::Empty, AttrValue::from);
                    node.set_attribute(attr, value);
                }
                Some(node)
            }
            Err(e) => {
                warn!(error = %e, "skipping element with invalid name, keeping its content");
                None
            }
        },
    }
}

/// Materialize `records` and append them under `parent`.
///
/// Uses an explicit stack so nesting depth is not bounded by the call stack.
/// Children of an element with an invalid name are lifted into its parent.
fn append_records(parent: &Rc<Node>, records: &[Record]) {
    let mut stack: Vec<(Rc<Node>, std::slice::Iter<'_, Record>)> =
        vec![(parent.clone(), records.iter())];

    while let Some((target, iter)) = stack.last_mut() {
        let Some(record) = iter.next() else {
            stack.pop();
            continue;
        };
        let target = target.clone();
        let raw_text = RAW_TEXT_ELEMENTS.iter().any(|name| target.is_named(name));
        match shallow_node(record, raw_text) {
            Some(node) => {
                let node = target.add_child(node);
                if !record.children().is_empty() {
                    stack.push((node, record.children().iter()));
                }
            }
            None if !record.children().is_empty() => {
                stack.push((target, record.children().iter()));
            }
            None => {}
        }
    }
}

/// Materialize one record as a standalone node tree.
pub fn materialize_record(record: &Record) -> Option<Rc<Node>> {
    let node = shallow_node(record, false)?;
    append_records(&node, record.children());
    Some(node)
}

/// Materialize a list of sibling records. Children of records without a
/// node form are lifted into the list.
fn materialize_siblings(records: &[Record]) -> Vec<Rc<Node>> {
    let mut nodes = Vec::new();
    for record in records {
        match materialize_record(record) {
            Some(node) => nodes.push(node),
            None => nodes.extend(materialize_siblings(record.children())),
        }
    }
    nodes
}

/// Check if a forest looks like a full page.
pub fn is_document(records: &[Record]) -> bool {
    records
        .iter()
        .find(|record| !matches!(record, Record::Comment(_)))
        .is_some_and(|first| matches!(first, Record::Doctype(_)) || first.is_element("html"))
}

/// Convert a parsed forest into nodes.
///
/// With `as_document` set and a forest that starts with a doctype or an
/// `html` element, the result is a [`Document`] whose `head` metadata goes
/// through the document setters. Otherwise one record yields a node and
/// several yield a list.
pub fn materialize(records: &[Record], as_document: bool) -> Materialized {
    if as_document && is_document(records) {
        return Materialized::Document(build_document(records));
    }

    let mut nodes = materialize_siblings(records);
    debug!(top_level = nodes.len(), "materialized records");
    match nodes.len() {
        0 => Materialized::Empty,
        1 => Materialized::Node(nodes.remove(0)),
        _ => Materialized::Nodes(nodes),
    }
}

fn record_text(record: &Record) -> String {
    let mut text = String::new();
    let mut stack = vec![record];
    while let Some(record) = stack.pop() {
        match record {
            Record::Text(t) => text.push_str(t),
            other => stack.extend(other.children().iter().rev()),
        }
    }
    text
}

fn add_head_record(doc: &Document, record: &Record) {
    let text_attr = |name: &str| record.attribute(name).flatten();

    match record.name() {
        "title" => {
            doc.set_title(&record_text(record));
        }
        "base" if text_attr("href").is_some() => {
            doc.set_base_url(text_attr("href").unwrap_or_default());
        }
        "link"
            if text_attr("rel").is_some_and(|rel| rel.eq_ignore_ascii_case("canonical"))
                && text_attr("href").is_some() =>
        {
            doc.set_canonical_url(text_attr("href").unwrap_or_default());
        }
        "meta" if text_attr("charset").is_some() => {
            doc.set_charset(text_attr("charset").unwrap_or_default());
        }
        _ => {
            if let Some(node) = materialize_record(record) {
                doc.add_to_head(node);
            }
        }
    }
}

fn build_document(records: &[Record]) -> Document {
    let doc = Document::new();

    let html = records.iter().find(|record| record.is_element("html"));
    let top_level: Vec<&Record> = match html {
        Some(html) => {
            if let Record::Element { attributes, .. } = html {
                for (name, value) in attributes {
                    let value = value.as_deref().map_or(AttrValue::Empty, AttrValue::from);
                    doc.root().set_attribute(name, value);
                }
            }
            html.children().iter().collect()
        }
        None => records
            .iter()
            .filter(|record| !matches!(record, Record::Doctype(_)))
            .collect(),
    };

    for record in top_level {
        match record {
            Record::Element { name, .. } if name == "head" => {
                for child in record.children() {
                    add_head_record(&doc, child);
                }
            }
            Record::Element { name, attributes, .. } if name == "body" => {
                for (attr, value) in attributes {
                    let value = value.as_deref().map_or(AttrValue::Empty, AttrValue::from);
                    doc.body().set_attribute(attr, value);
                }
                append_records(doc.body(), record.children());
            }
            other => append_records(doc.body(), std::slice::from_ref(other)),
        }
    }

    debug!(
        head = doc.head().child_count(),
        body = doc.body().child_count(),
        "materialized document"
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use markupkit_html::parse;

    fn records(html: &str) -> Vec<Record> {
        parse(html).unwrap()
    }

    #[test]
    fn test_single_node() {
        let node = materialize(&records("<ul><li>One</li><li>Two</li></ul>"), false)
            .into_node()
            .unwrap();
        assert!(node.is_named("ul"));
        assert_eq!(node.child_count(), 2);
        let texts: Vec<_> = node.children().iter().map(|li| li.text_content()).collect();
        assert_eq!(texts, vec!["One", "Two"]);
    }

    #[test]
    fn test_sibling_list() {
        let result = materialize(&records("<p>a</p><p>b</p>"), false);
        assert!(matches!(&result, Materialized::Nodes(nodes) if nodes.len() == 2));
        for node in result.into_nodes() {
            assert!(node.parent().is_none());
        }
        assert!(matches!(materialize(&records(" "), false), Materialized::Empty));
    }

    #[test]
    fn test_attributes_and_void() {
        let node = materialize(&records(r#"<input type="checkbox" checked>"#), false)
            .into_node()
            .unwrap();
        assert!(node.is_void());
        assert_eq!(node.get_attribute("checked"), Some(AttrValue::Empty));
        assert_eq!(node.to_html(false, 0), "<input type=checkbox checked>");
    }

    #[test]
    fn test_invalid_element_name_keeps_content() {
        markupkit_common::init_test_logging();
        let node = materialize(&records("<div><x_y>kept</x_y></div>"), false)
            .into_node()
            .unwrap();
        assert_eq!(node.to_html(false, 0), "<div>kept</div>");
    }

    #[test]
    fn test_script_text_not_escaped() {
        let node = materialize(&records("<script>if (a < b) {}</script>"), false)
            .into_node()
            .unwrap();
        assert_eq!(node.to_html(false, 0), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn test_document_restructuring() {
        let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Home &amp; away</title>
  <base target="_blank">
  <base href="/root/">
  <link rel="canonical" href="https://example.com/">
  <link rel="stylesheet" href="site.css">
</head>
<body class="page"><h1>Hi</h1></body>
</html>"#;
        let doc = materialize(&records(html), true).into_document().unwrap();
        assert_eq!(doc.root().get_attribute("lang"), Some(AttrValue::Text("en".into())));
        assert_eq!(doc.title().as_deref(), Some("Home & away"));
        assert_eq!(doc.charset().as_deref(), Some("utf-8"));
        assert_eq!(doc.base_url().as_deref(), Some("/root/"));
        assert_eq!(doc.canonical_url().as_deref(), Some("https://example.com/"));
        assert_eq!(doc.head().get_elements_by_tag_name("link").len(), 2);
        assert_eq!(doc.body().get_attribute("class"), Some(AttrValue::Text("page".into())));
        assert_eq!(doc.body().first_child().unwrap().text_content(), "Hi");
    }

    #[test]
    fn test_document_flag_required() {
        let forest = records("<html><body><p>x</p></body></html>");
        assert!(matches!(materialize(&forest, false), Materialized::Node(_)));
        assert!(matches!(materialize(&forest, true), Materialized::Document(_)));
        // A fragment stays a fragment even when a document is requested.
        assert!(matches!(
            materialize(&records("<p>x</p>"), true),
            Materialized::Node(_)
        ));
    }

    #[test]
    fn test_doctype_without_html_element() {
        let doc = materialize(&records("<!DOCTYPE html><p>loose</p>"), true)
            .into_document()
            .unwrap();
        assert_eq!(doc.body().child_count(), 1);
        assert_eq!(doc.to_html(false), "<!DOCTYPE html><html><head></head><body><p>loose</p></body></html>");
    }
}
