//! End-to-end template tests: build, serialize, parse, materialize.

use markupkit_common::MarkupKitError;
use markupkit_dom::{AttrValue, Node};
use markupkit_template::{substitute, Materialized, Slots, TemplateCompiler};
use std::fs;
use std::rc::Rc;
use tempfile::TempDir;

/// Name, sorted attributes, text and children, for structural comparison.
#[derive(Debug, PartialEq)]
struct Shape {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Shape>,
}

fn shape(node: &Rc<Node>) -> Shape {
    let mut attributes: Vec<_> = node
        .attributes()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    attributes.sort();
    Shape {
        name: node.name(),
        attributes,
        text: node.raw_text(),
        children: node.children().iter().map(shape).collect(),
    }
}

#[test]
fn test_slot_substitution_scenario() {
    let slots = Slots::new().with("greeting", "Hi & bye");
    let template = "<p>{{greeting}}</p>";
    assert_eq!(substitute(template, &slots), "<p>Hi &amp; bye</p>");

    let p = TemplateCompiler::new()
        .compile_str(template, &slots, false)
        .unwrap()
        .into_node()
        .unwrap();
    let text = p.first_child().unwrap();
    assert_eq!(text.raw_text(), "Hi & bye");
    assert_eq!(text.text(), "Hi &amp; bye");
}

#[test]
fn test_parse_scenario() {
    let ul = TemplateCompiler::new()
        .from_html_text("<ul><li>One</li><li>Two</li></ul>", false)
        .unwrap()
        .into_node()
        .unwrap();
    assert!(ul.is_named("ul"));
    let items = ul.children();
    assert_eq!(items.len(), 2);
    for (li, expected) in items.iter().zip(["One", "Two"]) {
        assert!(li.is_named("li"));
        assert_eq!(li.child_count(), 1);
        assert_eq!(li.first_child().unwrap().raw_text(), expected);
    }
}

#[test]
fn test_built_tree_survives_round_trip() {
    let root = Node::new("section").unwrap();
    root.set_attribute("id", "main")
        .set_attribute("data-count", 3)
        .set_attribute("hidden", AttrValue::Empty)
        .set_attribute("title", "a < b");
    let list = root.add_element("ol").unwrap();
    for item in ["first", "second & third"] {
        list.add_element("li").unwrap().add_text(item);
    }
    root.add_element("br").unwrap();
    let pre = root.add_element("pre").unwrap();
    pre.add_text("  keep\n  spacing");
    root.add_comment(" note ");

    let html = root.to_html(false, 0);
    let reparsed = TemplateCompiler::new()
        .from_html_text(&html, false)
        .unwrap()
        .into_node()
        .unwrap();
    assert_eq!(shape(&reparsed), shape(&root));
    assert_eq!(reparsed.to_html(false, 0), html);
}

#[test]
fn test_attribute_entities_survive_round_trip() {
    let link = Node::new("a").unwrap();
    link.set_attribute("title", "x &amp; y")
        .set_attribute("href", "/q?a=1&b=2")
        .set_attribute("data-raw", "&lt;&");
    link.add_text("go");

    let html = link.to_html(false, 0);
    let reparsed = TemplateCompiler::new()
        .from_html_text(&html, false)
        .unwrap()
        .into_node()
        .unwrap();
    assert_eq!(
        reparsed.get_attribute("title"),
        Some(AttrValue::Text("x &amp; y".into()))
    );
    assert_eq!(shape(&reparsed), shape(&link));
    assert_eq!(reparsed.to_html(false, 0), html);
}

#[test]
fn test_pretty_output_reparses_to_same_elements() {
    let root = Node::new("div").unwrap();
    root.add_element("p").unwrap().add_text("text");
    root.add_element("span").unwrap().add_element("b").unwrap().add_text("bold");

    let reparsed = TemplateCompiler::new()
        .from_html_text(&root.to_html(true, 0), false)
        .unwrap()
        .into_node()
        .unwrap();
    let names: Vec<_> = reparsed.children().iter().map(|n| n.name()).collect();
    assert_eq!(names, vec!["p", "span"]);
    assert_eq!(reparsed.text_content().split_whitespace().collect::<Vec<_>>(), vec!["text", "bold"]);
}

#[test]
fn test_compile_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = TemplateCompiler::new()
        .compile_file(&dir.path().join("nope.html"), &Slots::new(), false)
        .unwrap_err();
    assert!(matches!(err, MarkupKitError::TemplateNotFound { .. }));
    assert_eq!(err.category(), "template_not_found");
}

#[test]
fn test_compile_document_template() {
    markupkit_common::init_test_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("page.html");
    fs::write(
        &path,
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
  </head>
  <body>
    <h1>{{ heading }}</h1>
    <ul>{{ missing }}</ul>
  </body>
</html>"#,
    )
    .unwrap();

    let slots = Slots::from_json(r#"{"title": "Inbox (3)", "page": {"heading": "Tom & Jerry"}}"#)
        .unwrap();
    let compiled = TemplateCompiler::new().compile_file(&path, &slots, true).unwrap();
    let Materialized::Document(doc) = compiled else {
        panic!("expected a document");
    };
    assert_eq!(doc.title().as_deref(), Some("Inbox (3)"));
    assert_eq!(doc.charset().as_deref(), Some("utf-8"));
    assert_eq!(
        doc.body().to_html(false, 0),
        "<body><h1>Tom &amp; Jerry</h1><ul>{{ missing }}</ul></body>"
    );
    assert!(doc.to_html(false).starts_with("<!DOCTYPE html><html lang=en><head>"));
}

#[test]
fn test_fragment_with_several_roots() {
    let compiled = TemplateCompiler::new()
        .compile_str("<li>{{a}}</li><li>{{b}}</li>", &Slots::new().with("a", 1).with("b", 2), true)
        .unwrap();
    assert_eq!(compiled.to_html(false), "<li>1</li><li>2</li>");
    assert_eq!(compiled.into_nodes().len(), 2);
}
