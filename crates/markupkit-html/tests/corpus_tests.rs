//! Corpus tests for the markup parser

use markupkit_html::{parse, parse_with, Attributes, Record, TreeSink};

#[derive(Debug, Default)]
struct TestSink {
    events: Vec<String>,
    depth: usize,
    max_depth: usize,
}

impl TreeSink for TestSink {
    fn doctype(&mut self, name: String) {
        self.events.push(format!("doctype:{}", name));
    }

    fn start_element(&mut self, name: String, attrs: Attributes, _self_closing: bool) {
        let attr_str = attrs
            .iter()
            .map(|(k, v)| match v {
                Some(v) => format!("{}={}", k, v),
                None => k.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        if attr_str.is_empty() {
            self.events.push(format!("start:{}", name));
        } else {
            self.events.push(format!("start:{}[{}]", name, attr_str));
        }
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn end_element(&mut self, name: String) {
        self.depth -= 1;
        self.events.push(format!("end:{}", name));
    }

    fn text(&mut self, data: String) {
        self.events.push(format!("text:{}", data.trim()));
    }

    fn comment(&mut self, data: String) {
        self.events.push(format!("comment:{}", data));
    }
}

fn events(html: &str) -> TestSink {
    parse_with(html, TestSink::default()).unwrap()
}

#[test]
fn test_simple_page() {
    let html = r#"<!DOCTYPE html>
<html>
<head><title>Test</title></head>
<body><p>Hello</p></body>
</html>"#;

    let result = events(html);
    assert_eq!(
        result.events,
        vec![
            "doctype:html",
            "start:html",
            "start:head",
            "start:title",
            "text:Test",
            "end:title",
            "end:head",
            "start:body",
            "start:p",
            "text:Hello",
            "end:p",
            "end:body",
            "end:html",
        ]
    );
    assert_eq!(result.depth, 0);
}

#[test]
fn test_malformed_nesting_stays_balanced() {
    markupkit_common::init_test_logging();
    let result = events("<div><span><p></div></span></p>");
    assert_eq!(result.depth, 0);
    assert_eq!(
        result.events,
        vec!["start:div", "start:span", "start:p", "end:p", "end:span", "end:div"]
    );
}

#[test]
fn test_unclosed_tags() {
    let result = events("<html><body><p>Text<div>More");
    assert!(result.events.contains(&"text:Text".to_string()));
    assert!(result.events.contains(&"text:More".to_string()));
    assert_eq!(result.depth, 0);
    assert_eq!(result.max_depth, 4);
}

#[test]
fn test_entity_decoding() {
    let records = parse("<p>&lt;div&gt; &amp; &quot;text&quot;</p>").unwrap();
    assert_eq!(
        records[0].children(),
        &[Record::Text("<div> & \"text\"".to_string())]
    );
}

#[test]
fn test_nested_lists() {
    let records = parse("<ul><li>One<ul><li>Nested</li></ul></li><li>Two</li></ul>").unwrap();
    let outer = &records[0];
    assert_eq!(outer.children().len(), 2);
    let first = &outer.children()[0];
    assert_eq!(first.children()[0], Record::Text("One".to_string()));
    let inner = first.child_element("ul").unwrap();
    assert_eq!(inner.children().len(), 1);
    assert_eq!(outer.count(), 8);
}

#[test]
fn test_table_structure() {
    let result = events("<table><tr><td>Cell</td></tr></table>");
    assert_eq!(
        result.events,
        vec![
            "start:table",
            "start:tr",
            "start:td",
            "text:Cell",
            "end:td",
            "end:tr",
            "end:table"
        ]
    );
}

#[test]
fn test_comments() {
    let records = parse("<!-- comment 1 --><div><!-- comment 2 --></div>after").unwrap();
    assert_eq!(records[0], Record::Comment(" comment 1 ".to_string()));
    assert_eq!(
        records[1].children(),
        &[Record::Comment(" comment 2 ".to_string())]
    );
    assert_eq!(records[2], Record::Text("after".to_string()));
}

#[test]
fn test_attributes_with_special_chars() {
    let result =
        events(r#"<input type="text" data-value="foo&amp;bar" class="a b c" required>"#);
    assert_eq!(
        result.events,
        vec![
            "start:input[type=text data-value=foo&bar class=a b c required]",
            "end:input"
        ]
    );
}

#[test]
fn test_nested_quotes_in_values() {
    let records =
        parse(r#"<button onclick="alert('a > b')" title='say "hi"'>Go</button>"#).unwrap();
    let button = &records[0];
    assert_eq!(button.attribute("onclick"), Some(Some("alert('a > b')")));
    assert_eq!(button.attribute("title"), Some(Some(r#"say "hi""#)));
    assert_eq!(button.children(), &[Record::Text("Go".to_string())]);
}

#[test]
fn test_script_content_is_not_markup() {
    let records =
        parse("<script>document.write('<p>' + x + '</p>');</script><p>after</p>").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].children(),
        &[Record::Text("document.write('<p>' + x + '</p>');".to_string())]
    );
}

#[test]
fn test_deeply_nested_input() {
    let depth = 5_000;
    let html = "<div>".repeat(depth) + &"</div>".repeat(depth);
    let result = events(&html);
    assert_eq!(result.max_depth, depth);
    assert_eq!(result.depth, 0);
}
