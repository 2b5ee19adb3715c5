//! # MarkupKit Bench
//!
//! Fixture generators shared by the criterion benchmarks.
//!
//! Run with: `cargo bench -p markupkit-bench`

use markupkit_common::Result;
use markupkit_dom::Node;
use markupkit_template::Slots;
use std::rc::Rc;

/// A full page with `n` sections, each holding a heading, a paragraph
/// and a short list.
pub fn generate_page(n: usize) -> String {
    let mut html = String::from(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Bench</title></head><body>",
    );
    for i in 0..n {
        html.push_str(&format!(
            "<section id=\"s{i}\" class=\"item\"><h2>Section {i}</h2>\
             <p>Paragraph &amp; text number {i}.</p>\
             <ul><li>one</li><li>two</li><li><a href=\"/p/{i}\">link</a></li></ul>\
             </section>"
        ));
    }
    html.push_str("</body></html>");
    html
}

/// A template with `n` rows, each referencing two slots.
pub fn generate_template(n: usize) -> String {
    let mut html = String::from("<table>");
    for i in 0..n {
        html.push_str(&format!("<tr><td>{{{{ name{i} }}}}</td><td>{{{{value{i}}}}}</td></tr>"));
    }
    html.push_str("</table>");
    html
}

/// Values for every placeholder in [`generate_template`].
pub fn generate_slots(n: usize) -> Slots {
    let mut slots = Slots::new();
    for i in 0..n {
        slots.insert(format!("name{i}"), format!("Row <{i}>"));
        slots.insert(format!("value{i}"), i);
    }
    slots
}

/// A tree built through the mutation API: `width` children per level,
/// `depth` levels of nested `div`s with a text leaf at the bottom.
pub fn generate_tree(width: usize, depth: usize) -> Result<Rc<Node>> {
    let root = Node::new("div")?;
    let mut level = vec![root.clone()];
    for d in 0..depth {
        let mut next = Vec::with_capacity(level.len() * width);
        for parent in &level {
            for w in 0..width {
                let child = parent.add_element("div")?;
                child
                    .set_attribute("data-depth", d)
                    .set_attribute("class", format!("c{w}"));
                next.push(child);
            }
        }
        level = next;
    }
    for leaf in &level {
        leaf.add_text("leaf & text");
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use markupkit_template::{find_placeholders, TemplateCompiler};

    #[test]
    fn test_generate_page_parses() {
        let records = markupkit_html::parse(&generate_page(3)).unwrap();
        let sections = records[1].count();
        assert!(sections > 3 * 10);
    }

    #[test]
    fn test_template_slots_cover_placeholders() {
        let template = generate_template(4);
        assert_eq!(find_placeholders(&template).len(), 8);
        let out = TemplateCompiler::new()
            .compile_str(&template, &generate_slots(4), false)
            .unwrap()
            .to_html(false);
        assert!(!out.contains("{{"));
        assert!(out.contains("Row &lt;3&gt;"));
    }

    #[test]
    fn test_generate_tree_size() {
        let tree = generate_tree(3, 2).unwrap();
        assert_eq!(tree.child_count(), 3);
        assert_eq!(tree.get_elements_by_tag_name("div").len(), 3 + 9);
    }
}
