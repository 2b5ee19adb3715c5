//! Convenience constructors for common elements.

use crate::attributes::AttrValue;
use crate::node::Node;
use markupkit_common::{MarkupKitError, Result};
use std::rc::Rc;

/// `<a href=...>text</a>`.
pub fn anchor(href: &str, text: &str) -> Rc<Node> {
    let a = Node::trusted("a");
    a.set_attribute("href", href);
    a.add_text(text);
    a
}

/// `<input type=... name=... value=...>`. The value is omitted when `None`.
pub fn input(input_type: &str, name: &str, value: Option<&str>) -> Rc<Node> {
    let input = Node::trusted("input");
    input.set_attribute("type", input_type).set_attribute("name", name);
    if let Some(value) = value {
        input.set_attribute("value", value);
    }
    input
}

/// An `ol` (ordered) or `ul` with one `li` per item.
pub fn list<I, S>(ordered: bool, items: I) -> Rc<Node>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let list = Node::trusted(if ordered { "ol" } else { "ul" });
    for item in items {
        list.add_child(Node::trusted("li")).add_text(item);
    }
    list
}

/// A fixed-size `table` of `tr`/`td` cells.
#[derive(Debug, Clone)]
pub struct Table {
    root: Rc<Node>,
    rows: usize,
    columns: usize,
}

impl Table {
    /// Create a table with `rows` x `columns` empty cells.
    pub fn new(rows: usize, columns: usize) -> Self {
        let root = Node::trusted("table");
        for _ in 0..rows {
            let tr = root.add_child(Node::trusted("tr"));
            for _ in 0..columns {
                tr.add_child(Node::trusted("td"));
            }
        }
        Self {
            root,
            rows,
            columns,
        }
    }

    /// Mark the first row as a header (`th` cells).
    pub fn with_header(self, headings: &[&str]) -> Self {
        let tr = Node::trusted("tr");
        for heading in headings {
            tr.add_child(Node::trusted("th")).add_text(*heading);
        }
        self.root.insert(tr, 0);
        self
    }

    /// The `table` element.
    pub fn node(&self) -> &Rc<Node> {
        &self.root
    }

    /// Number of body rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The `td` at (`row`, `column`).
    pub fn cell(&self, row: usize, column: usize) -> Result<Rc<Node>> {
        if row >= self.rows || column >= self.columns {
            return Err(MarkupKitError::InvalidIndex { row, column });
        }
        // Header rows are inserted in front of the body rows.
        let invalid = || MarkupKitError::InvalidIndex { row, column };
        let offset = self
            .root
            .child_count()
            .checked_sub(self.rows)
            .ok_or_else(invalid)?;
        self.root
            .child_at(offset + row)
            .and_then(|tr| tr.child_at(column))
            .ok_or_else(invalid)
    }

    /// Replace the content of a cell with text.
    pub fn set_cell(&self, row: usize, column: usize, text: &str) -> Result<Rc<Node>> {
        let cell = self.cell(row, column)?;
        cell.remove_all_child_nodes();
        cell.add_text(text);
        Ok(cell)
    }

    /// Set an attribute on a cell.
    pub fn set_cell_attribute(
        &self,
        row: usize,
        column: usize,
        name: &str,
        value: impl Into<AttrValue>,
    ) -> Result<Rc<Node>> {
        let cell = self.cell(row, column)?;
        cell.set_attribute(name, value);
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_and_input() {
        assert_eq!(anchor("/home", "Home").to_html(false, 0), "<a href=\"/home\">Home</a>");
        assert_eq!(
            input("text", "q", Some("rust")).to_html(false, 0),
            "<input type=text name=q value=rust>"
        );
        assert_eq!(
            input("checkbox", "ok", None).to_html(false, 0),
            "<input type=checkbox name=ok>"
        );
    }

    #[test]
    fn test_list() {
        assert_eq!(
            list(true, ["a", "b"]).to_html(false, 0),
            "<ol><li>a</li><li>b</li></ol>"
        );
        assert!(list(false, Vec::<String>::new()).is_named("ul"));
    }

    #[test]
    fn test_table_cells() {
        let table = Table::new(2, 2).with_header(&["x", "y"]);
        table.set_cell(1, 0, "bottom-left").unwrap();
        table.set_cell_attribute(0, 1, "colspan", 1).unwrap();
        assert_eq!(
            table.node().to_html(false, 0),
            "<table><tr><th>x</th><th>y</th></tr><tr><td></td><td colspan=1></td></tr>\
             <tr><td>bottom-left</td><td></td></tr></table>"
        );
    }

    #[test]
    fn test_table_out_of_range() {
        let table = Table::new(1, 3);
        assert!(matches!(
            table.set_cell(1, 0, "x"),
            Err(MarkupKitError::InvalidIndex { row: 1, column: 0 })
        ));
        assert!(matches!(
            table.cell(0, 3),
            Err(MarkupKitError::InvalidIndex { row: 0, column: 3 })
        ));
    }

    #[test]
    fn test_table_rows_removed_through_node() {
        let table = Table::new(2, 2);
        assert!(table.node().remove_child(0usize).is_some());
        assert!(matches!(
            table.cell(1, 0),
            Err(MarkupKitError::InvalidIndex { row: 1, column: 0 })
        ));
        assert!(table.set_cell(0, 0, "x").is_err());
    }
}
