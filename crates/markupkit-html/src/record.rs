//! Nested record representation of parsed markup.

use crate::tokenizer::Attributes;
use crate::TreeSink;
use tracing::trace;

/// Name reported for doctype records.
pub const DOCTYPE_NAME: &str = "!DOCTYPE";

/// One parsed construct.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// `<!DOCTYPE ...>` with its declaration body.
    Doctype(String),
    /// An element and its children. Void and self-closed elements have none.
    Element {
        name: String,
        attributes: Attributes,
        children: Vec<Record>,
    },
    /// Text, entities decoded.
    Text(String),
    /// Comment body.
    Comment(String),
}

impl Record {
    /// Element name, `!DOCTYPE`, `#TEXT` or `#COMMENT`.
    pub fn name(&self) -> &str {
        match self {
            Record::Doctype(_) => DOCTYPE_NAME,
            Record::Element { name, .. } => name,
            Record::Text(_) => "#TEXT",
            Record::Comment(_) => "#COMMENT",
        }
    }

    /// Check if this is an element named `name`.
    pub fn is_element(&self, name: &str) -> bool {
        matches!(self, Record::Element { name: n, .. } if n == name)
    }

    /// Children of an element; empty for everything else.
    pub fn children(&self) -> &[Record] {
        match self {
            Record::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Attribute value of an element. `Some(None)` for a valueless attribute.
    pub fn attribute(&self, name: &str) -> Option<Option<&str>> {
        match self {
            Record::Element { attributes, .. } => attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_deref()),
            _ => None,
        }
    }

    /// First direct child element named `name`.
    pub fn child_element(&self, name: &str) -> Option<&Record> {
        self.children().iter().find(|child| child.is_element(name))
    }

    /// Number of records in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(Record::count).sum::<usize>()
    }
}

struct OpenElement {
    name: String,
    attributes: Attributes,
    children: Vec<Record>,
}

/// Sink that collects a forest of [`Record`]s.
#[derive(Default)]
pub struct RecordSink {
    roots: Vec<Record>,
    open: Vec<OpenElement>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, record: Record) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(record),
            None => self.roots.push(record),
        }
    }

    /// The top-level records. Elements still open are closed.
    pub fn finish(mut self) -> Vec<Record> {
        while let Some(name) = self.open.last().map(|open| open.name.clone()) {
            self.end_element(name);
        }
        self.roots
    }
}

impl TreeSink for RecordSink {
    fn doctype(&mut self, name: String) {
        self.append(Record::Doctype(name));
    }

    fn start_element(&mut self, name: String, attrs: Attributes, _self_closing: bool) {
        self.open.push(OpenElement {
            name,
            attributes: attrs,
            children: Vec::new(),
        });
    }

    fn end_element(&mut self, name: String) {
        let Some(open) = self.open.pop() else {
            trace!(tag = %name, "end_element without open element");
            return;
        };
        self.append(Record::Element {
            name: open.name,
            attributes: open.attributes,
            children: open.children,
        });
    }

    fn text(&mut self, data: String) {
        // Adjacent text runs (split by a dropped construct) are merged.
        if let Some(Record::Text(last)) = self.current_children_mut().last_mut() {
            last.push_str(&data);
            return;
        }
        self.append(Record::Text(data));
    }

    fn comment(&mut self, data: String) {
        self.append(Record::Comment(data));
    }
}

impl RecordSink {
    fn current_children_mut(&mut self) -> &mut Vec<Record> {
        match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        }
    }
}
