//! Ordered child collection with an external cursor.

use crate::Node;
use std::cell::Cell;
use std::rc::Rc;

/// Ordered list of child nodes owned by one parent.
///
/// Besides the usual slice access, the list carries a cursor
/// (`current`/`advance`/`rewind`/`has_more`). The cursor is never reset
/// implicitly; callers must `rewind` before reusing it.
#[derive(Debug, Default)]
pub struct ChildList {
    nodes: Vec<Rc<Node>>,
    cursor: Cell<usize>,
}

impl ChildList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a child by index.
    pub fn get(&self, index: usize) -> Option<&Rc<Node>> {
        self.nodes.get(index)
    }

    /// First child.
    pub fn first(&self) -> Option<&Rc<Node>> {
        self.nodes.first()
    }

    /// Last child.
    pub fn last(&self) -> Option<&Rc<Node>> {
        self.nodes.last()
    }

    /// Iterate children in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rc<Node>> {
        self.nodes.iter()
    }

    /// Children as a slice.
    pub fn as_slice(&self) -> &[Rc<Node>] {
        &self.nodes
    }

    /// Position of a node (by identity).
    pub fn index_of(&self, node: &Rc<Node>) -> Option<usize> {
        self.nodes.iter().position(|n| Rc::ptr_eq(n, node))
    }

    /// Append at the end.
    pub fn append(&mut self, node: Rc<Node>) {
        self.nodes.push(node);
    }

    /// Insert at `position`, clamped to the end of the list.
    pub fn insert(&mut self, position: usize, node: Rc<Node>) {
        let position = position.min(self.nodes.len());
        if position < self.cursor.get() {
            self.cursor.set(self.cursor.get() + 1);
        }
        self.nodes.insert(position, node);
    }

    /// Remove a node by identity.
    pub fn remove(&mut self, node: &Rc<Node>) -> Option<Rc<Node>> {
        let index = self.index_of(node)?;
        self.remove_at(index)
    }

    /// Remove the node at `index`.
    pub fn remove_at(&mut self, index: usize) -> Option<Rc<Node>> {
        if index >= self.nodes.len() {
            return None;
        }
        if index < self.cursor.get() {
            self.cursor.set(self.cursor.get() - 1);
        }
        Some(self.nodes.remove(index))
    }

    /// Replace `old` with `new` in place, returning `old`.
    pub fn replace(&mut self, old: &Rc<Node>, new: Rc<Node>) -> Option<Rc<Node>> {
        let index = self.index_of(old)?;
        Some(std::mem::replace(&mut self.nodes[index], new))
    }

    /// Remove every child, returning them in order.
    pub fn clear(&mut self) -> Vec<Rc<Node>> {
        self.cursor.set(0);
        std::mem::take(&mut self.nodes)
    }

    // ==================== Cursor ====================

    /// Child under the cursor.
    pub fn current(&self) -> Option<Rc<Node>> {
        self.nodes.get(self.cursor.get()).cloned()
    }

    /// Move the cursor forward and return the child now under it.
    pub fn advance(&self) -> Option<Rc<Node>> {
        if self.cursor.get() < self.nodes.len() {
            self.cursor.set(self.cursor.get() + 1);
        }
        self.current()
    }

    /// Move the cursor back to the first child.
    pub fn rewind(&self) {
        self.cursor.set(0);
    }

    /// Check if the cursor still points at a child.
    pub fn has_more(&self) -> bool {
        self.cursor.get() < self.nodes.len()
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.cursor.get()
    }
}

impl<'a> IntoIterator for &'a ChildList {
    type Item = &'a Rc<Node>;
    type IntoIter = std::slice::Iter<'a, Rc<Node>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(texts: &[&str]) -> (ChildList, Vec<Rc<Node>>) {
        let mut list = ChildList::new();
        let nodes: Vec<_> = texts.iter().map(|t| Node::new_text(*t)).collect();
        for node in &nodes {
            list.append(node.clone());
        }
        (list, nodes)
    }

    #[test]
    fn test_insert_clamps_position() {
        let (mut list, _) = list_of(&["a", "b"]);
        let c = Node::new_text("c");
        list.insert(99, c.clone());
        assert_eq!(list.index_of(&c), Some(2));
    }

    #[test]
    fn test_remove_and_replace() {
        let (mut list, nodes) = list_of(&["a", "b", "c"]);
        let removed = list.remove(&nodes[1]).unwrap();
        assert!(Rc::ptr_eq(&removed, &nodes[1]));
        assert_eq!(list.len(), 2);

        let d = Node::new_text("d");
        let old = list.replace(&nodes[0], d.clone()).unwrap();
        assert!(Rc::ptr_eq(&old, &nodes[0]));
        assert_eq!(list.index_of(&d), Some(0));
        assert!(list.remove_at(5).is_none());
    }

    #[test]
    fn test_cursor_protocol() {
        let (list, nodes) = list_of(&["a", "b"]);
        assert!(list.has_more());
        assert!(Rc::ptr_eq(&list.current().unwrap(), &nodes[0]));
        assert!(Rc::ptr_eq(&list.advance().unwrap(), &nodes[1]));
        assert!(list.advance().is_none());
        assert!(!list.has_more());

        // Exhausted until rewound.
        assert!(list.current().is_none());
        list.rewind();
        assert!(Rc::ptr_eq(&list.current().unwrap(), &nodes[0]));
    }

    #[test]
    fn test_cursor_tracks_removal_before_it() {
        let (mut list, nodes) = list_of(&["a", "b", "c"]);
        list.advance();
        list.advance();
        assert!(Rc::ptr_eq(&list.current().unwrap(), &nodes[2]));
        list.remove(&nodes[0]);
        assert!(Rc::ptr_eq(&list.current().unwrap(), &nodes[2]));
    }
}
