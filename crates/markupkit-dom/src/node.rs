//! # Node
//!
//! The tree entity: an element, a text leaf or a comment leaf.
//!
//! Nodes are shared as `Rc<Node>`; a parent owns its children strongly and a
//! child refers back to its parent through a `Weak` pointer. Mutators take
//! `&self` (interior mutability) and return the receiver so calls chain.

use crate::attributes::{AttrValue, AttributeStore};
use crate::children::ChildList;
use crate::escape::escape_html;
use crate::{is_valid_node_name, is_void_tag, COMMENT_NODE_NAME, TEXT_NODE_NAME};
use markupkit_common::{MarkupKitError, Result};
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::trace;

/// Semantic type of a node, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

/// What to remove in [`Node::remove_child`].
#[derive(Debug, Clone)]
pub enum ChildTarget {
    /// A direct node reference.
    Node(Rc<Node>),
    /// The first descendant whose `id` attribute matches.
    Id(String),
    /// A child position.
    Index(usize),
}

impl From<Rc<Node>> for ChildTarget {
    fn from(node: Rc<Node>) -> Self {
        ChildTarget::Node(node)
    }
}

impl From<&Rc<Node>> for ChildTarget {
    fn from(node: &Rc<Node>) -> Self {
        ChildTarget::Node(node.clone())
    }
}

impl From<&str> for ChildTarget {
    fn from(id: &str) -> Self {
        ChildTarget::Id(id.to_string())
    }
}

impl From<String> for ChildTarget {
    fn from(id: String) -> Self {
        ChildTarget::Id(id)
    }
}

impl From<usize> for ChildTarget {
    fn from(index: usize) -> Self {
        ChildTarget::Index(index)
    }
}

/// Options for [`Node::add_child_with`].
#[derive(Debug, Clone, Default)]
pub struct ChildOptions {
    /// Attributes applied to the child before it is attached.
    pub attributes: Vec<(String, AttrValue)>,
    /// Return the parent instead of the child.
    pub chain_on_parent: bool,
}

impl ChildOptions {
    /// Options that return the parent.
    pub fn chain_on_parent() -> Self {
        Self {
            chain_on_parent: true,
            ..Default::default()
        }
    }

    /// Add an attribute to apply to the child.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// A markup node.
pub struct Node {
    name: RefCell<String>,
    void: Cell<bool>,
    attributes: RefCell<AttributeStore>,
    text: RefCell<String>,
    escape_entities: Cell<bool>,
    /// `None` iff the node is void.
    children: RefCell<Option<ChildList>>,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
}

impl Node {
    fn build(name: String, void: bool, text: String, escape_entities: bool) -> Rc<Self> {
        Rc::new(Self {
            name: RefCell::new(name),
            void: Cell::new(void),
            attributes: RefCell::new(AttributeStore::new()),
            text: RefCell::new(text),
            escape_entities: Cell::new(escape_entities),
            children: RefCell::new(if void { None } else { Some(ChildList::new()) }),
            parent: RefCell::new(None),
        })
    }

    /// Create a node from a name.
    ///
    /// `#TEXT` and `#COMMENT` create empty text and comment leaves; any other
    /// name must pass [`is_valid_node_name`] and is lowercased. Void-ness is
    /// derived from the name.
    pub fn new(name: &str) -> Result<Rc<Self>> {
        if name.eq_ignore_ascii_case(TEXT_NODE_NAME) {
            return Ok(Self::new_text(""));
        }
        if name.eq_ignore_ascii_case(COMMENT_NODE_NAME) {
            return Ok(Self::new_comment(""));
        }
        if !is_valid_node_name(name) {
            return Err(MarkupKitError::invalid_node_name(name));
        }
        let name = name.to_ascii_lowercase();
        let void = is_void_tag(&name);
        Ok(Self::build(name, void, String::new(), false))
    }

    /// Create an element whose void-ness is decided by the caller
    /// (custom elements).
    pub fn with_void(name: &str, void: bool) -> Result<Rc<Self>> {
        let node = Self::new(name)?;
        if node.is_element() {
            node.set_void(void);
        }
        Ok(node)
    }

    /// Create an element from a name known to be valid.
    pub(crate) fn trusted(name: &str) -> Rc<Self> {
        debug_assert!(is_valid_node_name(name));
        Self::build(name.to_string(), is_void_tag(name), String::new(), false)
    }

    /// Create a text leaf. Its content is escaped on retrieval.
    pub fn new_text(content: impl Into<String>) -> Rc<Self> {
        Self::build(TEXT_NODE_NAME.to_string(), true, content.into(), true)
    }

    /// Create a comment leaf. Its content is returned verbatim.
    pub fn new_comment(content: impl Into<String>) -> Rc<Self> {
        Self::build(COMMENT_NODE_NAME.to_string(), true, content.into(), false)
    }

    // ==================== Identity ====================

    /// Node name: a lowercase tag name, `#TEXT` or `#COMMENT`.
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    /// Check the node name without cloning it.
    pub fn is_named(&self, name: &str) -> bool {
        *self.name.borrow() == name
    }

    /// Semantic type of the node.
    pub fn kind(&self) -> NodeKind {
        match self.name.borrow().as_str() {
            TEXT_NODE_NAME => NodeKind::Text,
            COMMENT_NODE_NAME => NodeKind::Comment,
            _ => NodeKind::Element,
        }
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    /// Check if this is a text node.
    pub fn is_text(&self) -> bool {
        self.kind() == NodeKind::Text
    }

    /// Check if this is a comment node.
    pub fn is_comment(&self) -> bool {
        self.kind() == NodeKind::Comment
    }

    /// Check if the node cannot own children.
    pub fn is_void(&self) -> bool {
        self.void.get()
    }

    /// The structural gate shared by every child mutator.
    fn accepts_children(&self) -> bool {
        self.is_element() && !self.is_void()
    }

    /// Rename the node.
    ///
    /// Allowed transitions are text to comment (and back) and renaming an
    /// element that has no children, which re-derives void-ness. Other
    /// transitions are ignored. An invalid element name is an error.
    pub fn rename(&self, name: &str) -> Result<&Self> {
        let target = if name.eq_ignore_ascii_case(TEXT_NODE_NAME) {
            NodeKind::Text
        } else if name.eq_ignore_ascii_case(COMMENT_NODE_NAME) {
            NodeKind::Comment
        } else if is_valid_node_name(name) {
            NodeKind::Element
        } else {
            return Err(MarkupKitError::invalid_node_name(name));
        };

        match (self.kind(), target) {
            (NodeKind::Text, NodeKind::Comment) => {
                *self.name.borrow_mut() = COMMENT_NODE_NAME.to_string();
                self.escape_entities.set(false);
            }
            (NodeKind::Comment, NodeKind::Text) => {
                *self.name.borrow_mut() = TEXT_NODE_NAME.to_string();
                self.escape_entities.set(true);
            }
            (NodeKind::Element, NodeKind::Element) if self.child_count() == 0 => {
                let name = name.to_ascii_lowercase();
                self.set_void_flag(is_void_tag(&name));
                *self.name.borrow_mut() = name;
            }
            (from, to) => {
                trace!(?from, ?to, name, "ignoring rename");
            }
        }
        Ok(self)
    }

    /// Force void-ness of an element (custom elements).
    ///
    /// Making an element void is ignored while it still has children.
    pub fn set_void(&self, void: bool) -> &Self {
        if !self.is_element() {
            return self;
        }
        if void && self.child_count() > 0 {
            trace!(name = %self.name(), "element with children cannot become void");
            return self;
        }
        self.set_void_flag(void);
        self
    }

    fn set_void_flag(&self, void: bool) {
        self.void.set(void);
        let mut children = self.children.borrow_mut();
        match (void, children.is_some()) {
            (true, true) => *children = None,
            (false, false) => *children = Some(ChildList::new()),
            _ => {}
        }
    }

    // ==================== Attributes ====================

    /// Set an attribute. Ignored on text and comment nodes and for invalid
    /// names; `style` and `dir` follow their special rules.
    pub fn set_attribute(&self, name: &str, value: impl Into<AttrValue>) -> &Self {
        if !self.is_element() {
            trace!(name, "attributes are ignored on text and comment nodes");
            return self;
        }
        self.attributes.borrow_mut().set(name, value.into());
        self
    }

    /// Set several attributes in order.
    pub fn set_attributes<K, V>(&self, attributes: impl IntoIterator<Item = (K, V)>) -> &Self
    where
        K: AsRef<str>,
        V: Into<AttrValue>,
    {
        for (name, value) in attributes {
            self.set_attribute(name.as_ref(), value);
        }
        self
    }

    /// Remove an attribute by exact name.
    pub fn remove_attribute(&self, name: &str) -> &Self {
        self.attributes.borrow_mut().remove(name);
        self
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.borrow().get(name).cloned()
    }

    /// Check for an attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.borrow().contains(name)
    }

    /// Borrow the attribute store.
    pub fn attributes(&self) -> Ref<'_, AttributeStore> {
        self.attributes.borrow()
    }

    /// The `id` attribute as a string.
    pub fn id(&self) -> Option<String> {
        self.attributes
            .borrow()
            .get("id")
            .filter(|v| !v.is_empty())
            .map(ToString::to_string)
    }

    /// Merge style declarations (see [`AttributeStore::merge_style`]).
    pub fn set_style<K, V>(
        &self,
        declarations: impl IntoIterator<Item = (K, V)>,
        override_existing: bool,
    ) -> &Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        if self.is_element() {
            self.attributes
                .borrow_mut()
                .merge_style(declarations, override_existing);
        }
        self
    }

    /// Remove one style property.
    pub fn remove_style(&self, property: &str) -> &Self {
        self.attributes.borrow_mut().remove_style(property);
        self
    }

    /// Current style declarations.
    pub fn style(&self) -> Vec<(String, String)> {
        self.attributes.borrow().style()
    }

    /// Add a class token if not already present.
    pub fn add_class(&self, class: &str) -> &Self {
        let class = class.trim();
        if class.is_empty() || self.has_class(class) {
            return self;
        }
        let classes = match self.get_attribute("class") {
            Some(AttrValue::Text(existing)) if !existing.is_empty() => {
                format!("{existing} {class}")
            }
            _ => class.to_string(),
        };
        self.set_attribute("class", classes)
    }

    /// Remove a class token.
    pub fn remove_class(&self, class: &str) -> &Self {
        let Some(AttrValue::Text(existing)) = self.get_attribute("class") else {
            return self;
        };
        let remaining: Vec<&str> = existing
            .split_whitespace()
            .filter(|c| *c != class)
            .collect();
        if remaining.is_empty() {
            self.remove_attribute("class")
        } else {
            self.set_attribute("class", remaining.join(" "))
        }
    }

    /// Check for a class token.
    pub fn has_class(&self, class: &str) -> bool {
        match self.attributes.borrow().get("class") {
            Some(AttrValue::Text(classes)) => classes.split_whitespace().any(|c| c == class),
            _ => false,
        }
    }

    // ==================== Text ====================

    /// Content of a text or comment node, escaped when
    /// [`escapes_entities`](Self::escapes_entities) is set. Empty for elements.
    pub fn text(&self) -> String {
        let raw = self.text.borrow();
        if self.escape_entities.get() {
            escape_html(&raw).into_owned()
        } else {
            raw.clone()
        }
    }

    /// Raw content of a text or comment node.
    pub fn raw_text(&self) -> String {
        self.text.borrow().clone()
    }

    /// Replace the content of a text or comment node.
    pub fn set_text(&self, content: impl Into<String>) -> &Self {
        if self.is_element() {
            trace!(name = %self.name(), "set_text ignored on element");
            return self;
        }
        *self.text.borrow_mut() = content.into();
        self
    }

    /// Append to the content of a text or comment node.
    pub fn append_text(&self, content: &str) -> &Self {
        if !self.is_element() {
            self.text.borrow_mut().push_str(content);
        }
        self
    }

    /// Whether retrieval escapes entities.
    pub fn escapes_entities(&self) -> bool {
        self.escape_entities.get()
    }

    /// Control entity escaping on retrieval.
    pub fn set_escape_entities(&self, escape: bool) -> &Self {
        self.escape_entities.set(escape);
        self
    }

    /// Concatenated raw text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        match self.kind() {
            NodeKind::Text => self.raw_text(),
            NodeKind::Comment => String::new(),
            NodeKind::Element => {
                let mut result = String::new();
                let mut stack = self.children();
                stack.reverse();
                while let Some(node) = stack.pop() {
                    if node.is_text() {
                        result.push_str(&node.text.borrow());
                    } else {
                        let mut children = node.children();
                        children.reverse();
                        stack.extend(children);
                    }
                }
                result
            }
        }
    }

    // ==================== Tree navigation ====================

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Borrow the child list; `None` for void nodes.
    pub fn child_list(&self) -> Option<Ref<'_, ChildList>> {
        Ref::filter_map(self.children.borrow(), Option::as_ref).ok()
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children
            .borrow()
            .as_ref()
            .map(|list| list.as_slice().to_vec())
            .unwrap_or_default()
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.borrow().as_ref().map_or(0, ChildList::len)
    }

    /// Get first child.
    pub fn first_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().as_ref()?.first().cloned()
    }

    /// Get last child.
    pub fn last_child(&self) -> Option<Rc<Node>> {
        self.children.borrow().as_ref()?.last().cloned()
    }

    /// Get the child at `index`.
    pub fn child_at(&self, index: usize) -> Option<Rc<Node>> {
        self.children.borrow().as_ref()?.get(index).cloned()
    }

    /// Position of a direct child.
    pub fn index_of(&self, child: &Rc<Node>) -> Option<usize> {
        self.children.borrow().as_ref()?.index_of(child)
    }

    /// Find a descendant by `id`.
    ///
    /// Each child's subtree is searched before the child itself, so a deep
    /// match inside an earlier child wins over a later shallow one.
    pub fn find_by_id(&self, id: &str) -> Option<Rc<Node>> {
        for child in self.children() {
            if let Some(found) = child.find_by_id(id) {
                return Some(found);
            }
            if child.id().as_deref() == Some(id) {
                return Some(child);
            }
        }
        None
    }

    /// All descendant elements with the given name, in document order.
    pub fn get_elements_by_tag_name(&self, name: &str) -> Vec<Rc<Node>> {
        let name = name.to_ascii_lowercase();
        let mut found = Vec::new();
        let mut stack = self.children();
        stack.reverse();
        while let Some(node) = stack.pop() {
            if node.is_named(&name) {
                found.push(node.clone());
            }
            let mut children = node.children();
            children.reverse();
            stack.extend(children);
        }
        found
    }

    // ==================== Cursor iteration ====================

    /// Child under the cursor.
    pub fn current_child(&self) -> Option<Rc<Node>> {
        self.child_list()?.current()
    }

    /// Advance the cursor and return the child under it.
    pub fn next_child(&self) -> Option<Rc<Node>> {
        self.child_list()?.advance()
    }

    /// Reset the cursor to the first child.
    pub fn rewind_children(&self) -> &Self {
        if let Some(list) = self.child_list() {
            list.rewind();
        }
        self
    }

    /// Check if the cursor points at a child.
    pub fn has_more_children(&self) -> bool {
        self.child_list().is_some_and(|list| list.has_more())
    }

    // ==================== Child mutation ====================

    /// Link `child` under `self`, detaching it from a previous parent.
    fn adopt(self: &Rc<Self>, child: &Rc<Node>) -> bool {
        if !self.accepts_children() {
            trace!(parent = %self.name(), child = %child.name(), "void node cannot own children");
            return false;
        }
        if Rc::ptr_eq(self, child) {
            trace!(name = %self.name(), "node cannot be its own child");
            return false;
        }
        child.detach();
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        true
    }

    /// Append a child and return it (chain on child).
    ///
    /// A text node appended right after a trailing text child is merged into
    /// that child instead of being attached; it is detached from any previous
    /// parent either way. Ignored on void nodes and for
    /// self-attachment.
    pub fn add_child(self: &Rc<Self>, child: Rc<Node>) -> Rc<Node> {
        if child.is_text() && self.accepts_children() {
            if let Some(last) = self.last_child().filter(|last| last.is_text()) {
                if !Rc::ptr_eq(&last, &child) {
                    // Merging moves the content, so the source leaves its old parent.
                    child.detach();
                    last.append_text(&child.text.borrow());
                    return child;
                }
            }
        }
        if self.adopt(&child) {
            if let Some(list) = self.children.borrow_mut().as_mut() {
                list.append(child.clone());
            }
        }
        child
    }

    /// Append a child and return the parent (chain on parent).
    pub fn with_child(self: &Rc<Self>, child: Rc<Node>) -> &Rc<Self> {
        self.add_child(child);
        self
    }

    /// Append a child with options: attributes applied to it first, and the
    /// return value chosen by `chain_on_parent`.
    pub fn add_child_with(self: &Rc<Self>, child: Rc<Node>, options: ChildOptions) -> Rc<Node> {
        child.set_attributes(options.attributes);
        let child = self.add_child(child);
        if options.chain_on_parent {
            self.clone()
        } else {
            child
        }
    }

    /// Create an element by name, append it and return it.
    pub fn add_element(self: &Rc<Self>, name: &str) -> Result<Rc<Node>> {
        Ok(self.add_child(Node::new(name)?))
    }

    /// Append a text child (merged into a trailing text child) and return it.
    pub fn add_text(self: &Rc<Self>, content: impl Into<String>) -> Rc<Node> {
        self.add_child(Node::new_text(content))
    }

    /// Append a comment child and return it.
    pub fn add_comment(self: &Rc<Self>, content: impl Into<String>) -> Rc<Node> {
        self.add_child(Node::new_comment(content))
    }

    /// Insert a child at `position` (clamped to the end).
    pub fn insert(self: &Rc<Self>, child: Rc<Node>, position: usize) -> &Rc<Self> {
        if self.adopt(&child) {
            if let Some(list) = self.children.borrow_mut().as_mut() {
                list.insert(position, child);
            }
        }
        self
    }

    /// Remove a child by reference, by descendant `id`, or by index.
    ///
    /// Returns the removed node with its parent link cleared.
    pub fn remove_child(&self, target: impl Into<ChildTarget>) -> Option<Rc<Node>> {
        if !self.accepts_children() {
            return None;
        }
        let removed = match target.into() {
            ChildTarget::Node(node) => self.children.borrow_mut().as_mut()?.remove(&node),
            ChildTarget::Index(index) => self.children.borrow_mut().as_mut()?.remove_at(index),
            ChildTarget::Id(id) => {
                let found = self.find_by_id(&id)?;
                let owner = found.parent()?;
                let removed = owner.children.borrow_mut().as_mut()?.remove(&found);
                removed
            }
        }?;
        *removed.parent.borrow_mut() = None;
        Some(removed)
    }

    /// Replace a direct child, returning the old one.
    pub fn replace_child(self: &Rc<Self>, old: &Rc<Node>, new: Rc<Node>) -> Option<Rc<Node>> {
        if self.index_of(old).is_none() || Rc::ptr_eq(old, &new) {
            return None;
        }
        if !self.adopt(&new) {
            return None;
        }
        let replaced = self.children.borrow_mut().as_mut()?.replace(old, new)?;
        *replaced.parent.borrow_mut() = None;
        Some(replaced)
    }

    /// Remove every child.
    pub fn remove_all_child_nodes(&self) -> &Self {
        if !self.accepts_children() {
            return self;
        }
        let removed = self
            .children
            .borrow_mut()
            .as_mut()
            .map(ChildList::clear)
            .unwrap_or_default();
        for child in removed {
            *child.parent.borrow_mut() = None;
        }
        self
    }

    /// Remove this node from its parent, if any.
    pub fn detach(&self) -> &Self {
        let parent = self.parent.borrow_mut().take().and_then(|w| w.upgrade());
        if let Some(parent) = parent {
            if let Some(list) = parent.children.borrow_mut().as_mut() {
                if let Some(index) = list.iter().position(|n| std::ptr::eq(n.as_ref(), self)) {
                    list.remove_at(index);
                }
            }
        }
        self
    }
}

impl Drop for Node {
    // Unlink uniquely owned descendants iteratively so dropping a deep tree
    // does not recurse once per level.
    fn drop(&mut self) {
        let Some(list) = self.children.get_mut().as_mut() else {
            return;
        };
        let mut pending = list.clear();
        while let Some(child) = pending.pop() {
            if Rc::strong_count(&child) == 1 {
                if let Some(grandchildren) = child.children.borrow_mut().as_mut() {
                    pending.extend(grandchildren.clear());
                }
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Node");
        s.field("name", &*self.name.borrow());
        match self.kind() {
            NodeKind::Element => {
                s.field("void", &self.is_void())
                    .field("attributes", &*self.attributes.borrow())
                    .field("children", &self.child_count());
            }
            _ => {
                s.field("text", &*self.text.borrow());
            }
        }
        s.finish()
    }
}
