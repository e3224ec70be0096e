use thiserror::Error;
use url::Url;

use super::node::{Element, MutationRecord, NodeId, NodeKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("inserting {child} under {parent} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },
    #[error("the document root cannot be removed")]
    RootRemoval,
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed view of a live document.
///
/// Removed nodes stay in the arena (detached) so that handles held by an
/// index never dangle; they simply stop being attached to the root.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    root: NodeId,
    location: Url,
}

impl Document {
    /// Creates a document whose root is an empty `<body>`.
    pub fn new(location: Url) -> Self {
        Self::with_root(location, Element::new("body"))
    }

    pub fn with_root(location: Url, root: Element) -> Self {
        let slot = Slot { kind: NodeKind::Element(root), parent: None, children: Vec::new() };
        Self { slots: vec![slot], root: NodeId(0), location }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn set_location(&mut self, location: Url) {
        self.location = location;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.len() <= 1 && self.children(self.root).is_empty()
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).map(|s| &s.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(|c| self.element(*c).is_some())
    }

    /// Ancestors from the parent up to the root (or the top of a detached subtree).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors { doc: self, next: self.parent(id) }
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// Inclusive containment check.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Nearest inclusive ancestor element matching `pred`, like `Element.closest`.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| self.element(*n).is_some_and(&pred))
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// First descendant element matching `pred`, like `querySelector`.
    pub fn find(&self, scope: NodeId, pred: impl Fn(&Element) -> bool) -> Option<NodeId> {
        self.descendants(scope).into_iter().find(|n| self.element(*n).is_some_and(&pred))
    }

    /// All descendant elements matching `pred`, like `querySelectorAll`.
    pub fn find_all(&self, scope: NodeId, pred: impl Fn(&Element) -> bool) -> Vec<NodeId> {
        self.descendants(scope).into_iter().filter(|n| self.element(*n).is_some_and(&pred)).collect()
    }

    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|n| self.element(*n).and_then(Element::id) == Some(value))
    }

    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos].iter().rev().copied().find(|s| self.element(*s).is_some())
    }

    /// Concatenated text of every descendant text node, like `textContent`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id).into_iter().filter_map(|n| self.text(n)).collect()
    }

    /// Computed-hidden: the node or an ancestor is `display:none` or `visibility:hidden`.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        std::iter::once(id).chain(self.ancestors(id)).any(|n| {
            self.element(n)
                .is_some_and(|el| el.style.is_display_none() || el.style.is_visibility_hidden())
        })
    }

    /// Attached, not hidden, and not measured at zero height.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        if !self.is_attached(id) || self.is_hidden(id) {
            return false;
        }
        self.element(id).and_then(|el| el.size).is_none_or(|size| size.height > 0)
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.slots.push(Slot { kind, parent: None, children: Vec::new() });
        NodeId(self.slots.len() - 1)
    }

    fn check_element(&self, id: NodeId) -> Result<(), TreeError> {
        match self.kind(id) {
            None => Err(TreeError::UnknownNode(id)),
            Some(NodeKind::Text(_)) => Err(TreeError::NotAnElement(id)),
            Some(NodeKind::Element(_)) => Ok(()),
        }
    }

    /// Moves `child` (and its subtree) to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<MutationRecord, TreeError> {
        self.check_element(parent)?;
        if self.slot(child).is_none() {
            return Err(TreeError::UnknownNode(child));
        }
        if self.contains(child, parent) {
            return Err(TreeError::WouldCycle { parent, child });
        }
        self.detach(child);
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.push(child);
        Ok(MutationRecord { target: parent, added: vec![child], removed: Vec::new() })
    }

    /// Detaches `node` from its parent.
    pub fn remove(&mut self, node: NodeId) -> Result<MutationRecord, TreeError> {
        if node == self.root {
            return Err(TreeError::RootRemoval);
        }
        let parent = self.parent(node).ok_or(TreeError::UnknownNode(node))?;
        self.detach(node);
        Ok(MutationRecord { target: parent, added: Vec::new(), removed: vec![node] })
    }

    /// Replaces every child of `parent` with `children`.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        children: Vec<NodeId>,
    ) -> Result<MutationRecord, TreeError> {
        self.check_element(parent)?;
        for child in &children {
            if self.slot(*child).is_none() {
                return Err(TreeError::UnknownNode(*child));
            }
            if self.contains(*child, parent) {
                return Err(TreeError::WouldCycle { parent, child: *child });
            }
        }
        let removed = std::mem::take(&mut self.slots[parent.0].children);
        for old in &removed {
            self.slots[old.0].parent = None;
        }
        for child in &children {
            self.detach(*child);
            self.slots[child.0].parent = Some(parent);
        }
        self.slots[parent.0].children = children.clone();
        Ok(MutationRecord { target: parent, added: children, removed })
    }

    /// Replaces the content of an element with a single text node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<MutationRecord, TreeError> {
        self.check_element(node)?;
        let text = self.create_text(text);
        self.replace_children(node, vec![text])
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.slots[node.0].parent.take() {
            self.slots[parent.0].children.retain(|c| *c != node);
        }
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
