//! Element tree consumed by the translator.
//!
//! Parsers build a [`Document`]: an arena of nodes where every child is owned
//! by its parent's child list and the parent link is a plain [`NodeId`] index.
//! The tree therefore has a single owner per node and no reference cycles,
//! while rules can still walk upwards (e.g. "is this `<code>` inside a
//! `<pre>`?").
//!
//! For hand-built trees (tests, callers that already hold a DOM) the owned
//! [`Node`] builder can be converted into a [`Document`] in one step.

/// Node types matching DOM nodeType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Element node (nodeType = 1)
    Element = 1,
    /// Text node (nodeType = 3)
    Text = 3,
    /// Document fragment node (nodeType = 11)
    DocumentFragment = 11,
}

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    node_type: NodeType,
    /// Tag name as written in the source; empty for text and fragment nodes.
    node_name: String,
    /// Character data for text nodes.
    node_value: Option<String>,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An element tree stored as an arena.
///
/// The root is always a document fragment; top-level elements and text are its
/// children.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Document {
    /// Create a document holding only the root fragment.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                node_type: NodeType::DocumentFragment,
                node_name: String::new(),
                node_value: None,
                attributes: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Build a document whose root fragment holds `node`.
    pub fn from_node(node: Node) -> Self {
        let mut doc = Self::new();
        let root = doc.root_id();
        doc.append_owned(root, node);
        doc
    }

    /// Id of the root fragment.
    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    /// The root fragment.
    pub fn root(&self) -> NodeRef<'_> {
        self.get(self.root_id())
    }

    /// Borrow a node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this document.
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.0 < self.nodes.len(), "node id out of range");
        NodeRef { doc: self, id }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the document holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Append a new element under `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag_name: &str) -> NodeId {
        self.push(parent, NodeType::Element, tag_name, None, Vec::new())
    }

    /// Append a new element with attributes under `parent`.
    pub fn append_element_with_attrs(
        &mut self,
        parent: NodeId,
        tag_name: &str,
        attrs: Vec<(&str, &str)>,
    ) -> NodeId {
        let attrs = attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.push(parent, NodeType::Element, tag_name, None, attrs)
    }

    /// Append a text node under `parent`.
    pub fn append_text(&mut self, parent: NodeId, content: &str) -> NodeId {
        self.push(
            parent,
            NodeType::Text,
            "",
            Some(content.to_string()),
            Vec::new(),
        )
    }

    /// Set an attribute, replacing an existing value with the same name.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[id.0].attributes;
        if let Some(slot) = attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            slot.1 = value.to_string();
        } else {
            attrs.push((name.to_string(), value.to_string()));
        }
    }

    fn push(
        &mut self,
        parent: NodeId,
        node_type: NodeType,
        node_name: &str,
        node_value: Option<String>,
        attributes: Vec<(String, String)>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            node_type,
            node_name: node_name.to_string(),
            node_value,
            attributes,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    fn append_owned(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = match node.node_type {
            NodeType::Text => {
                return self.append_text(parent, node.node_value.as_deref().unwrap_or(""));
            }
            NodeType::Element => self.push(
                parent,
                NodeType::Element,
                &node.node_name,
                None,
                node.attributes,
            ),
            // A nested fragment is flattened into its parent.
            NodeType::DocumentFragment => parent,
        };
        for child in node.children {
            self.append_owned(id, child);
        }
        id
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Node> for Document {
    fn from(node: Node) -> Self {
        Self::from_node(node)
    }
}

/// A borrowed view of one node with access to its parent and children.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn data(&self) -> &'a NodeData {
        &self.doc.nodes[self.id.0]
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The document this node belongs to.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn node_type(&self) -> NodeType {
        self.data().node_type
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    pub fn is_text(&self) -> bool {
        self.node_type() == NodeType::Text
    }

    /// Tag name as written in the source (`"DIV"`, `"div"`, ...).
    pub fn node_name(&self) -> &'a str {
        &self.data().node_name
    }

    /// Get the tag name (lowercase)
    pub fn tag_name(&self) -> String {
        self.data().node_name.to_ascii_lowercase()
    }

    /// Whether this is an element with the given tag, compared case-insensitively.
    pub fn is_tag(&self, tag: &str) -> bool {
        self.is_element() && self.data().node_name.eq_ignore_ascii_case(tag)
    }

    /// Raw character data of a text node.
    pub fn text(&self) -> Option<&'a str> {
        self.data().node_value.as_deref()
    }

    /// Get an attribute value by name
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.data()
            .attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.data()
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let doc = self.doc;
        self.data().parent.map(|id| NodeRef { doc, id })
    }

    /// Ancestors from the parent up to (and including) the root fragment.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        let doc = self.doc;
        self.data().children.iter().map(move |&id| NodeRef { doc, id })
    }

    pub fn element_children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        self.children().filter(|n| n.is_element())
    }

    /// Children that are not whitespace-only text.
    pub fn significant_children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        self.children()
            .filter(|n| !n.text().is_some_and(|t| t.trim().is_empty()))
    }

    /// Position of this element among its parent's element children.
    pub fn element_index(&self) -> usize {
        self.parent()
            .and_then(|p| p.element_children().position(|c| c.id == self.id))
            .unwrap_or(0)
    }

    /// Get all text content from this node and descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self.node_type() {
            NodeType::Text => out.push_str(self.text().unwrap_or("")),
            _ => self.children().for_each(|c| c.collect_text(out)),
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node_type() {
            NodeType::Text => f.debug_tuple("Text").field(&self.text()).finish(),
            NodeType::Element => f.debug_tuple("Element").field(&self.node_name()).finish(),
            NodeType::DocumentFragment => f.write_str("Fragment"),
        }
    }
}

/// Owned node used to build trees by hand before freezing them into a
/// [`Document`].
#[derive(Debug, Clone)]
pub struct Node {
    node_type: NodeType,
    node_name: String,
    node_value: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Node {
    /// Create a new element node
    pub fn element(tag_name: &str) -> Self {
        Self::element_with_attrs(tag_name, Vec::new())
    }

    /// Create a new element node with attributes
    pub fn element_with_attrs(tag_name: &str, attrs: Vec<(&str, &str)>) -> Self {
        Self {
            node_type: NodeType::Element,
            node_name: tag_name.to_string(),
            node_value: None,
            attributes: attrs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children: Vec::new(),
        }
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self {
            node_type: NodeType::Text,
            node_name: String::new(),
            node_value: Some(content.to_string()),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a fragment whose children are spliced into the parent.
    pub fn fragment() -> Self {
        Self {
            node_type: NodeType::DocumentFragment,
            node_name: String::new(),
            node_value: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Builder form of [`Node::add_child`].
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Builder shorthand for appending a text child.
    pub fn with_text(self, content: &str) -> Self {
        self.with_child(Node::text(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_element() {
        let doc = Document::from(Node::element("DIV"));
        let div = doc.root().children().next().unwrap();
        assert!(div.is_element());
        assert_eq!(div.tag_name(), "div");
        assert_eq!(div.node_name(), "DIV");
        assert!(div.is_tag("Div"));
    }

    #[test]
    fn test_create_text() {
        let doc = Document::from(Node::text("Hello World"));
        let text = doc.root().children().next().unwrap();
        assert!(text.is_text());
        assert_eq!(text.text_content(), "Hello World");
    }

    #[test]
    fn test_attributes() {
        let doc = Document::from(Node::element_with_attrs(
            "a",
            vec![("href", "https://example.com"), ("TITLE", "Example")],
        ));
        let a = doc.root().children().next().unwrap();
        assert_eq!(a.attr("href"), Some("https://example.com"));
        assert_eq!(a.attr("title"), Some("Example"));
        assert_eq!(a.attr("class"), None);
    }

    #[test]
    fn test_parent_links() {
        let mut doc = Document::new();
        let ul = doc.append_element(doc.root_id(), "ul");
        let li = doc.append_element(ul, "li");
        let text = doc.append_text(li, "item");

        let text = doc.get(text);
        assert_eq!(text.parent().unwrap().id(), li);
        let tags: Vec<String> = text.ancestors().map(|n| n.tag_name()).collect();
        assert_eq!(tags, vec!["li", "ul", ""]);
        assert!(doc.root().parent().is_none());
    }

    #[test]
    fn test_children() {
        let parent = Node::element("div")
            .with_text("Hello")
            .with_child(Node::element("span"))
            .with_text("World");
        let doc = Document::from(parent);
        let div = doc.root().children().next().unwrap();

        assert_eq!(div.children().count(), 3);
        assert_eq!(div.element_children().count(), 1);
    }

    #[test]
    fn test_element_index() {
        let tr = Node::element("tr")
            .with_text(" ")
            .with_child(Node::element("td"))
            .with_text(" ")
            .with_child(Node::element("td"));
        let doc = Document::from(tr);
        let tr = doc.root().children().next().unwrap();
        let indices: Vec<usize> = tr.element_children().map(|c| c.element_index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_text_content() {
        let div = Node::element("div")
            .with_text("Hello ")
            .with_child(Node::element("span").with_text("World"));
        let doc = Document::from(div);
        assert_eq!(doc.root().text_content(), "Hello World");
    }

    #[test]
    fn test_fragment_is_flattened() {
        let frag = Node::fragment()
            .with_child(Node::element("p"))
            .with_child(Node::element("p"));
        let doc = Document::from(frag);
        assert_eq!(doc.root().children().count(), 2);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut doc = Document::new();
        let img = doc.append_element_with_attrs(doc.root_id(), "img", vec![("src", "a.png")]);
        doc.set_attr(img, "SRC", "b.png");
        doc.set_attr(img, "alt", "B");
        let img = doc.get(img);
        assert_eq!(img.attr("src"), Some("b.png"));
        assert_eq!(img.attributes().count(), 2);
    }
}
