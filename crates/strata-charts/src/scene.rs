//! Retained scene graph and keyed data binding
//!
//! Drawing code never creates nodes directly. Every element is produced by
//! [`bind`], which reconciles the children of a parent against a data set the
//! way a d3 data join does: new keys enter, vanished keys exit, shared keys
//! keep their node. All changes are journalled as [`Mutation`]s so a host can
//! mirror the tree into a real DOM.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;

/// Handle to a node in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a bound datum
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindKey {
    Id(String),
    Index(usize),
}

/// Data that may carry its own identity
pub trait Keyed {
    fn bind_id(&self) -> Option<String> {
        None
    }
}

impl Keyed for () {}
impl Keyed for String {}
impl Keyed for &str {}

/// `id` when the datum has one, otherwise its position
pub fn default_key<T: Keyed>(datum: &T, index: usize) -> BindKey {
    datum
        .bind_id()
        .map(BindKey::Id)
        .unwrap_or(BindKey::Index(index))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub class: String,
    pub attrs: BTreeMap<String, String>,
    pub styles: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub key: Option<BindKey>,
    /// Duration over which attribute changes should animate
    pub transition_ms: Option<u32>,
}

impl Node {
    fn new(tag: &str, class: &str, parent: Option<NodeId>, key: Option<BindKey>) -> Self {
        Self {
            tag: tag.to_string(),
            class: class.to_string(),
            attrs: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            parent,
            key,
            transition_ms: None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class.split_whitespace().any(|c| c == class)
    }

    /// Whether every class of a space separated selector is present
    pub fn has_classes(&self, selector: &str) -> bool {
        selector.split_whitespace().all(|c| self.has_class(c))
    }
}

/// Change record consumed by DOM mirrors
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Create {
        id: NodeId,
        parent: NodeId,
        tag: String,
        class: String,
    },
    Remove {
        id: NodeId,
    },
    SetAttr {
        id: NodeId,
        name: String,
        value: Option<String>,
    },
    SetStyle {
        id: NodeId,
        name: String,
        value: Option<String>,
    },
    SetText {
        id: NodeId,
        text: String,
    },
    SetTransition {
        id: NodeId,
        duration_ms: Option<u32>,
    },
}

/// Arena of nodes rooted at a single `svg` element.
///
/// Slots freed by [`Scene::remove`] are handed out again by later appends, so
/// a `NodeId` only identifies a node while [`Scene::contains`] holds. The
/// mutation journal grows until drained; mirrors drain it after every call.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    journal: Vec<Mutation>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new("svg", "svg-container", None, None))],
            free: Vec::new(),
            journal: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.attrs.get(name)).map(String::as_str)
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).and_then(|n| n.styles.get(name)).map(String::as_str)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).and_then(|n| n.text.as_deref())
    }

    /// Children of `parent` with the given tag and class, in document order
    pub fn select_children(&self, parent: NodeId, tag: &str, class: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| {
                self.node(c)
                    .is_some_and(|n| n.tag == tag && n.has_classes(class))
            })
            .collect()
    }

    /// All descendants of the root carrying `class`, in document order
    pub fn select_all(&self, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                if node.has_classes(class) {
                    out.push(id);
                }
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// Nearest node (starting at `id`) carrying `class`
    pub fn closest(&self, id: NodeId, class: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current)?;
            if node.has_class(class) {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.attrs.get(name) == Some(&value) {
            return;
        }
        node.attrs.insert(name.to_string(), value.clone());
        self.journal.push(Mutation::SetAttr {
            id,
            name: name.to_string(),
            value: Some(value),
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.attrs.remove(name).is_some() {
            self.journal.push(Mutation::SetAttr {
                id,
                name: name.to_string(),
                value: None,
            });
        }
    }

    /// Set or clear an attribute
    pub fn set_attr_opt(&mut self, id: NodeId, name: &str, value: Option<String>) {
        match value {
            Some(v) => self.set_attr(id, name, v),
            None => self.remove_attr(id, name),
        }
    }

    pub fn set_style(&mut self, id: NodeId, name: &str, value: Option<&str>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let changed = match value {
            Some(v) => node.styles.insert(name.to_string(), v.to_string()).as_deref() != Some(v),
            None => node.styles.remove(name).is_some(),
        };
        if changed {
            self.journal.push(Mutation::SetStyle {
                id,
                name: name.to_string(),
                value: value.map(str::to_string),
            });
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        let text = text.into();
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.text.as_ref() == Some(&text) {
            return;
        }
        node.text = Some(text.clone());
        self.journal.push(Mutation::SetText { id, text });
    }

    pub fn set_transition(&mut self, id: NodeId, duration_ms: Option<u32>) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.transition_ms == duration_ms {
            return;
        }
        node.transition_ms = duration_ms;
        self.journal.push(Mutation::SetTransition { id, duration_ms });
    }

    fn append(&mut self, parent: NodeId, tag: &str, class: &str, key: BindKey) -> NodeId {
        let node = Node::new(tag, class, Some(parent), Some(key));
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.push(id);
        }
        self.journal.push(Mutation::Create {
            id,
            parent,
            tag: tag.to_string(),
            class: class.to_string(),
        });
        id
    }

    /// Detach `id` from its parent and free its whole subtree
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root() || !self.contains(id) {
            return;
        }
        if let Some(parent) = self.parent(id).and_then(|p| self.node_mut(p)) {
            parent.children.retain(|&c| c != id);
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.0).and_then(Option::take) {
                stack.extend(node.children);
                self.free.push(current);
            }
        }
        self.journal.push(Mutation::Remove { id });
    }

    /// Slots allocated so far, live or free
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    /// Pending mutations since the last drain
    pub fn mutations(&self) -> &[Mutation] {
        &self.journal
    }

    pub fn drain_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// Serialize the tree as standalone SVG markup
    pub fn to_svg(&self) -> String {
        let mut out = String::with_capacity(4096);
        self.write_node(&mut out, self.root());
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };

        let _ = write!(out, "<{}", node.tag);
        if id == self.root() {
            out.push_str(" xmlns=\"http://www.w3.org/2000/svg\"");
        }
        if !node.class.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&node.class));
        }
        for (name, value) in &node.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value));
        }
        if !node.styles.is_empty() {
            let style: Vec<String> = node.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            let _ = write!(out, " style=\"{}\"", escape(&style.join("; ")));
        }

        if node.children.is_empty() && node.text.is_none() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        if let Some(text) = &node.text {
            out.push_str(&escape(text));
        }
        for &child in &node.children {
            self.write_node(out, child);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// DATA JOIN
// ============================================================================

/// Reconcile the `tag.class` children of `parent` with `data`.
///
/// Returns one node per datum, in data order. Nodes whose key is still
/// present are reused, new keys are appended, and nodes whose key vanished
/// are removed with their subtrees. A key repeated within `data` enters a new
/// node for every repeat.
pub fn bind<T, F>(
    scene: &mut Scene,
    parent: NodeId,
    tag: &str,
    class: &str,
    data: &[T],
    key_fn: F,
) -> Vec<NodeId>
where
    F: Fn(&T, usize) -> BindKey,
{
    let existing = scene.select_children(parent, tag, class);

    let mut by_key: HashMap<BindKey, NodeId> = HashMap::with_capacity(existing.len());
    let mut duplicates = Vec::new();
    for id in existing {
        match scene.node(id).and_then(|n| n.key.clone()) {
            Some(key) if !by_key.contains_key(&key) => {
                by_key.insert(key, id);
            }
            _ => duplicates.push(id),
        }
    }

    let mut claimed = HashSet::with_capacity(data.len());
    let mut nodes = Vec::with_capacity(data.len());
    for (i, datum) in data.iter().enumerate() {
        let key = key_fn(datum, i);
        let reuse = by_key.get(&key).copied().filter(|id| claimed.insert(*id));
        let id = match reuse {
            Some(id) => id,
            None => scene.append(parent, tag, class, key),
        };
        nodes.push(id);
    }

    let mut stale: Vec<NodeId> = by_key
        .into_values()
        .filter(|id| !claimed.contains(id))
        .chain(duplicates)
        .collect();
    stale.sort();
    for id in stale {
        scene.remove(id);
    }

    nodes
}

/// [`bind`] with the default key: the datum's id, else its index
pub fn bind_keyed<T: Keyed>(
    scene: &mut Scene,
    parent: NodeId,
    tag: &str,
    class: &str,
    data: &[T],
) -> Vec<NodeId> {
    bind(scene, parent, tag, class, data, default_key)
}

/// Single `tag.class` child of `parent`, created on first use
pub fn ensure(scene: &mut Scene, parent: NodeId, tag: &str, class: &str) -> NodeId {
    let nodes = bind_keyed(scene, parent, tag, class, &[()]);
    nodes[0]
}

/// Zero or one `tag.class` child depending on `present`
pub fn ensure_if(scene: &mut Scene, parent: NodeId, tag: &str, class: &str, present: bool) -> Option<NodeId> {
    let data: &[()] = if present { &[()] } else { &[] };
    bind_keyed(scene, parent, tag, class, data).into_iter().next()
}
