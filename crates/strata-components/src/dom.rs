//! Replays scene mutations onto live SVG elements

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use strata_charts::{Mutation, NodeId, Scene};
use tracing::{debug, warn};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, SvgElement};

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Attribute carrying the scene node id on every rendered element
pub const NODE_ATTR: &str = "data-node";

/// Scene node id to element, shared with the tooltip for positioning
pub type ElementRegistry = Rc<RefCell<HashMap<NodeId, Element>>>;

/// Scene node id stored on a rendered element
pub fn node_of(element: &Element) -> Option<NodeId> {
    element
        .get_attribute(NODE_ATTR)?
        .parse()
        .ok()
        .map(NodeId::from_index)
}

pub struct DomRenderer {
    document: Document,
    svg: Element,
    elements: ElementRegistry,
}

impl DomRenderer {
    /// Create the root `<svg>` inside `container`
    pub fn mount(document: Document, container: &HtmlElement, scene: &Scene) -> Result<Self, JsValue> {
        let svg = document.create_element_ns(Some(SVG_NS), "svg")?;
        let root = scene.root();
        if let Some(node) = scene.node(root) {
            svg.set_attribute("class", &node.class)?;
        }
        svg.set_attribute(NODE_ATTR, &root.index().to_string())?;
        container.append_child(&svg)?;

        let elements: ElementRegistry = Rc::default();
        elements.borrow_mut().insert(root, svg.clone());

        Ok(Self {
            document,
            svg,
            elements,
        })
    }

    pub fn svg(&self) -> &Element {
        &self.svg
    }

    pub fn registry(&self) -> ElementRegistry {
        Rc::clone(&self.elements)
    }

    /// Apply a batch drained from the scene journal, in order
    pub fn apply(&self, mutations: &[Mutation]) -> Result<(), JsValue> {
        let mut removed = false;

        for mutation in mutations {
            match mutation {
                Mutation::Create {
                    id,
                    parent,
                    tag,
                    class,
                } => {
                    let Some(parent_el) = self.element(*parent) else {
                        warn!(%id, %parent, "parent element missing, node skipped");
                        continue;
                    };
                    let el = self.document.create_element_ns(Some(SVG_NS), tag)?;
                    if !class.is_empty() {
                        el.set_attribute("class", class)?;
                    }
                    el.set_attribute(NODE_ATTR, &id.index().to_string())?;
                    parent_el.append_child(&el)?;
                    self.elements.borrow_mut().insert(*id, el);
                }
                Mutation::Remove { id } => {
                    if let Some(el) = self.elements.borrow_mut().remove(id) {
                        el.remove();
                        removed = true;
                    }
                }
                Mutation::SetAttr { id, name, value } => {
                    let Some(el) = self.element(*id) else { continue };
                    match value {
                        Some(value) => el.set_attribute(name, value)?,
                        None => el.remove_attribute(name)?,
                    }
                }
                Mutation::SetStyle { id, name, value } => {
                    let Some(el) = self.element(*id) else { continue };
                    set_style(&el, name, value.as_deref())?;
                }
                Mutation::SetText { id, text } => {
                    if let Some(el) = self.element(*id) {
                        el.set_text_content(Some(text));
                    }
                }
                Mutation::SetTransition { id, duration_ms } => {
                    let Some(el) = self.element(*id) else { continue };
                    let transition = duration_ms.map(|ms| format!("all {ms}ms ease-in-out"));
                    set_style(&el, "transition", transition.as_deref())?;
                }
            }
        }

        if removed {
            // descendants of removed subtrees are detached along with them
            self.elements.borrow_mut().retain(|_, el| el.is_connected());
        }

        debug!(mutations = mutations.len(), elements = self.elements.borrow().len(), "dom patched");
        Ok(())
    }

    fn element(&self, id: NodeId) -> Option<Element> {
        self.elements.borrow().get(&id).cloned()
    }

    pub fn unmount(&self) {
        self.svg.remove();
        self.elements.borrow_mut().clear();
    }
}

fn set_style(el: &Element, name: &str, value: Option<&str>) -> Result<(), JsValue> {
    let Some(svg) = el.dyn_ref::<SvgElement>() else {
        return Ok(());
    };
    let style = svg.style();
    match value {
        Some(value) => style.set_property(name, value),
        None => style.remove_property(name).map(|_| ()),
    }
}
