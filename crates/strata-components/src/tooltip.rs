//! Floating HTML tooltip anchored to the hovered hit rectangle

use std::collections::HashMap;

use strata_charts::{NodeId, TooltipContent, TooltipDisplay};
use strata_core::TooltipConfig;
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, HtmlElement, Window};

use crate::ElementRegistry;

/// Widest a tooltip may grow before wrapping
pub const TOOLTIP_MAX_WIDTH: f64 = 180.0;
/// Gap between the tooltip and the top of the hovered rectangle
pub const TOOLTIP_OFFSET: f64 = 6.0;

pub struct DomTooltip {
    window: Window,
    popup: HtmlElement,
    content: HashMap<NodeId, String>,
    elements: ElementRegistry,
    visible: Option<NodeId>,
}

impl DomTooltip {
    /// Append the (hidden) popup to the document body
    pub fn new(window: Window, document: &Document, elements: ElementRegistry) -> Result<Self, JsValue> {
        let popup: HtmlElement = document.create_element("div")?.dyn_into()?;
        popup.set_class_name("strata-tooltip");
        let style = popup.style();
        style.set_property("position", "absolute")?;
        style.set_property("pointer-events", "none")?;
        style.set_property("max-width", &format!("{TOOLTIP_MAX_WIDTH}px"))?;
        style.set_property("transform", "translate(-50%, -100%)")?;
        style.set_property("display", "none")?;

        document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?
            .append_child(&popup)?;

        Ok(Self {
            window,
            popup,
            content: HashMap::new(),
            elements,
            visible: None,
        })
    }

    fn place(&self, node: NodeId) -> Result<(), JsValue> {
        let Some(anchor) = self.elements.borrow().get(&node).cloned() else {
            return Ok(());
        };
        let rect = anchor.get_bounding_client_rect();
        let left = rect.left() + rect.width() / 2.0 + self.window.scroll_x()?;
        let top = rect.top() - TOOLTIP_OFFSET + self.window.scroll_y()?;

        let style = self.popup.style();
        style.set_property("left", &format!("{left}px"))?;
        style.set_property("top", &format!("{top}px"))?;
        style.set_property("display", "block")
    }

    fn set_hidden(&self) {
        if let Err(err) = self.popup.style().set_property("display", "none") {
            warn!(?err, "tooltip not hidden");
        }
    }
}

impl TooltipDisplay for DomTooltip {
    fn attach(&mut self, node: NodeId, content: &TooltipContent, config: &TooltipConfig) {
        let html = content.to_html(config);
        if self.visible == Some(node) {
            self.popup.set_inner_html(&html);
        }
        self.content.insert(node, html);
    }

    fn detach(&mut self, node: NodeId) {
        self.content.remove(&node);
        if self.visible == Some(node) {
            self.visible = None;
            self.set_hidden();
        }
    }

    fn show(&mut self, node: NodeId) {
        let Some(html) = self.content.get(&node) else {
            return;
        };
        self.popup.set_inner_html(html);
        match self.place(node) {
            Ok(()) => self.visible = Some(node),
            Err(err) => warn!(?err, %node, "tooltip not placed"),
        }
    }

    fn hide(&mut self, node: NodeId) {
        if self.visible == Some(node) {
            self.visible = None;
            self.set_hidden();
        }
    }
}

impl Drop for DomTooltip {
    fn drop(&mut self) {
        self.popup.remove();
    }
}
