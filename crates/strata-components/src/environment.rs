//! Browser implementation of the chart environment
//!
//! Window resizes are fanned out through one `resize` listener per thread to
//! handlers registered under unique names, so every chart instance can come
//! and go without disturbing the others.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use strata_charts::ChartEnvironment;
use strata_core::{DeviceClass, Viewport};
use tracing::{debug, trace, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlElement, Window};

pub type ResizeCallback = Rc<dyn Fn()>;

#[derive(Default)]
struct ResizeHub {
    handlers: BTreeMap<String, ResizeCallback>,
    listener: Option<Closure<dyn FnMut()>>,
}

thread_local! {
    static RESIZE_HUB: RefCell<ResizeHub> = RefCell::new(ResizeHub::default());
}

fn dispatch_resize() {
    let handlers: Vec<ResizeCallback> =
        RESIZE_HUB.with(|hub| hub.borrow().handlers.values().cloned().collect());
    trace!(handlers = handlers.len(), "window resized");
    for handler in handlers {
        handler();
    }
}

/// Register `callback` under `name`, replacing any previous handler
pub fn subscribe_resize(name: &str, callback: ResizeCallback) {
    RESIZE_HUB.with(|hub| {
        let mut hub = hub.borrow_mut();
        if hub.listener.is_none() {
            let Some(window) = web_sys::window() else {
                warn!("no window, resize events unavailable");
                return;
            };
            let listener = Closure::<dyn FnMut()>::new(dispatch_resize);
            if let Err(err) =
                window.add_event_listener_with_callback("resize", listener.as_ref().unchecked_ref())
            {
                warn!(?err, "resize listener not installed");
                return;
            }
            hub.listener = Some(listener);
        }
        hub.handlers.insert(name.to_string(), callback);
        debug!(name, handlers = hub.handlers.len(), "resize handler added");
    });
}

/// Drop the handler under `name`; the window listener goes with the last one
pub fn unsubscribe_resize(name: &str) {
    RESIZE_HUB.with(|hub| {
        let mut hub = hub.borrow_mut();
        hub.handlers.remove(name);
        if hub.handlers.is_empty() {
            if let (Some(listener), Some(window)) = (hub.listener.take(), web_sys::window()) {
                let _ = window.remove_event_listener_with_callback(
                    "resize",
                    listener.as_ref().unchecked_ref(),
                );
            }
        }
        debug!(name, handlers = hub.handlers.len(), "resize handler removed");
    });
}

/// Measures the mount element and the window on every layout pass
pub struct DomEnvironment {
    window: Window,
    container: HtmlElement,
    on_resize: Option<ResizeCallback>,
}

impl DomEnvironment {
    pub fn new(window: Window, container: HtmlElement) -> Self {
        Self {
            window,
            container,
            on_resize: None,
        }
    }

    /// What runs when a subscribed window resize fires
    pub fn set_on_resize(&mut self, callback: ResizeCallback) {
        self.on_resize = Some(callback);
    }

    fn window_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|w| w.as_f64())
            .unwrap_or_default()
    }

    fn user_agent(&self) -> String {
        self.window.navigator().user_agent().unwrap_or_default()
    }
}

impl ChartEnvironment for DomEnvironment {
    fn viewport(&self) -> Viewport {
        let container_width = self.container.get_bounding_client_rect().width();
        let viewport_width = self.window_width();
        let device = DeviceClass::detect(&self.user_agent(), viewport_width);

        Viewport::new(container_width, viewport_width).with_device(device)
    }

    fn subscribe_resize(&mut self, name: &str) {
        match &self.on_resize {
            Some(callback) => subscribe_resize(name, Rc::clone(callback)),
            None => warn!(name, "no resize callback set, subscription skipped"),
        }
    }

    fn unsubscribe_resize(&mut self, name: &str) {
        unsubscribe_resize(name);
    }

    fn consumes_mutations(&self) -> bool {
        true
    }
}
