//! A chart mounted into a DOM element: controller, renderer and listeners

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use strata_charts::AreaChart;
use strata_core::{ChartConfig, ChartError, ChartResult, TimeSeriesPoint};
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventTarget, HtmlElement};

use crate::{node_of, DomEnvironment, DomRenderer, DomTooltip, ResizeCallback};

fn host_error(err: JsValue) -> ChartError {
    ChartError::Host(format!("{err:?}"))
}

/// DOM listener removed again when dropped
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(target: &EventTarget, kind: &'static str, closure: Closure<dyn FnMut(Event)>) -> Result<Self, JsValue> {
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

struct HostInner {
    chart: AreaChart<DomEnvironment>,
    renderer: DomRenderer,
}

impl HostInner {
    /// Push pending scene changes to the DOM
    fn flush(&mut self) {
        let mutations = self.chart.scene_mut().drain_mutations();
        if let Err(err) = self.renderer.apply(&mutations) {
            error!(?err, "dom patch failed");
        }
    }

    fn hover(&mut self, target: Option<EventTarget>, enter: bool) {
        let Some(node) = target
            .and_then(|t| t.dyn_into::<Element>().ok())
            .and_then(|el| node_of(&el))
        else {
            return;
        };
        if enter {
            self.chart.pointer_enter(node);
        } else {
            self.chart.pointer_leave(node);
        }
        self.flush();
    }
}

/// Owns a live chart; dropping it disposes the chart and removes its svg
pub struct ChartHost {
    inner: Rc<RefCell<HostInner>>,
    _listeners: Vec<Listener>,
}

impl ChartHost {
    /// Build the chart inside `container` and draw it
    pub fn mount(
        container: HtmlElement,
        config: ChartConfig,
        data: Option<Vec<TimeSeriesPoint>>,
    ) -> ChartResult<Self> {
        let window = web_sys::window().ok_or_else(|| ChartError::Host("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| ChartError::Host("no document".into()))?;

        let chart = AreaChart::new(DomEnvironment::new(window.clone(), container.clone()), config, data)?;
        let renderer = DomRenderer::mount(document.clone(), &container, chart.scene()).map_err(host_error)?;
        let tooltip = DomTooltip::new(window, &document, renderer.registry()).map_err(host_error)?;
        let inner = Rc::new(RefCell::new(HostInner {
            chart: chart.with_tooltip(tooltip),
            renderer,
        }));
        inner
            .borrow_mut()
            .chart
            .env_mut()
            .set_on_resize(resize_callback(Rc::downgrade(&inner)));

        let svg: EventTarget = inner.borrow().renderer.svg().clone().into();
        let listeners = vec![
            Listener::new(&svg, "mouseover", hover_closure(Rc::downgrade(&inner), true)),
            Listener::new(&svg, "mouseout", hover_closure(Rc::downgrade(&inner), false)),
        ]
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(host_error)?;

        {
            let mut host = inner.borrow_mut();
            let rendered = host.chart.render().map(|_| ());
            host.flush();
            if let Err(err) = rendered {
                host.renderer.unmount();
                return Err(err);
            }
        }

        info!("chart mounted");
        Ok(Self {
            inner,
            _listeners: listeners,
        })
    }

    pub fn update_data(&self, data: Option<Vec<TimeSeriesPoint>>, config: ChartConfig) -> ChartResult<()> {
        let mut host = self.inner.borrow_mut();
        let updated = host.chart.update_data(data, config).map(|_| ());
        host.flush();
        updated
    }

    pub fn update_config(&self, config: ChartConfig) -> ChartResult<()> {
        let mut host = self.inner.borrow_mut();
        let updated = host.chart.update_config(config).map(|_| ());
        host.flush();
        updated
    }

    pub fn config(&self) -> ChartConfig {
        self.inner.borrow().chart.config().clone()
    }
}

impl Drop for ChartHost {
    fn drop(&mut self) {
        let Ok(mut host) = self.inner.try_borrow_mut() else {
            warn!("chart busy while unmounting");
            return;
        };
        host.chart.dispose();
        host.renderer.unmount();
        debug!("chart unmounted");
    }
}

fn resize_callback(weak: Weak<RefCell<HostInner>>) -> ResizeCallback {
    Rc::new(move || {
        let Some(inner) = weak.upgrade() else { return };
        let Ok(mut host) = inner.try_borrow_mut() else {
            warn!("chart busy, resize skipped");
            return;
        };
        if let Err(err) = host.chart.handle_resize() {
            error!(%err, "resize redraw failed");
        }
        host.flush();
    })
}

fn hover_closure(weak: Weak<RefCell<HostInner>>, enter: bool) -> Closure<dyn FnMut(Event)> {
    Closure::new(move |event: Event| {
        let Some(inner) = weak.upgrade() else { return };
        if let Ok(mut host) = inner.try_borrow_mut() {
            host.hover(event.target(), enter);
        }
    })
}
