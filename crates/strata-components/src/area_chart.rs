//! Leptos wrapper around a mounted chart

use leptos::html::Div;
use leptos::prelude::*;
use strata_core::{ChartConfig, TimeSeriesPoint};
use tracing::error;
use web_sys::HtmlElement;

use crate::ChartHost;

/// Stacked area chart bound to reactive data and config.
///
/// The first run mounts and renders the chart; later changes to either
/// signal go through an animated data update.
#[component]
pub fn StackedAreaChart(
    #[prop(into)] data: Signal<Option<Vec<TimeSeriesPoint>>>,
    #[prop(into)] config: Signal<ChartConfig>,
) -> impl IntoView {
    let container = NodeRef::<Div>::new();
    let host = StoredValue::new_local(None::<ChartHost>);
    let (failure, set_failure) = signal(None::<String>);

    Effect::new(move |_| {
        let data = data.get();
        let config = config.get();
        let Some(el) = container.get() else {
            return;
        };

        host.update_value(|slot| {
            let result = if let Some(mounted) = slot.as_ref() {
                mounted.update_data(data, config)
            } else {
                ChartHost::mount(HtmlElement::from(el), config, data).map(|mounted| {
                    *slot = Some(mounted);
                })
            };
            match result {
                Ok(()) => set_failure.set(None),
                Err(err) => {
                    error!(%err, "chart update failed");
                    set_failure.set(Some(err.to_string()));
                }
            }
        });
    });

    on_cleanup(move || {
        host.try_update_value(|slot| drop(slot.take()));
    });

    view! {
        <div class="strata-chart">
            <div class="strata-chart__canvas" node_ref=container></div>
            {move || {
                failure.get().map(|msg| {
                    view! {
                        <div class="strata-chart__error">
                            <span class="error-icon">"⚠"</span>
                            <span class="error-msg">{msg}</span>
                        </div>
                    }
                })
            }}
        </div>
    }
}
