//! Demo page: one week of traffic, switchable curve and stack order

use leptos::prelude::*;
use strata_components::StackedAreaChart;
use strata_core::{points_from_json, ChartConfig, CurveKind, StackOrder, TimePeriod};
use tracing::{error, info};

const WEEK: &str = include_str!("../../../fixtures/week.json");

fn base_config() -> ChartConfig {
    let mut config = ChartConfig::default()
        .with_keys(["visits", "signups"])
        .with_time_period(TimePeriod::Week);
    config.y_axis.title = Some("Sessions".into());
    config.area.labels.insert("visits".into(), "Visits".into());
    config.area.labels.insert("signups".into(), "Sign-ups".into());
    config
}

#[component]
fn App() -> impl IntoView {
    let data = match points_from_json(WEEK) {
        Ok(points) => Some(points),
        Err(err) => {
            error!(%err, "fixture rejected");
            None
        }
    };
    let (data, _) = signal(data);
    let (curve, set_curve) = signal(CurveKind::MonotoneX);
    let (order, set_order) = signal(StackOrder::None);

    let config = Signal::derive(move || {
        base_config()
            .with_curve(curve.get())
            .with_stack_order(order.get())
    });

    view! {
        <div class="strata-demo">
            <header class="demo-header">
                <span class="demo-title">"Weekly traffic"</span>
                <div class="demo-controls">
                    <button on:click=move |_| set_curve.set(CurveKind::Linear)>"Linear"</button>
                    <button on:click=move |_| set_curve.set(CurveKind::MonotoneX)>"Monotone"</button>
                    <button on:click=move |_| set_curve.set(CurveKind::Step)>"Step"</button>
                    <button on:click=move |_| {
                        set_order.update(|o| {
                            *o = match o {
                                StackOrder::None => StackOrder::Reverse,
                                _ => StackOrder::None,
                            }
                        })
                    }>"Flip stack"</button>
                </div>
            </header>
            <StackedAreaChart data=data config=config />
        </div>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    info!("strata demo starting");

    leptos::mount::mount_to_body(App);
}
