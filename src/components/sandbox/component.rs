use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::controls::{AlgoSelect, DiscreteSlider, IterationProgress, StatusBadge};
use super::driver::BrowserDriver;
use super::render;
use crate::control::{ControlConfig, Controller, ITERATION_RANGE, Intent, PARTICLE_RANGE};

/// Defaults, overridden by the page's query string when it parses.
fn load_config() -> ControlConfig {
	let query = web_sys::window()
		.and_then(|w| w.location().search().ok())
		.unwrap_or_default();
	let mut config = ControlConfig::default();
	if let Err(err) = config.apply_query(&query) {
		warn!("{err}, falling back to defaults");
		config = ControlConfig::default();
	}
	config
}

/// Control panel and live drawing for one inference session.
#[component]
pub fn SandboxPanel(
	#[prop(default = 640.0)] width: f64,
	#[prop(default = 480.0)] height: f64,
	#[prop(default = "media/obs.png")] observation: &'static str,
) -> impl IntoView {
	let config = load_config();
	let defaults = config.defaults;
	let controller = Controller::new(config);
	let status = RwSignal::new(controller.view());
	let driver = BrowserDriver::new(controller, move |v| status.set(v));
	let stored = StoredValue::new_local(driver.clone());
	let send = move |intent: Intent| stored.with_value(|d| d.intent(intent));

	driver.intent(Intent::Connect);
	on_cleanup(move || {
		let _ = stored.try_with_value(|d| d.intent(Intent::Shutdown));
	});

	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		canvas.set_width(width as u32);
		canvas.set_height(height as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let (driver_anim, animate_inner) = (driver.clone(), animate.clone());
		*animate.borrow_mut() = Some(Closure::new(move || {
			if !driver_anim.is_active() {
				// drop the loop's own closure so the driver can be freed
				animate_inner.borrow_mut().take();
				return;
			}
			driver_anim.with_snapshot(|s| render::render(s, &ctx, width, height));
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate.borrow() {
			let _ = web_sys::window()
				.unwrap()
				.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	view! {
		<div class="sandbox">
			<div class="status-wrapper">
				<AlgoSelect
					value=Signal::derive(move || status.get().staged.algorithm)
					on_change=Callback::new(move |algo| send(Intent::SetAlgorithm(algo)))
				/>
				<StatusBadge status=status />
			</div>
			<div
				class="canvas"
				style:width=format!("{width}px")
				style:height=format!("{height}px")
			>
				<img class="obs" src=observation alt="" />
				<canvas node_ref=canvas_ref class="drawcanvas" />
			</div>
			<div class="controls">
				<div class="button-wrapper">
					<button class="button" on:click=move |_| send(Intent::Initialize)>
						"Initialize"
					</button>
					<button class="button" on:click=move |_| send(Intent::Start)>
						"Start"
					</button>
					<button class="button" on:click=move |_| send(Intent::Estimate)>
						"Estimate"
					</button>
				</div>
				<IterationProgress status=status />
				<DiscreteSlider
					label="particles"
					range=PARTICLE_RANGE
					initial=defaults.particle_count
					on_commit=Callback::new(move |n| send(Intent::SetParticleCount(n)))
				/>
				<DiscreteSlider
					label="iterations"
					range=ITERATION_RANGE
					initial=defaults.iteration_budget
					on_commit=Callback::new(move |n| send(Intent::SetIterationBudget(n)))
				/>
			</div>
		</div>
	}
}
