use leptos::prelude::*;

use crate::control::{Algorithm, ConnectionState, ControlView, SliderRange};

#[component]
pub fn StatusBadge(#[prop(into)] status: Signal<ControlView>) -> impl IntoView {
	let look = move || match status.get().connection {
		ConnectionState::Open => ("Connected", "#00ff00"),
		ConnectionState::Closed => ("Disconnected", "#ff0000"),
		ConnectionState::Connecting => ("Wait", "#ffff00"),
	};

	view! {
		<div class="status" style:background-color=move || look().1>
			{move || look().0}
		</div>
	}
}

#[component]
pub fn AlgoSelect(
	#[prop(into)] value: Signal<Algorithm>,
	on_change: Callback<Algorithm>,
) -> impl IntoView {
	view! {
		<label class="algo-form">
			"Algorithm"
			<select on:change=move |ev| {
				if let Some(algo) = Algorithm::from_label(&event_target_value(&ev)) {
					on_change.run(algo);
				}
			}>
				{Algorithm::ALL
					.into_iter()
					.map(|algo| {
						view! {
							<option value=algo.label() selected=move || value.get() == algo>
								{algo.name()}
							</option>
						}
					})
					.collect_view()}
			</select>
		</label>
	}
}

#[component]
pub fn IterationProgress(#[prop(into)] status: Signal<ControlView>) -> impl IntoView {
	view! {
		<div class="progress">
			<div class="progress-bar-text">
				{move || {
					let v = status.get();
					format!("Iteration: {} / {}", v.iterations_completed, v.iteration_budget)
				}}
			</div>
			<div class="progress-bar">
				<div
					class="progress-bar-fill"
					style:width=move || format!("{}%", status.get().progress_percent())
				></div>
			</div>
		</div>
	}
}

/// Range input that only reports a value once the user lets go.
#[component]
pub fn DiscreteSlider(
	label: &'static str,
	range: SliderRange,
	initial: u32,
	on_commit: Callback<u32>,
) -> impl IntoView {
	let (value, set_value) = signal(range.clamp(initial));
	let read = move |ev: web_sys::Event| event_target_value(&ev).parse::<u32>().ok().map(|v| range.clamp(v));

	view! {
		<div class="slider">
			<div class="slider-label">{label} ": " {move || value.get()}</div>
			<input
				type="range"
				min=range.min.to_string()
				max=range.max.to_string()
				step=range.step.to_string()
				value=range.clamp(initial).to_string()
				on:input=move |ev| {
					if let Some(v) = read(ev) {
						set_value.set(v);
					}
				}
				on:change=move |ev| {
					if let Some(v) = read(ev) {
						set_value.set(v);
						on_commit.run(v);
					}
				}
			/>
		</div>
	}
}
