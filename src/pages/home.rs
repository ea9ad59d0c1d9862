use leptos::prelude::*;

use crate::components::sandbox::SandboxPanel;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<div class="sandbox-page">
			<div class="sandbox-overlay">
				<h1>"Inference Sandbox"</h1>
				<p class="subtitle">
					"Initialize a run, press Start to step it, then request the estimate."
				</p>
			</div>
			<SandboxPanel />
		</div>
	}
}
