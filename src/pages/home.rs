use leptos::prelude::*;

use crate::components::flow_editor::DiagramEditor;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let sidebar_open = RwSignal::new(true);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-editor">
				<DiagramEditor sidebar_open=sidebar_open />
				<button
					class="sidebar-toggle"
					title="open sidebar"
					style=move || if sidebar_open.get() { "display: none;" } else { "" }
					on:click=move |_| sidebar_open.set(true)
				>
					"»"
				</button>
			</div>
		</ErrorBoundary>
	}
}
