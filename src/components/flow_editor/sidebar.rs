use leptos::prelude::*;
use log::{error, info};
use web_sys::{DragEvent, Event, MouseEvent};

use super::component::EditorSignals;
use super::editor::SharedEditor;
use super::error::Result;
use super::export::export_png;
use super::persistence::{BrowserStorage, restore_flow, save_flow};
use super::types::NodeKind;

/// MIME type of the palette drag payload; the value is the node kind tag.
pub const DRAG_MIME: &str = "application/reactflow";

fn start_drag(ev: &DragEvent, kind: NodeKind) {
	if let Some(transfer) = ev.data_transfer() {
		let _ = transfer.set_data(DRAG_MIME, kind.as_str());
		transfer.set_effect_allowed("move");
	}
}

/// Shows the outcome of a sidebar command in the status line.
fn report(ui: EditorSignals, action: &str, result: Result<String>) {
	match result {
		Ok(message) => {
			info!("{}: {}", action, message);
			ui.status.set(Some(message));
		}
		Err(err) => {
			error!("{} failed: {}", action, err);
			ui.status.set(Some(format!("{} failed: {}", action, err)));
		}
	}
}

pub fn sidebar_view(
	editor: SharedEditor,
	ui: EditorSignals,
	sidebar_open: RwSignal<bool>,
	storage_key: String,
) -> impl IntoView {
	let editor_id = editor.clone();
	let on_new_id = move |ev: Event| {
		let mut editor = editor_id.borrow_mut();
		editor.new_node.id = event_target_value(&ev);
		ui.sync(&editor);
	};
	let editor_new_name = editor.clone();
	let on_new_name = move |ev: Event| {
		let mut editor = editor_new_name.borrow_mut();
		editor.new_node.name = event_target_value(&ev);
		ui.sync(&editor);
	};
	let editor_new_color = editor.clone();
	let on_new_color = move |ev: Event| {
		let mut editor = editor_new_color.borrow_mut();
		editor.new_node.color = event_target_value(&ev);
		ui.sync(&editor);
	};
	let editor_create = editor.clone();
	let on_create = move |_: MouseEvent| {
		let mut editor = editor_create.borrow_mut();
		editor.create_node();
		ui.sync(&editor);
	};

	let editor_name = editor.clone();
	let on_name = move |ev: Event| {
		let mut editor = editor_name.borrow_mut();
		editor.set_node_name(event_target_value(&ev));
		ui.sync(&editor);
	};
	let editor_color = editor.clone();
	let on_color = move |ev: Event| {
		let mut editor = editor_color.borrow_mut();
		editor.set_node_color(event_target_value(&ev));
		ui.sync(&editor);
	};

	let (editor_save, save_key) = (editor.clone(), storage_key.clone());
	let on_save = move |_: MouseEvent| {
		let result = BrowserStorage::local()
			.and_then(|mut store| save_flow(&editor_save.borrow(), &mut store, &save_key))
			.map(|()| "saved".to_string());
		report(ui, "Save", result);
	};
	let (editor_restore, restore_key) = (editor.clone(), storage_key);
	let on_restore = move |_: MouseEvent| {
		let mut editor = editor_restore.borrow_mut();
		let result = BrowserStorage::local()
			.and_then(|store| restore_flow(&mut editor, &store, &restore_key))
			.map(|found| {
				if found {
					"restored".to_string()
				} else {
					"nothing saved yet".to_string()
				}
			});
		ui.sync(&editor);
		report(ui, "Restore", result);
	};
	let editor_export = editor;
	let on_download = move |_: MouseEvent| {
		let editor = editor_export.borrow();
		let result = export_png(&editor.nodes, &editor.edges).map(|()| "downloaded".to_string());
		report(ui, "Download", result);
	};

	let palette = NodeKind::ALL
		.into_iter()
		.map(|kind| {
			view! {
				<div
					class="palette-item"
					draggable="true"
					on:dragstart=move |ev: DragEvent| start_drag(&ev, kind)
				>
					{kind.palette_label()}
				</div>
			}
		})
		.collect_view();

	view! {
		<aside class=move || if sidebar_open.get() { "sidebar open" } else { "sidebar" }>
			<button
				class="sidebar-close"
				title="close sidebar"
				on:click=move |_: MouseEvent| sidebar_open.set(false)
			>
				"«"
			</button>
			<h2 class="sidebar-title">"Flow " <span class="accent">"Chart"</span></h2>
			<hr />

			<section class="sidebar-section">
				<h3>"Create Node"</h3>
				<input
					type="text"
					placeholder="Id (optional)"
					prop:value=move || ui.new_id.get()
					on:input=on_new_id
				/>
				<input
					type="text"
					placeholder="Name"
					prop:value=move || ui.new_name.get()
					on:input=on_new_name
				/>
				<label>
					"Color: "
					<input
						type="color"
						prop:value=move || ui.new_color.get()
						on:input=on_new_color
					/>
				</label>
				<button on:click=on_create>"Create"</button>
			</section>
			<hr />

			<section class="sidebar-section">
				<h3>"Update Node"</h3>
				<input
					type="text"
					name="name"
					placeholder="Name"
					prop:value=move || ui.node_name.get()
					on:input=on_name
				/>
				<label>
					"Color: "
					<input
						type="color"
						name="background"
						prop:value=move || ui.node_color.get()
						on:input=on_color
					/>
				</label>
			</section>
			<hr />

			<section class="sidebar-section">
				<h3>"Drag and Drop"</h3>
				<div class="palette">{palette}</div>
			</section>
			<hr />

			<section class="sidebar-section">
				<h3>"Controls"</h3>
				<div class="sidebar-buttons">
					<button on:click=on_save>"Save"</button>
					<button on:click=on_restore>"Restore"</button>
					<button on:click=on_download>"Download"</button>
				</div>
				<p class="status">{move || ui.status.get().unwrap_or_default()}</p>
			</section>
		</aside>
	}
}
