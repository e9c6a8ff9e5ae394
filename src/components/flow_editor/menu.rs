use leptos::prelude::*;
use log::debug;

use super::component::EditorSignals;
use super::editor::SharedEditor;

pub const MENU_WIDTH: f64 = 200.0;
pub const MENU_HEIGHT: f64 = 200.0;

/// CSS anchors for the menu box, relative to the pane. Exactly one of
/// `left`/`right` and one of `top`/`bottom` is set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MenuPlacement {
	pub top: Option<f64>,
	pub left: Option<f64>,
	pub right: Option<f64>,
	pub bottom: Option<f64>,
}

impl MenuPlacement {
	/// Chooses the anchor corner from the quadrant of the click so the menu
	/// opens towards the larger free area, then clamps it inside the pane.
	pub fn compute(x: f64, y: f64, pane_width: f64, pane_height: f64) -> Self {
		let (x, y) = (x.clamp(0.0, pane_width), y.clamp(0.0, pane_height));
		let max_x = (pane_width - MENU_WIDTH).max(0.0);
		let max_y = (pane_height - MENU_HEIGHT).max(0.0);
		let opens_right = x < pane_width - MENU_WIDTH;
		let opens_down = y < pane_height - MENU_HEIGHT;

		Self {
			left: opens_right.then(|| x.min(max_x)),
			right: (!opens_right).then(|| (pane_width - x).min(max_x)),
			top: opens_down.then(|| y.min(max_y)),
			bottom: (!opens_down).then(|| (pane_height - y).min(max_y)),
		}
	}

	pub fn css(&self) -> String {
		let mut style = format!("width: {}px; height: {}px;", MENU_WIDTH, MENU_HEIGHT);
		for (name, value) in [
			("top", self.top),
			("left", self.left),
			("right", self.right),
			("bottom", self.bottom),
		] {
			if let Some(v) = value {
				style.push_str(&format!(" {}: {}px;", name, v));
			}
		}
		style
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
	pub node_id: String,
	pub placement: MenuPlacement,
}

/// Menu overlay. Any click on it dismisses it; the buttons run their command
/// against the node the menu was opened on first.
pub fn context_menu_view(editor: SharedEditor, ui: EditorSignals) -> impl IntoView {
	let (editor_dup, editor_del, editor_dismiss) = (editor.clone(), editor.clone(), editor);

	let on_duplicate = move |_| {
		if let Some(menu) = ui.menu.get_untracked() {
			debug!("Context menu: duplicate {}", menu.node_id);
			editor_dup.borrow_mut().duplicate_node(&menu.node_id);
		}
	};
	let on_delete = move |_| {
		if let Some(menu) = ui.menu.get_untracked() {
			debug!("Context menu: delete {}", menu.node_id);
			editor_del.borrow_mut().delete_node(&menu.node_id);
		}
	};
	// Bubbles up after the button handlers.
	let on_dismiss = move |_| {
		let mut editor = editor_dismiss.borrow_mut();
		editor.close_menu();
		ui.sync(&editor);
	};

	view! {
		<div
			class="context-menu"
			style=move || match ui.menu.get() {
				Some(menu) => format!("position: absolute; {}", menu.placement.css()),
				None => "display: none;".to_string(),
			}
			on:click=on_dismiss
		>
			<p class="context-menu-title">
				"node: " {move || ui.menu.get().map(|m| m.node_id).unwrap_or_default()}
			</p>
			<button on:click=on_duplicate>"duplicate"</button>
			<button on:click=on_delete>"delete"</button>
		</div>
	}
}
