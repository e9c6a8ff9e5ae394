use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, DragEvent, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use super::editor::{FlowEditor, SharedEditor};
use super::menu::{ContextMenu, context_menu_view};
use super::persistence::FLOW_KEY;
use super::render;
use super::sidebar::{DRAG_MIME, sidebar_view};

const FALLBACK_WIDTH: f64 = 800.0;
const FALLBACK_HEIGHT: f64 = 600.0;

/// Display copies of the editor's form state. The editor stays the source of
/// truth; call [`EditorSignals::sync`] after mutating it.
#[derive(Clone, Copy)]
pub struct EditorSignals {
	pub node_name: RwSignal<String>,
	pub node_color: RwSignal<String>,
	pub new_id: RwSignal<String>,
	pub new_name: RwSignal<String>,
	pub new_color: RwSignal<String>,
	pub menu: RwSignal<Option<ContextMenu>>,
	pub status: RwSignal<Option<String>>,
}

impl EditorSignals {
	fn new(editor: &FlowEditor) -> Self {
		Self {
			node_name: RwSignal::new(editor.node_name.clone()),
			node_color: RwSignal::new(editor.node_color.clone()),
			new_id: RwSignal::new(editor.new_node.id.clone()),
			new_name: RwSignal::new(editor.new_node.name.clone()),
			new_color: RwSignal::new(editor.new_node.color.clone()),
			menu: RwSignal::new(editor.menu.clone()),
			status: RwSignal::new(None),
		}
	}

	pub fn sync(&self, editor: &FlowEditor) {
		self.node_name.set(editor.node_name.clone());
		self.node_color.set(editor.node_color.clone());
		self.new_id.set(editor.new_node.id.clone());
		self.new_name.set(editor.new_node.name.clone());
		self.new_color.set(editor.new_node.color.clone());
		self.menu.set(editor.menu.clone());
	}
}

/// Canvas size: explicit props win, otherwise the parent element's box.
fn canvas_size(canvas: &HtmlCanvasElement, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(FALLBACK_WIDTH)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(FALLBACK_HEIGHT)
		}),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
}

/// Pointer position relative to the canvas' top-left corner.
fn local_point(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas = canvas_ref.get()?;
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

#[component]
pub fn DiagramEditor(
	sidebar_open: RwSignal<bool>,
	#[prop(into, default = FLOW_KEY.to_string())] storage_key: String,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let editor: SharedEditor = Rc::new(RefCell::new(FlowEditor::with_initial_flow(
		FALLBACK_WIDTH,
		FALLBACK_HEIGHT,
	)));
	let ui = EditorSignals::new(&editor.borrow());
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let frame: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));
	let (editor_init, animate_init, frame_init) = (editor.clone(), animate.clone(), frame.clone());

	let frame_loop = StoredValue::new_local((animate, frame));
	on_cleanup(move || {
		frame_loop.try_with_value(|(animate, frame)| {
			if let (Some(id), Some(window)) = (frame.take(), web_sys::window()) {
				let _ = window.cancel_animation_frame(id);
			}
			animate.borrow_mut().take();
			debug!("Animation loop stopped");
		});
	});

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			error!("Canvas 2d context unavailable");
			return;
		};

		let (editor_anim, animate_inner, frame_inner) =
			(editor_init.clone(), animate_init.clone(), frame_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			// Follows the parent box, which changes with the window and the sidebar.
			let (w, h) = canvas_size(&canvas, width, height);
			if canvas.width() != w as u32 || canvas.height() != h as u32 {
				debug!("Canvas resized to {}x{}", w, h);
				canvas.set_width(w as u32);
				canvas.set_height(h as u32);
				editor_anim.borrow_mut().canvas.resize(w, h);
			}
			render::render(&editor_anim.borrow(), &ctx);
			if let (Some(win), Some(cb)) = (web_sys::window(), animate_inner.borrow().as_ref()) {
				frame_inner.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			frame_init.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	});

	let editor_md = editor.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(canvas) = canvas_ref.get() {
			let _ = canvas.focus();
		}
		editor_md.borrow_mut().pointer_down(x, y);
	};

	let editor_mm = editor.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			editor_mm.borrow_mut().pointer_move(x, y);
		}
	};

	let editor_mu = editor.clone();
	let on_mouseup = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut editor = editor_mu.borrow_mut();
		editor.pointer_up(x, y);
		ui.sync(&editor);
	};

	let editor_ml = editor.clone();
	let on_mouseleave = move |_: MouseEvent| {
		editor_ml.borrow_mut().pointer_leave();
	};

	let editor_wh = editor.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
		editor_wh.borrow_mut().canvas.zoom_at(x, y, factor);
	};

	let editor_cm = editor.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let mut editor = editor_cm.borrow_mut();
		if editor.node_context_menu(x, y) {
			ui.sync(&editor);
		}
	};

	let on_dragover = move |ev: DragEvent| {
		ev.prevent_default();
		if let Some(transfer) = ev.data_transfer() {
			transfer.set_drop_effect("move");
		}
	};

	let editor_dr = editor.clone();
	let on_drop = move |ev: DragEvent| {
		ev.prevent_default();
		let tag = ev
			.data_transfer()
			.and_then(|transfer| transfer.get_data(DRAG_MIME).ok())
			.unwrap_or_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		editor_dr.borrow_mut().drop_node(&tag, x, y);
	};

	let editor_kd = editor.clone();
	let on_keydown = move |ev: KeyboardEvent| {
		if matches!(ev.key().as_str(), "Delete" | "Backspace") {
			let mut editor = editor_kd.borrow_mut();
			editor.delete_selected();
			ui.sync(&editor);
		}
	};

	let editor_zi = editor.clone();
	let editor_zo = editor.clone();
	let editor_fit = editor.clone();

	view! {
		<div class=move || {
			if sidebar_open.get() { "flow-editor sidebar-open" } else { "flow-editor" }
		}>
			{sidebar_view(editor.clone(), ui, sidebar_open, storage_key)}
			<div class="flow-pane">
				<canvas
					node_ref=canvas_ref
					class="flow-canvas"
					tabindex="0"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:wheel=on_wheel
					on:contextmenu=on_contextmenu
					on:dragover=on_dragover
					on:drop=on_drop
					on:keydown=on_keydown
					style="display: block; outline: none;"
				/>
				{context_menu_view(editor, ui)}
				<div class="flow-controls">
					<button
						title="zoom in"
						on:click=move |_: MouseEvent| editor_zi.borrow_mut().canvas.zoom_by(1.2)
					>
						"+"
					</button>
					<button
						title="zoom out"
						on:click=move |_: MouseEvent| {
							editor_zo.borrow_mut().canvas.zoom_by(1.0 / 1.2)
						}
					>
						"-"
					</button>
					<button
						title="fit view"
						on:click=move |_: MouseEvent| {
							let mut editor = editor_fit.borrow_mut();
							let FlowEditor { nodes, canvas, .. } = &mut *editor;
							canvas.fit_view(nodes);
						}
					>
						"fit"
					</button>
				</div>
			</div>
		</div>
	}
}
