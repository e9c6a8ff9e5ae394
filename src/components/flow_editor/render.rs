use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::editor::FlowEditor;
use super::state::{EdgeEnd, Gesture, HANDLE_RADIUS};
use super::types::{FlowEdge, FlowNode, NodeKind, Position, Rect, Viewport};

const PANE_COLOR: &str = "#fafafa";
const DOT_COLOR: &str = "#91919a";
const DOT_GAP: f64 = 12.0;
const EDGE_COLOR: &str = "#b1b1b7";
const NODE_BORDER: &str = "#1a192b";
const LABEL_COLOR: &str = "#222222";
const NODE_CORNER_RADIUS: f64 = 3.0;
const ARROW_SIZE: f64 = 8.0;

/// Full editor frame: pane, dotted background, edges, gesture preview, nodes.
pub fn render(editor: &FlowEditor, ctx: &CanvasRenderingContext2d) {
	let canvas = &editor.canvas;
	ctx.set_fill_style_str(PANE_COLOR);
	ctx.fill_rect(0.0, 0.0, canvas.width, canvas.height);
	draw_dots(ctx, &canvas.viewport, canvas.width, canvas.height);

	let updating = match &canvas.gesture {
		Gesture::UpdateEdge { edge_id, .. } => Some(edge_id.as_str()),
		_ => None,
	};

	ctx.save();
	apply_viewport(ctx, &canvas.viewport);
	draw_edges(ctx, &editor.nodes, &editor.edges, updating);
	draw_preview(editor, ctx);
	draw_nodes(
		ctx,
		&editor.nodes,
		editor.selected_id(),
		canvas.hovered.as_deref(),
	);
	ctx.restore();
}

/// Diagram only, as seen through `viewport`. Used for image export.
pub fn render_diagram(
	ctx: &CanvasRenderingContext2d,
	nodes: &[FlowNode],
	edges: &[FlowEdge],
	viewport: &Viewport,
) {
	ctx.save();
	apply_viewport(ctx, viewport);
	draw_edges(ctx, nodes, edges, None);
	draw_nodes(ctx, nodes, None, None);
	ctx.restore();
}

fn apply_viewport(ctx: &CanvasRenderingContext2d, viewport: &Viewport) {
	let _ = ctx.translate(viewport.x, viewport.y);
	let _ = ctx.scale(viewport.zoom, viewport.zoom);
}

fn draw_dots(ctx: &CanvasRenderingContext2d, viewport: &Viewport, width: f64, height: f64) {
	let gap = DOT_GAP * viewport.zoom;
	let size = viewport.zoom.max(1.0);
	let (offset_x, offset_y) = (viewport.x.rem_euclid(gap), viewport.y.rem_euclid(gap));

	ctx.set_fill_style_str(DOT_COLOR);
	ctx.begin_path();
	let mut x = offset_x;
	while x < width {
		let mut y = offset_y;
		while y < height {
			ctx.rect(x - size / 2.0, y - size / 2.0, size, size);
			y += gap;
		}
		x += gap;
	}
	ctx.fill();
}

fn draw_edges(
	ctx: &CanvasRenderingContext2d,
	nodes: &[FlowNode],
	edges: &[FlowEdge],
	skip: Option<&str>,
) {
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_fill_style_str(EDGE_COLOR);
	ctx.set_line_width(1.0);

	for edge in edges {
		if skip == Some(edge.id.as_str()) {
			continue;
		}
		let source = nodes.iter().find(|n| n.id == edge.source);
		let target = nodes.iter().find(|n| n.id == edge.target);
		// Skip edges whose endpoint nodes are missing.
		let (Some(source), Some(target)) = (source, target) else {
			continue;
		};
		draw_bezier(ctx, &source.source_handle(), &target.target_handle());
	}
}

fn draw_bezier(ctx: &CanvasRenderingContext2d, from: &Position, to: &Position) {
	let offset = ((to.y - from.y).abs() / 2.0).max(25.0);
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.bezier_curve_to(
		from.x,
		from.y + offset,
		to.x,
		to.y - offset - ARROW_SIZE,
		to.x,
		to.y - ARROW_SIZE,
	);
	ctx.stroke();

	ctx.begin_path();
	ctx.move_to(to.x, to.y);
	ctx.line_to(to.x - ARROW_SIZE / 2.0, to.y - ARROW_SIZE);
	ctx.line_to(to.x + ARROW_SIZE / 2.0, to.y - ARROW_SIZE);
	ctx.close_path();
	ctx.fill();
}

fn draw_preview(editor: &FlowEditor, ctx: &CanvasRenderingContext2d) {
	let node = |id: &str| editor.nodes.iter().find(|n| n.id == id);
	let pointer = editor.canvas.pointer;
	let line = match &editor.canvas.gesture {
		Gesture::Connect { source } => node(source).map(|n| (n.source_handle(), pointer)),
		Gesture::UpdateEdge { edge_id, end } => editor
			.edges
			.iter()
			.find(|e| &e.id == edge_id)
			.and_then(|e| match end {
				EdgeEnd::Target => node(&e.source).map(|n| (n.source_handle(), pointer)),
				EdgeEnd::Source => node(&e.target).map(|n| (pointer, n.target_handle())),
			}),
		_ => None,
	};
	let Some((from, to)) = line else {
		return;
	};

	let dash = 5.0 / editor.canvas.viewport.zoom;
	ctx.set_stroke_style_str(NODE_BORDER);
	ctx.set_line_width(1.0);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(dash),
		&JsValue::from_f64(dash),
	));
	ctx.begin_path();
	ctx.move_to(from.x, from.y);
	ctx.line_to(to.x, to.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(
	ctx: &CanvasRenderingContext2d,
	nodes: &[FlowNode],
	selected: Option<&str>,
	hovered: Option<&str>,
) {
	ctx.set_font("12px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for node in nodes {
		let bounds = node.bounds();
		shape_path(ctx, node, &bounds);
		ctx.set_fill_style_str(&node.style.background);
		ctx.fill();

		let (border, width) = if selected == Some(node.id.as_str()) {
			("#555555", 2.0)
		} else if hovered == Some(node.id.as_str()) {
			("#777777", 1.5)
		} else {
			(NODE_BORDER, 1.0)
		};
		ctx.set_stroke_style_str(border);
		ctx.set_line_width(width);
		ctx.stroke();

		let center = node.center();
		ctx.set_fill_style_str(LABEL_COLOR);
		let _ = ctx.fill_text_with_max_width(
			&node.data.label,
			center.x,
			center.y,
			bounds.width - 8.0,
		);

		ctx.set_fill_style_str(NODE_BORDER);
		for handle in [node.target_handle(), node.source_handle()] {
			ctx.begin_path();
			let _ = ctx.arc(handle.x, handle.y, HANDLE_RADIUS, 0.0, 2.0 * PI);
			ctx.fill();
		}
	}
}

fn shape_path(ctx: &CanvasRenderingContext2d, node: &FlowNode, b: &Rect) {
	let c = b.center();
	ctx.begin_path();
	match node.kind {
		NodeKind::Rectangle => {
			let r = NODE_CORNER_RADIUS;
			ctx.move_to(b.x + r, b.y);
			let _ = ctx.arc_to(b.right(), b.y, b.right(), b.bottom(), r);
			let _ = ctx.arc_to(b.right(), b.bottom(), b.x, b.bottom(), r);
			let _ = ctx.arc_to(b.x, b.bottom(), b.x, b.y, r);
			let _ = ctx.arc_to(b.x, b.y, b.right(), b.y, r);
		}
		NodeKind::Circle => {
			let _ = ctx.arc(c.x, c.y, b.width.min(b.height) / 2.0, 0.0, 2.0 * PI);
		}
		NodeKind::Diamond => {
			ctx.move_to(c.x, b.y);
			ctx.line_to(b.right(), c.y);
			ctx.line_to(c.x, b.bottom());
			ctx.line_to(b.x, c.y);
		}
	}
	ctx.close_path();
}
