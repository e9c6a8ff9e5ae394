use log::info;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlAnchorElement, HtmlCanvasElement};

use super::error::{FlowError, Result, js_message};
use super::render;
use super::state::{rect_of_nodes, transform_for_bounds};
use super::types::{FlowEdge, FlowNode, Viewport};

pub const EXPORT_WIDTH: u32 = 1024;
pub const EXPORT_HEIGHT: u32 = 768;
pub const EXPORT_MIN_ZOOM: f64 = 0.5;
pub const EXPORT_MAX_ZOOM: f64 = 2.0;
pub const EXPORT_PADDING: f64 = 0.1;
pub const EXPORT_BACKGROUND: &str = "#eef";
pub const EXPORT_FILE_NAME: &str = "flowchart.png";

/// Viewport that fits every node into the export image.
pub fn export_viewport(nodes: &[FlowNode]) -> Viewport {
	transform_for_bounds(
		&rect_of_nodes(nodes),
		EXPORT_WIDTH as f64,
		EXPORT_HEIGHT as f64,
		EXPORT_MIN_ZOOM,
		EXPORT_MAX_ZOOM,
		EXPORT_PADDING,
	)
}

/// Draws the diagram onto an offscreen canvas and downloads it as a PNG.
pub fn export_png(nodes: &[FlowNode], edges: &[FlowEdge]) -> Result<()> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| FlowError::Export("no document".to_string()))?;

	let canvas: HtmlCanvasElement = document
		.create_element("canvas")
		.map_err(|e| FlowError::Export(js_message(e)))?
		.dyn_into()
		.map_err(|_| FlowError::Export("created element is not a canvas".to_string()))?;
	canvas.set_width(EXPORT_WIDTH);
	canvas.set_height(EXPORT_HEIGHT);

	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")
		.map_err(|e| FlowError::Export(js_message(e)))?
		.ok_or_else(|| FlowError::Export("2d context unavailable".to_string()))?
		.dyn_into()
		.map_err(|_| FlowError::Export("unexpected context type".to_string()))?;

	ctx.set_fill_style_str(EXPORT_BACKGROUND);
	ctx.fill_rect(0.0, 0.0, EXPORT_WIDTH as f64, EXPORT_HEIGHT as f64);
	render::render_diagram(&ctx, nodes, edges, &export_viewport(nodes));

	let data_url = canvas
		.to_data_url_with_type("image/png")
		.map_err(|e| FlowError::Export(js_message(e)))?;
	download(&document, &data_url)?;
	info!("Exported {} nodes to {}", nodes.len(), EXPORT_FILE_NAME);
	Ok(())
}

fn download(document: &Document, data_url: &str) -> Result<()> {
	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(|e| FlowError::Export(js_message(e)))?
		.dyn_into()
		.map_err(|_| FlowError::Export("created element is not an anchor".to_string()))?;
	anchor.set_download(EXPORT_FILE_NAME);
	anchor.set_href(data_url);
	anchor.click();
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_editor::types::{NodeKind, Position, initial_nodes};

	#[test]
	fn every_node_lands_inside_the_image() {
		let mut nodes = initial_nodes();
		nodes.push(FlowNode::new(
			"far",
			NodeKind::Diamond,
			Position::new(-900.0, 700.0),
			"",
			"",
		));
		let vp = export_viewport(&nodes);
		assert!(vp.zoom >= EXPORT_MIN_ZOOM && vp.zoom <= EXPORT_MAX_ZOOM);
		for node in &nodes {
			let b = node.bounds();
			let (x0, y0) = vp.flow_to_screen(&Position::new(b.x, b.y));
			let (x1, y1) = vp.flow_to_screen(&Position::new(b.right(), b.bottom()));
			assert!(x0 >= 0.0 && y0 >= 0.0, "{} starts off-image", node.id);
			assert!(
				x1 <= EXPORT_WIDTH as f64 && y1 <= EXPORT_HEIGHT as f64,
				"{} ends off-image",
				node.id
			);
		}
	}

	#[test]
	fn single_small_node_is_zoomed_to_the_cap() {
		let nodes = vec![FlowNode::new(
			"a",
			NodeKind::Circle,
			Position::new(0.0, 0.0),
			"",
			"",
		)];
		let vp = export_viewport(&nodes);
		assert_eq!(vp.zoom, EXPORT_MAX_ZOOM);
		// circle centre (40, 40) maps to the image centre
		assert_eq!(vp.flow_to_screen(&Position::new(40.0, 40.0)), (512.0, 384.0));
	}

	#[test]
	fn empty_diagram_still_yields_finite_transform() {
		let vp = export_viewport(&[]);
		assert_eq!(vp.zoom, EXPORT_MAX_ZOOM);
		assert!(vp.x.is_finite() && vp.y.is_finite());
	}
}
