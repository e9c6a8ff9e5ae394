use super::types::{FlowEdge, FlowNode, Position, Rect, Viewport};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const HANDLE_RADIUS: f64 = 4.0;
pub const HANDLE_HIT_RADIUS: f64 = 8.0;
/// Screen-space distance under which a press/release pair counts as a click.
pub const CLICK_SLOP: f64 = 3.0;
const FIT_PADDING: f64 = 0.1;

/// What the pointer is currently doing on the canvas.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
	#[default]
	Idle,
	DragNode {
		id: String,
		start_x: f64,
		start_y: f64,
		node_start: Position,
	},
	Pan {
		start_x: f64,
		start_y: f64,
		transform_start_x: f64,
		transform_start_y: f64,
	},
	Connect {
		source: String,
	},
	UpdateEdge {
		edge_id: String,
		end: EdgeEnd,
	},
}

/// Which end of an edge a reconnect gesture is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeEnd {
	Source,
	Target,
}

/// Canvas-side view and interaction state. Screen coordinates are relative to
/// the canvas element's top-left corner.
#[derive(Clone, Debug)]
pub struct FlowState {
	pub viewport: Viewport,
	pub gesture: Gesture,
	/// Last pointer position in flow coordinates, used for gesture previews.
	pub pointer: Position,
	pub press: Option<(f64, f64)>,
	pub hovered: Option<String>,
	pub width: f64,
	pub height: f64,
}

impl FlowState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			viewport: Viewport::default(),
			gesture: Gesture::Idle,
			pointer: Position::default(),
			press: None,
			hovered: None,
			width,
			height,
		}
	}

	pub fn screen_to_flow(&self, sx: f64, sy: f64) -> Position {
		self.viewport.screen_to_flow(sx, sy)
	}

	/// Topmost node under the point; later nodes draw over earlier ones.
	pub fn node_at<'a>(&self, nodes: &'a [FlowNode], sx: f64, sy: f64) -> Option<&'a FlowNode> {
		let p = self.screen_to_flow(sx, sy);
		nodes.iter().rev().find(|node| node.contains(&p))
	}

	pub fn source_handle_at<'a>(
		&self,
		nodes: &'a [FlowNode],
		sx: f64,
		sy: f64,
	) -> Option<&'a FlowNode> {
		nodes
			.iter()
			.rev()
			.find(|node| self.near_screen_point(&node.source_handle(), sx, sy))
	}

	/// Edge with an end under the point, and which end it is. Target ends are
	/// checked before source ends.
	pub fn edge_end_at<'a>(
		&self,
		nodes: &[FlowNode],
		edges: &'a [FlowEdge],
		sx: f64,
		sy: f64,
	) -> Option<(&'a FlowEdge, EdgeEnd)> {
		let node = |id: &str| nodes.iter().find(|n| n.id == id);
		let at_target = edges.iter().rev().find(|edge| {
			node(&edge.target)
				.is_some_and(|n| self.near_screen_point(&n.target_handle(), sx, sy))
		});
		if let Some(edge) = at_target {
			return Some((edge, EdgeEnd::Target));
		}
		edges
			.iter()
			.rev()
			.find(|edge| {
				node(&edge.source)
					.is_some_and(|n| self.near_screen_point(&n.source_handle(), sx, sy))
			})
			.map(|edge| (edge, EdgeEnd::Source))
	}

	/// Handle hit areas keep their on-screen size at every zoom level.
	fn near_screen_point(&self, p: &Position, sx: f64, sy: f64) -> bool {
		let (hx, hy) = self.viewport.flow_to_screen(p);
		Position::new(hx, hy).distance(&Position::new(sx, sy)) <= HANDLE_HIT_RADIUS
	}

	pub fn is_click(&self, sx: f64, sy: f64) -> bool {
		self.press.is_some_and(|(px, py)| {
			let (dx, dy) = (sx - px, sy - py);
			(dx * dx + dy * dy).sqrt() <= CLICK_SLOP
		})
	}

	/// Zooms around a screen point, keeping the flow point under it fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let vp = &mut self.viewport;
		let new_zoom = (vp.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_zoom / vp.zoom;
		vp.x = sx - (sx - vp.x) * ratio;
		vp.y = sy - (sy - vp.y) * ratio;
		vp.zoom = new_zoom;
	}

	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom_at(self.width / 2.0, self.height / 2.0, factor);
	}

	pub fn fit_view(&mut self, nodes: &[FlowNode]) {
		if nodes.is_empty() {
			return;
		}
		self.viewport = transform_for_bounds(
			&rect_of_nodes(nodes),
			self.width,
			self.height,
			MIN_ZOOM,
			MAX_ZOOM,
			FIT_PADDING,
		);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

/// Union of all node boxes; zero-sized at the origin when there are none.
pub fn rect_of_nodes(nodes: &[FlowNode]) -> Rect {
	nodes
		.iter()
		.map(FlowNode::bounds)
		.reduce(|acc, b| acc.union(&b))
		.unwrap_or_default()
}

/// Viewport that centres `bounds` in a `width`×`height` surface, scaled to
/// fit with `padding` and clamped to the zoom range.
pub fn transform_for_bounds(
	bounds: &Rect,
	width: f64,
	height: f64,
	min_zoom: f64,
	max_zoom: f64,
	padding: f64,
) -> Viewport {
	let x_zoom = width / (bounds.width * (1.0 + padding));
	let y_zoom = height / (bounds.height * (1.0 + padding));
	let zoom = x_zoom.min(y_zoom).clamp(min_zoom, max_zoom);
	let center = bounds.center();
	Viewport {
		x: width / 2.0 - center.x * zoom,
		y: height / 2.0 - center.y * zoom,
		zoom,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::flow_editor::types::NodeKind;

	fn rect_node(id: &str, x: f64, y: f64) -> FlowNode {
		FlowNode::new(id, NodeKind::Rectangle, Position::new(x, y), id, "#fff")
	}

	#[test]
	fn topmost_node_wins_hit_test() {
		let state = FlowState::new(800.0, 600.0);
		let nodes = vec![rect_node("under", 0.0, 0.0), rect_node("over", 10.0, 10.0)];
		assert_eq!(state.node_at(&nodes, 20.0, 20.0).map(|n| n.id.as_str()), Some("over"));
		assert_eq!(state.node_at(&nodes, 2.0, 2.0).map(|n| n.id.as_str()), Some("under"));
		assert!(state.node_at(&nodes, 500.0, 500.0).is_none());
	}

	#[test]
	fn hit_testing_respects_viewport() {
		let mut state = FlowState::new(800.0, 600.0);
		state.viewport = Viewport {
			x: 100.0,
			y: 100.0,
			zoom: 2.0,
		};
		let nodes = vec![rect_node("a", 0.0, 0.0)];
		// flow (10, 10) → screen (120, 120)
		assert!(state.node_at(&nodes, 120.0, 120.0).is_some());
		assert!(state.node_at(&nodes, 20.0, 20.0).is_none());
		// source handle at flow (75, 40) → screen (250, 180)
		assert!(state.source_handle_at(&nodes, 250.0, 180.0).is_some());
	}

	#[test]
	fn edge_ends_are_found_at_both_handles() {
		let state = FlowState::new(800.0, 600.0);
		let nodes = vec![rect_node("a", 0.0, 0.0), rect_node("b", 0.0, 100.0)];
		let edges = vec![FlowEdge::between("a", "b")];
		let hit = state.edge_end_at(&nodes, &edges, 75.0, 101.0);
		assert_eq!(hit.map(|(e, end)| (e.id.as_str(), end)), Some(("ea-b", EdgeEnd::Target)));
		let hit = state.edge_end_at(&nodes, &edges, 75.0, 41.0);
		assert_eq!(hit.map(|(e, end)| (e.id.as_str(), end)), Some(("ea-b", EdgeEnd::Source)));
		assert!(state.edge_end_at(&nodes, &edges, 75.0, 1.0).is_none());
		// b has no outgoing edge, so its source handle is not an edge end
		assert!(state.edge_end_at(&nodes, &edges, 75.0, 141.0).is_none());
	}

	#[test]
	fn zoom_is_clamped_and_anchored() {
		let mut state = FlowState::new(800.0, 600.0);
		let anchor = state.screen_to_flow(200.0, 150.0);
		state.zoom_at(200.0, 150.0, 1.1);
		let after = state.screen_to_flow(200.0, 150.0);
		assert!((anchor.x - after.x).abs() < 1e-9 && (anchor.y - after.y).abs() < 1e-9);

		for _ in 0..50 {
			state.zoom_at(10.0, 10.0, 1.1);
		}
		assert_eq!(state.viewport.zoom, MAX_ZOOM);
		for _ in 0..100 {
			state.zoom_at(10.0, 10.0, 0.9);
		}
		assert_eq!(state.viewport.zoom, MIN_ZOOM);
	}

	#[test]
	fn fit_transform_centres_and_clamps() {
		let bounds = Rect {
			x: 0.0,
			y: 0.0,
			width: 100.0,
			height: 100.0,
		};
		// 768 / 110 ≈ 6.98, clamped to the maximum
		let vp = transform_for_bounds(&bounds, 1024.0, 768.0, 0.5, 2.0, 0.1);
		assert_eq!(vp.zoom, 2.0);
		assert_eq!((vp.x, vp.y), (512.0 - 100.0, 384.0 - 100.0));

		let huge = Rect {
			x: -5000.0,
			y: 0.0,
			width: 10000.0,
			height: 10.0,
		};
		assert_eq!(transform_for_bounds(&huge, 1024.0, 768.0, 0.5, 2.0, 0.1).zoom, 0.5);
	}

	#[test]
	fn bounds_cover_every_node() {
		let nodes = vec![
			rect_node("a", -10.0, 5.0),
			FlowNode::new("b", NodeKind::Circle, Position::new(300.0, 200.0), "", ""),
		];
		let bounds = rect_of_nodes(&nodes);
		assert_eq!((bounds.x, bounds.y), (-10.0, 5.0));
		assert_eq!((bounds.right(), bounds.bottom()), (380.0, 280.0));
		assert_eq!(rect_of_nodes(&[]), Rect::default());
	}
}
