use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::FlowError;

pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Shape a node is drawn with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
	#[default]
	Rectangle,
	Circle,
	Diamond,
}

impl NodeKind {
	pub const ALL: [NodeKind; 3] = [NodeKind::Rectangle, NodeKind::Circle, NodeKind::Diamond];

	pub fn as_str(self) -> &'static str {
		match self {
			NodeKind::Rectangle => "rectangle",
			NodeKind::Circle => "circle",
			NodeKind::Diamond => "diamond",
		}
	}

	pub fn palette_label(self) -> &'static str {
		match self {
			NodeKind::Rectangle => "Rectangle Node",
			NodeKind::Circle => "Circle Node",
			NodeKind::Diamond => "Diamond Node",
		}
	}

	/// Drawn width and height in flow coordinates.
	pub fn size(self) -> (f64, f64) {
		match self {
			NodeKind::Rectangle => (150.0, 40.0),
			NodeKind::Circle => (80.0, 80.0),
			NodeKind::Diamond => (100.0, 100.0),
		}
	}
}

impl fmt::Display for NodeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for NodeKind {
	type Err = FlowError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		NodeKind::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| FlowError::UnknownNodeKind(s.to_string()))
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(&self, other: &Position) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
	pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
	pub background: String,
}

impl Default for NodeStyle {
	fn default() -> Self {
		Self {
			background: DEFAULT_BACKGROUND.to_string(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
	pub id: String,
	pub position: Position,
	#[serde(rename = "type", default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub data: NodeData,
	#[serde(default)]
	pub style: NodeStyle,
}

impl FlowNode {
	pub fn new(
		id: impl Into<String>,
		kind: NodeKind,
		position: Position,
		label: impl Into<String>,
		background: impl Into<String>,
	) -> Self {
		Self {
			id: id.into(),
			position,
			kind,
			data: NodeData {
				label: label.into(),
			},
			style: NodeStyle {
				background: background.into(),
			},
		}
	}

	/// Box in flow coordinates; `position` is the top-left corner.
	pub fn bounds(&self) -> Rect {
		let (width, height) = self.kind.size();
		Rect {
			x: self.position.x,
			y: self.position.y,
			width,
			height,
		}
	}

	pub fn center(&self) -> Position {
		self.bounds().center()
	}

	/// Outgoing connection point, bottom centre.
	pub fn source_handle(&self) -> Position {
		let b = self.bounds();
		Position::new(b.x + b.width / 2.0, b.bottom())
	}

	/// Incoming connection point, top centre.
	pub fn target_handle(&self) -> Position {
		let b = self.bounds();
		Position::new(b.x + b.width / 2.0, b.y)
	}

	/// Shape-accurate hit test in flow coordinates.
	pub fn contains(&self, point: &Position) -> bool {
		let b = self.bounds();
		let c = b.center();
		let (hw, hh) = (b.width / 2.0, b.height / 2.0);
		let (dx, dy) = ((point.x - c.x).abs(), (point.y - c.y).abs());
		match self.kind {
			NodeKind::Rectangle => dx <= hw && dy <= hh,
			NodeKind::Circle => (dx / hw).powi(2) + (dy / hh).powi(2) <= 1.0,
			NodeKind::Diamond => dx / hw + dy / hh <= 1.0,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
	pub id: String,
	pub source: String,
	pub target: String,
}

impl FlowEdge {
	pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
		let (source, target) = (source.into(), target.into());
		Self {
			id: edge_id(&source, &target),
			source,
			target,
		}
	}
}

pub fn edge_id(source: &str, target: &str) -> String {
	format!("e{}-{}", source, target)
}

/// A proposed edge produced by a connect or reconnect gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
	pub source: String,
	pub target: String,
}

fn default_zoom() -> f64 {
	1.0
}

/// Pan/zoom of the canvas: `screen = flow * zoom + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	#[serde(default)]
	pub x: f64,
	#[serde(default)]
	pub y: f64,
	#[serde(default = "default_zoom")]
	pub zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			zoom: default_zoom(),
		}
	}
}

impl Viewport {
	pub fn screen_to_flow(&self, sx: f64, sy: f64) -> Position {
		Position::new((sx - self.x) / self.zoom, (sy - self.y) / self.zoom)
	}

	pub fn flow_to_screen(&self, p: &Position) -> (f64, f64) {
		(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn right(&self) -> f64 {
		self.x + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	pub fn center(&self) -> Position {
		Position::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	pub fn union(&self, other: &Rect) -> Rect {
		let (x, y) = (self.x.min(other.x), self.y.min(other.y));
		Rect {
			x,
			y,
			width: self.right().max(other.right()) - x,
			height: self.bottom().max(other.bottom()) - y,
		}
	}
}

/// Everything persisted for a diagram.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
	#[serde(default)]
	pub nodes: Vec<FlowNode>,
	#[serde(default)]
	pub edges: Vec<FlowEdge>,
	#[serde(default)]
	pub viewport: Viewport,
}

pub fn initial_nodes() -> Vec<FlowNode> {
	vec![
		FlowNode::new(
			"1",
			NodeKind::Rectangle,
			Position::new(500.0, 100.0),
			"Right click to open context menu",
			"#98FB98",
		),
		FlowNode::new(
			"2",
			NodeKind::Rectangle,
			Position::new(500.0, 200.0),
			"Click to update",
			"#AFEEEE",
		),
	]
}

pub fn initial_edges() -> Vec<FlowEdge> {
	vec![FlowEdge::between("1", "2")]
}
