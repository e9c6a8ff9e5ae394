//! Incremental change descriptors emitted by the canvas and the helpers that
//! apply them to the node/edge collections.

use log::{debug, warn};

use super::types::{Connection, FlowEdge, FlowNode, Position, edge_id};

#[derive(Clone, Debug, PartialEq)]
pub enum NodeChange {
	Add(FlowNode),
	Remove { id: String },
	Position { id: String, position: Position },
}

#[derive(Clone, Debug, PartialEq)]
pub enum EdgeChange {
	Add(FlowEdge),
	Remove { id: String },
}

/// Applies changes in order. Entries not named by a change keep their value
/// and their place in the list.
pub fn apply_node_changes(changes: Vec<NodeChange>, nodes: &mut Vec<FlowNode>) {
	for change in changes {
		match change {
			NodeChange::Add(node) => nodes.push(node),
			NodeChange::Remove { id } => nodes.retain(|n| n.id != id),
			NodeChange::Position { id, position } => {
				for node in nodes.iter_mut().filter(|n| n.id == id) {
					node.position = position;
				}
			}
		}
	}
}

pub fn apply_edge_changes(changes: Vec<EdgeChange>, edges: &mut Vec<FlowEdge>) {
	for change in changes {
		match change {
			EdgeChange::Add(edge) => edges.push(edge),
			EdgeChange::Remove { id } => edges.retain(|e| e.id != id),
		}
	}
}

/// Appends an edge for `connection`. Self-loops and repeats of an existing
/// source/target pair are rejected.
pub fn add_edge(connection: Connection, edges: &mut Vec<FlowEdge>) -> bool {
	if connection.source == connection.target {
		warn!("Rejected self-connection on node {}", connection.source);
		return false;
	}
	if edges
		.iter()
		.any(|e| e.source == connection.source && e.target == connection.target)
	{
		debug!(
			"Connection {} -> {} already exists",
			connection.source, connection.target
		);
		return false;
	}
	let edge = FlowEdge::between(connection.source, connection.target);
	apply_edge_changes(vec![EdgeChange::Add(edge)], edges);
	true
}

/// Replaces the endpoints of `old_id` in place; the id is re-derived from the
/// new endpoints. Returns false when no edge has that id or when another edge
/// already joins the new pair.
pub fn update_edge(old_id: &str, connection: Connection, edges: &mut [FlowEdge]) -> bool {
	if edges.iter().any(|e| {
		e.id != old_id && e.source == connection.source && e.target == connection.target
	}) {
		warn!(
			"Rejected reconnect of {} onto existing connection {} -> {}",
			old_id, connection.source, connection.target
		);
		return false;
	}
	let Some(edge) = edges.iter_mut().find(|e| e.id == old_id) else {
		return false;
	};
	edge.id = edge_id(&connection.source, &connection.target);
	edge.source = connection.source;
	edge.target = connection.target;
	true
}
