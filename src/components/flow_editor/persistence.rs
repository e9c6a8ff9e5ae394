use log::info;

use super::editor::FlowEditor;
use super::error::{FlowError, Result, js_message};
use super::types::FlowSnapshot;

pub const FLOW_KEY: &str = "example-flow";

/// Text key-value store holding saved flows.
pub trait FlowStore {
	fn get_item(&self, key: &str) -> Result<Option<String>>;
	fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
}

/// `window.localStorage`.
pub struct BrowserStorage(web_sys::Storage);

impl BrowserStorage {
	pub fn local() -> Result<Self> {
		let window = web_sys::window()
			.ok_or_else(|| FlowError::StorageUnavailable("no window".to_string()))?;
		window
			.local_storage()
			.map_err(|e| FlowError::StorageUnavailable(js_message(e)))?
			.map(Self)
			.ok_or_else(|| FlowError::StorageUnavailable("localStorage disabled".to_string()))
	}
}

impl FlowStore for BrowserStorage {
	fn get_item(&self, key: &str) -> Result<Option<String>> {
		self.0
			.get_item(key)
			.map_err(|e| FlowError::Storage(js_message(e)))
	}

	fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
		self.0
			.set_item(key, value)
			.map_err(|e| FlowError::Storage(js_message(e)))
	}
}

pub fn save_flow(editor: &FlowEditor, store: &mut impl FlowStore, key: &str) -> Result<()> {
	let snapshot = editor.to_snapshot();
	let text = serde_json::to_string(&snapshot)?;
	store.set_item(key, &text)?;
	info!(
		"Saved {} nodes and {} edges under {}",
		snapshot.nodes.len(),
		snapshot.edges.len(),
		key
	);
	Ok(())
}

/// Replaces the editor contents with the flow saved under `key`. Returns
/// `Ok(false)` and leaves the editor alone when nothing is stored.
pub fn restore_flow(editor: &mut FlowEditor, store: &impl FlowStore, key: &str) -> Result<bool> {
	let Some(text) = store.get_item(key)? else {
		return Ok(false);
	};
	// A stored `null` counts as nothing saved.
	let Some(snapshot) = serde_json::from_str::<Option<FlowSnapshot>>(&text)? else {
		return Ok(false);
	};
	info!(
		"Restored {} nodes and {} edges from {}",
		snapshot.nodes.len(),
		snapshot.edges.len(),
		key
	);
	editor.restore_snapshot(snapshot);
	Ok(true)
}
