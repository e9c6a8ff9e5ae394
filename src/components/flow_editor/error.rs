use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum FlowError {
	#[error("unknown node type `{0}`")]
	UnknownNodeKind(String),

	#[error("storage unavailable: {0}")]
	StorageUnavailable(String),

	#[error("storage error: {0}")]
	Storage(String),

	#[error("malformed saved flow: {0}")]
	Parse(#[from] serde_json::Error),

	#[error("export failed: {0}")]
	Export(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

/// Renders a thrown JavaScript value for inclusion in an error message.
pub fn js_message(value: JsValue) -> String {
	value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
