mod changes;
mod component;
mod editor;
mod error;
mod export;
mod menu;
mod persistence;
mod render;
mod sidebar;
mod state;
mod types;

pub use component::DiagramEditor;
