//! Model lifecycle management for the local AI text-enhancement feature:
//! selecting, pulling, and deleting Ollama models, and deriving the status
//! line the settings UI renders.

pub mod backend;
pub mod config;
pub mod enhance;
pub mod events;
pub mod lifecycle;
