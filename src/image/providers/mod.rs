//! Image edit providers.

#[cfg(feature = "gemini")]
mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiEditor, GeminiEditorBuilder, GeminiModel, DEFAULT_BASE_URL};
