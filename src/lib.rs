#![warn(missing_docs)]
//! ProductClean - AI product photo editing.
//!
//! Upload a product photo, describe the edit in plain language, and compare
//! the result against the original with a before/after slider. The last ten
//! edits are kept in an in-memory session history.
//!
//! # Quick Start
//!
//! ```no_run
//! use productclean::{EditOutcome, EditSession, GeminiEditor, ImagePayload, QuickAction};
//!
//! #[tokio::main]
//! async fn main() -> productclean::Result<()> {
//!     let editor = GeminiEditor::builder().build()?;
//!     let mut session = EditSession::new();
//!
//!     session.set_original(ImagePayload::from_path("sneaker.jpg")?);
//!     match session.request_quick_action(&editor, QuickAction::RemoveBackground).await {
//!         EditOutcome::Completed(_) => {
//!             if let Some(edited) = session.edited() {
//!                 edited.save(productclean::DOWNLOAD_FILE_NAME)?;
//!             }
//!         }
//!         other => eprintln!("{other:?}: {}", session.status()),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `gemini`: Gemini (Google) image editor, the default backend
//! - `cli`: the `productclean` binary and its interactive shell

pub mod comparison;
mod error;
pub mod image;
pub mod presets;
pub mod session;

#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod shell;

// Re-export error types at crate root
pub use error::{EditError, Result, GENERIC_FAILURE_MESSAGE};

pub use crate::comparison::{
    ComparisonLayout, ComparisonSlider, ContainerBounds, PointerEvent, INITIAL_POSITION,
};
pub use crate::image::{ImageEditor, ImageFormat, ImagePayload, DOWNLOAD_FILE_NAME};
pub use presets::QuickAction;
pub use session::{
    EditOutcome, EditRecord, EditSession, EditTicket, History, ProcessingStatus, RecordId,
    SessionObserver, SessionSnapshot, MAX_HISTORY,
};

#[cfg(feature = "gemini")]
pub use crate::image::providers::{GeminiEditor, GeminiEditorBuilder, GeminiModel};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::comparison::{ComparisonSlider, ContainerBounds, PointerEvent};
    pub use crate::error::{EditError, Result};
    pub use crate::image::{ImageEditor, ImagePayload};
    pub use crate::presets::QuickAction;
    pub use crate::session::{EditOutcome, EditSession, ProcessingStatus};

    #[cfg(feature = "gemini")]
    pub use crate::image::providers::GeminiEditor;
}
