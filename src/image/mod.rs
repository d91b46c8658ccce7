//! Image payloads and the remote edit client.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageEditor;
pub use types::{ImageFormat, ImagePayload, DOWNLOAD_FILE_NAME};
