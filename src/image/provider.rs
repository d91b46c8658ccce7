//! Image editor trait.

use crate::error::Result;
use crate::image::types::ImagePayload;
use async_trait::async_trait;

/// A remote service that applies a natural-language edit to an image.
///
/// Calls are single-shot: implementations must not retry internally, and
/// failures are returned as-is for the session to surface.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    /// Submits `image` with `instruction` and returns the edited image.
    async fn submit_edit(&self, image: &ImagePayload, instruction: &str) -> Result<ImagePayload>;

    /// Returns the name of this editor for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}
