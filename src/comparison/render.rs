//! Rendering backends for the comparison view.

use super::ComparisonSlider;
use crate::error::{EditError, Result};
use crate::image::ImagePayload;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// Width of the divider line in the raster composite, in pixels.
pub const DIVIDER_WIDTH: u32 = 2;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const DIVIDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

impl ComparisonSlider {
    /// Renders the comparison as a self-contained HTML fragment.
    ///
    /// The after image fills the container. The before image is stacked on
    /// top and clipped to the left `position`% of the container, and the
    /// divider is drawn at the same offset.
    pub fn render_html(&self, before: &ImagePayload, after: &ImagePayload) -> String {
        let layout = self.layout();
        let clip_inset = format_percent(layout.before_clip_right_inset());
        let divider_left = format_percent(layout.divider_left);

        format!(
            concat!(
                r#"<div class="image-comparison" style="position:relative;width:100%;aspect-ratio:16/9;overflow:hidden;user-select:none;cursor:col-resize;background:#e5e7eb">"#,
                r#"<img src="{after}" alt="After" style="position:absolute;inset:0;width:100%;height:100%;object-fit:contain;background:#fff">"#,
                r#"<img src="{before}" alt="Before" style="position:absolute;inset:0;width:100%;height:100%;object-fit:contain;background:#fff;clip-path:inset(0 {clip_inset}% 0 0)">"#,
                r#"<span class="badge badge-before" style="position:absolute;top:1rem;left:1rem">Original</span>"#,
                r#"<span class="badge badge-after" style="position:absolute;top:1rem;right:1rem">Enhanced</span>"#,
                r#"<div class="divider" style="position:absolute;top:0;bottom:0;width:2px;background:#fff;pointer-events:none;left:{divider_left}%"></div>"#,
                "</div>"
            ),
            after = escape_attr(&after.to_data_uri()),
            before = escape_attr(&before.to_data_uri()),
            clip_inset = clip_inset,
            divider_left = divider_left,
        )
    }

    /// Renders the comparison into a `width` x `height` bitmap.
    ///
    /// Both images are scaled to fit the frame on a white background. Columns
    /// left of the divider come from `before`, the rest from `after`.
    pub fn compose(
        &self,
        before: &ImagePayload,
        after: &ImagePayload,
        width: u32,
        height: u32,
    ) -> Result<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(EditError::Render(format!(
                "invalid comparison size {width}x{height}"
            )));
        }

        let before = fit_contain(&decode(before)?, width, height);
        let mut canvas = fit_contain(&decode(after)?, width, height);

        let divider = divider_column(self.position(), width);
        for y in 0..height {
            for x in 0..divider {
                canvas.put_pixel(x, y, *before.get_pixel(x, y));
            }
        }

        let start = divider.saturating_sub(DIVIDER_WIDTH / 2);
        let end = (start + DIVIDER_WIDTH).min(width);
        for y in 0..height {
            for x in start..end {
                canvas.put_pixel(x, y, DIVIDER_COLOR);
            }
        }

        tracing::debug!(
            width,
            height,
            position = self.position(),
            divider,
            "composed comparison"
        );

        Ok(canvas)
    }
}

fn decode(payload: &ImagePayload) -> Result<DynamicImage> {
    Ok(image::load_from_memory(payload.data())?)
}

/// Scales `img` to fit inside the frame, centered on a white background.
fn fit_contain(img: &DynamicImage, width: u32, height: u32) -> RgbaImage {
    let resized = img.resize(width, height, FilterType::Triangle).to_rgba8();
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
    let x = (width - resized.width().min(width)) / 2;
    let y = (height - resized.height().min(height)) / 2;
    imageops::overlay(&mut canvas, &resized, i64::from(x), i64::from(y));
    canvas
}

fn divider_column(position: f64, width: u32) -> u32 {
    let column = (position.clamp(0.0, 100.0) / 100.0 * f64::from(width)).round();
    (column as u32).min(width)
}

/// Formats a percentage with at most two decimals and no trailing zeros.
fn format_percent(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
