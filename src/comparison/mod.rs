//! Before/after comparison slider.
//!
//! The slider owns a single number: the divider position as a percentage of
//! the container width. Left of the divider shows the "before" image, right
//! of it the "after" image. Positions are percentages, so a resized container
//! needs no special handling; the next pointer sample is simply measured
//! against the new bounds.

mod render;

pub use render::DIVIDER_WIDTH;

/// Divider position on construction (centered).
pub const INITIAL_POSITION: f64 = 50.0;

/// Bit for the primary (usually left) mouse button in a `buttons` mask.
pub const PRIMARY_BUTTON: u8 = 1;

/// The comparison container's bounding box, in the same coordinate space as
/// pointer samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerBounds {
    /// Left edge.
    pub left: f64,
    /// Width. Non-positive widths are treated as a collapsed container.
    pub width: f64,
}

impl ContainerBounds {
    /// Creates bounds from a left edge and width.
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Maps a pointer x coordinate to a divider percentage in `[0, 100]`.
    ///
    /// Returns `None` for a collapsed container or non-finite input.
    pub fn percent_at(&self, pointer_x: f64) -> Option<f64> {
        let finite = [pointer_x, self.left, self.width].iter().all(|v| v.is_finite());
        if !finite || self.width <= 0.0 {
            return None;
        }
        let position = ((pointer_x - self.left) / self.width) * 100.0;
        Some(position.clamp(0.0, 100.0))
    }
}

/// A pointer or touch sample delivered to the comparison container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// A mouse button was pressed.
    MouseDown {
        /// Pointer x coordinate.
        x: f64,
    },
    /// The mouse moved.
    MouseMove {
        /// Pointer x coordinate.
        x: f64,
        /// Mask of buttons currently held.
        buttons: u8,
    },
    /// A mouse button was released.
    MouseUp {
        /// Pointer x coordinate.
        x: f64,
    },
    /// A finger touched the container.
    TouchStart {
        /// X coordinate of the first touch point.
        x: f64,
    },
    /// A finger moved.
    TouchMove {
        /// X coordinate of the first touch point.
        x: f64,
    },
    /// All fingers lifted.
    TouchEnd,
}

impl PointerEvent {
    /// Returns the x coordinate if this event should move the divider.
    ///
    /// Presses move the divider immediately, so a click or tap without a
    /// drag still jumps to that point. Mouse moves count only while the
    /// primary button is held.
    fn tracking_x(&self) -> Option<f64> {
        match *self {
            Self::MouseDown { x } | Self::TouchStart { x } | Self::TouchMove { x } => Some(x),
            Self::MouseMove { x, buttons } if buttons & PRIMARY_BUTTON != 0 => Some(x),
            _ => None,
        }
    }
}

/// Where to clip and where to draw the divider, in container percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonLayout {
    /// Width of the region (from the left edge) showing the before image.
    pub before_clip_width: f64,
    /// Left offset of the divider line.
    pub divider_left: f64,
}

impl ComparisonLayout {
    /// Right inset of the before image's clip region.
    pub fn before_clip_right_inset(&self) -> f64 {
        100.0 - self.before_clip_width
    }
}

/// Interactive state of a before/after comparison view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonSlider {
    position: f64,
}

impl Default for ComparisonSlider {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonSlider {
    /// Creates a slider with the divider centered.
    pub fn new() -> Self {
        Self {
            position: INITIAL_POSITION,
        }
    }

    /// Returns the divider position in `[0, 100]`.
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Moves the divider to the pointer, clamped to the container.
    ///
    /// Returns the resulting position. Degenerate bounds leave it unchanged.
    pub fn update_position(&mut self, pointer_x: f64, bounds: ContainerBounds) -> f64 {
        if let Some(position) = bounds.percent_at(pointer_x) {
            self.position = position;
        }
        self.position
    }

    /// Applies a pointer event. Returns true if the divider moved.
    pub fn handle(&mut self, event: PointerEvent, bounds: ContainerBounds) -> bool {
        let Some(x) = event.tracking_x() else {
            return false;
        };
        let before = self.position;
        self.update_position(x, bounds) != before
    }

    /// Returns the clip/divider geometry for the current position.
    pub fn layout(&self) -> ComparisonLayout {
        ComparisonLayout {
            before_clip_width: self.position,
            divider_left: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: ContainerBounds = ContainerBounds {
        left: 100.0,
        width: 400.0,
    };

    #[test]
    fn test_starts_centered() {
        assert_eq!(ComparisonSlider::new().position(), 50.0);
        assert_eq!(ComparisonSlider::default().position(), INITIAL_POSITION);
    }

    #[test]
    fn test_update_position_edges_and_middle() {
        let mut slider = ComparisonSlider::new();
        assert_eq!(slider.update_position(100.0, BOUNDS), 0.0);
        assert_eq!(slider.update_position(500.0, BOUNDS), 100.0);
        assert_eq!(slider.update_position(300.0, BOUNDS), 50.0);
        assert_eq!(slider.update_position(200.0, BOUNDS), 25.0);
    }

    #[test]
    fn test_update_position_clamps_outside_container() {
        let mut slider = ComparisonSlider::new();
        assert_eq!(slider.update_position(-50.0, BOUNDS), 0.0);
        assert_eq!(slider.update_position(99.9, BOUNDS), 0.0);
        assert_eq!(slider.update_position(10_000.0, BOUNDS), 100.0);
        assert_eq!(slider.update_position(500.1, BOUNDS), 100.0);
    }

    #[test]
    fn test_update_position_is_idempotent() {
        let mut slider = ComparisonSlider::new();
        let first = slider.update_position(123.0, BOUNDS);
        let second = slider.update_position(123.0, BOUNDS);
        assert_eq!(first, second);
        assert_eq!(slider.position(), first);
    }

    #[test]
    fn test_degenerate_bounds_leave_position() {
        let mut slider = ComparisonSlider::new();
        slider.update_position(200.0, BOUNDS);
        assert_eq!(slider.update_position(10.0, ContainerBounds::new(0.0, 0.0)), 25.0);
        assert_eq!(slider.update_position(10.0, ContainerBounds::new(0.0, -5.0)), 25.0);
        assert_eq!(slider.update_position(f64::NAN, BOUNDS), 25.0);
        assert_eq!(
            slider.update_position(10.0, ContainerBounds::new(0.0, f64::INFINITY)),
            25.0
        );
    }

    #[test]
    fn test_infinite_inputs_leave_position() {
        let mut slider = ComparisonSlider::new();
        slider.update_position(200.0, BOUNDS);
        assert_eq!(slider.update_position(f64::INFINITY, BOUNDS), 25.0);
        assert_eq!(slider.update_position(f64::NEG_INFINITY, BOUNDS), 25.0);
        assert_eq!(
            slider.update_position(10.0, ContainerBounds::new(f64::INFINITY, 400.0)),
            25.0
        );
        assert_eq!(
            slider.update_position(10.0, ContainerBounds::new(f64::NEG_INFINITY, 400.0)),
            25.0
        );
        assert!(!slider.handle(PointerEvent::MouseDown { x: f64::INFINITY }, BOUNDS));
        assert_eq!(BOUNDS.percent_at(f64::INFINITY), None);
    }

    #[test]
    fn test_resize_recomputes_from_current_bounds() {
        let mut slider = ComparisonSlider::new();
        slider.update_position(300.0, BOUNDS);
        assert_eq!(slider.position(), 50.0);

        let resized = ContainerBounds::new(100.0, 800.0);
        slider.update_position(300.0, resized);
        assert_eq!(slider.position(), 25.0);
    }

    #[test]
    fn test_press_moves_divider_without_drag() {
        let mut slider = ComparisonSlider::new();
        assert!(slider.handle(PointerEvent::MouseDown { x: 200.0 }, BOUNDS));
        assert_eq!(slider.position(), 25.0);

        assert!(slider.handle(PointerEvent::TouchStart { x: 400.0 }, BOUNDS));
        assert_eq!(slider.position(), 75.0);
    }

    #[test]
    fn test_mouse_move_requires_primary_button() {
        let mut slider = ComparisonSlider::new();
        assert!(!slider.handle(PointerEvent::MouseMove { x: 200.0, buttons: 0 }, BOUNDS));
        assert!(!slider.handle(PointerEvent::MouseMove { x: 200.0, buttons: 2 }, BOUNDS));
        assert_eq!(slider.position(), 50.0);

        assert!(slider.handle(PointerEvent::MouseMove { x: 200.0, buttons: 1 }, BOUNDS));
        assert_eq!(slider.position(), 25.0);

        // primary held together with another button still drags
        assert!(slider.handle(PointerEvent::MouseMove { x: 100.0, buttons: 3 }, BOUNDS));
        assert_eq!(slider.position(), 0.0);
    }

    #[test]
    fn test_touch_move_drags() {
        let mut slider = ComparisonSlider::new();
        assert!(slider.handle(PointerEvent::TouchMove { x: 600.0 }, BOUNDS));
        assert_eq!(slider.position(), 100.0);
        assert!(!slider.handle(PointerEvent::TouchMove { x: 700.0 }, BOUNDS));
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut slider = ComparisonSlider::new();
        assert!(!slider.handle(PointerEvent::MouseUp { x: 100.0 }, BOUNDS));
        assert!(!slider.handle(PointerEvent::TouchEnd, BOUNDS));
        assert_eq!(slider.position(), 50.0);
    }

    #[test]
    fn test_layout_tracks_position() {
        let mut slider = ComparisonSlider::new();
        slider.update_position(200.0, BOUNDS);
        let layout = slider.layout();
        assert_eq!(layout.before_clip_width, 25.0);
        assert_eq!(layout.divider_left, 25.0);
        assert_eq!(layout.before_clip_right_inset(), 75.0);
    }
}
