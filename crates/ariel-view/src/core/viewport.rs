//! Viewport controller for a rendered graphic
//!
//! Tracks the `initial` view box captured after a render and the `current`
//! one mutated by zoom and pan. Zoom is anchored at the center of the current
//! view. Panning is measured from the view box captured when the drag started,
//! so repeated pointer moves never accumulate drift.
//!
//! Bounds:
//! - `current.width` stays within `[initial.width / 16, initial.width * 6]`
//! - the origin stays within one initial extent of the initial origin
//!
//! # Example
//!
//! ```rust
//! use ariel_view::core::{ViewBox, ViewportController};
//!
//! let mut viewport = ViewportController::new();
//! viewport.initialize(ViewBox::new(0.0, 0.0, 200.0, 100.0));
//!
//! viewport.zoom(1.0);
//! let zoomed = viewport.current().unwrap();
//! assert!((zoomed.width - 230.0).abs() < 1e-9);
//!
//! viewport.reset();
//! assert_eq!(viewport.current(), viewport.initial());
//! ```

use kurbo::{Point, Size};
use serde::Serialize;
use tracing::{debug, trace};

use super::error::GeometryError;
use super::geometry::ViewBox;

/// Multiplier applied per wheel notch
pub const ZOOM_STEP: f64 = 1.15;

/// Narrowest allowed view, as a fraction of the initial width
pub const MAX_ZOOM_IN: f64 = 16.0;

/// Widest allowed view, as a multiple of the initial width
pub const MAX_ZOOM_OUT: f64 = 6.0;

/// Primary pointer button
pub const PRIMARY_BUTTON: i16 = 0;

/// Observable viewport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewportState {
    /// No graphic
    Empty,
    /// `current == initial`
    Fitted,
    /// Zoomed or panned away from the initial view
    Adjusted,
}

/// A drag gesture in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanSession {
    pointer_id: i32,
    start: Point,
    start_view: ViewBox,
}

impl PanSession {
    pub fn pointer_id(&self) -> i32 {
        self.pointer_id
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn start_view(&self) -> ViewBox {
        self.start_view
    }
}

/// Exclusive pointer gesture: `Idle -> Panning(id) -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanGesture {
    #[default]
    Idle,
    Panning(PanSession),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    initial: ViewBox,
    current: ViewBox,
    min_width: f64,
    max_width: f64,
}

impl Frame {
    fn new(initial: ViewBox) -> Self {
        Self {
            initial,
            current: initial,
            min_width: initial.width / MAX_ZOOM_IN,
            max_width: initial.width * MAX_ZOOM_OUT,
        }
    }

    fn clamp_origin(&self, x: f64, y: f64) -> (f64, f64) {
        let bounds = self.initial;
        (
            clamp(x, bounds.x - bounds.width, bounds.x + bounds.width),
            clamp(y, bounds.y - bounds.height, bounds.y + bounds.height),
        )
    }
}

/// Clamp `value` into `[min, max]`; NaN clamps to `min`
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.max(min).min(max)
}

/// A stage must have a positive pixel size to map drags onto the view
pub fn check_stage(stage: Size) -> Result<(), GeometryError> {
    if stage.width > 0.0 && stage.height > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::DegenerateViewport {
            width: stage.width,
            height: stage.height,
        })
    }
}

/// Pan/zoom state over the rendered graphic
#[derive(Debug, Clone, Default)]
pub struct ViewportController {
    frame: Option<Frame>,
    gesture: PanGesture,
}

impl ViewportController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the intrinsic view box of a fresh render.
    ///
    /// Both `initial` and `current` are set to the (sanitized) intrinsic box
    /// and any drag in progress is dropped.
    pub fn initialize(&mut self, intrinsic: ViewBox) -> ViewBox {
        let initial = intrinsic.sanitized();
        if initial != intrinsic {
            debug!(%intrinsic, %initial, "Sanitized degenerate intrinsic view box");
        }
        self.frame = Some(Frame::new(initial));
        self.gesture = PanGesture::Idle;
        debug!(view_box = %initial, "Viewport fitted");
        initial
    }

    /// Drop the graphic
    pub fn clear(&mut self) {
        self.frame = None;
        self.gesture = PanGesture::Idle;
    }

    pub fn state(&self) -> ViewportState {
        match &self.frame {
            None => ViewportState::Empty,
            Some(frame) if frame.current == frame.initial => ViewportState::Fitted,
            Some(_) => ViewportState::Adjusted,
        }
    }

    pub fn initial(&self) -> Option<ViewBox> {
        self.frame.map(|frame| frame.initial)
    }

    pub fn current(&self) -> Option<ViewBox> {
        self.frame.map(|frame| frame.current)
    }

    /// Allowed `(min, max)` width of the current view
    pub fn zoom_limits(&self) -> Option<(f64, f64)> {
        self.frame.map(|frame| (frame.min_width, frame.max_width))
    }

    pub fn gesture(&self) -> &PanGesture {
        &self.gesture
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.gesture, PanGesture::Panning(_))
    }

    /// Zoom one step around the center of the current view.
    ///
    /// Negative `delta` zooms in, anything else zooms out. Non-finite
    /// deltas are ignored. Returns whether the view was updated.
    pub fn zoom(&mut self, delta: f64) -> bool {
        let Some(frame) = self.frame.as_mut() else {
            return false;
        };
        if !delta.is_finite() {
            return false;
        }

        let scale = if delta < 0.0 { 1.0 / ZOOM_STEP } else { ZOOM_STEP };
        let current = frame.current;
        let width = clamp(current.width * scale, frame.min_width, frame.max_width);
        let factor = width / current.width;
        let height = current.height * factor;

        let center = current.center();
        let (x, y) = frame.clamp_origin(center.x - width / 2.0, center.y - height / 2.0);
        frame.current = ViewBox::new(x, y, width, height);

        trace!(delta, factor, view_box = %frame.current, "Zoomed");
        true
    }

    /// Start a drag. Ignored without a graphic, for non-primary buttons, and
    /// while another pointer already owns the gesture.
    pub fn begin_pan(&mut self, pointer_id: i32, button: i16, position: Point) -> bool {
        let Some(frame) = self.frame.as_ref() else {
            return false;
        };
        if button != PRIMARY_BUTTON {
            return false;
        }
        if let PanGesture::Panning(active) = &self.gesture {
            trace!(
                pointer_id,
                active = active.pointer_id,
                "Ignoring pointer while another drag is active"
            );
            return false;
        }

        self.gesture = PanGesture::Panning(PanSession {
            pointer_id,
            start: position,
            start_view: frame.current,
        });
        trace!(pointer_id, x = position.x, y = position.y, "Pan started");
        true
    }

    /// Move the drag owned by `pointer_id` to `position` on a surface of
    /// `viewport` pixels.
    pub fn pan_to(&mut self, pointer_id: i32, position: Point, viewport: Size) -> bool {
        let PanGesture::Panning(session) = self.gesture else {
            return false;
        };
        if session.pointer_id != pointer_id {
            return false;
        }
        let delta = position - session.start;
        self.pan_by(delta.x, delta.y, viewport)
    }

    /// Offset the view by a pixel delta measured from the gesture start.
    ///
    /// Pixels are converted with the start view's width/height per viewport
    /// pixel, so panning speed follows the zoom level. A zero-size viewport
    /// makes this a no-op.
    pub fn pan_by(&mut self, dx: f64, dy: f64, viewport: Size) -> bool {
        let PanGesture::Panning(session) = self.gesture else {
            return false;
        };
        let Some(frame) = self.frame.as_mut() else {
            return false;
        };
        if let Err(err) = check_stage(viewport) {
            debug!(error = %err, "Skipping pan");
            return false;
        }

        let start = session.start_view;
        let scale_x = start.width / viewport.width;
        let scale_y = start.height / viewport.height;
        let (x, y) = frame.clamp_origin(start.x - dx * scale_x, start.y - dy * scale_y);
        frame.current = ViewBox::new(x, y, start.width, start.height);
        true
    }

    /// Finish the drag owned by `pointer_id` (release, cancel, lost capture)
    pub fn end_pan(&mut self, pointer_id: i32) -> bool {
        match self.gesture {
            PanGesture::Panning(session) if session.pointer_id == pointer_id => {
                self.gesture = PanGesture::Idle;
                trace!(pointer_id, "Pan finished");
                true
            }
            _ => false,
        }
    }

    /// Return to the initial view
    pub fn reset(&mut self) -> bool {
        let Some(frame) = self.frame.as_mut() else {
            return false;
        };
        frame.current = frame.initial;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> ViewportController {
        let mut viewport = ViewportController::new();
        viewport.initialize(ViewBox::new(0.0, 0.0, 160.0, 80.0));
        viewport
    }

    #[test]
    fn test_empty_controller_ignores_input() {
        let mut viewport = ViewportController::new();
        assert_eq!(viewport.state(), ViewportState::Empty);
        assert!(!viewport.zoom(1.0));
        assert!(!viewport.reset());
        assert!(!viewport.begin_pan(1, 0, Point::ZERO));
    }

    #[test]
    fn test_initialize_derives_limits() {
        let viewport = fitted();
        assert_eq!(viewport.state(), ViewportState::Fitted);
        assert_eq!(viewport.zoom_limits(), Some((10.0, 960.0)));
    }

    #[test]
    fn test_zoom_in_keeps_center() {
        let mut viewport = fitted();
        assert!(viewport.zoom(-3.0));
        let current = viewport.current().unwrap();
        assert!((current.center().x - 80.0).abs() < 1e-9);
        assert!((current.center().y - 40.0).abs() < 1e-9);
        assert!((current.width - 160.0 / ZOOM_STEP).abs() < 1e-9);
        assert_eq!(viewport.state(), ViewportState::Adjusted);
    }

    #[test]
    fn test_zoom_preserves_aspect_ratio_at_limit() {
        let mut viewport = fitted();
        for _ in 0..100 {
            viewport.zoom(1.0);
        }
        let current = viewport.current().unwrap();
        assert_eq!(current.width, 960.0);
        assert!((current.width / current.height - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_delta_zooms_out() {
        let mut viewport = fitted();
        assert!(!viewport.zoom(f64::NAN));
        assert_eq!(viewport.state(), ViewportState::Fitted);

        assert!(viewport.zoom(0.0));
        assert!((viewport.current().unwrap().width - 160.0 * ZOOM_STEP).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_nan_goes_to_min() {
        assert_eq!(clamp(f64::NAN, -1.0, 1.0), -1.0);
        assert_eq!(clamp(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, -1.0, 1.0), -1.0);
    }

    #[test]
    fn test_pan_requires_matching_pointer() {
        let mut viewport = fitted();
        assert!(viewport.begin_pan(7, 0, Point::new(100.0, 100.0)));
        assert!(!viewport.pan_to(8, Point::new(0.0, 0.0), Size::new(160.0, 80.0)));
        assert!(!viewport.end_pan(8));
        assert!(viewport.is_panning());
        assert!(viewport.end_pan(7));
        assert!(!viewport.is_panning());
    }

    #[test]
    fn test_secondary_button_does_not_pan() {
        let mut viewport = fitted();
        assert!(!viewport.begin_pan(1, 2, Point::ZERO));
        assert_eq!(viewport.gesture(), &PanGesture::Idle);
    }

    #[test]
    fn test_initialize_cancels_drag() {
        let mut viewport = fitted();
        viewport.begin_pan(1, 0, Point::ZERO);
        viewport.initialize(ViewBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(!viewport.is_panning());
    }
}
