//! Viewport transform and interaction state: pan offset, clamped zoom, and
//! the single active node-drag session.

use crate::graph::Point;
use crate::{MAX_ZOOM, MIN_ZOOM, VIEWPORT_HEIGHT, VIEWPORT_WIDTH, ZOOM_STEP};

/// The visible window into the logical canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Pan translation, applied after scaling.
    pub offset: Point,
    /// Scale factor, clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Point::default(),
            zoom: 1.0,
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
struct DragSession {
    node_id: String,
    last_x: f32,
    last_y: f32,
}

/// Owns the viewport plus drag-interaction state. Dragging reports logical
/// deltas; applying them to the graph is the document's job.
#[derive(Debug, Default)]
pub struct ViewportController {
    view: Viewport,
    drag: Option<DragSession>,
}

impl ViewportController {
    pub fn new(view: Viewport) -> Self {
        Self { view, drag: None }
    }

    pub fn view(&self) -> &Viewport {
        &self.view
    }

    /// Replaces the pan offset unconditionally.
    pub fn pan(&mut self, offset: Point) {
        self.view.offset = offset;
    }

    /// Applies `delta * ZOOM_STEP` to the zoom level, clamped to the
    /// configured range.
    pub fn zoom_by(&mut self, delta: f32) {
        self.view.zoom = (self.view.zoom + delta * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.view.width = width;
        self.view.height = height;
    }

    /// Opens a drag session anchored at the given screen position. Only one
    /// session is active at a time; starting again replaces it.
    pub fn start_drag(&mut self, node_id: impl Into<String>, screen_x: f32, screen_y: f32) {
        self.drag = Some(DragSession {
            node_id: node_id.into(),
            last_x: screen_x,
            last_y: screen_y,
        });
    }

    /// Converts the screen-space movement since the last call into a
    /// logical-space delta (screen delta divided by zoom, so the node
    /// tracks the pointer at any zoom level) and rebases the anchor.
    /// Returns the dragged node and the delta to apply, or `None` when no
    /// session is active.
    pub fn drag_to(&mut self, screen_x: f32, screen_y: f32) -> Option<(String, Point)> {
        let session = self.drag.as_mut()?;
        let dx = (screen_x - session.last_x) / self.view.zoom;
        let dy = (screen_y - session.last_y) / self.view.zoom;
        session.last_x = screen_x;
        session.last_y = screen_y;
        Some((session.node_id.clone(), Point::new(dx, dy)))
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragging_node(&self) -> Option<&str> {
        self.drag.as_ref().map(|s| s.node_id.as_str())
    }
}
