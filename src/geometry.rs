//! Pure screen-space math: logical node bounds under a viewport transform,
//! boundary-clipped edge anchors, and label midpoints. No state.

use crate::graph::{Node, Point};
use crate::viewport::Viewport;

/// A node's axis-aligned bounding box in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Screen position = logical position scaled by zoom, then panned.
pub fn node_screen_rect(node: &Node, view: &Viewport) -> ScreenRect {
    ScreenRect {
        x: node.position.x * view.zoom + view.offset.x,
        y: node.position.y * view.zoom + view.offset.y,
        width: node.width * view.zoom,
        height: node.height * view.zoom,
    }
}

pub fn node_screen_center(node: &Node, view: &Viewport) -> Point {
    node_screen_rect(node, view).center()
}

/// The two-point polyline of an edge: from the source node's boundary to
/// the target node's boundary, clipped along the center-to-center direction
/// scaled by each node's half extents. `None` when the centers coincide.
pub fn edge_anchor_points(source: &Node, target: &Node, view: &Viewport) -> Option<(Point, Point)> {
    let source_rect = node_screen_rect(source, view);
    let target_rect = node_screen_rect(target, view);
    let source_center = source_rect.center();
    let target_center = target_rect.center();

    let dx = target_center.x - source_center.x;
    let dy = target_center.y - source_center.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance == 0.0 {
        return None;
    }

    let unit_x = dx / distance;
    let unit_y = dy / distance;

    let from = Point::new(
        source_center.x + unit_x * (source_rect.width / 2.0),
        source_center.y + unit_y * (source_rect.height / 2.0),
    );
    let to = Point::new(
        target_center.x - unit_x * (target_rect.width / 2.0),
        target_center.y - unit_y * (target_rect.height / 2.0),
    );
    Some((from, to))
}

pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}
