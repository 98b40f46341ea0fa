use ratatui::layout::Rect;
use steadypath::{config::ViewBox, Point};

/// Maps terminal cells inside the canvas to curve space and back.
///
/// Curve space follows the track's authoring convention (y grows down), so
/// rows map directly; only the canvas widget needs the flipped y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    area: Rect,
    view_box: ViewBox,
}

impl Viewport {
    pub fn new(area: Rect, view_box: ViewBox) -> Self {
        Self { area, view_box }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Centre of the cell at (`column`, `row`) in curve space, or `None`
    /// when the cell lies outside the canvas.
    pub fn to_curve(&self, column: u16, row: u16) -> Option<Point> {
        let a = self.area;
        if a.width == 0 || a.height == 0 {
            return None;
        }
        if column < a.x || column >= a.right() || row < a.y || row >= a.bottom() {
            return None;
        }
        let fx = ((column - a.x) as f64 + 0.5) / a.width as f64;
        let fy = ((row - a.y) as f64 + 0.5) / a.height as f64;
        Some(Point::new(fx * self.view_box.width, fy * self.view_box.height))
    }

    /// Cell containing `point`, or `None` outside the view box.
    pub fn to_cell(&self, point: Point) -> Option<(u16, u16)> {
        let fx = point.x / self.view_box.width;
        let fy = point.y / self.view_box.height;
        if !(0.0..1.0).contains(&fx) || !(0.0..1.0).contains(&fy) {
            return None;
        }
        let col = (fx * self.area.width as f64).floor() as u16;
        let row = (fy * self.area.height as f64).floor() as u16;
        Some((self.area.x + col, self.area.y + row))
    }
}

/// Canvas widget coordinates have y growing up.
pub fn to_canvas(view_box: ViewBox, point: Point) -> (f64, f64) {
    (point.x, view_box.height - point.y)
}
