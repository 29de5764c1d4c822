//! Cursor tracking for the avatar's eyes.
//!
//! Each marker (an eye) gets an offset for its indicator (the pupil) so that
//! it appears to look at the pointer. Every pointer move is computed from
//! scratch; nothing is smoothed or remembered.

/// Largest indicator offset, in CSS pixels.
pub const MAX_OFFSET: f64 = 5.0;
/// Pointer distance is divided by this before capping.
pub const DISTANCE_DIVISOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A marker's bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl MarkerRect {
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorOffset {
    pub dx: f64,
    pub dy: f64,
}

impl IndicatorOffset {
    pub fn magnitude(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    /// Transform that keeps the indicator centered on its own box, then shifts it.
    pub fn css_transform(&self) -> String {
        format!(
            "translate(calc(-50% + {}px), calc(-50% + {}px))",
            self.dx, self.dy
        )
    }
}

pub fn indicator_offset(marker: &MarkerRect, pointer: Point) -> IndicatorOffset {
    let center = marker.center();
    let dx = pointer.x - center.x;
    let dy = pointer.y - center.y;
    // atan2 covers all four quadrants; atan2(0, 0) is 0 and distance is 0 there.
    let angle = dy.atan2(dx);
    let distance = (dx.hypot(dy) / DISTANCE_DIVISOR).min(MAX_OFFSET);
    IndicatorOffset {
        dx: angle.cos() * distance,
        dy: angle.sin() * distance,
    }
}

/// Offsets for every marker that exists, keyed by its position in `markers`.
pub fn track_pointer<I>(markers: I, pointer: Point) -> Vec<(usize, IndicatorOffset)>
where
    I: IntoIterator<Item = Option<MarkerRect>>,
{
    markers
        .into_iter()
        .enumerate()
        .filter_map(|(index, marker)| marker.map(|rect| (index, indicator_offset(&rect, pointer))))
        .collect()
}
