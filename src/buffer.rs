// Ordered, capped list of the points of the stroke being drawn.

use crate::types::Point;

/// Points of the live (not yet flattened) part of the stroke, in capture order.
#[derive(Debug, Clone, Default)]
pub struct PointBuffer {
    points: Vec<Point>,
}

impl PointBuffer {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn append(&mut self, point: Point) {
        self.points.push(point);
    }

    /// True once the buffer holds more than `max_points` points.
    #[inline]
    pub fn overflows(&self, max_points: usize) -> bool {
        self.points.len() > max_points
    }

    /// Remove everything except the last `keep_last` points and hand back the
    /// removed prefix. The kept tail seeds the next live segment so it joins the
    /// flattened part without a gap or a sharp angle.
    pub fn drain_except(&mut self, keep_last: usize) -> Vec<Point> {
        let cut = self.points.len().saturating_sub(keep_last);
        self.points.drain(..cut).collect()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
