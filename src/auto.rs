// Scripted strokes: a spiral fed through the surface one point per tick.
// Visual: the spiral unwinds from the center at frame rate, flattening every
// `max_points` points exactly like a long finger stroke would.

use std::f32::consts::TAU;

use log::debug;

use crate::error::Result;
use crate::surface::DrawSurface;
use crate::types::{Bounds, Point};

/// Shape of an Archimedean spiral, in logical coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpiralParams {
    pub center: Point,
    pub max_radius: f32,
    pub turns: f32,
    pub points_per_turn: u32,
}

impl SpiralParams {
    /// Spiral filling most of the surface.
    pub fn centered(bounds: Bounds) -> Self {
        let w = bounds.width as f32;
        let h = bounds.height as f32;
        Self {
            center: Point::new(w / 2.0, h / 2.0),
            max_radius: w.min(h) * 0.45,
            turns: 12.0,
            points_per_turn: 360,
        }
    }
}

/// Finite, deterministic point sequence of a spiral. Cloning (or building a
/// new one from the same params) restarts it from the center.
#[derive(Clone, Debug)]
pub struct Spiral {
    params: SpiralParams,
    index: u32,
    last: u32,
}

impl Spiral {
    pub fn new(params: SpiralParams) -> Self {
        // Capped so `last + 1` (the point count) still fits in u32.
        let count = (params.turns.max(0.0) * params.points_per_turn as f32).ceil() as u32;
        let last = count.min(u32::MAX - 1);
        Self { params, index: 0, last }
    }

    pub fn params(&self) -> &SpiralParams {
        &self.params
    }
}

impl Iterator for Spiral {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.index > self.last {
            return None;
        }
        let t = if self.last == 0 { 0.0 } else { self.index as f32 / self.last as f32 };
        self.index += 1;

        let radius = self.params.max_radius * t;
        let angle = TAU * self.params.turns * t;
        Some(Point::new(
            self.params.center.x + radius * angle.cos(),
            self.params.center.y + radius * angle.sin(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.last + 1).saturating_sub(self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Spiral {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AutoState {
    Running,
    Finished,
    Cancelled,
}

/// Drives a surface with a spiral, one point per display tick.
pub struct AutoStroke {
    spiral: Spiral,
    state: AutoState,
    fed: usize,
}

impl AutoStroke {
    pub fn new(params: SpiralParams) -> Self {
        Self { spiral: Spiral::new(params), state: AutoState::Running, fed: 0 }
    }

    pub fn state(&self) -> AutoState {
        self.state
    }

    /// Points handed to the surface so far.
    pub fn fed(&self) -> usize {
        self.fed
    }

    /// Feed the next point, or end the stroke once the spiral is exhausted.
    /// Does nothing after the stroke finished or was cancelled.
    pub fn tick(&mut self, surface: &mut DrawSurface) -> Result<AutoState> {
        if self.state != AutoState::Running {
            return Ok(self.state);
        }
        match self.spiral.next() {
            Some(point) => {
                // A failed overflow flatten still buffers the point.
                let appended = surface.begin_or_continue_stroke(point);
                self.fed += 1;
                appended?;
            }
            None => {
                surface.end_stroke()?;
                self.state = AutoState::Finished;
                debug!("auto stroke finished after {} points", self.fed);
            }
        }
        Ok(self.state)
    }

    /// Stop ticking. Points already fed are committed as a normal stroke end;
    /// earlier flattened content is left alone.
    pub fn cancel(&mut self, surface: &mut DrawSurface) -> Result<()> {
        if self.state != AutoState::Running {
            return Ok(());
        }
        self.state = AutoState::Cancelled;
        debug!("auto stroke cancelled after {} points", self.fed);
        if self.fed > 0 {
            surface.end_stroke()?;
        }
        Ok(())
    }

    /// Tick until the spiral is done.
    pub fn run_to_end(&mut self, surface: &mut DrawSurface) -> Result<()> {
        while self.tick(surface)? == AutoState::Running {}
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurfaceConfig;

    fn params() -> SpiralParams {
        SpiralParams {
            center: Point::new(50.0, 50.0),
            max_radius: 40.0,
            turns: 2.0,
            points_per_turn: 10,
        }
    }

    #[test]
    fn spiral_starts_at_center_and_ends_at_max_radius() {
        let points: Vec<Point> = Spiral::new(params()).collect();
        assert_eq!(points.len(), 21);
        assert_eq!(points[0], Point::new(50.0, 50.0));

        let end = points[20];
        assert!((end.distance(Point::new(50.0, 50.0)) - 40.0).abs() < 1e-3);
    }

    #[test]
    fn spiral_is_restartable() {
        let spiral = Spiral::new(params());
        assert_eq!(spiral.len(), 21);
        let a: Vec<Point> = spiral.clone().collect();
        let b: Vec<Point> = spiral.collect();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_turn_spiral_is_a_single_point() {
        let points: Vec<Point> = Spiral::new(SpiralParams { turns: 0.0, ..params() }).collect();
        assert_eq!(points, vec![Point::new(50.0, 50.0)]);
    }

    #[test]
    fn huge_spiral_length_fits_u32() {
        let spiral = Spiral::new(SpiralParams { turns: 1e12, points_per_turn: 1000, ..params() });
        assert_eq!(spiral.len(), u32::MAX as usize);
        assert_eq!(spiral.take(3).count(), 3);
    }

    #[test]
    fn tick_feeds_then_ends_the_stroke() {
        let mut surface = DrawSurface::new(SurfaceConfig::new(100, 100, 1.0)).unwrap();
        let mut auto = AutoStroke::new(params());

        assert_eq!(auto.tick(&mut surface).unwrap(), AutoState::Running);
        assert_eq!(surface.live_points().len(), 1);

        auto.run_to_end(&mut surface).unwrap();
        assert_eq!(auto.state(), AutoState::Finished);
        assert_eq!(auto.fed(), 21);
        assert!(surface.live_points().is_empty());
        assert_eq!(surface.flatten_count(), 1);
    }

    #[test]
    fn tick_error_still_counts_the_buffered_point() {
        let config = SurfaceConfig { max_points: 4, ..SurfaceConfig::new(100, 100, 1.0) };
        let mut surface = DrawSurface::new(config).unwrap();
        let mut auto = AutoStroke::new(params());
        surface.set_raster_budget(16);
        for _ in 0..4 {
            auto.tick(&mut surface).unwrap();
        }

        assert!(auto.tick(&mut surface).is_err());
        assert_eq!(auto.fed(), 5);
        assert_eq!(surface.live_points().len(), 5);
        assert_eq!(auto.state(), AutoState::Running);

        surface.set_raster_budget(surface.config().max_raster_bytes);
        auto.run_to_end(&mut surface).unwrap();
        assert_eq!(auto.fed(), 21);
        assert_eq!(auto.state(), AutoState::Finished);
    }

    #[test]
    fn cancel_stops_future_ticks() {
        let mut surface = DrawSurface::new(SurfaceConfig::new(100, 100, 1.0)).unwrap();
        let mut auto = AutoStroke::new(params());
        for _ in 0..5 {
            auto.tick(&mut surface).unwrap();
        }
        auto.cancel(&mut surface).unwrap();
        let committed = surface.snapshot();

        assert_eq!(auto.tick(&mut surface).unwrap(), AutoState::Cancelled);
        assert_eq!(auto.fed(), 5);
        assert!(surface.live_points().is_empty());
        assert_eq!(surface.snapshot(), committed);
    }
}
