// Turns stroke points into a polyline path and paints it into an RGBA buffer.
// Visual: the same code draws the live stroke every frame and the segment that
// gets baked into the flattened raster, so the two never disagree at the seam.

use image::{Rgba, RgbaImage};

use crate::types::{Point, StyleState};

/// One step of a polyline path, in physical pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
}

impl PathCommand {
    #[inline]
    pub fn point(&self) -> Point {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
        }
    }
}

/// A stroked polyline: round caps, round joins, no fill.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorPath {
    commands: Vec<PathCommand>,
    half_width: f32,
    color: Rgba<u8>,
    antialias: bool,
}

/// Build the path for `points` (logical coordinates). The first point is a
/// move, every later point a straight line; `scale` maps logical units to
/// physical pixels for both the points and the line width.
pub fn rasterize(points: &[Point], style: &StyleState, scale: f32) -> VectorPath {
    let commands = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let p = *p * scale;
            if i == 0 { PathCommand::MoveTo(p) } else { PathCommand::LineTo(p) }
        })
        .collect();

    VectorPath {
        commands,
        half_width: style.line_width * scale / 2.0,
        color: style.color,
        antialias: style.antialias,
    }
}

impl VectorPath {
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Stroke width in physical pixels.
    pub fn width(&self) -> f32 {
        self.half_width * 2.0
    }

    pub fn color(&self) -> Rgba<u8> {
        self.color
    }

    /// Pixel rectangle `(x0, y0, x1, y1)` (end exclusive) the stroke can touch,
    /// clamped to a `width` x `height` target. `None` when nothing is visible.
    pub fn pixel_bounds(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let mut points = self.commands.iter().map(PathCommand::point);
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }

        let reach = self.reach();
        let (x0, x1) = span(min.x - reach, max.x + reach, 0, width);
        let (y0, y1) = span(min.y - reach, max.y + reach, 0, height);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }

    /// Paint the stroke on top of `target` (source-over).
    ///
    /// Coverage is computed per pixel from the distance between the pixel
    /// center and the nearest segment, keeping the maximum over all segments,
    /// then blended once. Places where the path crosses itself are therefore
    /// painted a single time, like one stroked outline.
    ///
    /// Visual: no points draws nothing; one point draws a round dot.
    pub fn stroke_into(&self, target: &mut RgbaImage) {
        let (w, h) = target.dimensions();
        let Some((x0, y0, x1, y1)) = self.pixel_bounds(w, h) else {
            return;
        };
        let box_w = (x1 - x0) as usize;
        let mut coverage = vec![0u8; box_w * (y1 - y0) as usize];

        let points: Vec<Point> = self.commands.iter().map(PathCommand::point).collect();
        let reach = self.reach();

        // A lone point is a zero-length segment: the round caps make it a dot.
        let lone = [points[0], points[0]];
        let vertices: &[Point] = if points.len() == 1 { &lone } else { &points };

        for seg in vertices.windows(2) {
            let (a, b) = (seg[0], seg[1]);
            let (sx0, sx1) = span(a.x.min(b.x) - reach, a.x.max(b.x) + reach, x0, x1);
            let (sy0, sy1) = span(a.y.min(b.y) - reach, a.y.max(b.y) + reach, y0, y1);

            for y in sy0..sy1 {
                let row = (y - y0) as usize * box_w;
                for x in sx0..sx1 {
                    let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                    let c = self.coverage(center.distance_to_segment(a, b));
                    let cell = &mut coverage[row + (x - x0) as usize];
                    if c > *cell {
                        *cell = c;
                    }
                }
            }
        }

        for y in y0..y1 {
            let row = (y - y0) as usize * box_w;
            for x in x0..x1 {
                let c = coverage[row + (x - x0) as usize];
                if c != 0 {
                    blend_over(target.get_pixel_mut(x, y), self.color, c);
                }
            }
        }
    }

    // How far (in pixels) from a vertex the stroke may paint.
    #[inline]
    fn reach(&self) -> f32 {
        self.half_width + 1.0
    }

    #[inline]
    fn coverage(&self, distance: f32) -> u8 {
        if self.antialias {
            let c = (self.half_width + 0.5 - distance).clamp(0.0, 1.0);
            (c * 255.0).round() as u8
        } else if distance <= self.half_width {
            255
        } else {
            0
        }
    }
}

/// Integer pixel range covering `[lo, hi]`, clamped to `[min, max)`.
fn span(lo: f32, hi: f32, min: u32, max: u32) -> (u32, u32) {
    let lo = lo.floor().clamp(min as f32, max as f32) as u32;
    let hi = hi.ceil().clamp(min as f32, max as f32) as u32;
    (lo, hi)
}

/// Straight-alpha source-over of `src` scaled by `coverage` onto `dst`.
/// A fully opaque result copies `src` exactly, so repainting an opaque stroke
/// over itself leaves the pixels unchanged.
pub(crate) fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: u8) {
    let alpha = (src[3] as u32 * coverage as u32 + 127) / 255;
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        *dst = Rgba([src[0], src[1], src[2], 255]);
        return;
    }

    let sa = alpha as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(src[0], dst[0]),
        mix(src[1], dst[1]),
        mix(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn hard(width: f32, color: Rgba<u8>) -> StyleState {
        StyleState { line_width: width, color, antialias: false }
    }

    fn pts(raw: &[(f32, f32)]) -> Vec<Point> {
        raw.iter().map(|&p| Point::from(p)).collect()
    }

    #[test]
    fn first_point_moves_rest_draw_lines() {
        let path = rasterize(&pts(&[(1.0, 1.0), (2.0, 3.0), (4.0, 1.0)]), &StyleState::default(), 2.0);
        assert_eq!(
            path.commands(),
            &[
                PathCommand::MoveTo(Point::new(2.0, 2.0)),
                PathCommand::LineTo(Point::new(4.0, 6.0)),
                PathCommand::LineTo(Point::new(8.0, 2.0)),
            ]
        );
        assert_eq!(path.width(), 10.0);
    }

    #[test]
    fn empty_path_is_a_no_op() {
        let mut img = RgbaImage::new(8, 8);
        let path = rasterize(&[], &hard(3.0, RED), 1.0);
        assert!(path.is_empty());
        assert_eq!(path.pixel_bounds(8, 8), None);
        path.stroke_into(&mut img);
        assert!(img.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn single_point_draws_a_round_dot() {
        let mut img = RgbaImage::new(20, 20);
        rasterize(&pts(&[(10.0, 10.0)]), &hard(6.0, RED), 1.0).stroke_into(&mut img);

        assert_eq!(*img.get_pixel(10, 10), RED);
        assert_eq!(*img.get_pixel(12, 10), RED);
        // Corner of the bounding square lies outside the circle.
        assert_eq!(img.get_pixel(7, 7)[3], 0);
        assert_eq!(img.get_pixel(16, 10)[3], 0);
    }

    #[test]
    fn line_covers_its_span_and_nothing_far_away() {
        let mut img = RgbaImage::new(32, 16);
        rasterize(&pts(&[(4.0, 8.0), (28.0, 8.0)]), &hard(4.0, RED), 1.0).stroke_into(&mut img);

        for x in 4..28 {
            assert_eq!(*img.get_pixel(x, 8), RED, "x = {x}");
        }
        assert_eq!(img.get_pixel(16, 2)[3], 0);
        assert_eq!(img.get_pixel(16, 13)[3], 0);
    }

    #[test]
    fn antialiased_edge_is_partially_covered() {
        let mut img = RgbaImage::new(16, 16);
        let style = StyleState { antialias: true, ..hard(3.0, RED) };
        rasterize(&pts(&[(2.0, 8.0), (14.0, 8.0)]), &style, 1.0).stroke_into(&mut img);

        // Pixel center (8.5, 9.5) is 1.5 away: exactly on the edge.
        let edge = img.get_pixel(8, 9)[3];
        assert!(edge > 0 && edge < 255, "edge alpha {edge}");
        assert_eq!(img.get_pixel(8, 8)[3], 255);
    }

    #[test]
    fn self_overlap_is_painted_once() {
        let translucent = Rgba([0, 0, 255, 128]);
        let mut once = RgbaImage::new(24, 12);
        let mut back_and_forth = RgbaImage::new(24, 12);

        rasterize(&pts(&[(2.0, 6.0), (20.0, 6.0)]), &hard(4.0, translucent), 1.0).stroke_into(&mut once);
        rasterize(&pts(&[(2.0, 6.0), (20.0, 6.0), (2.0, 6.0), (20.0, 6.0)]), &hard(4.0, translucent), 1.0)
            .stroke_into(&mut back_and_forth);

        assert_eq!(once, back_and_forth);
        assert_eq!(once.get_pixel(10, 6)[3], 128);
    }

    #[test]
    fn stroke_is_clipped_to_the_target() {
        let mut img = RgbaImage::new(10, 10);
        rasterize(&pts(&[(-20.0, 5.0), (30.0, 5.0)]), &hard(2.0, RED), 1.0).stroke_into(&mut img);
        assert_eq!(*img.get_pixel(0, 5), RED);
        assert_eq!(*img.get_pixel(9, 5), RED);

        let off = rasterize(&pts(&[(50.0, 50.0)]), &hard(2.0, RED), 1.0);
        assert_eq!(off.pixel_bounds(10, 10), None);
    }

    #[test]
    fn blend_over_opaque_copies_and_half_mixes() {
        let mut px = Rgba([10, 20, 30, 255]);
        blend_over(&mut px, RED, 255);
        assert_eq!(px, RED);

        let mut px = Rgba([0, 0, 0, 255]);
        blend_over(&mut px, Rgba([255, 255, 255, 255]), 128);
        assert_eq!(px, Rgba([128, 128, 128, 255]));

        let mut px = Rgba([0, 0, 0, 0]);
        blend_over(&mut px, Rgba([200, 100, 50, 255]), 0);
        assert_eq!(px, Rgba([0, 0, 0, 0]));
    }
}
