use super::surface::{RasterSurface, MAX_SURFACE_SIDE};
use crate::animations::jitter::{apply_jitter_to_stroke, compute_pattern_jitter, snap_to_pixel, PixelPoint};
use crate::brush::{BrushShape, Palette, PatternId};
use crate::drawing::{Drawing, JitterConfig, Stroke};
use tiny_skia::{BlendMode, FillRule, Mask, Paint, PathBuilder, Rect, Transform};

/// Repaints the whole surface with `drawing` as it looks at `elapsed_ms`.
///
/// Nothing from a previous call survives: the surface is cleared first, so
/// frames can be produced in any order.
pub fn paint_drawing(
    surface: &mut RasterSurface,
    drawing: &Drawing,
    elapsed_ms: f64,
    cfg: &JitterConfig,
    palette: &Palette,
) {
    surface.clear();
    for stroke in &drawing.strokes {
        paint_stroke(surface, stroke, elapsed_ms, cfg, palette);
    }
}

/// Inclusive pixel rectangle a traced path is clipped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelBounds {
    /// Surface rectangle grown far enough that a stamp of `brush_width`
    /// centred outside it cannot touch the surface. The margin is capped at
    /// `MAX_SURFACE_SIDE`.
    pub fn around_surface(width: u32, height: u32, brush_width: f32) -> Self {
        let half = (brush_width * 0.5).ceil();
        let margin = if half.is_finite() {
            (half.max(0.0) as i32).min(MAX_SURFACE_SIDE as i32) + 1
        } else {
            MAX_SURFACE_SIDE as i32
        };
        let w = width.min(MAX_SURFACE_SIDE) as i32;
        let h = height.min(MAX_SURFACE_SIDE) as i32;
        Self {
            min_x: -margin,
            min_y: -margin,
            max_x: w - 1 + margin,
            max_y: h - 1 + margin,
        }
    }

    pub fn contains(&self, p: PixelPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    fn clamp(&self, x: f64, y: f64) -> PixelPoint {
        PixelPoint {
            x: (x.round() as i64).clamp(self.min_x as i64, self.max_x as i64) as i32,
            y: (y.round() as i64).clamp(self.min_y as i64, self.max_y as i64) as i32,
        }
    }
}

/// Liang-Barsky: the part of segment `a -> b` that lies inside `bounds`.
fn clip_segment(a: PixelPoint, b: PixelPoint, bounds: &PixelBounds) -> Option<(PixelPoint, PixelPoint)> {
    let (x0, y0) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - x0, b.y as f64 - y0);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    let edges = [
        (-dx, x0 - bounds.min_x as f64),
        (dx, bounds.max_x as f64 - x0),
        (-dy, y0 - bounds.min_y as f64),
        (dy, bounds.max_y as f64 - y0),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| bounds.clamp(x0 + dx * t, y0 + dy * t);
    Some((at(t0), at(t1)))
}

/// Fills in the gaps between consecutive snapped points so a fast gesture
/// still produces a continuous line.
///
/// Only the parts of the path inside `bounds` are walked, so the output is
/// bounded by the rectangle's size no matter how far the points reach.
pub fn trace_path(points: &[PixelPoint], bounds: &PixelBounds) -> Vec<PixelPoint> {
    fn push(p: PixelPoint, out: &mut Vec<PixelPoint>) {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }

    let mut out: Vec<PixelPoint> = Vec::with_capacity(points.len() * 2);

    let Some(first) = points.first() else {
        return out;
    };
    if bounds.contains(*first) {
        push(*first, &mut out);
    }

    for pair in points.windows(2) {
        let Some((a, b)) = clip_segment(pair[0], pair[1], bounds) else {
            continue;
        };
        push(a, &mut out);
        let dx = b.x as i64 - a.x as i64;
        let dy = b.y as i64 - a.y as i64;
        let steps = dx.abs().max(dy.abs());
        for s in 1..=steps {
            let f = s as f32 / steps as f32;
            let p = snap_to_pixel(a.x as f32 + dx as f32 * f, a.y as f32 + dy as f32 * f);
            push(p, &mut out);
        }
        push(b, &mut out);
    }
    out
}

fn footprint_mask(
    path: &[PixelPoint],
    width: f32,
    shape: BrushShape,
    surface_w: u32,
    surface_h: u32,
) -> Option<Mask> {
    let mut pb = PathBuilder::new();
    let half = width * 0.5;
    let (sw, sh) = (surface_w as f32, surface_h as f32);

    for p in path {
        // pixel centers sit at +0.5
        let cx = p.x as f32 + 0.5;
        let cy = p.y as f32 + 0.5;
        if cx + half < 0.0 || cy + half < 0.0 || cx - half > sw || cy - half > sh {
            continue;
        }
        let Some(rect) = Rect::from_xywh(cx - half, cy - half, width, width) else {
            continue;
        };
        match shape {
            BrushShape::Square => pb.push_rect(rect),
            BrushShape::Round => pb.push_oval(rect),
        }
    }

    let path = pb.finish()?;
    let mut mask = Mask::new(surface_w, surface_h)?;
    mask.fill_path(&path, FillRule::Winding, false, Transform::identity());
    Some(mask)
}

/// Drops coverage wherever the jittered tile has no ink.
fn apply_pattern(mask: &mut Mask, pattern: PatternId, elapsed_ms: f64, cfg: &JitterConfig) {
    let w = mask.width() as usize;
    for (idx, coverage) in mask.data_mut().iter_mut().enumerate() {
        if *coverage == 0 {
            continue;
        }
        let x = (idx % w) as i32;
        let y = (idx / w) as i32;
        let off = compute_pattern_jitter(x as f32, y as f32, elapsed_ms, cfg);
        let sample = snap_to_pixel(x as f32 - off.dx, y as f32 - off.dy);
        if !pattern.sample(sample.x, sample.y) {
            *coverage = 0;
        }
    }
}

pub fn paint_stroke(
    surface: &mut RasterSurface,
    stroke: &Stroke,
    elapsed_ms: f64,
    cfg: &JitterConfig,
    palette: &Palette,
) {
    if stroke.points.is_empty() {
        return;
    }

    let jittered = apply_jitter_to_stroke(stroke, elapsed_ms, cfg);
    let brush = &stroke.brush;
    let (w, h) = (surface.width(), surface.height());
    let path = trace_path(&jittered, &PixelBounds::around_surface(w, h, brush.width()));

    let Some(mut mask) = footprint_mask(&path, brush.width(), brush.shape(), w, h) else {
        return;
    };

    let mut paint = Paint::default();
    paint.anti_alias = false;
    let opacity = brush.opacity();

    if stroke.is_erase() {
        paint.set_color_rgba8(0, 0, 0, (opacity * 255.0).round() as u8);
        paint.blend_mode = BlendMode::DestinationOut;
    } else {
        if let Some(pattern) = brush.pattern_id() {
            apply_pattern(&mut mask, pattern, elapsed_ms, cfg);
        }
        let [r, g, b, a] = brush.color().resolve(palette);
        let alpha = (a as f32 * opacity).round().clamp(0.0, 255.0) as u8;
        paint.set_color_rgba8(r, g, b, alpha);
        paint.blend_mode = BlendMode::SourceOver;
    }

    if let Some(full) = Rect::from_xywh(0.0, 0.0, w as f32, h as f32) {
        surface
            .pixmap_mut()
            .fill_rect(full, &paint, Transform::identity(), Some(&mask));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{BrushColor, BrushSettings};
    use crate::drawing::{Point, StrokeKind};

    const INK: [u8; 4] = [20, 30, 40, 255];
    const PAPER: [u8; 4] = [250, 250, 250, 255];

    fn still() -> JitterConfig {
        JitterConfig::new(0.0, 0.008)
    }

    fn line(id: u64, kind: StrokeKind, brush: BrushSettings, from: (f32, f32), to: (f32, f32)) -> Stroke {
        Stroke {
            id,
            kind,
            brush,
            points: vec![Point::new(from.0, from.1, 0.0), Point::new(to.0, to.1, 40.0)],
        }
    }

    fn square_pen(width: f32) -> BrushSettings {
        BrushSettings::Solid {
            color: BrushColor::Fixed(INK),
            width,
            opacity: 1.0,
            shape: BrushShape::Square,
        }
    }

    #[test]
    fn trace_fills_gaps() {
        let bounds = PixelBounds::around_surface(8, 8, 1.0);
        let path = trace_path(&[PixelPoint { x: 0, y: 0 }, PixelPoint { x: 4, y: 2 }], &bounds);
        assert_eq!(path.first(), Some(&PixelPoint { x: 0, y: 0 }));
        assert_eq!(path.last(), Some(&PixelPoint { x: 4, y: 2 }));
        assert_eq!(path.len(), 5);
        for pair in path.windows(2) {
            assert!((pair[1].x - pair[0].x).abs() <= 1);
            assert!((pair[1].y - pair[0].y).abs() <= 1);
        }
        assert!(trace_path(&[], &bounds).is_empty());
    }

    #[test]
    fn trace_clips_far_endpoints_to_bounds() {
        let bounds = PixelBounds::around_surface(16, 16, 3.0);
        let far = [
            PixelPoint { x: i32::MIN, y: 5 },
            PixelPoint { x: i32::MAX, y: 5 },
            PixelPoint { x: i32::MAX, y: i32::MIN },
        ];
        let path = trace_path(&far, &bounds);
        assert_eq!(path.first(), Some(&PixelPoint { x: bounds.min_x, y: 5 }));
        assert_eq!(path.last(), Some(&PixelPoint { x: bounds.max_x, y: 5 }));
        assert_eq!(path.len(), (bounds.max_x - bounds.min_x + 1) as usize);
        assert!(path.iter().all(|p| bounds.contains(*p)));

        // entirely outside: nothing to walk
        let outside = [PixelPoint { x: -1_000_000, y: -40 }, PixelPoint { x: 1_000_000, y: -40 }];
        assert!(trace_path(&outside, &bounds).is_empty());
    }

    #[test]
    fn huge_coordinates_still_paint_the_visible_part() {
        let mut surface = RasterSurface::new(64, 64, PAPER).unwrap();
        let drawing = Drawing::empty(64, 64).with_stroke(line(
            1,
            StrokeKind::Draw,
            square_pen(1.0),
            (-3.0e9, 10.0),
            (3.0e9, 10.0),
        ));
        paint_drawing(&mut surface, &drawing, 0.0, &still(), &Palette::default());
        let px = surface.read_pixels();
        for x in 0..64 {
            assert_eq!(px.pixel(x, 10), Some(INK), "gap at x={x}");
        }
        assert_eq!(px.pixel(5, 11), Some(PAPER));
    }

    #[test]
    fn solid_line_covers_its_path() {
        let mut surface = RasterSurface::new(32, 16, PAPER).unwrap();
        let drawing = Drawing::empty(32, 16).with_stroke(line(
            1,
            StrokeKind::Draw,
            square_pen(1.0),
            (2.0, 5.0),
            (20.0, 5.0),
        ));
        paint_drawing(&mut surface, &drawing, 0.0, &still(), &Palette::default());
        let px = surface.read_pixels();
        for x in 2..=20 {
            assert_eq!(px.pixel(x, 5), Some(INK), "gap at x={x}");
        }
        assert_eq!(px.pixel(1, 5), Some(PAPER));
        assert_eq!(px.pixel(10, 6), Some(PAPER));
    }

    #[test]
    fn eraser_reveals_background() {
        let mut surface = RasterSurface::new(16, 16, PAPER).unwrap();
        let drawing = Drawing::empty(16, 16)
            .with_stroke(line(1, StrokeKind::Draw, square_pen(5.0), (2.0, 8.0), (13.0, 8.0)))
            .with_stroke(line(2, StrokeKind::Erase, square_pen(1.0), (8.0, 0.0), (8.0, 15.0)));
        paint_drawing(&mut surface, &drawing, 0.0, &JitterConfig::default(), &Palette::default());
        let px = surface.read_pixels();
        assert_eq!(px.pixel(8, 8), Some(PAPER));
        assert_eq!(px.pixel(7, 8), Some(INK));
        assert_eq!(px.pixel(9, 8), Some(INK));
    }

    #[test]
    fn repaint_does_not_accumulate() {
        let mut surface = RasterSurface::new(24, 24, PAPER).unwrap();
        let cfg = JitterConfig::new(2.0, 0.008);
        let drawing = Drawing::empty(24, 24).with_stroke(line(
            1,
            StrokeKind::Draw,
            BrushSettings::pen(BrushColor::Palette(2), 3.0),
            (4.0, 4.0),
            (18.0, 16.0),
        ));
        paint_drawing(&mut surface, &drawing, 0.0, &cfg, &Palette::default());
        let first = surface.read_pixels();
        paint_drawing(&mut surface, &drawing, 300.0, &cfg, &Palette::default());
        paint_drawing(&mut surface, &drawing, 0.0, &cfg, &Palette::default());
        assert_eq!(surface.read_pixels(), first);
    }

    #[test]
    fn half_opacity_stroke_does_not_darken_on_overlap() {
        let mut surface = RasterSurface::new(16, 8, [255, 255, 255, 255]).unwrap();
        let brush = BrushSettings::Solid {
            color: BrushColor::Fixed([0, 0, 0, 255]),
            width: 3.0,
            opacity: 0.5,
            shape: BrushShape::Round,
        };
        let drawing = Drawing::empty(16, 8).with_stroke(line(1, StrokeKind::Draw, brush, (2.0, 4.0), (12.0, 4.0)));
        paint_drawing(&mut surface, &drawing, 0.0, &still(), &Palette::default());
        let px = surface.read_pixels();
        let a = px.pixel(4, 4).unwrap();
        let b = px.pixel(9, 4).unwrap();
        assert_eq!(a, b);
        assert!(a[0] > 100 && a[0] < 160);
    }

    #[test]
    fn pattern_fill_leaves_holes() {
        let mut surface = RasterSurface::new(32, 32, PAPER).unwrap();
        let brush = BrushSettings::pattern(BrushColor::Fixed(INK), 12.0, PatternId::Checker);
        let drawing = Drawing::empty(32, 32).with_stroke(line(1, StrokeKind::Draw, brush, (8.0, 16.0), (24.0, 16.0)));
        paint_drawing(&mut surface, &drawing, 0.0, &still(), &Palette::default());
        let px = surface.read_pixels();
        let mut inked = 0;
        let mut blank = 0;
        for x in 10..22 {
            match px.pixel(x, 16) {
                Some(INK) => inked += 1,
                Some(PAPER) => blank += 1,
                other => panic!("unexpected pixel {other:?}"),
            }
        }
        assert!(inked > 0 && blank > 0);
        // checker with zero jitter: ink exactly where x + y is even
        assert_eq!(px.pixel(12, 16), Some(INK));
        assert_eq!(px.pixel(13, 16), Some(PAPER));
    }

    #[test]
    fn strokes_outside_the_surface_are_skipped() {
        let mut surface = RasterSurface::new(8, 8, PAPER).unwrap();
        let drawing = Drawing::empty(8, 8).with_stroke(line(
            1,
            StrokeKind::Draw,
            square_pen(2.0),
            (100.0, 100.0),
            (120.0, 100.0),
        ));
        paint_drawing(&mut surface, &drawing, 0.0, &still(), &Palette::default());
        let px = surface.read_pixels();
        assert!(px.data.chunks(4).all(|c| c == PAPER));
    }
}
