use crate::braille::BrailleCanvas;
use crate::map::Rgb;

/// A projected vertex: canvas pixel position plus NDC depth
pub type ScreenPoint = (f64, f64, f64);

/// 4x4 ordered-dither thresholds
const BAYER: [[f64; 4]; 4] = [
    [0.0 / 16.0, 8.0 / 16.0, 2.0 / 16.0, 10.0 / 16.0],
    [12.0 / 16.0, 4.0 / 16.0, 14.0 / 16.0, 6.0 / 16.0],
    [3.0 / 16.0, 11.0 / 16.0, 1.0 / 16.0, 9.0 / 16.0],
    [15.0 / 16.0, 7.0 / 16.0, 13.0 / 16.0, 5.0 / 16.0],
];

/// Whether the dot at (x, y) is raised for a coverage `level` in [0, 1]
#[inline(always)]
pub fn dither(x: i32, y: i32, level: f64) -> bool {
    level > BAYER[y.rem_euclid(4) as usize][x.rem_euclid(4) as usize]
}

/// Clip a segment to the rectangle `[0, max_x] x [0, max_y]` (Liang-Barsky),
/// carrying depth along. `None` when nothing of it is inside.
pub fn clip_segment(p0: ScreenPoint, p1: ScreenPoint, max_x: f64, max_y: f64) -> Option<(ScreenPoint, ScreenPoint)> {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [(-dx, p0.0), (dx, max_x - p0.0), (-dy, p0.1), (dy, max_y - p0.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    let at = |t: f64| (p0.0 + dx * t, p0.1 + dy * t, p0.2 + (p1.2 - p0.2) * t);
    Some((at(t0), at(t1)))
}

/// Draw a line using Bresenham's algorithm, interpolating depth.
/// The segment is clipped to the canvas first, so only visible dots are walked.
pub fn draw_line(canvas: &mut BrailleCanvas, p0: ScreenPoint, p1: ScreenPoint, color: Rgb) {
    let max_x = canvas.pixel_width() as f64 - 1.0;
    let max_y = canvas.pixel_height() as f64 - 1.0;
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let Some((p0, p1)) = clip_segment(p0, p1, max_x, max_y) else {
        return;
    };

    let (x0, y0) = (p0.0.round() as i32, p0.1.round() as i32);
    let (x1, y1) = (p1.0.round() as i32, p1.1.round() as i32);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let steps = dx.max(-dy).max(1) as f64;

    let mut x = x0;
    let mut y = y0;
    let mut step = 0.0;

    loop {
        let depth = p0.2 + (p1.2 - p0.2) * (step / steps);
        canvas.plot(x, y, depth, true, color);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
        step += 1.0;
    }
}

/// Rasterize a triangle with depth test. Dots are raised according to the
/// ordered dither at `coverage`; unraised dots still occlude.
pub fn fill_triangle(canvas: &mut BrailleCanvas, tri: [ScreenPoint; 3], coverage: f64, color: Rgb) {
    let [a, b, c] = tri;
    let area = edge(a, b, c.0, c.1);
    if area.abs() < 1e-9 {
        return;
    }

    let min_x = a.0.min(b.0).min(c.0).floor().max(0.0) as i32;
    let min_y = a.1.min(b.1).min(c.1).floor().max(0.0) as i32;
    let max_x = (a.0.max(b.0).max(c.0).ceil() as i32).min(canvas.pixel_width() as i32 - 1);
    let max_y = (a.1.max(b.1).max(c.1).ceil() as i32).min(canvas.pixel_height() as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge(b, c, px, py) / area;
            let w1 = edge(c, a, px, py) / area;
            let w2 = edge(a, b, px, py) / area;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }
            let depth = w0 * a.2 + w1 * b.2 + w2 * c.2;
            canvas.plot(x, y, depth, dither(x, y, coverage), color);
        }
    }
}

#[inline(always)]
fn edge(a: ScreenPoint, b: ScreenPoint, px: f64, py: f64) -> f64 {
    (b.0 - a.0) * (py - a.1) - (b.1 - a.1) * (px - a.0)
}
