//! Deterministic wiggle offsets.
//!
//! Every offset is a short sum of sines whose angular speeds are whole
//! multiples of `2π / cycle_duration_ms()`, and time is wrapped into one
//! cycle before anything else happens. That makes the wiggle exactly
//! periodic: the value at `t` and at `t + cycle` is bit-for-bit the same,
//! which is what lets the export reproduce the live loop.
//!
//! Randomness comes from hashing stable inputs, never from a generator with
//! state, so any frame can be recomputed at any time.

use crate::constants::{cycle_duration_ms, wrap_elapsed_ms};
use crate::drawing::{JitterConfig, Point, Stroke};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Displacement in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub dx: f32,
    pub dy: f32,
}

/// A jittered point after snapping to the pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

const PRIMARY_WEIGHT: f64 = 0.65;
const OVERTONE_WEIGHT: f64 = 0.35;

// Spatial phase gradients (radians per pixel) for pattern jitter. Small
// values keep neighbouring pixels in step so a filled texture sways as one.
const PATTERN_PHASE_X: (f64, f64) = (0.045, 0.027);
const PATTERN_PHASE_Y: (f64, f64) = (0.031, -0.052);

/// Whole number of oscillations per loop for the configured frequency.
pub fn harmonic(cfg: &JitterConfig) -> u32 {
    let f = cfg.frequency as f64;
    if !f.is_finite() {
        return 1;
    }
    let k = (f.abs() * cycle_duration_ms() / TAU).round();
    k.clamp(1.0, 64.0) as u32
}

fn amplitude(cfg: &JitterConfig) -> f64 {
    let a = cfg.amplitude as f64;
    if a.is_finite() && a > 0.0 {
        a
    } else {
        0.0
    }
}

/// SplitMix64 finaliser.
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// `+ 0.0` folds -0.0 into 0.0 so both hash alike.
fn float_key(v: f32) -> u64 {
    (v + 0.0).to_bits() as u64
}

fn point_seed(p: &Point) -> u64 {
    mix64(float_key(p.x) ^ mix64(float_key(p.y) ^ mix64(float_key(p.t))))
}

fn phase(seed: u64, lane: u32) -> f64 {
    let bits = (seed >> (lane * 16)) & 0xffff;
    bits as f64 / 65536.0 * TAU
}

fn wiggle(cfg: &JitterConfig, elapsed_ms: f64, phases: [f64; 4]) -> Offset {
    let amp = amplitude(cfg);
    if amp == 0.0 {
        return Offset::default();
    }
    let omega = TAU * harmonic(cfg) as f64 / cycle_duration_ms();
    let a = omega * wrap_elapsed_ms(elapsed_ms);
    let dx = PRIMARY_WEIGHT * (a + phases[0]).sin() + OVERTONE_WEIGHT * (2.0 * a + phases[1]).sin();
    let dy = PRIMARY_WEIGHT * (a + phases[2]).cos() + OVERTONE_WEIGHT * (2.0 * a + phases[3]).cos();
    Offset {
        dx: (amp * dx) as f32,
        dy: (amp * dy) as f32,
    }
}

/// Offset for a pen point. Seeded by the point's coordinates and timestamp,
/// so points along a stroke wiggle independently.
pub fn compute_point_jitter(point: &Point, elapsed_ms: f64, cfg: &JitterConfig) -> Offset {
    let seed = point_seed(point);
    wiggle(
        cfg,
        elapsed_ms,
        [phase(seed, 0), phase(seed, 1), phase(seed, 2), phase(seed, 3)],
    )
}

/// Offset for a pattern pixel. Depends on `(x, y)` only, never on which
/// stroke the pixel belongs to.
pub fn compute_pattern_jitter(x: f32, y: f32, elapsed_ms: f64, cfg: &JitterConfig) -> Offset {
    let (x, y) = (x as f64, y as f64);
    let px = x * PATTERN_PHASE_X.0 + y * PATTERN_PHASE_Y.0;
    let py = x * PATTERN_PHASE_X.1 + y * PATTERN_PHASE_Y.1;
    wiggle(cfg, elapsed_ms, [px, 1.7 * py, py, 1.3 * px])
}

/// Rounds to the nearest pixel, halves away from zero.
pub fn snap_to_pixel(x: f32, y: f32) -> PixelPoint {
    PixelPoint {
        x: x.round() as i32,
        y: y.round() as i32,
    }
}

/// Jittered, pixel-snapped copy of a stroke's path at `elapsed_ms`.
///
/// Erase strokes pass through untouched (only snapped) because the eraser
/// has to follow the exact contact position.
pub fn apply_jitter_to_stroke(stroke: &Stroke, elapsed_ms: f64, cfg: &JitterConfig) -> Vec<PixelPoint> {
    stroke
        .points
        .iter()
        .map(|p| {
            let off = if stroke.is_erase() {
                Offset::default()
            } else if stroke.brush.is_pattern() {
                compute_pattern_jitter(p.x, p.y, elapsed_ms, cfg)
            } else {
                compute_point_jitter(p, elapsed_ms, cfg)
            };
            snap_to_pixel(p.x + off.dx, p.y + off.dy)
        })
        .collect()
}
