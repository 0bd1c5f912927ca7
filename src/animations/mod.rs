pub mod jitter;

pub use jitter::{
    apply_jitter_to_stroke, compute_pattern_jitter, compute_point_jitter, snap_to_pixel, Offset,
    PixelPoint,
};
