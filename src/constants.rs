//! Loop timing shared by live playback and GIF export.
//!
//! Both sides must read these values from here: if the scheduler and the
//! exporter ever disagree on the cycle, exported frames stop matching what
//! the canvas showed.

/// Number of frames in one wiggle loop.
pub const CYCLE_COUNT: usize = 8;

/// Spacing between two cycle frames, in milliseconds.
pub const CYCLE_INTERVAL_MS: u32 = 100;

/// Length of one full loop in milliseconds.
pub fn cycle_duration_ms() -> f64 {
    (CYCLE_COUNT as u32 * CYCLE_INTERVAL_MS) as f64
}

/// Frame rate written into exported GIFs: `round(1000 / CYCLE_INTERVAL_MS)`.
pub fn export_fps() -> u32 {
    (1000.0 / CYCLE_INTERVAL_MS as f64).round() as u32
}

/// Elapsed time that cycle frame `index` stands for.
pub fn cycle_elapsed_ms(index: usize) -> f64 {
    (index % CYCLE_COUNT) as f64 * CYCLE_INTERVAL_MS as f64
}

/// Wraps an arbitrary elapsed time into `[0, cycle_duration_ms())`.
pub fn wrap_elapsed_ms(elapsed_ms: f64) -> f64 {
    if !elapsed_ms.is_finite() {
        return 0.0;
    }
    elapsed_ms.rem_euclid(cycle_duration_ms())
}

/// Cycle frame shown at `elapsed_ms`.
pub fn cycle_index_at(elapsed_ms: f64) -> usize {
    let idx = (wrap_elapsed_ms(elapsed_ms) / CYCLE_INTERVAL_MS as f64).floor() as usize;
    idx.min(CYCLE_COUNT - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_matches_interval() {
        assert_eq!(export_fps(), 10);
        assert_eq!(cycle_duration_ms(), 800.0);
    }

    #[test]
    fn index_wraps_around_the_loop() {
        assert_eq!(cycle_index_at(0.0), 0);
        assert_eq!(cycle_index_at(99.9), 0);
        assert_eq!(cycle_index_at(100.0), 1);
        assert_eq!(cycle_index_at(799.0), CYCLE_COUNT - 1);
        assert_eq!(cycle_index_at(800.0), 0);
        assert_eq!(cycle_index_at(-100.0), CYCLE_COUNT - 1);
    }

    #[test]
    fn elapsed_for_index_is_inverse_of_index_at() {
        for i in 0..CYCLE_COUNT {
            assert_eq!(cycle_index_at(cycle_elapsed_ms(i)), i);
        }
        assert_eq!(cycle_elapsed_ms(CYCLE_COUNT), 0.0);
    }
}
