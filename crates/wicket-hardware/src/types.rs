//! Common types shared across hardware capability implementations.

use wicket_core::constants::{KEYPAD_COLS, KEYPAD_ROWS};

/// One poll-tick snapshot of the keypad matrix.
///
/// `true` means the line at that row/column position read active during
/// this sample. The scanner interprets these; a sample carries no
/// debounce state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanSample {
    active: [[bool; KEYPAD_COLS]; KEYPAD_ROWS],
}

impl ScanSample {
    /// A sample with no active lines.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// A sample with exactly one active position.
    ///
    /// Out-of-range positions saturate to the matrix edge; callers are
    /// expected to pass valid coordinates.
    #[must_use]
    pub fn single(row: usize, col: usize) -> Self {
        let mut sample = Self::default();
        sample.set(row, col, true);
        sample
    }

    /// Set the state of one position. Out-of-range positions are ignored.
    pub fn set(&mut self, row: usize, col: usize, active: bool) {
        if let Some(cell) = self
            .active
            .get_mut(row)
            .and_then(|r: &mut [bool; KEYPAD_COLS]| r.get_mut(col))
        {
            *cell = active;
        }
    }

    /// Read the state of one position. Out-of-range reads are inactive.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> bool {
        self.active
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Check whether any line is active.
    #[must_use]
    pub fn any_active(&self) -> bool {
        self.active.iter().flatten().any(|&a| a)
    }

    /// First active position in row-major scan order, if any.
    ///
    /// Multi-key input is undefined behavior for this keypad class; the
    /// scanner reports only this first position.
    #[must_use]
    pub fn first_active(&self) -> Option<(usize, usize)> {
        for (row, cols) in self.active.iter().enumerate() {
            for (col, &active) in cols.iter().enumerate() {
                if active {
                    return Some((row, col));
                }
            }
        }
        None
    }
}

/// Rectangular region within an image, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A captured camera frame.
///
/// Grayscale, row-major pixel data. Opaque to the pipeline; only the
/// detector and matcher interpret the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RawImage {
    #[must_use]
    pub fn new(pixels: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            pixels,
            width,
            height,
        }
    }
}

/// A detected face region cropped from an image.
///
/// Lives only for the duration of one verification; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceRegion {
    pub pixels: Vec<u8>,
    pub bounds: Rect,
}

impl FaceRegion {
    #[must_use]
    pub fn new(pixels: Vec<u8>, bounds: Rect) -> Self {
        Self { pixels, bounds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_sample_has_no_active_lines() {
        let sample = ScanSample::idle();
        assert!(!sample.any_active());
        assert_eq!(sample.first_active(), None);
    }

    #[test]
    fn test_single_sample() {
        let sample = ScanSample::single(2, 1);
        assert!(sample.any_active());
        assert!(sample.get(2, 1));
        assert!(!sample.get(1, 2));
        assert_eq!(sample.first_active(), Some((2, 1)));
    }

    #[test]
    fn test_first_active_is_row_major() {
        let mut sample = ScanSample::idle();
        sample.set(2, 3, true);
        sample.set(1, 0, true);
        sample.set(1, 2, true);
        // Row 1 before row 2; column 0 before column 2.
        assert_eq!(sample.first_active(), Some((1, 0)));
    }

    #[test]
    fn test_out_of_range_positions_are_inert() {
        let mut sample = ScanSample::idle();
        sample.set(9, 9, true);
        assert!(!sample.any_active());
        assert!(!sample.get(9, 9));
    }
}
