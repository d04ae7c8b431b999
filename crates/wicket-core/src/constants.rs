//! Controller-wide constants.
//!
//! Default values mirror the reference edge deployment: a 4x4 membrane
//! keypad wired to GPIO lines, a 4-digit PIN, and an LBPH-style face
//! matcher whose confidence is a distance (lower means closer).

// ============================================================================
// Keypad Geometry
// ============================================================================

/// Number of keypad rows.
pub const KEYPAD_ROWS: usize = 4;

/// Number of keypad columns.
pub const KEYPAD_COLS: usize = 4;

/// Physical key layout, row-major.
///
/// Rows top to bottom, columns left to right:
///
/// ```text
/// 1 2 3 A
/// 4 5 6 B
/// 7 8 9 C
/// * 0 # D
/// ```
pub const KEYPAD_LAYOUT: [[char; KEYPAD_COLS]; KEYPAD_ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

// ============================================================================
// Scan Timing
// ============================================================================

/// Default polling interval for the matrix scan loop (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Consecutive active samples required before a key press is confirmed.
///
/// One poll interval of settle time after the initial edge is enough for
/// membrane keypads; contact bounce rarely exceeds 5ms.
pub const DEFAULT_DEBOUNCE_SAMPLES: u32 = 2;

// ============================================================================
// PIN Entry
// ============================================================================

/// Default PIN length in digits.
pub const DEFAULT_PIN_LENGTH: usize = 4;

/// Idle timeout for a partially entered PIN (milliseconds).
///
/// A stale partial entry is discarded after this much inactivity so it
/// cannot leak into a later session.
pub const DEFAULT_PIN_IDLE_TIMEOUT_MS: u64 = 10_000;

// ============================================================================
// Face Verification
// ============================================================================

/// Default matcher decision threshold.
///
/// Calibrated for LBPH confidence output where the score is a distance.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 60.0;

/// Default number of live-capture attempts before giving up.
pub const DEFAULT_CAPTURE_ATTEMPTS: u32 = 3;

/// Default wall-clock budget for acquiring one live sample (milliseconds).
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Audit Trail
// ============================================================================

/// Default path of the local append-only decision log.
pub const DEFAULT_AUDIT_LOG_PATH: &str = "logs/access.log";

/// Budget for one best-effort remote publish attempt (milliseconds).
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 3_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_dimensions() {
        assert_eq!(KEYPAD_LAYOUT.len(), KEYPAD_ROWS);
        for row in &KEYPAD_LAYOUT {
            assert_eq!(row.len(), KEYPAD_COLS);
        }
    }

    #[test]
    fn test_layout_has_all_sixteen_glyphs() {
        let mut glyphs: Vec<char> = KEYPAD_LAYOUT.iter().flatten().copied().collect();
        glyphs.sort_unstable();
        glyphs.dedup();
        assert_eq!(glyphs.len(), 16);
    }
}
