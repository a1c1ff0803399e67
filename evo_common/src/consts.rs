//! System-wide constants for the EVO motion core.
//!
//! Single source of truth for axis bounds and cycle-time limits.

use static_assertions::const_assert_eq;

/// Maximum number of coordinate axes (compile-time bound).
pub const MAX_AXIS: usize = 9;

/// Axis letters in index order.
pub const AXIS_LETTERS: [char; MAX_AXIS] = ['X', 'Y', 'Z', 'A', 'B', 'C', 'U', 'V', 'W'];

const_assert_eq!(AXIS_LETTERS.len(), MAX_AXIS);

/// Default servo cycle time in microseconds (1 kHz = 1000 µs).
pub const CYCLE_TIME_US: u32 = 1000;

/// Shortest accepted servo cycle [µs].
pub const CYCLE_TIME_US_MIN: u32 = 100;

/// Longest accepted servo cycle [µs].
pub const CYCLE_TIME_US_MAX: u32 = 10_000;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/evo/motion.toml";

/// Resolve an axis letter (case-insensitive) to its index.
pub fn axis_index(letter: char) -> Option<usize> {
    let upper = letter.to_ascii_uppercase();
    AXIS_LETTERS.iter().position(|&l| l == upper)
}

/// Axis letter for an index, if in range.
pub fn axis_letter(index: usize) -> Option<char> {
    AXIS_LETTERS.get(index).copied()
}
