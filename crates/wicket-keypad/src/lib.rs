//! Keypad input path: matrix scanning, debounce, and PIN assembly.
//!
//! [`KeyScanner`] turns raw line-state samples into debounced key
//! events; [`PinAccumulator`] folds those events into validated
//! fixed-length PIN submissions.

pub mod accumulator;
pub mod scanner;

pub use accumulator::{AccumulatorState, PinAccumulator, PinEvent};
pub use scanner::KeyScanner;
