//! Mock keypad line source.

use crate::error::{HardwareError, Result};
use crate::traits::LineSource;
use crate::types::ScanSample;
use std::collections::VecDeque;

/// Script-driven line source.
///
/// Samples are consumed front to back; once the script runs dry the
/// source reads idle forever. A scripted fault makes every subsequent
/// read fail, simulating an unreadable GPIO bank.
///
/// # Examples
///
/// ```
/// use wicket_hardware::mock::MockLineSource;
/// use wicket_hardware::traits::LineSource;
///
/// let mut lines = MockLineSource::new();
/// lines.press(0, 0, 3); // key "1" held for three polls
/// lines.release(1);
///
/// let sample = lines.sample().unwrap();
/// assert!(sample.get(0, 0));
/// ```
#[derive(Debug, Default)]
pub struct MockLineSource {
    script: VecDeque<ScanSample>,
    faulted: bool,
}

impl MockLineSource {
    /// Create an empty (idle) line source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw sample to the script.
    pub fn push_sample(&mut self, sample: ScanSample) -> &mut Self {
        self.script.push_back(sample);
        self
    }

    /// Append `polls` samples with the key at (`row`, `col`) active.
    pub fn press(&mut self, row: usize, col: usize, polls: usize) -> &mut Self {
        for _ in 0..polls {
            self.script.push_back(ScanSample::single(row, col));
        }
        self
    }

    /// Append `polls` idle samples.
    pub fn release(&mut self, polls: usize) -> &mut Self {
        for _ in 0..polls {
            self.script.push_back(ScanSample::idle());
        }
        self
    }

    /// Make every subsequent sample fail with a line fault.
    pub fn fail_from_now(&mut self) -> &mut Self {
        self.faulted = true;
        self
    }

    /// Number of scripted samples not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl LineSource for MockLineSource {
    fn sample(&mut self) -> Result<ScanSample> {
        if self.faulted && self.script.is_empty() {
            return Err(HardwareError::line_fault("mock line source faulted"));
        }
        Ok(self.script.pop_front().unwrap_or_else(ScanSample::idle))
    }
}
