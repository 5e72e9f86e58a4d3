use crate::threshold::ThresholdRecord;

/// Run-level counters across many images.
///
/// Each completed image contributes exactly one `accumulate` call, so a
/// retried image never leaves partial counts behind. Partial totals from
/// parallel workers combine with `merge`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful images whose GMM fit fell back to Otsu.
    pub gmm_fallbacks: usize,
}

impl RunStats {
    /// Count one finished image: `Some(record)` on success, `None` on failure.
    pub fn accumulate(mut self, outcome: Option<&ThresholdRecord>) -> Self {
        self.attempted += 1;
        match outcome {
            Some(record) => {
                self.succeeded += 1;
                if record.is_fallback() {
                    self.gmm_fallbacks += 1;
                }
            }
            None => self.failed += 1,
        }
        self
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            attempted: self.attempted + other.attempted,
            succeeded: self.succeeded + other.succeeded,
            failed: self.failed + other.failed,
            gmm_fallbacks: self.gmm_fallbacks + other.gmm_fallbacks,
        }
    }
}
