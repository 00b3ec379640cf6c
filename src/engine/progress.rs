/// Simulated wait progress, advanced on a fixed client-side tick.
///
/// Deliberately unrelated to real backend progress: the contract is monotonic
/// increase while a job is outstanding (clamped at 100) and an immediate
/// reset when it is not. With the default step of 100/80 per second the bar
/// fills after roughly 80 seconds.
#[derive(Debug)]
pub struct ProgressEstimator {
    percent: f64,
    step: f64,
}

impl ProgressEstimator {
    pub const DEFAULT_STEP: f64 = 100.0 / 80.0;

    pub fn new(step: f64) -> Self {
        Self { percent: 0.0, step }
    }

    /// Advance one tick and return the new estimate.
    pub fn advance(&mut self) -> f64 {
        self.percent = (self.percent + self.step).min(100.0);
        self.percent
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn reset(&mut self) {
        self.percent = 0.0;
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_STEP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_monotonically_and_clamps_at_100() {
        let mut p = ProgressEstimator::default();
        let mut last = 0.0;
        for _ in 0..200 {
            let v = p.advance();
            assert!(v >= last);
            assert!(v <= 100.0);
            last = v;
        }
        assert_eq!(p.percent(), 100.0);
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut p = ProgressEstimator::new(10.0);
        p.advance();
        p.advance();
        assert_eq!(p.percent(), 20.0);
        p.reset();
        assert_eq!(p.percent(), 0.0);
    }
}
