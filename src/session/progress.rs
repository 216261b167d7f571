/// Highest value a progress update can display before completion
pub const MAX_LIVE_PERCENT: i32 = 99;

/// Displayed processing percentage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressTracker {
    percent: i32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `min(99, floor(value))`
    ///
    /// No lower bound and no monotonicity: a smaller value overwrites a
    /// larger one. NaN is stored as 0.
    pub fn set(&mut self, value: f64) {
        if value.is_nan() {
            self.percent = 0;
            return;
        }
        // `as` saturates at i32::MIN for very negative input
        self.percent = value.floor().min(MAX_LIVE_PERCENT as f64) as i32;
    }

    /// Completion bypasses the live clamp
    pub fn force_complete(&mut self) {
        self.percent = 100;
    }

    pub fn reset(&mut self) {
        self.percent = 0;
    }

    pub fn percent(&self) -> i32 {
        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_floors_and_clamps() {
        let mut progress = ProgressTracker::new();

        progress.set(42.9);
        assert_eq!(progress.percent(), 42);

        progress.set(99.9);
        assert_eq!(progress.percent(), 99);

        progress.set(250.0);
        assert_eq!(progress.percent(), 99);
    }

    #[test]
    fn test_set_allows_regression() {
        let mut progress = ProgressTracker::new();
        progress.set(80.0);
        progress.set(30.5);
        assert_eq!(progress.percent(), 30);
    }

    #[test]
    fn test_set_handles_odd_inputs() {
        let mut progress = ProgressTracker::new();

        progress.set(-3.2);
        assert_eq!(progress.percent(), -4);

        progress.set(f64::NAN);
        assert_eq!(progress.percent(), 0);
    }

    #[test]
    fn test_force_complete_and_reset() {
        let mut progress = ProgressTracker::new();
        progress.set(120.0);
        progress.force_complete();
        assert_eq!(progress.percent(), 100);

        progress.reset();
        assert_eq!(progress, ProgressTracker::new());
    }
}
