use crate::config::RrConfig;
use crate::constants::RR_HISTORY;

/// Overall rhythm verdict derived from the RR history.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RhythmAssessment {
    /// No RR data yet.
    Undetermined = 0,
    Regular = 1,
    Irregular = 2,
}

/// Sliding-window RR interval tracker.
///
/// Keeps the last eight RR intervals twice over: `intervals` takes every
/// accepted beat-to-beat gap, `normal_intervals` only those inside the
/// current acceptance band. The two averages diverge when the rhythm
/// drifts, which is what the regularity flag measures. The acceptance
/// band and the miss timeout are re-derived from the normal-range average
/// after every accepted interval (0.92x / 1.16x / 1.66x).
pub struct RrTracker {
    intervals: [f32; RR_HISTORY],
    normal_intervals: [f32; RR_HISTORY],
    average: f32,
    normal_average: f32,
    low: f32,
    high: f32,
    miss: f32,
    valid_count: usize,
    normal_count: usize,
    skip_remaining: u32,
    regular: bool,
    prev_regular: bool,
    tolerance: f32,
}

impl RrTracker {
    pub fn new(config: &RrConfig) -> Self {
        Self {
            intervals: [0.0; RR_HISTORY],
            normal_intervals: [0.0; RR_HISTORY],
            average: 0.0,
            normal_average: 0.0,
            low: config.low_init,
            high: config.high_init,
            miss: 0.0,
            valid_count: 0,
            normal_count: 0,
            skip_remaining: config.startup_skip,
            regular: true,
            prev_regular: true,
            tolerance: config.regularity_tolerance,
        }
    }

    /// Record one accepted RR interval, in samples.
    ///
    /// Returns `true` when this beat flipped the rhythm from regular to
    /// irregular; the caller reacts by relaxing its detection thresholds.
    pub fn record(&mut self, interval: f32) -> bool {
        if self.skip_remaining > 0 {
            // The earliest intervals span the filter transient and the
            // threshold warm-up; they are not representative.
            self.skip_remaining -= 1;
            return false;
        }

        shift_append(&mut self.intervals, interval);
        if self.valid_count < RR_HISTORY {
            self.valid_count += 1;
        }
        self.average = tail_mean(&self.intervals, self.valid_count);

        if interval >= self.low && interval <= self.high {
            shift_append(&mut self.normal_intervals, interval);
            if self.normal_count < RR_HISTORY {
                self.normal_count += 1;
            }
            self.normal_average = tail_mean(&self.normal_intervals, self.normal_count);
            self.low = 0.92 * self.normal_average;
            self.high = 1.16 * self.normal_average;
            self.miss = 1.66 * self.normal_average;
        }

        self.prev_regular = self.regular;
        self.regular = (self.average - self.normal_average).abs() <= self.tolerance;
        self.prev_regular && !self.regular
    }

    /// Mean of the recorded RR intervals, in samples; zero until the
    /// first interval lands.
    pub fn average(&self) -> f32 {
        self.average
    }

    /// Mean of the normal-range RR intervals, in samples.
    pub fn normal_average(&self) -> f32 {
        self.normal_average
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    /// Miss timeout in samples; zero until a normal-range average exists.
    pub fn miss(&self) -> f32 {
        self.miss
    }

    pub fn regular(&self) -> bool {
        self.regular
    }

    pub fn assessment(&self) -> RhythmAssessment {
        if self.valid_count == 0 {
            RhythmAssessment::Undetermined
        } else if self.regular {
            RhythmAssessment::Regular
        } else {
            RhythmAssessment::Irregular
        }
    }
}

fn shift_append(window: &mut [f32; RR_HISTORY], value: f32) {
    window.copy_within(1.., 0);
    window[RR_HISTORY - 1] = value;
}

// Mean of the `count` newest entries; the rest of the window is still
// zero-filled while the history builds up.
fn tail_mean(window: &[f32; RR_HISTORY], count: usize) -> f32 {
    let count = count.clamp(1, RR_HISTORY);
    window[RR_HISTORY - count..].iter().sum::<f32>() / count as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tracker() -> RrTracker {
        RrTracker::new(&RrConfig::default())
    }

    fn tracker_no_skip() -> RrTracker {
        let config = RrConfig {
            startup_skip: 0,
            ..RrConfig::default()
        };
        RrTracker::new(&config)
    }

    #[test]
    fn test_startup_intervals_are_discarded() {
        let mut rr = tracker();
        for _ in 0..7 {
            assert!(!rr.record(150.0));
            assert_eq!(rr.average(), 0.0);
            assert_eq!(rr.assessment(), RhythmAssessment::Undetermined);
        }
        rr.record(150.0);
        assert_relative_eq!(rr.average(), 150.0);
        assert_eq!(rr.assessment(), RhythmAssessment::Regular);
    }

    #[test]
    fn test_average_over_partial_history() {
        let mut rr = tracker_no_skip();
        rr.record(100.0);
        assert_relative_eq!(rr.average(), 100.0);
        rr.record(140.0);
        assert_relative_eq!(rr.average(), 120.0);
        rr.record(180.0);
        assert_relative_eq!(rr.average(), 140.0);
    }

    #[test]
    fn test_average_slides_once_history_is_full() {
        let mut rr = tracker_no_skip();
        for _ in 0..8 {
            rr.record(200.0);
        }
        assert_relative_eq!(rr.average(), 200.0);
        rr.record(120.0);
        // One 120 against seven 200s.
        assert_relative_eq!(rr.average(), (7.0 * 200.0 + 120.0) / 8.0);
    }

    #[test]
    fn test_bounds_follow_the_normal_average() {
        let mut rr = tracker_no_skip();
        rr.record(150.0);
        assert_relative_eq!(rr.normal_average(), 150.0);
        assert_relative_eq!(rr.low(), 0.92 * 150.0);
        assert_relative_eq!(rr.high(), 1.16 * 150.0);
        assert_relative_eq!(rr.miss(), 1.66 * 150.0);
    }

    #[test]
    fn test_out_of_band_interval_skips_normal_window() {
        let mut rr = tracker_no_skip();
        for _ in 0..4 {
            rr.record(150.0);
        }
        let (low, high) = (rr.low(), rr.high());
        // 90 is below 0.92 * 150 = 138: rr1 takes it, rr2 does not.
        rr.record(90.0);
        assert_relative_eq!(rr.normal_average(), 150.0);
        assert_eq!(rr.low(), low);
        assert_eq!(rr.high(), high);
        assert_relative_eq!(rr.average(), (4.0 * 150.0 + 90.0) / 5.0);
    }

    #[test]
    fn test_regularity_flip_reported_once() {
        let mut rr = tracker_no_skip();
        for _ in 0..8 {
            assert!(!rr.record(150.0));
            assert!(rr.regular());
        }
        // Sudden shortening: outside [138, 174], so only rr1 moves.
        let flipped = rr.record(90.0);
        assert!(flipped, "regular -> irregular must be reported");
        assert!(!rr.regular());
        assert_eq!(rr.assessment(), RhythmAssessment::Irregular);
        // Still irregular, but the transition fired already.
        assert!(!rr.record(90.0));
    }

    #[test]
    fn test_recovers_regularity() {
        let mut rr = tracker_no_skip();
        for _ in 0..8 {
            rr.record(150.0);
        }
        assert!(rr.record(90.0));
        // Eight in-band beats wash the outlier out of the history.
        for _ in 0..8 {
            rr.record(150.0);
        }
        assert!(rr.regular());
        assert_eq!(rr.assessment(), RhythmAssessment::Regular);
    }

    #[test]
    fn test_miss_timeout_unset_until_normal_data() {
        let mut rr = tracker_no_skip();
        assert_eq!(rr.miss(), 0.0);
        rr.record(500.0); // far outside the initial band
        assert_eq!(rr.miss(), 0.0);
        rr.record(150.0);
        assert!(rr.miss() > 0.0);
    }
}
