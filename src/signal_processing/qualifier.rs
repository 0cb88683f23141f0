use log::debug;

use crate::config::DetectorConfig;
use crate::constants::BUFFER_SIZE;
use crate::signal_processing::filters::FilterChain;

/// Read access to the detection streams the qualifier consumes.
///
/// The production implementation is [`FilterChain`]; tests substitute
/// synthetic streams to drive the decision logic directly.
pub trait SignalView {
    /// Moving-window integral at `index`.
    fn integral(&self, index: u64) -> f32;
    /// Band-passed signal at `index`.
    fn filtered(&self, index: u64) -> f32;
    /// Largest squared-derivative value over the `lookback` samples
    /// immediately preceding `index`.
    fn steepest_slope(&self, index: u64, lookback: usize) -> f32;
}

impl SignalView for FilterChain {
    fn integral(&self, index: u64) -> f32 {
        FilterChain::integral(self, index)
    }

    fn filtered(&self, index: u64) -> f32 {
        FilterChain::filtered(self, index)
    }

    fn steepest_slope(&self, index: u64, lookback: usize) -> f32 {
        FilterChain::steepest_slope(self, index, lookback)
    }
}

/// Outcome of qualifying one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// An R-peak was accepted at `at` (which trails the current sample
    /// when back-search recovered a missed beat). `previous` is the index
    /// of the prior accepted peak, zero before the first one.
    Qrs { at: u64, previous: u64 },
    NoQrs,
}

/// Adaptive dual-threshold peak classifier.
///
/// Tracks exponentially smoothed signal-peak and noise-peak estimates on
/// both detection streams (integrator and band-passed signal) and derives
/// the running thresholds from them. A sample qualifies as an R-peak only
/// when both streams exceed their primary thresholds, the hard refractory
/// has elapsed, and — inside the soft refractory — the steep-slope check
/// rules out a T-wave.
pub struct PeakQualifier {
    refractory: u64,
    t_wave_window: u64,
    slope_window: usize,
    back_search: bool,

    last_qrs: u64,
    last_slope: f32,

    peak_i: f32,
    peak_f: f32,
    signal_peak_i: f32,
    signal_peak_f: f32,
    noise_peak_i: f32,
    noise_peak_f: f32,
    threshold_i1: f32,
    threshold_i2: f32,
    threshold_f1: f32,
    threshold_f2: f32,
}

impl PeakQualifier {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            refractory: config.refractory,
            t_wave_window: config.t_wave_window,
            slope_window: config.slope_window,
            back_search: config.back_search,
            last_qrs: 0,
            last_slope: 0.0,
            peak_i: 0.0,
            peak_f: 0.0,
            signal_peak_i: 0.0,
            signal_peak_f: 0.0,
            noise_peak_i: 0.0,
            noise_peak_f: 0.0,
            threshold_i1: 0.0,
            threshold_i2: 0.0,
            threshold_f1: 0.0,
            threshold_f2: 0.0,
        }
    }

    /// Classify the sample at `index`.
    ///
    /// `rr_miss` is the miss timeout in samples (zero while no normal-range
    /// RR average exists); it only matters when back-search is enabled.
    pub fn qualify(&mut self, index: u64, view: &impl SignalView, rr_miss: f32) -> Qualification {
        let v_i = view.integral(index);
        let v_f = view.filtered(index);

        // Anything that crosses a threshold on either stream is a peak
        // candidate; its amplitudes feed whichever estimate it ends up in.
        let candidate = v_i > self.threshold_i1 || v_f > self.threshold_f1;
        if candidate {
            self.peak_i = v_i;
            self.peak_f = v_f;
        }

        let mut qrs = false;
        let mut t_wave = false;

        if v_i > self.threshold_i1 && v_f > self.threshold_f1 {
            if index <= self.last_qrs + self.refractory {
                // Inside the hard refractory this can only be noise.
                self.update_noise();
            } else if index <= self.last_qrs + self.t_wave_window {
                let slope = view.steepest_slope(index, self.slope_window);
                if slope <= self.last_slope / 2.0 {
                    // Half the previous R slope or less: a T-wave. Leave
                    // the thresholds alone.
                    t_wave = true;
                } else {
                    self.update_signal();
                    self.last_slope = slope;
                    qrs = true;
                }
            } else {
                let slope = view.steepest_slope(index, self.slope_window);
                self.update_signal();
                self.last_slope = slope;
                qrs = true;
            }
        }

        if qrs {
            let previous = self.last_qrs;
            self.last_qrs = index;
            return Qualification::Qrs { at: index, previous };
        }

        // A candidate that was not promoted feeds the noise estimate. For
        // a candidate rejected by the hard refractory this is the second
        // such update; T-wave rejections contribute nothing.
        if candidate && !t_wave {
            self.update_noise();
        }

        if self.back_search && rr_miss > 0.0 && (index - self.last_qrs) as f32 > rr_miss {
            if let Some(at) = self.search_back(index, view) {
                let previous = self.last_qrs;
                self.last_qrs = at;
                debug!("back-search recovered a beat at sample {at}");
                return Qualification::Qrs { at, previous };
            }
        }

        Qualification::NoQrs
    }

    // Re-scan the window since the last accepted beat with the relaxed
    // integrator threshold, starting at the hard-refractory boundary
    // itself. Only reached when a beat is overdue by more than the miss
    // timeout.
    fn search_back(&mut self, index: u64, view: &impl SignalView) -> Option<u64> {
        let start = self.last_qrs + self.refractory;
        for at in start..index {
            if index - at >= BUFFER_SIZE as u64 {
                continue; // beyond retained history
            }
            let v_i = view.integral(at);
            let v_f = view.filtered(at);
            if v_i > self.threshold_i2 && v_f > self.threshold_f1 {
                let slope = view.steepest_slope(at, self.slope_window);
                if at <= self.last_qrs + self.t_wave_window && slope <= self.last_slope / 2.0 {
                    continue;
                }
                self.peak_i = v_i;
                self.peak_f = v_f;
                self.update_signal();
                self.last_slope = slope;
                return Some(at);
            }
        }
        None
    }

    fn update_signal(&mut self) {
        self.signal_peak_i = 0.125 * self.peak_i + 0.875 * self.signal_peak_i;
        self.signal_peak_f = 0.125 * self.peak_f + 0.875 * self.signal_peak_f;
        self.refresh_thresholds();
    }

    fn update_noise(&mut self) {
        self.noise_peak_i = 0.125 * self.peak_i + 0.875 * self.noise_peak_i;
        self.noise_peak_f = 0.125 * self.peak_f + 0.875 * self.noise_peak_f;
        self.refresh_thresholds();
    }

    fn refresh_thresholds(&mut self) {
        self.threshold_i1 = self.noise_peak_i + 0.25 * (self.signal_peak_i - self.noise_peak_i);
        self.threshold_f1 = self.noise_peak_f + 0.25 * (self.signal_peak_f - self.noise_peak_f);
        self.threshold_i2 = 0.5 * self.threshold_i1;
        self.threshold_f2 = 0.5 * self.threshold_f1;
    }

    /// Halve the primary thresholds so weaker peaks qualify. Applied when
    /// the rhythm turns irregular.
    pub fn relax_thresholds(&mut self) {
        self.threshold_i1 *= 0.5;
        self.threshold_f1 *= 0.5;
        self.threshold_i2 = 0.5 * self.threshold_i1;
        self.threshold_f2 = 0.5 * self.threshold_f1;
        debug!(
            "rhythm turned irregular: thresholds relaxed to i1={:.3} f1={:.3}",
            self.threshold_i1, self.threshold_f1
        );
    }

    pub fn last_qrs(&self) -> u64 {
        self.last_qrs
    }

    pub fn peak_i(&self) -> f32 {
        self.peak_i
    }

    pub fn signal_peak_i(&self) -> f32 {
        self.signal_peak_i
    }

    pub fn noise_peak_i(&self) -> f32 {
        self.noise_peak_i
    }

    pub fn threshold_i1(&self) -> f32 {
        self.threshold_i1
    }

    pub fn threshold_i2(&self) -> f32 {
        self.threshold_i2
    }

    pub fn threshold_f1(&self) -> f32 {
        self.threshold_f1
    }

    pub fn threshold_f2(&self) -> f32 {
        self.threshold_f2
    }
}
