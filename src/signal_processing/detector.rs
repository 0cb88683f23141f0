use crate::config::MonitorConfig;
use crate::error::Result;
use crate::signal_processing::filters::FilterChain;
use crate::signal_processing::qualifier::{PeakQualifier, Qualification};
use crate::signal_processing::rr::{RhythmAssessment, RrTracker};

/// Per-sample detection record, written on every [`QrsDetector::process`]
/// call. The peak and threshold fields mirror the integrator stream for
/// diagnostics and rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResult {
    pub peak_i: f32,
    pub signal_peak_i: f32,
    pub noise_peak_i: f32,
    pub threshold_i1: f32,
    pub is_qrs: bool,
    /// Mean of the recent RR intervals, in samples; zero until enough
    /// beats have been seen.
    pub rr_average: f32,
    pub is_regular: bool,
    pub assessment: RhythmAssessment,
}

/// Streaming QRS detector: filter chain, adaptive peak qualifier and RR
/// tracker behind a single per-sample entry point.
///
/// The detector is a pure function of its state and the sample stream: no
/// I/O, no clock, no allocation on the per-sample path. Feeding two
/// detectors the same stream produces identical result sequences.
pub struct QrsDetector {
    filters: FilterChain,
    qualifier: PeakQualifier,
    rr: RrTracker,
    sample_count: u64,
    warmup: u64,
    sample_rate: f32,
}

impl QrsDetector {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filters: FilterChain::new(config.detector.integration_window),
            qualifier: PeakQualifier::new(&config.detector),
            rr: RrTracker::new(&config.rr),
            sample_count: 0,
            warmup: config.detector.warmup,
            sample_rate: config.sampling.sample_rate as f32,
        })
    }

    /// Feed one raw ADC sample.
    ///
    /// Must be called exactly once per sample, in strict index order;
    /// `index` has to equal the number of samples processed so far. An
    /// out-of-order call is a wiring bug, not a runtime condition, and
    /// panics.
    pub fn process(&mut self, index: u64, sample: u16) -> SampleResult {
        assert_eq!(
            index, self.sample_count,
            "samples must arrive in strict index order"
        );
        self.sample_count = index + 1;

        self.filters.advance(index, sample);

        // Hold detection back until the filter transient has died down
        // and the thresholds have had input to settle against.
        if index < self.warmup {
            return self.result(false);
        }

        let outcome = self.qualifier.qualify(index, &self.filters, self.rr.miss());
        let mut is_qrs = false;
        if let Qualification::Qrs { at, previous } = outcome {
            is_qrs = true;
            let interval = (at - previous) as f32;
            if self.rr.record(interval) {
                self.qualifier.relax_thresholds();
            }
        }
        self.result(is_qrs)
    }

    fn result(&self, is_qrs: bool) -> SampleResult {
        SampleResult {
            peak_i: self.qualifier.peak_i(),
            signal_peak_i: self.qualifier.signal_peak_i(),
            noise_peak_i: self.qualifier.noise_peak_i(),
            threshold_i1: self.qualifier.threshold_i1(),
            is_qrs,
            rr_average: self.rr.average(),
            is_regular: self.rr.regular(),
            assessment: self.rr.assessment(),
        }
    }

    /// Number of samples processed so far; also the next expected index.
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Index of the most recently accepted R-peak; zero before the first.
    pub fn last_qrs_sample(&self) -> u64 {
        self.qualifier.last_qrs()
    }

    /// Instantaneous heart rate derived from the RR average.
    pub fn heart_rate_bpm(&self) -> Option<f32> {
        let rr = self.rr.average();
        (rr > 0.0).then(|| 60.0 * self.sample_rate / rr)
    }

    /// Read access to every intermediate signal, for rendering and
    /// diagnostics. The borrow is read-only; only `process` writes.
    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }
}
