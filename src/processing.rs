use rolling_stats::Stats;
use serde::Serialize;

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::signal_processing::{QrsDetector, RhythmAssessment, SampleResult};

/// One accepted beat, as reported to the consumer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BeatEvent {
    /// Sample index of the accepted R-peak.
    pub sample_index: u64,
    /// R-peak time from the start of the stream, in seconds.
    pub time_secs: f32,
    /// Current RR average in samples; zero while the tracker is settling.
    pub rr_average: f32,
    /// Heart rate derived from the RR average.
    pub heart_rate_bpm: Option<f32>,
    pub regular: bool,
    pub assessment: RhythmAssessment,
}

/// Buffer-level driver around the per-sample detector.
///
/// Feeds arbitrary-length sample slices through the detector in strict
/// index order and condenses the per-sample records into beat events.
/// Running statistics over the accepted RR intervals and the derived
/// heart rate are kept for diagnostics; chunking has no effect on the
/// output — processing a stream in one slice or many produces the same
/// events.
pub struct EcgProcessor {
    detector: QrsDetector,
    sample_rate: f32,
    next_index: u64,
    beats: u64,
    last_beat_index: Option<u64>,
    rr_stats: Stats<f32>,
    rate_stats: Stats<f32>,
    last_result: Option<SampleResult>,
}

impl EcgProcessor {
    pub fn new(config: &MonitorConfig) -> Result<Self> {
        Ok(Self {
            detector: QrsDetector::new(config)?,
            sample_rate: config.sampling.sample_rate as f32,
            next_index: 0,
            beats: 0,
            last_beat_index: None,
            rr_stats: Stats::new(),
            rate_stats: Stats::new(),
            last_result: None,
        })
    }

    /// Process a slice of raw ADC samples, returning the beats accepted
    /// within it.
    pub fn process_buffer(&mut self, samples: &[u16]) -> Vec<BeatEvent> {
        let mut beats = Vec::new();
        for &sample in samples {
            let index = self.next_index;
            let result = self.detector.process(index, sample);
            self.next_index += 1;

            if result.is_qrs {
                // Back-search can accept a beat a few samples in the
                // past; the qualifier knows the true position.
                let at = self.detector.last_qrs_sample();
                self.beats += 1;
                if let Some(previous) = self.last_beat_index {
                    self.rr_stats.update((at - previous) as f32);
                }
                self.last_beat_index = Some(at);

                let heart_rate = (result.rr_average > 0.0)
                    .then(|| 60.0 * self.sample_rate / result.rr_average);
                if let Some(bpm) = heart_rate {
                    self.rate_stats.update(bpm);
                }

                beats.push(BeatEvent {
                    sample_index: at,
                    time_secs: at as f32 / self.sample_rate,
                    rr_average: result.rr_average,
                    heart_rate_bpm: heart_rate,
                    regular: result.is_regular,
                    assessment: result.assessment,
                });
            }
            self.last_result = Some(result);
        }
        beats
    }

    /// Current heart rate, once the RR tracker has settled.
    pub fn heart_rate(&self) -> Option<f32> {
        self.detector.heart_rate_bpm()
    }

    /// Running statistics over the accepted RR intervals, in samples.
    pub fn rr_stats(&self) -> &Stats<f32> {
        &self.rr_stats
    }

    /// Running statistics over the derived heart rate, in bpm.
    pub fn heart_rate_stats(&self) -> &Stats<f32> {
        &self.rate_stats
    }

    /// The detection record of the most recently processed sample.
    pub fn last_result(&self) -> Option<&SampleResult> {
        self.last_result.as_ref()
    }

    /// Read access to the detector, e.g. for tracing the filtered signal.
    pub fn detector(&self) -> &QrsDetector {
        &self.detector
    }

    /// Samples processed so far.
    pub fn samples_processed(&self) -> u64 {
        self.next_index
    }

    /// Beats accepted so far.
    pub fn beats_detected(&self) -> u64 {
        self.beats
    }
}
