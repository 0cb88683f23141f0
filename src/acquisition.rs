//! Sample handoff between the acquisition interrupt and the processing
//! loop.
//!
//! The front-end delivers one raw ADC count per sampling period. The only
//! thing the producer side ever does is write the next slot and publish it
//! by bumping `fill_index`; everything else — filtering, detection, RR
//! tracking — happens on the consumer side, strictly in index order.

use log::warn;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};

use crate::constants::BUFFER_SIZE;

/// Single-producer single-consumer ring carrying raw ADC counts.
///
/// The producer stores a slot with a relaxed write, then publishes it with
/// a release store of `fill_index`; the consumer pairs that with an
/// acquire load, after which every slot below the observed index is safe
/// to read. The ring is sized so the producer can never lap the consumer
/// at the design sample rate; doing so anyway is a sizing bug and leaves
/// the overwritten samples unspecified.
pub struct SampleRing {
    slots: [AtomicU16; BUFFER_SIZE],
    fill_index: AtomicU64,
    shutdown: AtomicBool,
}

impl SampleRing {
    pub fn new() -> Self {
        Self {
            slots: [const { AtomicU16::new(0) }; BUFFER_SIZE],
            fill_index: AtomicU64::new(0),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Producer side: publish one sample.
    pub fn push(&self, sample: u16) {
        let index = self.fill_index.load(Ordering::Relaxed);
        self.slots[(index % BUFFER_SIZE as u64) as usize].store(sample, Ordering::Relaxed);
        self.fill_index.store(index + 1, Ordering::Release);
    }

    /// Number of samples published so far; everything below this index is
    /// readable.
    pub fn fill_index(&self) -> u64 {
        self.fill_index.load(Ordering::Acquire)
    }

    /// Read the sample at `index`. Valid while the producer is less than
    /// a full ring ahead of it.
    pub fn read(&self, index: u64) -> u16 {
        self.slots[(index % BUFFER_SIZE as u64) as usize].load(Ordering::Relaxed)
    }

    /// Consumer side: drain every published sample at or after `*cursor`
    /// into `out`, advancing the cursor. Returns the number drained.
    pub fn drain_into(&self, cursor: &mut u64, out: &mut Vec<u16>) -> usize {
        let fill = self.fill_index();
        let lag = fill - *cursor;
        debug_assert!(
            lag <= BUFFER_SIZE as u64,
            "producer overran the consumer by {lag} samples"
        );
        if lag > BUFFER_SIZE as u64 {
            warn!("sample ring overrun: consumer is {lag} samples behind");
        }
        let drained = lag as usize;
        while *cursor < fill {
            out.push(self.read(*cursor));
            *cursor += 1;
        }
        drained
    }

    /// Stop the producer and freeze state; drained samples stay readable.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Default for SampleRing {
    fn default() -> Self {
        Self::new()
    }
}
