//! Design constants for the 200 Hz Pan-Tompkins front-end.
//!
//! These values are interdependent: the refractory periods, the integration
//! window and the warm-up interval are all tuned against the sampling
//! frequency. Changing one requires re-tuning the others against reference
//! recordings.

/// ADC sampling frequency in Hz.
pub const SAMPLING_FREQUENCY: u32 = 200;

/// Capacity of every intermediate signal ring, in samples. Sized above
/// 1.66x the longest expected RR interval so that back-search always has
/// the history it needs.
pub const BUFFER_SIZE: usize = 500;

/// Moving-window integral length (~150 ms at 200 Hz).
pub const WINDOW_SIZE: usize = 30;

/// Hard refractory period (200 ms): a second trigger inside this window is
/// always noise.
pub const T200: u64 = 40;

/// Soft refractory period (360 ms): a trigger inside this window must pass
/// the slope check or it is treated as a T-wave.
pub const T360: u64 = 72;

/// Samples discarded before detection starts (3 s). Covers the filter
/// transient and lets the adaptive thresholds settle.
pub const WARMUP: u64 = 600;

/// Depth of both RR sliding windows.
pub const RR_HISTORY: usize = 8;

/// Initial RR intervals discarded while the thresholds adapt.
pub const RR_SKIP: u32 = 7;

/// Lookback of the steep-slope search over the squared derivative.
pub const SLOPE_WINDOW: usize = 10;

/// RR acceptance bounds, in samples, used until the first normal-range
/// average exists (500 ms..1 s, i.e. 120 bpm down to 60 bpm).
pub const RR_LOW_INIT: f32 = 100.0;
pub const RR_HIGH_INIT: f32 = 200.0;

/// Full scale of the 12-bit ADC front-end.
pub const ADC_MAX: u16 = 4095;

/// ADC mid-scale, where a centered lead sits between beats.
pub const ADC_MIDSCALE: u16 = 2048;
