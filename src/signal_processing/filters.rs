use crate::signal_processing::ring::SignalRing;

/// Streaming Pan-Tompkins filter cascade.
///
/// Each arriving sample is pushed through six stages — DC block, 15 Hz low
/// pass, 5 Hz high pass, derivative, square, moving-window integral — and
/// every intermediate signal is kept in its own ring so that downstream
/// consumers (thresholding, slope checks, trace rendering) can read recent
/// history at will.
///
/// The low-pass and high-pass stages are the integer-coefficient
/// recurrences from Pan & Tompkins (1985), designed for exactly 200 Hz.
/// Taps that reach before the first sample read as zero; the resulting
/// transient is suppressed by the detector's warm-up gate, not here.
pub struct FilterChain {
    raw: SignalRing,
    dc_block: SignalRing,
    lowpass: SignalRing,
    highpass: SignalRing,
    derivative: SignalRing,
    squared: SignalRing,
    integral: SignalRing,
    window: usize,
}

impl FilterChain {
    /// Create a chain with the given moving-window integral length.
    pub fn new(window: usize) -> Self {
        Self {
            raw: SignalRing::new(),
            dc_block: SignalRing::new(),
            lowpass: SignalRing::new(),
            highpass: SignalRing::new(),
            derivative: SignalRing::new(),
            squared: SignalRing::new(),
            integral: SignalRing::new(),
            window,
        }
    }

    /// Run every stage for sample `index` and store the intermediate
    /// values. Must be called once per sample, in index order.
    pub fn advance(&mut self, index: u64, sample: u16) {
        let i = index as i64;
        let raw = sample as f32;
        self.raw.store(i, raw);

        // DC block: one-zero differentiator with a leaky integrator.
        let dc = if i == 0 {
            0.0
        } else {
            raw - self.raw.at(i - 1) + 0.995 * self.dc_block.at(i - 1)
        };
        self.dc_block.store(i, dc);

        // 15 Hz low pass.
        let lp = 2.0 * self.lowpass.at(i - 1) - self.lowpass.at(i - 2) + dc
            - 2.0 * self.dc_block.at(i - 6)
            + self.dc_block.at(i - 12);
        self.lowpass.store(i, lp);

        // 5 Hz high pass; this is the "filtered" trace shown on the display.
        let hp = -lp - self.highpass.at(i - 1)
            + 32.0 * self.lowpass.at(i - 16)
            + self.lowpass.at(i - 32);
        self.highpass.store(i, hp);

        let d = hp - self.highpass.at(i - 1);
        self.derivative.store(i, d);

        let sq = d * d;
        self.squared.store(i, sq);

        let mut sum = 0.0;
        for k in 0..self.window as i64 {
            sum += self.squared.at(i - k);
        }
        self.integral.store(i, sum / self.window as f32);
    }

    pub fn raw(&self, index: u64) -> f32 {
        self.raw.at(index as i64)
    }

    pub fn dc_block(&self, index: u64) -> f32 {
        self.dc_block.at(index as i64)
    }

    pub fn lowpass(&self, index: u64) -> f32 {
        self.lowpass.at(index as i64)
    }

    /// The band-passed signal, i.e. the high-pass stage output.
    pub fn filtered(&self, index: u64) -> f32 {
        self.highpass.at(index as i64)
    }

    pub fn derivative(&self, index: u64) -> f32 {
        self.derivative.at(index as i64)
    }

    pub fn squared_derivative(&self, index: u64) -> f32 {
        self.squared.at(index as i64)
    }

    /// Moving-window integral of the squared derivative.
    pub fn integral(&self, index: u64) -> f32 {
        self.integral.at(index as i64)
    }

    /// Largest squared-derivative value over the `lookback` samples
    /// immediately preceding `index`; the sample at `index` itself is not
    /// part of the window.
    pub fn steepest_slope(&self, index: u64, lookback: usize) -> f32 {
        let i = index as i64;
        let mut max = 0.0f32;
        for k in 1..=lookback as i64 {
            max = max.max(self.squared.at(i - k));
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WINDOW_SIZE;
    use approx::assert_relative_eq;

    // A deterministic, vaguely ECG-shaped input: baseline with a sharp
    // bump every 200 samples.
    fn test_input(len: usize) -> Vec<u16> {
        (0..len)
            .map(|i| {
                let phase = i % 200;
                if (90..100).contains(&phase) {
                    2048 + 80 * (phase as u16 - 89)
                } else {
                    2048
                }
            })
            .collect()
    }

    #[test]
    fn test_dc_block_recurrence() {
        let input = test_input(400);
        let mut chain = FilterChain::new(WINDOW_SIZE);
        let mut expected_dc = vec![0.0f32];

        for (i, &s) in input.iter().enumerate() {
            chain.advance(i as u64, s);
            if i >= 1 {
                let dc = input[i] as f32 - input[i - 1] as f32 + 0.995 * expected_dc[i - 1];
                expected_dc.push(dc);
            }
        }

        for (i, &dc) in expected_dc.iter().enumerate() {
            assert_relative_eq!(chain.dc_block(i as u64), dc, max_relative = 1e-5);
        }
        assert_eq!(chain.dc_block(0), 0.0);
    }

    #[test]
    fn test_raw_history_is_kept() {
        let input = test_input(300);
        let mut chain = FilterChain::new(WINDOW_SIZE);
        for (i, &s) in input.iter().enumerate() {
            chain.advance(i as u64, s);
        }
        for (i, &s) in input.iter().enumerate() {
            assert_eq!(chain.raw(i as u64), s as f32);
        }
    }

    #[test]
    fn test_square_stage() {
        let input = test_input(250);
        let mut chain = FilterChain::new(WINDOW_SIZE);
        for (i, &s) in input.iter().enumerate() {
            chain.advance(i as u64, s);
        }
        for i in 0..250u64 {
            let d = chain.derivative(i);
            assert_relative_eq!(chain.squared_derivative(i), d * d, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_integral_is_window_mean() {
        let input = test_input(300);
        let mut chain = FilterChain::new(WINDOW_SIZE);
        for (i, &s) in input.iter().enumerate() {
            chain.advance(i as u64, s);
        }

        for i in (WINDOW_SIZE as u64)..300 {
            let mean: f32 = (0..WINDOW_SIZE as u64)
                .map(|k| chain.squared_derivative(i - k))
                .sum::<f32>()
                / WINDOW_SIZE as f32;
            assert_relative_eq!(chain.integral(i), mean, max_relative = 1e-4);
        }
    }

    #[test]
    fn test_constant_input_settles_to_zero() {
        let mut chain = FilterChain::new(WINDOW_SIZE);
        for i in 0..700u64 {
            chain.advance(i, 2048);
        }
        // With dc[0] pinned to zero the whole cascade stays identically
        // zero for a constant input.
        for i in 0..700u64 {
            assert_eq!(chain.dc_block(i), 0.0);
            assert_eq!(chain.filtered(i), 0.0);
            assert_eq!(chain.integral(i), 0.0);
        }
    }

    #[test]
    fn test_steepest_slope_finds_window_max() {
        let input = test_input(300);
        let mut chain = FilterChain::new(WINDOW_SIZE);
        for (i, &s) in input.iter().enumerate() {
            chain.advance(i as u64, s);
        }
        for i in 20..300u64 {
            let expected = (1..=10u64)
                .map(|k| chain.squared_derivative(i - k))
                .fold(0.0f32, f32::max);
            assert_eq!(chain.steepest_slope(i, 10), expected);
            // The current sample stays outside the window.
            if chain.squared_derivative(i) > expected {
                assert!(chain.steepest_slope(i, 10) < chain.squared_derivative(i));
            }
        }
    }
}
