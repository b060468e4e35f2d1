//! 32-bit phase accumulator.

/// Number of bits in the phase register.
pub const PHASE_BITS: u32 = u32::BITS;

/// Largest increment accepted from a frequency, one unit below Nyquist.
pub const MAX_INCREMENT: u32 = (1 << (PHASE_BITS - 1)) - 1;

const PHASE_SCALE: f64 = (1u64 << PHASE_BITS) as f64;

/// Advances a wrapping phase register by a fixed increment per tick and
/// counts how often it wraps.
#[derive(Debug, Clone)]
pub struct PhaseAccumulator {
    sample_rate_hz: f32,
    freq_hz: f32,
    phase: u32,
    increment: u32,
    cycles: u8,
    wrapped: bool,
}

impl PhaseAccumulator {
    /// Create an accumulator at phase 0 with a zero increment.
    ///
    /// A sample rate that is not a positive finite number is replaced by 1 Hz.
    pub fn new(sample_rate_hz: f32) -> Self {
        let sample_rate_hz = if sample_rate_hz.is_finite() && sample_rate_hz > 0.0 {
            sample_rate_hz
        } else {
            1.0
        };
        Self {
            sample_rate_hz,
            freq_hz: 0.0,
            phase: 0,
            increment: 0,
            cycles: 0,
            wrapped: false,
        }
    }

    /// Set the frequency, clamped into `[0, sample_rate / 2)`.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        // Negative and NaN land here.
        if !(freq_hz > 0.0) {
            self.freq_hz = 0.0;
            self.increment = 0;
            return;
        }

        let nyquist = self.nyquist_hz();
        if freq_hz >= nyquist {
            self.set_increment(MAX_INCREMENT);
            // The f32 readback of MAX_INCREMENT can round up to Nyquist itself.
            if self.freq_hz >= nyquist {
                self.freq_hz = f32::from_bits(nyquist.to_bits().saturating_sub(1));
            }
            return;
        }

        self.increment = hz_to_increment(freq_hz, self.sample_rate_hz).min(MAX_INCREMENT);
        self.freq_hz = freq_hz;
    }

    /// Set the raw per-tick increment. No Nyquist clamp is applied.
    pub fn set_increment(&mut self, increment: u32) {
        self.increment = increment;
        self.freq_hz = (increment as f64 * self.sample_rate_hz as f64 / PHASE_SCALE) as f32;
    }

    /// Advance by one increment and return the new phase.
    #[inline]
    pub fn tick(&mut self) -> u32 {
        self.phase = self.phase.wrapping_add(self.increment);
        self.wrapped = self.phase < self.increment;
        self.cycles = self.cycles.wrapping_add(self.wrapped as u8);
        self.phase
    }

    /// Jump to a normalized position in the cycle.
    ///
    /// Only the fractional part of `position` is used. Resetting to exactly
    /// zero also clears the cycle counter.
    pub fn reset_phase(&mut self, position: f32) {
        let position = if position.is_finite() {
            (position as f64).rem_euclid(1.0)
        } else {
            0.0
        };
        // rem_euclid of a tiny negative value rounds up to exactly 1.0.
        let position = if position >= 1.0 { 0.0 } else { position };
        if position == 0.0 {
            self.cycles = 0;
        }
        // round() may produce 2^32, which wraps to 0 through u64.
        self.phase = (position * PHASE_SCALE).round() as u64 as u32;
        self.wrapped = false;
    }

    #[inline]
    pub fn phase(&self) -> u32 {
        self.phase
    }

    #[inline]
    pub fn increment(&self) -> u32 {
        self.increment
    }

    /// The frequency last set, after clamping.
    pub fn frequency(&self) -> f32 {
        self.freq_hz
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate_hz
    }

    pub fn nyquist_hz(&self) -> f32 {
        self.sample_rate_hz / 2.0
    }

    /// Wrap count modulo 256.
    #[inline]
    pub fn cycles(&self) -> u8 {
        self.cycles
    }

    /// Whether the most recent tick wrapped.
    #[inline]
    pub fn wrapped(&self) -> bool {
        self.wrapped
    }

    /// True on even cycles.
    #[inline]
    pub fn is_even(&self) -> bool {
        self.cycles % 2 == 0
    }

    /// Bit 1 of the cycle count: flips every second wrap.
    #[inline]
    pub fn is_alt(&self) -> bool {
        (self.cycles % 4) >> 1 == 1
    }
}

fn hz_to_increment(freq_hz: f32, sample_rate_hz: f32) -> u32 {
    (freq_hz as f64 / sample_rate_hz as f64 * PHASE_SCALE).round() as u32
}
