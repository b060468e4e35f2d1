use crate::gain;
use crate::phase::PhaseAccumulator;
use crate::table::{TableFormat, WaveTable, DEFAULT_SAMPLE_BITS, DEFAULT_TABLE_BITS};
use crate::trace::{NoTrace, Trace};

/// Sine voice: phase accumulator, shared interpolated table and gain stage.
///
/// Each call to [`process`](Oscillator::process) advances one sample.
#[derive(Debug, Clone)]
pub struct Oscillator {
    phasor: PhaseAccumulator,
    table: &'static WaveTable,
    gain: u32,
    gain_bits: u8,
    last: i32,
}

impl Oscillator {
    /// Create an oscillator with the default table format and unity gain.
    pub fn new(sample_rate_hz: f32) -> Self {
        Self::builder(sample_rate_hz).build()
    }

    /// Create a builder to configure widths and initial settings.
    pub fn builder(sample_rate_hz: f32) -> OscillatorBuilder {
        OscillatorBuilder::new(sample_rate_hz)
    }

    /// Set the frequency in Hz, clamped into `[0, sample_rate / 2)`.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phasor.set_frequency(freq_hz);
    }

    pub fn frequency(&self) -> f32 {
        self.phasor.frequency()
    }

    /// Set the gain, clamped into `[0, 1]`.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain::quantize(gain, self.gain_bits);
    }

    /// Normalized gain as held in the register.
    pub fn gain(&self) -> f32 {
        gain::normalize(self.gain, self.gain_bits)
    }

    /// Raw gain register.
    pub fn gain_register(&self) -> u32 {
        self.gain
    }

    pub fn gain_bits(&self) -> u8 {
        self.gain_bits
    }

    /// Advance one sample and return it.
    #[inline]
    pub fn process(&mut self) -> i32 {
        self.process_traced(&mut NoTrace)
    }

    /// Same as [`process`](Oscillator::process), reporting intermediate
    /// values to `trace`.
    #[inline]
    pub fn process_traced<T: Trace>(&mut self, trace: &mut T) -> i32 {
        let phase = self.phasor.tick();
        if self.phasor.wrapped() {
            trace.wrap(self.phasor.cycles());
        }

        let raw = self.table.lookup(phase);
        let (index, frac) = self.table.split(phase);
        trace.lookup(phase, index, frac, raw);

        self.last = gain::apply(raw, self.gain, self.gain_bits);
        trace.gain(raw, self.gain, self.last);
        self.last
    }

    /// Fill `out` with consecutive samples.
    pub fn fill(&mut self, out: &mut [i32]) {
        for sample in out {
            *sample = self.process();
        }
    }

    /// Most recent output, without advancing.
    #[inline]
    pub fn last(&self) -> i32 {
        self.last
    }

    #[inline]
    pub fn phase(&self) -> u32 {
        self.phasor.phase()
    }

    /// Jump to a normalized position in the cycle; see
    /// [`PhaseAccumulator::reset_phase`].
    pub fn reset_phase(&mut self, position: f32) {
        self.phasor.reset_phase(position);
    }

    pub fn is_even(&self) -> bool {
        self.phasor.is_even()
    }

    pub fn is_alt(&self) -> bool {
        self.phasor.is_alt()
    }

    pub fn cycles(&self) -> u8 {
        self.phasor.cycles()
    }

    pub fn wrapped(&self) -> bool {
        self.phasor.wrapped()
    }

    pub fn sample_rate(&self) -> f32 {
        self.phasor.sample_rate()
    }

    pub fn format(&self) -> TableFormat {
        self.table.format()
    }

    pub fn table(&self) -> &'static WaveTable {
        self.table
    }

    pub fn phasor(&self) -> &PhaseAccumulator {
        &self.phasor
    }

    pub fn phasor_mut(&mut self) -> &mut PhaseAccumulator {
        &mut self.phasor
    }
}

/// Builder for configuring an [`Oscillator`].
///
/// Widths outside their supported ranges are clamped.
pub struct OscillatorBuilder {
    sample_rate_hz: f32,
    table_bits: u8,
    sample_bits: u8,
    gain_bits: u8,
    freq_hz: f32,
    gain: f32,
}

impl OscillatorBuilder {
    /// Create a builder with defaults: 256-entry table, 16-bit samples,
    /// 16-bit gain, 0 Hz, unity gain.
    pub fn new(sample_rate_hz: f32) -> Self {
        Self {
            sample_rate_hz,
            table_bits: DEFAULT_TABLE_BITS,
            sample_bits: DEFAULT_SAMPLE_BITS,
            gain_bits: gain::DEFAULT_GAIN_BITS,
            freq_hz: 0.0,
            gain: 1.0,
        }
    }

    /// Set log2 of the table length.
    pub fn table_bits(mut self, bits: u8) -> Self {
        self.table_bits = bits;
        self
    }

    /// Set the signed sample width of the table and output.
    pub fn sample_bits(mut self, bits: u8) -> Self {
        self.sample_bits = bits;
        self
    }

    /// Set the number of fractional bits in the gain register.
    pub fn gain_bits(mut self, bits: u8) -> Self {
        self.gain_bits = gain::clamp_bits(bits);
        self
    }

    /// Use the widths of an existing format.
    pub fn format(mut self, format: TableFormat) -> Self {
        self.table_bits = format.table_bits();
        self.sample_bits = format.sample_bits();
        self
    }

    pub fn frequency(mut self, freq_hz: f32) -> Self {
        self.freq_hz = freq_hz;
        self
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    /// Build the oscillator, building the shared table on first use.
    pub fn build(self) -> Oscillator {
        let format = TableFormat::new(self.table_bits, self.sample_bits);
        let gain_bits = gain::clamp_bits(self.gain_bits);

        let mut osc = Oscillator {
            phasor: PhaseAccumulator::new(self.sample_rate_hz),
            table: WaveTable::shared(format),
            gain: gain::unity(gain_bits),
            gain_bits,
            last: 0,
        };
        osc.set_frequency(self.freq_hz);
        osc.set_gain(self.gain);
        osc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceLog;

    const SAMPLE_RATE: f32 = 48_000.0;

    #[test]
    fn defaults() {
        let osc = Oscillator::new(SAMPLE_RATE);
        assert_eq!(osc.format(), TableFormat::default());
        assert_eq!(osc.gain(), 1.0);
        assert_eq!(osc.gain_register(), 1 << 16);
        assert_eq!(osc.frequency(), 0.0);
        assert_eq!(osc.last(), 0);
        assert_eq!(osc.phase(), 0);
        assert!(WaveTable::is_shared(TableFormat::default()));
    }

    #[test]
    fn oscillators_share_one_table() {
        let a = Oscillator::new(SAMPLE_RATE);
        let b = Oscillator::builder(44_100.0).frequency(440.0).build();
        assert!(std::ptr::eq(a.table(), b.table()));

        let c = Oscillator::builder(SAMPLE_RATE).table_bits(12).build();
        assert!(!std::ptr::eq(a.table(), c.table()));
        assert_eq!(c.table().len(), 4096);
    }

    #[test]
    fn builder_clamps_widths() {
        let osc = Oscillator::builder(SAMPLE_RATE)
            .table_bits(1)
            .sample_bits(64)
            .gain_bits(0)
            .build();
        assert_eq!(osc.format().table_bits(), 2);
        assert_eq!(osc.format().sample_bits(), 32);
        assert_eq!(osc.gain_bits(), 1);
    }

    #[test]
    fn quarter_cycle_outputs_at_one_khz() {
        let mut osc = Oscillator::builder(SAMPLE_RATE)
            .frequency(1_000.0)
            .gain(1.0)
            .build();
        let mut out = [0i32; 48];
        osc.fill(&mut out);

        // Samples 12, 24, 36 and 48 sit on the quarter points of the cycle.
        assert!((out[11] - 32_767).abs() <= 1, "peak {}", out[11]);
        assert!(out[23].abs() <= 1, "zero {}", out[23]);
        assert!((out[35] + 32_767).abs() <= 1, "trough {}", out[35]);
        assert!(out[47].abs() <= 1, "zero {}", out[47]);
        assert_eq!(osc.last(), out[47]);
        assert_eq!(osc.cycles(), 0);
    }

    #[test]
    fn zero_gain_is_silent() {
        let mut osc = Oscillator::builder(SAMPLE_RATE)
            .frequency(1_234.5)
            .gain(0.0)
            .build();
        for _ in 0..1000 {
            assert_eq!(osc.process(), 0);
        }
    }

    #[test]
    fn unity_gain_matches_table() {
        for &sample_bits in &[16u8, 24, 32] {
            let mut osc = Oscillator::builder(SAMPLE_RATE)
                .sample_bits(sample_bits)
                .frequency(997.0)
                .build();
            for _ in 0..500 {
                let out = osc.process();
                assert_eq!(out, osc.table().lookup(osc.phase()));
            }
        }
    }

    #[test]
    fn output_scales_with_gain() {
        let gains = [0.0f32, 0.25, 0.5, 1.0];
        let mut oscs: Vec<Oscillator> = gains
            .iter()
            .map(|&g| Oscillator::builder(SAMPLE_RATE).frequency(440.0).gain(g).build())
            .collect();

        for _ in 0..2000 {
            let outs: Vec<i32> = oscs.iter_mut().map(|o| o.process()).collect();
            let full = outs[3] as f32;
            for (out, g) in outs.iter().zip(gains) {
                let expected = full * g;
                assert!(
                    (*out as f32 - expected).abs() <= 0.5,
                    "gain {}: {} vs {}",
                    g,
                    out,
                    expected
                );
            }
        }
    }

    #[test]
    fn gain_is_clamped() {
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.set_gain(2.0);
        assert_eq!(osc.gain(), 1.0);
        osc.set_gain(-1.0);
        assert_eq!(osc.gain(), 0.0);
        osc.set_gain(0.25);
        assert_eq!(osc.gain(), 0.25);
    }

    #[test]
    fn last_does_not_advance() {
        let mut osc = Oscillator::builder(SAMPLE_RATE).frequency(3_000.0).build();
        osc.process();
        let phase = osc.phase();
        let last = osc.last();
        for _ in 0..10 {
            assert_eq!(osc.last(), last);
        }
        assert_eq!(osc.phase(), phase);
    }

    #[test]
    fn output_stays_within_sample_width() {
        let mut osc = Oscillator::builder(SAMPLE_RATE)
            .sample_bits(12)
            .frequency(17_000.0)
            .build();
        for _ in 0..10_000 {
            assert!(osc.process().abs() <= 2047);
        }
    }

    #[test]
    fn phase_returns_after_one_period() {
        let mut osc = Oscillator::builder(SAMPLE_RATE).frequency(1_000.0).build();
        osc.reset_phase(0.3);
        let start = osc.phase();
        for _ in 0..48 {
            osc.process();
        }
        let drift = osc.phase().wrapping_sub(start) as i32;
        assert!(drift.unsigned_abs() <= 24);
        assert_eq!(osc.cycles(), 1);
    }

    #[test]
    fn reset_phase_restarts_cycle() {
        let mut osc = Oscillator::builder(SAMPLE_RATE).frequency(12_000.0).build();
        let first: Vec<i32> = (0..8).map(|_| osc.process()).collect();
        assert_eq!(osc.cycles(), 2);

        osc.reset_phase(0.0);
        assert_eq!(osc.cycles(), 0);
        let again: Vec<i32> = (0..8).map(|_| osc.process()).collect();
        assert_eq!(first, again);
        assert_eq!(first[..4], [32_767, 0, -32_767, 0]);
    }

    #[test]
    fn nyquist_parity_through_oscillator() {
        let mut osc = Oscillator::new(SAMPLE_RATE);
        osc.phasor_mut().set_increment(1 << 31);
        osc.process();
        assert!(osc.is_even() && !osc.wrapped());
        osc.process();
        assert!(!osc.is_even() && osc.wrapped());
        osc.process();
        osc.process();
        assert!(osc.is_even() && osc.is_alt());
    }

    #[test]
    fn traced_process_matches_plain() {
        let mut plain = Oscillator::builder(SAMPLE_RATE).frequency(12_000.0).gain(0.5).build();
        let mut traced = plain.clone();
        let mut log = TraceLog::new(64);

        for _ in 0..4 {
            assert_eq!(plain.process(), traced.process_traced(&mut log));
        }
        // Four lookups, four gains and one wrap on the fourth tick.
        assert_eq!(log.lines().len(), 9);
        assert_eq!(
            log.lines()[0],
            "lookup phase=0x40000000 idx=0x40 frac=0x0 value=32767"
        );
        assert_eq!(log.lines()[1], "gain 0x7fff * 0x8000 -> 0x4000 (16384)");
        assert_eq!(log.lines()[6], "wrap cycles=1");
    }
}
