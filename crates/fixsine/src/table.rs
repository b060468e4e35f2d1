//! Quantized sine table with a guard sample and interpolated lookup.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::OnceLock;

use crate::phase::PHASE_BITS;

pub const MIN_TABLE_BITS: u8 = 2;
pub const MAX_TABLE_BITS: u8 = 16;
pub const DEFAULT_TABLE_BITS: u8 = 8;

pub const MIN_SAMPLE_BITS: u8 = 2;
pub const MAX_SAMPLE_BITS: u8 = 32;
pub const DEFAULT_SAMPLE_BITS: u8 = 16;

const TABLE_SLOTS: usize = MAX_TABLE_BITS as usize + 1;
const SAMPLE_SLOTS: usize = MAX_SAMPLE_BITS as usize + 1;

/// One lazily built table per format, indexed by `[table_bits][sample_bits]`.
static SHARED: [[OnceLock<WaveTable>; SAMPLE_SLOTS]; TABLE_SLOTS] =
    [const { [const { OnceLock::new() }; SAMPLE_SLOTS] }; TABLE_SLOTS];

/// Table geometry: how many phase bits select a table entry and how wide
/// each quantized sample is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableFormat {
    table_bits: u8,
    sample_bits: u8,
}

impl TableFormat {
    /// Create a format, clamping both widths into their supported ranges.
    pub fn new(table_bits: u8, sample_bits: u8) -> Self {
        Self {
            table_bits: table_bits.clamp(MIN_TABLE_BITS, MAX_TABLE_BITS),
            sample_bits: sample_bits.clamp(MIN_SAMPLE_BITS, MAX_SAMPLE_BITS),
        }
    }

    pub fn table_bits(&self) -> u8 {
        self.table_bits
    }

    pub fn sample_bits(&self) -> u8 {
        self.sample_bits
    }

    /// Number of table entries in one period, excluding the guard sample.
    pub fn len(&self) -> usize {
        1 << self.table_bits
    }

    /// Always false: a format holds at least `2^MIN_TABLE_BITS` entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest magnitude representable in `sample_bits` signed bits.
    pub fn peak(&self) -> i32 {
        ((1i64 << (self.sample_bits - 1)) - 1) as i32
    }

    /// Width of the phase field below the table index.
    pub fn frac_bits(&self) -> u32 {
        PHASE_BITS - self.table_bits as u32
    }
}

impl Default for TableFormat {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_BITS, DEFAULT_SAMPLE_BITS)
    }
}

/// One period of a quantized sine, `len() + 1` entries long.
///
/// The last entry duplicates the first so interpolation never has to wrap
/// its upper index.
#[derive(Debug)]
pub struct WaveTable {
    format: TableFormat,
    frac_bits: u32,
    frac_mask: u32,
    entries: Box<[i32]>,
}

impl WaveTable {
    /// Build a private table. Prefer [`WaveTable::shared`] for oscillators.
    pub fn build(format: TableFormat) -> Self {
        let len = format.len();
        let peak = format.peak() as f64;

        let mut entries = Vec::with_capacity(len + 1);
        for i in 0..len {
            let angle = i as f64 * TAU / len as f64;
            entries.push((peak * angle.sin()).round() as i32);
        }
        entries.push(entries[0]);

        let frac_bits = format.frac_bits();
        Self {
            format,
            frac_bits,
            frac_mask: u32::MAX >> format.table_bits,
            entries: entries.into_boxed_slice(),
        }
    }

    /// The process-wide table for `format`, built on first request.
    ///
    /// Concurrent first calls build the table exactly once; every caller gets
    /// the same instance.
    pub fn shared(format: TableFormat) -> &'static WaveTable {
        Self::slot(format).get_or_init(|| Self::build(format))
    }

    /// Whether the shared table for `format` has been built yet.
    pub fn is_shared(format: TableFormat) -> bool {
        Self::slot(format).get().is_some()
    }

    fn slot(format: TableFormat) -> &'static OnceLock<WaveTable> {
        &SHARED[format.table_bits as usize][format.sample_bits as usize]
    }

    /// Split a phase into table index and the fraction toward the next entry.
    #[inline]
    pub fn split(&self, phase: u32) -> (usize, u32) {
        ((phase >> self.frac_bits) as usize, phase & self.frac_mask)
    }

    /// Linearly interpolated table value at `phase`.
    ///
    /// The step between neighbours is scaled in 64 bits and rounded half up,
    /// so the result never leaves the range spanned by the two entries.
    #[inline]
    pub fn lookup(&self, phase: u32) -> i32 {
        let (index, frac) = self.split(phase);
        let a = self.entries[index];
        let b = self.entries[index + 1];
        let bias = 1i64 << (self.frac_bits - 1);
        let step = ((b as i64 - a as i64) * frac as i64 + bias) >> self.frac_bits;
        a + step as i32
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Entries in one period, excluding the guard sample.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries including the trailing guard sample.
    pub fn entries(&self) -> &[i32] {
        &self.entries
    }

    pub fn peak(&self) -> i32 {
        self.format.peak()
    }
}

impl fmt::Display for WaveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sine[{}] = ", self.len())?;
        for (i, value) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}
