//! Fixed-point sine oscillator.
//!
//! A 32-bit phase accumulator drives an interpolated lookup into a shared,
//! lazily built sine table, followed by a rounding fixed-point gain stage.
//! After construction the per-sample path is integer-only and allocation-free.

pub mod gain;
pub mod oscillator;
pub mod phase;
pub mod table;
pub mod trace;

pub use oscillator::{Oscillator, OscillatorBuilder};
pub use phase::PhaseAccumulator;
pub use table::{TableFormat, WaveTable};
pub use trace::{NoTrace, Trace, TraceLog};
