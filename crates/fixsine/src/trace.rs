//! Optional observation of the per-sample arithmetic.
//!
//! [`Oscillator::process_traced`](crate::Oscillator::process_traced) reports
//! its intermediate values here. The plain `process` path uses [`NoTrace`],
//! which compiles away.

/// Receives intermediate values from one oscillator step. All hooks default
/// to doing nothing.
pub trait Trace {
    /// Phase wrapped; `cycles` is the updated wrap count.
    fn wrap(&mut self, _cycles: u8) {}

    /// Table lookup at `phase`, split into `index` and `frac`.
    fn lookup(&mut self, _phase: u32, _index: usize, _frac: u32, _value: i32) {}

    /// Gain stage input, register and output.
    fn gain(&mut self, _pre: i32, _register: u32, _post: i32) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl Trace for NoTrace {}

/// Collects formatted trace lines up to a fixed limit.
///
/// Formatting allocates, so this belongs in diagnostics, not in a real-time
/// callback.
#[derive(Debug, Default)]
pub struct TraceLog {
    lines: Vec<String>,
    limit: usize,
    dropped: usize,
}

impl TraceLog {
    /// Keep at most `limit` lines; later lines are counted as dropped.
    pub fn new(limit: usize) -> Self {
        Self {
            lines: Vec::new(),
            limit,
            dropped: 0,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() >= self.limit
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.dropped = 0;
    }

    fn push(&mut self, line: impl FnOnce() -> String) {
        if self.is_full() {
            self.dropped += 1;
            return;
        }
        self.lines.push(line());
    }
}

impl Trace for TraceLog {
    fn wrap(&mut self, cycles: u8) {
        self.push(|| format!("wrap cycles={}", cycles));
    }

    fn lookup(&mut self, phase: u32, index: usize, frac: u32, value: i32) {
        self.push(|| {
            format!(
                "lookup phase={:#010x} idx={:#x} frac={:#x} value={}",
                phase, index, frac, value
            )
        });
    }

    fn gain(&mut self, pre: i32, register: u32, post: i32) {
        self.push(|| format!("gain {:#x} * {:#x} -> {:#x} ({})", pre, register, post, post));
    }
}
