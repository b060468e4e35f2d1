//! Spectral check of the generated tone.

use fixsine::Oscillator;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const MIN_FFT_LEN: usize = 64;

/// Dominant spectral component of a rendered block.
#[derive(Debug, Clone, Copy)]
pub struct Spectrum {
    pub fft_len: usize,
    pub peak_hz: f32,
    pub peak_dbfs: f32,
}

/// Render `samples` outputs (rounded up to a power of two) and locate the
/// strongest bin under a Hann window.
pub fn analyze(osc: &mut Oscillator, samples: usize) -> Spectrum {
    let n = samples.max(MIN_FFT_LEN).next_power_of_two();
    let full_scale = osc.format().peak() as f32;

    let mut bins: Vec<Complex<f32>> = (0..n)
        .map(|i| {
            let window = 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / n as f32).cos();
            Complex::new(osc.process() as f32 / full_scale * window, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut bins);

    let mags: Vec<f32> = bins[..n / 2].iter().map(|c| c.norm()).collect();
    let (peak_bin, peak_mag) = mags
        .iter()
        .copied()
        .enumerate()
        .skip(1)
        .fold((0, 0.0f32), |best, (i, m)| if m > best.1 { (i, m) } else { best });

    let offset = if peak_bin > 0 && peak_bin + 1 < mags.len() {
        parabolic_offset(mags[peak_bin - 1], peak_mag, mags[peak_bin + 1])
    } else {
        0.0
    };

    let bin_hz = osc.sample_rate() / n as f32;
    // Hann coherent gain is 1/2, and a real sine splits across two bins.
    let amplitude = 4.0 * peak_mag / n as f32;

    Spectrum {
        fft_len: n,
        peak_hz: (peak_bin as f32 + offset) * bin_hz,
        peak_dbfs: 20.0 * amplitude.max(1e-12).log10(),
    }
}

/// Vertex of the parabola through three neighbouring magnitudes, in bins
/// relative to the centre one.
fn parabolic_offset(left: f32, centre: f32, right: f32) -> f32 {
    let denom = left - 2.0 * centre + right;
    if denom == 0.0 {
        return 0.0;
    }
    (0.5 * (left - right) / denom).clamp(-0.5, 0.5)
}
