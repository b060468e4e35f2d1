use fixsine::{Oscillator, TraceLog};
use std::io::{Seek, Write};
use std::path::PathBuf;
use time::format_description::FormatItem;
use time::OffsetDateTime;

/// WAV container depth for a sample width: 16, 24 or 32 bits.
pub fn container_bits(sample_bits: u8) -> u16 {
    match sample_bits {
        0..=16 => 16,
        17..=24 => 24,
        _ => 32,
    }
}

/// Write `samples` oscillator outputs as a mono integer WAV stream.
///
/// Samples are left-aligned in the container. While `trace` has room, steps
/// go through the traced path.
pub fn write_wav<W: Write + Seek>(
    out: W,
    osc: &mut Oscillator,
    samples: usize,
    trace: &mut TraceLog,
) -> Result<(), hound::Error> {
    let sample_bits = osc.format().sample_bits();
    let bits = container_bits(sample_bits);
    let shift = bits as u32 - sample_bits as u32;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: osc.sample_rate().round() as u32,
        bits_per_sample: bits,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::new(out, spec)?;
    for _ in 0..samples {
        let sample = if trace.is_full() {
            osc.process()
        } else {
            osc.process_traced(trace)
        };
        writer.write_sample(sample << shift)?;
    }
    writer.finalize()
}

/// `tone-<UTC timestamp>.wav` in the current directory.
pub fn default_output_path(now: OffsetDateTime) -> PathBuf {
    let format = "[year][month][day]-[hour][minute][second]";
    let parsed: Result<Vec<FormatItem<'_>>, _> = time::format_description::parse(format);
    let stamp = parsed
        .ok()
        .and_then(|items| now.format(&items).ok())
        .unwrap_or_else(|| now.unix_timestamp().to_string());
    PathBuf::from(format!("tone-{}.wav", stamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> (hound::WavSpec, Vec<i32>) {
        let reader = hound::WavReader::new(Cursor::new(bytes)).expect("wav header");
        let spec = reader.spec();
        let samples = reader
            .into_samples::<i32>()
            .collect::<Result<Vec<_>, _>>()
            .expect("wav samples");
        (spec, samples)
    }

    #[test]
    fn container_depths() {
        assert_eq!(container_bits(8), 16);
        assert_eq!(container_bits(16), 16);
        assert_eq!(container_bits(20), 24);
        assert_eq!(container_bits(24), 24);
        assert_eq!(container_bits(25), 32);
        assert_eq!(container_bits(32), 32);
    }

    #[test]
    fn wav_holds_oscillator_output() {
        let mut osc = Oscillator::builder(48_000.0).frequency(1_000.0).build();
        let mut reference = osc.clone();
        let mut buf = Cursor::new(Vec::new());
        let mut trace = TraceLog::new(0);
        write_wav(&mut buf, &mut osc, 96, &mut trace).expect("write wav");

        let (spec, samples) = read_back(buf.into_inner());
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 48_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples.len(), 96);
        for sample in samples {
            assert_eq!(sample, reference.process());
        }
    }

    #[test]
    fn narrow_samples_are_left_aligned() {
        let mut osc = Oscillator::builder(8_000.0)
            .sample_bits(12)
            .frequency(2_000.0)
            .build();
        let mut buf = Cursor::new(Vec::new());
        let mut trace = TraceLog::new(0);
        write_wav(&mut buf, &mut osc, 4, &mut trace).expect("write wav");

        let (spec, samples) = read_back(buf.into_inner());
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(samples, [2047 << 4, 0, -2047 << 4, 0]);
    }

    #[test]
    fn trace_covers_first_samples() {
        let mut osc = Oscillator::builder(48_000.0).frequency(12_000.0).build();
        let mut buf = Cursor::new(Vec::new());
        let mut trace = TraceLog::new(4);
        write_wav(&mut buf, &mut osc, 32, &mut trace).expect("write wav");
        assert_eq!(trace.lines().len(), 4);
        assert!(trace.lines()[0].starts_with("lookup phase=0x40000000"));
    }

    #[test]
    fn default_path_uses_timestamp() {
        let now = OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("timestamp");
        assert_eq!(
            default_output_path(now),
            PathBuf::from("tone-20231114-221320.wav")
        );
    }
}
