mod analyze;
#[cfg(feature = "playback")]
mod device;
mod note;
mod render;

use clap::{Parser, Subcommand};
use fixsine::{Oscillator, OscillatorBuilder, TableFormat, TraceLog, WaveTable};
use note::{note_to_hz, NoteError};
use std::path::PathBuf;
use time::OffsetDateTime;

const DEFAULT_SAMPLE_RATE_HZ: f32 = 48_000.0;
const DEFAULT_FREQ_HZ: f32 = 1_000.0;

#[derive(Parser, Debug)]
#[command(name = "fixsine-tone", about = "Fixed-point sine tone generator")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the tone to a mono WAV file.
    Render {
        #[command(flatten)]
        tone: ToneArgs,
        /// Duration in seconds.
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,
        /// Output path; defaults to a timestamped name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print this many arithmetic trace lines to stderr.
        #[arg(long, default_value_t = 0)]
        trace: usize,
    },
    /// Print the shared sine table.
    Table {
        /// log2 of the table length.
        #[arg(long, default_value_t = fixsine::table::DEFAULT_TABLE_BITS)]
        table_bits: u8,
        /// Signed sample width in bits.
        #[arg(long, default_value_t = fixsine::table::DEFAULT_SAMPLE_BITS)]
        sample_bits: u8,
    },
    /// Report the dominant frequency and level of the rendered tone.
    Analyze {
        #[command(flatten)]
        tone: ToneArgs,
        /// Number of samples to analyze (rounded up to a power of two).
        #[arg(long, default_value_t = 8192)]
        samples: usize,
    },
    /// Play the tone on an audio output device.
    #[cfg(feature = "playback")]
    Play {
        #[command(flatten)]
        tone: ToneArgs,
        /// Duration in seconds.
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,
        /// Regex selecting the output device by name.
        #[arg(long)]
        device: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct ToneArgs {
    /// Sample rate in Hz.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    sample_rate: f32,
    /// Tone frequency in Hz.
    #[arg(long, conflicts_with = "note")]
    freq: Option<f32>,
    /// Tone as a note name, e.g. A4, C#5, Bb3.
    #[arg(long)]
    note: Option<String>,
    /// Output gain in [0, 1].
    #[arg(long, default_value_t = 1.0)]
    gain: f32,
    /// log2 of the table length.
    #[arg(long, default_value_t = fixsine::table::DEFAULT_TABLE_BITS)]
    table_bits: u8,
    /// Signed sample width in bits.
    #[arg(long, default_value_t = fixsine::table::DEFAULT_SAMPLE_BITS)]
    sample_bits: u8,
    /// Fractional bits of the gain register.
    #[arg(long, default_value_t = fixsine::gain::DEFAULT_GAIN_BITS)]
    gain_bits: u8,
}

impl ToneArgs {
    fn frequency(&self) -> Result<f32, NoteError> {
        match (&self.note, self.freq) {
            (Some(note), _) => note_to_hz(note),
            (None, Some(freq)) => Ok(freq),
            (None, None) => Ok(DEFAULT_FREQ_HZ),
        }
    }

    /// Builder carrying every tone setting except the sample rate.
    fn builder(&self, sample_rate_hz: f32) -> Result<OscillatorBuilder, NoteError> {
        Ok(Oscillator::builder(sample_rate_hz)
            .table_bits(self.table_bits)
            .sample_bits(self.sample_bits)
            .gain_bits(self.gain_bits)
            .frequency(self.frequency()?)
            .gain(self.gain))
    }

    fn oscillator(&self) -> Result<Oscillator, NoteError> {
        Ok(self.builder(self.sample_rate)?.build())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::Render {
            tone,
            seconds,
            output,
            trace,
        } => {
            let mut osc = tone.oscillator()?;
            let path = output.unwrap_or_else(|| render::default_output_path(OffsetDateTime::now_utc()));
            let samples = (seconds.max(0.0) * osc.sample_rate()).round() as usize;

            let mut log = TraceLog::new(trace);
            let file = std::io::BufWriter::new(std::fs::File::create(&path)?);
            render::write_wav(file, &mut osc, samples, &mut log)?;

            for line in log.lines() {
                eprintln!("{}", line);
            }
            eprintln!(
                "wrote {} samples at {:.2} Hz to {}",
                samples,
                osc.frequency(),
                path.display()
            );
        }
        Command::Table {
            table_bits,
            sample_bits,
        } => {
            let table = WaveTable::shared(TableFormat::new(table_bits, sample_bits));
            println!("{}", table);
        }
        Command::Analyze { tone, samples } => {
            let mut osc = tone.oscillator()?;
            let spectrum = analyze::analyze(&mut osc, samples);
            println!(
                "set {:.2} Hz, peak {:.2} Hz at {:.2} dBFS ({}-point FFT)",
                osc.frequency(),
                spectrum.peak_hz,
                spectrum.peak_dbfs,
                spectrum.fft_len
            );
        }
        #[cfg(feature = "playback")]
        Command::Play {
            tone,
            seconds,
            device,
        } => {
            device::play(
                |rate| Ok(tone.builder(rate)?.build()),
                seconds,
                device.as_deref(),
            )?;
        }
    }

    Ok(())
}
