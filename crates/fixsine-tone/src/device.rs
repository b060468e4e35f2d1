use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use fixsine::Oscillator;
use regex::Regex;
use ringbuf::HeapRb;
use std::time::Duration;

const RING_SECONDS: f32 = 0.25;
const FEED_SLEEP: Duration = Duration::from_millis(5);

/// Play `seconds` of the oscillator on an output device.
///
/// `make_osc` receives the device sample rate. The oscillator runs on this
/// thread and feeds the audio callback through a ring buffer; every output
/// channel carries the same signal.
pub fn play<F>(
    make_osc: F,
    seconds: f32,
    device_regex: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(f32) -> Result<Oscillator, Box<dyn std::error::Error>>,
{
    let host = cpal::default_host();
    let device = match device_regex {
        Some(pattern) => {
            let re = Regex::new(pattern)?;
            first_matching(host.output_devices()?, &re, device_name).ok_or_else(|| {
                format!("fixsine-tone: no output device name matches /{}/", pattern)
            })?
        }
        None => host
            .default_output_device()
            .ok_or("fixsine-tone: host reports no default output device")?,
    };
    let name = device_name(&device);
    let config = device.default_output_config()?;
    let sample_format = config.sample_format();
    let config: cpal::StreamConfig = config.into();
    let channels = config.channels as usize;
    let sample_rate_hz = config.sample_rate.0 as f32;

    let mut osc = make_osc(sample_rate_hz)?;
    let full_scale = osc.format().peak() as f32;
    eprintln!(
        "playing {:.2} Hz on {} ({} Hz, {} ch)",
        osc.frequency(),
        name,
        config.sample_rate.0,
        channels
    );

    let ring_len = ((sample_rate_hz * RING_SECONDS) as usize).max(1);
    let ring = HeapRb::<f32>::new(ring_len);
    let (mut producer, mut consumer) = ring.split();

    let err_fn = |err| eprintln!("audio stream error: {}", err);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => device.build_output_stream(
            &config,
            move |data: &mut [f32], _| {
                for frame in data.chunks_mut(channels) {
                    let sample = consumer.pop().unwrap_or(0.0);
                    for chan in frame.iter_mut() {
                        *chan = sample;
                    }
                }
            },
            err_fn,
            None,
        )?,
        _ => return Err("unsupported sample format (expected f32)".into()),
    };
    stream.play()?;

    let total = (seconds.max(0.0) * sample_rate_hz).round() as usize;
    for _ in 0..total {
        let mut sample = osc.process() as f32 / full_scale;
        while let Err(rejected) = producer.push(sample) {
            sample = rejected;
            std::thread::sleep(FEED_SLEEP);
        }
    }

    // Let the ring drain before the stream is dropped.
    std::thread::sleep(Duration::from_secs_f32(RING_SECONDS));
    Ok(())
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "<unknown>".to_string())
}

/// First item whose name matches `re`.
fn first_matching<D>(
    items: impl IntoIterator<Item = D>,
    re: &Regex,
    name_of: impl Fn(&D) -> String,
) -> Option<D> {
    items.into_iter().find(|item| re.is_match(&name_of(item)))
}
