use phf::phf_map;

const A4_HZ: f32 = 440.0;

/// Semitones from A within the same octave (octaves start at C).
static PITCH_CLASSES: phf::Map<&'static str, i32> = phf_map! {
    "C" => -9,
    "C#" => -8,
    "DB" => -8,
    "D" => -7,
    "D#" => -6,
    "EB" => -6,
    "E" => -5,
    "F" => -4,
    "F#" => -3,
    "GB" => -3,
    "G" => -2,
    "G#" => -1,
    "AB" => -1,
    "A" => 0,
    "A#" => 1,
    "BB" => 1,
    "B" => 2,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    Empty,
    MissingOctave(String),
    UnknownPitch(String),
    BadOctave(String),
}

impl std::fmt::Display for NoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteError::Empty => write!(f, "empty note name"),
            NoteError::MissingOctave(name) => write!(f, "note {} has no octave number", name),
            NoteError::UnknownPitch(pitch) => write!(f, "unknown pitch name: {}", pitch),
            NoteError::BadOctave(octave) => write!(f, "invalid octave: {}", octave),
        }
    }
}

impl std::error::Error for NoteError {}

/// Convert a note name such as `A4`, `C#5` or `Bb3` to equal-tempered Hz.
pub fn note_to_hz(name: &str) -> Result<f32, NoteError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(NoteError::Empty);
    }

    let split = name
        .char_indices()
        .skip(1)
        .find(|(_, c)| c.is_ascii_digit() || *c == '-')
        .map(|(idx, _)| idx)
        .ok_or_else(|| NoteError::MissingOctave(name.to_string()))?;
    let (pitch, octave) = name.split_at(split);

    let key = pitch.to_ascii_uppercase();
    let semitone = PITCH_CLASSES
        .get(key.as_str())
        .ok_or_else(|| NoteError::UnknownPitch(pitch.to_string()))?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| NoteError::BadOctave(octave.to_string()))?;

    let offset = semitone + 12 * (octave - 4);
    Ok(A4_HZ * 2f32.powf(offset as f32 / 12.0))
}
