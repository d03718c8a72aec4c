use crate::exporter::SustainDelta;
use base64::Engine;
use log::info;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const MAX_FILE_STEM: usize = 30;

/// What the CLI writes for each encoded progression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// A `.mid` file on disk.
    #[default]
    Mid,

    /// Base64 text on stdout.
    Base64,

    /// A `data:audio/midi;base64,...` URI on stdout.
    DataUri,
}

pub fn parse_output_format(input: &str) -> OutputFormat {
    match input.to_lowercase().as_str() {
        "m" | "mid" | "midi" => OutputFormat::Mid,
        "b" | "b64" | "base64" => OutputFormat::Base64,
        "u" | "uri" | "data-uri" => OutputFormat::DataUri,
        other => {
            info!("Unknown output format '{}', defaulting to `mid`..!", other);
            OutputFormat::Mid
        }
    }
}

pub fn parse_sustain(input: &str) -> SustainDelta {
    match input.to_lowercase().as_str() {
        "s" | "standalone" => SustainDelta::Standalone,
        "f" | "folded" => SustainDelta::Folded,
        other => {
            info!("Unknown sustain layout '{}', defaulting to `standalone`..!", other);
            SustainDelta::Standalone
        }
    }
}

/// Scientific pitch name, with middle C (60) as C4.
pub fn note_name(midi: u8) -> String {
    let octave = (midi / 12) as i32 - 1;
    format!("{}{}", NOTE_NAMES[(midi % 12) as usize], octave)
}

/// Download name for a progression: `producer-oasis-<name>.mid`. The name keeps ASCII letters and
/// digits, each whitespace run becomes one `_`, and the result is cut to 30 characters.
pub fn midi_file_name(progression_name: Option<&str>) -> String {
    let mut stem = String::new();
    let mut in_whitespace = false;

    for c in progression_name.unwrap_or_default().chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c);
            in_whitespace = false;
        } else if c.is_whitespace() {
            if !in_whitespace {
                stem.push('_');
            }
            in_whitespace = true;
        }
    }

    let stem: String = stem.chars().take(MAX_FILE_STEM).collect();
    if stem.is_empty() {
        String::from("producer-oasis-progression.mid")
    } else {
        format!("producer-oasis-{}.mid", stem)
    }
}

pub fn midi_data_uri(smf: &[u8]) -> String {
    format!(
        "data:audio/midi;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(smf)
    )
}
