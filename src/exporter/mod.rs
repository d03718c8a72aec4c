use crate::error::{ExportError, ExportResult};
use crate::model::progression::{Chord, MidiRequest, Progression};
use base64::Engine;
use log::{debug, info};

pub mod chunk;
pub mod track;
pub mod vlq;

pub use track::{PPQN, SustainDelta, WHOLE_NOTE_TICKS};

/// Encodes `chords` as a Format 0 Standard MIDI File, one whole note per chord.
pub fn encode_chords(chords: &[Chord]) -> ExportResult<Vec<u8>> {
    encode_chords_with(chords, SustainDelta::default())
}

pub fn encode_chords_with(chords: &[Chord], layout: SustainDelta) -> ExportResult<Vec<u8>> {
    let events = track::build_track(chords, layout)?;
    chunk::assemble_smf(&events)
}

pub fn encode_progression(progression: &Progression) -> ExportResult<Vec<u8>> {
    encode_progression_with(progression, SustainDelta::default())
}

pub fn encode_progression_with(
    progression: &Progression,
    layout: SustainDelta,
) -> ExportResult<Vec<u8>> {
    let Some(chords) = progression.chords.as_deref() else {
        return Err(ExportError::MissingData("progression has no chord list"));
    };

    let smf = encode_chords_with(chords, layout)?;
    info!(
        "Encoded progression '{}' ({} chords) into {} bytes of MIDI..!",
        progression.name.as_deref().unwrap_or("<untitled>"),
        chords.len(),
        smf.len()
    );

    Ok(smf)
}

const MISSING_PROGRESSION: &str = "progression data is required for MIDI generation";

/// Answers a `generateMidi` request with the base64 text of the encoded progression.
pub fn generate_midi(request: &MidiRequest) -> ExportResult<String> {
    let progression = request
        .progression
        .as_ref()
        .ok_or(ExportError::MissingData(MISSING_PROGRESSION))?;

    let smf = encode_progression(progression)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&smf);
    debug!("generateMidi produced {} base64 characters..!", encoded.len());

    Ok(encoded)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: [u8; 14] = [
        0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x01, 0xE0,
    ];

    fn track_len_field(smf: &[u8]) -> usize {
        u32::from_be_bytes([smf[18], smf[19], smf[20], smf[21]]) as usize
    }

    fn lofi_progression() -> Vec<Chord> {
        vec![
            Chord::new("Fmaj7", [53, 57, 60, 64]),
            Chord::new("Em7", [52, 55, 59, 62]),
            Chord::new("Dm9", [50, 53, 57, 60, 64]),
            Chord::new("G7sus", [55, 60, 62]),
            Chord::new("Cadd9", [48, 55, 62, 64]),
        ]
    }

    #[test]
    fn encoding_is_deterministic() {
        env_logger::try_init().unwrap_or(());

        let chords = lofi_progression();
        assert_eq!(encode_chords(&chords).unwrap(), encode_chords(&chords).unwrap());
    }

    #[test]
    fn empty_progression() {
        env_logger::try_init().unwrap_or(());

        let smf = encode_chords(&[]).unwrap();

        let mut expected = HEADER.to_vec();
        expected.extend_from_slice(b"MTrk");
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x04, 0x01, 0xFF, 0x2F, 0x00]);
        assert_eq!(smf, expected);
    }

    #[test]
    fn header_is_fixed_for_any_input() {
        env_logger::try_init().unwrap_or(());

        let inputs = [
            vec![],
            vec![Chord::new("C", [60, 64, 67])],
            lofi_progression(),
        ];

        for chords in inputs.iter() {
            let smf = encode_chords(chords).unwrap();
            assert_eq!(&smf[..14], &HEADER);

            let folded = encode_chords_with(chords, SustainDelta::Folded).unwrap();
            assert_eq!(&folded[..14], &HEADER);
        }
    }

    #[test]
    fn track_length_field_matches_event_stream() {
        env_logger::try_init().unwrap_or(());

        let all = lofi_progression();
        for count in [0, 1, 2, 5] {
            let smf = encode_chords(&all[..count]).unwrap();
            assert_eq!(track_len_field(&smf), smf.len() - 22, "{} chord(s)", count);
        }

        // 4 notes on + 1 sustain + 4 notes off + end of track
        let smf = encode_chords(&all[..1]).unwrap();
        assert_eq!(track_len_field(&smf), 4 * 4 + 2 + 4 * 4 + 4);
    }

    #[test]
    fn invalid_note_produces_no_output() {
        env_logger::try_init().unwrap_or(());

        let mut chords = lofi_progression();
        chords[3].midi_notes.push(200);

        let err = encode_chords(&chords).unwrap_err();
        assert_eq!(
            err,
            ExportError::NoteOutOfRange {
                chord: "G7sus".into(),
                note: 200,
            }
        );
    }

    #[test]
    fn progression_without_chords_is_missing_data() {
        env_logger::try_init().unwrap_or(());

        let progression = Progression {
            name: Some("Nothing".into()),
            ..Default::default()
        };

        let err = encode_progression(&progression).unwrap_err();
        assert!(matches!(err, ExportError::MissingData(_)));
        assert!(!err.is_invalid_argument());

        let empty = Progression::from_chords("Silence", vec![]);
        assert_eq!(encode_progression(&empty).unwrap(), encode_chords(&[]).unwrap());
    }

    #[test]
    fn generate_midi_returns_base64_of_the_file() {
        env_logger::try_init().unwrap_or(());

        let chords = lofi_progression();
        let request = MidiRequest {
            progression: Some(Progression::from_chords("Late Night", chords.clone())),
        };

        let encoded = generate_midi(&request).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();

        assert_eq!(decoded, encode_chords(&chords).unwrap());
    }

    #[test]
    fn generate_midi_without_progression_is_missing_data() {
        env_logger::try_init().unwrap_or(());

        let err = generate_midi(&MidiRequest::default()).unwrap_err();
        assert_eq!(
            err,
            ExportError::MissingData("progression data is required for MIDI generation")
        );
    }
}
