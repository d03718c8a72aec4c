use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A named set of notes that sound together for one whole note.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    pub name: String,
    /// Kept wide so that out-of-range input survives deserialization and can be rejected by name.
    pub midi_notes: Vec<i64>,
}

impl Chord {
    pub fn new(name: impl Into<String>, midi_notes: impl Into<Vec<i64>>) -> Self {
        Self {
            name: name.into(),
            midi_notes: midi_notes.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Progression {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub mood: Option<String>,
    /// `None` when the chord list is absent, which is not the same as an empty list.
    #[serde(default)]
    pub chords: Option<Vec<Chord>>,
}

impl Progression {
    pub fn from_chords(name: impl Into<String>, chords: Vec<Chord>) -> Self {
        Self {
            name: Some(name.into()),
            chords: Some(chords),
            ..Default::default()
        }
    }
}

/// The document shape produced by the chord progression generator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChordProgressionResponse {
    pub progressions: Vec<Progression>,
    #[serde(default)]
    pub display_text: String,
}

/// Payload of a `generateMidi` request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct MidiRequest {
    #[serde(default)]
    pub progression: Option<Progression>,
}

/// Any JSON document that carries progressions. The shape is picked from the top-level keys:
/// `progressions` is a generator response, `progression` (or an empty object) is a request, and
/// anything else is a single progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressionDocument {
    Response(ChordProgressionResponse),
    Request(MidiRequest),
    Single(Progression),
}

impl<'de> Deserialize<'de> for ProgressionDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;

        let is_request = match &value {
            Value::Object(fields) => fields.is_empty() || fields.contains_key("progression"),
            _ => false,
        };

        // Only the chosen shape is tried, so its own error is the one reported.
        let document = if value.get("progressions").is_some() {
            serde_json::from_value(value).map(ProgressionDocument::Response)
        } else if is_request {
            serde_json::from_value(value).map(ProgressionDocument::Request)
        } else {
            serde_json::from_value(value).map(ProgressionDocument::Single)
        };

        document.map_err(D::Error::custom)
    }
}

impl ProgressionDocument {
    /// Flattens the document into its progressions. A request without a progression yields `None`
    /// in its single slot so the caller can report it as missing.
    pub fn into_progressions(self) -> Vec<Option<Progression>> {
        match self {
            ProgressionDocument::Response(response) => {
                response.progressions.into_iter().map(Some).collect()
            }
            ProgressionDocument::Request(request) => vec![request.progression],
            ProgressionDocument::Single(progression) => vec![Some(progression)],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn response_document_uses_camel_case() {
        let json = r#"{
            "displayText": "Two lofi progressions",
            "progressions": [
                {
                    "name": "Rainy Window",
                    "key": "C major",
                    "mood": "wistful",
                    "chords": [
                        { "name": "Cmaj7", "midiNotes": [60, 64, 67, 71] },
                        { "name": "Am7", "midiNotes": [57, 60, 64, 67] }
                    ]
                },
                { "name": "Empty", "key": "A minor", "mood": "quiet", "chords": [] }
            ]
        }"#;

        let doc: ProgressionDocument = serde_json::from_str(json).unwrap();
        let ProgressionDocument::Response(response) = doc else {
            panic!("expected a response document, got {:?}", doc);
        };

        assert_eq!(response.display_text, "Two lofi progressions");
        assert_eq!(response.progressions.len(), 2);

        let first = &response.progressions[0];
        assert_eq!(first.name.as_deref(), Some("Rainy Window"));
        assert_eq!(
            first.chords.as_ref().unwrap()[0],
            Chord::new("Cmaj7", [60, 64, 67, 71])
        );
        assert_eq!(response.progressions[1].chords, Some(vec![]));
    }

    #[test]
    fn request_document_with_and_without_progression() {
        let doc: ProgressionDocument =
            serde_json::from_str(r#"{ "progression": { "chords": [] } }"#).unwrap();
        assert_eq!(
            doc.into_progressions(),
            vec![Some(Progression {
                chords: Some(vec![]),
                ..Default::default()
            })]
        );

        let doc: ProgressionDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.into_progressions(), vec![None]);
    }

    #[test]
    fn single_progression_with_absent_chords() {
        let doc: ProgressionDocument =
            serde_json::from_str(r#"{ "name": "Nothing", "mood": "blank" }"#).unwrap();

        let progressions = doc.into_progressions();
        assert_eq!(progressions.len(), 1);

        let progression = progressions[0].as_ref().unwrap();
        assert_eq!(progression.name.as_deref(), Some("Nothing"));
        assert_eq!(progression.chords, None);
    }

    #[test]
    fn malformed_response_reports_the_type_error() {
        let json = r#"{
            "displayText": "x",
            "progressions": [
                { "name": "P", "chords": [{ "name": "C", "midiNotes": [60.5] }] }
            ]
        }"#;

        let err = serde_json::from_str::<ProgressionDocument>(json).unwrap_err();
        assert!(err.to_string().contains("60.5"), "{}", err);

        let json = r#"{ "progressions": [{ "chords": [{ "midiNotes": [60] }] }] }"#;
        let err = serde_json::from_str::<ProgressionDocument>(json).unwrap_err();
        assert!(err.to_string().contains("name"), "{}", err);
    }

    #[test]
    fn request_with_extra_keys_is_rejected() {
        let json = r#"{ "progression": { "chords": [] }, "action": "generateMidi" }"#;
        assert!(serde_json::from_str::<ProgressionDocument>(json).is_err());
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(serde_json::from_str::<ProgressionDocument>("[1, 2, 3]").is_err());
    }

    #[test]
    fn chord_serializes_midi_notes_in_camel_case() {
        let json = serde_json::to_string(&Chord::new("G", [67, 71, 74])).unwrap();
        assert_eq!(json, r#"{"name":"G","midiNotes":[67,71,74]}"#);
    }
}
