use thiserror::Error;

/// Result type for MIDI export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while encoding a progression to a Standard MIDI File.
///
/// Every variant is a caller bug (bad input), never a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// A delta-time below zero was handed to the VLQ writer.
    #[error("invalid argument: cannot write negative variable-length quantity {0}")]
    NegativeDelta(i64),

    /// A delta-time that does not fit in four VLQ bytes.
    #[error("invalid argument: variable-length quantity {0} exceeds 0x0FFFFFFF")]
    DeltaOverflow(i64),

    /// A note number outside of the MIDI range.
    #[error("invalid argument: note {note} in chord '{chord}' is outside 0..=127")]
    NoteOutOfRange {
        /// Name of the chord containing the note.
        chord: String,
        /// The offending note number.
        note: i64,
    },

    /// The progression or its chord list was not supplied at all.
    #[error("missing data: {0}")]
    MissingData(&'static str),

    /// The event stream does not fit in a 32-bit chunk length.
    #[error("track of {0} bytes does not fit in an MTrk chunk")]
    TrackTooLong(usize),
}

impl ExportError {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ExportError::NegativeDelta(_)
                | ExportError::DeltaOverflow(_)
                | ExportError::NoteOutOfRange { .. }
        )
    }
}
