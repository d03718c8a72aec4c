use crate::error::{ExportError, ExportResult};
use crate::exporter::vlq::{push_vlq, vlq_len};
use crate::model::progression::Chord;
use log::debug;

/// Pulses per quarter note, also written to the header's division field.
pub const PPQN: u16 = 480;
/// Every chord is held for one whole note.
pub const WHOLE_NOTE_TICKS: u32 = 4 * PPQN as u32;
pub const END_OF_TRACK_DELTA: u32 = 1;

pub const MIDI_CHANNEL: u8 = 0;
pub const NOTE_OFF_STATUS: u8 = 0x80;
pub const NOTE_ON_STATUS: u8 = 0x90;
pub const META_STATUS: u8 = 0xFF;
pub const META_END_OF_TRACK: u8 = 0x2F;

pub const NOTE_ON_VELOCITY: u8 = 100;
pub const NOTE_OFF_VELOCITY: u8 = 64;

const MAX_NOTE: i64 = 127;

/// The events a chord track is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NoteOn { key: u8, vel: u8 },
    NoteOff { key: u8, vel: u8 },
    EndOfTrack,
}

impl EventKind {
    pub fn note_on(key: u8) -> Self {
        EventKind::NoteOn {
            key,
            vel: NOTE_ON_VELOCITY,
        }
    }

    pub fn note_off(key: u8) -> Self {
        EventKind::NoteOff {
            key,
            vel: NOTE_OFF_VELOCITY,
        }
    }

    /// Writes the event bytes, without the delta-time that precedes them.
    fn write(&self, buf: &mut Vec<u8>) {
        match *self {
            EventKind::NoteOn { key, vel } => {
                buf.extend_from_slice(&[NOTE_ON_STATUS | MIDI_CHANNEL, key, vel])
            }
            EventKind::NoteOff { key, vel } => {
                buf.extend_from_slice(&[NOTE_OFF_STATUS | MIDI_CHANNEL, key, vel])
            }
            EventKind::EndOfTrack => buf.extend_from_slice(&[META_STATUS, META_END_OF_TRACK, 0x00]),
        }
    }
}

/// Where the whole-note wait between chord changes is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SustainDelta {
    /// The wait is written as its own delta-time, ahead of a group of zero-delta events.
    #[default]
    Standalone,

    /// The wait is added to the delta-time of the next event, which keeps the
    /// stream readable by running-status parsers.
    Folded,
}

/// Append-only writer for an `MTrk` event stream.
#[derive(Debug)]
pub struct TrackWriter {
    layout: SustainDelta,
    buf: Vec<u8>,
    pending: i64,
}

impl TrackWriter {
    pub fn with_capacity(layout: SustainDelta, capacity: usize) -> Self {
        Self {
            layout,
            buf: Vec::with_capacity(capacity),
            pending: 0,
        }
    }

    /// Lets `ticks` pass before the next event.
    pub fn wait(&mut self, ticks: u32) -> ExportResult<()> {
        match self.layout {
            SustainDelta::Standalone => push_vlq(&mut self.buf, ticks as i64),
            SustainDelta::Folded => {
                self.pending += ticks as i64;
                Ok(())
            }
        }
    }

    pub fn event(&mut self, delta: u32, kind: EventKind) -> ExportResult<()> {
        push_vlq(&mut self.buf, self.pending + delta as i64)?;
        self.pending = 0;
        kind.write(&mut self.buf);
        Ok(())
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Checks every note of every chord before anything is written.
fn validate_notes(chords: &[Chord]) -> ExportResult<Vec<Vec<u8>>> {
    chords
        .iter()
        .map(|chord| {
            chord
                .midi_notes
                .iter()
                .map(|&note| {
                    if (0..=MAX_NOTE).contains(&note) {
                        Ok(note as u8)
                    } else {
                        Err(ExportError::NoteOutOfRange {
                            chord: chord.name.clone(),
                            note,
                        })
                    }
                })
                .collect::<ExportResult<Vec<u8>>>()
        })
        .collect()
}

/// Upper bound on the stream size for either layout: every note is switched on and off once
/// (four bytes each), every chord adds one whole-note wait, plus the end-of-track event.
fn track_capacity(notes: &[Vec<u8>]) -> usize {
    let note_count: usize = notes.iter().map(Vec::len).sum();
    let sustain = vlq_len(WHOLE_NOTE_TICKS);
    let end_of_track = vlq_len(END_OF_TRACK_DELTA) + 3;

    note_count * 8 + notes.len() * sustain + end_of_track
}

/// Builds the channel 0 event stream for `chords`: each chord sounds for one whole note,
/// and all notes of a chord switch at the same instant in list order.
pub fn build_track(chords: &[Chord], layout: SustainDelta) -> ExportResult<Vec<u8>> {
    let notes = validate_notes(chords)?;
    let mut writer = TrackWriter::with_capacity(layout, track_capacity(&notes));

    if let Some(first) = notes.first() {
        for &key in first {
            writer.event(0, EventKind::note_on(key))?;
        }
    }

    for pair in notes.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        writer.wait(WHOLE_NOTE_TICKS)?;
        for &key in previous {
            writer.event(0, EventKind::note_off(key))?;
        }
        for &key in current {
            writer.event(0, EventKind::note_on(key))?;
        }
    }

    if let Some(last) = notes.last() {
        writer.wait(WHOLE_NOTE_TICKS)?;
        for &key in last {
            writer.event(0, EventKind::note_off(key))?;
        }
    }

    writer.event(END_OF_TRACK_DELTA, EventKind::EndOfTrack)?;

    let track = writer.finish();
    debug!(
        "Built {:?} track of {} bytes for {} chord(s)..!",
        layout,
        track.len(),
        chords.len()
    );

    Ok(track)
}
