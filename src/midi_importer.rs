use crate::model::progression::Chord;
use crate::util::note_name;
use anyhow::{Result, anyhow, bail};
use log::{debug, warn};
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// A sounding note recovered from a track, in absolute ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInterval {
    pub midi: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    pub velocity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTrack {
    pub ticks_per_quarter: u64,
    /// Note-On keys grouped by the tick they start on, in the order they appear in the track.
    pub onsets: BTreeMap<u64, Vec<u8>>,
    pub intervals: Vec<NoteInterval>,
    /// Absolute tick of the End-of-Track event (or of the last event when it is missing).
    pub end_tick: u64,
}

impl ImportedTrack {
    /// Rebuilds chords from simultaneous Note-Ons. Silent chords cannot be recovered.
    pub fn chords(&self) -> Vec<Chord> {
        self.onsets
            .values()
            .map(|keys| {
                let name = keys
                    .iter()
                    .map(|&key| note_name(key))
                    .collect::<Vec<_>>()
                    .join("-");
                Chord::new(name, keys.iter().map(|&key| key as i64).collect::<Vec<_>>())
            })
            .collect()
    }
}

pub fn import_midi_file<P: AsRef<Path>>(path: P) -> Result<ImportedTrack> {
    let bytes = fs::read(path.as_ref()).map_err(|e| {
        anyhow!(
            "Failed to read MIDI file {}: {}",
            path.as_ref().display(),
            e
        )
    })?;

    import_midi_bytes(&bytes)
}

pub fn import_midi_bytes(bytes: &[u8]) -> Result<ImportedTrack> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(t) => t.as_int() as u64,
        Timing::Timecode(_fps, _subframe) => {
            bail!("SMPTE timecode midi timing is not supported..!");
        }
    };

    if !matches!(smf.header.format, Format::SingleTrack) || smf.tracks.len() != 1 {
        bail!(
            "Expected a single track (format 0) MIDI file, found {:?} with {} track(s)..!",
            smf.header.format,
            smf.tracks.len()
        );
    }

    debug!("Ticks per quarter note: {}", ticks_per_quarter);

    let mut onsets: BTreeMap<u64, Vec<u8>> = BTreeMap::new();
    let mut intervals: Vec<NoteInterval> = Vec::new();
    let mut open_notes: HashMap<u8, Vec<(u64, u8)>> = HashMap::new();
    let mut abs_tick: u64 = 0;
    let mut end_tick: Option<u64> = None;

    for event in smf.tracks[0].iter() {
        abs_tick = abs_tick.saturating_add(event.delta.as_int() as u64);

        match &event.kind {
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                end_tick = Some(abs_tick);
            }
            TrackEventKind::Midi { channel: _, message } => match message {
                MidiMessage::NoteOn { key, vel } => {
                    let velocity: u8 = vel.as_int();

                    if velocity == 0 {
                        close_note(&mut open_notes, &mut intervals, key.as_int(), abs_tick);
                    } else {
                        onsets.entry(abs_tick).or_default().push(key.as_int());
                        open_notes
                            .entry(key.as_int())
                            .or_default()
                            .push((abs_tick, velocity));
                    }
                }
                MidiMessage::NoteOff { key, vel: _ } => {
                    close_note(&mut open_notes, &mut intervals, key.as_int(), abs_tick);
                }
                _ => {}
            },
            _ => {}
        }
    }

    let end_tick = end_tick.unwrap_or(abs_tick);

    for (key, stack) in open_notes.into_iter() {
        for (start_tick, velocity) in stack {
            warn!(
                "Unclosed NoteOn for {} at tick: {} auto-closing at: {}..!",
                key, start_tick, end_tick
            );

            intervals.push(NoteInterval {
                midi: key,
                start_tick,
                end_tick,
                velocity,
            });
        }
    }

    intervals.sort_by_key(|interval| (interval.start_tick, interval.midi));

    Ok(ImportedTrack {
        ticks_per_quarter,
        onsets,
        intervals,
        end_tick,
    })
}

fn close_note(
    open_notes: &mut HashMap<u8, Vec<(u64, u8)>>,
    intervals: &mut Vec<NoteInterval>,
    midi_num: u8,
    abs_tick: u64,
) {
    // Oldest first, so duplicate keys in a chord close in the order they opened.
    match open_notes.get_mut(&midi_num) {
        Some(stack) if !stack.is_empty() => {
            let (start_tick, velocity) = stack.remove(0);
            intervals.push(NoteInterval {
                midi: midi_num,
                start_tick,
                end_tick: abs_tick,
                velocity,
            });
        }
        _ => {
            debug!("Orphaned NoteOff for {} at tick {}..!", midi_num, abs_tick);
        }
    }
}
