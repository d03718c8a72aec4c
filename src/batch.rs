use crate::exporter::{SustainDelta, encode_progression_with};
use crate::midi_importer::{ImportedTrack, import_midi_bytes, import_midi_file};
use crate::model::config::Args;
use crate::model::progression::{Progression, ProgressionDocument};
use crate::util::{
    OutputFormat, midi_data_uri, midi_file_name, note_name, parse_output_format, parse_sustain,
};
use anyhow::{Context, Result, bail};
use base64::Engine;
use log::{debug, info};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The result of exporting one progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Export {
    /// A `.mid` file was written.
    Written(PathBuf),

    /// Text meant for stdout (base64 or a data URI).
    Printed(String),

    /// Dry run preview lines.
    Previewed(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct BatchExporter {
    output_dir: PathBuf,
    format: OutputFormat,
    layout: SustainDelta,
    dry_run_max: Option<usize>,
}

impl BatchExporter {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        format: OutputFormat,
        layout: SustainDelta,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
            layout,
            dry_run_max: None,
        }
    }

    pub fn from_args(args: &Args) -> Self {
        let mut exporter = Self::new(
            &args.output,
            parse_output_format(&args.format),
            parse_sustain(&args.sustain),
        );
        if args.dry_run {
            exporter = exporter.dry_run(args.dry_run_max);
        }
        exporter
    }

    pub fn dry_run(mut self, max: usize) -> Self {
        self.dry_run_max = Some(max);
        self
    }

    /// Exports every progression in order. Everything is encoded before the first file is
    /// written, so a missing progression or a rejected chord leaves no output behind.
    pub fn run(&self, progressions: Vec<Option<Progression>>) -> Result<Vec<Export>> {
        let mut prepared = Vec::with_capacity(progressions.len());

        for (i, progression) in progressions.into_iter().enumerate() {
            let Some(progression) = progression else {
                bail!("Progression data is required for MIDI generation (entry {})..!", i);
            };

            let entry = self
                .prepare(&progression)
                .with_context(|| format!("Failed to export progression {}", i))?;
            prepared.push(entry);
        }

        let mut used_names: HashSet<String> = HashSet::new();
        prepared
            .into_iter()
            .map(|entry| self.emit(entry, &mut used_names))
            .collect()
    }

    fn prepare(&self, progression: &Progression) -> Result<Prepared> {
        if let Some(max) = self.dry_run_max {
            return Ok(Prepared::Preview(preview(progression, max)?));
        }

        Ok(Prepared::Encoded {
            name: progression.name.clone(),
            smf: encode_progression_with(progression, self.layout)?,
        })
    }

    fn emit(&self, entry: Prepared, used_names: &mut HashSet<String>) -> Result<Export> {
        let (name, smf) = match entry {
            Prepared::Preview(lines) => return Ok(Export::Previewed(lines)),
            Prepared::Encoded { name, smf } => (name, smf),
        };

        match self.format {
            OutputFormat::Mid => {
                let file_name = unique_file_name(name.as_deref(), used_names);
                let path = self.output_dir.join(file_name);

                fs::write(&path, &smf)
                    .with_context(|| format!("Failed to write MIDI file {}", path.display()))?;
                info!("Wrote {} bytes to '{}'..!", smf.len(), path.display());

                Ok(Export::Written(path))
            }
            OutputFormat::Base64 => Ok(Export::Printed(
                base64::engine::general_purpose::STANDARD.encode(&smf),
            )),
            OutputFormat::DataUri => Ok(Export::Printed(midi_data_uri(&smf))),
        }
    }
}

/// A progression that passed encoding and is waiting to be written.
enum Prepared {
    Encoded { name: Option<String>, smf: Vec<u8> },
    Preview(Vec<String>),
}

/// Reads a `.mid` file back and lists its notes, the same way a dry run does.
pub fn verify_midi_file(path: &Path, max: usize) -> Result<Vec<String>> {
    let track = import_midi_file(path)?;
    let chords = track.chords().len();

    Ok(describe_track(&path.display().to_string(), chords, &track, max))
}

/// Reads the progressions of a JSON document, `-` meaning stdin. A JSON `null` document is a
/// single absent progression.
pub fn read_progressions(path: &Path) -> Result<Vec<Option<Progression>>> {
    let text = if path.as_os_str() == "-" {
        io::read_to_string(io::stdin())
            .context("Failed to read progression document from stdin")?
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read progression document {}", path.display()))?
    };

    parse_progressions(&text)
}

pub fn parse_progressions(text: &str) -> Result<Vec<Option<Progression>>> {
    let document: Option<ProgressionDocument> =
        serde_json::from_str(text).context("Failed to parse progression document")?;

    let progressions = match document {
        Some(document) => document.into_progressions(),
        None => vec![None],
    };
    debug!("Progression document holds {} entries..!", progressions.len());

    Ok(progressions)
}

pub fn select_progression(
    mut progressions: Vec<Option<Progression>>,
    index: Option<usize>,
) -> Result<Vec<Option<Progression>>> {
    let Some(index) = index else {
        return Ok(progressions);
    };

    if index >= progressions.len() {
        bail!(
            "Progression index {} is out of range, the document holds {}..!",
            index,
            progressions.len()
        );
    }

    Ok(vec![progressions.swap_remove(index)])
}

/// Decodes the progression through a MIDI reader and lists its notes in time order.
fn preview(progression: &Progression, max: usize) -> Result<Vec<String>> {
    // Same timeline as the standalone layout, but readable by running-status parsers.
    let smf = encode_progression_with(progression, SustainDelta::Folded)?;
    let track = import_midi_bytes(&smf)?;

    Ok(describe_track(
        progression.name.as_deref().unwrap_or("<untitled>"),
        progression.chords.as_ref().map_or(0, Vec::len),
        &track,
        max,
    ))
}

fn describe_track(label: &str, chords: usize, track: &ImportedTrack, max: usize) -> Vec<String> {
    let mut lines = vec![format!(
        "Progression '{}': {} chord(s), {} note(s), {} ticks at {} ppqn",
        label,
        chords,
        track.intervals.len(),
        track.end_tick,
        track.ticks_per_quarter
    )];

    for (i, interval) in track.intervals.iter().take(max).enumerate() {
        lines.push(format!(
            "Note {}: midi={} ({}) start_tick={} dur_ticks={} vel={}",
            i,
            interval.midi,
            note_name(interval.midi),
            interval.start_tick,
            interval.end_tick - interval.start_tick,
            interval.velocity
        ));
    }

    lines
}

fn unique_file_name(progression_name: Option<&str>, used_names: &mut HashSet<String>) -> String {
    let base = midi_file_name(progression_name);
    let mut name = base.clone();
    let mut n = 2;

    while used_names.contains(&name) {
        name = format!("{}-{}.mid", base.trim_end_matches(".mid"), n);
        n += 1;
    }

    used_names.insert(name.clone());
    name
}
