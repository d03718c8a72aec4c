use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "chord_forge",
    about = "Turn chord progressions into Standard MIDI Files!"
)]
pub struct Args {
    /// Path to a JSON progression document, or `-` to read it from stdin.
    /// Accepts a generator response, a single progression, or a `{ "progression": ... }` request.
    #[arg(required_unless_present = "verify")]
    pub input: Option<PathBuf>,

    /// Read a `.mid` file back, print its notes and exit. Files written with `--sustain folded`
    /// are the ones strict MIDI readers accept.
    #[arg(long, value_name = "MIDI_FILE", conflicts_with = "input")]
    pub verify: Option<PathBuf>,

    /// Only export the progression at this index (0-based). Exports every progression when omitted.
    #[arg(short, long)]
    pub progression: Option<usize>,

    /// Directory that `.mid` files are written to.
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// What to produce: mid|base64|data-uri. `base64` and `data-uri` print to stdout.
    #[arg(short, long, default_value = "mid")]
    pub format: String,

    /// Where the whole-note wait between chords is written: standalone|folded.
    /// `folded` attaches it to the next event so that strict MIDI readers accept the file.
    #[arg(short, long, default_value = "standalone")]
    pub sustain: String,

    /// Dry run (print the first dry_run_max notes of each progression and exit).
    #[arg(short, long, default_value_t = false)]
    pub dry_run: bool,

    /// Maximum notes to print per progression in dry run.
    #[arg(long, default_value_t = 80)]
    pub dry_run_max: usize,

    /// Prints extra information to the terminal.
    #[arg(short, long)]
    pub verbose: bool,
}
