use anyhow::{Result, bail};
use chord_forge::{
    Args, BatchExporter, Export, read_progressions, select_progression, verify_midi_file,
};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(midi) = args.verify.as_deref() {
        info!("Verifying MIDI file: '{}'...", midi.display());
        for line in verify_midi_file(midi, args.dry_run_max)? {
            info!("{}", line);
        }
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        bail!("No progression document given..!");
    };

    info!("Reading progressions from: '{}'...", input.display());
    let progressions = select_progression(read_progressions(input)?, args.progression)?;

    if args.verbose {
        for (i, progression) in progressions.iter().enumerate() {
            let Some(progression) = progression else {
                continue;
            };
            info!(
                "Progression {}: '{}' in {} ({}) with {} chord(s)..!",
                i,
                progression.name.as_deref().unwrap_or("<untitled>"),
                progression.key.as_deref().unwrap_or("<unknown key>"),
                progression.mood.as_deref().unwrap_or("<no mood>"),
                progression.chords.as_ref().map_or(0, Vec::len)
            );
        }
    }

    let exporter = BatchExporter::from_args(&args);
    debug!("Exporting with {:?}", exporter);

    for export in exporter.run(progressions)? {
        match export {
            Export::Written(path) => info!("Saved '{}'..!", path.display()),
            Export::Printed(text) => println!("{}", text),
            Export::Previewed(lines) => {
                for line in lines {
                    info!("{}", line);
                }
            }
        }
    }

    Ok(())
}
