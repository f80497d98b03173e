use anyhow::{Result, bail};
use clap::Parser;
use log::{debug, info};
use piano_midi::{Args, Metadata, MidiLoader, NoteEvent, TempoChange, note_name, note_number};
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    metadata: &'a Metadata,
    key_signature: &'a str,
    tempo_changes: &'a [TempoChange],
    notes: &'a [NoteEvent],
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(name) = args.note_name.as_deref() {
        let number = note_number(name)?;
        println!("{} = {}", name, number);
        return Ok(());
    }

    let mut loader = MidiLoader::new(args.dir.clone());

    let Some(path) = args.midi.as_ref() else {
        let files = loader.available_midi_files();
        info!("Found {} MIDI file(s)..!", files.len());
        for file in files {
            println!("{}", file);
        }
        return Ok(());
    };

    info!("Loading MIDI file: '{}'...", path.display());
    if !loader.load(path) {
        bail!("Could not load MIDI file '{}'..!", path.display());
    }

    let Some(metadata) = loader.metadata() else {
        bail!("No metadata after loading '{}'..!", path.display());
    };

    if args.json {
        let report = Report {
            metadata,
            key_signature: loader.key_signature(),
            tempo_changes: loader.tempo_changes(),
            notes: loader.note_events(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&loader, metadata);

    if args.melodies {
        let melodies = loader.extract_melodies(args.min_notes);
        println!("\n{} melody line(s):", melodies.len());
        for melody in melodies.iter().take(args.max_events) {
            let names: Vec<String> = melody.iter().map(|n| n.name()).collect();
            println!(
                "  track {} ch{} ({} notes): {}",
                melody[0].track,
                melody[0].channel,
                melody.len(),
                names.join(" ")
            );
        }
    }

    if args.chords {
        let chords = loader.extract_chords(args.max_start_diff);
        println!("\n{} chord(s):", chords.len());
        for chord in chords.iter().take(args.max_events) {
            let names: Vec<String> = chord.iter().map(|n| n.name()).collect();
            println!("  {:>8.3}s  {}", chord[0].start_time, names.join(" "));
        }
    }

    if !args.melodies && !args.chords {
        let mut notes: Vec<&NoteEvent> = match (args.from, args.to) {
            (None, None) => loader.note_events().iter().collect(),
            (from, to) => {
                loader.notes_in_range(from.unwrap_or(0.0), to.unwrap_or(metadata.total_time))
            }
        };
        if let Some(track) = args.track {
            notes.retain(|n| n.track == track);
        }
        if let Some(channel) = args.channel {
            notes.retain(|n| n.channel == channel);
        }

        debug!("{} note(s) after filtering..!", notes.len());
        println!("\nPrinting at most {} of {} note(s):", args.max_events, notes.len());
        for note in notes.iter().take(args.max_events) {
            println!(
                "  {:>8.3}s  {:<4} ({:>3}) vel={:<3} dur={:.3}s track={} ch={}{}",
                note.start_time,
                note.name(),
                note.note,
                note.velocity,
                note.duration(),
                note.track,
                note.channel,
                if note.is_black_key() { " [black]" } else { "" }
            );
        }
    }

    Ok(())
}

fn print_summary(loader: &MidiLoader, metadata: &Metadata) {
    println!("File:           {}", metadata.filename);
    println!("Format:         {}", metadata.format_type);
    println!("Tracks:         {}", metadata.num_tracks);
    println!("Ticks per beat: {}", metadata.ticks_per_beat);
    println!("Length:         {:.3}s", metadata.total_time);
    println!(
        "Time signature: {}/{}",
        metadata.time_signature.0, metadata.time_signature.1
    );
    println!(
        "Tempo:          {} us/beat ({:.1} bpm)",
        metadata.tempo,
        metadata.bpm()
    );
    println!("Key:            {}", loader.key_signature());
    println!("Notes:          {}", loader.note_events().len());

    if let (Some(low), Some(high)) = (loader.lowest_note(), loader.highest_note()) {
        println!("Range:          {} - {}", note_name(low), note_name(high));
    }
}
