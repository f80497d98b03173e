use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "piano_midi",
    about = "Inspect the notes, chords and melodies of a MIDI file for piano practice."
)]
pub struct Args {
    /// Path to the target MIDI file.
    pub midi: Option<PathBuf>,

    /// Directory of MIDI files. Without a MIDI file, its .mid/.midi files are listed.
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Print metadata and all notes as JSON instead of a text summary.
    #[arg(short, long, default_value_t = false)]
    pub json: bool,

    /// Maximum notes (or groups) to print.
    #[arg(long, default_value_t = 40)]
    pub max_events: usize,

    /// Only print notes from this track.
    #[arg(long)]
    pub track: Option<usize>,

    /// Only print notes on this MIDI channel (0-15).
    #[arg(long)]
    pub channel: Option<u8>,

    /// Only print notes sounding after this time, in seconds.
    #[arg(long)]
    pub from: Option<f64>,

    /// Only print notes sounding before this time, in seconds.
    #[arg(long)]
    pub to: Option<f64>,

    /// Print melody lines (one per busy track/channel voice).
    #[arg(short, long, default_value_t = false)]
    pub melodies: bool,

    /// Minimum notes for a voice to count as a melody.
    #[arg(long, default_value_t = 10)]
    pub min_notes: usize,

    /// Print chords (notes grouped by start time).
    #[arg(short, long, default_value_t = false)]
    pub chords: bool,

    /// Maximum spread in seconds between the first and last note start of a chord.
    #[arg(long, default_value_t = 0.05)]
    pub max_start_diff: f64,

    /// Convert a note name such as `F#4` to its MIDI number and exit.
    #[arg(long)]
    pub note_name: Option<String>,
}
