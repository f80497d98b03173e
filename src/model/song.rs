use crate::model::note_name::note_name;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPO: u32 = 500_000;
pub const DEFAULT_TIME_SIGNATURE: (u8, u8) = (4, 4);
pub const MICROSECONDS_PER_MINUTE: f64 = 60_000_000.0;

/// One sounded note, paired from an onset and its termination.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NoteEvent {
    pub note: u8,
    pub velocity: u8,
    /// Seconds from the start of the file.
    pub start_time: f64,
    /// Seconds from the start of the file, never before `start_time`.
    pub end_time: f64,
    pub track: usize,
    pub channel: u8,
}

impl NoteEvent {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn is_black_key(&self) -> bool {
        matches!(self.note % 12, 1 | 3 | 6 | 8 | 10)
    }

    pub fn name(&self) -> String {
        note_name(self.note)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub filename: String,
    pub format_type: u8,
    pub num_tracks: usize,
    pub ticks_per_beat: u16,
    /// Latest note end time in seconds, 0 for a file without notes.
    pub total_time: f64,
    /// (numerator, denominator)
    pub time_signature: (u8, u8),
    /// Microseconds per beat.
    pub tempo: u32,
    pub key_signature: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    /// Seconds from the start of the file.
    pub time: f64,
    pub microseconds_per_beat: u32,
}

impl Metadata {
    /// Beats per minute, or 0.0 for a zero tempo.
    pub fn bpm(&self) -> f64 {
        if self.tempo == 0 {
            return 0.0;
        }
        MICROSECONDS_PER_MINUTE / (self.tempo as f64)
    }
}
