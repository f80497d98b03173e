use log::debug;
use std::fs;
use std::path::Path;

const MIDI_EXTENSIONS: [&str; 2] = ["mid", "midi"];

/// Converts a tick count to seconds for the given tempo (microseconds per beat).
pub fn ticks_to_seconds(ticks: u64, ticks_per_beat: u16, tempo: u32) -> f64 {
    (ticks as f64) * (tempo as f64) / (1_000_000.0 * ticks_per_beat as f64)
}

/// File names (not full paths) in `dir` ending in `.mid` or `.midi`, any case.
/// An unset, missing or unreadable directory yields an empty list.
pub fn list_midi_files(dir: Option<&Path>) -> Vec<String> {
    let Some(dir) = dir else {
        return Vec::new();
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list MIDI directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| {
            Path::new(name)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    MIDI_EXTENSIONS
                        .iter()
                        .any(|midi_ext| ext.eq_ignore_ascii_case(midi_ext))
                })
        })
        .collect()
}
