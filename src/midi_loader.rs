use crate::analysis::{group_chords, group_melodies};
use crate::model::note_name::key_signature_name;
use crate::model::song::*;
use crate::util::{list_midi_files, ticks_to_seconds};
use anyhow::{Result, anyhow};
use log::{debug, error, info, warn};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Returned by [`MidiLoader::key_signature`] when the file carries no key-signature event.
pub const UNKNOWN_KEY: &str = "Unknown";

/// (track, channel, note)
type VoiceKey = (usize, u8, u8);

/// Tempo used to turn ticks into seconds. Answers every lookup with the tempo the file starts
/// with, so mid-file tempo changes do not affect note timing.
#[derive(Debug, Clone, Copy)]
struct StaticTempo {
    microseconds_per_beat: u32,
}

impl StaticTempo {
    /// First set-tempo event sitting at tick 0 of any track, else 120bpm.
    fn of(smf: &Smf) -> Self {
        let initial = smf.tracks.iter().find_map(|track| {
            track
                .iter()
                .take_while(|event| event.delta.as_int() == 0)
                .find_map(|event| match event.kind {
                    TrackEventKind::Meta(MetaMessage::Tempo(micro)) => Some(micro.as_int()),
                    _ => None,
                })
        });

        Self {
            microseconds_per_beat: initial.unwrap_or(DEFAULT_TEMPO),
        }
    }

    fn tempo_at(&self, _time_seconds: f64) -> u32 {
        self.microseconds_per_beat
    }
}

/// Everything pulled out of one source, committed to the loader in one step.
struct Extracted {
    header: Header,
    note_events: Vec<NoteEvent>,
    tempo_changes: Vec<TempoChange>,
    metadata: Metadata,
}

/// Holds the notes and metadata of one loaded MIDI file at a time.
///
/// Not meant to be shared between threads while loading; use one loader per file when analysing
/// several files concurrently.
#[derive(Debug, Default)]
pub struct MidiLoader {
    midi_directory: Option<PathBuf>,
    source: Option<Header>,
    current_file_path: Option<PathBuf>,
    note_events: Vec<NoteEvent>,
    tempo_changes: Vec<TempoChange>,
    metadata: Option<Metadata>,
}

impl MidiLoader {
    pub fn new(midi_directory: Option<PathBuf>) -> Self {
        Self {
            midi_directory,
            ..Self::default()
        }
    }

    /// MIDI file names found in the configured directory.
    pub fn available_midi_files(&self) -> Vec<String> {
        list_midi_files(self.midi_directory.as_deref())
    }

    /// Loads `path`, replacing whatever was loaded before.
    ///
    /// On failure the error is logged, the loader is left empty and `false` is returned.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> bool {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let extracted = fs::read(path)
            .map_err(|e| anyhow!("Failed to read MIDI file: {}", e))
            .and_then(|bytes| extract(&bytes, &filename));

        self.commit(path.to_path_buf(), extracted)
    }

    /// Same as [`MidiLoader::load`] for a file already in memory. `filename` stands in for the
    /// path.
    pub fn load_bytes(&mut self, bytes: &[u8], filename: &str) -> bool {
        let extracted = extract(bytes, filename);
        self.commit(PathBuf::from(filename), extracted)
    }

    fn commit(&mut self, path: PathBuf, extracted: Result<Extracted>) -> bool {
        match extracted {
            Ok(extracted) => {
                info!(
                    "Loaded MIDI file {} with {} notes over {:.3}s..!",
                    path.display(),
                    extracted.note_events.len(),
                    extracted.metadata.total_time
                );

                self.source = Some(extracted.header);
                self.current_file_path = Some(path);
                self.note_events = extracted.note_events;
                self.tempo_changes = extracted.tempo_changes;
                self.metadata = Some(extracted.metadata);
                true
            }
            Err(e) => {
                error!("Error loading MIDI file {}: {:#}", path.display(), e);
                self.reset();
                false
            }
        }
    }

    fn reset(&mut self) {
        self.source = None;
        self.current_file_path = None;
        self.note_events.clear();
        self.tempo_changes.clear();
        self.metadata = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Header of the loaded source.
    pub fn source_header(&self) -> Option<&Header> {
        self.source.as_ref()
    }

    pub fn current_file_path(&self) -> Option<&Path> {
        self.current_file_path.as_deref()
    }

    /// All notes, sorted by start time.
    pub fn note_events(&self) -> &[NoteEvent] {
        &self.note_events
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Every set-tempo event in the file, sorted by time. Informational only: note timing uses
    /// the initial tempo throughout.
    pub fn tempo_changes(&self) -> &[TempoChange] {
        &self.tempo_changes
    }

    /// Notes sounding at any point of `[start, end]`, bounds inclusive.
    pub fn notes_in_range(&self, start: f64, end: f64) -> Vec<&NoteEvent> {
        self.note_events
            .iter()
            .filter(|note| note.start_time <= end && note.end_time >= start)
            .collect()
    }

    pub fn notes_by_track(&self, track: usize) -> Vec<&NoteEvent> {
        self.note_events
            .iter()
            .filter(|note| note.track == track)
            .collect()
    }

    pub fn notes_by_channel(&self, channel: u8) -> Vec<&NoteEvent> {
        self.note_events
            .iter()
            .filter(|note| note.channel == channel)
            .collect()
    }

    pub fn highest_note(&self) -> Option<u8> {
        self.note_events.iter().map(|note| note.note).max()
    }

    pub fn lowest_note(&self) -> Option<u8> {
        self.note_events.iter().map(|note| note.note).min()
    }

    /// Key from the file's key-signature event, or [`UNKNOWN_KEY`].
    pub fn key_signature(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.key_signature.as_deref())
            .unwrap_or(UNKNOWN_KEY)
    }

    /// See [`group_melodies`].
    pub fn extract_melodies(&self, min_notes: usize) -> Vec<Vec<&NoteEvent>> {
        group_melodies(&self.note_events, min_notes)
    }

    /// See [`group_chords`].
    pub fn extract_chords(&self, max_start_diff: f64) -> Vec<Vec<&NoteEvent>> {
        group_chords(&self.note_events, max_start_diff)
    }
}

fn extract(bytes: &[u8], filename: &str) -> Result<Extracted> {
    let smf = Smf::parse(bytes).map_err(|e| anyhow!("Failed to parse MIDI: {:?}", e))?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) if t.as_int() == 0 => {
            return Err(anyhow!("MIDI header has zero ticks per beat..!"));
        }
        Timing::Metrical(t) => t.as_int(),
        Timing::Timecode(_fps, _subframe) => {
            return Err(anyhow!(
                "SMPTE timecode midi timing is not currently supported..!"
            ));
        }
    };

    debug!(
        "MIDI format: {:?}, tracks: {}, ticks per beat: {}",
        smf.header.format,
        smf.tracks.len(),
        ticks_per_beat
    );

    let tempo = StaticTempo::of(&smf);
    let note_events = extract_note_events(&smf, ticks_per_beat, tempo);
    let tempo_changes = extract_tempo_changes(&smf, ticks_per_beat, tempo);
    let metadata = extract_metadata(&smf, filename, ticks_per_beat, &note_events);

    Ok(Extracted {
        header: smf.header,
        note_events,
        tempo_changes,
        metadata,
    })
}

/// Pairs every onset with the next termination of the same (track, channel, note).
///
/// A repeated onset replaces the pending one, terminations without a pending onset are skipped
/// and onsets still pending at the end of their track are dropped.
fn extract_note_events(smf: &Smf, ticks_per_beat: u16, tempo: StaticTempo) -> Vec<NoteEvent> {
    let mut events: Vec<NoteEvent> = Vec::new();
    let mut pending: HashMap<VoiceKey, (f64, u8)> = HashMap::new();

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        let mut now: f64 = 0.0;

        for event in track.iter() {
            now += ticks_to_seconds(
                event.delta.as_int() as u64,
                ticks_per_beat,
                tempo.tempo_at(now),
            );

            let TrackEventKind::Midi { channel, message } = event.kind else {
                continue;
            };
            let ch: u8 = channel.as_int();

            match message {
                MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                    let note = key.as_int();
                    if let Some((earlier, _)) =
                        pending.insert((track_idx, ch, note), (now, vel.as_int()))
                    {
                        debug!(
                            "Repeated NoteOn for {} ch{} on track {} at {:.3}s replaces the one at {:.3}s..!",
                            note, ch, track_idx, now, earlier
                        );
                    }
                }
                // NoteOn with zero velocity ends the note just like NoteOff
                MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                    let note = key.as_int();
                    match pending.remove(&(track_idx, ch, note)) {
                        Some((start_time, velocity)) => events.push(NoteEvent {
                            note,
                            velocity,
                            start_time,
                            end_time: now,
                            track: track_idx,
                            channel: ch,
                        }),
                        None => debug!(
                            "Orphaned NoteOff for {} ch{} on track {} at {:.3}s..!",
                            note, ch, track_idx, now
                        ),
                    }
                }
                _ => {}
            }
        }
    }

    for ((track_idx, ch, note), (start_time, _)) in pending.iter() {
        debug!(
            "Dropping unclosed NoteOn for {} ch{} on track {} at {:.3}s..!",
            note, ch, track_idx, start_time
        );
    }

    events.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    events
}

fn extract_tempo_changes(smf: &Smf, ticks_per_beat: u16, tempo: StaticTempo) -> Vec<TempoChange> {
    let mut changes: Vec<TempoChange> = Vec::new();

    for track in smf.tracks.iter() {
        let mut now: f64 = 0.0;
        for event in track.iter() {
            now += ticks_to_seconds(
                event.delta.as_int() as u64,
                ticks_per_beat,
                tempo.tempo_at(now),
            );

            if let TrackEventKind::Meta(MetaMessage::Tempo(micro)) = event.kind {
                changes.push(TempoChange {
                    time: now,
                    microseconds_per_beat: micro.as_int(),
                });
            }
        }
    }

    changes.sort_by(|a, b| a.time.total_cmp(&b.time));
    changes
}

/// First time signature, tempo and key signature found across the tracks, in file order.
fn extract_metadata(
    smf: &Smf,
    filename: &str,
    ticks_per_beat: u16,
    note_events: &[NoteEvent],
) -> Metadata {
    let mut time_signature: Option<(u8, u8)> = None;
    let mut tempo: Option<u32> = None;
    let mut key_signature: Option<String> = None;

    for (track_idx, track) in smf.tracks.iter().enumerate() {
        for event in track.iter() {
            let TrackEventKind::Meta(meta) = event.kind else {
                continue;
            };

            match meta {
                MetaMessage::TimeSignature(numerator, denom_pow, _, _)
                    if time_signature.is_none() =>
                {
                    match 1u8.checked_shl(denom_pow.into()) {
                        Some(denominator) => time_signature = Some((numerator, denominator)),
                        None => warn!(
                            "Ignoring time signature {}/2^{} on track {}..!",
                            numerator, denom_pow, track_idx
                        ),
                    }
                }
                MetaMessage::Tempo(micro) if tempo.is_none() => {
                    tempo = Some(micro.as_int());
                }
                MetaMessage::KeySignature(sharps_flats, minor) if key_signature.is_none() => {
                    match key_signature_name(sharps_flats, minor) {
                        Some(key) => key_signature = Some(key.to_string()),
                        None => warn!(
                            "Ignoring key signature with {} sharps/flats on track {}..!",
                            sharps_flats, track_idx
                        ),
                    }
                }
                _ => {}
            }
        }
    }

    let format_type = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };

    let total_time = note_events
        .iter()
        .map(|note| note.end_time)
        .fold(0.0, f64::max);

    Metadata {
        filename: filename.to_string(),
        format_type,
        num_tracks: smf.tracks.len(),
        ticks_per_beat,
        total_time,
        time_signature: time_signature.unwrap_or(DEFAULT_TIME_SIGNATURE),
        tempo: tempo.unwrap_or(DEFAULT_TEMPO),
        key_signature,
    }
}
