use crate::model::song::NoteEvent;
use std::collections::HashMap;

pub const DEFAULT_MIN_MELODY_NOTES: usize = 10;
pub const DEFAULT_MAX_CHORD_START_DIFF: f64 = 0.05;

/// Splits `events` into one voice per `(track, channel)` and keeps the voices holding at least
/// `min_notes` notes. Voices come out in order of first appearance and keep the input order
/// within each voice.
///
/// No contour or rhythm analysis happens here: a "melody" is just a sufficiently busy voice.
pub fn group_melodies(events: &[NoteEvent], min_notes: usize) -> Vec<Vec<&NoteEvent>> {
    let mut voices: Vec<Vec<&NoteEvent>> = Vec::new();
    let mut voice_index: HashMap<(usize, u8), usize> = HashMap::new();

    for event in events {
        let idx = *voice_index
            .entry((event.track, event.channel))
            .or_insert_with(|| {
                voices.push(Vec::new());
                voices.len() - 1
            });
        voices[idx].push(event);
    }

    voices
        .into_iter()
        .filter(|voice| voice.len() >= min_notes)
        .collect()
}

/// Greedily groups time-sorted `events` into chords. An event joins the open chord while its
/// start lies within `max_start_diff` seconds of the chord's *first* note, otherwise it opens a
/// new chord. Singletons are chords too, so every event lands in exactly one group.
pub fn group_chords(events: &[NoteEvent], max_start_diff: f64) -> Vec<Vec<&NoteEvent>> {
    let mut chords: Vec<Vec<&NoteEvent>> = Vec::new();
    let mut current: Vec<&NoteEvent> = Vec::new();

    for event in events {
        let starts_new_chord = current
            .first()
            .is_some_and(|first| event.start_time - first.start_time > max_start_diff);

        if starts_new_chord {
            chords.push(std::mem::take(&mut current));
        }
        current.push(event);
    }

    if !current.is_empty() {
        chords.push(current);
    }

    chords
}

#[cfg(test)]
mod test {
    use super::*;

    fn create_event(note: u8, start: f64, track: usize, channel: u8) -> NoteEvent {
        NoteEvent {
            note,
            velocity: 80,
            start_time: start,
            end_time: start + 0.5,
            track,
            channel,
        }
    }

    fn starts(groups: &[Vec<&NoteEvent>]) -> Vec<Vec<f64>> {
        groups
            .iter()
            .map(|g| g.iter().map(|e| e.start_time).collect())
            .collect()
    }

    #[test]
    fn chord_split_measured_from_first_member() {
        let events: Vec<NoteEvent> = [0.0, 0.02, 0.04, 0.10]
            .iter()
            .map(|t| create_event(60, *t, 0, 0))
            .collect();

        let chords = group_chords(&events, 0.05);
        assert_eq!(starts(&chords), vec![vec![0.0, 0.02, 0.04], vec![0.10]]);
    }

    #[test]
    fn chain_of_close_notes_still_splits() {
        // each step is within the threshold of the previous note, but not of the first
        let events: Vec<NoteEvent> = [0.0, 0.03, 0.06, 0.09]
            .iter()
            .map(|t| create_event(60, *t, 0, 0))
            .collect();

        let chords = group_chords(&events, 0.05);
        assert_eq!(starts(&chords), vec![vec![0.0, 0.03], vec![0.06, 0.09]]);
    }

    #[test]
    fn every_event_in_one_chord() {
        let events: Vec<NoteEvent> = [0.0, 1.0, 2.0, 2.01, 3.0]
            .iter()
            .map(|t| create_event(60, *t, 0, 0))
            .collect();

        let chords = group_chords(&events, DEFAULT_MAX_CHORD_START_DIFF);
        assert_eq!(chords.len(), 4);
        assert_eq!(chords.iter().map(Vec::len).sum::<usize>(), events.len());
    }

    #[test]
    fn no_events_no_chords() {
        assert!(group_chords(&[], 0.05).is_empty());
        assert!(group_melodies(&[], 0).is_empty());
    }

    #[test]
    fn melodies_grouped_by_voice() {
        let mut events = Vec::new();
        for i in 0..12 {
            events.push(create_event(60 + i as u8, i as f64, 1, 0));
            if i % 2 == 0 {
                events.push(create_event(40, i as f64, 1, 1));
            }
            if i < 10 {
                events.push(create_event(72, i as f64, 2, 0));
            }
        }

        let melodies = group_melodies(&events, DEFAULT_MIN_MELODY_NOTES);
        assert_eq!(melodies.len(), 2);

        assert_eq!(melodies[0].len(), 12);
        assert!(melodies[0].iter().all(|e| e.track == 1 && e.channel == 0));
        let notes: Vec<u8> = melodies[0].iter().map(|e| e.note).collect();
        assert_eq!(notes, (60..72).collect::<Vec<u8>>());

        assert_eq!(melodies[1].len(), 10);
        assert!(melodies[1].iter().all(|e| e.track == 2 && e.channel == 0));

        let all = group_melodies(&events, 1);
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].len(), 6);
    }
}
