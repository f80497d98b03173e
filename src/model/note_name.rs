use thiserror::Error;

const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const PITCH_CLASS_VALUES: &[(&str, i32)] = &[
    ("C", 0),
    ("C#", 1),
    ("Db", 1),
    ("D", 2),
    ("D#", 3),
    ("Eb", 3),
    ("E", 4),
    ("F", 5),
    ("F#", 6),
    ("Gb", 6),
    ("G", 7),
    ("G#", 8),
    ("Ab", 8),
    ("A", 9),
    ("A#", 10),
    ("Bb", 10),
    ("B", 11),
];

// Indexed by sharps/flats + 7
const MAJOR_KEYS: [&str; 15] = [
    "Cb", "Gb", "Db", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#", "C#",
];
const MINOR_KEYS: [&str; 15] = [
    "Abm", "Ebm", "Bbm", "Fm", "Cm", "Gm", "Dm", "Am", "Em", "Bm", "F#m", "C#m", "G#m", "D#m",
    "A#m",
];

/// Rejected note names. Every variant is an invalid-input condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteNameError {
    #[error("Invalid note name '{0}': too short")]
    TooShort(String),

    #[error("Invalid note name '{0}': missing octave after accidental")]
    MissingOctave(String),

    #[error("Invalid note '{pitch}' in note name '{name}'")]
    UnknownPitchClass { name: String, pitch: String },

    #[error("Invalid octave in note name '{0}'")]
    InvalidOctave(String),

    #[error("Note name '{name}' resolves to {number}, outside 0..=127")]
    OutOfRange { name: String, number: i32 },
}

/// `60` -> `"C4"`, `61` -> `"C#4"`.
pub fn note_name(note_number: u8) -> String {
    let octave = (note_number / 12) as i32 - 1;
    format!("{}{}", PITCH_CLASS_NAMES[(note_number % 12) as usize], octave)
}

/// Parses names such as `"C4"`, `"F#5"`, `"Bb-1"` back into MIDI note numbers.
pub fn note_number(name: &str) -> Result<u8, NoteNameError> {
    let mut chars = name.char_indices();
    let (Some(_), Some((second_idx, second))) = (chars.next(), chars.next()) else {
        return Err(NoteNameError::TooShort(name.to_string()));
    };

    let (pitch, octave) = if second == '#' || second == 'b' {
        let split = second_idx + second.len_utf8();
        if split >= name.len() {
            return Err(NoteNameError::MissingOctave(name.to_string()));
        }
        name.split_at(split)
    } else {
        name.split_at(second_idx)
    };

    let Some(&(_, pitch_class)) = PITCH_CLASS_VALUES.iter().find(|(p, _)| *p == pitch) else {
        return Err(NoteNameError::UnknownPitchClass {
            name: name.to_string(),
            pitch: pitch.to_string(),
        });
    };

    let octave: i32 = octave
        .parse()
        .map_err(|_| NoteNameError::InvalidOctave(name.to_string()))?;

    let number = pitch_class + (octave + 1) * 12;
    u8::try_from(number)
        .ok()
        .filter(|n| *n <= 127)
        .ok_or_else(|| NoteNameError::OutOfRange {
            name: name.to_string(),
            number,
        })
}

/// Name for a key-signature meta event, e.g. `(-1, false)` -> `"F"`, `(0, true)` -> `"Am"`.
pub fn key_signature_name(sharps_flats: i8, minor: bool) -> Option<&'static str> {
    if !(-7..=7).contains(&sharps_flats) {
        return None;
    }

    let idx = (sharps_flats + 7) as usize;
    Some(if minor { MINOR_KEYS[idx] } else { MAJOR_KEYS[idx] })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_from_numbers() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(78), "F#5");
        assert_eq!(note_name(127), "G9");
    }

    #[test]
    fn numbers_from_names() {
        assert_eq!(note_number("C4"), Ok(60));
        assert_eq!(note_number("A4"), Ok(69));
        assert_eq!(note_number("F#5"), Ok(78));
        assert_eq!(note_number("Gb5"), Ok(78));
        assert_eq!(note_number("C-1"), Ok(0));
        assert_eq!(note_number("Bb-1"), Ok(10));
    }

    #[test]
    fn every_note_round_trips() {
        for n in 0..=127u8 {
            assert_eq!(note_number(&note_name(n)), Ok(n), "note {}", n);
        }
    }

    #[test]
    fn invalid_letter() {
        assert!(matches!(
            note_number("H5"),
            Err(NoteNameError::UnknownPitchClass { .. })
        ));
        assert!(matches!(
            note_number("c4"),
            Err(NoteNameError::UnknownPitchClass { .. })
        ));
        assert!(matches!(
            note_number("E#4"),
            Err(NoteNameError::UnknownPitchClass { .. })
        ));
    }

    #[test]
    fn too_short_or_missing_octave() {
        assert_eq!(note_number("C"), Err(NoteNameError::TooShort("C".into())));
        assert_eq!(note_number(""), Err(NoteNameError::TooShort("".into())));
        assert_eq!(
            note_number("C#"),
            Err(NoteNameError::MissingOctave("C#".into()))
        );
        assert_eq!(
            note_number("Cx"),
            Err(NoteNameError::InvalidOctave("Cx".into()))
        );
    }

    #[test]
    fn out_of_range() {
        assert!(matches!(
            note_number("G#9"),
            Err(NoteNameError::OutOfRange { number: 128, .. })
        ));
        assert!(matches!(
            note_number("C-2"),
            Err(NoteNameError::OutOfRange { number: -12, .. })
        ));
    }

    #[test]
    fn key_names() {
        assert_eq!(key_signature_name(0, false), Some("C"));
        assert_eq!(key_signature_name(0, true), Some("Am"));
        assert_eq!(key_signature_name(-1, false), Some("F"));
        assert_eq!(key_signature_name(3, true), Some("F#m"));
        assert_eq!(key_signature_name(-7, false), Some("Cb"));
        assert_eq!(key_signature_name(7, true), Some("A#m"));
        assert_eq!(key_signature_name(8, false), None);
    }
}
