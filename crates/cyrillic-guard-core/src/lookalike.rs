//! Cyrillic letters that render like Latin ones
//!
//! Display enrichment only. Detection never consults this table.

use crate::detector::{DetectionResult, MatchedCharacter};
use serde::Serialize;

/// Cyrillic character and the Latin letter it imitates
pub const LOOKALIKES: &[(char, char)] = &[
    ('а', 'a'),
    ('е', 'e'),
    ('о', 'o'),
    ('р', 'p'),
    ('с', 'c'),
    ('у', 'y'),
    ('х', 'x'),
    ('А', 'A'),
    ('В', 'B'),
    ('Е', 'E'),
    ('К', 'K'),
    ('М', 'M'),
    ('Н', 'H'),
    ('О', 'O'),
    ('Р', 'P'),
    ('С', 'C'),
    ('Т', 'T'),
    ('У', 'Y'),
    ('Х', 'X'),
    ('І', 'I'),
];

/// Latin twin of a Cyrillic character, if it has one
pub fn latin_lookalike(c: char) -> Option<char> {
    LOOKALIKES
        .iter()
        .find(|(cyrillic, _)| *cyrillic == c)
        .map(|(_, latin)| *latin)
}

/// One row of the character breakdown shown in the popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterReport {
    pub character: char,
    pub unicode: String,
    pub look_alike: Option<char>,
}

impl From<MatchedCharacter> for CharacterReport {
    fn from(m: MatchedCharacter) -> Self {
        Self {
            character: m.character,
            unicode: m.unicode_label(),
            look_alike: latin_lookalike(m.character),
        }
    }
}

/// Distinct flagged characters with labels and lookalikes
pub fn describe(result: &DetectionResult) -> Vec<CharacterReport> {
    result
        .unique_characters()
        .into_iter()
        .map(CharacterReport::from)
        .collect()
}
