//! Cyrillic code point detection
//!
//! A character is flagged iff its code point lies in the Cyrillic block
//! U+0400..=U+04FF. Supplement and extended blocks are deliberately left out,
//! and no normalisation is applied to the input.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// The Cyrillic Unicode block
pub const CYRILLIC_BLOCK: RangeInclusive<u32> = 0x0400..=0x04FF;

/// A single flagged character and its code point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchedCharacter {
    pub character: char,
    pub codepoint: u32,
}

impl MatchedCharacter {
    pub fn new(character: char) -> Self {
        Self {
            character,
            codepoint: character as u32,
        }
    }

    /// Format the code point as `U+XXXX`
    pub fn unicode_label(&self) -> String {
        format!("U+{:04X}", self.codepoint)
    }
}

/// Outcome of scanning one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub has_match: bool,
    /// Every flagged character, in input order
    pub matched_characters: Vec<MatchedCharacter>,
}

impl DetectionResult {
    /// Distinct flagged characters, ordered by first occurrence
    pub fn unique_characters(&self) -> Vec<MatchedCharacter> {
        let mut seen = HashSet::new();
        self.matched_characters
            .iter()
            .copied()
            .filter(|m| seen.insert(m.character))
            .collect()
    }
}

/// Check a single character against the Cyrillic block
#[inline]
pub fn is_cyrillic(c: char) -> bool {
    CYRILLIC_BLOCK.contains(&(c as u32))
}

/// Short-circuiting form of [`scan`]
pub fn has_cyrillic(text: &str) -> bool {
    text.chars().any(is_cyrillic)
}

/// Scan text and collect every Cyrillic character
pub fn scan(text: &str) -> DetectionResult {
    let matched_characters: Vec<MatchedCharacter> = text
        .chars()
        .filter(|&c| is_cyrillic(c))
        .map(MatchedCharacter::new)
        .collect();

    DetectionResult {
        has_match: !matched_characters.is_empty(),
        matched_characters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_string_has_no_match() {
        let result = scan("");
        assert!(!result.has_match);
        assert!(result.matched_characters.is_empty());
    }

    #[test]
    fn test_block_boundaries() {
        assert!(has_cyrillic("\u{0400}"));
        assert!(has_cyrillic("\u{04FF}"));
        assert!(!has_cyrillic("\u{03FF}"));
        assert!(!has_cyrillic("\u{0500}"));
    }

    #[test]
    fn test_supplement_blocks_not_flagged() {
        // Cyrillic Supplement, Extended-A, Extended-B
        assert!(!has_cyrillic("\u{0510}\u{2DE0}\u{A640}"));
    }

    #[test]
    fn test_mixed_hostname() {
        let result = scan("\u{0430}pple.com");
        assert!(result.has_match);
        assert_eq!(
            result.matched_characters,
            vec![MatchedCharacter {
                character: 'а',
                codepoint: 0x0430
            }]
        );
    }

    #[test]
    fn test_matches_preserve_input_order() {
        let result = scan("xПрxив");
        let chars: Vec<char> = result.matched_characters.iter().map(|m| m.character).collect();
        assert_eq!(chars, vec!['П', 'р', 'и', 'в']);
    }

    #[test]
    fn test_unique_characters_first_occurrence() {
        let result = scan("ааоа");
        let unique: Vec<char> = result.unique_characters().iter().map(|m| m.character).collect();
        assert_eq!(unique, vec!['а', 'о']);
    }

    #[test]
    fn test_unicode_label() {
        assert_eq!(MatchedCharacter::new('а').unicode_label(), "U+0430");
        assert_eq!(MatchedCharacter::new('\u{0400}').unicode_label(), "U+0400");
    }

    #[test]
    fn test_no_normalisation_applied() {
        // Latin small a with combining mark stays Latin
        assert!(!has_cyrillic("a\u{0301}"));
    }
}
