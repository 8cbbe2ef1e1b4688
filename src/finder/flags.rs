//! `SetFile -a` attribute letters

use tracing::warn;

/// Finder flag bit for each supported attribute letter
pub const FLAG_LETTERS: &[(char, u16, &str)] = &[
    ('A', 0x8000, "alias"),
    ('V', 0x4000, "invisible"),
    ('B', 0x2000, "bundle"),
    ('S', 0x1000, "system / name locked"),
    ('T', 0x0800, "stationery"),
    ('C', 0x0400, "custom icon"),
    ('I', 0x0100, "inited"),
    ('N', 0x0080, "no INIT resources"),
    ('M', 0x0040, "shared"),
    ('D', 0x0001, "on desktop"),
];

/// Bit for an uppercase letter, if the letter is supported
pub fn flag_bit(letter: char) -> Option<u16> {
    FLAG_LETTERS
        .iter()
        .find(|(l, _, _)| *l == letter)
        .map(|(_, bit, _)| *bit)
}

/// Bits to set and clear, parsed from a string like `CV` or `cv`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagChange {
    pub set: u16,
    pub clear: u16,
}

impl FlagChange {
    /// Uppercase letters set, lowercase clear. Unsupported letters are
    /// logged and skipped.
    pub fn parse(letters: &str) -> Self {
        let mut change = Self::default();
        for letter in letters.chars() {
            match flag_bit(letter.to_ascii_uppercase()) {
                Some(bit) if letter.is_ascii_uppercase() => change.set |= bit,
                Some(bit) => change.clear |= bit,
                None => warn!("Ignoring unsupported attribute letter '{}'", letter),
            }
        }
        change
    }

    /// `(current | set) & !clear`
    pub fn apply(&self, current: u16) -> u16 {
        (current | self.set) & !self.clear
    }

    pub fn is_empty(&self) -> bool {
        self.set == 0 && self.clear == 0
    }
}
