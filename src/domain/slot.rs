use std::{fmt::Display, str::FromStr};

use thiserror::Error;

pub const LETTERS: [char; 8] = ['A', 'B', 'C', 'D', 'E', 'F', 'G', 'H'];
pub const NUMBERS: u8 = 8;
pub const SLOT_COUNT: usize = LETTERS.len() * NUMBERS as usize;

/// Address of one of the 64 jukebox slots, `A1` through `H8`.
///
/// Letters select the page of the rolodex, numbers the card on that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotCode {
    letter: u8,
    number: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotParseError {
    #[error("slot code '{0}' must be a letter A-H followed by a digit 1-8")]
    Malformed(String),

    #[error("letter '{0}' is not one of A-H")]
    Letter(char),

    #[error("number {0} is not within 1-8")]
    Number(u8),
}

impl SlotCode {
    pub fn new(letter: char, number: u8) -> Result<Self, SlotParseError> {
        let upper = letter.to_ascii_uppercase();
        let letter = LETTERS
            .iter()
            .position(|l| *l == upper)
            .ok_or(SlotParseError::Letter(letter))?;
        if !(1..=NUMBERS).contains(&number) {
            return Err(SlotParseError::Number(number));
        }
        Ok(Self {
            letter: letter as u8,
            number,
        })
    }

    /// all slot codes in catalog order: A1..A8, B1..B8, ... H8
    pub fn all() -> impl Iterator<Item = SlotCode> {
        (0..LETTERS.len() as u8)
            .flat_map(|letter| (1..=NUMBERS).map(move |number| SlotCode { letter, number }))
    }

    pub fn letter(&self) -> char {
        LETTERS[self.letter as usize]
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    /// index of the rolodex page holding this slot
    pub fn page(&self) -> usize {
        self.letter as usize
    }

    /// position in catalog order, 0..64
    pub fn ordinal(&self) -> usize {
        self.page() * NUMBERS as usize + (self.number as usize - 1)
    }
}

impl FromStr for SlotCode {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(letter), Some(digit), None) => {
                let number = digit
                    .to_digit(10)
                    .ok_or_else(|| SlotParseError::Malformed(s.to_string()))?;
                SlotCode::new(letter, number as u8)
            }
            _ => Err(SlotParseError::Malformed(s.to_string())),
        }
    }
}

impl Display for SlotCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.letter(), self.number)
    }
}
