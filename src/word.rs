use super::EncodingError;
use core::{fmt, str::FromStr};
use num_bigint::BigUint;

// CONSTANTS
// ================================================================================================

/// The number of bytes in a word
pub const WORD_SIZE: usize = 32;

// IMPLEMENTATION
// ================================================================================================

/// An unsigned integer of up to 256 bits stored as a fixed width big-endian byte array. Keys,
/// values and hash digests are all carried as words. Because the encoding is fixed width and
/// big-endian the derived byte ordering is the numeric ordering.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word([u8; WORD_SIZE]);

impl Word {
    /// Create a word from a big-endian byte slice of at most `WORD_SIZE` significant bytes.
    /// Shorter slices are left padded with zeros.
    pub fn from_be_slice(bytes: &[u8]) -> Result<Word, EncodingError> {
        let leading_zeros = bytes.iter().take_while(|byte| **byte == 0).count();
        let significant = &bytes[leading_zeros..];
        if significant.len() > WORD_SIZE {
            return Err(EncodingError::WordTooWide(significant.len()));
        }

        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - significant.len()..].copy_from_slice(significant);
        Ok(Word(word))
    }

    /// Create the zero word
    pub const fn zero() -> Self {
        Self([0u8; WORD_SIZE])
    }

    /// Returns true if the word is zero, false otherwise
    pub fn is_zero(&self) -> bool {
        self == &Word::zero()
    }

    /// Returns the word as a byte slice
    pub fn as_slice(&self) -> &[u8] {
        &self.0[..]
    }

    /// Returns the word as a fixed size byte array
    pub fn to_bytes(self) -> [u8; WORD_SIZE] {
        self.0
    }

    /// Returns the word as a u64 if it fits
    pub fn to_u64(&self) -> Option<u64> {
        let (high, low) = self.0.split_at(WORD_SIZE - 8);
        if high.iter().any(|byte| *byte != 0) {
            return None;
        }
        let low: [u8; 8] = low.try_into().ok()?;
        Some(u64::from_be_bytes(low))
    }
}

impl AsRef<[u8]> for Word {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<[u8; WORD_SIZE]> for Word {
    fn from(bytes: [u8; WORD_SIZE]) -> Self {
        Word(bytes)
    }
}

impl From<Word> for [u8; WORD_SIZE] {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        let mut word = [0u8; WORD_SIZE];
        word[WORD_SIZE - 8..].copy_from_slice(&value.to_be_bytes());
        Word(word)
    }
}

/// Parses a decimal literal. A `0x` prefix selects hexadecimal.
impl FromStr for Word {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.strip_prefix("0x") {
            Some(digits) => BigUint::parse_bytes(digits.as_bytes(), 16),
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        }
        .ok_or_else(|| EncodingError::InvalidLiteral(s.to_string()))?;

        Word::from_be_slice(&value.to_bytes_be())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BigUint::from_bytes_be(&self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
