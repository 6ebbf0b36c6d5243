use super::{Digest, EncodingError, TreeHasher, Word, WORD_SIZE};

// CONSTANTS
// ================================================================================================

/// The number of bytes in an encoded leaf
pub const LEAF_SIZE: usize = 3 * WORD_SIZE;

// Leaf
// ================================================================================================

/// A record of the indexed merkle tree. Leaves form a singly linked list sorted by key: `next_key`
/// holds the next larger key in the tree, or zero if this leaf holds the largest key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Leaf {
    pub key: Word,
    pub value: Word,
    pub next_key: Word,
}

impl Leaf {
    /// Constructs a new leaf
    pub fn new(key: Word, value: Word, next_key: Word) -> Self {
        Self {
            key,
            value,
            next_key,
        }
    }

    /// Returns the sentinel leaf stored at index 0 of every tree
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// Returns true if this leaf holds the largest key in the tree
    pub fn is_last(&self) -> bool {
        self.next_key.is_zero()
    }

    /// Returns true if this leaf is the low leaf of `key`: its key is smaller than `key` and its
    /// successor, if any, is larger.
    pub fn is_low_for(&self, key: &Word) -> bool {
        self.key < *key && (self.is_last() || self.next_key > *key)
    }

    /// Returns the hash input elements of the leaf in field order
    pub fn elements(&self) -> [Word; 3] {
        [self.key, self.value, self.next_key]
    }

    /// Serializes the leaf to its fixed width encoding
    pub fn encode(&self) -> [u8; LEAF_SIZE] {
        let mut bytes = [0u8; LEAF_SIZE];
        for (chunk, element) in bytes.chunks_mut(WORD_SIZE).zip(self.elements()) {
            chunk.copy_from_slice(element.as_slice());
        }
        bytes
    }

    /// Checks that every field can be passed to the hash function `H`.
    /// Errors:
    /// - OutOfRange: if a field lies outside the input domain of `H`
    pub fn check<H: TreeHasher>(&self) -> Result<(), EncodingError> {
        match self.elements().into_iter().find(|word| !H::accepts(word)) {
            Some(word) => Err(EncodingError::OutOfRange(word)),
            None => Ok(()),
        }
    }

    /// Returns the leaf hash `H(key, value, next_key)`.
    /// Errors:
    /// - OutOfRange: if a field lies outside the input domain of `H`
    pub fn hash<H: TreeHasher>(&self) -> Result<Digest, EncodingError> {
        self.check::<H>()?;
        Ok(H::hash(&self.encode()))
    }
}

// Leaf Serialization
// ================================================================================================

/// Serialize a leaf to a vector of bytes: key, value and next key as consecutive 32 byte
/// big-endian words.
impl From<Leaf> for Vec<u8> {
    fn from(leaf: Leaf) -> Self {
        leaf.encode().to_vec()
    }
}

/// Deserialize a leaf from a byte slice. The slice must be exactly `LEAF_SIZE` bytes long.
impl TryFrom<&[u8]> for Leaf {
    type Error = EncodingError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != LEAF_SIZE {
            return Err(EncodingError::InvalidLength {
                expected: LEAF_SIZE,
                actual: bytes.len(),
            });
        }

        Ok(Leaf::new(
            decode_word(&bytes[..WORD_SIZE]),
            decode_word(&bytes[WORD_SIZE..2 * WORD_SIZE]),
            decode_word(&bytes[2 * WORD_SIZE..]),
        ))
    }
}

// HELPERS
// ================================================================================================

/// Decode a word from a chunk of exactly `WORD_SIZE` bytes.
fn decode_word(chunk: &[u8]) -> Word {
    let mut word = [0u8; WORD_SIZE];
    word.copy_from_slice(chunk);
    Word::from(word)
}
