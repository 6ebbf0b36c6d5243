use super::{Slot, Word};
use thiserror::Error;

/// Errors raised while converting values to and from their fixed width encodings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    #[error("value of {0} significant bytes does not fit in a 32 byte word")]
    WordTooWide(usize),
    #[error("value {0} is outside the input domain of the hash function")]
    OutOfRange(Word),
    #[error("invalid integer literal `{0}`")]
    InvalidLiteral(String),
    #[error("expected {expected} bytes, found {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("unexpected {field} in encoded proof: expected {expected}, found {actual:?}")]
    UnexpectedField {
        field: &'static str,
        expected: u64,
        actual: Word,
    },
}

/// Errors raised by a node store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("node store backend failure: {0}")]
    Backend(String),
    #[error("slot {slot} holds {actual} bytes, expected {expected}")]
    CorruptSlot {
        slot: Slot,
        expected: usize,
        actual: usize,
    },
    #[error("leaf {0} is missing from the store")]
    MissingLeaf(u64),
    #[error("leaf {0} breaks the key ordering of the tree")]
    BrokenOrder(u64),
}

/// Errors for the tree library
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("key {0} already exists in the tree")]
    DuplicateKey(Word),
    #[error("key {0} not found in the tree")]
    NotFound(Word),
    #[error("key {0} is present so its exclusion cannot be proven")]
    KeyExists(Word),
    #[error("tree capacity of {0} leaves exceeded")]
    CapacityExceeded(u128),
    #[error(transparent)]
    EncodingRange(#[from] EncodingError),
    #[error("invalid proof: {0}")]
    InvalidProof(&'static str),
    #[error(transparent)]
    StoreFailure(#[from] StoreError),
    #[error("tree depth {0} exceeds the maximum depth of {1}")]
    DepthTooLarge(usize, usize),
    #[error("store holds a tree of depth {stored}, requested depth {requested}")]
    DepthMismatch { stored: usize, requested: usize },
    #[error("store does not hold an initialized tree")]
    Uninitialized,
}
