//! Export format of proofs for EVM verifiers.
//!
//! A proof is encoded as the ABI encoding of a single dynamic tuple argument
//! `(bytes32 root, uint256 size, uint256 index, (uint256 key, uint256 value, uint256 nextKey) node,
//! uint256[] siblings)`: a head word holding the tuple offset, the static fields inline, the offset
//! of the siblings array relative to the tuple start, then the array length and its elements.
//! Every value occupies one 32 byte big-endian word.

use super::{Digest, EncodingError, Leaf, Proof, Word, WORD_SIZE};

/// Offset of the tuple from the start of the encoding
const TUPLE_OFFSET: u64 = 0x20;

/// Number of head words of the tuple: root, size, index, node (3 words) and the siblings offset
const TUPLE_HEAD_WORDS: usize = 7;

/// Offset of the siblings array from the start of the tuple
const SIBLINGS_OFFSET: u64 = (TUPLE_HEAD_WORDS * WORD_SIZE) as u64;

/// Encodes a proof in the export format
pub fn encode_proof(proof: &Proof) -> Vec<u8> {
    let words = [
        Word::from(TUPLE_OFFSET),
        Word::from(proof.root),
        Word::from(proof.size),
        Word::from(proof.index),
        proof.node.key,
        proof.node.value,
        proof.node.next_key,
        Word::from(SIBLINGS_OFFSET),
        Word::from(proof.siblings.len() as u64),
    ]
    .into_iter()
    .chain(proof.siblings.iter().copied().map(Word::from));

    words.flat_map(Word::to_bytes).collect()
}

/// Decodes a proof from the export format.
/// Errors:
/// - InvalidLength: if the data is not a whole number of words or disagrees with the array length
/// - UnexpectedField: if an offset is not the one produced by `encode_proof`, or size, index or
///   array length do not fit in 64 bits
pub fn decode_proof(data: &[u8]) -> Result<Proof, EncodingError> {
    let header_len = (TUPLE_HEAD_WORDS + 2) * WORD_SIZE;
    if data.len() < header_len || data.len() % WORD_SIZE != 0 {
        return Err(EncodingError::InvalidLength {
            expected: header_len,
            actual: data.len(),
        });
    }

    let words: Vec<Word> = data
        .chunks_exact(WORD_SIZE)
        .map(Word::from_be_slice)
        .collect::<Result<_, _>>()?;

    expect_word("tuple offset", words[0], TUPLE_OFFSET)?;
    expect_word("siblings offset", words[7], SIBLINGS_OFFSET)?;
    let length = to_u64("siblings length", words[8])?;

    let siblings = &words[TUPLE_HEAD_WORDS + 2..];
    if siblings.len() as u64 != length {
        return Err(EncodingError::InvalidLength {
            expected: (length as usize)
                .saturating_mul(WORD_SIZE)
                .saturating_add(header_len),
            actual: data.len(),
        });
    }

    Ok(Proof {
        root: words[1].to_bytes(),
        size: to_u64("size", words[2])?,
        index: to_u64("index", words[3])?,
        node: Leaf::new(words[4], words[5], words[6]),
        siblings: siblings.iter().map(|word| word.to_bytes()).collect::<Vec<Digest>>(),
    })
}

// HELPERS
// ================================================================================================

fn to_u64(field: &'static str, word: Word) -> Result<u64, EncodingError> {
    word.to_u64().ok_or(EncodingError::UnexpectedField {
        field,
        expected: u64::MAX,
        actual: word,
    })
}

fn expect_word(field: &'static str, word: Word, expected: u64) -> Result<(), EncodingError> {
    if word != Word::from(expected) {
        return Err(EncodingError::UnexpectedField {
            field,
            expected,
            actual: word,
        });
    }
    Ok(())
}
