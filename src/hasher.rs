use super::{Digest, Hasher, Word, WORD_SIZE};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{
    find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge,
};
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::{BigInteger, PrimeField};
use hash256_std_hasher::Hash256StdHasher;
use sha3::{Digest as _, Keccak256};
use std::sync::OnceLock;

// INTERFACES
// ================================================================================================

/// Hash function capability used by the tree. Inputs are sequences of 32 byte big-endian words
/// (three for a leaf, two for an inner node) passed to [`Hasher::hash`] concatenated, in order.
pub trait TreeHasher: Hasher<Out = Digest> {
    /// Returns true if the word can be passed to the hash function without loss, i.e. it is
    /// within the native modulus or width of the function.
    fn accepts(word: &Word) -> bool;
}

// KECCAK
// ================================================================================================

/// Keccak-256 byte digest hasher, matching the EVM `keccak256` builtin.
#[derive(Debug)]
pub struct Keccak;

impl Hasher for Keccak {
    type Out = Digest;

    type StdHasher = Hash256StdHasher;

    const LENGTH: usize = WORD_SIZE;

    fn hash(data: &[u8]) -> Self::Out {
        Keccak256::digest(data).into()
    }
}

/// Every 256 bit word is a valid keccak input.
impl TreeHasher for Keccak {
    fn accepts(_word: &Word) -> bool {
        true
    }
}

// POSEIDON
// ================================================================================================

/// Number of full rounds (beginning + end)
const FULL_ROUNDS: u64 = 8;

/// Number of partial rounds
const PARTIAL_ROUNDS: u64 = 57;

/// S-box exponent
const ALPHA: u64 = 5;

/// Sponge rate
const RATE: usize = 2;

/// Sponge capacity
const CAPACITY: usize = 1;

/// Poseidon hasher over the BN254 scalar field. Each 32 byte input word is read as one field
/// element, so words must be smaller than the field modulus.
#[derive(Debug)]
pub struct Poseidon;

impl Poseidon {
    /// Returns the shared sponge configuration, generating the round constants and MDS matrix on
    /// first use.
    fn config() -> &'static PoseidonConfig<Fr> {
        static CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();
        CONFIG.get_or_init(|| {
            let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
                Fr::MODULUS_BIT_SIZE as u64,
                RATE,
                FULL_ROUNDS,
                PARTIAL_ROUNDS,
                0,
            );
            PoseidonConfig {
                full_rounds: FULL_ROUNDS as usize,
                partial_rounds: PARTIAL_ROUNDS as usize,
                alpha: ALPHA,
                ark,
                mds,
                rate: RATE,
                capacity: CAPACITY,
            }
        })
    }

    /// Returns the big-endian encoding of the field modulus
    fn modulus() -> &'static [u8] {
        static MODULUS: OnceLock<Vec<u8>> = OnceLock::new();
        MODULUS.get_or_init(|| Fr::MODULUS.to_bytes_be())
    }
}

impl Hasher for Poseidon {
    type Out = Digest;

    type StdHasher = Hash256StdHasher;

    const LENGTH: usize = WORD_SIZE;

    /// Absorbs the data as a sequence of field elements, one per 32 byte chunk. Chunks are reduced
    /// modulo the field order, range checks happen before data reaches this point.
    fn hash(data: &[u8]) -> Self::Out {
        let mut sponge = PoseidonSponge::new(Self::config());
        for chunk in data.chunks(WORD_SIZE) {
            sponge.absorb(&Fr::from_be_bytes_mod_order(chunk));
        }
        let output: Vec<Fr> = sponge.squeeze_field_elements(1);

        let bytes = output[0].into_bigint().to_bytes_be();
        let mut digest = [0u8; WORD_SIZE];
        digest[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
        digest
    }
}

impl TreeHasher for Poseidon {
    fn accepts(word: &Word) -> bool {
        word.as_slice() < Self::modulus()
    }
}
