//! Indexed merkle tree database.
//!
//! A fixed depth binary merkle tree over an append-only set of key-value leaves. Leaves are linked
//! in ascending key order through their `next_key` field, which allows proving that a key is
//! absent as well as present: the leaf whose key is the largest one below the queried key (its
//! low leaf) brackets the missing key between its own key and its successor.

pub mod abi;
mod error;
mod hasher;
mod leaf;
mod lookup;
mod merkle;
mod proof;
mod storage;
mod tree;
mod treedb;
mod treedbmut;
mod word;

use hashbrown::HashMap;

pub use error::{EncodingError, StoreError, TreeError};
pub use hash_db::Hasher;
pub use hasher::{Keccak, Poseidon, TreeHasher};
pub use leaf::{Leaf, LEAF_SIZE};
pub use lookup::Lookup;
pub use merkle::{combine, empty_hashes, MerkleLayer};
pub use proof::{verify_exclusion, verify_inclusion, InsertionProof, Proof, UpdateProof};
pub use storage::{HashDBStore, MemoryNodeDB, NodeStore, Slot, SlotKey, Transaction, TreeMeta};
pub use tree::{IndexedTree, IndexedTreeMut};
pub use treedb::{IndexedTreeDB, IndexedTreeDBBuilder};
pub use treedbmut::{IndexedTreeDBMut, IndexedTreeDBMutBuilder};
pub use word::{Word, WORD_SIZE};

#[cfg(test)]
mod tests;

// TYPES
// ================================================================================================

/// The type of value stored in the database backend.
pub type DBValue = Vec<u8>;

/// The hash digest of a leaf or inner node.
pub type Digest = [u8; WORD_SIZE];

/// The maximum supported tree depth.
pub const MAX_DEPTH: usize = 64;
