use super::{Digest, InsertionProof, Leaf, Proof, TreeError, TreeHasher, UpdateProof, Word};

// INTERFACES
// ================================================================================================

/// An indexed merkle tree: a fixed depth merkle tree whose leaves hold key-value records linked in
/// ascending key order. Index 0 holds the sentinel leaf with key 0, so every other key has a low
/// leaf that can prove its absence.
pub trait IndexedTree<H: TreeHasher> {
    /// Returns the depth of the tree.
    fn depth(&self) -> usize;

    /// Returns the number of leaves in the tree, including the sentinel.
    fn size(&self) -> u64;

    /// Returns the root of the tree.
    fn root(&self) -> Result<Digest, TreeError>;

    /// Returns the leaf holding the provided key.
    fn leaf(&self, key: &Word) -> Result<Option<Leaf>, TreeError>;

    /// Returns a proof that the leaf holding the provided key is included in the tree.
    fn prove_inclusion(&self, key: &Word) -> Result<Proof, TreeError>;

    /// Returns a proof that the provided key is absent from the tree, in the form of an inclusion
    /// proof of its low leaf.
    fn prove_exclusion(&self, key: &Word) -> Result<Proof, TreeError>;
}

pub trait IndexedTreeMut<H: TreeHasher>: IndexedTree<H> {
    /// Inserts a new key-value record.
    fn insert(&mut self, key: Word, value: Word) -> Result<InsertionProof, TreeError>;

    /// Replaces the value of an existing key.
    fn update(&mut self, key: Word, value: Word) -> Result<UpdateProof, TreeError>;
}
