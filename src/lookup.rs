use super::{
    Leaf, MerkleLayer, NodeStore, Proof, Slot, StoreError, TreeError, TreeHasher, TreeMeta, Word,
    LEAF_SIZE,
};
use std::collections::BTreeMap;

// Lookup
// ================================================================================================

/// Read access to a tree stored in a node store. Shared by the read-only and mutable trees, and
/// used inside transactions where reads must observe staged writes.
pub struct Lookup<'a, S: NodeStore + ?Sized, H: TreeHasher> {
    store: &'a S,
    merkle: &'a MerkleLayer<H>,
    keys: &'a BTreeMap<Word, u64>,
}

impl<'a, S: NodeStore + ?Sized, H: TreeHasher> Lookup<'a, S, H> {
    pub fn new(store: &'a S, merkle: &'a MerkleLayer<H>, keys: &'a BTreeMap<Word, u64>) -> Self {
        Self {
            store,
            merkle,
            keys,
        }
    }

    /// Returns the index of the leaf holding `key`
    pub fn index_of(&self, key: &Word) -> Option<u64> {
        self.keys.get(key).copied()
    }

    /// Returns the leaf stored at `index`
    pub fn leaf_at(&self, index: u64) -> Result<Leaf, TreeError> {
        read_leaf(self.store, index)
    }

    /// Finds the low leaf of `key`: the leaf with the largest key smaller than `key`.
    /// Errors:
    /// - KeyExists: if a leaf holding `key` exists
    /// - StoreFailure: if the candidate leaf does not bound `key`, which means the stored list is
    ///   out of order
    pub fn find_low(&self, key: &Word) -> Result<(u64, Leaf), TreeError> {
        if self.keys.contains_key(key) {
            return Err(TreeError::KeyExists(*key));
        }

        // the sentinel holds key 0, so every non zero key has a low leaf
        let (_, &index) = self
            .keys
            .range(..*key)
            .next_back()
            .ok_or(StoreError::MissingLeaf(0))?;
        let leaf = self.leaf_at(index)?;
        if !leaf.is_low_for(key) {
            return Err(StoreError::BrokenOrder(index).into());
        }

        Ok((index, leaf))
    }

    /// Returns a proof that the leaf at `index` is included in the current root
    pub fn proof(&self, index: u64, size: u64) -> Result<Proof, TreeError> {
        Ok(Proof {
            root: self.merkle.root(self.store)?,
            size,
            index,
            node: self.leaf_at(index)?,
            siblings: self.merkle.path_for(self.store, index)?,
        })
    }
}

// Helpers
// ================================================================================================

/// Read the tree metadata from the store, if a tree has been initialized.
pub fn read_meta<S: NodeStore + ?Sized>(store: &S) -> Result<Option<TreeMeta>, TreeError> {
    match store.get(&Slot::Meta)? {
        Some(data) => Ok(Some(TreeMeta::try_from(data.as_slice())?)),
        None => Ok(None),
    }
}

/// Read and decode the leaf stored at `index`.
pub fn read_leaf<S: NodeStore + ?Sized>(store: &S, index: u64) -> Result<Leaf, TreeError> {
    let data = store
        .get(&Slot::Leaf(index))?
        .ok_or(StoreError::MissingLeaf(index))?;
    Leaf::try_from(data.as_slice()).map_err(|_| {
        StoreError::CorruptSlot {
            slot: Slot::Leaf(index),
            expected: LEAF_SIZE,
            actual: data.len(),
        }
        .into()
    })
}

/// Rebuild the key to index map by scanning the first `size` leaves.
pub fn load_keys<S: NodeStore + ?Sized>(
    store: &S,
    size: u64,
) -> Result<BTreeMap<Word, u64>, TreeError> {
    (0..size)
        .map(|index| read_leaf(store, index).map(|leaf| (leaf.key, index)))
        .collect()
}
