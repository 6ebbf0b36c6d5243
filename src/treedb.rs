use super::{
    lookup::{load_keys, read_meta},
    Digest, IndexedTree, Leaf, Lookup, MerkleLayer, NodeStore, Proof, TreeError, TreeHasher, Word,
    MAX_DEPTH,
};
use core::marker::PhantomData;
use std::collections::BTreeMap;
use tracing::debug;

// IndexedTreeDBBuilder
// ================================================================================================

/// Used to construct an IndexedTreeDB
pub struct IndexedTreeDBBuilder<'db, S: NodeStore + ?Sized, H: TreeHasher> {
    store: &'db S,
    depth: usize,
    _hasher: PhantomData<H>,
}

/// Implementation of the IndexedTreeDBBuilder
impl<'db, S: NodeStore + ?Sized, H: TreeHasher> IndexedTreeDBBuilder<'db, S, H> {
    /// Construct a new db builder
    pub fn new(store: &'db S, depth: usize) -> Result<Self, TreeError> {
        if depth > MAX_DEPTH {
            return Err(TreeError::DepthTooLarge(depth, MAX_DEPTH));
        }
        Ok(Self {
            store,
            depth,
            _hasher: PhantomData,
        })
    }

    /// Loads the tree from the store and returns a read-only view of it.
    /// Errors:
    /// - Uninitialized: if the store does not hold a tree
    /// - DepthMismatch: if the stored tree has a different depth
    pub fn build(self) -> Result<IndexedTreeDB<'db, S, H>, TreeError> {
        let meta = read_meta(self.store)?.ok_or(TreeError::Uninitialized)?;
        if meta.depth as usize != self.depth {
            return Err(TreeError::DepthMismatch {
                stored: meta.depth as usize,
                requested: self.depth,
            });
        }

        let keys = load_keys(self.store, meta.size)?;
        debug!(depth = self.depth, size = meta.size, "opened read-only tree");
        Ok(IndexedTreeDB {
            store: self.store,
            merkle: MerkleLayer::new(self.depth),
            keys,
            size: meta.size,
        })
    }
}

// IndexedTreeDB
// ================================================================================================

/// Read-only view of an indexed merkle tree over a committed node store
pub struct IndexedTreeDB<'db, S: NodeStore + ?Sized, H: TreeHasher> {
    store: &'db S,
    merkle: MerkleLayer<H>,
    keys: BTreeMap<Word, u64>,
    size: u64,
}

impl<'db, S: NodeStore + ?Sized, H: TreeHasher> IndexedTreeDB<'db, S, H> {
    /// Return the store of an IndexedTreeDB
    pub fn store(&self) -> &S {
        self.store
    }

    fn lookup(&self) -> Lookup<'_, S, H> {
        Lookup::new(self.store, &self.merkle, &self.keys)
    }
}

/// Tree implementation for IndexedTreeDB
impl<'db, S: NodeStore + ?Sized, H: TreeHasher> IndexedTree<H> for IndexedTreeDB<'db, S, H> {
    fn depth(&self) -> usize {
        self.merkle.depth()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn root(&self) -> Result<Digest, TreeError> {
        self.merkle.root(self.store)
    }

    fn leaf(&self, key: &Word) -> Result<Option<Leaf>, TreeError> {
        let lookup = self.lookup();
        lookup
            .index_of(key)
            .map(|index| lookup.leaf_at(index))
            .transpose()
    }

    fn prove_inclusion(&self, key: &Word) -> Result<Proof, TreeError> {
        let lookup = self.lookup();
        let index = lookup
            .index_of(key)
            .filter(|_| !key.is_zero())
            .ok_or(TreeError::NotFound(*key))?;
        lookup.proof(index, self.size)
    }

    fn prove_exclusion(&self, key: &Word) -> Result<Proof, TreeError> {
        let lookup = self.lookup();
        let (index, _) = lookup.find_low(key)?;
        lookup.proof(index, self.size)
    }
}
