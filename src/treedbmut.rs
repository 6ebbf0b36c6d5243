use super::{
    lookup::{load_keys, read_meta},
    Digest, IndexedTree, IndexedTreeMut, InsertionProof, Leaf, Lookup, MerkleLayer, NodeStore,
    Proof, Slot, Transaction, TreeError, TreeHasher, TreeMeta, UpdateProof, Word, MAX_DEPTH,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

// IndexedTreeDBMutBuilder
// ================================================================================================

/// Used to construct an IndexedTreeDBMut
pub struct IndexedTreeDBMutBuilder<S: NodeStore, H: TreeHasher> {
    store: S,
    merkle: MerkleLayer<H>,
}

/// Implementation of an IndexedTreeDBMutBuilder
impl<S: NodeStore, H: TreeHasher> IndexedTreeDBMutBuilder<S, H> {
    /// Construct a new db builder
    pub fn new(store: S, depth: usize) -> Result<Self, TreeError> {
        if depth > MAX_DEPTH {
            return Err(TreeError::DepthTooLarge(depth, MAX_DEPTH));
        }
        Ok(Self {
            store,
            merkle: MerkleLayer::new(depth),
        })
    }

    /// Consumes the builder and returns an IndexedTreeDBMut. If the store is empty a new tree is
    /// created holding only the sentinel leaf, otherwise the stored tree is loaded.
    /// Errors:
    /// - DepthMismatch: if the stored tree has a different depth
    pub fn build(mut self) -> Result<IndexedTreeDBMut<S, H>, TreeError> {
        let depth = self.merkle.depth();
        let size = match read_meta(&self.store)? {
            Some(meta) if meta.depth as usize != depth => {
                return Err(TreeError::DepthMismatch {
                    stored: meta.depth as usize,
                    requested: depth,
                })
            }
            Some(meta) => {
                debug!(depth, size = meta.size, "opened tree");
                meta.size
            }
            None => {
                let sentinel = Leaf::sentinel();
                let mut txn = Transaction::begin(&mut self.store);
                txn.put(Slot::Leaf(0), sentinel.into())?;
                let root = self
                    .merkle
                    .update_leaf(&mut *txn, 0, sentinel.hash::<H>()?)?;
                txn.put(
                    Slot::Meta,
                    TreeMeta {
                        depth: depth as u8,
                        size: 1,
                    }
                    .into(),
                )?;
                txn.commit()?;
                info!(depth, ?root, "created tree");
                1
            }
        };

        let keys = load_keys(&self.store, size)?;
        Ok(IndexedTreeDBMut {
            store: self.store,
            merkle: self.merkle,
            keys,
            size,
        })
    }
}

// IndexedTreeDBMut
// ================================================================================================

/// IndexedTreeDBMut used to access and mutate an indexed merkle tree held in a node store. Each
/// mutation runs in its own store transaction; the in memory key index and size are only updated
/// after the transaction commits.
pub struct IndexedTreeDBMut<S: NodeStore, H: TreeHasher> {
    store: S,
    merkle: MerkleLayer<H>,
    keys: BTreeMap<Word, u64>,
    size: u64,
}

impl<S: NodeStore, H: TreeHasher> IndexedTreeDBMut<S, H> {
    /// Return the store of an IndexedTreeDBMut
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the tree and returns its store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Returns the number of leaves the tree can hold
    pub fn capacity(&self) -> u128 {
        self.merkle.capacity()
    }

    fn lookup(&self) -> Lookup<'_, S, H> {
        Lookup::new(&self.store, &self.merkle, &self.keys)
    }
}

impl<S: NodeStore, H: TreeHasher> IndexedTree<H> for IndexedTreeDBMut<S, H> {
    fn depth(&self) -> usize {
        self.merkle.depth()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn root(&self) -> Result<Digest, TreeError> {
        self.merkle.root(&self.store)
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
        debug!(%key, index, "proving inclusion");
        lookup.proof(index, self.size)
    }

    fn prove_exclusion(&self, key: &Word) -> Result<Proof, TreeError> {
        let lookup = self.lookup();
        let (index, _) = lookup.find_low(key)?;
        debug!(%key, low_index = index, "proving exclusion");
        lookup.proof(index, self.size)
    }
}

impl<S: NodeStore, H: TreeHasher> IndexedTreeMut<H> for IndexedTreeDBMut<S, H> {
    /// Inserts a key-value record. The low leaf of the key is rewritten to point at the new key
    /// and the new leaf, inheriting the low leaf's successor, is appended at the next free index.
    /// Both leaves and their merkle paths are written in one transaction.
    ///
    /// Errors:
    /// - DuplicateKey: if the key is zero or already present
    /// - CapacityExceeded: if the tree is full
    /// - EncodingRange: if the key or value lies outside the input domain of `H`
    fn insert(&mut self, key: Word, value: Word) -> Result<InsertionProof, TreeError> {
        if key.is_zero() || self.keys.contains_key(&key) {
            return Err(TreeError::DuplicateKey(key));
        }
        let size = self
            .size
            .checked_add(1)
            .filter(|size| u128::from(*size) <= self.merkle.capacity())
            .ok_or(TreeError::CapacityExceeded(self.merkle.capacity()))?;
        Leaf::new(key, value, Word::zero()).check::<H>()?;

        let mut txn = Transaction::begin(&mut self.store);

        // exclusion evidence for the new key, captured before any write
        let lookup = Lookup::new(&*txn, &self.merkle, &self.keys);
        let (low_index, low) = lookup.find_low(&key)?;
        let low_leaf = lookup.proof(low_index, self.size)?;
        let old_root = low_leaf.root;

        let index = self.size;
        let new = Leaf::new(key, value, low.next_key);
        let updated_low = Leaf {
            next_key: key,
            ..low
        };

        txn.put(Slot::Leaf(low_index), updated_low.into())?;
        self.merkle
            .update_leaf(&mut *txn, low_index, updated_low.hash::<H>()?)?;

        txn.put(Slot::Leaf(index), new.into())?;
        let new_root = self.merkle.update_leaf(&mut *txn, index, new.hash::<H>()?)?;

        txn.put(
            Slot::Meta,
            TreeMeta {
                depth: self.merkle.depth() as u8,
                size,
            }
            .into(),
        )?;

        let new_leaf = Proof {
            root: new_root,
            size,
            index,
            node: new,
            siblings: self.merkle.path_for(&*txn, index)?,
        };
        txn.commit()?;

        self.keys.insert(key, index);
        self.size = size;
        debug!(%key, index, low_index, ?new_root, "inserted leaf");

        Ok(InsertionProof {
            old_root,
            new_root,
            low_leaf,
            new_leaf,
            index,
        })
    }

    /// Replaces the value of an existing key. The key and its successor are left untouched so the
    /// key order cannot change.
    ///
    /// Errors:
    /// - NotFound: if the key is zero or not present
    /// - EncodingRange: if the value lies outside the input domain of `H`
    fn update(&mut self, key: Word, value: Word) -> Result<UpdateProof, TreeError> {
        let index = self
            .keys
            .get(&key)
            .copied()
            .filter(|_| !key.is_zero())
            .ok_or(TreeError::NotFound(key))?;

        let mut txn = Transaction::begin(&mut self.store);
        let old_root = self.merkle.root(&*txn)?;
        let old_leaf = Lookup::new(&*txn, &self.merkle, &self.keys).leaf_at(index)?;
        let new = Leaf { value, ..old_leaf };
        let leaf_hash = new.hash::<H>()?;

        txn.put(Slot::Leaf(index), new.into())?;
        let new_root = self.merkle.update_leaf(&mut *txn, index, leaf_hash)?;
        let proof = Proof {
            root: new_root,
            size: self.size,
            index,
            node: new,
            siblings: self.merkle.path_for(&*txn, index)?,
        };
        txn.commit()?;

        debug!(%key, index, ?new_root, "updated leaf");
        Ok(UpdateProof {
            old_root,
            old_leaf,
            proof,
        })
    }
}
