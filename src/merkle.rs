use super::{Digest, Leaf, NodeStore, Slot, StoreError, TreeError, TreeHasher};
use core::marker::PhantomData;
use tracing::trace;

// MerkleLayer
// ================================================================================================

/// Dense binary merkle tree of fixed depth whose node hashes live in a node store. Nodes that were
/// never written take the precomputed empty subtree hash of their level.
pub struct MerkleLayer<H: TreeHasher> {
    depth: usize,
    empty_hashes: Vec<Digest>,
    _hasher: PhantomData<H>,
}

impl<H: TreeHasher> MerkleLayer<H> {
    /// Construct a merkle layer of the given depth
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            empty_hashes: empty_hashes::<H>(depth),
            _hasher: PhantomData,
        }
    }

    /// Returns the depth of the tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the number of leaves the tree can hold
    pub fn capacity(&self) -> u128 {
        1u128 << self.depth
    }

    /// Returns the hash of an empty subtree rooted at `level`
    pub fn empty_hash(&self, level: usize) -> &Digest {
        &self.empty_hashes[level]
    }

    /// Returns the hash of the node at `index` within `level`
    pub fn node<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        level: usize,
        index: u64,
    ) -> Result<Digest, TreeError> {
        let slot = Slot::Node {
            level: level as u8,
            index,
        };
        match store.get(&slot)? {
            Some(data) => Digest::try_from(data.as_slice()).map_err(|_| {
                TreeError::StoreFailure(StoreError::CorruptSlot {
                    slot,
                    expected: H::LENGTH,
                    actual: data.len(),
                })
            }),
            None => Ok(self.empty_hashes[level]),
        }
    }

    /// Returns the root of the tree
    pub fn root<S: NodeStore + ?Sized>(&self, store: &S) -> Result<Digest, TreeError> {
        self.node(store, self.depth, 0)
    }

    /// Returns the authentication path of the leaf at `index`, ordered from the leaf level up.
    pub fn path_for<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        index: u64,
    ) -> Result<Vec<Digest>, TreeError> {
        (0..self.depth)
            .map(|level| self.node(store, level, (index >> level) ^ 1))
            .collect()
    }

    /// Sets the leaf hash at `index` and rewrites every node on its path to the root. Returns the
    /// new root.
    pub fn update_leaf<S: NodeStore + ?Sized>(
        &self,
        store: &mut S,
        index: u64,
        leaf_hash: Digest,
    ) -> Result<Digest, TreeError> {
        let mut hash = leaf_hash;
        let mut position = index;
        store.put(
            Slot::Node {
                level: 0,
                index: position,
            },
            hash.to_vec(),
        )?;

        for level in 0..self.depth {
            let sibling = self.node(store, level, position ^ 1)?;
            hash = parent::<H>(position, &hash, &sibling);
            position >>= 1;
            store.put(
                Slot::Node {
                    level: level as u8 + 1,
                    index: position,
                },
                hash.to_vec(),
            )?;
        }

        trace!(index, root = ?hash, "updated merkle path");
        Ok(hash)
    }

    /// Folds a leaf hash with its authentication path and returns the resulting root
    pub fn root_from_leaf(index: u64, leaf_hash: Digest, siblings: &[Digest]) -> Digest {
        let mut position = index;
        siblings.iter().fold(leaf_hash, |hash, sibling| {
            let hash = parent::<H>(position, &hash, sibling);
            position >>= 1;
            hash
        })
    }
}

// Helpers
// ================================================================================================

/// Returns the parent hash `H(left, right)`
pub fn combine<H: TreeHasher>(left: &Digest, right: &Digest) -> Digest {
    H::hash(&[left.as_ref(), right.as_ref()].concat())
}

/// Returns the parent of the node at `index` given its sibling. Even indices are left children.
fn parent<H: TreeHasher>(index: u64, node: &Digest, sibling: &Digest) -> Digest {
    if index & 1 == 0 {
        combine::<H>(node, sibling)
    } else {
        combine::<H>(sibling, node)
    }
}

/// Return the empty subtree hashes of a tree of the given depth, indexed by level. Level 0 is the
/// hash of the all zero leaf.
pub fn empty_hashes<H: TreeHasher>(depth: usize) -> Vec<Digest> {
    let mut hashes = Vec::with_capacity(depth + 1);
    hashes.push(H::hash(&Leaf::default().encode()));
    for i in 1..=depth {
        let hash = combine::<H>(&hashes[i - 1], &hashes[i - 1]);
        hashes.push(hash);
    }
    hashes
}
