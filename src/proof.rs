use super::{Digest, EncodingError, Leaf, MerkleLayer, TreeError, TreeHasher, Word, MAX_DEPTH};

// Proof
// ================================================================================================

/// A proof that `node` is stored at `index` of a tree of `size` leaves with root `root`. Used both
/// for inclusion of a key and, through the low leaf, for exclusion of a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    pub root: Digest,
    pub size: u64,
    pub index: u64,
    pub node: Leaf,
    /// Sibling hashes ordered from the leaf level up
    pub siblings: Vec<Digest>,
}

impl Proof {
    /// Returns the root obtained by folding the leaf hash with the siblings.
    /// Errors:
    /// - OutOfRange: if the node or a sibling lies outside the input domain of `H`
    pub fn computed_root<H: TreeHasher>(&self) -> Result<Digest, EncodingError> {
        if let Some(sibling) = self
            .siblings
            .iter()
            .find(|sibling| !H::accepts(&Word::from(**sibling)))
        {
            return Err(EncodingError::OutOfRange(Word::from(*sibling)));
        }
        let leaf_hash = self.node.hash::<H>()?;
        Ok(MerkleLayer::<H>::root_from_leaf(
            self.index,
            leaf_hash,
            &self.siblings,
        ))
    }
}

// Verification
// ================================================================================================

/// Verifies that `proof` shows its node included in a tree of the given depth with root `root`.
/// Returns false when the path length differs from `depth`, the index is not below the tree size,
/// the size exceeds the capacity of the tree, or the recomputed root does not match.
pub fn verify_inclusion<H: TreeHasher>(
    root: &Digest,
    proof: &Proof,
    depth: usize,
) -> Result<bool, TreeError> {
    if depth > MAX_DEPTH || proof.siblings.len() != depth || proof.index >= proof.size {
        return Ok(false);
    }
    // the fold only reads the low `depth` bits of the index
    if u128::from(proof.size) > 1u128 << depth {
        return Ok(false);
    }
    if proof.root != *root {
        return Ok(false);
    }
    Ok(proof.computed_root::<H>()? == proof.root)
}

/// Verifies that `proof` shows `key` absent from a tree of the given depth with root `root`: the
/// proven node is included and its key and successor bound `key`.
pub fn verify_exclusion<H: TreeHasher>(
    root: &Digest,
    key: &Word,
    proof: &Proof,
    depth: usize,
) -> Result<bool, TreeError> {
    Ok(verify_inclusion::<H>(root, proof, depth)? && proof.node.is_low_for(key))
}

// InsertionProof
// ================================================================================================

/// Result of an insertion. Carries the evidence that the key was absent before the insertion
/// along with the inclusion proof of the new leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsertionProof {
    pub old_root: Digest,
    pub new_root: Digest,
    /// Exclusion proof of the new key through the low leaf, taken before the low leaf was updated
    pub low_leaf: Proof,
    /// Inclusion proof of the new leaf against `new_root`
    pub new_leaf: Proof,
    pub index: u64,
}

impl InsertionProof {
    /// Checks that the low leaf proof excludes the new key under `old_root`, that the new leaf is
    /// included under `new_root` at `index` and that it inherited the low leaf's successor.
    pub fn verify<H: TreeHasher>(&self, depth: usize) -> Result<(), TreeError> {
        let key = self.new_leaf.node.key;
        if !verify_exclusion::<H>(&self.old_root, &key, &self.low_leaf, depth)? {
            return Err(TreeError::InvalidProof("low leaf does not exclude the new key"));
        }
        if self.new_leaf.index != self.index || self.new_leaf.size != self.low_leaf.size + 1 {
            return Err(TreeError::InvalidProof("new leaf is not appended to the tree"));
        }
        if self.new_leaf.node.next_key != self.low_leaf.node.next_key {
            return Err(TreeError::InvalidProof("new leaf does not succeed the low leaf"));
        }
        if !verify_inclusion::<H>(&self.new_root, &self.new_leaf, depth)? {
            return Err(TreeError::InvalidProof("new leaf is not included in the new root"));
        }
        Ok(())
    }
}

// UpdateProof
// ================================================================================================

/// Result of an update. The old leaf with the siblings of `proof` reproduces `old_root`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateProof {
    pub old_root: Digest,
    pub old_leaf: Leaf,
    /// Inclusion proof of the updated leaf against the new root
    pub proof: Proof,
}

impl UpdateProof {
    /// Returns the root after the update
    pub fn new_root(&self) -> &Digest {
        &self.proof.root
    }

    /// Checks that only the value changed and that both the old and new leaves are included
    /// under their respective roots.
    pub fn verify<H: TreeHasher>(&self, depth: usize) -> Result<(), TreeError> {
        let new_leaf = &self.proof.node;
        if new_leaf.key != self.old_leaf.key || new_leaf.next_key != self.old_leaf.next_key {
            return Err(TreeError::InvalidProof("update changed the key order"));
        }
        let old_proof = Proof {
            root: self.old_root,
            node: self.old_leaf,
            ..self.proof.clone()
        };
        if !verify_inclusion::<H>(&self.old_root, &old_proof, depth)? {
            return Err(TreeError::InvalidProof("old leaf is not included in the old root"));
        }
        if !verify_inclusion::<H>(&self.proof.root, &self.proof, depth)? {
            return Err(TreeError::InvalidProof("new leaf is not included in the new root"));
        }
        Ok(())
    }
}
