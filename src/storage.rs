use super::{DBValue, HashMap, Hasher, StoreError};
use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use hash_db::{HashDB, Prefix, EMPTY_PREFIX};
use memory_db::{KeyFunction, MemoryDB};
use tracing::trace;

// Slot
// ================================================================================================

/// Address of a record in the node store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Tree metadata: depth and size
    Meta,
    /// Encoded leaf at a tree index
    Leaf(u64),
    /// Merkle node hash. Level 0 holds leaf hashes, level `depth` holds the root.
    Node { level: u8, index: u64 },
}

impl Slot {
    /// Returns the byte encoding of the slot address. The first byte identifies the slot type.
    /// Tags start at 1: `MemoryDB` reserves the hash of `[0]` for its null node.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Slot::Meta => vec![1],
            Slot::Leaf(index) => {
                let mut bytes = vec![2];
                bytes.extend_from_slice(&index.to_be_bytes());
                bytes
            }
            Slot::Node { level, index } => {
                let mut bytes = vec![3, *level];
                bytes.extend_from_slice(&index.to_be_bytes());
                bytes
            }
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Meta => write!(f, "Meta"),
            Slot::Leaf(index) => write!(f, "Leaf({index})"),
            Slot::Node { level, index } => write!(f, "Node({level}, {index})"),
        }
    }
}

// TreeMeta
// ================================================================================================

/// The number of bytes in encoded tree metadata
const META_SIZE: usize = 9;

/// Persisted tree metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeMeta {
    pub depth: u8,
    pub size: u64,
}

impl From<TreeMeta> for Vec<u8> {
    fn from(meta: TreeMeta) -> Self {
        let mut bytes = vec![meta.depth];
        bytes.extend_from_slice(&meta.size.to_be_bytes());
        bytes
    }
}

impl TryFrom<&[u8]> for TreeMeta {
    type Error = StoreError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let corrupt = || StoreError::CorruptSlot {
            slot: Slot::Meta,
            expected: META_SIZE,
            actual: bytes.len(),
        };
        let (depth, size) = bytes.split_first().ok_or_else(corrupt)?;
        let size: [u8; 8] = size.try_into().map_err(|_| corrupt())?;
        Ok(TreeMeta {
            depth: *depth,
            size: u64::from_be_bytes(size),
        })
    }
}

// INTERFACES
// ================================================================================================

/// Slot addressed transactional storage backing a tree. Writes are staged until `commit` and
/// discarded by `rollback`. Reads observe staged writes.
pub trait NodeStore {
    /// Returns the value stored at the slot
    fn get(&self, slot: &Slot) -> Result<Option<DBValue>, StoreError>;

    /// Stages a value for the slot
    fn put(&mut self, slot: Slot, value: DBValue) -> Result<(), StoreError>;

    /// Makes all staged writes durable, all or nothing
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discards all staged writes
    fn rollback(&mut self);
}

// Transaction
// ================================================================================================

/// Scoped transaction over a node store. Staged writes are rolled back when the transaction is
/// dropped without a successful commit.
pub struct Transaction<'s, S: NodeStore + ?Sized> {
    store: &'s mut S,
    committed: bool,
}

impl<'s, S: NodeStore + ?Sized> Transaction<'s, S> {
    /// Begin a transaction on the store
    pub fn begin(store: &'s mut S) -> Self {
        Self {
            store,
            committed: false,
        }
    }

    /// Commit the staged writes. On failure the writes are rolled back when the transaction drops.
    pub fn commit(mut self) -> Result<(), StoreError> {
        self.store.commit()?;
        self.committed = true;
        trace!("transaction committed");
        Ok(())
    }
}

impl<'s, S: NodeStore + ?Sized> Deref for Transaction<'s, S> {
    type Target = S;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<'s, S: NodeStore + ?Sized> DerefMut for Transaction<'s, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}

impl<'s, S: NodeStore + ?Sized> Drop for Transaction<'s, S> {
    fn drop(&mut self) {
        if !self.committed {
            self.store.rollback();
            trace!("transaction rolled back");
        }
    }
}

// HashDBStore
// ================================================================================================

/// Node store backed by a `HashDB`. Slots are keyed in the database by the hash of their
/// encoding under `H`. Writes are buffered in memory and flushed on commit.
pub struct HashDBStore<'db, H: Hasher> {
    db: &'db mut dyn HashDB<H, DBValue>,
    pending: HashMap<Slot, DBValue>,
}

impl<'db, H: Hasher> HashDBStore<'db, H> {
    /// Construct a new store over the database
    pub fn new(db: &'db mut dyn HashDB<H, DBValue>) -> Self {
        Self {
            db,
            pending: HashMap::new(),
        }
    }

    /// Returns the number of staged writes
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn db_key(slot: &Slot) -> H::Out {
        H::hash(&slot.to_bytes())
    }
}

impl<'db, H: Hasher> NodeStore for HashDBStore<'db, H> {
    fn get(&self, slot: &Slot) -> Result<Option<DBValue>, StoreError> {
        if let Some(value) = self.pending.get(slot) {
            return Ok(Some(value.clone()));
        }
        Ok(self.db.get(&Self::db_key(slot), EMPTY_PREFIX))
    }

    fn put(&mut self, slot: Slot, value: DBValue) -> Result<(), StoreError> {
        self.pending.insert(slot, value);
        Ok(())
    }

    /// Flushes staged writes into the database. An existing entry is removed before the new
    /// value is emplaced so that every slot key holds exactly one reference.
    fn commit(&mut self) -> Result<(), StoreError> {
        for (slot, value) in self.pending.drain() {
            let key = Self::db_key(&slot);
            if self.db.contains(&key, EMPTY_PREFIX) {
                self.db.remove(&key, EMPTY_PREFIX);
            }
            self.db.emplace(key, EMPTY_PREFIX, value);
        }
        Ok(())
    }

    fn rollback(&mut self) {
        self.pending.clear();
    }
}

// MemoryDB
// ================================================================================================

/// `MemoryDB` key function for slot keys. A slot key is already the hash of a unique slot
/// address, so it is stored as is and the prefix is dropped.
pub struct SlotKey<H: Hasher>(PhantomData<H>);

impl<H: Hasher> KeyFunction<H> for SlotKey<H> {
    type Key = Vec<u8>;

    fn key(slot_key: &H::Out, _: Prefix) -> Self::Key {
        slot_key.as_ref().into()
    }
}

/// In memory database usable as the backend of a `HashDBStore`
pub type MemoryNodeDB<H> = MemoryDB<H, SlotKey<H>, DBValue>;
