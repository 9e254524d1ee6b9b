//! Content digests, document ids, and commit-reveal hash-locks.
//!
//! All hashing is Blake2b-256. Digests bind a voted motion to the exact
//! action it authorizes; hash-locks bind an on-ledger settlement to an
//! off-ledger secret.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// A 32-byte Blake2b-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Hash a single byte slice.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Hash multiple byte slices in sequence (avoids concatenation allocation).
    pub fn of_parts(parts: &[&[u8]]) -> Self {
        let mut hasher = Blake2b256::new();
        for part in parts {
            hasher.update(part);
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// Address of a document record on the ledger.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId([u8; 32]);

impl DocId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a document id from its creator and creation time.
    pub fn derive(creator: &[u8], created_at_secs: u64) -> Self {
        let d = Digest::of_parts(&[b"gavel.doc", creator, &created_at_secs.to_le_bytes()]);
        Self(*d.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocId({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The committed half of a commit-reveal pair.
///
/// The party holding the preimage (the hash-key) can unilaterally complete a
/// settlement by revealing it; nobody else can forge a matching key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashLock(Digest);

impl HashLock {
    pub fn new(digest: Digest) -> Self {
        Self(digest)
    }

    /// Build the lock for a given secret key (commit step).
    pub fn from_key(key: &[u8]) -> Self {
        Self(Digest::of(key))
    }

    /// Whether `key` is the preimage of this lock (reveal step).
    pub fn matches(&self, key: &[u8]) -> bool {
        Digest::of(key) == self.0
    }

    pub fn digest(&self) -> &Digest {
        &self.0
    }
}

// Inline hex encoding to avoid pulling the `hex` crate into types.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
