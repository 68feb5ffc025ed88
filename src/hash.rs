//! Hash strategies used to place keys and virtual nodes on the ring.
//!
//! Every strategy maps a string to a `u64` position. Two strategies ship with the
//! crate: FNV-1a (fast, the default) and SHA-256 truncated to its first eight
//! bytes (slower, resistant to crafted keys). Anything implementing
//! [`HashFunction`], including any [`BuildHasher`] wrapped in [`BuildHasherFn`],
//! can be plugged in as a custom strategy.

use std::fmt::{self, Debug, Display};
use std::hash::{BuildHasher, Hasher};
use std::sync::Arc;

use sha2::{Digest, Sha256 as Sha256Digest};
use siphasher::sip::SipHasher;

#[cfg(feature = "derive")]
use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// A pure, deterministic mapping from a string to a ring position.
pub trait HashFunction: Send + Sync {
    fn hash(&self, key: &str) -> u64;
}

/// FNV-1a 64 bit, usable as a plain `Hasher` too.
#[derive(Clone, Copy, Debug)]
pub struct FnvHasher(u64);

impl Default for FnvHasher {
    fn default() -> Self {
        FnvHasher(FNV_OFFSET_BASIS)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }
}

/// The fast strategy: FNV-1a over the raw key bytes.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Fnv1a;

impl BuildHasher for Fnv1a {
    type Hasher = FnvHasher;

    fn build_hasher(&self) -> Self::Hasher {
        FnvHasher::default()
    }
}

impl HashFunction for Fnv1a {
    fn hash(&self, key: &str) -> u64 {
        write_key(self, key)
    }
}

/// The secure strategy: the first 8 bytes of the SHA-256 digest, read big-endian.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Sha256;

impl HashFunction for Sha256 {
    fn hash(&self, key: &str) -> u64 {
        let digest = Sha256Digest::digest(key.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

/// SipHash 2-4 with zero keys.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct SipHashBuilder;

impl BuildHasher for SipHashBuilder {
    type Hasher = SipHasher;

    fn build_hasher(&self) -> Self::Hasher {
        SipHasher::new()
    }
}

/// Adapts any [`BuildHasher`] into a [`HashFunction`].
///
/// The key bytes are written once, without the length prefix or terminator that
/// `str`'s `Hash` impl would add, so results only depend on the key content.
///
/// ```
/// use weighted_hashring::{BuildHasherFn, HashFunction, SipHashBuilder};
///
/// let hasher = BuildHasherFn(SipHashBuilder);
/// assert_eq!(hasher.hash("user:42"), hasher.hash("user:42"));
/// ```
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct BuildHasherFn<S>(pub S);

impl<S> HashFunction for BuildHasherFn<S>
where
    S: BuildHasher + Send + Sync,
{
    fn hash(&self, key: &str) -> u64 {
        write_key(&self.0, key)
    }
}

fn write_key<S: BuildHasher>(builder: &S, key: &str) -> u64 {
    let mut hasher = builder.build_hasher();
    hasher.write(key.as_bytes());
    hasher.finish()
}

/// The strategy a ring is built with. Fixed for the lifetime of the ring.
#[derive(Clone, Default)]
pub enum HashStrategy {
    #[default]
    Fast,
    Secure,
    Custom(Arc<dyn HashFunction>),
}

impl HashStrategy {
    /// Wraps a user supplied hash function.
    pub fn custom<H>(hasher: H) -> Self
    where
        H: HashFunction + 'static,
    {
        HashStrategy::Custom(Arc::new(hasher))
    }

    pub fn kind(&self) -> HashKind {
        match self {
            HashStrategy::Fast => HashKind::Fast,
            HashStrategy::Secure => HashKind::Secure,
            HashStrategy::Custom(_) => HashKind::Custom,
        }
    }
}

impl HashFunction for HashStrategy {
    fn hash(&self, key: &str) -> u64 {
        match self {
            HashStrategy::Fast => Fnv1a.hash(key),
            HashStrategy::Secure => Sha256.hash(key),
            HashStrategy::Custom(hasher) => hasher.hash(key),
        }
    }
}

impl Debug for HashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashStrategy::{:?}", self.kind())
    }
}

/// Label of the active strategy as reported by [`RingInfo`](crate::RingInfo).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "derive", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "derive", serde(rename_all = "lowercase"))]
pub enum HashKind {
    Fast,
    Secure,
    Custom,
}

impl Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HashKind::Fast => "fast",
            HashKind::Secure => "secure",
            HashKind::Custom => "custom",
        };
        f.write_str(label)
    }
}
