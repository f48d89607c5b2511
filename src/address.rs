//! Node and content identity: fixed-size addresses, their canonical text
//! form, and the XOR metric routing tables organize peers by.

use std::fmt;
use std::str::FromStr;

use ripemd::Ripemd160;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use crate::error::AddressError;

/// Binary size of an [`Address`] in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Required size of a public key fed to [`Address::generate`].
pub const PUBLIC_KEY_LEN: usize = 32;

/// Version byte prepended to the base58check text form.
pub const ADDRESS_VERSION: u8 = 0x51;

/// Highest bucket index a [`Distance`] can report.
pub const MAX_BUCKET_INDEX: usize = ADDRESS_LEN * 8 - 1;

/// A 160-bit node or content identifier.
///
/// Addresses are derived from a public key ([`Address::generate`]) or parsed
/// from their canonical text form. They are plain values: `Copy`, immutable,
/// and safe to share across tasks without locking.
///
/// `Ord` compares the raw bytes most-significant first, giving the strict
/// total order used to break ties when ranking candidate peers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Derive an address from a 32-byte public key.
    ///
    /// The key is hashed with SHA3-256 and the digest hashed again with
    /// RIPEMD-160. Hashing the key rather than truncating it keeps the
    /// address format stable if the signing scheme ever changes.
    ///
    /// ```
    /// use dhtkit::Address;
    ///
    /// let addr = Address::generate(&[0x01; 32]).unwrap();
    /// assert_eq!(addr, Address::generate(&[0x01; 32]).unwrap());
    /// ```
    pub fn generate(public_key: &[u8]) -> Result<Self, AddressError> {
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(AddressError::InvalidKeyLength(public_key.len()));
        }
        let first = Sha3_256::digest(public_key);
        let second = Ripemd160::digest(first);
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(second.as_slice());
        Ok(Self(raw))
    }

    /// The raw 20 address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// XOR distance between this address and `other`.
    pub fn distance(&self, other: &Address) -> Distance {
        let mut raw = [0u8; ADDRESS_LEN];
        for i in 0..ADDRESS_LEN {
            raw[i] = self.0[i] ^ other.0[i];
        }
        Distance(raw)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(raw: [u8; ADDRESS_LEN]) -> Self {
        Self(raw)
    }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddressError;

    /// Ingest raw bytes, e.g. an address field pulled off the wire. Anything
    /// other than exactly 20 bytes is rejected.
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::LengthMismatch(bytes.len()))?;
        Ok(Self(raw))
    }
}

impl fmt::Display for Address {
    /// Canonical text form: base58check with version byte [`ADDRESS_VERSION`],
    /// Bitcoin alphabet, 4-byte double-SHA256 checksum.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(self.0)
            .with_check_version(ADDRESS_VERSION)
            .into_string();
        f.write_str(&encoded)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(AddressError::Decode)?;
        // the decoded payload still carries the version byte at the front
        Address::try_from(decoded.get(1..).unwrap_or_default())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// The XOR of two addresses: a symmetric distance measure.
///
/// Distances order lexicographically, so sorting candidates by their
/// distance to a target ranks them nearest first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Distance([u8; ADDRESS_LEN]);

impl Distance {
    /// The raw distance bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// True when the two measured addresses were identical.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }

    /// Routing bucket index: the position of the first set bit scanning
    /// most-significant first. 0 means the addresses differ in the top bit,
    /// [`MAX_BUCKET_INDEX`] that they differ only in the bottom bit.
    ///
    /// A zero distance also reports [`MAX_BUCKET_INDEX`], so a node measured
    /// against itself lands in the farthest bucket. Routing code must check
    /// [`Distance::is_zero`] and skip bucket placement for self instead of
    /// indexing with the result.
    ///
    /// ```
    /// use dhtkit::Address;
    ///
    /// let a = Address::from([0u8; 20]);
    /// let mut top = [0u8; 20];
    /// top[0] = 0b1000_0000;
    /// assert_eq!(a.distance(&Address::from(top)).bucket_index(), 0);
    /// ```
    pub fn bucket_index(&self) -> usize {
        for (i, byte) in self.0.iter().enumerate() {
            if *byte != 0 {
                return i * 8 + byte.leading_zeros() as usize;
            }
        }
        MAX_BUCKET_INDEX
    }
}

impl fmt::Debug for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Distance({})", hex::encode(self.0))
    }
}
