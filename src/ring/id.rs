use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;

/// Number of bits in the identifier space (SHA-1 output length).
pub const M: usize = 160;

const ID_BYTES: usize = M / 8;

/// A position on the ring.
///
/// Stored big-endian, so the derived `Ord` matches numeric order on `[0, 2^160)`.
/// Serialized as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Identifier([u8; ID_BYTES]);

impl Identifier {
    pub const fn from_bytes(bytes: [u8; ID_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns `self + 2^power mod 2^160`.
    fn add_power_of_two(&self, power: usize) -> Self {
        let mut bytes = self.0;
        let mut idx = ID_BYTES - 1 - power / 8;
        let mut carry = 1u16 << (power % 8);

        loop {
            let sum = bytes[idx] as u16 + carry;
            bytes[idx] = sum as u8;
            carry = sum >> 8;
            if carry == 0 || idx == 0 {
                break;
            }
            idx -= 1;
        }

        Self(bytes)
    }
}

impl From<u64> for Identifier {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; ID_BYTES];
        bytes[ID_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Eight hex digits are plenty to tell ring members apart in logs.
        write!(f, "Id({})", &self.to_hex()[..8])
    }
}

impl FromStr for Identifier {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; ID_BYTES];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Hashes an address or key onto the ring.
pub fn hash(value: &str) -> Identifier {
    let mut hasher = Sha1::new();
    hasher.update(value.as_bytes());
    Identifier(hasher.finalize().into())
}

/// Target of finger `index` (1-based): `id + 2^(index-1) mod 2^160`.
pub fn jump(id: &Identifier, index: usize) -> Identifier {
    debug_assert!((1..=M).contains(&index), "finger index out of range");
    id.add_power_of_two(index - 1)
}

/// Tests whether `x` lies in the ring interval `(start, end]` (`inclusive`) or
/// `(start, end)`.
///
/// When `end <= start` the interval wraps past zero. With `start == end` the open
/// interval covers the whole ring except `start` itself, which is what a singleton
/// ring needs.
pub fn between(start: &Identifier, x: &Identifier, end: &Identifier, inclusive: bool) -> bool {
    if inclusive && x == end {
        return true;
    }
    if end > start {
        start < x && x < end
    } else {
        start < x || x < end
    }
}
