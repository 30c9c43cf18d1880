//! Content-derived identifiers for proposals and votes.
//!
//! Identifiers are 32-byte BLAKE2b-256 digests. The store feeds a monotonic
//! sequence number into every digest, so two records with identical content
//! still receive distinct ids.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

type Blake2b256 = Blake2b<U32>;

/// Hash multiple byte slices in sequence into 32 bytes.
fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    output.copy_from_slice(&hasher.finalize());
    output
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Parse from the 64-character lowercase (or uppercase) hex form.
            pub fn from_hex(s: &str) -> Result<Self, TypesError> {
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s.trim(), &mut bytes)
                    .map_err(|_| TypesError::InvalidId(s.to_string()))?;
                Ok(Self(bytes))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        // Hex in human-readable formats (JSON evidence, CLI output), raw
        // bytes in binary formats (bincode records).
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&self.to_hex())
                } else {
                    self.0.serialize(serializer)
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let s = String::deserialize(deserializer)?;
                    Self::from_hex(&s).map_err(D::Error::custom)
                } else {
                    <[u8; 32]>::deserialize(deserializer).map(Self)
                }
            }
        }
    };
}

define_id!(
    /// Identifier of a governance proposal.
    ProposalId
);

define_id!(
    /// Identifier of a single vote.
    VoteId
);

impl ProposalId {
    /// Derive the id of a newly created proposal.
    pub fn derive(seq: u64, created_at_ms: u64, title: &str, body: &str) -> Self {
        Self(blake2b_256_multi(&[
            b"accord/proposal",
            &seq.to_be_bytes(),
            &created_at_ms.to_be_bytes(),
            title.as_bytes(),
            &[0u8],
            body.as_bytes(),
        ]))
    }
}

impl VoteId {
    /// Derive the id of a vote appended to `proposal`.
    pub fn derive(
        proposal: &ProposalId,
        seq: u64,
        created_at_ms: u64,
        actor: &str,
        decision: &str,
        reason: &str,
    ) -> Self {
        Self(blake2b_256_multi(&[
            b"accord/vote",
            proposal.as_bytes(),
            &seq.to_be_bytes(),
            &created_at_ms.to_be_bytes(),
            actor.as_bytes(),
            &[0u8],
            decision.as_bytes(),
            &[0u8],
            reason.as_bytes(),
        ]))
    }
}
