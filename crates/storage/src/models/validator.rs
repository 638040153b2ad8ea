//! Validator rows and block signatures.

use super::{
    codec::{Reader, put_b256, put_str, put_u64},
    keys::SignatureKey,
    list::U64List,
};
use alloy_primitives::B256;
use reth_codecs::Compact;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};

/// A validator, keyed by internal id in [`Validators`] and unique per public
/// key. Power is always refreshed on upsert; the name only when non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredValidator {
    /// Validator public key.
    pub pubkey: B256,
    /// Current voting power.
    pub power: u64,
    /// Validator moniker. Empty when never reported.
    pub name: String,
    /// Height at which the validator was first seen.
    pub first_height: u64,
}

impl Compact for StoredValidator {
    fn to_compact<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) -> usize {
        put_b256(buf, &self.pubkey) +
            put_u64(buf, self.power) +
            put_str(buf, &self.name) +
            put_u64(buf, self.first_height)
    }

    fn from_compact(buf: &[u8], _len: usize) -> (Self, &[u8]) {
        let mut reader = Reader::new(buf);
        let validator = Self {
            pubkey: reader.b256(),
            power: reader.u64(),
            name: reader.string(),
            first_height: reader.u64(),
        };
        (validator, reader.rest())
    }
}

/// Validators by internal id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Validators;

impl Table for Validators {
    const NAME: &'static str = "validators";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredValidator;
}

/// Internal validator id by public key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ValidatorIds;

impl Table for ValidatorIds {
    const NAME: &'static str = "validator_ids";
    const DUPSORT: bool = false;
    type Key = B256;
    type Value = u64;
}

/// Ids of validators first seen at a height. Rollback index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ValidatorsByHeight;

impl Table for ValidatorsByHeight {
    const NAME: &'static str = "validators_by_height";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = U64List;
}

/// One attestation per (height, validator). The value is the block timestamp.
/// Subject to retention pruning on a height cadence, independent of rollback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BlockSignatures;

impl Table for BlockSignatures {
    const NAME: &'static str = "block_signatures";
    const DUPSORT: bool = false;
    type Key = SignatureKey;
    type Value = u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_validator_compact_roundtrip() {
        let validator = StoredValidator {
            pubkey: B256::repeat_byte(5),
            power: 700,
            name: "aurora".to_string(),
            first_height: 1,
        };
        let mut buf = Vec::new();
        let written = validator.to_compact(&mut buf);
        let (decoded, rest) = StoredValidator::from_compact(&buf, written);
        assert_eq!(decoded, validator);
        assert!(rest.is_empty());
    }

    #[test]
    fn stored_validator_empty_name_roundtrip() {
        let validator = StoredValidator {
            pubkey: B256::repeat_byte(1),
            power: 1,
            name: String::new(),
            first_height: 8,
        };
        let mut buf = Vec::new();
        let written = validator.to_compact(&mut buf);
        let (decoded, _) = StoredValidator::from_compact(&buf, written);
        assert_eq!(decoded, validator);
    }
}
