//! Composite table keys.
//!
//! Keys encode big-endian so that raw byte order matches field order; range
//! walks over a height therefore see entries in sequence order.

use alloy_primitives::B256;
use reth_db_api::{
    DatabaseError,
    table::{Decode, Encode},
};
use serde::{Deserialize, Serialize};

/// Key for tables holding one row per block-scoped fact: (height, sequence
/// number within the block).
#[derive(Ord, PartialOrd, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BlockScopedKey {
    /// Block height the fact belongs to.
    pub height: u64,
    /// Insertion sequence within the block.
    pub seq: u32,
}

impl BlockScopedKey {
    /// First key of a height.
    pub const fn first(height: u64) -> Self {
        Self { height, seq: 0 }
    }

    /// Last key of a height.
    pub const fn last(height: u64) -> Self {
        Self { height, seq: u32::MAX }
    }
}

impl Encode for BlockScopedKey {
    type Encoded = [u8; 12];

    fn encode(self) -> Self::Encoded {
        let mut buf = [0u8; 12];
        buf[..8].copy_from_slice(&self.height.to_be_bytes());
        buf[8..].copy_from_slice(&self.seq.to_be_bytes());
        buf
    }
}

impl Decode for BlockScopedKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        if value.len() != 12 {
            return Err(DatabaseError::Decode);
        }
        Ok(Self {
            height: u64::from_be_bytes(value[..8].try_into().expect("8 bytes")),
            seq: u32::from_be_bytes(value[8..].try_into().expect("4 bytes")),
        })
    }
}

/// Key for block signatures: one row per (height, validator).
#[derive(Ord, PartialOrd, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct SignatureKey {
    /// Signed block height.
    pub height: u64,
    /// Internal id of the attesting validator.
    pub validator_id: u64,
}

impl Encode for SignatureKey {
    type Encoded = [u8; 16];

    fn encode(self) -> Self::Encoded {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&self.height.to_be_bytes());
        buf[8..].copy_from_slice(&self.validator_id.to_be_bytes());
        buf
    }
}

impl Decode for SignatureKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        if value.len() != 16 {
            return Err(DatabaseError::Decode);
        }
        Ok(Self {
            height: u64::from_be_bytes(value[..8].try_into().expect("8 bytes")),
            validator_id: u64::from_be_bytes(value[8..].try_into().expect("8 bytes")),
        })
    }
}

/// Key for per-account, per-asset balances.
#[derive(Ord, PartialOrd, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct BalanceKey {
    /// Internal account id.
    pub account_id: u64,
    /// Asset identifier.
    pub asset: B256,
}

impl BalanceKey {
    /// First balance key of an account.
    pub const fn first(account_id: u64) -> Self {
        Self { account_id, asset: B256::ZERO }
    }

    /// Last balance key of an account.
    pub const fn last(account_id: u64) -> Self {
        Self { account_id, asset: B256::repeat_byte(0xff) }
    }
}

impl Encode for BalanceKey {
    type Encoded = [u8; 40];

    fn encode(self) -> Self::Encoded {
        let mut buf = [0u8; 40];
        buf[..8].copy_from_slice(&self.account_id.to_be_bytes());
        buf[8..].copy_from_slice(self.asset.as_slice());
        buf
    }
}

impl Decode for BalanceKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        if value.len() != 40 {
            return Err(DatabaseError::Decode);
        }
        Ok(Self {
            account_id: u64::from_be_bytes(value[..8].try_into().expect("8 bytes")),
            asset: B256::from_slice(&value[8..]),
        })
    }
}

/// Key for the rollup/account join table.
#[derive(Ord, PartialOrd, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct RollupAccountKey {
    /// Internal rollup id.
    pub rollup_id: u64,
    /// Internal account id.
    pub account_id: u64,
}

impl Encode for RollupAccountKey {
    type Encoded = [u8; 16];

    fn encode(self) -> Self::Encoded {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&self.rollup_id.to_be_bytes());
        buf[8..].copy_from_slice(&self.account_id.to_be_bytes());
        buf
    }
}

impl Decode for RollupAccountKey {
    fn decode(value: &[u8]) -> Result<Self, DatabaseError> {
        if value.len() != 16 {
            return Err(DatabaseError::Decode);
        }
        Ok(Self {
            rollup_id: u64::from_be_bytes(value[..8].try_into().expect("8 bytes")),
            account_id: u64::from_be_bytes(value[8..].try_into().expect("8 bytes")),
        })
    }
}
