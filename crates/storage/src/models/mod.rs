//! Database table schemas used by the indexer.
//!
//! This module defines the value types, keys, and table layouts for the whole
//! projection. Tables are registered through [`reth_db_api::table::TableInfo`]
//! and grouped into a [`reth_db_api::TableSet`] for database initialization.

mod codec;

mod keys;
pub use keys::{BalanceKey, BlockScopedKey, RollupAccountKey, SignatureKey};

mod list;
pub use list::{IdPairList, U64List};

mod block;
pub use block::{BlockStats, Blocks, StoredBlock, StoredBlockStats};

mod account;
pub use account::{
    AccountActions, AccountIds, Accounts, AccountsByHeight, BalanceUpdates, Balances,
    StoredAccount, StoredAccountAction, StoredBalance, StoredBalanceUpdate,
};

mod rollup;
pub use rollup::{
    RollupAccounts, RollupAccountsByHeight, RollupActions, RollupIds, Rollups, RollupsByHeight,
    StoredRollup, StoredRollupAction,
};

mod bridge;
pub use bridge::{BridgeIds, Bridges, BridgesByHeight, StoredBridge};

mod validator;
pub use validator::{
    BlockSignatures, StoredValidator, ValidatorIds, Validators, ValidatorsByHeight,
};

mod tx;
pub use tx::{
    Actions, Deposits, Fees, StoredAction, StoredDeposit, StoredFee, StoredTransfer, StoredTx,
    Transactions, Transfers,
};

mod state;
pub use state::{IndexerState, STATE_KEY, StoredState};

/// Implements [`reth_db_api::table::Compress`] and
/// [`reth_db_api::table::Decompress`] for value types that implement
/// [`reth_codecs::Compact`].
macro_rules! impl_compression_for_compact {
    ($($name:ident),+ $(,)?) => {
        $(
            impl reth_db_api::table::Compress for $name {
                type Compressed = Vec<u8>;

                fn compress_to_buf<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
                    let _ = reth_codecs::Compact::to_compact(self, buf);
                }
            }

            impl reth_db_api::table::Decompress for $name {
                fn decompress(value: &[u8]) -> Result<$name, reth_db_api::DatabaseError> {
                    let (obj, _) = reth_codecs::Compact::from_compact(value, value.len());
                    Ok(obj)
                }
            }
        )+
    };
}

/// Implements [`reth_db_api::table::TableInfo`] for table types, exposing
/// name and dupsort metadata to the schema system.
macro_rules! impl_table_info {
    ($($table:ty),+ $(,)?) => {
        $(
            impl reth_db_api::table::TableInfo for $table
            where
                $table: reth_db_api::table::Table,
            {
                fn name(&self) -> &'static str {
                    <$table as reth_db_api::table::Table>::NAME
                }

                fn is_dupsort(&self) -> bool {
                    <$table as reth_db_api::table::Table>::DUPSORT
                }
            }
        )+
    };
}

/// Declares a struct representing a collection of tables and implements
/// [`reth_db_api::TableSet`] for it, for use with `init_db_for`.
macro_rules! impl_table_set {
    (
        $(#[$outer:meta])*
        $set_name:ident, $($table:ty),+ $(,)?
    ) => {
        $(#[$outer])*
        #[derive(Debug)]
        pub struct $set_name;

        impl reth_db_api::TableSet for $set_name {
            fn tables() -> Box<dyn Iterator<Item = Box<dyn reth_db_api::table::TableInfo>>> {
                Box::new(vec![
                    $(
                        Box::new(<$table>::default()) as Box<dyn reth_db_api::table::TableInfo>
                    ),*
                ].into_iter())
            }
        }
    };
}

impl_compression_for_compact!(
    StoredBlock,
    StoredBlockStats,
    StoredAccount,
    StoredBalance,
    StoredBalanceUpdate,
    StoredAccountAction,
    StoredRollup,
    StoredRollupAction,
    StoredBridge,
    StoredValidator,
    StoredTx,
    StoredAction,
    StoredFee,
    StoredDeposit,
    StoredTransfer,
    StoredState,
    U64List,
    IdPairList,
);

impl_table_info!(
    Blocks,
    BlockStats,
    Transactions,
    Actions,
    Accounts,
    AccountIds,
    AccountsByHeight,
    Balances,
    BalanceUpdates,
    AccountActions,
    Rollups,
    RollupIds,
    RollupsByHeight,
    RollupActions,
    RollupAccounts,
    RollupAccountsByHeight,
    Bridges,
    BridgeIds,
    BridgesByHeight,
    Validators,
    ValidatorIds,
    ValidatorsByHeight,
    BlockSignatures,
    Fees,
    Deposits,
    Transfers,
    IndexerState,
);

impl_table_set!(
    /// The full table set backing the indexer projection.
    IndexerTables,
    Blocks,
    BlockStats,
    Transactions,
    Actions,
    Accounts,
    AccountIds,
    AccountsByHeight,
    Balances,
    BalanceUpdates,
    AccountActions,
    Rollups,
    RollupIds,
    RollupsByHeight,
    RollupActions,
    RollupAccounts,
    RollupAccountsByHeight,
    Bridges,
    BridgeIds,
    BridgesByHeight,
    Validators,
    ValidatorIds,
    ValidatorsByHeight,
    BlockSignatures,
    Fees,
    Deposits,
    Transfers,
    IndexerState,
);
