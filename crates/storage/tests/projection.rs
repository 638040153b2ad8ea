//! End-to-end projection tests over a real MDBX environment: forward apply,
//! duplicate and conflict handling, and full rollback reversal.

use alloy_primitives::{Address, B256};
use std::collections::HashMap;
use tempfile::TempDir;
use tideline_storage::{BlockStore, IndexerDb, StorageError};
use tideline_types::{
    AccountDelta, Action, ActionKind, BalanceDelta, BlockSignature, BlockTotals, BridgeDelta,
    DecodedBlock, Deposit, NetworkState, RollupDelta, SignedTx, Transfer, ValidatorUpdate,
};

const ASSET: B256 = B256::repeat_byte(0x11);

fn genesis_validator() -> B256 {
    B256::repeat_byte(0xAA)
}

fn open_db(dir: &TempDir) -> IndexerDb {
    let db = IndexerDb::new(dir.path(), "testnet").expect("create db");
    db.seed_validators(&[ValidatorUpdate {
        pubkey: genesis_validator(),
        power: 10,
        name: "genesis".to_string(),
    }])
    .expect("seed validators");
    db
}

fn no_cache() -> HashMap<B256, u64> {
    HashMap::new()
}

fn block_hash(height: u64) -> B256 {
    B256::with_last_byte(height as u8)
}

fn empty_block(height: u64) -> DecodedBlock {
    DecodedBlock {
        height,
        hash: block_hash(height),
        parent_hash: if height == 1 { B256::ZERO } else { block_hash(height - 1) },
        proposer: genesis_validator(),
        data_hash: B256::repeat_byte(0xD0),
        consensus_hash: B256::repeat_byte(0xC0),
        time: 1_700_000_000 + height * 2,
        totals: BlockTotals::default(),
        accounts: Vec::new(),
        txs: Vec::new(),
        rollups: Vec::new(),
        bridges: Vec::new(),
        validators: Vec::new(),
        signatures: Vec::new(),
    }
}

fn account_delta(address: Address, nonce: u32, actions: u64, signed: u64) -> AccountDelta {
    AccountDelta {
        address,
        nonce,
        actions_count: actions,
        signed_tx_count: signed,
        is_bridge: false,
        is_ibc_relayer: None,
        balances: Vec::new(),
    }
}

/// One transaction moving `amount` of [`ASSET`] from `sender` to `recipient`.
fn transfer_block(
    height: u64,
    sender: Address,
    recipient: Address,
    nonce: u32,
    amount: u128,
) -> DecodedBlock {
    let action = Action {
        kind: ActionKind::Transfer,
        rollup: None,
        data: String::new(),
        accounts: vec![sender, recipient],
        balance_deltas: vec![
            BalanceDelta { account: sender, asset: ASSET, amount: -(amount as i128) },
            BalanceDelta { account: recipient, asset: ASSET, amount: amount as i128 },
        ],
        fee: None,
        deposit: None,
        transfer: Some(Transfer { sender, recipient, asset: ASSET, amount }),
    };
    let mut block = empty_block(height);
    block.totals.tx_count = 1;
    // Sender: one action link plus the signed transaction.
    block.accounts = vec![
        account_delta(sender, nonce, 2, 1),
        account_delta(recipient, 0, 1, 0),
    ];
    block.txs = vec![SignedTx {
        hash: B256::with_last_byte(0xF0 ^ height as u8),
        signer: sender,
        nonce,
        actions: vec![action],
    }];
    block
}

/// One transaction submitting hex `payloads` to `rollup`, signed by
/// `submitter`.
fn rollup_block(
    height: u64,
    rollup: B256,
    payloads: &[&str],
    submitter: Address,
    nonce: u32,
) -> DecodedBlock {
    let size: u64 = payloads.iter().map(|payload| (payload.len() / 2) as u64).sum();
    let actions: Vec<Action> = payloads
        .iter()
        .map(|payload| Action {
            kind: ActionKind::RollupDataSubmission,
            rollup: Some(rollup),
            data: (*payload).to_string(),
            accounts: vec![submitter],
            balance_deltas: Vec::new(),
            fee: None,
            deposit: None,
            transfer: None,
        })
        .collect();
    let mut block = empty_block(height);
    block.totals.tx_count = 1;
    block.totals.bytes_total = size;
    block.accounts = vec![account_delta(submitter, nonce, payloads.len() as u64 + 1, 1)];
    block.rollups = vec![RollupDelta {
        rollup_id: rollup,
        actions_count: payloads.len() as u64,
        bridge_count: 0,
        size,
        accounts: vec![submitter],
    }];
    block.txs = vec![SignedTx {
        hash: B256::with_last_byte(0xE0 ^ height as u8),
        signer: submitter,
        nonce,
        actions,
    }];
    block
}

/// One transaction registering (or updating) a bridge for `rollup`.
fn bridge_block(
    height: u64,
    bridge: Address,
    rollup: B256,
    sudo: Option<Address>,
    fee_asset: Option<B256>,
    nonce: u32,
) -> DecodedBlock {
    let action = Action {
        kind: ActionKind::InitBridgeAccount,
        rollup: None,
        data: String::new(),
        accounts: vec![bridge],
        balance_deltas: Vec::new(),
        fee: None,
        deposit: None,
        transfer: None,
    };
    let mut block = empty_block(height);
    block.totals.tx_count = 1;
    let mut bridge_delta = account_delta(bridge, nonce, 2, 1);
    bridge_delta.is_bridge = true;
    block.accounts = vec![bridge_delta];
    if let Some(sudo) = sudo {
        block.accounts.push(account_delta(sudo, 0, 0, 0));
    }
    block.rollups = vec![RollupDelta {
        rollup_id: rollup,
        actions_count: 0,
        bridge_count: 1,
        size: 0,
        accounts: Vec::new(),
    }];
    block.bridges = vec![BridgeDelta {
        account: bridge,
        rollup_id: rollup,
        sudo,
        withdrawer: None,
        asset: None,
        fee_asset,
    }];
    block.txs = vec![SignedTx {
        hash: B256::with_last_byte(0xB0 ^ height as u8),
        signer: bridge,
        nonce,
        actions: vec![action],
    }];
    block
}

#[test]
fn apply_projects_transfer_block() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    let outcome =
        db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply");
    assert!(outcome.applied);
    assert_eq!(outcome.state.last_height, 1);
    assert_eq!(outcome.state.last_hash, block_hash(1));
    assert_eq!(outcome.state.total_tx, 1);
    assert_eq!(outcome.state.total_accounts, 2);

    let sender = db.get_account(alice).expect("read").expect("exists");
    assert_eq!(sender.nonce, 1);
    assert_eq!(sender.actions_count, 2);
    assert_eq!(sender.signed_tx_count, 1);
    assert_eq!(sender.first_height, 1);

    assert_eq!(db.get_balance(alice, ASSET).expect("read"), Some(-100));
    assert_eq!(db.get_balance(bob, ASSET).expect("read"), Some(100));

    let head = db.head_block().expect("read").expect("head exists");
    assert_eq!(head.height, 1);
    assert_eq!(head.hash, block_hash(1));
}

#[test]
fn duplicate_delivery_is_a_no_op() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    let block = transfer_block(1, alice, bob, 1, 100);
    let first = db.apply_block(&block, &no_cache()).expect("first apply");
    let second = db.apply_block(&block, &no_cache()).expect("second apply");

    assert!(first.applied);
    assert!(!second.applied);
    assert_eq!(first.state, second.state);
    // No double counting.
    let sender = db.get_account(alice).expect("read").expect("exists");
    assert_eq!(sender.actions_count, 2);
    assert_eq!(db.get_balance(bob, ASSET).expect("read"), Some(100));
}

#[test]
fn height_gap_and_parent_mismatch_are_conflicts() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply");

    let gap = transfer_block(3, alice, bob, 2, 1);
    assert!(matches!(
        db.apply_block(&gap, &no_cache()),
        Err(StorageError::Conflict(_))
    ));

    let mut bad_parent = transfer_block(2, alice, bob, 2, 1);
    bad_parent.parent_hash = B256::repeat_byte(0x99);
    assert!(matches!(
        db.apply_block(&bad_parent, &no_cache()),
        Err(StorageError::Conflict(_))
    ));

    // Failed applies leave no trace.
    assert_eq!(db.network_state().expect("read").last_height, 1);
    assert_eq!(db.network_state().expect("read").total_tx, 1);
}

#[test]
fn unknown_proposer_aborts_apply() {
    let dir = TempDir::new().expect("temp dir");
    let db = IndexerDb::new(dir.path(), "testnet").expect("create db");

    let block = empty_block(1);
    assert!(matches!(
        db.apply_block(&block, &no_cache()),
        Err(StorageError::UnknownProposer(_))
    ));
    assert!(db.head_block().expect("read").is_none());
}

#[test]
fn unknown_signature_validator_aborts_apply() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);

    let mut block = empty_block(1);
    block.signatures = vec![BlockSignature { validator: B256::repeat_byte(0xBB) }];
    assert!(matches!(
        db.apply_block(&block, &no_cache()),
        Err(StorageError::UnknownValidator(_))
    ));
    assert!(db.head_block().expect("read").is_none());
}

#[test]
fn rollback_round_trips_network_state() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);
    let rollup = B256::repeat_byte(0x33);

    let blocks = vec![
        transfer_block(1, alice, bob, 1, 100),
        rollup_block(2, rollup, &["00112233"], alice, 2),
        transfer_block(3, bob, alice, 1, 25),
    ];

    let mut snapshots: Vec<NetworkState> = Vec::new();
    for block in &blocks {
        snapshots.push(db.apply_block(block, &no_cache()).expect("apply").state);
    }

    let after_two = db.rollback_block().expect("rollback 3");
    assert_eq!(after_two, snapshots[1]);
    let after_one = db.rollback_block().expect("rollback 2");
    assert_eq!(after_one, snapshots[0]);

    // The surviving history still reads back intact.
    assert_eq!(db.get_balance(alice, ASSET).expect("read"), Some(-100));
    assert_eq!(db.get_balance(bob, ASSET).expect("read"), Some(100));
    assert!(db.get_rollup(rollup).expect("read").is_none());
}

#[test]
fn rollback_deletes_entities_created_at_height() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);
    let carol = Address::repeat_byte(3);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply 1");
    db.apply_block(&transfer_block(2, alice, carol, 2, 10), &no_cache()).expect("apply 2");
    assert_eq!(db.network_state().expect("read").total_accounts, 3);

    let state = db.rollback_block().expect("rollback");

    assert_eq!(state.total_accounts, 2);
    assert!(db.get_account(carol).expect("read").is_none());
    // Alice survives, with her block-2 involvement reversed.
    let alice_row = db.get_account(alice).expect("read").expect("exists");
    assert_eq!(alice_row.actions_count, 2);
    assert_eq!(alice_row.signed_tx_count, 1);
    assert_eq!(db.get_balance(alice, ASSET).expect("read"), Some(-100));
}

#[test]
fn rollback_recomputes_nonce_from_remaining_history() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    db.apply_block(&transfer_block(1, alice, bob, 5, 100), &no_cache()).expect("apply 1");
    db.apply_block(&transfer_block(2, alice, bob, 6, 10), &no_cache()).expect("apply 2");
    assert_eq!(db.get_account(alice).expect("read").expect("exists").nonce, 6);

    db.rollback_block().expect("rollback");

    // Not a blind decrement: the highest surviving nonce wins.
    assert_eq!(db.get_account(alice).expect("read").expect("exists").nonce, 5);
}

#[test]
fn rollback_reverses_surviving_rollup_counters() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let rollup = B256::repeat_byte(0x33);

    // 10 payload bytes at height 1, 25 more at height 2.
    db.apply_block(&rollup_block(1, rollup, &["00112233445566778899"], alice, 1), &no_cache())
        .expect("apply 1");
    db.apply_block(
        &rollup_block(2, rollup, &["000102030405060708090a0b", "0d0e0f10111213141516171819"], alice, 2),
        &no_cache(),
    )
    .expect("apply 2");

    let row = db.get_rollup(rollup).expect("read").expect("exists");
    assert_eq!(row.actions_count, 3);
    assert_eq!(row.size, 35);
    assert_eq!(db.network_state().expect("read").total_bytes, 35);

    let state = db.rollback_block().expect("rollback");

    let row = db.get_rollup(rollup).expect("read").expect("exists");
    assert_eq!(row.actions_count, 1);
    assert_eq!(row.size, 10);
    assert_eq!(row.first_height, 1);
    assert_eq!(state.total_bytes, 10);
    assert_eq!(state.total_rollups, 1);
}

#[test]
fn malformed_payload_aborts_rollback_without_deleting_rows() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let rollup = B256::repeat_byte(0x33);

    db.apply_block(&rollup_block(1, rollup, &["00112233"], alice, 1), &no_cache())
        .expect("apply 1");
    // The payload is stored verbatim at apply time; only rollback decodes it.
    db.apply_block(&rollup_block(2, rollup, &["zz-not-hex"], alice, 2), &no_cache())
        .expect("apply 2");
    let before = db.network_state().expect("read");

    let err = db.rollback_block().expect_err("rollback must fail");
    assert!(matches!(err, StorageError::MalformedPayload { height: 2, .. }));

    // The aborted transaction left everything in place.
    assert_eq!(db.head_block().expect("read").expect("head exists").height, 2);
    assert_eq!(db.network_state().expect("read"), before);
    assert!(db.get_rollup(rollup).expect("read").is_some());
}

#[test]
fn bridge_upsert_merges_partial_fields() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let bridge = Address::repeat_byte(4);
    let sudo = Address::repeat_byte(5);
    let rollup = B256::repeat_byte(0x33);
    let fee_asset = B256::repeat_byte(0x22);

    db.apply_block(&bridge_block(1, bridge, rollup, Some(sudo), None, 1), &no_cache())
        .expect("apply 1");
    // The second block only updates the fee asset; no new bridge is
    // registered, so its rollup delta carries no registration.
    let mut update = bridge_block(2, bridge, rollup, None, Some(fee_asset), 2);
    update.rollups[0].bridge_count = 0;
    db.apply_block(&update, &no_cache()).expect("apply 2");

    let row = db.get_bridge(bridge).expect("read").expect("exists");
    assert!(row.sudo_id.is_some());
    assert_eq!(row.fee_asset, Some(fee_asset));
    assert_eq!(row.init_height, 1);

    let state = db.network_state().expect("read");
    assert_eq!(state.total_bridges, 1);
    assert_eq!(db.get_rollup(rollup).expect("read").expect("exists").bridge_count, 1);

    // The bridge was created at height 1, so rolling back height 2 keeps it.
    let state = db.rollback_block().expect("rollback");
    assert_eq!(state.total_bridges, 1);
    assert!(db.get_bridge(bridge).expect("read").is_some());
}

#[test]
fn bridge_created_at_rolled_back_height_is_deleted() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);
    let bridge = Address::repeat_byte(4);
    let rollup = B256::repeat_byte(0x33);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply 1");
    db.apply_block(&bridge_block(2, bridge, rollup, None, None, 1), &no_cache())
        .expect("apply 2");
    assert_eq!(db.network_state().expect("read").total_bridges, 1);

    let state = db.rollback_block().expect("rollback");

    assert_eq!(state.total_bridges, 0);
    assert!(db.get_bridge(bridge).expect("read").is_none());
    assert!(db.get_account(bridge).expect("read").is_none());
}

#[test]
fn rollback_restores_bridge_count_on_surviving_rollup() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bridge = Address::repeat_byte(4);
    let rollup = B256::repeat_byte(0x33);

    // The rollup predates the bridge, so rolling back the registration must
    // leave the rollup in place with its counter reversed.
    db.apply_block(&rollup_block(1, rollup, &["00112233"], alice, 1), &no_cache())
        .expect("apply 1");
    db.apply_block(&bridge_block(2, bridge, rollup, None, None, 1), &no_cache())
        .expect("apply 2");
    assert_eq!(db.get_rollup(rollup).expect("read").expect("exists").bridge_count, 1);

    let state = db.rollback_block().expect("rollback");

    assert_eq!(state.total_bridges, 0);
    assert!(db.get_bridge(bridge).expect("read").is_none());
    let row = db.get_rollup(rollup).expect("read").expect("exists");
    assert_eq!(row.bridge_count, 0);
    assert_eq!(row.first_height, 1);
}

#[test]
fn account_upsert_keeps_max_nonce_and_or_merges_flags() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply 1");

    // A lower incoming nonce must not regress the persisted one.
    let mut second = empty_block(2);
    let mut delta = account_delta(alice, 0, 3, 0);
    delta.is_bridge = true;
    second.accounts = vec![delta];
    db.apply_block(&second, &no_cache()).expect("apply 2");

    let row = db.get_account(alice).expect("read").expect("exists");
    assert_eq!(row.nonce, 1);
    assert_eq!(row.actions_count, 5);
    assert_eq!(row.signed_tx_count, 1);
    assert!(row.is_bridge);
    assert_eq!(row.first_height, 1);
    // A merge, not a second account.
    assert_eq!(db.network_state().expect("read").total_accounts, 2);
}

#[test]
fn rollback_recomputes_nonces_for_every_rolled_back_signer() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    db.apply_block(&transfer_block(1, alice, bob, 3, 100), &no_cache()).expect("apply 1");
    db.apply_block(&transfer_block(2, bob, alice, 4, 40), &no_cache()).expect("apply 2");

    // Height 3 carries one transaction from each signer.
    let mut third = transfer_block(3, alice, bob, 9, 5);
    let mut donor = transfer_block(3, bob, alice, 8, 5);
    third.txs.push(donor.txs.remove(0));
    third.totals.tx_count = 2;
    third.accounts = vec![account_delta(alice, 9, 3, 1), account_delta(bob, 8, 3, 1)];
    db.apply_block(&third, &no_cache()).expect("apply 3");
    assert_eq!(db.get_account(alice).expect("read").expect("exists").nonce, 9);
    assert_eq!(db.get_account(bob).expect("read").expect("exists").nonce, 8);

    db.rollback_block().expect("rollback");

    assert_eq!(db.get_account(alice).expect("read").expect("exists").nonce, 3);
    assert_eq!(db.get_account(bob).expect("read").expect("exists").nonce, 4);
}

#[test]
fn balance_overflow_aborts_apply() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    let mut first = empty_block(1);
    let mut rich = account_delta(bob, 0, 1, 0);
    rich.balances = vec![(ASSET, i128::MAX)];
    first.accounts = vec![rich];
    db.apply_block(&first, &no_cache()).expect("apply 1");

    // One more unit would wrap the running total.
    let second = transfer_block(2, alice, bob, 1, 1);
    assert!(matches!(
        db.apply_block(&second, &no_cache()),
        Err(StorageError::Conflict(_))
    ));
    assert_eq!(db.network_state().expect("read").last_height, 1);
    assert_eq!(db.get_balance(bob, ASSET).expect("read"), Some(i128::MAX));
}

#[test]
fn rollback_removes_balance_rows_created_at_height() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);
    let asset2 = B256::repeat_byte(0x22);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply 1");

    // Height 2 opens a second-asset balance for a surviving account.
    let mut second = transfer_block(2, alice, bob, 2, 10);
    second.txs[0].actions[0]
        .balance_deltas
        .push(BalanceDelta { account: alice, asset: asset2, amount: 50 });
    db.apply_block(&second, &no_cache()).expect("apply 2");
    assert_eq!(db.get_balance(alice, asset2).expect("read"), Some(50));

    db.rollback_block().expect("rollback");

    // Not a zeroed leftover row: the asset reads as absent again.
    assert_eq!(db.get_balance(alice, asset2).expect("read"), None);
    assert_eq!(db.get_balance(alice, ASSET).expect("read"), Some(-100));
}

#[test]
fn validator_upsert_refreshes_power_and_keeps_name_on_empty() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let pubkey = B256::repeat_byte(0xBB);

    let mut first = empty_block(1);
    first.validators =
        vec![ValidatorUpdate { pubkey, power: 20, name: "node-a".to_string() }];
    db.apply_block(&first, &no_cache()).expect("apply 1");

    let mut second = empty_block(2);
    second.validators = vec![ValidatorUpdate { pubkey, power: 25, name: String::new() }];
    db.apply_block(&second, &no_cache()).expect("apply 2");

    let row = db.get_validator(pubkey).expect("read").expect("exists");
    assert_eq!(row.power, 25);
    assert_eq!(row.name, "node-a");
    assert_eq!(row.first_height, 1);

    // Set updates take effect after the block: the new key can sign from the
    // next height onward.
    let mut third = empty_block(3);
    third.signatures = vec![BlockSignature { validator: pubkey }];
    db.apply_block(&third, &no_cache()).expect("apply 3");
}

#[test]
fn validator_created_at_rolled_back_height_is_deleted() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let pubkey = B256::repeat_byte(0xBB);

    db.apply_block(&empty_block(1), &no_cache()).expect("apply 1");
    let mut second = empty_block(2);
    second.validators = vec![ValidatorUpdate { pubkey, power: 20, name: "node-a".to_string() }];
    db.apply_block(&second, &no_cache()).expect("apply 2");
    assert!(db.get_validator(pubkey).expect("read").is_some());

    db.rollback_block().expect("rollback");
    assert!(db.get_validator(pubkey).expect("read").is_none());
}

#[test]
fn deposit_to_account_without_bridge_aborts_apply() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);
    let rollup = B256::repeat_byte(0x33);

    let mut block = transfer_block(1, alice, bob, 1, 100);
    block.rollups = vec![RollupDelta {
        rollup_id: rollup,
        actions_count: 0,
        bridge_count: 0,
        size: 0,
        accounts: Vec::new(),
    }];
    block.txs[0].actions[0].deposit = Some(Deposit {
        bridge: bob,
        rollup: Some(rollup),
        asset: ASSET,
        amount: 7,
        destination: "0xdest".to_string(),
    });

    assert!(matches!(
        db.apply_block(&block, &no_cache()),
        Err(StorageError::UnknownBridge(_))
    ));
    assert!(db.head_block().expect("read").is_none());
}

#[test]
fn supply_change_accumulates_and_reverses() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    let mut first = transfer_block(1, alice, bob, 1, 100);
    first.totals.supply_change = 1_000;
    let mut second = transfer_block(2, alice, bob, 2, 10);
    second.totals.supply_change = -250;

    db.apply_block(&first, &no_cache()).expect("apply 1");
    let applied = db.apply_block(&second, &no_cache()).expect("apply 2");
    assert_eq!(applied.state.total_supply, 750);

    let state = db.rollback_block().expect("rollback");
    assert_eq!(state.total_supply, 1_000);
}

#[test]
fn rollback_of_empty_database_fails() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    assert!(matches!(db.rollback_block(), Err(StorageError::EntryNotFound(_))));
}

#[test]
fn rollback_to_empty_zeroes_head_fields() {
    let dir = TempDir::new().expect("temp dir");
    let db = open_db(&dir);
    let alice = Address::repeat_byte(1);
    let bob = Address::repeat_byte(2);

    db.apply_block(&transfer_block(1, alice, bob, 1, 100), &no_cache()).expect("apply");
    let state = db.rollback_block().expect("rollback");

    assert_eq!(state.last_height, 0);
    assert_eq!(state.last_hash, B256::ZERO);
    assert_eq!(state.total_tx, 0);
    assert_eq!(state.total_accounts, 0);
    assert!(db.head_block().expect("read").is_none());
}
