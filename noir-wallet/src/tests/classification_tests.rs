//! Validity, pending and verified status

use crate::keys::ChainKind::{External, Internal};
use crate::test_utils::{
    confirmed_payment, foreign_address, funding_tx, spending_tx, test_config, test_keys, test_wallet,
    EventRecorder, wallet_address,
};
use crate::transaction::{OutPoint, TXIN_SEQUENCE};
use crate::{PendingReason, Transaction, TransactionRecord, TxStatus, Wallet, WalletBuilder, WalletEvent, TX_UNCONFIRMED};

fn seen(tx: Transaction) -> TransactionRecord {
    TransactionRecord::new(tx).with_block(TX_UNCONFIRMED, 1_700_000_000)
}

fn restored_wallet() -> Wallet {
    WalletBuilder::new(test_config(), test_keys())
        .with_transactions([confirmed_payment(1, 0, 1_000_000, 100)])
        .build()
        .unwrap()
}

#[test]
fn test_double_spend_is_invalid_until_winner_removed() {
    let recorder = EventRecorder::new();
    let mut wallet = WalletBuilder::new(test_config(), test_keys())
        .with_transactions([confirmed_payment(1, 0, 1_000_000, 100)])
        .with_listener(recorder.clone())
        .build()
        .unwrap();
    let funding = OutPoint::new(wallet.transactions()[0].txid, 0);

    let first = spending_tx(&[funding], &[(foreign_address(1), 500_000), (wallet_address(Internal, 0), 490_000)]);
    let second = spending_tx(&[funding], &[(foreign_address(2), 900_000), (wallet_address(Internal, 1), 50_000)]);
    let grandchild = spending_tx(&[OutPoint::new(second.txid(), 1)], &[(wallet_address(External, 1), 40_000)]);

    assert!(wallet.register_transaction(seen(first.clone())).unwrap());
    assert!(wallet.register_transaction(seen(second.clone())).unwrap());
    assert!(wallet.register_transaction(seen(grandchild.clone())).unwrap());

    assert!(wallet.is_valid(&first));
    assert!(!wallet.is_valid(&second));
    assert!(!wallet.is_valid(&grandchild));
    assert!(wallet.transaction_status(&second).contains(TxStatus::INVALID));
    assert_eq!(wallet.balance(), 490_000);
    assert_eq!(wallet.utxos().len(), 1);
    assert_eq!(wallet.utxos()[0].outpoint, OutPoint::new(first.txid(), 1));

    // a new conflicting spend is invalid before it is even registered
    let third = spending_tx(&[funding], &[(foreign_address(3), 10_000)]);
    assert!(!wallet.is_valid(&third));

    recorder.take();
    assert!(wallet.remove_transaction(&first.txid()));
    assert!(wallet.is_valid(&second));
    assert!(wallet.is_valid(&grandchild));
    assert_eq!(wallet.balance(), 40_000);
    assert_eq!(
        recorder.events(),
        vec![
            WalletEvent::TxDeleted {
                txid: first.txid(),
                notify_user: true,
                recommend_rescan: true,
            },
            WalletEvent::BalanceChanged {
                balance: 40_000
            },
        ]
    );
}

#[test]
fn test_removing_funding_of_conflicting_spends() {
    let recorder = EventRecorder::new();
    let mut wallet = WalletBuilder::new(test_config(), test_keys())
        .with_transactions([confirmed_payment(1, 0, 1_000_000, 100)])
        .with_listener(recorder.clone())
        .build()
        .unwrap();
    let funding_txid = wallet.transactions()[0].txid;
    let funding = OutPoint::new(funding_txid, 0);

    let first = spending_tx(&[funding], &[(foreign_address(1), 500_000), (wallet_address(Internal, 0), 490_000)]);
    let second = spending_tx(&[funding], &[(foreign_address(2), 900_000), (wallet_address(Internal, 1), 50_000)]);
    wallet.register_transaction(seen(first.clone())).unwrap();
    wallet.register_transaction(seen(second.clone())).unwrap();
    recorder.take();

    assert!(wallet.remove_transaction(&funding_txid));
    assert!(wallet.transactions().is_empty());
    assert_eq!(
        recorder.events(),
        vec![
            WalletEvent::TxDeleted {
                txid: second.txid(),
                notify_user: false,
                recommend_rescan: false,
            },
            WalletEvent::TxDeleted {
                txid: first.txid(),
                notify_user: true,
                recommend_rescan: true,
            },
            WalletEvent::TxDeleted {
                txid: funding_txid,
                notify_user: false,
                recommend_rescan: true,
            },
            WalletEvent::BalanceChanged {
                balance: 0
            },
        ]
    );
}

#[test]
fn test_replace_by_fee_is_pending() {
    let mut wallet = test_wallet();
    let mut rbf = funding_tx(1, &[(wallet_address(External, 0), 50_000)]);
    rbf.input[0].sequence = 0;

    // status is answered before registration too
    assert_eq!(wallet.pending_reason(&rbf), Some(PendingReason::ReplaceByFee));
    wallet.register_transaction(seen(rbf.clone())).unwrap();

    assert_eq!(wallet.pending_reason(&rbf), Some(PendingReason::ReplaceByFee));
    assert!(!wallet.is_verified(&rbf));
    assert_eq!(wallet.transaction_status(&rbf), TxStatus::PENDING);
    assert!(wallet.utxos()[0].is_pending);

    let child = spending_tx(&[OutPoint::new(rbf.txid(), 0)], &[(wallet_address(External, 1), 40_000)]);
    assert_eq!(wallet.pending_reason(&child), Some(PendingReason::PendingAncestor));
    wallet.register_transaction(seen(child.clone())).unwrap();
    assert_eq!(wallet.pending_reason(&child), Some(PendingReason::PendingAncestor));
}

#[test]
fn test_lock_time_releases_with_block_height() {
    let mut wallet = restored_wallet();
    assert_eq!(wallet.block_height(), 100);
    let funding_txid = wallet.transactions()[0].txid;

    let mut locked = funding_tx(2, &[(wallet_address(External, 1), 50_000)]);
    locked.input[0].sequence = TXIN_SEQUENCE - 1;
    locked.lock_time = 200;
    wallet.register_transaction(seen(locked.clone())).unwrap();
    assert_eq!(wallet.pending_reason(&locked), Some(PendingReason::LockTime));

    wallet.update_transactions(&[funding_txid], 250, 1_600_000_250);
    assert_eq!(wallet.block_height(), 250);
    assert_eq!(wallet.pending_reason(&locked), None);
    assert!(wallet.is_verified(&locked));
}

#[test]
fn test_lock_time_in_the_future() {
    let wallet = test_wallet();
    let mut locked = funding_tx(2, &[(wallet_address(External, 1), 50_000)]);
    locked.input[0].sequence = TXIN_SEQUENCE - 1;
    locked.lock_time = u32::MAX - 1;
    assert_eq!(wallet.pending_reason(&locked), Some(PendingReason::LockTime));

    // a final sequence disables the lock time
    locked.input[0].sequence = TXIN_SEQUENCE;
    assert_eq!(wallet.pending_reason(&locked), None);
}

#[test]
fn test_dust_output_is_pending() {
    let mut wallet = test_wallet();
    let dusty = funding_tx(1, &[(wallet_address(External, 0), 500)]);
    wallet.register_transaction(seen(dusty.clone())).unwrap();
    assert_eq!(wallet.pending_reason(&dusty), Some(PendingReason::DustOutput));
    assert_eq!(wallet.balance_breakdown().pending, 500);
}

#[test]
fn test_verified_needs_timestamp() {
    let mut wallet = test_wallet();
    let payment = funding_tx(1, &[(wallet_address(External, 0), 50_000)]);
    let txid = payment.txid();
    wallet.register_transaction(TransactionRecord::new(payment.clone())).unwrap();
    assert!(!wallet.is_verified(&payment));
    assert_eq!(wallet.transaction_status(&payment), TxStatus::empty());

    wallet.update_transactions(&[txid], TX_UNCONFIRMED, 1_700_000_000);
    assert!(wallet.is_verified(&payment));
    assert_eq!(wallet.transaction_status(&payment), TxStatus::VERIFIED);

    let confirmed = confirmed_payment(2, 1, 10_000, 100);
    wallet.register_transaction(confirmed.clone()).unwrap();
    assert!(wallet.is_verified(&confirmed.tx));
}

#[test]
fn test_unverified_parent_keeps_child_unverified() {
    let mut wallet = test_wallet();
    let parent = funding_tx(1, &[(wallet_address(External, 0), 50_000)]);
    let child = spending_tx(&[OutPoint::new(parent.txid(), 0)], &[(wallet_address(External, 1), 40_000)]);
    wallet.register_transaction(TransactionRecord::new(parent)).unwrap();
    wallet.register_transaction(seen(child.clone())).unwrap();
    assert!(!wallet.is_verified(&child));
}
