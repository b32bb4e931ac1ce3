//! Concurrent access through the shared wallet handle

use std::sync::Arc;
use std::thread;

use noir_wallet::test_utils::{confirmed_payment, foreign_address, test_wallet_with_listener, EventRecorder, TEST_SEED};
use noir_wallet::{SharedWallet, TransactionRecord, WalletEvent, TX_UNCONFIRMED};

#[test]
fn test_readers_see_whole_mutations() {
    let recorder = EventRecorder::new();
    let shared = SharedWallet::new(test_wallet_with_listener(recorder.clone()));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let (balance, ledger) = shared
                        .read(|wallet| (wallet.balance(), wallet.utxos().iter().map(|u| u.value).sum::<u64>()))
                        .unwrap();
                    assert_eq!(balance, ledger);
                    assert_eq!(balance % 10_000, 0);
                }
            })
        })
        .collect();

    for id in 1..=20u8 {
        let registered = shared
            .write(|wallet| wallet.register_transaction(confirmed_payment(id, (id % 5) as u32, 10_000, 100 + id as u32)))
            .unwrap()
            .unwrap();
        assert!(registered);
    }
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(shared.balance().unwrap(), 200_000);
    let added = recorder.events().iter().filter(|e| matches!(e, WalletEvent::TxAdded { .. })).count();
    assert_eq!(added, 20);
}

#[test]
fn test_spend_round_trip_through_handle() {
    let shared: SharedWallet = test_wallet_with_listener(Arc::new(EventRecorder::default())).into();
    shared.write(|wallet| wallet.register_transaction(confirmed_payment(1, 0, 1_000_000, 100))).unwrap().unwrap();

    let tx = shared
        .read(|wallet| {
            let mut tx = wallet.create_transaction(300_000, &foreign_address(9))?;
            wallet.sign_transaction(&mut tx, 0, TEST_SEED)?;
            Ok::<_, noir_wallet::WalletError>(tx)
        })
        .unwrap()
        .unwrap();
    assert!(tx.is_signed());

    let balance = shared
        .write(|wallet| {
            wallet.register_transaction(TransactionRecord::new(tx).with_block(TX_UNCONFIRMED, 1))?;
            Ok::<_, noir_wallet::WalletError>(wallet.balance())
        })
        .unwrap()
        .unwrap();
    // default rate: one kilobyte costs 50,000
    assert_eq!(balance, 650_000);
}
