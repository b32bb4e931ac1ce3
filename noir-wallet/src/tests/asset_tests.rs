//! Asset-carrying outputs in the wallet

use crate::asset::{self, AssetOperation};
use crate::keys::ChainKind::External;
use crate::script::Script;
use crate::test_utils::{foreign_address, funding_tx, test_config, test_keys, wallet_address};
use crate::transaction::{OutPoint, TxOut};
use crate::{Transaction, TransactionRecord, Wallet, WalletBuilder};

fn asset_payment(op: u8) -> Transaction {
    let mut tx = funding_tx(1, &[(wallet_address(External, 0), 600), (wallet_address(External, 1), 1_000_000)]);
    tx.output.insert(0, TxOut::new(0, Script::new_op_return(&[b'D', b'A', 0x02, op])));
    tx
}

fn wallet_with(tx: Transaction, allow_asset_spend: bool) -> Wallet {
    WalletBuilder::new(test_config().with_asset_spend(allow_asset_spend), test_keys())
        .with_transactions([TransactionRecord::confirmed(tx, 100, 1_600_000_000)])
        .build()
        .unwrap()
}

#[test]
fn test_issuance_output_is_not_spendable() {
    let tx = asset_payment(0x04);
    let txid = tx.txid();
    assert_eq!(asset::classify(&tx), AssetOperation::Issuance);

    let wallet = wallet_with(tx, false);
    assert_eq!(wallet.balance(), 1_000_600);

    let asset_utxo = wallet.utxo(&OutPoint::new(txid, 1)).unwrap();
    let plain_utxo = wallet.utxo(&OutPoint::new(txid, 2)).unwrap();
    assert!(!wallet.output_spendable(asset_utxo));
    assert!(wallet.output_spendable(plain_utxo));

    // one input, two outputs: 226 bytes, one kilobyte of fee
    assert_eq!(wallet.max_output_amount(), 950_000);
    let spend = wallet.create_transaction(950_000, &foreign_address(1)).unwrap();
    assert_eq!(spend.input.len(), 1);
    assert_eq!(spend.input[0].previous_output, OutPoint::new(txid, 2));
}

#[test]
fn test_asset_spend_can_be_enabled() {
    let tx = asset_payment(0x15);
    let txid = tx.txid();
    assert_eq!(asset::classify(&tx), AssetOperation::Transfer);

    let wallet = wallet_with(tx, true);
    assert!(wallet.output_spendable(wallet.utxo(&OutPoint::new(txid, 1)).unwrap()));
    assert_eq!(wallet.max_output_amount(), 950_600);
}

#[test]
fn test_small_output_without_marker_is_spendable() {
    let tx = funding_tx(1, &[(wallet_address(External, 0), 600)]);
    let txid = tx.txid();
    let wallet = wallet_with(tx, false);
    assert!(wallet.output_spendable(wallet.utxo(&OutPoint::new(txid, 0)).unwrap()));
}
