//! The wallet ledger
//!
//! [`Wallet`] owns the address chains, the transaction registry and the state
//! derived from them. Every mutation updates the registry, rebuilds the derived
//! state in full and then notifies the listener, so a caller holding `&mut Wallet`
//! never observes a half-applied change.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use noir_network::Network;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::address_chain::AddressChain;
use crate::asset;
use crate::balance::{self, LedgerContext, LedgerState, WalletBalance};
use crate::classification::{direct_pending_reason, PendingReason, TxStatus};
use crate::coin_selection::{self, Candidate, CoinSelector, CPFP_MAX_PARENT_IO};
use crate::config::WalletConfig;
use crate::error::{Result, WalletError};
use crate::fee::FeeRate;
use crate::hash_types::Txid;
use crate::keys::{Bip32Signer, ChainKind, PublicKeySource, SigningKeySource};
use crate::notifications::{WalletEvent, WalletListener};
use crate::registry::TransactionRegistry;
use crate::script::Script;
use crate::transaction::{OutPoint, Transaction, TxIn, TxOut};
use crate::transaction_builder::{sign_logged, TransactionBuilder};
use crate::transaction_record::{TransactionRecord, TX_UNCONFIRMED};
use crate::utxo::Utxo;

fn unix_now() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or_default()
}

/// Index of the first output of `tx` paying an address on the requested chain
fn chain_index_fn<'a>(
    external: &'a AddressChain,
    internal: &'a AddressChain,
    network: Network,
) -> impl Fn(&Transaction, ChainKind) -> Option<u32> + 'a {
    move |tx, kind| {
        let chain = match kind {
            ChainKind::External => external,
            ChainKind::Internal => internal,
        };
        tx.output.iter().find_map(|output| {
            Address::from_script(&output.script_pubkey, network)
                .and_then(|address| chain.index_of(&address))
        })
    }
}

/// Builder for [`Wallet`]
pub struct WalletBuilder {
    config: WalletConfig,
    keys: Arc<dyn PublicKeySource>,
    transactions: Vec<TransactionRecord>,
    listener: Option<Arc<dyn WalletListener>>,
    block_height: Option<u32>,
}

impl WalletBuilder {
    pub fn new(config: WalletConfig, keys: impl PublicKeySource + 'static) -> Self {
        Self {
            config,
            keys: Arc::new(keys),
            transactions: Vec::new(),
            listener: None,
            block_height: None,
        }
    }

    /// Previously persisted transactions to restore
    pub fn with_transactions(mut self, records: impl IntoIterator<Item = TransactionRecord>) -> Self {
        self.transactions.extend(records);
        self
    }

    /// Listener for wallet events; fixed for the wallet's lifetime
    pub fn with_listener(mut self, listener: Arc<dyn WalletListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Chain tip known to the caller. Defaults to the highest confirmed
    /// transaction height.
    pub fn with_block_height(mut self, height: u32) -> Self {
        self.block_height = Some(height);
        self
    }

    /// Generate the initial address windows and derive balances.
    ///
    /// Unsigned transactions and transactions that do not touch a wallet address
    /// are dropped. No events fire.
    pub fn build(self) -> Result<Wallet> {
        self.config.validate()?;
        let network = self.config.network;

        let mut wallet = Wallet {
            fee_rate: FeeRate::new(self.config.fee_per_kb),
            config: self.config,
            keys: self.keys,
            external: AddressChain::new(ChainKind::External, network),
            internal: AddressChain::new(ChainKind::Internal, network),
            registry: TransactionRegistry::new(),
            state: LedgerState::default(),
            block_height: 0,
            listener: self.listener,
        };

        let supplied = self.transactions.len();
        let no_index = |_: &Transaction, _: ChainKind| None;
        for record in self.transactions.into_iter().filter(|record| record.tx.is_signed()) {
            wallet.registry.insert(record, &no_index);
        }
        wallet.block_height = self.block_height.unwrap_or_else(|| {
            wallet.registry.iter().filter(|r| r.is_confirmed()).map(|r| r.height).max().unwrap_or(0)
        });

        wallet.rebuild();
        wallet.extend_chains()?;

        let unrelated: Vec<Txid> = wallet
            .registry
            .iter()
            .filter(|record| !wallet.contains_transaction(&record.tx))
            .map(|record| record.txid)
            .collect();
        for txid in &unrelated {
            wallet.registry.remove(txid);
        }

        wallet.resort();
        wallet.rebuild();

        if wallet.registry.len() < supplied {
            warn!(
                dropped = supplied - wallet.registry.len(),
                "dropped restored transactions not belonging to this wallet"
            );
        }
        info!(
            network = %network,
            transactions = wallet.registry.len(),
            balance = wallet.state.balance,
            block_height = wallet.block_height,
            "wallet loaded"
        );
        Ok(wallet)
    }
}

/// SPV wallet ledger
pub struct Wallet {
    config: WalletConfig,
    fee_rate: FeeRate,
    keys: Arc<dyn PublicKeySource>,
    external: AddressChain,
    internal: AddressChain,
    registry: TransactionRegistry,
    state: LedgerState,
    block_height: u32,
    listener: Option<Arc<dyn WalletListener>>,
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("network", &self.config.network)
            .field("transactions", &self.registry.len())
            .field("utxos", &self.state.utxos.len())
            .field("balance", &self.state.balance)
            .field("block_height", &self.block_height)
            .finish()
    }
}

impl Wallet {
    pub fn builder(config: WalletConfig, keys: impl PublicKeySource + 'static) -> WalletBuilder {
        WalletBuilder::new(config, keys)
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    fn is_wallet_address(&self, address: &Address) -> bool {
        self.external.contains(address) || self.internal.contains(address)
    }

    fn with_context<R>(&self, f: impl FnOnce(&LedgerContext<'_>) -> R) -> R {
        let is_wallet_address = |address: &Address| self.is_wallet_address(address);
        f(&LedgerContext {
            network: self.config.network,
            is_wallet_address: &is_wallet_address,
            block_height: self.block_height,
            now: unix_now(),
        })
    }

    fn rebuild(&mut self) {
        let state = self.with_context(|ctx| LedgerState::rebuild(&self.registry, ctx));
        self.state = state;
    }

    fn resort(&mut self) {
        let index = chain_index_fn(&self.external, &self.internal, self.config.network);
        self.registry.resort(&index);
    }

    /// Keep each chain's gap limit of unused addresses past its highest used one.
    ///
    /// Returns true if any address was generated.
    fn extend_chains(&mut self) -> Result<bool> {
        let used = &self.state.used_addresses;
        let keys = self.keys.as_ref();
        let mut extended = false;
        for (chain, gap_limit) in [
            (&mut self.external, self.config.external_gap_limit),
            (&mut self.internal, self.config.internal_gap_limit),
        ] {
            // newly generated addresses may themselves be used already
            loop {
                let (_, new_count) = chain.unused_addresses(keys, gap_limit, |a| used.contains(a))?;
                if new_count == 0 {
                    break;
                }
                extended = true;
            }
        }
        Ok(extended)
    }

    /// Rebuild derived state, generating addresses and re-deriving as needed
    fn refresh_state(&mut self) -> Result<()> {
        self.rebuild();
        if self.extend_chains()? {
            self.resort();
            self.rebuild();
        }
        Ok(())
    }

    fn notify(&self, events: Vec<WalletEvent>) {
        for event in &events {
            debug!(event = %event.description(), "wallet event");
            if let Some(listener) = &self.listener {
                event.dispatch(listener.as_ref());
            }
        }
    }

    fn push_balance_event(&self, previous: u64, events: &mut Vec<WalletEvent>) {
        if self.state.balance != previous {
            events.push(WalletEvent::BalanceChanged {
                balance: self.state.balance,
            });
        }
    }

    // Addresses

    /// The next `gap_limit` addresses past the highest used one on `chain`,
    /// generating any that do not exist yet.
    pub fn unused_addresses(&mut self, gap_limit: u32, chain: ChainKind) -> Result<Vec<Address>> {
        let used = &self.state.used_addresses;
        let keys = self.keys.as_ref();
        let target = match chain {
            ChainKind::External => &mut self.external,
            ChainKind::Internal => &mut self.internal,
        };
        let (addresses, new_count) = target.unused_addresses(keys, gap_limit, |a| used.contains(a))?;

        // outputs of registered transactions may pay the new addresses
        if new_count > 0 {
            let previous = self.state.balance;
            self.resort();
            self.refresh_state()?;
            let mut events = Vec::new();
            self.push_balance_event(previous, &mut events);
            self.notify(events);
        }
        Ok(addresses)
    }

    /// First unused receive address
    pub fn receive_address(&self) -> Option<Address> {
        self.external.first_unused(|a| self.address_is_used(a)).copied()
    }

    /// First unused change address
    pub fn change_address(&self) -> Option<Address> {
        self.internal.first_unused(|a| self.address_is_used(a)).copied()
    }

    /// Every generated address, change chain first, each chain in index order
    pub fn all_addresses(&self) -> Vec<Address> {
        self.internal.addresses().iter().chain(self.external.addresses()).copied().collect()
    }

    pub fn contains_address(&self, address: &Address) -> bool {
        self.is_wallet_address(address)
    }

    /// True if `address` appears in any registered transaction
    pub fn address_is_used(&self, address: &Address) -> bool {
        self.state.used_addresses.contains(address)
    }

    /// Chain and derivation index of a wallet address
    pub fn address_index(&self, address: &Address) -> Option<(ChainKind, u32)> {
        self.external
            .index_of(address)
            .map(|i| (ChainKind::External, i))
            .or_else(|| self.internal.index_of(address).map(|i| (ChainKind::Internal, i)))
    }

    // Outputs

    /// Unspent wallet outputs, oldest first
    pub fn utxos(&self) -> &[Utxo] {
        self.state.utxos.list()
    }

    pub fn utxo(&self, outpoint: &OutPoint) -> Option<&Utxo> {
        self.state.utxos.get(outpoint)
    }

    /// Registered transaction that created `outpoint`
    pub fn utxo_source(&self, outpoint: &OutPoint) -> Option<&TransactionRecord> {
        self.registry.get(&outpoint.txid)
    }

    /// False for asset-carrying outputs unless the wallet allows spending them
    pub fn output_spendable(&self, utxo: &Utxo) -> bool {
        if self.config.allow_asset_spend {
            return true;
        }
        match self.registry.get(&utxo.outpoint.txid) {
            Some(source) => !asset::tx_output_is_asset(&source.tx, utxo.outpoint.vout),
            None => true,
        }
    }

    // Transactions

    /// Registered transactions, oldest first
    pub fn transactions(&self) -> Vec<&TransactionRecord> {
        self.registry.iter().collect()
    }

    /// Transactions confirmed at or after `height`, plus every unconfirmed one
    pub fn transactions_unconfirmed_before(&self, height: u32) -> Vec<&TransactionRecord> {
        self.registry.unconfirmed_before(height)
    }

    pub fn transaction_for_hash(&self, txid: &Txid) -> Option<&TransactionRecord> {
        self.registry.get(txid)
    }

    /// True if `tx` pays to or spends from a wallet address, registered or not
    pub fn contains_transaction(&self, tx: &Transaction) -> bool {
        let network = self.config.network;
        tx.output.iter().any(|output| {
            Address::from_script(&output.script_pubkey, network)
                .is_some_and(|address| self.is_wallet_address(&address))
        }) || tx.input.iter().any(|input| {
            balance::input_address(&self.registry, input, network)
                .is_some_and(|address| self.is_wallet_address(&address))
        })
    }

    /// Register a transaction seen on the network or created by this wallet.
    ///
    /// Returns false for unsigned transactions and ones that do not touch the
    /// wallet. Registering a known transaction again is a no-op returning true.
    pub fn register_transaction(&mut self, record: TransactionRecord) -> Result<bool> {
        if !record.tx.is_signed() {
            debug!(txid = %record.txid, "ignoring unsigned transaction");
            return Ok(false);
        }
        if self.registry.contains(&record.txid) {
            return Ok(true);
        }
        if !self.contains_transaction(&record.tx) {
            return Ok(false);
        }

        let previous = self.state.balance;
        let added = Box::new(record.clone());
        {
            let index = chain_index_fn(&self.external, &self.internal, self.config.network);
            self.registry.insert(record, &index);
        }
        self.refresh_state()?;

        info!(
            txid = %added.txid,
            height = added.height,
            balance = self.state.balance,
            "registered transaction"
        );
        let mut events = vec![WalletEvent::TxAdded {
            record: added,
        }];
        self.push_balance_event(previous, &mut events);
        self.notify(events);
        Ok(true)
    }

    /// Remove a transaction and everything that depends on it.
    ///
    /// Returns false if the transaction is not registered.
    pub fn remove_transaction(&mut self, txid: &Txid) -> bool {
        if !self.registry.contains(txid) {
            return false;
        }

        let mut removed = self.registry.dependents(txid);
        removed.push(*txid);

        // dependents go first, so each record's flags see its dependents already gone
        let previous = self.state.balance;
        let mut events = Vec::with_capacity(removed.len() + 1);
        for id in &removed {
            let Some(record) = self.registry.get(id) else {
                continue;
            };
            let notify_user = self.amount_sent_by_tx(&record.tx) > 0 && self.is_valid(&record.tx);
            let inputs_confirmed = record.tx.input.iter().all(|input| {
                self.registry
                    .get(&input.previous_output.txid)
                    .is_some_and(TransactionRecord::is_confirmed)
            });
            events.push(WalletEvent::TxDeleted {
                txid: *id,
                notify_user,
                recommend_rescan: record.is_confirmed() || (notify_user && inputs_confirmed),
            });
            self.registry.remove(id);
            self.rebuild();
        }

        info!(
            txid = %txid,
            cascaded = removed.len() - 1,
            balance = self.state.balance,
            "removed transaction"
        );
        self.push_balance_event(previous, &mut events);
        self.notify(events);
        true
    }

    /// Set block height and timestamp of registered transactions.
    ///
    /// `TX_UNCONFIRMED` with timestamp 0 marks them unconfirmed and unverified.
    /// Returns the transactions that changed.
    pub fn update_transactions(&mut self, txids: &[Txid], height: u32, timestamp: u32) -> Vec<Txid> {
        if height != TX_UNCONFIRMED && height > self.block_height {
            self.block_height = height;
        }

        let mut updated = Vec::new();
        for txid in txids {
            let Some(record) = self.registry.get_mut(txid) else {
                continue;
            };
            if record.height == height && record.timestamp == timestamp {
                continue;
            }
            record.height = height;
            record.timestamp = timestamp;
            updated.push(*txid);
        }
        if updated.is_empty() {
            return updated;
        }

        let previous = self.state.balance;
        self.resort();
        self.rebuild();

        debug!(count = updated.len(), height, timestamp, "updated transactions");
        let mut events = vec![WalletEvent::TxUpdated {
            txids: updated.clone(),
            height,
            timestamp,
        }];
        self.push_balance_event(previous, &mut events);
        self.notify(events);
        updated
    }

    /// Roll back to `height`: transactions confirmed above it become unconfirmed
    /// and unverified. Returns the reverted transactions.
    pub fn set_unconfirmed_after(&mut self, height: u32) -> Vec<Txid> {
        self.block_height = height;

        let reverted: Vec<Txid> = self
            .registry
            .iter()
            .filter(|record| record.is_confirmed() && record.height > height)
            .map(|record| record.txid)
            .collect();
        for txid in &reverted {
            if let Some(record) = self.registry.get_mut(txid) {
                record.height = TX_UNCONFIRMED;
                record.timestamp = 0;
            }
        }

        let previous = self.state.balance;
        self.resort();
        self.rebuild();

        if reverted.is_empty() {
            self.notify(self.balance_events(previous));
            return reverted;
        }

        warn!(height, reverted = reverted.len(), "chain rolled back, transactions unconfirmed");
        let mut events = vec![WalletEvent::TxUpdated {
            txids: reverted.clone(),
            height: TX_UNCONFIRMED,
            timestamp: 0,
        }];
        self.push_balance_event(previous, &mut events);
        self.notify(events);
        reverted
    }

    /// Re-derive state against the current time, for lock times that expired
    /// without any other change.
    pub fn refresh(&mut self) {
        let previous = self.state.balance;
        self.rebuild();
        self.notify(self.balance_events(previous));
    }

    fn balance_events(&self, previous: u64) -> Vec<WalletEvent> {
        let mut events = Vec::new();
        self.push_balance_event(previous, &mut events);
        events
    }

    // Fees

    pub fn fee_per_kb(&self) -> u64 {
        self.fee_rate.per_kb()
    }

    /// Set the fee rate, clamped into the accepted range
    pub fn set_fee_per_kb(&mut self, fee_per_kb: u64) {
        self.fee_rate = FeeRate::new(fee_per_kb);
        debug!(requested = fee_per_kb, applied = self.fee_rate.per_kb(), "fee rate set");
    }

    pub fn fee_for_tx_size(&self, size: usize) -> u64 {
        self.fee_rate.fee_for_size(size)
    }

    /// Outputs below this are not worth creating at the current fee rate
    pub fn min_output_amount(&self) -> u64 {
        self.fee_rate.min_output_amount()
    }

    /// Largest amount one transaction can send, after fees
    pub fn max_output_amount(&self) -> u64 {
        coin_selection::max_output_amount(self.fee_rate, &self.candidates())
    }

    /// Fee a payment of `amount` would likely pay, 0 if it cannot be funded
    pub fn fee_for_tx_amount(&self, amount: u64) -> u64 {
        let amount = amount.min(self.max_output_amount());
        let output = TxOut::new(amount, Script::new_p2pkh(&[0u8; 20]));
        match self.create_transaction_for_outputs(vec![output]) {
            Ok(tx) => self.fee_for_tx(&tx),
            Err(_) => 0,
        }
    }

    // Balances

    pub fn balance(&self) -> u64 {
        self.state.balance
    }

    /// Balance split by confirmation state
    pub fn balance_breakdown(&self) -> WalletBalance {
        self.state.breakdown()
    }

    /// Total sent from the wallet, change excluded
    pub fn total_sent(&self) -> u64 {
        self.state.total_sent
    }

    /// Total received by the wallet, change excluded
    pub fn total_received(&self) -> u64 {
        self.state.total_received
    }

    /// Balance right after `txid` was applied, or the current balance if unknown
    pub fn balance_after_tx(&self, txid: &Txid) -> u64 {
        self.state.history.get(txid).copied().unwrap_or(self.state.balance)
    }

    pub fn amount_received_from_tx(&self, tx: &Transaction) -> u64 {
        self.with_context(|ctx| balance::amount_received(tx, ctx))
    }

    pub fn amount_sent_by_tx(&self, tx: &Transaction) -> u64 {
        self.with_context(|ctx| balance::amount_sent(&self.registry, tx, ctx))
    }

    /// Fee paid by `tx`, or [`FEE_UNKNOWN`](crate::fee::FEE_UNKNOWN) if an input's value is unknown
    pub fn fee_for_tx(&self, tx: &Transaction) -> u64 {
        balance::fee_for_tx(&self.registry, tx)
    }

    // Status

    /// Highest confirmed block height seen
    pub fn block_height(&self) -> u32 {
        self.block_height
    }

    /// Confirmations of a registered transaction at the current block height
    pub fn confirmations(&self, txid: &Txid) -> Result<u32> {
        self.registry
            .get(txid)
            .map(|record| record.confirmations(self.block_height))
            .ok_or(WalletError::UnknownTransaction(*txid))
    }

    /// False if `tx` double-spends an output already spent by an earlier
    /// transaction, or descends from a transaction that does.
    pub fn is_valid(&self, tx: &Transaction) -> bool {
        let txid = tx.txid();
        if let Some(record) = self.registry.get(&txid) {
            return record.is_confirmed() || !self.state.invalid.contains(&txid);
        }
        !tx.input.iter().any(|input| {
            self.state.spent_outputs.contains(&input.previous_output)
                || self.state.invalid.contains(&input.previous_output.txid)
        })
    }

    /// Why `tx` is pending, if it is
    pub fn pending_reason(&self, tx: &Transaction) -> Option<PendingReason> {
        let txid = tx.txid();
        if let Some(record) = self.registry.get(&txid) {
            if record.is_confirmed() {
                return None;
            }
            return self.state.pending.get(&txid).copied();
        }
        direct_pending_reason(tx, self.block_height, unix_now()).or_else(|| {
            tx.input
                .iter()
                .any(|input| self.state.pending.contains_key(&input.previous_output.txid))
                .then_some(PendingReason::PendingAncestor)
        })
    }

    pub fn is_pending(&self, tx: &Transaction) -> bool {
        self.pending_reason(tx).is_some()
    }

    /// True if `tx` is confirmed, or is safe to accept with zero confirmations
    pub fn is_verified(&self, tx: &Transaction) -> bool {
        self.state.verified.contains(&tx.txid())
    }

    pub fn transaction_status(&self, tx: &Transaction) -> TxStatus {
        let mut status = TxStatus::empty();
        if !self.is_valid(tx) {
            status |= TxStatus::INVALID;
        }
        if self.is_pending(tx) {
            status |= TxStatus::PENDING;
        }
        if self.is_verified(tx) {
            status |= TxStatus::VERIFIED;
        }
        status
    }

    // Building and signing

    /// Spendable outputs in selection order: confirmed, unconfirmed, pending
    fn candidates(&self) -> Vec<Candidate> {
        let mut utxos: Vec<&Utxo> =
            self.state.utxos.list().iter().filter(|utxo| self.output_spendable(utxo)).collect();
        utxos.sort_by_key(|utxo| utxo.selection_rank());

        utxos
            .into_iter()
            .filter_map(|utxo| {
                let source = self.registry.get(&utxo.outpoint.txid)?;
                let output = source.tx.output.get(utxo.outpoint.vout as usize)?;
                let sponsors_parent = !source.is_confirmed()
                    && source.tx.input.len() <= CPFP_MAX_PARENT_IO
                    && source.tx.output.len() <= CPFP_MAX_PARENT_IO
                    && self.amount_sent_by_tx(&source.tx) == 0;
                Some(Candidate {
                    utxo: utxo.clone(),
                    script_pubkey: output.script_pubkey.clone(),
                    cpfp_size: if sponsors_parent {
                        source.tx.size()
                    } else {
                        0
                    },
                })
            })
            .collect()
    }

    /// Unsigned transaction paying `amount` to `address`
    pub fn create_transaction(&self, amount: u64, address: &Address) -> Result<Transaction> {
        if amount == 0 {
            return Err(WalletError::InvalidAmount("amount must be positive".into()));
        }
        if address.network != self.config.network {
            return Err(WalletError::InvalidAddress(format!(
                "{} is not a {} address",
                address, self.config.network
            )));
        }
        let max = self.max_output_amount();
        if amount > max {
            return Err(WalletError::InsufficientFunds {
                available: max,
                required: amount,
            });
        }
        self.create_transaction_for_outputs(vec![TxOut::new(amount, address.script_pubkey())])
    }

    /// Unsigned transaction creating `outputs`, funded from the wallet with
    /// change to the first unused change address.
    pub fn create_transaction_for_outputs(&self, outputs: Vec<TxOut>) -> Result<Transaction> {
        let amount = outputs
            .iter()
            .try_fold(0u64, |total, output| total.checked_add(output.value))
            .ok_or_else(|| WalletError::InvalidAmount("output amounts overflow".into()))?;
        let max = self.max_output_amount();
        if amount > max {
            return Err(WalletError::InsufficientFunds {
                available: max,
                required: amount,
            });
        }

        let selector = CoinSelector::new(self.fee_rate, self.state.balance);
        let mut builder = TransactionBuilder::new().add_outputs(outputs);
        if let Some(change) = self.change_address() {
            builder = builder.set_change_address(change);
        }
        let (tx, selection) = builder.build(&selector, self.candidates())?;
        debug!(
            selected = selection.selected.len(),
            total = selection.total_value,
            fee = selection.fee,
            "funded transaction"
        );
        Ok(tx)
    }

    /// Sign `tx` with keys derived from `seed` by the default BIP32 signer
    pub fn sign_transaction(&self, tx: &mut Transaction, fork_id: u32, seed: &[u8]) -> Result<()> {
        self.sign_transaction_with(tx, fork_id, seed, &Bip32Signer::new())
    }

    /// Sign every input of `tx`; on failure `tx` is left unchanged
    pub fn sign_transaction_with(
        &self,
        tx: &mut Transaction,
        fork_id: u32,
        seed: &[u8],
        signer: &dyn SigningKeySource,
    ) -> Result<()> {
        let mut prepared = tx.clone();
        for input in &mut prepared.input {
            self.fill_spent_output(input);
        }

        let network = self.config.network;
        sign_logged(&mut prepared, fork_id, seed, signer, |input| {
            let script = input.spent_script.as_ref()?;
            self.address_index(&Address::from_script(script, network)?)
        })?;
        *tx = prepared;
        Ok(())
    }

    fn fill_spent_output(&self, input: &mut TxIn) {
        if input.spent_script.is_some() && input.spent_value.is_some() {
            return;
        }
        let outpoint = input.previous_output;
        if let Some(output) =
            self.registry.get(&outpoint.txid).and_then(|r| r.tx.output.get(outpoint.vout as usize))
        {
            input.spent_script.get_or_insert_with(|| output.script_pubkey.clone());
            input.spent_value.get_or_insert(output.value);
        }
    }
}
