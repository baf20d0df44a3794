//! Development doubles for the raffle ports.
//!
//! Local clusters have no oracle or ledger to talk to, so the host wires
//! the raffle to these instead. The tests use them the same way.

use solana_program::{clock::UnixTimestamp, keccak, msg, pubkey::Pubkey};
use std::collections::{HashMap, HashSet};

use crate::{
    error::{LedgerError, OracleError},
    ports::{Clock, Ledger, RandomnessOracle, RandomnessRequest},
};

/// Flat fee charged per fulfilled request
pub const BASE_FEE: u64 = 250_000_000;
/// Price per unit of callback gas
pub const GAS_PRICE: u64 = 1_000_000_000;

/// Clock that only moves when told to
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualClock {
    now: UnixTimestamp,
}

impl ManualClock {
    pub fn new(now: UnixTimestamp) -> Self {
        Self { now }
    }

    pub fn set(&mut self, now: UnixTimestamp) {
        self.now = now;
    }

    pub fn advance(&mut self, seconds: i64) {
        self.now = self.now.saturating_add(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixTimestamp {
        self.now
    }
}

/// Ledger keeping the raffle vault and payouts in memory
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    vault: u64,
    balances: HashMap<Pubkey, u64>,
    transfers: Vec<(Pubkey, u64)>,
    reject_transfers: bool,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits the vault, as an entry's deposit would
    pub fn deposit(&mut self, amount: u64) {
        self.vault = self.vault.saturating_add(amount);
    }

    pub fn vault_balance(&self) -> u64 {
        self.vault
    }

    pub fn balance_of(&self, account: &Pubkey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Successful transfers, oldest first
    pub fn transfers(&self) -> &[(Pubkey, u64)] {
        &self.transfers
    }

    /// Makes every following transfer fail until switched back
    pub fn set_reject_transfers(&mut self, reject: bool) {
        self.reject_transfers = reject;
    }
}

impl Ledger for InMemoryLedger {
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        if self.reject_transfers {
            return Err(LedgerError::Rejected);
        }

        let vault = self
            .vault
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.vault = vault;
        self.balances.insert(*to, balance);
        self.transfers.push((*to, amount));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Subscription {
    balance: u64,
    consumers: HashSet<Pubkey>,
}

#[derive(Debug)]
struct PendingRequest {
    subscription_id: u64,
    num_words: u32,
    callback_gas_limit: u32,
}

/// Stand-in for a VRF coordinator on development clusters
#[derive(Debug)]
pub struct MockVrfCoordinator {
    base_fee: u64,
    gas_price: u64,
    subscriptions: HashMap<u64, Subscription>,
    next_subscription_id: u64,
    next_request_id: u64,
    pending: HashMap<u64, PendingRequest>,
}

impl Default for MockVrfCoordinator {
    fn default() -> Self {
        Self::new(BASE_FEE, GAS_PRICE)
    }
}

impl MockVrfCoordinator {
    pub fn new(base_fee: u64, gas_price: u64) -> Self {
        Self {
            base_fee,
            gas_price,
            subscriptions: HashMap::new(),
            next_subscription_id: 1,
            next_request_id: 1,
            pending: HashMap::new(),
        }
    }

    pub fn create_subscription(&mut self) -> u64 {
        let id = self.next_subscription_id;
        self.next_subscription_id += 1;
        self.subscriptions.insert(id, Subscription::default());
        msg!("Mock coordinator: created subscription {}", id);
        id
    }

    pub fn fund_subscription(&mut self, subscription_id: u64, amount: u64) -> Result<(), OracleError> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(OracleError::InvalidSubscription)?;
        subscription.balance = subscription.balance.saturating_add(amount);
        Ok(())
    }

    /// Allows `consumer` to request randomness billed to `subscription_id`
    pub fn add_consumer(&mut self, subscription_id: u64, consumer: Pubkey) -> Result<(), OracleError> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(OracleError::InvalidSubscription)?;
        subscription.consumers.insert(consumer);
        msg!("Mock coordinator: added consumer {} to subscription {}", consumer, subscription_id);
        Ok(())
    }

    pub fn subscription_balance(&self, subscription_id: u64) -> Option<u64> {
        self.subscriptions
            .get(&subscription_id)
            .map(|subscription| subscription.balance)
    }

    pub fn is_pending(&self, request_id: u64) -> bool {
        self.pending.contains_key(&request_id)
    }

    /// Answers `request_id` with words derived from the request id
    pub fn fulfill_random_words(&mut self, request_id: u64) -> Result<Vec<u64>, OracleError> {
        let num_words = self
            .pending
            .get(&request_id)
            .ok_or(OracleError::NonexistentRequest)?
            .num_words;
        let words = (0..num_words)
            .map(|index| derive_word(request_id, index))
            .collect();
        self.fulfill_random_words_with_override(request_id, words)
    }

    /// Answers `request_id` with caller-chosen words
    pub fn fulfill_random_words_with_override(
        &mut self,
        request_id: u64,
        words: Vec<u64>,
    ) -> Result<Vec<u64>, OracleError> {
        let request = self
            .pending
            .get(&request_id)
            .ok_or(OracleError::NonexistentRequest)?;

        let payment = self
            .gas_price
            .saturating_mul(request.callback_gas_limit as u64)
            .saturating_add(self.base_fee);
        let subscription = self
            .subscriptions
            .get_mut(&request.subscription_id)
            .ok_or(OracleError::InvalidSubscription)?;
        subscription.balance = subscription
            .balance
            .checked_sub(payment)
            .ok_or(OracleError::InsufficientBalance)?;

        self.pending.remove(&request_id);
        msg!("Mock coordinator: fulfilled request {} for {} lamports", request_id, payment);
        Ok(words)
    }
}

impl RandomnessOracle for MockVrfCoordinator {
    fn request_random_words(
        &mut self,
        consumer: &Pubkey,
        request: &RandomnessRequest,
    ) -> Result<u64, OracleError> {
        let subscription = self
            .subscriptions
            .get(&request.subscription_id)
            .ok_or(OracleError::InvalidSubscription)?;
        if !subscription.consumers.contains(consumer) {
            return Err(OracleError::InvalidConsumer);
        }

        let request_id = self.next_request_id;
        self.next_request_id = request_id
            .checked_add(1)
            .ok_or(OracleError::RequestIdOverflow)?;
        self.pending.insert(
            request_id,
            PendingRequest {
                subscription_id: request.subscription_id,
                num_words: request.num_words,
                callback_gas_limit: request.callback_gas_limit,
            },
        );
        msg!(
            "Mock coordinator: request {} on subscription {}",
            request_id,
            request.subscription_id
        );
        Ok(request_id)
    }
}

fn derive_word(request_id: u64, index: u32) -> u64 {
    let hash = keccak::hashv(&[&request_id.to_le_bytes()[..], &index.to_le_bytes()[..]]);
    crate::vrf::random_value_from_result(&hash.to_bytes())
}
