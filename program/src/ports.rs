//! Capabilities the raffle core consumes from its environment.
//!
//! The core never reads a wall clock, moves value, or talks to a randomness
//! source directly. Each of those goes through one of the traits below so a
//! host can plug in sysvar/lamport adapters on-chain or the doubles in
//! [`crate::mock`] off-chain.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, pubkey::Pubkey};

use crate::error::{LedgerError, OracleError};

/// Confirmations the oracle waits for before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words asked for per request
pub const NUM_WORDS: u32 = 1;

/// Source of the current unix time
pub trait Clock {
    fn now(&self) -> UnixTimestamp;
}

/// Holder of the deposited value
pub trait Ledger {
    /// Move `amount` out of the raffle vault to `to`.
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), LedgerError>;
}

/// First half of the two-phase randomness handshake.
///
/// `consumer` is the raffle asking; oracles may refuse consumers that are
/// not registered on the request's subscription. The second half is
/// delivered back into the core through `on_randomness_fulfilled` with the
/// id returned here.
pub trait RandomnessOracle {
    fn request_random_words(
        &mut self,
        consumer: &Pubkey,
        request: &RandomnessRequest,
    ) -> Result<u64, OracleError>;
}

/// Parameters sent along with every randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// Oracle key / gas lane the request is priced against
    pub key_hash: [u8; 32],
    /// Subscription paying for the request
    pub subscription_id: u64,
    /// Confirmations to wait before fulfilling
    pub request_confirmations: u16,
    /// Budget for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Number of random words to deliver; only the first is consumed
    pub num_words: u32,
}

impl RandomnessRequest {
    pub const LEN: usize = 32 + 8 + 2 + 4 + 4;

    pub fn new(key_hash: [u8; 32], subscription_id: u64, callback_gas_limit: u32) -> Self {
        Self {
            key_hash,
            subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }
}
