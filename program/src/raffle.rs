// Timed Raffle - Off-chain host
use solana_program::pubkey::Pubkey;

use crate::{
    config::RaffleConfig,
    error::RaffleError,
    event::RaffleEvent,
    ports::{Clock, Ledger, RandomnessOracle, RandomnessRequest},
    state::RoundState,
    trigger::TriggerCheck,
};

/// Owns a raffle's round state together with the capabilities it runs on.
///
/// Every mutating call takes `&mut self`, so entries, close requests and
/// fulfillments are serialized by ownership. Share it across threads by
/// putting it behind a lock.
pub struct Raffle<C, L, O> {
    address: Pubkey,
    round: RoundState,
    randomness: RandomnessRequest,
    clock: C,
    ledger: L,
    oracle: O,
    events: Vec<RaffleEvent>,
}

impl<C: Clock, L: Ledger, O: RandomnessOracle> Raffle<C, L, O> {
    /// Opens the first round at the clock's current time.
    ///
    /// `address` is the identity the raffle presents to the oracle.
    pub fn new(
        address: Pubkey,
        config: RaffleConfig,
        clock: C,
        ledger: L,
        oracle: O,
    ) -> Result<Self, RaffleError> {
        config.validate()?;
        let round = RoundState::new(config.entry_fee, config.interval, clock.now());
        Ok(Self {
            address,
            round,
            randomness: config.randomness,
            clock,
            ledger,
            oracle,
            events: Vec::new(),
        })
    }

    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<(), RaffleError> {
        let event = self.round.enter(player, amount)?;
        self.record(event);
        Ok(())
    }

    pub fn check_trigger(&self) -> TriggerCheck {
        self.round.check_trigger(self.clock.now())
    }

    /// Closes the round; returns the id of the randomness request
    pub fn close_and_request_randomness(&mut self) -> Result<u64, RaffleError> {
        let now = self.clock.now();
        let event = self
            .round
            .close_and_request_randomness(now, &self.address, &self.randomness, &mut self.oracle)?;
        self.record(event);
        self.round.pending_request_id().ok_or(RaffleError::RoundNotOpen)
    }

    /// Delivers the oracle's answer.
    ///
    /// Returns the winner when the round settled, `None` when the answer
    /// was stale, and `TransferFailed` when the payout was refused.
    pub fn on_randomness_fulfilled(
        &mut self,
        request_id: u64,
        random_value: u64,
    ) -> Result<Option<Pubkey>, RaffleError> {
        let now = self.clock.now();
        let fulfillment =
            self.round
                .on_randomness_fulfilled(request_id, random_value, &mut self.ledger, now)?;
        if let Some(event) = fulfillment.event() {
            self.record(event);
        }
        fulfillment.into_result()
    }

    fn record(&mut self, event: RaffleEvent) {
        event.emit();
        self.events.push(event);
    }
}

impl<C, L, O> Raffle<C, L, O> {
    pub fn address(&self) -> &Pubkey {
        &self.address
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn randomness(&self) -> &RandomnessRequest {
        &self.randomness
    }

    /// Notifications emitted so far, oldest first
    pub fn events(&self) -> &[RaffleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<RaffleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }
}
