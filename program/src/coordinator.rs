// Timed Raffle - Randomness handshake
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    event::RaffleEvent,
    ports::{Ledger, RandomnessOracle, RandomnessRequest},
    settlement::Fulfillment,
    state::{RafflePhase, RoundState},
};

impl RoundState {
    /// Closes the round and asks the oracle for randomness.
    ///
    /// The trigger predicate is evaluated again here; a caller's earlier
    /// `check_trigger` result is never trusted. The round only moves to
    /// `Calculating` once the oracle has handed back a request id.
    /// `consumer` identifies this raffle to the oracle.
    pub fn close_and_request_randomness<O: RandomnessOracle + ?Sized>(
        &mut self,
        now: UnixTimestamp,
        consumer: &Pubkey,
        request: &RandomnessRequest,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        if self.phase != RafflePhase::Open {
            msg!("Round already calculating, request {:?} in flight", self.pending_request_id);
            return Err(RaffleError::RoundNotOpen);
        }

        let check = self.check_trigger(now);
        if !check.ready {
            msg!(
                "Upkeep not needed: {:?} (pot={}, players={})",
                check.reason,
                self.pot,
                self.players.len()
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request_id = oracle.request_random_words(consumer, request).map_err(|err| {
            msg!("Randomness request refused: {}", err);
            RaffleError::RandomnessRequestFailed
        })?;

        self.phase = RafflePhase::Calculating;
        self.pending_request_id = Some(request_id);

        Ok(RaffleEvent::RoundClosed { request_id })
    }

    /// Whether a fulfillment carrying `request_id` would be consumed
    pub fn accepts_fulfillment(&self, request_id: u64) -> bool {
        self.phase == RafflePhase::Calculating && self.pending_request_id == Some(request_id)
    }

    /// Consumes the oracle's answer to the pending request.
    ///
    /// Answers for any other id, or arriving while the round is open, are
    /// dropped without touching the round.
    pub fn on_randomness_fulfilled<L: Ledger + ?Sized>(
        &mut self,
        request_id: u64,
        random_value: u64,
        ledger: &mut L,
        now: UnixTimestamp,
    ) -> Result<Fulfillment, RaffleError> {
        if !self.accepts_fulfillment(request_id) {
            msg!(
                "Ignoring fulfillment for request {} (pending={:?}, phase={:?})",
                request_id,
                self.pending_request_id,
                self.phase
            );
            return Ok(Fulfillment::Ignored);
        }

        let winner = self.select_winner(random_value).ok_or(RaffleError::NoPlayers)?;
        msg!("Request {} selected winner {}", request_id, winner);

        Ok(self.settle(winner, ledger, now))
    }
}
