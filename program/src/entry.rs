// Timed Raffle - Entries
use solana_program::{msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    event::RaffleEvent,
    state::{RafflePhase, RoundState},
};

impl RoundState {
    /// Records `player` in the current round and adds `amount` to the pot.
    ///
    /// Any amount at or above the entry fee is accepted in full; no change is
    /// given back. Fails without touching the round when the fee is not met
    /// or the round is not open.
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<RaffleEvent, RaffleError> {
        if amount < self.entry_fee {
            msg!("Entry of {} lamports is below the {} lamport fee", amount, self.entry_fee);
            return Err(RaffleError::InsufficientFee);
        }

        if self.phase != RafflePhase::Open {
            msg!("Round is calculating, entries are closed");
            return Err(RaffleError::RoundNotOpen);
        }

        let pot = self
            .pot
            .checked_add(amount)
            .ok_or(RaffleError::AmountOverflow)?;

        self.players.push(player);
        self.pot = pot;

        Ok(RaffleEvent::Entered { player, pot })
    }
}
