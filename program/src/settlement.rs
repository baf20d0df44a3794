// Timed Raffle - Winner selection and payout
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    event::RaffleEvent,
    ports::Ledger,
    state::{RafflePhase, RoundState},
};

/// Outcome of delivering randomness to the round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fulfillment {
    /// Stale, duplicate or foreign request id; nothing changed
    Ignored,
    /// Pot paid to the winner and the next round opened
    Settled { winner: Pubkey, payout: u64 },
    /// Ledger refused the payout; the round stays closed with its pot
    Frozen { winner: Pubkey, amount: u64 },
}

impl Fulfillment {
    pub fn event(&self) -> Option<RaffleEvent> {
        match *self {
            Fulfillment::Ignored => None,
            Fulfillment::Settled { winner, payout } => {
                Some(RaffleEvent::WinnerPicked { winner, payout })
            }
            Fulfillment::Frozen { winner, amount } => {
                Some(RaffleEvent::SettlementFailed { winner, amount })
            }
        }
    }

    /// Winner of a settled round, `TransferFailed` for a frozen one
    pub fn into_result(self) -> Result<Option<Pubkey>, RaffleError> {
        match self {
            Fulfillment::Ignored => Ok(None),
            Fulfillment::Settled { winner, .. } => Ok(Some(winner)),
            Fulfillment::Frozen { .. } => Err(RaffleError::TransferFailed),
        }
    }
}

impl RoundState {
    /// Maps a random value onto a player: `players[random_value % players.len()]`
    pub fn select_winner(&self, random_value: u64) -> Option<Pubkey> {
        if self.players.is_empty() {
            return None;
        }
        let index = random_value % self.players.len() as u64;
        self.players.get(index as usize).copied()
    }

    /// Pays the whole pot to `winner` and opens the next round at `now`.
    ///
    /// The pending request is consumed either way. When the ledger refuses
    /// the payout the round keeps its players and pot and stays calculating.
    pub(crate) fn settle<L: Ledger + ?Sized>(
        &mut self,
        winner: Pubkey,
        ledger: &mut L,
        now: UnixTimestamp,
    ) -> Fulfillment {
        let payout = self.pot;
        self.pending_request_id = None;

        if let Err(err) = ledger.transfer(&winner, payout) {
            msg!("Prize transfer of {} lamports to {} failed: {}", payout, winner, err);
            return Fulfillment::Frozen {
                winner,
                amount: payout,
            };
        }

        self.recent_winner = Some(winner);
        self.players.clear();
        self.pot = 0;
        self.last_round_timestamp = now;
        self.phase = RafflePhase::Open;

        Fulfillment::Settled { winner, payout }
    }
}
