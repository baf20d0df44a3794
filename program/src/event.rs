// Timed Raffle - Notifications
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

use crate::utils::lamports_to_sol;

/// Observable notifications of the round lifecycle
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// An entry was accepted
    Entered { player: Pubkey, pot: u64 },
    /// The round closed and randomness was requested
    RoundClosed { request_id: u64 },
    /// A winner was paid and the next round opened
    WinnerPicked { winner: Pubkey, payout: u64 },
    /// The payout was refused; the round is frozen until an operator steps in
    SettlementFailed { winner: Pubkey, amount: u64 },
}

impl RaffleEvent {
    /// Writes the event to the program log, readable and as borsh program data
    pub fn emit(&self) {
        match self {
            RaffleEvent::Entered { player, pot } => {
                msg!("RaffleEnter: player={} pot={} SOL", player, lamports_to_sol(*pot));
            }
            RaffleEvent::RoundClosed { request_id } => {
                msg!("RequestedRaffleWinner: request_id={}", request_id);
            }
            RaffleEvent::WinnerPicked { winner, payout } => {
                msg!("WinnerPicked: winner={} payout={} lamports", winner, payout);
            }
            RaffleEvent::SettlementFailed { winner, amount } => {
                msg!("SettlementFailed: winner={} amount={} lamports", winner, amount);
            }
        }

        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
