// Timed Raffle - Utility Functions
use solana_program::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};

use crate::state::RAFFLE_SEED;

/// Find the program derived address holding the raffle
pub fn find_raffle_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED], program_id)
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}
