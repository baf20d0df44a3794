// Timed Raffle
// A fair, time-gated raffle: fixed-fee entries, a periodic close trigger,
// two-phase oracle randomness and an atomic payout that reopens the round.

// Round core
pub mod coordinator;
pub mod entry;
pub mod settlement;
pub mod state;
pub mod trigger;

// Ports and hosts
pub mod config;
pub mod error;
pub mod event;
pub mod mock;
pub mod ports;
pub mod raffle;

// Program
pub mod instruction;
pub mod processor;
pub mod utils;
pub mod vault;
pub mod vrf;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

#[cfg(not(feature = "no-entrypoint"))]
solana_program::entrypoint!(process_instruction);

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process(program_id, accounts, instruction_data)
}
