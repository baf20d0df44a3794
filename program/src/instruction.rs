use arrayref::array_ref;
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::mem::size_of;

use crate::error::RaffleError;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create the raffle account and open the first round
    ///
    /// The raffle PDA is unique per program and can only be initialized
    /// once, by whoever gets there first, and that caller picks the oracle
    /// authority for good. Send this in the deploying transaction (or
    /// immediately after deployment, from the upgrade authority) so no
    /// third party can claim the raffle.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The admin account paying for the raffle account
    /// 1. `[writable]` The raffle account (PDA)
    /// 2. `[]` The oracle authority allowed to deliver randomness
    /// 3. `[]` The system program
    InitializeRaffle {
        /// Minimum lamports per entry
        entry_fee: u64,
        /// Minimum seconds a round stays open
        interval: i64,
        /// Oracle key the raffle requests randomness against
        key_hash: [u8; 32],
        /// Subscription paying for randomness
        subscription_id: u64,
        /// Budget for the fulfillment callback
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports to deposit, at least the entry fee
        amount: u64,
    },

    /// Evaluate the trigger predicate; result in return data as `[ready, reason]`
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep {},

    /// Close the round and request randomness (anyone can call this)
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any user
    /// 1. `[writable]` The raffle account
    PerformUpkeep {},

    /// Deliver randomness for a pending request
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The prize recipient (winner)
    FulfillRandomWords {
        /// Id of the request being answered
        request_id: u64,
        /// VRF output
        randomness: [u8; 32],
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entry_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_bytes32(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entry_fee,
                    interval: interval as i64,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { amount }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (randomness, _) = Self::unpack_bytes32(rest)?;
                Self::FulfillRandomWords {
                    request_id,
                    randomness,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(size_of::<Self>());
        match *self {
            Self::InitializeRaffle {
                entry_fee,
                interval,
                ref key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entry_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                ref randomness,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(randomness);
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        if input.len() < 8 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(8);
        Ok((u64::from_le_bytes(*array_ref![bytes, 0, 8]), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        if input.len() < 4 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(4);
        Ok((u32::from_le_bytes(*array_ref![bytes, 0, 4]), rest))
    }

    fn unpack_bytes32(input: &[u8]) -> Result<([u8; 32], &[u8]), ProgramError> {
        if input.len() < 32 {
            return Err(RaffleError::InvalidInstructionData.into());
        }
        let (bytes, rest) = input.split_at(32);
        Ok((*array_ref![bytes, 0, 32], rest))
    }
}

/// Create initialize_raffle instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize_raffle(
    program_id: &Pubkey,
    admin: &Pubkey,
    raffle_account: &Pubkey,
    oracle_authority: &Pubkey,
    entry_fee: u64,
    interval: i64,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
) -> Instruction {
    let data = RaffleInstruction::InitializeRaffle {
        entry_fee,
        interval,
        key_hash,
        subscription_id,
        callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new(*admin, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(*oracle_authority, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Instruction {
    let data = RaffleInstruction::EnterRaffle { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::CheckUpkeep {}.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(program_id: &Pubkey, caller: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep {}.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    randomness: [u8; 32],
) -> Instruction {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        randomness,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_initialize_raffle() {
        let instruction = RaffleInstruction::InitializeRaffle {
            entry_fee: 10_000_000,
            interval: 30,
            key_hash: [7u8; 32],
            subscription_id: 588,
            callback_gas_limit: 500_000,
        };
        let packed = instruction.pack();
        assert_eq!(packed.len(), 1 + 8 + 8 + 32 + 8 + 4);
        assert_eq!(RaffleInstruction::unpack(&packed).unwrap(), instruction);
    }

    #[test]
    fn test_unpack_fulfill_layout() {
        let mut data = vec![4u8];
        data.extend_from_slice(&9u64.to_le_bytes());
        data.extend_from_slice(&[3u8; 32]);

        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords {
                request_id: 9,
                randomness: [3u8; 32],
            }
        );
    }

    #[test]
    fn test_unpack_rejects_truncated_and_unknown() {
        let expected: ProgramError = RaffleError::InvalidInstructionData.into();
        assert_eq!(RaffleInstruction::unpack(&[]).unwrap_err(), expected);
        assert_eq!(RaffleInstruction::unpack(&[1, 0, 0]).unwrap_err(), expected);
        assert_eq!(RaffleInstruction::unpack(&[4, 1]).unwrap_err(), expected);
        assert_eq!(RaffleInstruction::unpack(&[9]).unwrap_err(), expected);
    }
}
