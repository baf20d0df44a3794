// Timed Raffle - Errors
use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError,
    program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the raffle core and program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Supplied amount is below the entry fee
    #[error("Supplied amount is below the entry fee")]
    InsufficientFee,

    /// Round is not accepting entries or close requests
    #[error("Round is not open")]
    RoundNotOpen,

    /// Trigger predicate does not hold
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Ledger refused to pay out the pot
    #[error("Prize transfer failed")]
    TransferFailed,

    /// Oracle refused the randomness request
    #[error("Randomness request failed")]
    RandomnessRequestFailed,

    /// No players in the round
    #[error("No players in the round")]
    NoPlayers,

    /// Pot arithmetic overflowed
    #[error("Amount overflow")]
    AmountOverflow,

    /// Raffle configuration is out of range
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Round has reached the account capacity
    #[error("Round is full")]
    RoundFull,

    /// Fulfillment was not signed by the oracle authority
    #[error("Only the oracle authority can fulfill randomness")]
    UnauthorizedFulfiller,

    /// Winner account does not match the selected winner
    #[error("Winner account does not match the selected winner")]
    WinnerAccountMismatch,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

/// Failures reported by a `Ledger` port
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("vault balance too low for transfer")]
    InsufficientFunds,

    #[error("recipient account was not supplied")]
    UnknownRecipient,

    #[error("recipient account is not writable")]
    RecipientNotWritable,

    #[error("balance overflow")]
    Overflow,

    #[error("transfer rejected by ledger")]
    Rejected,
}

/// Failures reported by a `RandomnessOracle` port
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("invalid subscription")]
    InvalidSubscription,

    #[error("consumer not registered on subscription")]
    InvalidConsumer,

    #[error("insufficient subscription balance")]
    InsufficientBalance,

    #[error("nonexistent request")]
    NonexistentRequest,

    #[error("request id space exhausted")]
    RequestIdOverflow,
}
