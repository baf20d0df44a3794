// Timed Raffle - On-chain adapters for the clock and ledger ports
use solana_program::{
    account_info::AccountInfo,
    clock::{Clock as ClockSysvar, UnixTimestamp},
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvar::Sysvar,
};

use crate::{
    error::LedgerError,
    ports::{Clock, Ledger},
};

/// Clock sysvar reading taken at the start of an instruction
pub struct SysvarClock {
    unix_timestamp: UnixTimestamp,
}

impl SysvarClock {
    pub fn get() -> Result<Self, ProgramError> {
        let clock = ClockSysvar::get()?;
        Ok(Self {
            unix_timestamp: clock.unix_timestamp,
        })
    }
}

impl Clock for SysvarClock {
    fn now(&self) -> UnixTimestamp {
        self.unix_timestamp
    }
}

/// Pays out of the program-owned raffle account.
///
/// The raffle account holds its rent reserve plus the pot; only lamports
/// above `reserve` can leave, and only towards the recipient account that
/// came with the instruction.
pub struct LamportVault<'a, 'b> {
    vault: &'b AccountInfo<'a>,
    recipient: &'b AccountInfo<'a>,
    reserve: u64,
}

impl<'a, 'b> LamportVault<'a, 'b> {
    pub fn new(vault: &'b AccountInfo<'a>, recipient: &'b AccountInfo<'a>, reserve: u64) -> Self {
        Self {
            vault,
            recipient,
            reserve,
        }
    }
}

impl<'a, 'b> Ledger for LamportVault<'a, 'b> {
    fn transfer(&mut self, to: &Pubkey, amount: u64) -> Result<(), LedgerError> {
        if self.recipient.key != to {
            return Err(LedgerError::UnknownRecipient);
        }
        if !self.recipient.is_writable {
            return Err(LedgerError::RecipientNotWritable);
        }

        let vault_balance = self
            .vault
            .lamports()
            .checked_sub(amount)
            .filter(|remaining| *remaining >= self.reserve)
            .ok_or(LedgerError::InsufficientFunds)?;
        let recipient_balance = self
            .recipient
            .lamports()
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        let mut vault_lamports = self
            .vault
            .try_borrow_mut_lamports()
            .map_err(|_| LedgerError::Rejected)?;
        let mut recipient_lamports = self
            .recipient
            .try_borrow_mut_lamports()
            .map_err(|_| LedgerError::Rejected)?;
        **vault_lamports = vault_balance;
        **recipient_lamports = recipient_balance;

        Ok(())
    }
}
