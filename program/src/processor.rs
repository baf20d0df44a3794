// Timed Raffle - Instruction Processor
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::IsInitialized,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    config::RaffleConfig,
    error::RaffleError,
    instruction::RaffleInstruction,
    ports::{Clock, RandomnessRequest},
    settlement::Fulfillment,
    state::{RaffleAccount, RoundState, MAX_PLAYERS, RAFFLE_SEED},
    utils::find_raffle_address,
    vault::{LamportVault, SysvarClock},
    vrf::{self, ProgramOracle},
};

/// Program state handler.
pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entry_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                let config = RaffleConfig {
                    entry_fee,
                    interval,
                    randomness: RandomnessRequest::new(key_hash, subscription_id, callback_gas_limit),
                };
                Self::process_initialize_raffle(accounts, config, program_id)
            }
            RaffleInstruction::EnterRaffle { amount } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                randomness,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, randomness, program_id)
            }
        }
    }

    /// Process InitializeRaffle instruction
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        config: RaffleConfig,
        program_id: &Pubkey,
    ) -> ProgramResult {
        // Get accounts
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Verify admin is signer
        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        config.validate()?;

        // The raffle lives at the single program PDA; the first initialize wins
        let (expected_raffle_pubkey, bump_seed) = find_raffle_address(program_id);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidArgument);
        }

        if raffle_info.owner == program_id {
            let existing = RaffleAccount::load(&raffle_info.try_borrow_data()?)?;
            if existing.is_initialized() {
                msg!("Raffle account is already initialized");
                return Err(ProgramError::AccountAlreadyInitialized);
            }
        } else {
            msg!("Creating raffle account");
            let rent = Rent::get()?;
            invoke_signed(
                &system_instruction::create_account(
                    admin_info.key,
                    raffle_info.key,
                    rent.minimum_balance(RaffleAccount::LEN),
                    RaffleAccount::LEN as u64,
                    program_id,
                ),
                &[
                    admin_info.clone(),
                    raffle_info.clone(),
                    system_program_info.clone(),
                ],
                &[&[RAFFLE_SEED, &[bump_seed]]],
            )?;
        }

        // Open the first round at the current time
        let clock = SysvarClock::get()?;
        let raffle = RaffleAccount {
            is_initialized: true,
            bump: bump_seed,
            oracle_authority: *oracle_authority_info.key,
            request_nonce: 0,
            randomness: config.randomness,
            round: RoundState::new(config.entry_fee, config.interval, clock.now()),
        };
        raffle.store(&mut raffle_info.try_borrow_mut_data()?)?;

        msg!(
            "Raffle initialized: EntryFee={}, Interval={}s, Oracle={}",
            config.entry_fee,
            config.interval,
            oracle_authority_info.key
        );
        Ok(())
    }

    /// Process EnterRaffle instruction
    fn process_enter_raffle(
        accounts: &[AccountInfo],
        amount: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        // Get accounts
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        // Verify player is signer
        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Load raffle data and record the entry
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let event = raffle.round.enter(*player_info.key, amount)?;

        if raffle.round.number_of_players() > MAX_PLAYERS {
            msg!("Round already holds {} entries", MAX_PLAYERS);
            return Err(RaffleError::RoundFull.into());
        }

        // Transfer SOL from player to the raffle pot
        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        // Save updated raffle data
        raffle.store(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    /// Process CheckUpkeep instruction
    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        // Evaluate against the current time, without writing anything
        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = SysvarClock::get()?;
        let check = raffle.round.check_trigger(clock.now());

        msg!("Upkeep needed: {} ({:?})", check.ready, check.reason);
        set_return_data(&[check.ready as u8, check.reason.code()]);
        Ok(())
    }

    /// Process PerformUpkeep instruction
    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Anyone can close a due round; the predicate is checked again below
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Load raffle data
        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = SysvarClock::get()?;
        let mut oracle = ProgramOracle::new(raffle.request_nonce);

        // Close the round and log the randomness request
        let event = raffle.round.close_and_request_randomness(
            clock.now(),
            raffle_info.key,
            &raffle.randomness,
            &mut oracle,
        )?;
        raffle.request_nonce = oracle.request_nonce();

        // Save updated raffle data
        raffle.store(&mut raffle_info.try_borrow_mut_data()?)?;
        event.emit();
        Ok(())
    }

    /// Process FulfillRandomWords instruction
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        randomness: [u8; 32],
        program_id: &Pubkey,
    ) -> ProgramResult {
        // Get accounts
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        // Verify oracle authority is signer
        if !oracle_info.is_signer || *oracle_info.key != raffle.oracle_authority {
            msg!("Only the oracle authority {} can fulfill", raffle.oracle_authority);
            return Err(RaffleError::UnauthorizedFulfiller.into());
        }

        let random_value = vrf::random_value_from_result(&randomness);

        // The payout target must be the writable account the randomness selects
        if raffle.round.accepts_fulfillment(request_id) {
            let expected_winner = raffle
                .round
                .select_winner(random_value)
                .ok_or(RaffleError::NoPlayers)?;
            if expected_winner != *winner_info.key {
                msg!("Winner account must be {}", expected_winner);
                return Err(RaffleError::WinnerAccountMismatch.into());
            }
            if !winner_info.is_writable {
                msg!("Winner account {} must be writable", expected_winner);
                return Err(RaffleError::WinnerAccountMismatch.into());
            }
        }

        // Pay out of the raffle account, keeping its rent reserve
        let clock = SysvarClock::get()?;
        let reserve = Rent::get()?.minimum_balance(raffle_info.data_len());
        let mut vault = LamportVault::new(raffle_info, winner_info, reserve);
        let fulfillment =
            raffle
                .round
                .on_randomness_fulfilled(request_id, random_value, &mut vault, clock.now())?;

        // Stale or duplicate answers leave the account untouched
        if fulfillment == Fulfillment::Ignored {
            return Ok(());
        }

        // A refused payout is recorded rather than reverted so the round stays frozen
        raffle.store(&mut raffle_info.try_borrow_mut_data()?)?;
        if let Some(event) = fulfillment.event() {
            event.emit();
        }
        if let Fulfillment::Frozen { .. } = fulfillment {
            msg!("{}", RaffleError::TransferFailed);
        }
        Ok(())
    }

    fn load_raffle(
        raffle_info: &AccountInfo,
        program_id: &Pubkey,
    ) -> Result<RaffleAccount, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by the program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let raffle = RaffleAccount::load(&raffle_info.try_borrow_data()?)?;
        if !raffle.is_initialized() {
            msg!("Raffle account is not initialized");
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(raffle)
    }
}
