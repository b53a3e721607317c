use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};
use vrf_coordinator::find_callback_authority_address;

use crate::{
    config::RaffleParams,
    error::RaffleError,
    find_raffle_address,
    instruction::RaffleInstruction,
    oracle::CoordinatorOracle,
    payout::{pool_balance, LamportVault},
    state::Raffle,
    RAFFLE_SEED,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle { params } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(accounts, params, program_id)
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(accounts, amount, program_id)
            }
            RaffleInstruction::CheckUpkeep { check_data } => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, check_data, program_id)
            }
            RaffleInstruction::PerformUpkeep { perform_data } => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, perform_data, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, random_words, program_id)
            }
        }
    }

    /// Process the InitializeRaffle instruction
    ///
    /// Creates the raffle PDA sized for `params.max_players` and opens the first round
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        params: RaffleParams,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        params.validate()?;

        if !coordinator_info.executable {
            msg!("Coordinator {} is not a program", coordinator_info.key);
            return Err(ProgramError::IncorrectProgramId);
        }

        let (expected_raffle_pubkey, bump_seed) = find_raffle_address(program_id, creator_info.key);
        if *raffle_info.key != expected_raffle_pubkey {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidSeeds);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let space = Raffle::space(params.max_players);
        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                creator_info.key,
                raffle_info.key,
                rent.minimum_balance(space),
                space as u64,
                program_id,
            ),
            &[
                creator_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
            &[&[RAFFLE_SEED, creator_info.key.as_ref(), &[bump_seed]]],
        )?;

        let clock = Clock::get()?;
        let raffle = Raffle::new(
            *creator_info.key,
            bump_seed,
            *coordinator_info.key,
            params,
            clock.unix_timestamp,
        );
        raffle.save(&mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: Raffle={}, Coordinator={}, EntranceFee={}, Interval={}s",
            raffle_info.key,
            coordinator_info.key,
            raffle.entrance_fee(),
            raffle.interval()
        );
        Ok(())
    }

    /// Process the Enter instruction
    fn process_enter(accounts: &[AccountInfo], amount: u64, program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let event = raffle.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit()
    }

    /// Process the CheckUpkeep instruction
    ///
    /// Read-only; the result goes out as return data for schedulers that simulate it
    fn process_check_upkeep(
        accounts: &[AccountInfo],
        _check_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;
        let status = raffle.check_upkeep(clock.unix_timestamp, Self::pool(raffle_info)?);
        let upkeep_needed = status.upkeep_needed();
        msg!("Upkeep needed: {} ({})", upkeep_needed, status);

        let perform_data: Vec<u8> = Vec::new();
        let return_data = (upkeep_needed, perform_data)
            .try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        set_return_data(&return_data);
        Ok(())
    }

    /// Process the PerformUpkeep instruction
    ///
    /// Locks the round and requests randomness from the raffle's coordinator by CPI
    fn process_perform_upkeep(
        accounts: &[AccountInfo],
        _perform_data: Vec<u8>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        if *coordinator_info.key != raffle.coordinator {
            msg!("Raffle is served by coordinator {}", raffle.coordinator);
            return Err(ProgramError::IncorrectProgramId);
        }

        let clock = Clock::get()?;
        let balance = Self::pool(raffle_info)?;
        let creator = raffle.creator;
        let bump = [raffle.bump];
        let seeds: &[&[u8]] = &[RAFFLE_SEED, creator.as_ref(), &bump];
        let mut oracle = CoordinatorOracle {
            coordinator_program: coordinator_info,
            coordinator_state: coordinator_state_info,
            request_record: request_info,
            consumer: raffle_info,
            payer: caller_info,
            system_program: system_program_info,
            consumer_program_id: program_id,
            consumer_seeds: seeds,
        };

        let event = raffle.perform_upkeep(clock.unix_timestamp, balance, &mut oracle)?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit()
    }

    /// Process the FulfillRandomWords instruction
    ///
    /// Only reachable through the coordinator's callback authority
    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: Vec<u64>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let callback_authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let (callback_authority, _) = find_callback_authority_address(&raffle.coordinator);
        if !callback_authority_info.is_signer || *callback_authority_info.key != callback_authority
        {
            return Err(RaffleError::InvalidOracleCaller.into());
        }

        let clock = Clock::get()?;
        let rent = Rent::get()?;
        let mut vault = LamportVault::new(raffle_info, winner_info, &rent);
        let event = raffle.fulfill_random_words(
            request_id,
            &random_words,
            clock.unix_timestamp,
            &mut vault,
        )?;

        raffle.save(&mut raffle_info.data.borrow_mut())?;
        event.emit()
    }

    /// Raffle state from an account owned by this program
    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let raffle = Raffle::load(&raffle_info.data.borrow())?;
        Ok(raffle)
    }

    /// Lamports held for the prize
    fn pool(raffle_info: &AccountInfo) -> Result<u64, ProgramError> {
        let rent = Rent::get()?;
        Ok(pool_balance(
            raffle_info.lamports(),
            rent.minimum_balance(raffle_info.data_len()),
        ))
    }
}
