use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

use crate::{
    error::CoordinatorError,
    find_callback_authority_address, find_coordinator_address, find_request_address,
    instruction::CoordinatorInstruction,
    interface::{derive_random_words, RandomWords, RandomnessRequest},
    state::{CoordinatorState, RequestRecord},
    CALLBACK_AUTHORITY_SEED, COORDINATOR_SEED, REQUEST_SEED,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = CoordinatorInstruction::unpack(instruction_data)?;

        match instruction {
            CoordinatorInstruction::Initialize => {
                msg!("Instruction: Initialize");
                Self::process_initialize(accounts, program_id)
            }
            CoordinatorInstruction::RequestRandomWords {
                consumer_program,
                request,
            } => {
                msg!("Instruction: Request Random Words");
                Self::process_request_random_words(accounts, consumer_program, request, program_id)
            }
            CoordinatorInstruction::FulfillRandomWords { request_id, words } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, words, program_id)
            }
        }
    }

    fn process_initialize(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_state_pubkey, bump_seed) = find_coordinator_address(program_id);
        if *state_info.key != expected_state_pubkey {
            msg!("Invalid coordinator state address");
            return Err(ProgramError::InvalidSeeds);
        }
        if state_info.owner == program_id {
            return Err(CoordinatorError::AlreadyInitialized.into());
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                authority_info.key,
                state_info.key,
                rent.minimum_balance(CoordinatorState::LEN),
                CoordinatorState::LEN as u64,
                program_id,
            ),
            &[
                authority_info.clone(),
                state_info.clone(),
                system_program_info.clone(),
            ],
            &[&[COORDINATOR_SEED, &[bump_seed]]],
        )?;

        let state = CoordinatorState {
            is_initialized: true,
            authority: *authority_info.key,
            next_request_id: 1,
        };
        CoordinatorState::pack(state, &mut state_info.data.borrow_mut())?;

        msg!("Coordinator initialized: Authority={}", authority_info.key);
        Ok(())
    }

    fn process_request_random_words(
        accounts: &[AccountInfo],
        consumer_program: Pubkey,
        request: RandomnessRequest,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Only the consumer program can sign for its own accounts, so this ties the
        // request to the program that will receive the callback
        if !consumer_info.is_signer || consumer_info.owner != &consumer_program {
            return Err(CoordinatorError::InvalidConsumer.into());
        }

        request.validate()?;

        if state_info.owner != program_id {
            return Err(CoordinatorError::NotInitialized.into());
        }
        let mut state = CoordinatorState::unpack(&state_info.data.borrow())?;

        let request_id = state.next_request_id;
        let request_id_bytes = request_id.to_le_bytes();
        let (expected_request_pubkey, bump_seed) = find_request_address(program_id, request_id);
        if *request_info.key != expected_request_pubkey {
            msg!("Expected request record {} for request {}", expected_request_pubkey, request_id);
            return Err(CoordinatorError::InvalidRequestAccount.into());
        }

        let rent = Rent::get()?;
        invoke_signed(
            &system_instruction::create_account(
                payer_info.key,
                request_info.key,
                rent.minimum_balance(RequestRecord::LEN),
                RequestRecord::LEN as u64,
                program_id,
            ),
            &[
                payer_info.clone(),
                request_info.clone(),
                system_program_info.clone(),
            ],
            &[&[REQUEST_SEED, &request_id_bytes, &[bump_seed]]],
        )?;

        let clock = Clock::get()?;
        let record = RequestRecord {
            is_initialized: true,
            request_id,
            consumer: *consumer_info.key,
            consumer_program,
            subscription_id: request.subscription_id,
            num_words: request.num_words,
            requested_at: clock.slot,
            fulfilled: false,
        };
        RequestRecord::pack(record, &mut request_info.data.borrow_mut())?;

        state.next_request_id = request_id
            .checked_add(1)
            .ok_or(CoordinatorError::Overflow)?;
        CoordinatorState::pack(state, &mut state_info.data.borrow_mut())?;

        set_return_data(&request_id_bytes);

        msg!(
            "Randomness requested: RequestId={}, Consumer={}, Words={}, Confirmations={}",
            request_id,
            consumer_info.key,
            request.num_words,
            request.request_confirmations
        );
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        words: Vec<u64>,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let callback_authority_info = next_account_info(account_info_iter)?;
        let consumer_program_info = next_account_info(account_info_iter)?;
        let consumer_accounts = account_info_iter.as_slice();

        if state_info.owner != program_id || request_info.owner != program_id {
            return Err(ProgramError::IncorrectProgramId);
        }

        let state = CoordinatorState::unpack(&state_info.data.borrow())?;
        if !authority_info.is_signer || *authority_info.key != state.authority {
            return Err(CoordinatorError::NotAuthority.into());
        }

        let mut record = RequestRecord::unpack(&request_info.data.borrow())?;
        if record.request_id != request_id
            || *request_info.key != find_request_address(program_id, request_id).0
        {
            return Err(CoordinatorError::InvalidRequestAccount.into());
        }
        if record.fulfilled {
            return Err(CoordinatorError::RequestAlreadyFulfilled.into());
        }
        if *consumer_program_info.key != record.consumer_program {
            msg!("Consumer program does not match the request");
            return Err(CoordinatorError::InvalidConsumer.into());
        }
        match consumer_accounts.first() {
            Some(consumer_info) if *consumer_info.key == record.consumer => {}
            _ => {
                msg!("First forwarded account must be the consumer {}", record.consumer);
                return Err(CoordinatorError::InvalidConsumer.into());
            }
        }

        let words = if words.is_empty() {
            derive_random_words(request_id, record.num_words)
        } else if words.len() == record.num_words as usize {
            words
        } else {
            return Err(CoordinatorError::InvalidRandomWords.into());
        };

        let (expected_authority_pubkey, bump_seed) = find_callback_authority_address(program_id);
        if *callback_authority_info.key != expected_authority_pubkey {
            msg!("Invalid callback authority address");
            return Err(ProgramError::InvalidSeeds);
        }

        // Mark the request answered before handing control to the consumer
        record.fulfilled = true;
        RequestRecord::pack(record, &mut request_info.data.borrow_mut())?;

        let mut callback_accounts = Vec::with_capacity(consumer_accounts.len() + 1);
        callback_accounts.push(AccountMeta::new_readonly(*callback_authority_info.key, true));
        callback_accounts.extend(consumer_accounts.iter().map(|account| AccountMeta {
            pubkey: *account.key,
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        }));

        let mut callback_infos = Vec::with_capacity(consumer_accounts.len() + 2);
        callback_infos.push(callback_authority_info.clone());
        callback_infos.extend_from_slice(consumer_accounts);
        callback_infos.push(consumer_program_info.clone());

        let callback = Instruction {
            program_id: *consumer_program_info.key,
            accounts: callback_accounts,
            data: RandomWords { request_id, words }.to_callback_data()?,
        };
        invoke_signed(
            &callback,
            &callback_infos,
            &[&[CALLBACK_AUTHORITY_SEED, &[bump_seed]]],
        )?;

        msg!(
            "Request {} fulfilled for consumer {}",
            request_id,
            record.consumer
        );
        Ok(())
    }
}
