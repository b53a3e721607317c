use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{
    error::CoordinatorError, find_callback_authority_address, find_coordinator_address,
    find_request_address, interface::RandomnessRequest,
};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum CoordinatorInstruction {
    /// Create the coordinator state; the signer becomes the fulfillment authority
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority, pays for the state account
    /// 1. `[writable]` The coordinator state PDA
    /// 2. `[]` The system program
    Initialize,

    /// Register a randomness request. The request id is returned as program return data.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer of the request record
    /// 1. `[signer]` The consumer account, owned by `consumer_program`
    /// 2. `[writable]` The coordinator state PDA
    /// 3. `[writable]` The request record PDA for the next request id
    /// 4. `[]` The system program
    RequestRandomWords {
        consumer_program: Pubkey,
        request: RandomnessRequest,
    },

    /// Answer a request and call the consumer back
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator authority
    /// 1. `[]` The coordinator state PDA
    /// 2. `[writable]` The request record PDA
    /// 3. `[]` The callback authority PDA
    /// 4. `[]` The consumer program
    /// 5.. Accounts forwarded to the consumer, starting with the consumer account
    FulfillRandomWords {
        request_id: u64,
        /// Words to deliver; empty to derive them from the request id
        words: Vec<u64>,
    },
}

impl CoordinatorInstruction {
    /// Unpacks a byte buffer into a CoordinatorInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| CoordinatorError::InvalidInstructionData.into())
    }

    /// Packs a CoordinatorInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

/// Create initialize instruction
pub fn initialize(program_id: &Pubkey, authority: &Pubkey) -> Result<Instruction, ProgramError> {
    let (state, _) = find_coordinator_address(program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*authority, true),
            AccountMeta::new(state, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::Initialize.pack()?,
    })
}

/// Create request_random_words instruction for the request id the coordinator will assign next
pub fn request_random_words(
    program_id: &Pubkey,
    payer: &Pubkey,
    consumer: &Pubkey,
    consumer_program: &Pubkey,
    request_id: u64,
    request: RandomnessRequest,
) -> Result<Instruction, ProgramError> {
    let (state, _) = find_coordinator_address(program_id);
    let (request_record, _) = find_request_address(program_id, request_id);

    let data = CoordinatorInstruction::RequestRandomWords {
        consumer_program: *consumer_program,
        request,
    }
    .pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*consumer, true),
            AccountMeta::new(state, false),
            AccountMeta::new(request_record, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    })
}

/// Create fulfill_random_words instruction
///
/// `consumer_accounts` are forwarded to the consumer program and must start with the
/// consumer account recorded for the request.
pub fn fulfill_random_words(
    program_id: &Pubkey,
    authority: &Pubkey,
    request_id: u64,
    words: Vec<u64>,
    consumer_program: &Pubkey,
    consumer_accounts: &[AccountMeta],
) -> Result<Instruction, ProgramError> {
    let (state, _) = find_coordinator_address(program_id);
    let (request_record, _) = find_request_address(program_id, request_id);
    let (callback_authority, _) = find_callback_authority_address(program_id);

    let mut accounts = vec![
        AccountMeta::new_readonly(*authority, true),
        AccountMeta::new_readonly(state, false),
        AccountMeta::new(request_record, false),
        AccountMeta::new_readonly(callback_authority, false),
        AccountMeta::new_readonly(*consumer_program, false),
    ];
    accounts.extend_from_slice(consumer_accounts);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: CoordinatorInstruction::FulfillRandomWords { request_id, words }.pack()?,
    })
}
