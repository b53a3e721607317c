// Randomness oracle seam
//
// The raffle asks for random words through `RandomnessOracle` and receives them later,
// in a separate transaction, through the coordinator's `FulfillRandomWords` callback.
use solana_program::{
    account_info::AccountInfo,
    instruction::{AccountMeta, Instruction},
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
    pubkey::Pubkey,
};
use vrf_coordinator::{instruction::CoordinatorInstruction, RandomnessRequest};

pub trait RandomnessOracle {
    /// Issue a randomness request and return the id its fulfillment will carry
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError>;
}

/// Requests randomness from a coordinator program by CPI, signing as the raffle PDA
pub struct CoordinatorOracle<'a, 'info> {
    pub coordinator_program: &'a AccountInfo<'info>,
    pub coordinator_state: &'a AccountInfo<'info>,
    pub request_record: &'a AccountInfo<'info>,
    /// The raffle account, signs the request
    pub consumer: &'a AccountInfo<'info>,
    pub payer: &'a AccountInfo<'info>,
    pub system_program: &'a AccountInfo<'info>,
    pub consumer_program_id: &'a Pubkey,
    pub consumer_seeds: &'a [&'a [u8]],
}

impl<'a, 'info> RandomnessOracle for CoordinatorOracle<'a, 'info> {
    fn request_random_words(&mut self, request: &RandomnessRequest) -> Result<u64, ProgramError> {
        let data = CoordinatorInstruction::RequestRandomWords {
            consumer_program: *self.consumer_program_id,
            request: request.clone(),
        }
        .pack()?;

        let instruction = Instruction {
            program_id: *self.coordinator_program.key,
            accounts: vec![
                AccountMeta::new(*self.payer.key, true),
                AccountMeta::new_readonly(*self.consumer.key, true),
                AccountMeta::new(*self.coordinator_state.key, false),
                AccountMeta::new(*self.request_record.key, false),
                AccountMeta::new_readonly(*self.system_program.key, false),
            ],
            data,
        };

        invoke_signed(
            &instruction,
            &[
                self.payer.clone(),
                self.consumer.clone(),
                self.coordinator_state.clone(),
                self.request_record.clone(),
                self.system_program.clone(),
                self.coordinator_program.clone(),
            ],
            &[self.consumer_seeds],
        )?;

        match get_return_data() {
            Some((program_id, data))
                if program_id == *self.coordinator_program.key && data.len() <= 8 =>
            {
                // Return data may come back with trailing zero bytes trimmed
                let mut request_id = [0u8; 8];
                request_id[..data.len()].copy_from_slice(&data);
                Ok(u64::from_le_bytes(request_id))
            }
            _ => {
                msg!("Coordinator did not return a request id");
                Err(ProgramError::InvalidAccountData)
            }
        }
    }
}
