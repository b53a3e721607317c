// Raffle instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use vrf_coordinator::{
    find_coordinator_address, find_request_address, RandomWords, FULFILL_RANDOM_WORDS_TAG,
};

use crate::{config::RaffleParams, error::RaffleError, find_raffle_address};

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Create a raffle bound to a coordinator program
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The creator, pays for the raffle account
    /// 1. `[writable]` The raffle PDA
    /// 2. `[]` The coordinator program
    /// 3. `[]` The system program
    InitializeRaffle { params: RaffleParams },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player, pays the entry
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    Enter {
        /// Lamports tendered, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the upkeep conditions. Publishes `(upkeep_needed, perform_data)` as return data.
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep { check_data: Vec<u8> },

    /// Close the round and request randomness. Anyone may call it once upkeep is needed.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The caller, pays for the request record
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The coordinator program
    /// 3. `[writable]` The coordinator state PDA
    /// 4. `[writable]` The request record PDA for the coordinator's next request id
    /// 5. `[]` The system program
    PerformUpkeep { perform_data: Vec<u8> },

    /// Fulfillment callback from the coordinator
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator's callback authority
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The winner's account
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => Self::InitializeRaffle {
                params: Self::unpack_borsh(rest)?,
            },
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep {
                check_data: Self::unpack_borsh(rest)?,
            },
            3 => Self::PerformUpkeep {
                perform_data: Self::unpack_borsh(rest)?,
            },
            FULFILL_RANDOM_WORDS_TAG => {
                let RandomWords { request_id, words } = Self::unpack_borsh(rest)?;
                Self::FulfillRandomWords {
                    request_id,
                    random_words: words,
                }
            }
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle { params } => {
                buf.push(0);
                Self::pack_borsh(params, &mut buf)?;
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep { check_data } => {
                buf.push(2);
                Self::pack_borsh(check_data, &mut buf)?;
            }
            Self::PerformUpkeep { perform_data } => {
                buf.push(3);
                Self::pack_borsh(perform_data, &mut buf)?;
            }
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf = RandomWords {
                    request_id: *request_id,
                    words: random_words.clone(),
                }
                .to_callback_data()?;
            }
        }
        Ok(buf)
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_borsh<T: BorshDeserialize>(input: &[u8]) -> Result<T, ProgramError> {
        T::try_from_slice(input).map_err(|_| RaffleError::InvalidInstructionData.into())
    }

    fn pack_borsh<T: BorshSerialize>(value: &T, buf: &mut Vec<u8>) -> Result<(), ProgramError> {
        value
            .serialize(buf)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

/// Create initialize_raffle instruction for the raffle PDA of `creator`
pub fn initialize_raffle(
    program_id: &Pubkey,
    creator: &Pubkey,
    coordinator_program: &Pubkey,
    params: RaffleParams,
) -> Result<Instruction, ProgramError> {
    let (raffle, _) = find_raffle_address(program_id, creator);
    let data = RaffleInstruction::InitializeRaffle { params }.pack()?;

    let accounts = vec![
        AccountMeta::new(*creator, true),
        AccountMeta::new(raffle, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::Enter { amount }.pack()?;

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(
    program_id: &Pubkey,
    raffle: &Pubkey,
    check_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep { check_data }.pack()?;

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle, false)],
        data,
    })
}

/// Create perform_upkeep instruction. `request_id` is the id the coordinator will assign
/// next, it selects the request record account.
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle: &Pubkey,
    coordinator_program: &Pubkey,
    request_id: u64,
    perform_data: Vec<u8>,
) -> Result<Instruction, ProgramError> {
    let (coordinator_state, _) = find_coordinator_address(coordinator_program);
    let (request_record, _) = find_request_address(coordinator_program, request_id);
    let data = RaffleInstruction::PerformUpkeep { perform_data }.pack()?;

    let accounts = vec![
        AccountMeta::new(*caller, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new(coordinator_state, false),
        AccountMeta::new(request_record, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Accounts the coordinator forwards to the raffle when fulfilling a request
pub fn fulfillment_accounts(raffle: &Pubkey, winner: &Pubkey) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*raffle, false),
        AccountMeta::new(*winner, false),
    ]
}

/// Create fulfill_random_words instruction as the coordinator issues it
pub fn fulfill_random_words(
    program_id: &Pubkey,
    callback_authority: &Pubkey,
    raffle: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack()?;

    let mut accounts = vec![AccountMeta::new_readonly(*callback_authority, true)];
    accounts.extend(fulfillment_accounts(raffle, winner));

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_is_tag_and_amount() {
        let data = RaffleInstruction::Enter { amount: 42 }.pack().unwrap();
        assert_eq!(data, [1, 42, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::Enter { amount: 42 }
        );
    }

    #[test]
    fn coordinator_callback_unpacks_as_fulfillment() {
        let data = RandomWords {
            request_id: 9,
            words: vec![u64::MAX],
        }
        .to_callback_data()
        .unwrap();

        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords {
                request_id: 9,
                random_words: vec![u64::MAX],
            }
        );
    }

    #[test]
    fn unpack_rejects_short_and_unknown_input() {
        assert!(RaffleInstruction::unpack(&[]).is_err());
        assert!(RaffleInstruction::unpack(&[1, 0, 0]).is_err());
        assert!(RaffleInstruction::unpack(&[7]).is_err());
    }
}
