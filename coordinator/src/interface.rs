// Wire types shared by the coordinator and its consumer programs
use arrayref::array_ref;
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{hash::hashv, program_error::ProgramError};

use crate::error::CoordinatorError;

pub const MINIMUM_REQUEST_CONFIRMATIONS: u16 = 1;
pub const MAXIMUM_REQUEST_CONFIRMATIONS: u16 = 200;
pub const MINIMUM_CALLBACK_GAS_LIMIT: u32 = 10_000;
pub const MAXIMUM_CALLBACK_GAS_LIMIT: u32 = 1_000_000;
pub const MAXIMUM_RANDOM_WORDS: u32 = 100;

/// First byte of the instruction the coordinator sends to a consumer program when a
/// request is fulfilled. Consumers reserve this tag for their fulfillment handler.
pub const FULFILL_RANDOM_WORDS_TAG: u8 = 255;

/// Parameters of a randomness request
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    /// Gas lane key hash, selects the price tier of the oracle job
    pub key_hash: [u8; 32],
    /// Subscription funding the request
    pub subscription_id: u64,
    /// Confirmations the oracle waits for before answering
    pub request_confirmations: u16,
    /// Compute budget reserved for the consumer callback
    pub callback_gas_limit: u32,
    /// Number of random words to deliver
    pub num_words: u32,
}

impl RandomnessRequest {
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if !(MINIMUM_REQUEST_CONFIRMATIONS..=MAXIMUM_REQUEST_CONFIRMATIONS)
            .contains(&self.request_confirmations)
        {
            return Err(CoordinatorError::InvalidRequestConfirmations);
        }
        if !(MINIMUM_CALLBACK_GAS_LIMIT..=MAXIMUM_CALLBACK_GAS_LIMIT)
            .contains(&self.callback_gas_limit)
        {
            return Err(CoordinatorError::InvalidCallbackGasLimit);
        }
        if self.num_words == 0 || self.num_words > MAXIMUM_RANDOM_WORDS {
            return Err(CoordinatorError::InvalidNumWords);
        }
        Ok(())
    }
}

/// Payload of a fulfillment callback
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RandomWords {
    pub request_id: u64,
    pub words: Vec<u64>,
}

impl RandomWords {
    /// Encode as consumer instruction data: the fulfillment tag followed by the payload
    pub fn to_callback_data(&self) -> Result<Vec<u8>, ProgramError> {
        let mut data = vec![FULFILL_RANDOM_WORDS_TAG];
        self.serialize(&mut data)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
        Ok(data)
    }
}

/// Deterministic words for a request, used when the operator does not supply its own.
/// Word `i` is the first eight bytes of `hash(request_id || i)`.
pub fn derive_random_words(request_id: u64, num_words: u32) -> Vec<u64> {
    (0..num_words)
        .map(|index| {
            let hash = hashv(&[&request_id.to_le_bytes(), &index.to_le_bytes()]).to_bytes();
            u64::from_le_bytes(*array_ref![hash, 0, 8])
        })
        .collect()
}
