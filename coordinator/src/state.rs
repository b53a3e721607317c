use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::Slot,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};

/// Coordinator configuration account
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorState {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Operator allowed to fulfill requests
    pub authority: Pubkey,
    /// Id handed to the next request, starting at 1
    pub next_request_id: u64,
}

/// One randomness request, stored at its own PDA
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RequestRecord {
    pub is_initialized: bool,
    pub request_id: u64,
    /// Account that signed the request and receives the callback
    pub consumer: Pubkey,
    /// Program invoked with the callback
    pub consumer_program: Pubkey,
    pub subscription_id: u64,
    pub num_words: u32,
    /// Slot the request was made in
    pub requested_at: Slot,
    pub fulfilled: bool,
}

impl Sealed for CoordinatorState {}
impl Sealed for RequestRecord {}

impl IsInitialized for CoordinatorState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for RequestRecord {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

fn unpack_bool(src: &[u8; 1]) -> Result<bool, ProgramError> {
    match src {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(ProgramError::InvalidAccountData),
    }
}

impl Pack for CoordinatorState {
    const LEN: usize = 1 + 32 + 8;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, CoordinatorState::LEN];
        let (is_initialized, authority, next_request_id) = array_refs![src, 1, 32, 8];

        Ok(CoordinatorState {
            is_initialized: unpack_bool(is_initialized)?,
            authority: Pubkey::new_from_array(*authority),
            next_request_id: u64::from_le_bytes(*next_request_id),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, CoordinatorState::LEN];
        let (is_initialized_dst, authority_dst, next_request_id_dst) =
            mut_array_refs![dst, 1, 32, 8];

        is_initialized_dst[0] = self.is_initialized as u8;
        authority_dst.copy_from_slice(self.authority.as_ref());
        *next_request_id_dst = self.next_request_id.to_le_bytes();
    }
}

impl Pack for RequestRecord {
    const LEN: usize = 1 + 8 + 32 + 32 + 8 + 4 + 8 + 1;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, RequestRecord::LEN];
        let (
            is_initialized,
            request_id,
            consumer,
            consumer_program,
            subscription_id,
            num_words,
            requested_at,
            fulfilled,
        ) = array_refs![src, 1, 8, 32, 32, 8, 4, 8, 1];

        Ok(RequestRecord {
            is_initialized: unpack_bool(is_initialized)?,
            request_id: u64::from_le_bytes(*request_id),
            consumer: Pubkey::new_from_array(*consumer),
            consumer_program: Pubkey::new_from_array(*consumer_program),
            subscription_id: u64::from_le_bytes(*subscription_id),
            num_words: u32::from_le_bytes(*num_words),
            requested_at: Slot::from_le_bytes(*requested_at),
            fulfilled: unpack_bool(fulfilled)?,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, RequestRecord::LEN];
        let (
            is_initialized_dst,
            request_id_dst,
            consumer_dst,
            consumer_program_dst,
            subscription_id_dst,
            num_words_dst,
            requested_at_dst,
            fulfilled_dst,
        ) = mut_array_refs![dst, 1, 8, 32, 32, 8, 4, 8, 1];

        is_initialized_dst[0] = self.is_initialized as u8;
        *request_id_dst = self.request_id.to_le_bytes();
        consumer_dst.copy_from_slice(self.consumer.as_ref());
        consumer_program_dst.copy_from_slice(self.consumer_program.as_ref());
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
        *requested_at_dst = self.requested_at.to_le_bytes();
        fulfilled_dst[0] = self.fulfilled as u8;
    }
}
