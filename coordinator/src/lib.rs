// Randomness coordinator
// Interface types shared with consumer programs, plus a local coordinator program
// that serves requests on development clusters and in tests.

pub mod error;
pub mod instruction;
pub mod interface;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

pub use interface::{derive_random_words, RandomWords, RandomnessRequest, FULFILL_RANDOM_WORDS_TAG};

use solana_program::pubkey::Pubkey;

/// Seed of the coordinator state PDA
pub const COORDINATOR_SEED: &[u8] = b"coordinator";
/// Seed prefix of per-request record PDAs
pub const REQUEST_SEED: &[u8] = b"request";
/// Seed of the PDA that signs fulfillment callbacks into consumer programs
pub const CALLBACK_AUTHORITY_SEED: &[u8] = b"callback_authority";

/// Find the coordinator state address
pub fn find_coordinator_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], program_id)
}

/// Find the record address for a request id
pub fn find_request_address(program_id: &Pubkey, request_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[REQUEST_SEED, &request_id.to_le_bytes()], program_id)
}

/// Find the callback authority of a coordinator program.
///
/// Consumers compare the first signer of a fulfillment against this address to make
/// sure the callback really comes from the coordinator they requested randomness from.
pub fn find_callback_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CALLBACK_AUTHORITY_SEED], program_id)
}
