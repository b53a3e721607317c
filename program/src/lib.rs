// Autoraffle
// An interval raffle: players pay in while the round is open, an upkeep call closes the
// round and asks a randomness coordinator for a word, and the fulfillment pays the whole
// pool to the drawn player.

pub mod config;
pub mod error;
pub mod events;
pub mod instruction;
pub mod oracle;
pub mod payout;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
mod entrypoint;

use solana_program::pubkey::Pubkey;

/// Seed prefix of raffle PDAs
pub const RAFFLE_SEED: &[u8] = b"raffle";

/// Find the raffle address of `creator`
pub fn find_raffle_address(program_id: &Pubkey, creator: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED, creator.as_ref()], program_id)
}
