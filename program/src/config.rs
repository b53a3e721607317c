// Raffle deployment parameters
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::native_token::LAMPORTS_PER_SOL;
use vrf_coordinator::interface::{MAXIMUM_CALLBACK_GAS_LIMIT, MINIMUM_CALLBACK_GAS_LIMIT};

use crate::error::RaffleError;

/// Confirmations the oracle waits for before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words requested per round; only the first one is used
pub const NUM_WORDS: u32 = 1;
/// Upper bound on players per round. Keeps the raffle account under the CPI allocation
/// limit and the decoded players list inside the program heap.
pub const MAX_PLAYERS: u32 = 256;

/// Gas lane key hash used by the development preset
pub const DEVELOPMENT_GAS_LANE: [u8; 32] = [
    0xd8, 0x9b, 0x2b, 0xf1, 0x50, 0xe3, 0xb9, 0xe1, 0x34, 0x46, 0x98, 0x6e, 0x57, 0x1f, 0xb9, 0xca,
    0xb2, 0x4b, 0x13, 0xce, 0xa0, 0xa4, 0x3e, 0xa2, 0x0a, 0x60, 0x49, 0xa8, 0x5c, 0xc8, 0x07, 0xcc,
];

/// Parameters fixed when a raffle is created
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct RaffleParams {
    /// Minimum lamports to enter a round
    pub entrance_fee: u64,
    /// Seconds between the start of a round and the earliest upkeep
    pub interval: u64,
    /// Key hash of the oracle gas lane
    pub gas_lane: [u8; 32],
    /// Oracle subscription paying for randomness
    pub subscription_id: u64,
    /// Compute budget reserved for the fulfillment callback
    pub callback_gas_limit: u32,
    /// Capacity of the players list
    pub max_players: u32,
}

impl RaffleParams {
    /// Local cluster preset: 0.1 SOL entries drawn every 30 seconds
    pub fn development() -> Self {
        Self {
            entrance_fee: LAMPORTS_PER_SOL / 10,
            interval: 30,
            gas_lane: DEVELOPMENT_GAS_LANE,
            subscription_id: 0,
            callback_gas_limit: 500_000,
            max_players: 100,
        }
    }

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 {
            return Err(RaffleError::InvalidParams("entrance fee must be positive"));
        }
        if !(MINIMUM_CALLBACK_GAS_LIMIT..=MAXIMUM_CALLBACK_GAS_LIMIT)
            .contains(&self.callback_gas_limit)
        {
            return Err(RaffleError::InvalidParams("callback gas limit out of range"));
        }
        if self.max_players == 0 || self.max_players > MAX_PLAYERS {
            return Err(RaffleError::InvalidParams("max players out of range"));
        }
        Ok(())
    }
}
