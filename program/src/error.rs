use solana_program::{
    decode_error::DecodeError, msg, program_error::ProgramError, pubkey::Pubkey,
};
use thiserror::Error;

use crate::state::UpkeepStatus;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Creation parameters failed validation
    #[error("Invalid raffle parameters: {0}")]
    InvalidParams(&'static str),

    /// Less than the entrance fee was tendered
    #[error("Not enough lamports entered: required {required}, tendered {tendered}")]
    InsufficientPayment { required: u64, tendered: u64 },

    /// Entries are locked while a winner is being drawn
    #[error("Raffle is not open")]
    RoundClosed,

    #[error("Raffle is full ({max_players} players)")]
    RaffleFull { max_players: u32 },

    /// At least one upkeep condition does not hold
    #[error("Upkeep not needed: {0}")]
    UpkeepNotNeeded(UpkeepStatus),

    /// The randomness request could not be issued
    #[error("Randomness request failed: {0}")]
    OracleRequestFailed(ProgramError),

    /// A fulfillment answered a request this raffle is not waiting for
    #[error("Request {received} does not match the pending request {expected:?}")]
    RequestMismatch { expected: Option<u64>, received: u64 },

    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// The fulfillment was not signed by the coordinator's callback authority
    #[error("Fulfillment not signed by the coordinator")]
    InvalidOracleCaller,

    /// The prize could not be transferred; the round stays closed
    #[error("Payout to {winner} failed")]
    PayoutFailed { winner: Pubkey },

    #[error("Arithmetic overflow")]
    Overflow,

    /// A draw was attempted on a round without entries
    #[error("Round has no players")]
    NoPlayers,
}

impl RaffleError {
    /// Stable custom error code reported to clients
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InvalidInstructionData => 0,
            RaffleError::InvalidParams(_) => 1,
            RaffleError::InsufficientPayment { .. } => 2,
            RaffleError::RoundClosed => 3,
            RaffleError::RaffleFull { .. } => 4,
            RaffleError::UpkeepNotNeeded(_) => 5,
            RaffleError::OracleRequestFailed(_) => 6,
            RaffleError::RequestMismatch { .. } => 7,
            RaffleError::MissingRandomWords => 8,
            RaffleError::InvalidOracleCaller => 9,
            RaffleError::PayoutFailed { .. } => 10,
            RaffleError::Overflow => 11,
            RaffleError::NoPlayers => 12,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        // Custom codes carry no payload, the log line keeps the diagnostics
        msg!("Raffle error: {}", e);
        match e {
            RaffleError::OracleRequestFailed(inner) => inner,
            other => ProgramError::Custom(other.code()),
        }
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}
