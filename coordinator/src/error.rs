use solana_program::{decode_error::DecodeError, msg, program_error::ProgramError};
use thiserror::Error;

/// Errors that may be returned by the coordinator program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    #[error("Coordinator already initialized")]
    AlreadyInitialized,

    #[error("Coordinator not initialized")]
    NotInitialized,

    /// Only the coordinator authority can fulfill requests
    #[error("Only the coordinator authority can fulfill requests")]
    NotAuthority,

    /// The consumer must sign and be owned by the consumer program
    #[error("Consumer account does not match the consumer program")]
    InvalidConsumer,

    #[error("Request account does not match the request id")]
    InvalidRequestAccount,

    #[error("Request has already been fulfilled")]
    RequestAlreadyFulfilled,

    /// Supplied words do not match the number of words requested
    #[error("Random words do not match the request")]
    InvalidRandomWords,

    #[error("Number of random words out of range")]
    InvalidNumWords,

    #[error("Request confirmations out of range")]
    InvalidRequestConfirmations,

    #[error("Callback gas limit out of range")]
    InvalidCallbackGasLimit,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl From<CoordinatorError> for ProgramError {
    fn from(e: CoordinatorError) -> Self {
        msg!("Coordinator error: {}", e);
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for CoordinatorError {
    fn type_of() -> &'static str {
        "Coordinator Error"
    }
}
